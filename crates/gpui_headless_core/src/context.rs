use std::{
    fmt,
    ops::Deref,
    rc::{Rc, Weak},
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use indexmap::IndexMap;
use thiserror::Error;

static NEXT_INSTANCE_ID: AtomicU64 = AtomicU64::new(0);

/// Identifier of a single Root instance. Part ids are derived from it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct InstanceId(Arc<str>);

impl InstanceId {
    /// Generates a process-unique id such as `dialog-3`.
    pub fn generate(kind: &str) -> Self {
        let n = NEXT_INSTANCE_ID.fetch_add(1, Ordering::SeqCst);
        Self(format!("{kind}-{n}").into())
    }

    /// Uses a caller-chosen key, e.g. for reproducible snapshots.
    pub fn from_key(key: impl Into<Arc<str>>) -> Self {
        Self(key.into())
    }

    /// The id as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Derives the id of a named part of this instance.
    pub fn part(&self, name: &str) -> Arc<str> {
        format!("{}-{name}", self.0).into()
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Generated ids of a Root's fixed parts, in declaration order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PartIds {
    instance: InstanceId,
    ids: IndexMap<&'static str, Arc<str>>,
}

impl PartIds {
    /// Derives one id per part name.
    pub fn new(instance: &InstanceId, parts: &[&'static str]) -> Self {
        Self {
            instance: instance.clone(),
            ids: parts
                .iter()
                .map(|part| (*part, instance.part(part)))
                .collect(),
        }
    }

    /// The instance the ids were derived from.
    pub fn instance(&self) -> &InstanceId {
        &self.instance
    }

    /// Returns the id of a declared part.
    pub fn get(&self, part: &str) -> Option<&Arc<str>> {
        self.ids.get(part)
    }

    /// Returns the id of `part`. Undeclared parts (such as per-key tab parts) get an
    /// id derived the same way, so the result is always deterministic.
    pub fn id(&self, part: &str) -> Arc<str> {
        self.ids
            .get(part)
            .cloned()
            .unwrap_or_else(|| self.instance.part(part))
    }

    /// Iterates `(part, id)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Arc<str>)> {
        self.ids.iter().map(|(part, id)| (*part, id))
    }
}

/// The record a Root shares with its parts.
#[derive(Debug)]
pub struct PrimitiveContext<S> {
    /// The owning Root's instance id.
    pub instance_id: InstanceId,
    /// Generated ids of the Root's fixed parts.
    pub part_ids: PartIds,
    /// Primitive-specific state.
    pub state: S,
}

/// A part was used without a mounted Root.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum ContextError {
    /// The handle's Root was never mounted or has been dropped.
    #[error("`{part}` must be rendered inside a mounted `{root}` (instance `{instance}`)")]
    MissingRoot {
        /// The part that looked up the context.
        part: &'static str,
        /// The Root part it needs.
        root: &'static str,
        /// The instance the handle was created for.
        instance: String,
    },
}

/// Strong owner of a [`PrimitiveContext`]. Held by the Root (or whatever owns the
/// Root across renders); dropping the last provider destroys the context.
pub struct ContextProvider<S> {
    root: &'static str,
    context: Rc<PrimitiveContext<S>>,
}

impl<S> ContextProvider<S> {
    /// Creates a context for the Root named `root`.
    pub fn new(
        root: &'static str,
        instance_id: InstanceId,
        parts: &[&'static str],
        state: S,
    ) -> Self {
        let part_ids = PartIds::new(&instance_id, parts);
        Self {
            root,
            context: Rc::new(PrimitiveContext {
                instance_id,
                part_ids,
                state,
            }),
        }
    }

    /// Creates a non-owning handle for the Root's parts.
    pub fn handle(&self) -> ContextHandle<S> {
        ContextHandle {
            root: self.root,
            instance_id: Some(self.context.instance_id.clone()),
            context: Rc::downgrade(&self.context),
        }
    }

    /// The Root's name, used in diagnostics.
    pub fn root_name(&self) -> &'static str {
        self.root
    }
}

impl<S> Clone for ContextProvider<S> {
    fn clone(&self) -> Self {
        Self {
            root: self.root,
            context: self.context.clone(),
        }
    }
}

impl<S> Deref for ContextProvider<S> {
    type Target = PrimitiveContext<S>;

    fn deref(&self) -> &Self::Target {
        &self.context
    }
}

/// Non-owning access to a Root's context.
pub struct ContextHandle<S> {
    root: &'static str,
    instance_id: Option<InstanceId>,
    context: Weak<PrimitiveContext<S>>,
}

impl<S> ContextHandle<S> {
    /// A handle that is not connected to any Root. Every lookup through it fails.
    pub fn detached(root: &'static str) -> Self {
        Self {
            root,
            instance_id: None,
            context: Weak::new(),
        }
    }

    /// The instance this handle was created for, if any.
    pub fn instance_id(&self) -> Option<&InstanceId> {
        self.instance_id.as_ref()
    }

    /// Returns true while the Root is alive.
    pub fn is_mounted(&self) -> bool {
        self.context.strong_count() > 0
    }

    /// Looks up the context for `part`. Used on render paths, where a missing Root
    /// is an integration bug.
    pub fn require(&self, part: &'static str) -> Result<Rc<PrimitiveContext<S>>, ContextError> {
        self.context.upgrade().ok_or_else(|| ContextError::MissingRoot {
            part,
            root: self.root,
            instance: self
                .instance_id
                .as_ref()
                .map_or_else(|| "<detached>".to_owned(), |id| id.to_string()),
        })
    }

    /// Runs `f` against the context. After the Root is gone this is a no-op that
    /// returns `None`.
    pub fn dispatch<R>(&self, f: impl FnOnce(&PrimitiveContext<S>) -> R) -> Option<R> {
        match self.context.upgrade() {
            Some(context) => Some(f(&context)),
            None => {
                tracing::trace!(root = self.root, "ignoring transition for an unmounted root");
                None
            }
        }
    }
}

impl<S> Clone for ContextHandle<S> {
    fn clone(&self) -> Self {
        Self {
            root: self.root,
            instance_id: self.instance_id.clone(),
            context: self.context.clone(),
        }
    }
}

impl<S> fmt::Debug for ContextHandle<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextHandle")
            .field("root", &self.root)
            .field("instance_id", &self.instance_id)
            .field("mounted", &self.is_mounted())
            .finish()
    }
}
