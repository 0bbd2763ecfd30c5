use gpui::{App, Context, ElementId, FocusHandle, Subscription, WeakFocusHandle, Window};
use gpui_headless_core::{MergedRef, NodeSink, RefSink, merge_refs};

use crate::ElementIdExt;

/// The node behind a rendered part, kept in keyed state.
///
/// Its sinks see the node while the part renders and `None` once the keyed
/// state is released.
pub(crate) struct PartNode {
    focus_handle: FocusHandle,
    internal: Option<NodeSink<WeakFocusHandle>>,
    sinks: MergedRef<WeakFocusHandle>,
    _subscriptions: Vec<Subscription>,
}

impl PartNode {
    pub fn new(focus_handle: FocusHandle) -> Self {
        Self {
            focus_handle,
            internal: None,
            sinks: MergedRef::new(),
            _subscriptions: Vec::new(),
        }
    }

    /// The sink the owning primitive tracks this node through.
    pub fn internal(mut self, sink: Option<NodeSink<WeakFocusHandle>>) -> Self {
        self.internal = sink;
        self
    }

    pub fn subscription(mut self, subscription: Subscription) -> Self {
        self._subscriptions.push(subscription);
        self
    }

    /// Attaches the node to the internal sink and the consumer's sink. A changed
    /// consumer sink is detached from the node before the new one is attached.
    fn bind(&mut self, consumer: Option<NodeSink<WeakFocusHandle>>) {
        let sinks = merge_refs([self.internal.clone(), consumer]);
        if self.sinks.same_sinks(&sinks) {
            return;
        }

        let node = self.focus_handle.downgrade();
        self.sinks.accept(None);
        sinks.accept(Some(&node));
        self.sinks = sinks;
    }
}

impl Drop for PartNode {
    fn drop(&mut self) {
        self.sinks.accept(None);
    }
}

/// Returns the focus handle of the part rendered as `id`, creating its node on
/// first render.
///
/// The node is released once a frame renders without the part. `init` can
/// hook that through `cx.on_release`.
pub(crate) fn use_part_node(
    id: &ElementId,
    consumer: Option<NodeSink<WeakFocusHandle>>,
    window: &mut Window,
    cx: &mut App,
    init: impl FnOnce(&mut Window, &mut Context<PartNode>) -> PartNode,
) -> FocusHandle {
    let node = window.use_keyed_state(id.with_suffix("state:node"), cx, |window, cx| {
        init(window, cx)
    });

    node.update(cx, |node, _cx| {
        node.bind(consumer);
        node.focus_handle.clone()
    })
}
