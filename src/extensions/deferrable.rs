use gpui::{AnyElement, IntoElement, deferred};

/// Whether (and above which layer) a part paints after its siblings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeferredConfig {
    /// Whether the part is deferred at all.
    pub enabled: bool,
    /// Higher priorities paint later. `None` uses the part's default.
    pub priority: Option<usize>,
}

impl Default for DeferredConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            priority: None,
        }
    }
}

/// Parts that render as a layer above the rest of the window, such as a
/// dialog's overlay and content.
pub trait Deferrable: Sized {
    /// The priority used when no custom priority is set.
    const DEFAULT_PRIORITY: usize = 0;

    /// Returns a reference to the deferred configuration.
    fn deferred_config(&self) -> &DeferredConfig;

    /// Returns a mutable reference to the deferred configuration.
    fn deferred_config_mut(&mut self) -> &mut DeferredConfig;

    /// Renders in place instead of as a layer when `false`.
    fn deferred(mut self, enabled: bool) -> Self {
        self.deferred_config_mut().enabled = enabled;
        self
    }

    /// Overrides the part's default paint priority.
    fn deferred_priority(mut self, priority: usize) -> Self {
        self.deferred_config_mut().priority = Some(priority);
        self
    }

    /// The priority the part paints with.
    fn resolved_priority(&self) -> usize {
        self.deferred_config()
            .priority
            .unwrap_or(Self::DEFAULT_PRIORITY)
    }

    /// Wraps `element` in a deferred layer according to the configuration.
    fn apply_deferred(&self, element: impl IntoElement) -> AnyElement {
        if self.deferred_config().enabled {
            deferred(element)
                .priority(self.resolved_priority())
                .into_any_element()
        } else {
            element.into_any_element()
        }
    }
}
