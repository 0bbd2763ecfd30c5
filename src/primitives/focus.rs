use gpui::{App, WeakFocusHandle, Window};
use gpui_headless_core::FocusHost;

/// Drives the primitives' focus policies with a window's focus handles.
///
/// A node is mounted while its focus handle is alive, which is as long as the
/// part that created it keeps rendering.
pub struct WindowFocusHost<'a> {
    window: &'a mut Window,
    cx: &'a mut App,
}

impl<'a> WindowFocusHost<'a> {
    pub fn new(window: &'a mut Window, cx: &'a mut App) -> Self {
        Self { window, cx }
    }
}

impl FocusHost<WeakFocusHandle> for WindowFocusHost<'_> {
    fn focused(&self) -> Option<WeakFocusHandle> {
        self.window
            .focused(self.cx)
            .map(|focus_handle| focus_handle.downgrade())
    }

    fn is_mounted(&self, node: &WeakFocusHandle) -> bool {
        node.upgrade().is_some()
    }

    fn focus(&mut self, node: &WeakFocusHandle) {
        if let Some(focus_handle) = node.upgrade() {
            focus_handle.focus(self.window, self.cx);
        }
    }
}
