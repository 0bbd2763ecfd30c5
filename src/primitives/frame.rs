use std::{cell::Cell, rc::Rc};

use gpui::{App, Window};

/// Marks the first part of a scope to render in a frame.
///
/// Parts that register per frame reset the scope's bookkeeping when
/// [`FrameMarker::begin`] returns true. The mark is cleared once the frame has
/// been drawn, whichever view rendered the parts.
#[derive(Default)]
pub(crate) struct FrameMarker {
    started: Rc<Cell<bool>>,
}

impl FrameMarker {
    pub fn begin(&self, window: &mut Window, cx: &mut App) -> bool {
        if self.started.replace(true) {
            return false;
        }

        let started = self.started.clone();
        window.defer(cx, move |_window, _cx| started.set(false));
        true
    }
}
