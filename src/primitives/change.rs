use std::{cell::RefCell, rc::Rc};

use gpui::{App, Window};

/// Window-aware change callback of a Root part.
pub type ChangeHandler<T> = Rc<dyn Fn(&T, &mut Window, &mut App)>;

/// Holds the callback a Root was last rendered with.
pub(crate) struct ChangeCallback<T> {
    handler: RefCell<Option<ChangeHandler<T>>>,
}

impl<T> ChangeCallback<T> {
    pub fn new() -> Self {
        Self {
            handler: RefCell::new(None),
        }
    }

    pub fn set(&self, handler: Option<ChangeHandler<T>>) {
        *self.handler.borrow_mut() = handler;
    }

    /// Calls the handler with a requested value and schedules a redraw. `None`
    /// means nothing was requested.
    pub fn emit(&self, next: Option<T>, window: &mut Window, cx: &mut App) {
        let Some(next) = next else {
            return;
        };

        let handler = self.handler.borrow().clone();
        if let Some(handler) = handler {
            handler(&next, window, cx);
        }

        window.refresh();
    }
}
