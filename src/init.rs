use gpui::App;

use crate::primitives::{self, checkbox, dialog, tabs};

/// Registers the key bindings of every primitive.
pub fn init(cx: &mut App) {
    primitives::init(cx);
    dialog::init(cx);
    tabs::init(cx);
    checkbox::init(cx);
}
