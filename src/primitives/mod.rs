use gpui::{App, KeyBinding, actions};

/// Implements `Styled` and `ParentElement` for a part with `style` and
/// `children` fields.
macro_rules! part_element {
    ($part:ident) => {
        impl Styled for $part {
            fn style(&mut self) -> &mut StyleRefinement {
                &mut self.style
            }
        }

        impl ParentElement for $part {
            fn extend(&mut self, elements: impl IntoIterator<Item = AnyElement>) {
                self.children.extend(elements);
            }
        }
    };
}

pub mod checkbox;
pub mod dialog;
pub mod tabs;

mod change;
pub use change::ChangeHandler;
pub(crate) use change::ChangeCallback;

mod focus;
pub use focus::WindowFocusHost;

mod frame;
pub(crate) use frame::FrameMarker;

mod node;
pub(crate) use node::{PartNode, use_part_node};

actions!(headless, [Activate]);

/// Key context of parts that behave like buttons.
pub(crate) const BUTTON_CONTEXT: &str = "HeadlessButton";

pub fn init(cx: &mut App) {
    cx.bind_keys([
        KeyBinding::new("enter", Activate, Some(BUTTON_CONTEXT)),
        KeyBinding::new("space", Activate, Some(BUTTON_CONTEXT)),
    ]);
}

/// Panics with the lookup error when a part renders outside its Root.
pub(crate) fn require<S>(
    handle: &gpui_headless_core::ContextHandle<S>,
    part: &'static str,
) -> std::rc::Rc<gpui_headless_core::PrimitiveContext<S>> {
    match handle.require(part) {
        Ok(context) => context,
        Err(error) => panic!("{error}"),
    }
}
