pub mod primitives;

pub mod extensions;

mod utils;
pub use utils::{ElementIdExt, part_element_id};

mod init;
pub use init::*;

pub use gpui_headless_core as core;
pub use gpui_headless_core::{
    AccessibilityProps, ActivationMode, CheckboxState, Control, DialogOptions, DialogState,
    DismissReason, NodeRef, NodeSink, Orientation, Role, TabKey, TabsOptions, merge_refs,
};
