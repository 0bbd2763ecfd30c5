//! Toolkit-independent state for headless UI primitives.
//!
//! Everything in this crate is single-threaded and synchronous. A Root part owns a
//! [`ContextProvider`]; every other part of the same primitive holds a
//! [`ContextHandle`] and only ever requests transitions through it.
#![warn(missing_docs)]

/// Merging of node reference sinks.
pub mod ref_merger;

/// State that is either owned by the consumer or managed internally.
pub mod controllable;

/// Per-instance shared context and generated identifiers.
pub mod context;

/// Accessibility descriptors shared by all primitives.
pub mod accessibility;

/// Focus movement abstraction used by the primitives' focus policies.
pub mod focus;

/// Modal dialog state machine.
pub mod dialog;

/// Single-selection tabs state machine with roving focus.
pub mod tabs;

/// Tri-state checkbox state machine.
pub mod checkbox;

pub use accessibility::{AccessibilityProps, Orientation, Role};
pub use checkbox::{CHECKBOX_PARTS, CheckboxMachine, CheckboxState};
pub use context::{
    ContextError, ContextHandle, ContextProvider, InstanceId, PartIds, PrimitiveContext,
};
pub use controllable::{Control, ControllableState, ModeMismatch, OnChange, StateChange};
pub use dialog::{DIALOG_PARTS, DialogMachine, DialogOptions, DialogState, DismissReason};
pub use focus::FocusHost;
pub use ref_merger::{MergedRef, NodeRef, NodeSink, RefSink, merge_refs};
pub use tabs::{
    ActivationMode, RovingKey, TABS_PARTS, TabKey, TabsError, TabsMachine, TabsOptions,
    content_id, trigger_id,
};
