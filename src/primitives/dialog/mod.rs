use std::{cell::Cell, rc::Rc};

use gpui::{
    AnyElement, App, ElementId, KeyBinding, StyleRefinement, WeakFocusHandle, Window, actions,
    div, prelude::*,
};
use gpui_headless_core::{
    AccessibilityProps, ContextHandle, ContextProvider, Control, DIALOG_PARTS, DialogMachine,
    DialogOptions, DialogState, InstanceId, PartIds, StateChange,
};
use smallvec::SmallVec;

use crate::{
    ElementIdExt,
    primitives::{ChangeCallback, ChangeHandler, FrameMarker, WindowFocusHost},
};

mod parts;
pub use parts::*;

actions!(dialog, [Dismiss]);

pub(crate) const CONTENT_CONTEXT: &str = "DialogContent";

pub fn init(cx: &mut App) {
    cx.bind_keys([KeyBinding::new("escape", Dismiss, Some(CONTENT_CONTEXT))]);
}

/// State a [`DialogRoot`] shares with its parts.
pub struct DialogScope {
    pub machine: DialogMachine<WeakFocusHandle>,
    on_open_change: ChangeCallback<bool>,
    /// Close parts rendered so far in the current frame.
    close_parts: Cell<usize>,
    frame: FrameMarker,
}

impl DialogScope {
    fn new(control: Control<DialogState>) -> Self {
        Self {
            machine: DialogMachine::new(control),
            on_open_change: ChangeCallback::new(),
            close_parts: Cell::new(0),
            frame: FrameMarker::default(),
        }
    }

    /// Drops the previous frame's focusables and close part count when the
    /// first part of a frame renders.
    pub(crate) fn begin_part(&self, window: &mut Window, cx: &mut App) {
        if self.frame.begin(window, cx) {
            self.close_parts.set(0);
            self.machine.clear_focusables();
        }
    }

    /// Position of a close part among those rendered in this frame.
    pub(crate) fn next_close_index(&self, window: &mut Window, cx: &mut App) -> usize {
        self.begin_part(window, cx);
        let index = self.close_parts.get();
        self.close_parts.set(index + 1);
        index
    }

    pub(crate) fn register_focusable(
        &self,
        node: WeakFocusHandle,
        window: &mut Window,
        cx: &mut App,
    ) {
        self.begin_part(window, cx);
        self.machine.register_focusable(node);
    }

    fn emit(&self, change: Option<StateChange<DialogState>>, window: &mut Window, cx: &mut App) {
        self.on_open_change
            .emit(change.map(|change| change.next.is_open()), window, cx);
    }
}

/// What dialog parts are constructed with.
pub type DialogHandle = ContextHandle<DialogScope>;

/// Runs a transition against the dialog's machine and reports the requested
/// state to the Root's `on_open_change`.
pub(crate) fn transition(
    handle: &DialogHandle,
    window: &mut Window,
    cx: &mut App,
    f: impl FnOnce(
        &DialogMachine<WeakFocusHandle>,
        &mut WindowFocusHost,
    ) -> Option<StateChange<DialogState>>,
) {
    handle.dispatch(|context| {
        let change = f(&context.state.machine, &mut WindowFocusHost::new(window, cx));
        context.state.emit(change, window, cx);
    });
}

/// Imperative access to a dialog from outside its parts.
///
/// The `*_props` accessors return `None` once the Root has unmounted.
pub trait DialogHandleExt {
    fn is_open(&self) -> bool;

    /// Opens or closes the dialog as if a trigger or close part was activated.
    fn set_open(&self, open: bool, window: &mut Window, cx: &mut App);

    fn trigger_props(&self) -> Option<AccessibilityProps>;
    fn overlay_props(&self) -> Option<AccessibilityProps>;
    fn content_props(&self) -> Option<AccessibilityProps>;
    fn title_props(&self) -> Option<AccessibilityProps>;
    fn description_props(&self) -> Option<AccessibilityProps>;
    fn close_props(&self) -> Option<AccessibilityProps>;
}

fn part_props(
    handle: &DialogHandle,
    props: impl FnOnce(&DialogMachine<WeakFocusHandle>, &PartIds) -> AccessibilityProps,
) -> Option<AccessibilityProps> {
    handle.dispatch(|context| props(&context.state.machine, &context.part_ids))
}

impl DialogHandleExt for DialogHandle {
    fn is_open(&self) -> bool {
        self.dispatch(|context| context.state.machine.is_open())
            .unwrap_or(false)
    }

    fn set_open(&self, open: bool, window: &mut Window, cx: &mut App) {
        transition(self, window, cx, |machine, host| machine.set_open(open, host));
    }

    fn trigger_props(&self) -> Option<AccessibilityProps> {
        part_props(self, DialogMachine::trigger_props)
    }

    fn overlay_props(&self) -> Option<AccessibilityProps> {
        part_props(self, DialogMachine::overlay_props)
    }

    fn content_props(&self) -> Option<AccessibilityProps> {
        part_props(self, DialogMachine::content_props)
    }

    fn title_props(&self) -> Option<AccessibilityProps> {
        part_props(self, DialogMachine::title_props)
    }

    fn description_props(&self) -> Option<AccessibilityProps> {
        part_props(self, DialogMachine::description_props)
    }

    fn close_props(&self) -> Option<AccessibilityProps> {
        part_props(self, DialogMachine::close_props)
    }
}

/// Owns a dialog instance. Every other dialog part takes this Root's
/// [`DialogRoot::handle`].
#[derive(IntoElement)]
pub struct DialogRoot {
    provider: ContextProvider<DialogScope>,
    control: Control<DialogState>,
    options: DialogOptions,
    on_open_change: Option<ChangeHandler<bool>>,
    style: StyleRefinement,
    children: SmallVec<[AnyElement; 2]>,
}

impl DialogRoot {
    /// Creates (or, on later renders, looks up) the dialog keyed by `id`.
    ///
    /// `Control::Controlled(open)` makes the consumer the owner of the open state
    /// for the instance's lifetime.
    pub fn new(
        id: impl Into<ElementId>,
        open: Control<bool>,
        window: &mut Window,
        cx: &mut App,
    ) -> Self {
        let id = id.into();
        let control = open.map(DialogState::from);

        let provider = window
            .use_keyed_state(id.with_suffix("state:context"), cx, |_window, _cx| {
                ContextProvider::new(
                    "DialogRoot",
                    InstanceId::generate("dialog"),
                    &DIALOG_PARTS,
                    DialogScope::new(control),
                )
            })
            .read(cx)
            .clone();

        Self {
            provider,
            control,
            options: DialogOptions::default(),
            on_open_change: None,
            style: StyleRefinement::default(),
            children: SmallVec::new(),
        }
    }

    pub fn handle(&self) -> DialogHandle {
        self.provider.handle()
    }

    pub fn options(mut self, options: DialogOptions) -> Self {
        self.options = options;
        self
    }

    pub fn modal(mut self, modal: bool) -> Self {
        self.options.modal = modal;
        self
    }

    /// Called with the requested open state whenever a part asks to open or close.
    pub fn on_open_change(
        mut self,
        on_open_change: impl Fn(&bool, &mut Window, &mut App) + 'static,
    ) -> Self {
        self.on_open_change = Some(Rc::new(on_open_change));
        self
    }
}

part_element!(DialogRoot);

impl RenderOnce for DialogRoot {
    fn render(self, window: &mut Window, cx: &mut App) -> impl IntoElement {
        let scope = &self.provider.state;
        scope.on_open_change.set(self.on_open_change);
        scope.machine.set_options(self.options);

        // A switch of mode is reported by the state cell and otherwise ignored.
        let _ = scope
            .machine
            .sync(self.control, &mut WindowFocusHost::new(window, cx));

        let style = self.style;

        div()
            .id(ElementId::Name(self.provider.instance_id.to_string().into()))
            .map(|mut this| {
                this.style().refine(&style);
                this
            })
            .children(self.children)
    }
}
