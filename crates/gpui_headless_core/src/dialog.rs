use std::cell::{Cell, RefCell};

use serde::{Deserialize, Serialize};

use crate::{
    accessibility::{AccessibilityProps, Role},
    context::PartIds,
    controllable::{Control, ControllableState, ModeMismatch, StateChange},
    focus::FocusHost,
    ref_merger::NodeRef,
};

/// Parts of a dialog that get a generated id.
pub const DIALOG_PARTS: [&str; 6] = [
    "trigger",
    "overlay",
    "content",
    "title",
    "description",
    "close",
];

/// Open state of a dialog.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DialogState {
    /// Only the trigger renders.
    #[default]
    Closed,
    /// Overlay and content render.
    Open,
}

impl DialogState {
    /// Returns true for [`DialogState::Open`].
    pub fn is_open(self) -> bool {
        self == Self::Open
    }

    /// `data-state` value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Open => "open",
        }
    }
}

impl From<bool> for DialogState {
    fn from(open: bool) -> Self {
        if open { Self::Open } else { Self::Closed }
    }
}

/// Behaviour switches of a dialog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DialogOptions {
    /// Content blocks pointer input to the rest of the window.
    pub modal: bool,
    /// Escape inside the content dismisses the dialog.
    pub close_on_escape: bool,
    /// Clicking the overlay dismisses the dialog.
    pub close_on_overlay_click: bool,
    /// Return focus to the trigger (or the element focused at open) on close.
    pub restore_focus: bool,
}

impl Default for DialogOptions {
    fn default() -> Self {
        Self {
            modal: true,
            close_on_escape: true,
            close_on_overlay_click: true,
            restore_focus: true,
        }
    }
}

/// What asked an open dialog to close.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DismissReason {
    /// A close part was activated. Always honoured.
    CloseButton,
    /// The overlay was clicked.
    Overlay,
    /// Escape was pressed inside the content.
    Escape,
}

#[derive(Clone, Debug, PartialEq)]
enum ReturnFocus<N> {
    Trigger,
    Node(N),
}

/// The dialog state machine and its focus policy.
///
/// Transitions are applied to the state first. The focus side effects run when the
/// machine observes the new state, which for a controlled dialog only happens once
/// the consumer passes the requested value back through [`DialogMachine::sync`].
pub struct DialogMachine<N> {
    state: ControllableState<DialogState>,
    options: Cell<DialogOptions>,
    trigger: NodeRef<N>,
    content: NodeRef<N>,
    focusables: RefCell<Vec<N>>,
    return_focus: RefCell<Option<ReturnFocus<N>>>,
    observed: Cell<DialogState>,
    pending_focus: Cell<bool>,
}

impl<N: Clone + PartialEq + 'static> DialogMachine<N> {
    /// Creates a machine with default options. A dialog that starts open focuses
    /// its content as soon as the content mounts.
    pub fn new(control: Control<DialogState>) -> Self {
        let state = ControllableState::new(control);
        let observed = state.get();
        Self {
            state,
            options: Cell::new(DialogOptions::default()),
            trigger: NodeRef::new(),
            content: NodeRef::new(),
            focusables: RefCell::new(Vec::new()),
            return_focus: RefCell::new(None),
            observed: Cell::new(observed),
            pending_focus: Cell::new(observed.is_open()),
        }
    }

    /// Builder form of [`DialogMachine::set_options`].
    pub fn with_options(self, options: DialogOptions) -> Self {
        self.options.set(options);
        self
    }

    /// The options the dialog was last rendered with.
    pub fn options(&self) -> DialogOptions {
        self.options.get()
    }

    /// Replaces the options. Read at the next dismissal or close.
    pub fn set_options(&self, options: DialogOptions) {
        self.options.set(options);
    }

    /// The rendered state. For a controlled dialog this is the last value the
    /// consumer passed in.
    pub fn state(&self) -> DialogState {
        self.state.get()
    }

    /// Shorthand for `state().is_open()`.
    pub fn is_open(&self) -> bool {
        self.state().is_open()
    }

    /// Whether the open state is owned by the consumer.
    pub fn is_controlled(&self) -> bool {
        self.state.is_controlled()
    }

    /// The underlying state cell, e.g. to attach a change callback.
    pub fn controllable(&self) -> &ControllableState<DialogState> {
        &self.state
    }

    /// Internal ref the trigger merges with the consumer's ref.
    pub fn trigger_ref(&self) -> NodeRef<N> {
        self.trigger.clone()
    }

    /// Internal ref the content merges with the consumer's ref.
    pub fn content_ref(&self) -> NodeRef<N> {
        self.content.clone()
    }

    /// Registers a focusable node inside the content, in tab order. The first
    /// mounted one receives focus when the dialog opens.
    pub fn register_focusable(&self, node: N) {
        let mut focusables = self.focusables.borrow_mut();
        if !focusables.contains(&node) {
            focusables.push(node);
        }
    }

    /// Removes a node registered with [`DialogMachine::register_focusable`].
    pub fn unregister_focusable(&self, node: &N) {
        self.focusables.borrow_mut().retain(|existing| existing != node);
    }

    /// Forgets every registered focusable. Called before the parts of a new
    /// frame register again, so the list follows render order.
    pub fn clear_focusables(&self) {
        self.focusables.borrow_mut().clear();
    }

    /// Registered focusables in registration order.
    pub fn focusables(&self) -> Vec<N> {
        self.focusables.borrow().clone()
    }

    /// A trigger was activated. No-op while open.
    pub fn activate_trigger(
        &self,
        host: &mut impl FocusHost<N>,
    ) -> Option<StateChange<DialogState>> {
        if self.is_open() {
            return None;
        }
        *self.return_focus.borrow_mut() = Some(ReturnFocus::Trigger);
        self.request(DialogState::Open, host)
    }

    /// The close part was activated.
    pub fn close(&self, host: &mut impl FocusHost<N>) -> Option<StateChange<DialogState>> {
        self.dismiss(DismissReason::CloseButton, host)
    }

    /// Requests `Closed` unless the options disallow `reason`.
    pub fn dismiss(
        &self,
        reason: DismissReason,
        host: &mut impl FocusHost<N>,
    ) -> Option<StateChange<DialogState>> {
        if !self.is_open() {
            return None;
        }

        let options = self.options.get();
        let allowed = match reason {
            DismissReason::CloseButton => true,
            DismissReason::Overlay => options.close_on_overlay_click,
            DismissReason::Escape => options.close_on_escape,
        };
        if !allowed {
            tracing::debug!(?reason, "dialog dismissal disabled by options");
            return None;
        }

        self.request(DialogState::Closed, host)
    }

    /// Imperative open/close, e.g. from a menu command.
    pub fn set_open(
        &self,
        open: bool,
        host: &mut impl FocusHost<N>,
    ) -> Option<StateChange<DialogState>> {
        let next = DialogState::from(open);
        if next == self.state() {
            return None;
        }
        self.request(next, host)
    }

    /// Applies the props of a new render and runs any focus side effects.
    pub fn sync(
        &self,
        control: Control<DialogState>,
        host: &mut impl FocusHost<N>,
    ) -> Result<(), ModeMismatch> {
        let result = self.state.sync(control);
        self.reconcile(host);
        result
    }

    fn request(
        &self,
        next: DialogState,
        host: &mut impl FocusHost<N>,
    ) -> Option<StateChange<DialogState>> {
        let previous = self.state();
        tracing::debug!(?previous, ?next, controlled = self.is_controlled(), "dialog transition");
        self.state.set(next);
        self.reconcile(host);
        Some(StateChange { previous, next })
    }

    /// Runs the focus policy for a state change observed since the last call.
    pub fn reconcile(&self, host: &mut impl FocusHost<N>) {
        let now = self.state.get();
        let before = self.observed.replace(now);

        match (before, now) {
            (DialogState::Closed, DialogState::Open) => {
                {
                    let mut return_focus = self.return_focus.borrow_mut();
                    let from_trigger = matches!(*return_focus, Some(ReturnFocus::Trigger))
                        && self.trigger.is_attached();
                    if !from_trigger {
                        *return_focus = host.focused().map(ReturnFocus::Node);
                    }
                }
                self.pending_focus.set(true);
                self.focus_content(host);
            }
            (DialogState::Open, DialogState::Closed) => {
                self.pending_focus.set(false);
                self.clear_focusables();
                let target = self.return_focus.borrow_mut().take();
                if !self.options.get().restore_focus {
                    return;
                }

                let node = match target {
                    Some(ReturnFocus::Trigger) => self.trigger.current(),
                    Some(ReturnFocus::Node(node)) => Some(node),
                    None => None,
                };
                match node {
                    Some(node) if host.is_mounted(&node) => host.focus(&node),
                    Some(_) => tracing::debug!("focus return target is no longer mounted"),
                    None => {}
                }
            }
            _ => {}
        }
    }

    /// Resolves a focus request that was held until the content mounted.
    pub fn content_mounted(&self, host: &mut impl FocusHost<N>) {
        self.focus_content(host);
    }

    /// Returns true while an open request is waiting for the content node.
    pub fn has_pending_focus(&self) -> bool {
        self.pending_focus.get()
    }

    fn focus_content(&self, host: &mut impl FocusHost<N>) {
        if !self.pending_focus.get() || !self.is_open() {
            return;
        }

        let first_focusable = self
            .focusables
            .borrow()
            .iter()
            .find(|node| host.is_mounted(node))
            .cloned();
        let target = first_focusable.or_else(|| self.content.current());

        if let Some(target) = target {
            self.pending_focus.set(false);
            host.focus(&target);
        }
    }

    /// Button that opens the dialog and controls the content.
    pub fn trigger_props(&self, ids: &PartIds) -> AccessibilityProps {
        let state = self.state();
        AccessibilityProps::new(Some(Role::Button))
            .id(ids.id("trigger"))
            .has_popup(Role::Dialog)
            .expanded(state.is_open())
            .controls(ids.id("content"))
            .data_state(state.as_str())
    }

    /// Id and `data-state` of the overlay.
    pub fn overlay_props(&self, ids: &PartIds) -> AccessibilityProps {
        AccessibilityProps::new(None)
            .id(ids.id("overlay"))
            .data_state(self.state().as_str())
    }

    /// Labelled by the title and described by the description.
    pub fn content_props(&self, ids: &PartIds) -> AccessibilityProps {
        AccessibilityProps::new(Some(Role::Dialog))
            .id(ids.id("content"))
            .labelled_by(ids.id("title"))
            .described_by(ids.id("description"))
            .modal(self.options.get().modal)
            .tab_index(-1)
            .data_state(self.state().as_str())
    }

    /// The title's id is the content's `labelled_by`.
    pub fn title_props(&self, ids: &PartIds) -> AccessibilityProps {
        AccessibilityProps::new(None).id(ids.id("title"))
    }

    /// The description's id is the content's `described_by`.
    pub fn description_props(&self, ids: &PartIds) -> AccessibilityProps {
        AccessibilityProps::new(None).id(ids.id("description"))
    }

    /// A button. Every close part of a dialog shares these props.
    pub fn close_props(&self, ids: &PartIds) -> AccessibilityProps {
        AccessibilityProps::new(Some(Role::Button)).id(ids.id("close"))
    }
}
