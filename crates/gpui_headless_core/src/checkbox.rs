#![allow(missing_docs)] // Derive macros generate undocumented methods.

use std::cell::Cell;

use enum_assoc::Assoc;

use crate::{
    accessibility::{AccessibilityProps, Role},
    context::PartIds,
    controllable::{Control, ControllableState, ModeMismatch, StateChange},
};

/// Parts of a checkbox that get a generated id.
pub const CHECKBOX_PARTS: [&str; 2] = ["root", "indicator"];

/// Checked state of a checkbox.
#[derive(Assoc, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[func(pub fn aria_checked(&self) -> &'static str)]
#[func(pub fn as_str(&self) -> &'static str)]
pub enum CheckboxState {
    /// Not checked. The default.
    #[default]
    #[assoc(aria_checked = "false")]
    #[assoc(as_str = "unchecked")]
    Unchecked,
    /// Checked.
    #[assoc(aria_checked = "true")]
    #[assoc(as_str = "checked")]
    Checked,
    /// Neither checked nor unchecked, e.g. for a partially selected group.
    #[assoc(aria_checked = "mixed")]
    #[assoc(as_str = "indeterminate")]
    Indeterminate,
}

impl CheckboxState {
    /// The state an activation moves to. Indeterminate resolves to checked.
    pub fn toggled(self) -> Self {
        match self {
            Self::Checked => Self::Unchecked,
            Self::Unchecked | Self::Indeterminate => Self::Checked,
        }
    }

    /// Only true for [`CheckboxState::Checked`].
    pub fn is_checked(self) -> bool {
        self == Self::Checked
    }
}

impl From<bool> for CheckboxState {
    fn from(checked: bool) -> Self {
        if checked {
            Self::Checked
        } else {
            Self::Unchecked
        }
    }
}

/// Checkbox state plus its disabled and required flags.
pub struct CheckboxMachine {
    state: ControllableState<CheckboxState>,
    disabled: Cell<bool>,
    required: Cell<bool>,
}

impl CheckboxMachine {
    /// Creates an enabled, optional checkbox.
    pub fn new(control: Control<CheckboxState>) -> Self {
        Self {
            state: ControllableState::new(control),
            disabled: Cell::new(false),
            required: Cell::new(false),
        }
    }

    /// The rendered state. Controlled checkboxes only change through `sync`.
    pub fn state(&self) -> CheckboxState {
        self.state.get()
    }

    /// The underlying state cell, e.g. to attach a change callback.
    pub fn controllable(&self) -> &ControllableState<CheckboxState> {
        &self.state
    }

    /// Whether activation is currently ignored.
    pub fn is_disabled(&self) -> bool {
        self.disabled.get()
    }

    /// A disabled checkbox ignores activation and leaves the tab order.
    pub fn set_disabled(&self, disabled: bool) {
        self.disabled.set(disabled);
    }

    /// Whether the checkbox is marked required.
    pub fn is_required(&self) -> bool {
        self.required.get()
    }

    /// Only reflected in `aria-required`.
    pub fn set_required(&self, required: bool) {
        self.required.set(required);
    }

    /// Click or space. Disabled checkboxes ignore it.
    pub fn activate(&self) -> Option<StateChange<CheckboxState>> {
        if self.disabled.get() {
            return None;
        }

        let previous = self.state();
        let next = previous.toggled();
        tracing::debug!(?previous, ?next, "checkbox toggled");
        self.state.set(next);
        Some(StateChange { previous, next })
    }

    /// Applies the props of a new render.
    pub fn sync(&self, control: Control<CheckboxState>) -> Result<(), ModeMismatch> {
        self.state.sync(control)
    }

    /// Whether the indicator renders. Without `force_mount` only checked and
    /// indeterminate boxes show one.
    pub fn indicator_mounted(&self, force_mount: bool) -> bool {
        force_mount || self.state() != CheckboxState::Unchecked
    }

    /// Checked state, disabled and required flags of the box. Disabled boxes
    /// leave the tab order.
    pub fn root_props(&self, ids: &PartIds) -> AccessibilityProps {
        let state = self.state();
        AccessibilityProps::new(Some(Role::Checkbox))
            .id(ids.id("root"))
            .checked(state.aria_checked())
            .disabled(self.disabled.get())
            .required(self.required.get())
            .tab_index(if self.disabled.get() { -1 } else { 0 })
            .data_state(state.as_str())
    }

    /// Id and `data-state` of the indicator.
    pub fn indicator_props(&self, ids: &PartIds) -> AccessibilityProps {
        AccessibilityProps::new(None)
            .id(ids.id("indicator"))
            .data_state(self.state().as_str())
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::*;
    use crate::context::InstanceId;

    #[test]
    fn test_toggle_twice_returns_to_start() {
        for start in [CheckboxState::Unchecked, CheckboxState::Checked] {
            let checkbox = CheckboxMachine::new(Control::Uncontrolled(start));
            checkbox.activate();
            assert_ne!(checkbox.state(), start);
            checkbox.activate();
            assert_eq!(checkbox.state(), start);
        }
    }

    #[test]
    fn test_indeterminate_activates_to_checked() {
        let checkbox = CheckboxMachine::new(Control::Uncontrolled(CheckboxState::Indeterminate));
        let change = checkbox.activate();
        assert_eq!(
            change,
            Some(StateChange {
                previous: CheckboxState::Indeterminate,
                next: CheckboxState::Checked,
            })
        );
        assert_eq!(checkbox.state(), CheckboxState::Checked);
    }

    #[test]
    fn test_disabled_checkbox_ignores_activation() {
        let checkbox = CheckboxMachine::new(Control::default());
        checkbox.set_disabled(true);
        assert_eq!(checkbox.activate(), None);
        assert_eq!(checkbox.state(), CheckboxState::Unchecked);
    }

    #[test]
    fn test_controlled_checkbox_requests_only() {
        let requested = Rc::new(RefCell::new(Vec::new()));
        let checkbox = CheckboxMachine::new(Control::Controlled(CheckboxState::Indeterminate));
        checkbox.controllable().set_on_change(Some({
            let requested = requested.clone();
            Rc::new(move |next: &CheckboxState| requested.borrow_mut().push(*next))
        }));

        checkbox.activate();
        assert_eq!(checkbox.state(), CheckboxState::Indeterminate);
        assert_eq!(*requested.borrow(), vec![CheckboxState::Checked]);

        checkbox.sync(Control::Controlled(CheckboxState::Checked)).unwrap();
        assert!(checkbox.state().is_checked());
    }

    #[test]
    fn test_indicator_follows_state() {
        let checkbox = CheckboxMachine::new(Control::default());
        assert!(!checkbox.indicator_mounted(false));
        assert!(checkbox.indicator_mounted(true));

        checkbox.activate();
        assert!(checkbox.indicator_mounted(false));
    }

    #[test]
    fn test_root_props() {
        let ids = PartIds::new(&InstanceId::from_key("terms"), &CHECKBOX_PARTS);
        let checkbox = CheckboxMachine::new(Control::Uncontrolled(CheckboxState::Indeterminate));
        checkbox.set_required(true);

        assert_eq!(
            serde_json::to_value(checkbox.root_props(&ids)).unwrap(),
            serde_json::json!({
                "id": "terms-root",
                "role": "checkbox",
                "aria-checked": "mixed",
                "aria-required": "true",
                "tabindex": "0",
                "data-state": "indeterminate",
            })
        );
        assert_eq!(
            checkbox.indicator_props(&ids).data_state,
            Some("indeterminate")
        );
    }
}
