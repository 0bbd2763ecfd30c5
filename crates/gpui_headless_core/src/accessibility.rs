#![allow(missing_docs)] // Derive macros generate undocumented methods.

use std::sync::Arc;

use enum_assoc::Assoc;
use serde::{Deserialize, Serialize, Serializer};

/// Semantic role of a rendered part.
#[derive(Assoc, Clone, Copy, Debug, PartialEq, Eq)]
#[func(pub fn as_str(&self) -> &'static str)]
pub enum Role {
    /// Triggers and close parts.
    #[assoc(as_str = "button")]
    Button,
    /// Dialog content.
    #[assoc(as_str = "dialog")]
    Dialog,
    /// Container of tab triggers.
    #[assoc(as_str = "tablist")]
    TabList,
    /// A tab trigger.
    #[assoc(as_str = "tab")]
    Tab,
    /// The panel a tab controls.
    #[assoc(as_str = "tabpanel")]
    TabPanel,
    /// A checkbox root.
    #[assoc(as_str = "checkbox")]
    Checkbox,
}

/// Layout axis of a group of parts (tab lists).
#[derive(Assoc, Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[func(pub fn as_str(&self) -> &'static str)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Left and right arrows move between parts.
    #[default]
    #[assoc(as_str = "horizontal")]
    Horizontal,
    /// Up and down arrows move between parts.
    #[assoc(as_str = "vertical")]
    Vertical,
}

/// Accessibility relationships and flags of one part.
///
/// Ids are derived from the owning Root's instance id, so the same instance always
/// yields the same props.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AccessibilityProps {
    /// The part's own generated id.
    pub id: Option<Arc<str>>,
    /// `role`.
    pub role: Option<Role>,
    /// `aria-labelledby`.
    pub labelled_by: Option<Arc<str>>,
    /// `aria-describedby`.
    pub described_by: Option<Arc<str>>,
    /// `aria-controls`.
    pub controls: Option<Arc<str>>,
    /// `aria-haspopup`.
    pub has_popup: Option<Role>,
    /// `aria-expanded`.
    pub expanded: Option<bool>,
    /// `aria-selected`.
    pub selected: Option<bool>,
    /// `aria-checked`: `"true"`, `"false"` or `"mixed"`.
    pub checked: Option<&'static str>,
    /// `aria-modal`.
    pub modal: Option<bool>,
    /// `aria-disabled`.
    pub disabled: Option<bool>,
    /// `aria-required`.
    pub required: Option<bool>,
    /// `aria-orientation`.
    pub orientation: Option<Orientation>,
    /// `tabindex`. `0` is in the tab order, `-1` only programmatically focusable.
    pub tab_index: Option<i8>,
    /// `data-state`, for styling.
    pub data_state: Option<&'static str>,
}

impl AccessibilityProps {
    /// Props with only a role set.
    pub fn new(role: Option<Role>) -> Self {
        Self {
            role,
            ..Self::default()
        }
    }

    /// Sets the part's id.
    pub fn id(mut self, id: impl Into<Arc<str>>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets `aria-labelledby`.
    pub fn labelled_by(mut self, id: impl Into<Arc<str>>) -> Self {
        self.labelled_by = Some(id.into());
        self
    }

    /// Sets `aria-describedby`.
    pub fn described_by(mut self, id: impl Into<Arc<str>>) -> Self {
        self.described_by = Some(id.into());
        self
    }

    /// Sets `aria-controls`.
    pub fn controls(mut self, id: impl Into<Arc<str>>) -> Self {
        self.controls = Some(id.into());
        self
    }

    /// Sets `aria-haspopup`.
    pub fn has_popup(mut self, role: Role) -> Self {
        self.has_popup = Some(role);
        self
    }

    /// Sets `aria-expanded`.
    pub fn expanded(mut self, expanded: bool) -> Self {
        self.expanded = Some(expanded);
        self
    }

    /// Sets `aria-selected`.
    pub fn selected(mut self, selected: bool) -> Self {
        self.selected = Some(selected);
        self
    }

    /// Sets `aria-checked`.
    pub fn checked(mut self, checked: &'static str) -> Self {
        self.checked = Some(checked);
        self
    }

    /// Sets `aria-modal`.
    pub fn modal(mut self, modal: bool) -> Self {
        self.modal = Some(modal);
        self
    }

    /// Only recorded when `true`.
    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled.then_some(true);
        self
    }

    /// Only recorded when `true`.
    pub fn required(mut self, required: bool) -> Self {
        self.required = required.then_some(true);
        self
    }

    /// Sets `aria-orientation`.
    pub fn orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = Some(orientation);
        self
    }

    /// Sets `tabindex`.
    pub fn tab_index(mut self, tab_index: i8) -> Self {
        self.tab_index = Some(tab_index);
        self
    }

    /// Sets `data-state`.
    pub fn data_state(mut self, state: &'static str) -> Self {
        self.data_state = Some(state);
        self
    }

    /// The props as DOM-style `(attribute, value)` pairs in a fixed order.
    pub fn attributes(&self) -> Vec<(&'static str, String)> {
        let mut attributes = Vec::new();
        let mut push = |name: &'static str, value: Option<String>| {
            if let Some(value) = value {
                attributes.push((name, value));
            }
        };

        push("id", self.id.as_deref().map(str::to_owned));
        push("role", self.role.map(|role| role.as_str().to_owned()));
        push("aria-labelledby", self.labelled_by.as_deref().map(str::to_owned));
        push("aria-describedby", self.described_by.as_deref().map(str::to_owned));
        push("aria-controls", self.controls.as_deref().map(str::to_owned));
        push("aria-haspopup", self.has_popup.map(|role| role.as_str().to_owned()));
        push("aria-expanded", self.expanded.map(|flag| flag.to_string()));
        push("aria-selected", self.selected.map(|flag| flag.to_string()));
        push("aria-checked", self.checked.map(str::to_owned));
        push("aria-modal", self.modal.map(|flag| flag.to_string()));
        push("aria-disabled", self.disabled.map(|flag| flag.to_string()));
        push("aria-required", self.required.map(|flag| flag.to_string()));
        push(
            "aria-orientation",
            self.orientation.map(|orientation| orientation.as_str().to_owned()),
        );
        push("tabindex", self.tab_index.map(|index| index.to_string()));
        push("data-state", self.data_state.map(str::to_owned));

        attributes
    }
}

impl Serialize for AccessibilityProps {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.attributes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attributes_skip_unset_props() {
        let props = AccessibilityProps::new(Some(Role::Tab)).id("t-a").selected(false);

        assert_eq!(
            props.attributes(),
            vec![
                ("id", "t-a".to_owned()),
                ("role", "tab".to_owned()),
                ("aria-selected", "false".to_owned()),
            ]
        );
    }

    #[test]
    fn test_disabled_is_only_recorded_when_set() {
        assert_eq!(AccessibilityProps::default().disabled(false).disabled, None);
        assert_eq!(AccessibilityProps::default().disabled(true).disabled, Some(true));
    }

    #[test]
    fn test_props_serialize_as_attribute_map() {
        let props = AccessibilityProps::new(Some(Role::Dialog))
            .id("d-content")
            .labelled_by("d-title")
            .modal(true)
            .data_state("open");

        let json = serde_json::to_value(&props).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": "d-content",
                "role": "dialog",
                "aria-labelledby": "d-title",
                "aria-modal": "true",
                "data-state": "open",
            })
        );
    }

    #[test]
    fn test_orientation_deserializes_lowercase() {
        let orientation: Orientation = serde_json::from_str("\"vertical\"").unwrap();
        assert_eq!(orientation, Orientation::Vertical);
        assert_eq!(Orientation::default().as_str(), "horizontal");
    }
}
