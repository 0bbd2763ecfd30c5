use std::{
    cell::{Cell, RefCell},
    sync::Arc,
};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    accessibility::{AccessibilityProps, Orientation, Role},
    context::PartIds,
    controllable::{Control, ControllableState, ModeMismatch, StateChange},
    focus::FocusHost,
    ref_merger::{NodeRef, RefSink},
};

/// Parts of a tabs root that get a generated id. Triggers and panels derive
/// theirs from their key.
pub const TABS_PARTS: [&str; 1] = ["list"];

/// Identifies a trigger and the panel it controls.
pub type TabKey = Arc<str>;

/// Rejected registry operations.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum TabsError {
    /// No trigger uses the key.
    #[error("no tab trigger is registered with key `{0}`")]
    UnknownKey(TabKey),
    /// Another trigger already uses the key.
    #[error("a tab trigger with key `{0}` is already registered")]
    DuplicateKey(TabKey),
    /// The trigger cannot be activated.
    #[error("tab trigger `{0}` is disabled")]
    Disabled(TabKey),
}

/// Whether moving focus between triggers also selects them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivationMode {
    /// Triggers are selected on click, enter or space only.
    #[default]
    Manual,
    /// Selection follows focus.
    Automatic,
}

/// Keys that move focus within a tab list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RovingKey {
    /// Previous trigger in a horizontal list.
    Left,
    /// Next trigger in a horizontal list.
    Right,
    /// Previous trigger in a vertical list.
    Up,
    /// Next trigger in a vertical list.
    Down,
    /// First enabled trigger.
    Home,
    /// Last enabled trigger.
    End,
}

/// Behaviour switches of a tabs root.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TabsOptions {
    /// Which arrow keys move focus.
    pub orientation: Orientation,
    /// Whether focus alone selects.
    pub activation: ActivationMode,
    /// Wrap from the last trigger to the first and back.
    pub loop_focus: bool,
}

impl Default for TabsOptions {
    fn default() -> Self {
        Self {
            orientation: Orientation::default(),
            activation: ActivationMode::default(),
            loop_focus: true,
        }
    }
}

struct TabEntry<N> {
    disabled: bool,
    node: NodeRef<N>,
}

/// Ordered trigger registry plus the selected key.
pub struct TabsMachine<N> {
    selected: ControllableState<Option<TabKey>>,
    triggers: RefCell<IndexMap<TabKey, TabEntry<N>>>,
    focused: RefCell<Option<TabKey>>,
    options: Cell<TabsOptions>,
    /// Set once any trigger has been selected. Later registrations never
    /// auto-select.
    has_selected: Cell<bool>,
}

type SelectionChange = StateChange<Option<TabKey>>;

impl<N: Clone + 'static> TabsMachine<N> {
    /// Creates an empty registry. An uncontrolled `None` leaves the choice to
    /// the first enabled trigger that registers.
    pub fn new(control: Control<Option<TabKey>>) -> Self {
        let selected = ControllableState::new(control);
        let has_selected = selected.get().is_some();
        Self {
            selected,
            triggers: RefCell::new(IndexMap::new()),
            focused: RefCell::new(None),
            options: Cell::new(TabsOptions::default()),
            has_selected: Cell::new(has_selected),
        }
    }

    /// Builder form of [`TabsMachine::set_options`].
    pub fn with_options(self, options: TabsOptions) -> Self {
        self.options.set(options);
        self
    }

    /// The options the tabs were last rendered with.
    pub fn options(&self) -> TabsOptions {
        self.options.get()
    }

    /// Replaces orientation, activation mode and looping. Takes effect on the
    /// next navigation.
    pub fn set_options(&self, options: TabsOptions) {
        self.options.set(options);
    }

    /// The underlying state cell, e.g. to attach a change callback.
    pub fn controllable(&self) -> &ControllableState<Option<TabKey>> {
        &self.selected
    }

    /// Whether the selected key is owned by the consumer.
    pub fn is_controlled(&self) -> bool {
        self.selected.is_controlled()
    }

    /// The key whose panel is shown, if any.
    pub fn selected_key(&self) -> Option<TabKey> {
        self.selected.get()
    }

    /// Whether the panel for `key` should render.
    pub fn is_selected(&self, key: &str) -> bool {
        self.selected_key().as_deref() == Some(key)
    }

    /// The trigger that currently has focus.
    pub fn focused_key(&self) -> Option<TabKey> {
        self.focused.borrow().clone()
    }

    /// Registered keys in registration order.
    pub fn keys(&self) -> Vec<TabKey> {
        self.triggers.borrow().keys().cloned().collect()
    }

    /// Whether a trigger with `key` is registered.
    pub fn is_registered(&self, key: &str) -> bool {
        self.triggers.borrow().contains_key(key)
    }

    /// Whether the registered trigger `key` is disabled. Unknown keys are not.
    pub fn is_disabled(&self, key: &str) -> bool {
        self.triggers
            .borrow()
            .get(key)
            .is_some_and(|entry| entry.disabled)
    }

    /// Internal ref of a registered trigger's node.
    pub fn node_ref(&self, key: &str) -> Option<NodeRef<N>> {
        self.triggers.borrow().get(key).map(|entry| entry.node.clone())
    }

    /// Adds a trigger at the end of the registry and returns the ref its node is
    /// tracked through.
    ///
    /// The first enabled trigger registered into an uncontrolled tabs root that
    /// has never had a selection becomes selected. Disabled triggers before it
    /// are skipped.
    pub fn register(
        &self,
        key: impl Into<TabKey>,
        disabled: bool,
    ) -> Result<NodeRef<N>, TabsError> {
        let key = key.into();
        let node = {
            let mut triggers = self.triggers.borrow_mut();
            if triggers.contains_key(&key) {
                return Err(TabsError::DuplicateKey(key));
            }
            let node = NodeRef::new();
            triggers.insert(
                key.clone(),
                TabEntry {
                    disabled,
                    node: node.clone(),
                },
            );
            node
        };

        if !disabled && !self.is_controlled() && !self.has_selected.get() {
            tracing::debug!(%key, "selecting the first enabled tab");
            self.select(key);
        }

        Ok(node)
    }

    /// Removes a trigger. A selected trigger leaves nothing selected.
    pub fn unregister(&self, key: &str) -> Option<SelectionChange> {
        let removed = self.triggers.borrow_mut().shift_remove(key);
        if let Some(entry) = removed {
            entry.node.accept(None);
        }

        {
            let mut focused = self.focused.borrow_mut();
            if focused.as_deref() == Some(key) {
                *focused = None;
            }
        }

        if !self.is_selected(key) {
            return None;
        }

        tracing::debug!(%key, "selected tab unregistered");
        let previous = self.selected_key();
        self.selected.set(None);
        Some(StateChange {
            previous,
            next: None,
        })
    }

    fn select(&self, key: TabKey) {
        self.has_selected.set(true);
        self.selected.set(Some(key));
    }

    /// Updates a registered trigger's disabled flag.
    pub fn set_disabled(&self, key: &str, disabled: bool) -> Result<(), TabsError> {
        let mut triggers = self.triggers.borrow_mut();
        let entry = triggers
            .get_mut(key)
            .ok_or_else(|| TabsError::UnknownKey(key.into()))?;
        entry.disabled = disabled;
        Ok(())
    }

    /// Selects the trigger with `key`. Re-activating the selected trigger requests
    /// nothing.
    pub fn activate(&self, key: &str) -> Result<Option<SelectionChange>, TabsError> {
        let key = {
            let triggers = self.triggers.borrow();
            let (key, entry) = triggers
                .get_key_value(key)
                .ok_or_else(|| TabsError::UnknownKey(key.into()))?;
            if entry.disabled {
                return Err(TabsError::Disabled(key.clone()));
            }
            key.clone()
        };

        *self.focused.borrow_mut() = Some(key.clone());

        let previous = self.selected_key();
        if previous.as_ref() == Some(&key) {
            return Ok(None);
        }

        tracing::debug!(%key, controlled = self.is_controlled(), "tab activated");
        self.select(key.clone());
        Ok(Some(StateChange {
            previous,
            next: Some(key),
        }))
    }

    /// Records which trigger has focus. Only selects in
    /// [`ActivationMode::Automatic`].
    pub fn focus_changed(&self, key: Option<&str>) -> Option<SelectionChange> {
        let key = key.and_then(|key| {
            self.triggers
                .borrow()
                .get_key_value(key)
                .map(|(key, _)| key.clone())
        });
        *self.focused.borrow_mut() = key.clone();

        match (self.options.get().activation, key) {
            (ActivationMode::Automatic, Some(key)) => self.activate(&key).ok().flatten(),
            _ => None,
        }
    }

    /// Moves focus to the trigger `key` points at, skipping disabled triggers.
    pub fn navigate(
        &self,
        key: RovingKey,
        host: &mut impl FocusHost<N>,
    ) -> Option<SelectionChange> {
        let from = self.focused_key().or_else(|| self.selected_key());
        let target = self.step(from.as_deref(), key)?;

        let node = self.node_ref(&target).and_then(|node| node.current());
        match node {
            Some(node) if host.is_mounted(&node) => host.focus(&node),
            _ => tracing::debug!(key = %target, "tab trigger has no mounted node"),
        }

        self.focus_changed(Some(&target))
    }

    fn step(&self, from: Option<&str>, key: RovingKey) -> Option<TabKey> {
        let triggers = self.triggers.borrow();
        let enabled: Vec<&TabKey> = triggers
            .iter()
            .filter(|(_, entry)| !entry.disabled)
            .map(|(key, _)| key)
            .collect();
        let last = enabled.len().checked_sub(1)?;
        let current = from.and_then(|from| enabled.iter().position(|key| &***key == from));

        let options = self.options.get();
        let (backward, forward) = match options.orientation {
            Orientation::Horizontal => (RovingKey::Left, RovingKey::Right),
            Orientation::Vertical => (RovingKey::Up, RovingKey::Down),
        };

        let index = match key {
            RovingKey::Home => 0,
            RovingKey::End => last,
            key if key == forward => match current {
                None => 0,
                Some(index) if index < last => index + 1,
                Some(_) if options.loop_focus => 0,
                Some(index) => index,
            },
            key if key == backward => match current {
                None => last,
                Some(0) if options.loop_focus => last,
                Some(0) => 0,
                Some(index) => index - 1,
            },
            _ => return None,
        };

        Some(enabled[index].clone())
    }

    /// The single trigger in the tab order: the focused one, else the selected
    /// one, else the first enabled one.
    pub fn tab_stop(&self) -> Option<TabKey> {
        let triggers = self.triggers.borrow();
        let enabled = |key: &TabKey| triggers.get(key).is_some_and(|entry| !entry.disabled);

        self.focused_key()
            .filter(enabled)
            .or_else(|| self.selected_key().filter(enabled))
            .or_else(|| {
                triggers
                    .iter()
                    .find(|(_, entry)| !entry.disabled)
                    .map(|(key, _)| key.clone())
            })
    }

    /// Applies the props of a new render.
    pub fn sync(&self, control: Control<Option<TabKey>>) -> Result<(), ModeMismatch> {
        let result = self.selected.sync(control);
        if self.selected_key().is_some() {
            self.has_selected.set(true);
        }
        result
    }

    /// Role and orientation of the list.
    pub fn list_props(&self, ids: &PartIds) -> AccessibilityProps {
        AccessibilityProps::new(Some(Role::TabList))
            .id(ids.id("list"))
            .orientation(self.options.get().orientation)
    }

    /// Only the current tab stop gets `tabindex` 0.
    pub fn trigger_props(&self, ids: &PartIds, key: &str) -> AccessibilityProps {
        let selected = self.is_selected(key);
        let tab_stop = self.tab_stop().as_deref() == Some(key);
        AccessibilityProps::new(Some(Role::Tab))
            .id(trigger_id(ids, key))
            .controls(content_id(ids, key))
            .selected(selected)
            .disabled(self.is_disabled(key))
            .tab_index(if tab_stop { 0 } else { -1 })
            .data_state(data_state(selected))
    }

    /// The panel is labelled by its trigger.
    pub fn content_props(&self, ids: &PartIds, key: &str) -> AccessibilityProps {
        AccessibilityProps::new(Some(Role::TabPanel))
            .id(content_id(ids, key))
            .labelled_by(trigger_id(ids, key))
            .tab_index(0)
            .data_state(data_state(self.is_selected(key)))
    }
}

/// Id of the trigger registered with `key`.
pub fn trigger_id(ids: &PartIds, key: &str) -> Arc<str> {
    ids.id(&format!("trigger-{key}"))
}

/// Id of the panel shown for `key`.
pub fn content_id(ids: &PartIds, key: &str) -> Arc<str> {
    ids.id(&format!("content-{key}"))
}

fn data_state(selected: bool) -> &'static str {
    if selected { "active" } else { "inactive" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        context::{ContextProvider, InstanceId},
        focus::testing::TestFocus,
    };

    fn tabs_with(keys: &[&str]) -> TabsMachine<u32> {
        let tabs = TabsMachine::new(Control::default());
        for (index, key) in keys.iter().enumerate() {
            let node = tabs.register(*key, false).unwrap();
            node.accept(Some(&(index as u32)));
        }
        tabs
    }

    #[test]
    fn test_nothing_selected_before_registration() {
        let tabs = TabsMachine::<u32>::new(Control::default());
        assert_eq!(tabs.selected_key(), None);
        assert_eq!(tabs.tab_stop(), None);
    }

    #[test]
    fn test_activation_moves_selection() {
        let tabs = tabs_with(&["a", "b", "c"]);
        assert_eq!(tabs.selected_key().as_deref(), Some("a"));

        let change = tabs.activate("b").unwrap();
        assert_eq!(
            change,
            Some(StateChange {
                previous: Some("a".into()),
                next: Some("b".into()),
            })
        );
        assert!(tabs.is_selected("b"));
        assert!(!tabs.is_selected("a"));

        assert_eq!(tabs.activate("b").unwrap(), None, "re-activation is a no-op");
    }

    #[test]
    fn test_unregistering_selected_trigger_clears_selection() {
        let tabs = tabs_with(&["a", "b", "c"]);
        tabs.activate("b").unwrap();

        let change = tabs.unregister("b");
        assert_eq!(change.map(|change| change.next), Some(None));
        assert_eq!(tabs.selected_key(), None, "no automatic reselection");
        assert_eq!(tabs.keys(), vec![TabKey::from("a"), TabKey::from("c")]);

        assert_eq!(tabs.unregister("a"), None);
    }

    #[test]
    fn test_registry_errors() {
        let tabs = tabs_with(&["a"]);
        assert_eq!(
            tabs.register("a", false).unwrap_err(),
            TabsError::DuplicateKey("a".into())
        );
        assert_eq!(
            tabs.activate("missing").unwrap_err(),
            TabsError::UnknownKey("missing".into())
        );

        tabs.register("b", true).unwrap();
        assert_eq!(tabs.activate("b").unwrap_err(), TabsError::Disabled("b".into()));
        tabs.set_disabled("b", false).unwrap();
        assert!(tabs.activate("b").is_ok());

        assert!(tabs.set_disabled("zzz", true).is_err());
    }

    #[test]
    fn test_controlled_tabs_only_request() {
        let tabs = TabsMachine::<u32>::new(Control::Controlled(None));
        tabs.register("a", false).unwrap();
        tabs.register("b", false).unwrap();
        assert_eq!(tabs.selected_key(), None, "controlled tabs never self-select");

        let change = tabs.activate("b").unwrap();
        assert_eq!(change.map(|change| change.next), Some(Some("b".into())));
        assert_eq!(tabs.selected_key(), None);

        tabs.sync(Control::Controlled(Some("b".into()))).unwrap();
        assert!(tabs.is_selected("b"));
    }

    #[test]
    fn test_manual_navigation_moves_focus_only() {
        let tabs = tabs_with(&["a", "b", "c"]);
        let mut focus = TestFocus::default();

        assert_eq!(tabs.navigate(RovingKey::Right, &mut focus), None);
        assert_eq!(focus.focused, Some(1));
        assert_eq!(tabs.focused_key().as_deref(), Some("b"));
        assert_eq!(tabs.selected_key().as_deref(), Some("a"));

        tabs.navigate(RovingKey::End, &mut focus);
        assert_eq!(focus.focused, Some(2));
        tabs.navigate(RovingKey::Right, &mut focus);
        assert_eq!(focus.focused, Some(0), "focus wraps");
        tabs.navigate(RovingKey::Left, &mut focus);
        assert_eq!(focus.focused, Some(2));

        assert_eq!(tabs.navigate(RovingKey::Down, &mut focus), None);
        assert_eq!(focus.moves, vec![1, 2, 0, 2], "vertical keys are ignored");
    }

    #[test]
    fn test_navigation_skips_disabled_and_can_stop_at_ends() {
        let tabs = TabsMachine::<u32>::new(Control::default()).with_options(TabsOptions {
            orientation: Orientation::Vertical,
            loop_focus: false,
            ..TabsOptions::default()
        });
        for (index, key) in ["a", "b", "c"].into_iter().enumerate() {
            tabs.register(key, key == "b")
                .unwrap()
                .accept(Some(&(index as u32)));
        }
        let mut focus = TestFocus::default();

        tabs.navigate(RovingKey::Down, &mut focus);
        assert_eq!(focus.focused, Some(2));
        tabs.navigate(RovingKey::Down, &mut focus);
        assert_eq!(focus.focused, Some(2));
        tabs.navigate(RovingKey::Home, &mut focus);
        assert_eq!(focus.focused, Some(0));
        tabs.navigate(RovingKey::Up, &mut focus);
        assert_eq!(focus.focused, Some(0));
    }

    #[test]
    fn test_automatic_activation_follows_focus() {
        let tabs = tabs_with(&["a", "b"]).with_options(TabsOptions {
            activation: ActivationMode::Automatic,
            ..TabsOptions::default()
        });
        let mut focus = TestFocus::default();

        let change = tabs.navigate(RovingKey::Right, &mut focus);
        assert_eq!(change.map(|change| change.next), Some(Some("b".into())));
        assert!(tabs.is_selected("b"));
    }

    #[test]
    fn test_roving_tab_stop() {
        let tabs = TabsMachine::<u32>::new(Control::default());
        tabs.register("a", true).unwrap();
        tabs.register("b", false).unwrap();
        tabs.register("c", false).unwrap();
        assert_eq!(
            tabs.selected_key().as_deref(),
            Some("b"),
            "the first enabled trigger is selected"
        );
        assert_eq!(tabs.tab_stop().as_deref(), Some("b"));

        tabs.activate("c").unwrap();
        assert_eq!(tabs.tab_stop().as_deref(), Some("c"));

        tabs.focus_changed(Some("b"));
        assert_eq!(tabs.tab_stop().as_deref(), Some("b"));
        assert!(tabs.is_selected("c"));
    }

    #[test]
    fn test_only_the_first_enabled_trigger_is_auto_selected() {
        let tabs = TabsMachine::<u32>::new(Control::default());
        tabs.register("a", true).unwrap();
        assert_eq!(tabs.selected_key(), None);

        tabs.register("b", false).unwrap();
        tabs.register("c", false).unwrap();
        assert_eq!(tabs.selected_key().as_deref(), Some("b"));

        tabs.unregister("b");
        tabs.register("d", false).unwrap();
        assert_eq!(
            tabs.selected_key(),
            None,
            "a trigger registering after the selection was cleared is not selected"
        );
    }

    #[test]
    fn test_default_selection_is_kept() {
        let tabs = TabsMachine::<u32>::new(Control::Uncontrolled(Some("c".into())));
        tabs.register("a", false).unwrap();
        tabs.register("c", false).unwrap();
        assert!(tabs.is_selected("c"));
    }

    #[test]
    fn test_trigger_and_panel_props() {
        let provider = ContextProvider::new(
            "TabsRoot",
            InstanceId::from_key("tabs"),
            &TABS_PARTS,
            tabs_with(&["a", "b"]),
        );
        let ids = &provider.part_ids;

        assert_eq!(
            provider.state.trigger_props(ids, "a").attributes(),
            vec![
                ("id", "tabs-trigger-a".to_owned()),
                ("role", "tab".to_owned()),
                ("aria-controls", "tabs-content-a".to_owned()),
                ("aria-selected", "true".to_owned()),
                ("tabindex", "0".to_owned()),
                ("data-state", "active".to_owned()),
            ]
        );
        assert_eq!(provider.state.trigger_props(ids, "b").tab_index, Some(-1));

        let panel = serde_json::to_value(provider.state.content_props(ids, "b")).unwrap();
        assert_eq!(
            panel,
            serde_json::json!({
                "id": "tabs-content-b",
                "role": "tabpanel",
                "aria-labelledby": "tabs-trigger-b",
                "tabindex": "0",
                "data-state": "inactive",
            })
        );

        let list = provider.state.list_props(ids);
        assert_eq!(list.orientation, Some(Orientation::Horizontal));
    }

    #[test]
    fn test_options_deserialize() {
        let options: TabsOptions =
            serde_json::from_str(r#"{ "orientation": "vertical", "activation": "automatic" }"#)
                .unwrap();
        assert_eq!(options.orientation, Orientation::Vertical);
        assert_eq!(options.activation, ActivationMode::Automatic);
        assert!(options.loop_focus);
    }
}
