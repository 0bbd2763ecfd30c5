use std::{cell::RefCell, collections::HashSet, rc::Rc};

use gpui::{
    AnyElement, App, ElementId, KeyBinding, StyleRefinement, WeakFocusHandle, Window, actions,
    div, prelude::*,
};
use gpui_headless_core::{
    AccessibilityProps, ActivationMode, ContextHandle, ContextProvider, Control, InstanceId,
    Orientation, StateChange, TABS_PARTS, TabKey, TabsMachine, TabsOptions,
};
use smallvec::SmallVec;

use crate::{
    ElementIdExt,
    primitives::{ChangeCallback, ChangeHandler, FrameMarker},
};

mod parts;
pub use parts::*;

actions!(
    tabs,
    [FocusLeft, FocusRight, FocusUp, FocusDown, FocusFirst, FocusLast]
);

pub(crate) const LIST_CONTEXT: &str = "TabsList";

pub fn init(cx: &mut App) {
    cx.bind_keys([
        KeyBinding::new("left", FocusLeft, Some(LIST_CONTEXT)),
        KeyBinding::new("right", FocusRight, Some(LIST_CONTEXT)),
        KeyBinding::new("up", FocusUp, Some(LIST_CONTEXT)),
        KeyBinding::new("down", FocusDown, Some(LIST_CONTEXT)),
        KeyBinding::new("home", FocusFirst, Some(LIST_CONTEXT)),
        KeyBinding::new("end", FocusLast, Some(LIST_CONTEXT)),
    ]);
}

/// State a [`TabsRoot`] shares with its parts.
pub struct TabsScope {
    pub machine: TabsMachine<WeakFocusHandle>,
    on_value_change: ChangeCallback<Option<TabKey>>,
    /// Keys whose trigger rendered in the current frame.
    rendered_keys: RefCell<HashSet<TabKey>>,
    frame: FrameMarker,
}

impl TabsScope {
    fn new(control: Control<Option<TabKey>>) -> Self {
        Self {
            machine: TabsMachine::new(control),
            on_value_change: ChangeCallback::new(),
            rendered_keys: RefCell::new(HashSet::new()),
            frame: FrameMarker::default(),
        }
    }

    fn emit(
        &self,
        change: Option<StateChange<Option<TabKey>>>,
        window: &mut Window,
        cx: &mut App,
    ) {
        self.on_value_change
            .emit(change.map(|change| change.next), window, cx);
    }

    /// Claims `key` for a trigger rendering in this frame. Returns false when
    /// another trigger already rendered with the same key.
    pub(crate) fn claim_key(&self, key: &TabKey, window: &mut Window, cx: &mut App) -> bool {
        let mut rendered_keys = self.rendered_keys.borrow_mut();
        if self.frame.begin(window, cx) {
            rendered_keys.clear();
        }
        rendered_keys.insert(key.clone())
    }

    /// Unregisters a released trigger and reports a cleared selection.
    pub(crate) fn trigger_unmounted(&self, key: &str, window: &mut Window, cx: &mut App) {
        let change = self.machine.unregister(key);
        self.emit(change, window, cx);
    }
}

/// What tabs parts are constructed with.
pub type TabsHandle = ContextHandle<TabsScope>;

pub(crate) fn transition(
    handle: &TabsHandle,
    window: &mut Window,
    cx: &mut App,
    f: impl FnOnce(&TabsScope, &mut Window, &mut App) -> Option<StateChange<Option<TabKey>>>,
) {
    handle.dispatch(|context| {
        let change = f(&context.state, window, cx);
        context.state.emit(change, window, cx);
    });
}

/// Imperative access to a tabs instance from outside its parts.
pub trait TabsHandleExt {
    fn selected_key(&self) -> Option<TabKey>;

    /// Selects `key` as if its trigger was activated. Unknown and disabled keys
    /// are logged and ignored.
    fn select(&self, key: &str, window: &mut Window, cx: &mut App);

    fn list_props(&self) -> Option<AccessibilityProps>;

    /// Role, ids and selection state of the trigger for `key`.
    fn trigger_props(&self, key: &str) -> Option<AccessibilityProps>;

    fn content_props(&self, key: &str) -> Option<AccessibilityProps>;
}

impl TabsHandleExt for TabsHandle {
    fn selected_key(&self) -> Option<TabKey> {
        self.dispatch(|context| context.state.machine.selected_key())
            .flatten()
    }

    fn select(&self, key: &str, window: &mut Window, cx: &mut App) {
        transition(self, window, cx, |scope, _window, _cx| {
            activate_logged(&scope.machine, key)
        });
    }

    fn list_props(&self) -> Option<AccessibilityProps> {
        self.dispatch(|context| context.state.machine.list_props(&context.part_ids))
    }

    fn trigger_props(&self, key: &str) -> Option<AccessibilityProps> {
        self.dispatch(|context| context.state.machine.trigger_props(&context.part_ids, key))
    }

    fn content_props(&self, key: &str) -> Option<AccessibilityProps> {
        self.dispatch(|context| context.state.machine.content_props(&context.part_ids, key))
    }
}

pub(crate) fn activate_logged(
    machine: &TabsMachine<WeakFocusHandle>,
    key: &str,
) -> Option<StateChange<Option<TabKey>>> {
    machine
        .activate(key)
        .inspect_err(|error| tracing::warn!(%error, "tab activation rejected"))
        .ok()
        .flatten()
}

/// Owns a tabs instance: the registry of triggers and the selected key.
#[derive(IntoElement)]
pub struct TabsRoot {
    provider: ContextProvider<TabsScope>,
    control: Control<Option<TabKey>>,
    options: TabsOptions,
    on_value_change: Option<ChangeHandler<Option<TabKey>>>,
    style: StyleRefinement,
    children: SmallVec<[AnyElement; 2]>,
}

impl TabsRoot {
    /// Creates (or, on later renders, looks up) the tabs keyed by `id`.
    ///
    /// With `Control::Uncontrolled(None)` the first enabled trigger to register
    /// becomes selected.
    pub fn new(
        id: impl Into<ElementId>,
        selected: Control<Option<TabKey>>,
        window: &mut Window,
        cx: &mut App,
    ) -> Self {
        let id = id.into();
        let control = selected.clone();

        let provider = window
            .use_keyed_state(id.with_suffix("state:context"), cx, move |_window, _cx| {
                ContextProvider::new(
                    "TabsRoot",
                    InstanceId::generate("tabs"),
                    &TABS_PARTS,
                    TabsScope::new(control),
                )
            })
            .read(cx)
            .clone();

        Self {
            provider,
            control: selected,
            options: TabsOptions::default(),
            on_value_change: None,
            style: StyleRefinement::default(),
            children: SmallVec::new(),
        }
    }

    pub fn handle(&self) -> TabsHandle {
        self.provider.handle()
    }

    pub fn options(mut self, options: TabsOptions) -> Self {
        self.options = options;
        self
    }

    pub fn orientation(mut self, orientation: Orientation) -> Self {
        self.options.orientation = orientation;
        self
    }

    pub fn activation_mode(mut self, activation: ActivationMode) -> Self {
        self.options.activation = activation;
        self
    }

    pub fn loop_focus(mut self, loop_focus: bool) -> Self {
        self.options.loop_focus = loop_focus;
        self
    }

    /// Called with the requested key whenever a trigger asks to be selected, and
    /// with `None` when the selected trigger unmounts.
    pub fn on_value_change(
        mut self,
        on_value_change: impl Fn(&Option<TabKey>, &mut Window, &mut App) + 'static,
    ) -> Self {
        self.on_value_change = Some(Rc::new(on_value_change));
        self
    }
}

part_element!(TabsRoot);

impl RenderOnce for TabsRoot {
    fn render(self, _window: &mut Window, _cx: &mut App) -> impl IntoElement {
        let scope = &self.provider.state;
        scope.on_value_change.set(self.on_value_change);
        scope.machine.set_options(self.options);

        // A switch of mode is reported by the state cell and otherwise ignored.
        let _ = scope.machine.sync(self.control);

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

#[cfg(all(test, feature = "test-support"))]
mod tests {
    use std::collections::HashMap;

    use gpui::{AppContext, Entity, TestAppContext, VisualTestContext};
    use gpui_headless_core::{NodeRef, Role};

    use super::*;
    use crate::primitives::Activate;

    struct TabsTestView {
        keys: Vec<&'static str>,
        requests: Rc<RefCell<Vec<Option<TabKey>>>>,
        handle: Option<TabsHandle>,
        /// One per rendered trigger, by position.
        trigger_refs: Vec<NodeRef<WeakFocusHandle>>,
        panel_refs: HashMap<&'static str, NodeRef<WeakFocusHandle>>,
    }

    impl TabsTestView {
        fn new(keys: Vec<&'static str>) -> Self {
            Self {
                keys,
                requests: Rc::default(),
                handle: None,
                trigger_refs: Vec::new(),
                panel_refs: HashMap::new(),
            }
        }
    }

    impl Render for TabsTestView {
        fn render(
            &mut self,
            window: &mut Window,
            cx: &mut gpui::Context<Self>,
        ) -> impl IntoElement {
            let requests = self.requests.clone();
            let root = TabsRoot::new("tabs", Control::default(), window, cx)
                .on_value_change(move |key, _window, _cx| requests.borrow_mut().push(key.clone()));
            let handle = root.handle();
            self.handle = Some(handle.clone());

            self.trigger_refs.resize_with(self.keys.len(), NodeRef::new);
            for key in &self.keys {
                self.panel_refs.entry(*key).or_default();
            }

            root.child(
                TabsList::new(&handle).children(self.keys.iter().zip(&self.trigger_refs).map(
                    |(key, trigger_ref)| {
                        TabsTrigger::new(&handle, *key)
                            .node_ref(trigger_ref.clone())
                            .child(*key)
                    },
                )),
            )
            .children(self.keys.iter().map(|key| {
                TabsContent::new(&handle, *key)
                    .node_ref(self.panel_refs[key].clone())
                    .child(*key)
            }))
        }
    }

    fn open_view(
        cx: &mut TestAppContext,
        keys: Vec<&'static str>,
    ) -> (gpui::AnyWindowHandle, Entity<TabsTestView>) {
        let window = cx.update(|cx| {
            crate::init(cx);
            cx.open_window(Default::default(), |_window, cx| {
                cx.new(|_cx| TabsTestView::new(keys))
            })
            .unwrap()
        });
        cx.run_until_parked();
        let view = window.root(cx).unwrap();
        (window.into(), view)
    }

    fn handle(view: &Entity<TabsTestView>, cx: &mut TestAppContext) -> TabsHandle {
        view.read_with(cx, |view, _| view.handle.clone().unwrap())
    }

    fn mounted_panels(view: &Entity<TabsTestView>, cx: &mut TestAppContext) -> Vec<&'static str> {
        view.read_with(cx, |view, _| {
            let mut mounted: Vec<_> = view
                .panel_refs
                .iter()
                .filter(|(_, panel)| panel.is_attached())
                .map(|(key, _)| *key)
                .collect();
            mounted.sort();
            mounted
        })
    }

    #[gpui::test]
    fn test_first_trigger_is_selected(cx: &mut TestAppContext) {
        let (window, view) = open_view(cx, vec!["a", "b", "c"]);
        let _cx = VisualTestContext::from_window(window, cx);
        let handle = handle(&view, cx);

        assert_eq!(handle.selected_key().as_deref(), Some("a"));
        assert_eq!(mounted_panels(&view, cx), vec!["a"]);
        let keys = handle
            .dispatch(|context| context.state.machine.keys())
            .unwrap();
        assert_eq!(
            keys,
            vec![TabKey::from("a"), TabKey::from("b"), TabKey::from("c")],
            "Triggers should register in render order"
        );
    }

    #[gpui::test]
    fn test_select_reports_and_switches_panel(cx: &mut TestAppContext) {
        let (window, view) = open_view(cx, vec!["a", "b", "c"]);
        let handle = handle(&view, cx);

        cx.update_window(window, |_view, window, cx| {
            handle.select("b", window, cx);
        })
        .unwrap();
        cx.run_until_parked();

        assert_eq!(handle.selected_key().as_deref(), Some("b"));
        assert_eq!(mounted_panels(&view, cx), vec!["b"]);
        view.read_with(cx, |view, _| {
            assert_eq!(*view.requests.borrow(), vec![Some(TabKey::from("b"))]);
        });

        cx.update_window(window, |_view, window, cx| {
            handle.select("missing", window, cx);
        })
        .unwrap();
        assert_eq!(
            handle.selected_key().as_deref(),
            Some("b"),
            "Unknown keys should be ignored"
        );
    }

    #[gpui::test]
    fn test_arrow_moves_focus_and_activate_selects(cx: &mut TestAppContext) {
        let (window, view) = open_view(cx, vec!["a", "b", "c"]);
        let mut vcx = VisualTestContext::from_window(window, cx);
        let (handle, triggers) = view.read_with(&vcx, |view, _| {
            (view.handle.clone().unwrap(), view.trigger_refs.clone())
        });
        let focus_handle = |index: usize| {
            triggers[index]
                .current()
                .and_then(|node| node.upgrade())
                .unwrap()
        };

        let first = focus_handle(0);
        vcx.update(|window, cx| first.focus(window, cx));
        vcx.run_until_parked();
        vcx.update(|window, cx| window.dispatch_action(Box::new(FocusRight), cx));
        vcx.run_until_parked();

        let second = focus_handle(1);
        vcx.update(|window, _cx| {
            assert!(second.is_focused(window), "Arrow should move focus to the next trigger");
        });
        assert_eq!(
            handle.selected_key().as_deref(),
            Some("a"),
            "Manual activation should not select on focus"
        );

        vcx.update(|window, cx| window.dispatch_action(Box::new(Activate), cx));
        vcx.run_until_parked();

        assert_eq!(handle.selected_key().as_deref(), Some("b"));
        view.read_with(&vcx, |view, _| {
            assert_eq!(*view.requests.borrow(), vec![Some(TabKey::from("b"))]);
            assert!(view.panel_refs["b"].is_attached());
            assert!(!view.panel_refs["a"].is_attached());
        });
    }

    #[gpui::test]
    fn test_unmounting_selected_trigger_clears_selection(cx: &mut TestAppContext) {
        let (window, view) = open_view(cx, vec!["a", "b", "c"]);
        let handle = handle(&view, cx);

        cx.update_window(window, |_view, window, cx| {
            handle.select("b", window, cx);
        })
        .unwrap();
        cx.run_until_parked();

        view.update(cx, |view, cx| {
            view.keys = vec!["a", "c"];
            cx.notify();
        });
        cx.run_until_parked();

        assert_eq!(handle.selected_key(), None, "No tab should be reselected");
        assert!(mounted_panels(&view, cx).is_empty());
        let keys = handle
            .dispatch(|context| context.state.machine.keys())
            .unwrap();
        assert_eq!(keys, vec![TabKey::from("a"), TabKey::from("c")]);
        view.read_with(cx, |view, _| {
            assert_eq!(
                *view.requests.borrow(),
                vec![Some(TabKey::from("b")), None],
                "The cleared selection should be reported"
            );
        });
    }

    #[gpui::test]
    fn test_duplicate_trigger_key_is_inert(cx: &mut TestAppContext) {
        let (window, view) = open_view(cx, vec!["a", "a", "b"]);
        let _cx = VisualTestContext::from_window(window, cx);
        let handle = handle(&view, cx);

        for _ in 0..2 {
            let keys = handle
                .dispatch(|context| context.state.machine.keys())
                .unwrap();
            assert_eq!(keys, vec![TabKey::from("a"), TabKey::from("b")]);
            view.read_with(cx, |view, _| {
                assert!(view.trigger_refs[0].is_attached());
                assert!(
                    !view.trigger_refs[1].is_attached(),
                    "The duplicate should not get a node"
                );
                assert!(view.trigger_refs[2].is_attached());
            });

            view.update(cx, |_view, cx| cx.notify());
            cx.run_until_parked();
        }
    }

    #[gpui::test]
    fn test_handle_exposes_part_props(cx: &mut TestAppContext) {
        let (window, view) = open_view(cx, vec!["a", "b"]);
        let _cx = VisualTestContext::from_window(window, cx);
        let handle = handle(&view, cx);

        let trigger = handle.trigger_props("b").unwrap();
        assert_eq!(trigger.role, Some(Role::Tab));
        assert_eq!(trigger.selected, Some(false));
        assert_eq!(trigger.tab_index, Some(-1));

        let panel = handle.content_props("b").unwrap();
        assert_eq!(panel.labelled_by, trigger.id);
        assert_eq!(trigger.controls, panel.id);
        assert_eq!(
            handle.list_props().unwrap().orientation,
            Some(Orientation::Horizontal)
        );
    }
}
