use std::rc::Rc;

use gpui::{
    AnyElement, App, ElementId, Empty, KeyBinding, StyleRefinement, WeakFocusHandle, Window,
    actions, div, prelude::*,
};
use gpui_headless_core::{
    AccessibilityProps, CHECKBOX_PARTS, CheckboxMachine, CheckboxState, ContextHandle, ContextProvider, Control,
    InstanceId, NodeSink, StateChange,
};
use smallvec::SmallVec;

use crate::{
    ElementIdExt,
    extensions::click_behavior::{ClickBehavior, ClickBehaviorExt},
    primitives::{ChangeCallback, ChangeHandler, PartNode, require, use_part_node},
    utils::part_element_id,
};

actions!(checkbox, [Toggle]);

const CHECKBOX_CONTEXT: &str = "Checkbox";

pub fn init(cx: &mut App) {
    cx.bind_keys([KeyBinding::new("space", Toggle, Some(CHECKBOX_CONTEXT))]);
}

pub struct CheckboxScope {
    pub machine: CheckboxMachine,
    on_checked_change: ChangeCallback<CheckboxState>,
}

impl CheckboxScope {
    fn new(control: Control<CheckboxState>) -> Self {
        Self {
            machine: CheckboxMachine::new(control),
            on_checked_change: ChangeCallback::new(),
        }
    }

    fn emit(&self, change: Option<StateChange<CheckboxState>>, window: &mut Window, cx: &mut App) {
        self.on_checked_change
            .emit(change.map(|change| change.next), window, cx);
    }
}

pub type CheckboxHandle = ContextHandle<CheckboxScope>;

fn toggle(handle: &CheckboxHandle, window: &mut Window, cx: &mut App) {
    handle.dispatch(|context| {
        let change = context.state.machine.activate();
        context.state.emit(change, window, cx);
    });
}

/// Imperative access to a checkbox.
pub trait CheckboxHandleExt {
    fn state(&self) -> Option<CheckboxState>;

    /// Toggles the checkbox as if it was clicked.
    fn toggle(&self, window: &mut Window, cx: &mut App);

    /// Role, checked state and flags of the box.
    fn root_props(&self) -> Option<AccessibilityProps>;

    fn indicator_props(&self) -> Option<AccessibilityProps>;
}

impl CheckboxHandleExt for CheckboxHandle {
    fn state(&self) -> Option<CheckboxState> {
        self.dispatch(|context| context.state.machine.state())
    }

    fn toggle(&self, window: &mut Window, cx: &mut App) {
        toggle(self, window, cx);
    }

    fn root_props(&self) -> Option<AccessibilityProps> {
        self.dispatch(|context| context.state.machine.root_props(&context.part_ids))
    }

    fn indicator_props(&self) -> Option<AccessibilityProps> {
        self.dispatch(|context| context.state.machine.indicator_props(&context.part_ids))
    }
}

/// The focusable box. Toggles on click and space; indeterminate toggles to
/// checked.
#[derive(IntoElement)]
pub struct CheckboxRoot {
    id: ElementId,
    provider: ContextProvider<CheckboxScope>,
    control: Control<CheckboxState>,
    disabled: bool,
    required: bool,
    on_checked_change: Option<ChangeHandler<CheckboxState>>,
    node_ref: Option<NodeSink<WeakFocusHandle>>,
    click_behavior: ClickBehavior,
    style: StyleRefinement,
    children: SmallVec<[AnyElement; 2]>,
}

impl CheckboxRoot {
    pub fn new(
        id: impl Into<ElementId>,
        checked: Control<CheckboxState>,
        window: &mut Window,
        cx: &mut App,
    ) -> Self {
        let id = id.into();

        let provider = window
            .use_keyed_state(id.with_suffix("state:context"), cx, |_window, _cx| {
                ContextProvider::new(
                    "CheckboxRoot",
                    InstanceId::generate("checkbox"),
                    &CHECKBOX_PARTS,
                    CheckboxScope::new(checked),
                )
            })
            .read(cx)
            .clone();

        Self {
            id,
            provider,
            control: checked,
            disabled: false,
            required: false,
            on_checked_change: None,
            node_ref: None,
            click_behavior: ClickBehavior::default(),
            style: StyleRefinement::default(),
            children: SmallVec::new(),
        }
    }

    pub fn handle(&self) -> CheckboxHandle {
        self.provider.handle()
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn on_checked_change(
        mut self,
        on_checked_change: impl Fn(&CheckboxState, &mut Window, &mut App) + 'static,
    ) -> Self {
        self.on_checked_change = Some(Rc::new(on_checked_change));
        self
    }

    pub fn node_ref(mut self, sink: impl Into<NodeSink<WeakFocusHandle>>) -> Self {
        self.node_ref = Some(sink.into());
        self
    }
}

part_element!(CheckboxRoot);

impl ClickBehaviorExt for CheckboxRoot {
    fn click_behavior_mut(&mut self) -> &mut ClickBehavior {
        &mut self.click_behavior
    }
}

impl RenderOnce for CheckboxRoot {
    fn render(self, window: &mut Window, cx: &mut App) -> impl IntoElement {
        let scope = &self.provider.state;
        scope.on_checked_change.set(self.on_checked_change);
        scope.machine.set_disabled(self.disabled);
        scope.machine.set_required(self.required);
        let _ = scope.machine.sync(self.control);

        let root_id = part_element_id(&self.provider.part_ids.id("root"));
        let focus_handle = use_part_node(
            &self.id.with_suffix("root"),
            self.node_ref,
            window,
            cx,
            |_window, cx| PartNode::new(cx.focus_handle()),
        );
        let props = scope.machine.root_props(&self.provider.part_ids);
        let focus_handle = focus_handle.tab_stop(props.tab_index == Some(0));

        if self.disabled && focus_handle.is_focused(window) {
            window.blur();
        }

        let handle_on_click = self.provider.handle();
        let handle_on_toggle = self.provider.handle();
        let click_behavior = self.click_behavior;
        let style = self.style;

        div()
            .id(root_id)
            .key_context(CHECKBOX_CONTEXT)
            .track_focus(&focus_handle)
            .on_click(move |_event, window, cx| {
                click_behavior.apply(window, cx);
                toggle(&handle_on_click, window, cx);
            })
            .on_action(move |_: &Toggle, window, cx| toggle(&handle_on_toggle, window, cx))
            .map(|mut this| {
                this.style().refine(&style);
                this
            })
            .children(self.children)
    }
}

/// Renders while the checkbox is checked or indeterminate, or always with
/// `force_mount`.
#[derive(IntoElement)]
pub struct CheckboxIndicator {
    handle: CheckboxHandle,
    force_mount: bool,
    style: StyleRefinement,
    children: SmallVec<[AnyElement; 2]>,
}

impl CheckboxIndicator {
    pub fn new(handle: &CheckboxHandle) -> Self {
        Self {
            handle: handle.clone(),
            force_mount: false,
            style: StyleRefinement::default(),
            children: SmallVec::new(),
        }
    }

    pub fn force_mount(mut self, force_mount: bool) -> Self {
        self.force_mount = force_mount;
        self
    }
}

part_element!(CheckboxIndicator);

impl RenderOnce for CheckboxIndicator {
    fn render(self, _window: &mut Window, _cx: &mut App) -> impl IntoElement {
        let context = require(&self.handle, "CheckboxIndicator");
        if !context.state.machine.indicator_mounted(self.force_mount) {
            return Empty.into_any_element();
        }

        let style = self.style;

        div()
            .id(part_element_id(&context.part_ids.id("indicator")))
            .map(|mut this| {
                this.style().refine(&style);
                this
            })
            .children(self.children)
            .into_any_element()
    }
}
