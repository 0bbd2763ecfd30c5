use gpui::{
    AnyElement, App, Empty, StyleRefinement, WeakFocusHandle, Window, div, prelude::*,
};
use gpui_headless_core::{NodeSink, RovingKey, TabKey, content_id, trigger_id};
use smallvec::SmallVec;

use super::{
    FocusDown, FocusFirst, FocusLast, FocusLeft, FocusRight, FocusUp, LIST_CONTEXT, TabsHandle,
    activate_logged, transition,
};
use crate::{
    extensions::click_behavior::{ClickBehavior, ClickBehaviorExt},
    primitives::{Activate, BUTTON_CONTEXT, PartNode, WindowFocusHost, require, use_part_node},
    utils::part_element_id,
};

macro_rules! roving_action {
    ($list:expr, $handle:expr, $action:ty, $key:expr) => {{
        let handle = $handle.clone();
        $list.on_action(move |_: &$action, window, cx| navigate(&handle, $key, window, cx))
    }};
}

fn navigate(handle: &TabsHandle, key: RovingKey, window: &mut Window, cx: &mut App) {
    transition(handle, window, cx, |scope, window, cx| {
        scope
            .machine
            .navigate(key, &mut WindowFocusHost::new(window, cx))
    });
}

/// Container of the triggers. Arrow keys along the orientation, home and end
/// move focus between enabled triggers.
#[derive(IntoElement)]
pub struct TabsList {
    handle: TabsHandle,
    style: StyleRefinement,
    children: SmallVec<[AnyElement; 2]>,
}

impl TabsList {
    pub fn new(handle: &TabsHandle) -> Self {
        Self {
            handle: handle.clone(),
            style: StyleRefinement::default(),
            children: SmallVec::new(),
        }
    }
}

part_element!(TabsList);

impl RenderOnce for TabsList {
    fn render(self, _window: &mut Window, _cx: &mut App) -> impl IntoElement {
        let context = require(&self.handle, "TabsList");
        let style = self.style;

        let list = div()
            .id(part_element_id(&context.part_ids.id("list")))
            .key_context(LIST_CONTEXT);
        let list = roving_action!(list, self.handle, FocusLeft, RovingKey::Left);
        let list = roving_action!(list, self.handle, FocusRight, RovingKey::Right);
        let list = roving_action!(list, self.handle, FocusUp, RovingKey::Up);
        let list = roving_action!(list, self.handle, FocusDown, RovingKey::Down);
        let list = roving_action!(list, self.handle, FocusFirst, RovingKey::Home);
        let list = roving_action!(list, self.handle, FocusLast, RovingKey::End);

        list.map(|mut this| {
            this.style().refine(&style);
            this
        })
        .children(self.children)
    }
}

/// Selects the panel with the same key on click, enter or space.
///
/// Only one trigger is a tab stop at a time. Registration follows render order
/// and a trigger unregisters when it stops rendering. A second trigger rendered
/// with a key that is already in use is inert.
#[derive(IntoElement)]
pub struct TabsTrigger {
    handle: TabsHandle,
    key: TabKey,
    disabled: bool,
    node_ref: Option<NodeSink<WeakFocusHandle>>,
    click_behavior: ClickBehavior,
    style: StyleRefinement,
    children: SmallVec<[AnyElement; 2]>,
}

impl TabsTrigger {
    pub fn new(handle: &TabsHandle, key: impl Into<TabKey>) -> Self {
        Self {
            handle: handle.clone(),
            key: key.into(),
            disabled: false,
            node_ref: None,
            click_behavior: ClickBehavior::default(),
            style: StyleRefinement::default(),
            children: SmallVec::new(),
        }
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    /// Also hands the rendered node to `sink`, next to the registry's own ref.
    pub fn node_ref(mut self, sink: impl Into<NodeSink<WeakFocusHandle>>) -> Self {
        self.node_ref = Some(sink.into());
        self
    }
}

part_element!(TabsTrigger);

impl ClickBehaviorExt for TabsTrigger {
    fn click_behavior_mut(&mut self) -> &mut ClickBehavior {
        &mut self.click_behavior
    }
}

impl RenderOnce for TabsTrigger {
    fn render(self, window: &mut Window, cx: &mut App) -> impl IntoElement {
        let context = require(&self.handle, "TabsTrigger");
        let machine = &context.state.machine;
        let key = self.key;
        let style = self.style;

        if !context.state.claim_key(&key, window, cx) {
            tracing::warn!(%key, "another tab trigger already renders this key");
            return div()
                .map(|mut this| {
                    this.style().refine(&style);
                    this
                })
                .children(self.children)
                .into_any_element();
        }

        let id = part_element_id(&trigger_id(&context.part_ids, &key));
        let handle = self.handle.clone();
        let disabled = self.disabled;
        let init_key = key.clone();
        let focus_handle = use_part_node(&id, self.node_ref, window, cx, |window, cx| {
            let focus_handle = cx.focus_handle();

            let internal = match context.state.machine.register(init_key.clone(), disabled) {
                Ok(node) => Some(NodeSink::from(node)),
                Err(error) => {
                    tracing::warn!(%error, "tab trigger not registered");
                    return PartNode::new(focus_handle);
                }
            };
            window.refresh();

            let focus_key = init_key.clone();
            let focus_in_handle = handle.clone();
            let focus_in = window.on_focus_in(&focus_handle, cx, move |window, cx| {
                transition(&focus_in_handle, window, cx, |scope, _window, _cx| {
                    scope.machine.focus_changed(Some(&*focus_key))
                });
            });

            let window_handle = window.window_handle();
            cx.on_release(move |_node, cx| {
                let released = window_handle.update(cx, |_view, window, cx| {
                    handle.dispatch(|context| {
                        context.state.trigger_unmounted(&init_key, window, cx)
                    });
                });
                if let Err(error) = released {
                    tracing::debug!(
                        %error,
                        key = %init_key,
                        "tab trigger released without a window"
                    );
                }
            })
            .detach();

            PartNode::new(focus_handle)
                .internal(internal)
                .subscription(focus_in)
        });

        let owns_entry = machine
            .node_ref(&key)
            .and_then(|node| node.current())
            .is_some_and(|node| node == focus_handle.downgrade());
        if owns_entry {
            let _ = machine.set_disabled(&key, disabled);
        }

        let props = machine.trigger_props(&context.part_ids, &key);
        let focus_handle = focus_handle.tab_stop(owns_entry && props.tab_index == Some(0));

        let handle_on_click = self.handle.clone();
        let handle_on_activate = self.handle;
        let key_on_activate = key.clone();
        let click_behavior = self.click_behavior;

        div()
            .id(id)
            .key_context(BUTTON_CONTEXT)
            .track_focus(&focus_handle)
            .on_click(move |_event, window, cx| {
                click_behavior.apply(window, cx);
                transition(&handle_on_click, window, cx, |scope, _window, _cx| {
                    activate_logged(&scope.machine, &key)
                });
            })
            .on_action(move |_: &Activate, window, cx| {
                transition(&handle_on_activate, window, cx, |scope, _window, _cx| {
                    activate_logged(&scope.machine, &key_on_activate)
                });
            })
            .map(|mut this| {
                this.style().refine(&style);
                this
            })
            .children(self.children)
            .into_any_element()
    }
}

/// The panel for `key`. Renders nothing unless its trigger is selected.
#[derive(IntoElement)]
pub struct TabsContent {
    handle: TabsHandle,
    key: TabKey,
    node_ref: Option<NodeSink<WeakFocusHandle>>,
    style: StyleRefinement,
    children: SmallVec<[AnyElement; 2]>,
}

impl TabsContent {
    pub fn new(handle: &TabsHandle, key: impl Into<TabKey>) -> Self {
        Self {
            handle: handle.clone(),
            key: key.into(),
            node_ref: None,
            style: StyleRefinement::default(),
            children: SmallVec::new(),
        }
    }

    pub fn node_ref(mut self, sink: impl Into<NodeSink<WeakFocusHandle>>) -> Self {
        self.node_ref = Some(sink.into());
        self
    }
}

part_element!(TabsContent);

impl RenderOnce for TabsContent {
    fn render(self, window: &mut Window, cx: &mut App) -> impl IntoElement {
        let context = require(&self.handle, "TabsContent");
        if !context.state.machine.is_selected(&self.key) {
            return Empty.into_any_element();
        }

        let id = part_element_id(&content_id(&context.part_ids, &self.key));
        let focus_handle = use_part_node(&id, self.node_ref, window, cx, |_window, cx| {
            PartNode::new(cx.focus_handle().tab_stop(true))
        });
        let style = self.style;

        div()
            .id(id)
            .track_focus(&focus_handle)
            .map(|mut this| {
                this.style().refine(&style);
                this
            })
            .children(self.children)
            .into_any_element()
    }
}
