use gpui::{
    AnyElement, App, Empty, FocusHandle, StyleRefinement, WeakFocusHandle, Window, div,
    prelude::*,
};
use gpui_headless_core::{DismissReason, NodeSink};
use smallvec::SmallVec;

use super::{CONTENT_CONTEXT, Dismiss, DialogHandle, transition};
use crate::{
    extensions::{
        click_behavior::{ClickBehavior, ClickBehaviorExt},
        deferrable::{Deferrable, DeferredConfig},
    },
    ElementIdExt,
    primitives::{Activate, BUTTON_CONTEXT, PartNode, WindowFocusHost, require, use_part_node},
    utils::part_element_id,
};

macro_rules! node_ref {
    () => {
        /// Also hands the rendered node to `sink`, next to the dialog's own ref.
        pub fn node_ref(mut self, sink: impl Into<NodeSink<WeakFocusHandle>>) -> Self {
            self.node_ref = Some(sink.into());
            self
        }
    };
}

/// Opens the dialog on click, enter or space. Focus returns here on close.
#[derive(IntoElement)]
pub struct DialogTrigger {
    handle: DialogHandle,
    node_ref: Option<NodeSink<WeakFocusHandle>>,
    click_behavior: ClickBehavior,
    style: StyleRefinement,
    children: SmallVec<[AnyElement; 2]>,
}

impl DialogTrigger {
    pub fn new(handle: &DialogHandle) -> Self {
        Self {
            handle: handle.clone(),
            node_ref: None,
            click_behavior: ClickBehavior::default(),
            style: StyleRefinement::default(),
            children: SmallVec::new(),
        }
    }

    node_ref!();
}

part_element!(DialogTrigger);

impl ClickBehaviorExt for DialogTrigger {
    fn click_behavior_mut(&mut self) -> &mut ClickBehavior {
        &mut self.click_behavior
    }
}

impl RenderOnce for DialogTrigger {
    fn render(self, window: &mut Window, cx: &mut App) -> impl IntoElement {
        let context = require(&self.handle, "DialogTrigger");
        let id = part_element_id(&context.part_ids.id("trigger"));
        let internal = NodeSink::from(context.state.machine.trigger_ref());

        let focus_handle = use_part_node(&id, self.node_ref, window, cx, |_window, cx| {
            PartNode::new(cx.focus_handle().tab_stop(true)).internal(Some(internal))
        });

        let handle_on_click = self.handle.clone();
        let handle_on_activate = self.handle;
        let click_behavior = self.click_behavior;
        let style = self.style;

        div()
            .id(id)
            .key_context(BUTTON_CONTEXT)
            .track_focus(&focus_handle)
            .on_click(move |_event, window, cx| {
                click_behavior.apply(window, cx);
                transition(&handle_on_click, window, cx, |machine, host| {
                    machine.activate_trigger(host)
                });
            })
            .on_action(move |_: &Activate, window, cx| {
                transition(&handle_on_activate, window, cx, |machine, host| {
                    machine.activate_trigger(host)
                });
            })
            .map(|mut this| {
                this.style().refine(&style);
                this
            })
            .children(self.children)
    }
}

/// Backdrop behind the content. Only rendered while open; clicking it dismisses
/// the dialog unless the options say otherwise.
#[derive(IntoElement)]
pub struct DialogOverlay {
    handle: DialogHandle,
    deferred_config: DeferredConfig,
    style: StyleRefinement,
    children: SmallVec<[AnyElement; 2]>,
}

impl DialogOverlay {
    pub fn new(handle: &DialogHandle) -> Self {
        Self {
            handle: handle.clone(),
            deferred_config: DeferredConfig::default(),
            style: StyleRefinement::default(),
            children: SmallVec::new(),
        }
    }
}

part_element!(DialogOverlay);

impl Deferrable for DialogOverlay {
    const DEFAULT_PRIORITY: usize = 1;

    fn deferred_config(&self) -> &DeferredConfig {
        &self.deferred_config
    }

    fn deferred_config_mut(&mut self) -> &mut DeferredConfig {
        &mut self.deferred_config
    }
}

impl RenderOnce for DialogOverlay {
    fn render(mut self, _window: &mut Window, _cx: &mut App) -> impl IntoElement {
        let context = require(&self.handle, "DialogOverlay");
        let machine = &context.state.machine;
        if !machine.is_open() {
            return Empty.into_any_element();
        }

        let modal = machine.options().modal;
        let handle = self.handle.clone();
        let style = std::mem::take(&mut self.style);
        let children = std::mem::take(&mut self.children);

        let overlay = div()
            .id(part_element_id(&context.part_ids.id("overlay")))
            .when(modal, |this| this.occlude())
            .on_click(move |_event, window, cx| {
                cx.stop_propagation();
                transition(&handle, window, cx, |machine, host| {
                    machine.dismiss(DismissReason::Overlay, host)
                });
            })
            .map(|mut this| {
                this.style().refine(&style);
                this
            })
            .children(children);

        self.apply_deferred(overlay)
    }
}

/// The dialog surface. Only rendered while open, painted above its siblings.
///
/// When it mounts after an open request, focus moves to the first
/// [`DialogFocusable`] or [`DialogClose`] rendered inside it, or to the content
/// itself. Escape dismisses it.
#[derive(IntoElement)]
pub struct DialogContent {
    handle: DialogHandle,
    node_ref: Option<NodeSink<WeakFocusHandle>>,
    deferred_config: DeferredConfig,
    style: StyleRefinement,
    children: SmallVec<[AnyElement; 2]>,
}

impl DialogContent {
    pub fn new(handle: &DialogHandle) -> Self {
        Self {
            handle: handle.clone(),
            node_ref: None,
            deferred_config: DeferredConfig::default(),
            style: StyleRefinement::default(),
            children: SmallVec::new(),
        }
    }

    node_ref!();
}

part_element!(DialogContent);

impl Deferrable for DialogContent {
    const DEFAULT_PRIORITY: usize = 2;

    fn deferred_config(&self) -> &DeferredConfig {
        &self.deferred_config
    }

    fn deferred_config_mut(&mut self) -> &mut DeferredConfig {
        &mut self.deferred_config
    }
}

impl RenderOnce for DialogContent {
    fn render(mut self, window: &mut Window, cx: &mut App) -> impl IntoElement {
        let context = require(&self.handle, "DialogContent");
        let machine = &context.state.machine;
        if !machine.is_open() {
            return Empty.into_any_element();
        }

        context.state.begin_part(window, cx);

        let id = part_element_id(&context.part_ids.id("content"));
        let internal = NodeSink::from(machine.content_ref());
        let focus_handle: FocusHandle =
            use_part_node(&id, self.node_ref.take(), window, cx, |_window, cx| {
                PartNode::new(cx.focus_handle()).internal(Some(internal))
            });

        if machine.has_pending_focus() {
            // Focus targets register while rendering, so resolve after this frame.
            let handle = self.handle.clone();
            window.defer(cx, move |window, cx| {
                handle.dispatch(|context| {
                    context
                        .state
                        .machine
                        .content_mounted(&mut WindowFocusHost::new(window, cx))
                });
            });
        }

        let modal = machine.options().modal;
        let handle = self.handle.clone();
        let style = std::mem::take(&mut self.style);
        let children = std::mem::take(&mut self.children);

        let content = div()
            .id(id)
            .key_context(CONTENT_CONTEXT)
            .track_focus(&focus_handle)
            .when(modal, |this| this.occlude())
            .on_action(move |_: &Dismiss, window, cx| {
                transition(&handle, window, cx, |machine, host| {
                    machine.dismiss(DismissReason::Escape, host)
                });
            })
            .map(|mut this| {
                this.style().refine(&style);
                this
            })
            .children(children);

        self.apply_deferred(content)
    }
}

/// Labels the content. Its id is the content's `labelled_by`.
#[derive(IntoElement)]
pub struct DialogTitle {
    handle: DialogHandle,
    style: StyleRefinement,
    children: SmallVec<[AnyElement; 2]>,
}

impl DialogTitle {
    pub fn new(handle: &DialogHandle) -> Self {
        Self {
            handle: handle.clone(),
            style: StyleRefinement::default(),
            children: SmallVec::new(),
        }
    }
}

part_element!(DialogTitle);

impl RenderOnce for DialogTitle {
    fn render(self, _window: &mut Window, _cx: &mut App) -> impl IntoElement {
        let context = require(&self.handle, "DialogTitle");
        let style = self.style;

        div()
            .id(part_element_id(&context.part_ids.id("title")))
            .map(|mut this| {
                this.style().refine(&style);
                this
            })
            .children(self.children)
    }
}

/// Describes the content. Its id is the content's `described_by`.
#[derive(IntoElement)]
pub struct DialogDescription {
    handle: DialogHandle,
    style: StyleRefinement,
    children: SmallVec<[AnyElement; 2]>,
}

impl DialogDescription {
    pub fn new(handle: &DialogHandle) -> Self {
        Self {
            handle: handle.clone(),
            style: StyleRefinement::default(),
            children: SmallVec::new(),
        }
    }
}

part_element!(DialogDescription);

impl RenderOnce for DialogDescription {
    fn render(self, _window: &mut Window, _cx: &mut App) -> impl IntoElement {
        let context = require(&self.handle, "DialogDescription");
        let style = self.style;

        div()
            .id(part_element_id(&context.part_ids.id("description")))
            .map(|mut this| {
                this.style().refine(&style);
                this
            })
            .children(self.children)
    }
}

/// Closes the dialog. Registered as a focus target of the content while mounted.
///
/// Any number of close parts can be rendered. Each keeps its own node.
#[derive(IntoElement)]
pub struct DialogClose {
    handle: DialogHandle,
    node_ref: Option<NodeSink<WeakFocusHandle>>,
    click_behavior: ClickBehavior,
    style: StyleRefinement,
    children: SmallVec<[AnyElement; 2]>,
}

impl DialogClose {
    pub fn new(handle: &DialogHandle) -> Self {
        Self {
            handle: handle.clone(),
            node_ref: None,
            click_behavior: ClickBehavior::default(),
            style: StyleRefinement::default(),
            children: SmallVec::new(),
        }
    }

    node_ref!();
}

part_element!(DialogClose);

impl ClickBehaviorExt for DialogClose {
    fn click_behavior_mut(&mut self) -> &mut ClickBehavior {
        &mut self.click_behavior
    }
}

impl RenderOnce for DialogClose {
    fn render(self, window: &mut Window, cx: &mut App) -> impl IntoElement {
        let context = require(&self.handle, "DialogClose");
        let index = context.state.next_close_index(window, cx);
        let id = part_element_id(&context.part_ids.id("close"));
        let id = match index {
            0 => id,
            index => id.with_suffix(index.to_string()),
        };

        let focus_handle = use_part_node(&id, self.node_ref, window, cx, |_window, cx| {
            PartNode::new(cx.focus_handle().tab_stop(true))
        });
        context
            .state
            .register_focusable(focus_handle.downgrade(), window, cx);

        let handle_on_click = self.handle.clone();
        let handle_on_activate = self.handle;
        let click_behavior = self.click_behavior;
        let style = self.style;

        div()
            .id(id)
            .key_context(BUTTON_CONTEXT)
            .track_focus(&focus_handle)
            .on_click(move |_event, window, cx| {
                click_behavior.apply(window, cx);
                transition(&handle_on_click, window, cx, |machine, host| machine.close(host));
            })
            .on_action(move |_: &Activate, window, cx| {
                transition(&handle_on_activate, window, cx, |machine, host| {
                    machine.close(host)
                });
            })
            .map(|mut this| {
                this.style().refine(&style);
                this
            })
            .children(self.children)
    }
}

/// Makes an element of the consumer's a focus target of the content.
///
/// Wraps its children and registers `focus_handle` while rendered, in render
/// order with the close parts. The consumer tracks the handle on its own
/// element.
#[derive(IntoElement)]
pub struct DialogFocusable {
    handle: DialogHandle,
    focus_handle: FocusHandle,
    style: StyleRefinement,
    children: SmallVec<[AnyElement; 2]>,
}

impl DialogFocusable {
    pub fn new(handle: &DialogHandle, focus_handle: &FocusHandle) -> Self {
        Self {
            handle: handle.clone(),
            focus_handle: focus_handle.clone(),
            style: StyleRefinement::default(),
            children: SmallVec::new(),
        }
    }
}

part_element!(DialogFocusable);

impl RenderOnce for DialogFocusable {
    fn render(self, window: &mut Window, cx: &mut App) -> impl IntoElement {
        let context = require(&self.handle, "DialogFocusable");
        context
            .state
            .register_focusable(self.focus_handle.downgrade(), window, cx);

        let style = self.style;

        div()
            .map(|mut this| {
                this.style().refine(&style);
                this
            })
            .children(self.children)
    }
}
