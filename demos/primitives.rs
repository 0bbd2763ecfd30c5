use gpui::{
    App, AppContext, Application, Bounds, Context, FocusHandle, KeyBinding, Window, WindowBounds,
    WindowOptions, actions, div, prelude::*, px, rgb, size,
};
use gpui_headless::{
    CheckboxState, Control, TabKey,
    primitives::{
        checkbox::{CheckboxIndicator, CheckboxRoot},
        dialog::{
            DialogClose, DialogContent, DialogDescription, DialogOverlay, DialogRoot, DialogTitle,
            DialogTrigger,
        },
        tabs::{TabsContent, TabsList, TabsRoot, TabsTrigger},
    },
};
use tracing_subscriber::EnvFilter;

const TABS: [(&str, &str); 3] = [
    ("account", "Account"),
    ("password", "Password"),
    ("billing", "Billing"),
];

struct Root {
    focus_handle: FocusHandle,

    dialog_open: bool,
    terms: CheckboxState,
    tab: Option<TabKey>,
}

actions!(window, [TabNext, TabPrev]);

impl Render for Root {
    fn render(&mut self, window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        div()
            .tab_group()
            .track_focus(&self.focus_handle)
            .size_full()
            .bg(rgb(0xf4f4f5))
            .flex()
            .flex_col()
            .items_center()
            .gap(px(24.))
            .p(px(48.))
            .child(self.render_dialog(window, cx))
            .child(self.render_checkbox(window, cx))
            .child(self.render_tabs(window, cx))
    }
}

impl Root {
    fn render_dialog(&mut self, window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let root = DialogRoot::new("dialog", Control::Controlled(self.dialog_open), window, cx)
            .on_open_change(cx.listener(|view, open, _window, cx| {
                view.dialog_open = *open;
                cx.notify();
            }));
        let handle = root.handle();

        root.child(button().child(DialogTrigger::new(&handle).child("Edit profile")))
            .child(
                DialogOverlay::new(&handle)
                    .absolute()
                    .inset_0()
                    .bg(gpui::black().opacity(0.4)),
            )
            .child(
                DialogContent::new(&handle)
                    .absolute()
                    .top(px(160.))
                    .left(px(120.))
                    .w(px(380.))
                    .p(px(20.))
                    .gap(px(8.))
                    .flex()
                    .flex_col()
                    .bg(gpui::white())
                    .rounded(px(8.))
                    .child(DialogTitle::new(&handle).text_lg().child("Edit profile"))
                    .child(
                        DialogDescription::new(&handle)
                            .text_color(rgb(0x52525b))
                            .child("Changes are saved when you close the dialog."),
                    )
                    .child(DialogClose::new(&handle).child(button().child("Done"))),
            )
    }

    fn render_checkbox(&mut self, window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let root = CheckboxRoot::new("terms", Control::Controlled(self.terms), window, cx)
            .on_checked_change(cx.listener(|view, state, _window, cx| {
                view.terms = *state;
                cx.notify();
            }))
            .size(px(20.))
            .border_1()
            .border_color(rgb(0x18181b))
            .rounded(px(4.))
            .flex()
            .items_center()
            .justify_center();
        let handle = root.handle();

        div()
            .flex()
            .gap(px(8.))
            .items_center()
            .child(root.child(CheckboxIndicator::new(&handle).child(
                match self.terms {
                    CheckboxState::Indeterminate => "–",
                    _ => "✓",
                },
            )))
            .child("Accept terms and conditions")
    }

    fn render_tabs(&mut self, window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let root = TabsRoot::new("settings", Control::Controlled(self.tab.clone()), window, cx)
            .on_value_change(cx.listener(|view, tab: &Option<TabKey>, _window, cx| {
                view.tab = tab.clone();
                cx.notify();
            }))
            .w(px(380.));
        let handle = root.handle();

        root.child(
            TabsList::new(&handle)
                .flex()
                .gap(px(4.))
                .children(TABS.iter().map(|(key, label)| {
                    TabsTrigger::new(&handle, *key)
                        .disabled(*key == "billing")
                        .px(px(12.))
                        .py(px(6.))
                        .child(*label)
                })),
        )
        .children(TABS.iter().map(|(key, label)| {
            TabsContent::new(&handle, *key)
                .p(px(12.))
                .child(format!("{label} settings"))
        }))
    }
}

fn button() -> gpui::Div {
    div()
        .px(px(12.))
        .py(px(6.))
        .rounded(px(6.))
        .bg(rgb(0x18181b))
        .text_color(gpui::white())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    Application::new().run(|cx: &mut App| {
        gpui_headless::init(cx);

        let bounds = Bounds::centered(None, size(px(620.), px(800.)), cx);

        cx.open_window(
            WindowOptions {
                window_bounds: Some(WindowBounds::Windowed(bounds)),
                ..Default::default()
            },
            |_window, cx| {
                cx.new(|cx| Root {
                    focus_handle: cx.focus_handle(),
                    dialog_open: false,
                    terms: CheckboxState::Indeterminate,
                    tab: Some("account".into()),
                })
            },
        )
        .unwrap();

        init_tab_indexing_actions(cx);

        cx.activate(true);
    });
}

fn init_tab_indexing_actions(cx: &mut App) {
    cx.on_action(move |_: &TabNext, cx| {
        cx.defer(move |cx| {
            let Some(window) = cx.active_window() else {
                return;
            };

            let _ = window.update(cx, move |_, window, cx| {
                window.focus_next(cx);
            });
        })
    });

    cx.on_action(move |_: &TabPrev, cx| {
        cx.defer(move |cx| {
            let Some(window) = cx.active_window() else {
                return;
            };

            let _ = window.update(cx, move |_, window, cx| {
                window.focus_prev(cx);
            });
        })
    });

    cx.bind_keys([KeyBinding::new("tab", TabNext, None)]);
    cx.bind_keys([KeyBinding::new("shift-tab", TabPrev, None)]);
}
