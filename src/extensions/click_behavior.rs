use gpui::{App, Window};

/// What a part's click handler does with the event after activating the part.
///
/// Parts consume their clicks by default: the event stops propagating and the
/// window's default handling (such as focusing the clicked element on mouse
/// down) is prevented.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClickBehavior {
    /// Let the click bubble to ancestors.
    pub allow_propagation: bool,
    /// Keep the window's default handling.
    pub allow_default: bool,
}

impl ClickBehavior {
    /// Prevents the window's default handling unless `allow_default` is set and
    /// stops propagation unless `allow_propagation` is set.
    pub fn apply(&self, window: &mut Window, cx: &mut App) {
        if !self.allow_default {
            window.prevent_default();
        }
        if !self.allow_propagation {
            cx.stop_propagation();
        }
    }
}

/// Builder methods for parts that activate on click.
pub trait ClickBehaviorExt: Sized {
    /// Returns a mutable reference to the part's click behavior settings.
    fn click_behavior_mut(&mut self) -> &mut ClickBehavior;

    /// Lets clicks on this part reach click handlers of its ancestors.
    fn allow_click_propagation(mut self) -> Self {
        self.click_behavior_mut().allow_propagation = true;
        self
    }

    /// Keeps the window's default handling of clicks on this part, such as
    /// focusing the clicked element.
    fn allow_default_click_behaviour(mut self) -> Self {
        self.click_behavior_mut().allow_default = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Part(ClickBehavior);

    impl ClickBehaviorExt for Part {
        fn click_behavior_mut(&mut self) -> &mut ClickBehavior {
            &mut self.0
        }
    }

    #[test]
    fn test_clicks_are_consumed_by_default() {
        assert_eq!(
            ClickBehavior::default(),
            ClickBehavior {
                allow_propagation: false,
                allow_default: false,
            }
        );
    }

    #[test]
    fn test_builder_opts_out() {
        let part = Part(ClickBehavior::default()).allow_click_propagation();
        assert!(part.0.allow_propagation);
        assert!(!part.0.allow_default);

        let part = part.allow_default_click_behaviour();
        assert!(part.0.allow_default);
    }
}
