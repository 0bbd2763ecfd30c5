/// The host's focus system, as seen by the primitives' focus policies.
///
/// `N` is the host's node handle type.
pub trait FocusHost<N> {
    /// The node that currently has focus.
    fn focused(&self) -> Option<N>;

    /// Returns true if `node` is still part of the rendered tree.
    fn is_mounted(&self, node: &N) -> bool;

    /// Moves focus to `node`.
    fn focus(&mut self, node: &N);
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashSet;

    use super::FocusHost;

    /// Records focus moves over integer nodes.
    #[derive(Default)]
    pub struct TestFocus {
        pub focused: Option<u32>,
        pub unmounted: HashSet<u32>,
        pub moves: Vec<u32>,
    }

    impl FocusHost<u32> for TestFocus {
        fn focused(&self) -> Option<u32> {
            self.focused
        }

        fn is_mounted(&self, node: &u32) -> bool {
            !self.unmounted.contains(node)
        }

        fn focus(&mut self, node: &u32) {
            self.focused = Some(*node);
            self.moves.push(*node);
        }
    }
}
