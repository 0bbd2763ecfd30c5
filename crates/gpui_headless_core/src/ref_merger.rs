use std::{cell::RefCell, fmt, rc::Rc};

use smallvec::SmallVec;

/// Receives the node a part is attached to, or `None` when the part is torn down.
pub trait RefSink<T> {
    /// Accepts the new node (or `None`).
    fn accept(&self, node: Option<&T>);
}

struct NodeCell<T> {
    current: RefCell<Option<T>>,
}

impl<T: Clone> RefSink<T> for NodeCell<T> {
    fn accept(&self, node: Option<&T>) {
        *self.current.borrow_mut() = node.cloned();
    }
}

/// A cell-style sink: remembers the last node it was given.
pub struct NodeRef<T>(Rc<NodeCell<T>>);

impl<T> NodeRef<T> {
    /// Creates an empty node ref.
    pub fn new() -> Self {
        Self(Rc::new(NodeCell {
            current: RefCell::new(None),
        }))
    }

    /// Returns the node the ref is currently attached to.
    pub fn current(&self) -> Option<T>
    where
        T: Clone,
    {
        self.0.current.borrow().clone()
    }

    /// Returns true if a node is currently attached.
    pub fn is_attached(&self) -> bool {
        self.0.current.borrow().is_some()
    }

    /// Returns true if both refs share the same cell.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<T> Default for NodeRef<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for NodeRef<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T: fmt::Debug> fmt::Debug for NodeRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NodeRef")
            .field(&*self.0.current.borrow())
            .finish()
    }
}

impl<T: Clone> RefSink<T> for NodeRef<T> {
    fn accept(&self, node: Option<&T>) {
        self.0.accept(node);
    }
}

struct FnSink<F>(F);

impl<T, F: Fn(Option<&T>)> RefSink<T> for FnSink<F> {
    fn accept(&self, node: Option<&T>) {
        (self.0)(node)
    }
}

/// A shared, type-erased sink. Two `NodeSink`s are the same sink when they point
/// at the same allocation.
pub struct NodeSink<T>(Rc<dyn RefSink<T>>);

impl<T: 'static> NodeSink<T> {
    /// Wraps any sink.
    pub fn new(sink: impl RefSink<T> + 'static) -> Self {
        Self(Rc::new(sink))
    }

    /// Wraps a callback sink.
    pub fn from_fn(f: impl Fn(Option<&T>) + 'static) -> Self {
        Self(Rc::new(FnSink(f)))
    }
}

impl<T> NodeSink<T> {
    /// Returns true if both point at the same underlying sink.
    pub fn same(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.0), Rc::as_ptr(&other.0))
    }
}

impl<T> Clone for NodeSink<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> fmt::Debug for NodeSink<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NodeSink")
            .field(&Rc::as_ptr(&self.0).cast::<()>())
            .finish()
    }
}

impl<T> RefSink<T> for NodeSink<T> {
    fn accept(&self, node: Option<&T>) {
        self.0.accept(node);
    }
}

impl<T: Clone + 'static> From<NodeRef<T>> for NodeSink<T> {
    fn from(node_ref: NodeRef<T>) -> Self {
        let cell: Rc<dyn RefSink<T>> = node_ref.0;
        Self(cell)
    }
}

impl<T: 'static> From<MergedRef<T>> for NodeSink<T> {
    fn from(merged: MergedRef<T>) -> Self {
        Self::new(merged)
    }
}

/// Fans a single node out to several sinks, in insertion order.
pub struct MergedRef<T> {
    sinks: SmallVec<[NodeSink<T>; 2]>,
}

impl<T> MergedRef<T> {
    /// Creates a merged ref with no sinks.
    pub fn new() -> Self {
        Self {
            sinks: SmallVec::new(),
        }
    }

    /// Appends a sink unless the same sink is already present.
    pub fn push(&mut self, sink: NodeSink<T>) {
        if !self.contains(&sink) {
            self.sinks.push(sink);
        }
    }

    /// Returns true if `sink` is one of the merged sinks.
    pub fn contains(&self, sink: &NodeSink<T>) -> bool {
        self.sinks.iter().any(|existing| existing.same(sink))
    }

    /// Returns true if both merged refs hold the same sinks in the same order.
    pub fn same_sinks(&self, other: &Self) -> bool {
        self.sinks.len() == other.sinks.len()
            && self
                .sinks
                .iter()
                .zip(other.sinks.iter())
                .all(|(a, b)| a.same(b))
    }

    /// Number of distinct sinks.
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// Returns true if there are no sinks.
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl<T> Default for MergedRef<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for MergedRef<T> {
    fn clone(&self) -> Self {
        Self {
            sinks: self.sinks.clone(),
        }
    }
}

impl<T> fmt::Debug for MergedRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.sinks.iter()).finish()
    }
}

impl<T> RefSink<T> for MergedRef<T> {
    fn accept(&self, node: Option<&T>) {
        for sink in &self.sinks {
            sink.accept(node);
        }
    }
}

/// Merges an ordered list of optional sinks into one.
///
/// `None` entries and repeated sinks are skipped.
pub fn merge_refs<T, I>(sinks: I) -> MergedRef<T>
where
    I: IntoIterator<Item = Option<NodeSink<T>>>,
{
    let mut merged = MergedRef::new();
    for sink in sinks.into_iter().flatten() {
        merged.push(sink);
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    type Log = Rc<RefCell<Vec<(usize, Option<u8>)>>>;

    fn recorder(log: &Log, index: usize) -> NodeSink<u8> {
        let log = log.clone();
        NodeSink::from_fn(move |node: Option<&u8>| log.borrow_mut().push((index, node.copied())))
    }

    #[test]
    fn test_merged_ref_updates_callback_and_cell_sinks() {
        let log: Log = Rc::default();
        let cell = NodeRef::<u8>::new();

        let merged = merge_refs([Some(recorder(&log, 0)), Some(cell.clone().into())]);
        merged.accept(Some(&7));

        assert_eq!(*log.borrow(), vec![(0, Some(7))]);
        assert_eq!(cell.current(), Some(7));

        merged.accept(None);

        assert_eq!(*log.borrow(), vec![(0, Some(7)), (0, None)]);
        assert_eq!(cell.current(), None, "teardown should clear cell sinks");
    }

    #[test]
    fn test_merged_ref_skips_absent_entries() {
        let log: Log = Rc::default();

        let merged = merge_refs([None, Some(recorder(&log, 1)), None]);
        assert_eq!(merged.len(), 1);

        merged.accept(Some(&3));
        assert_eq!(*log.borrow(), vec![(1, Some(3))]);
    }

    #[test]
    fn test_merged_ref_skips_duplicate_sinks() {
        let log: Log = Rc::default();
        let sink = recorder(&log, 0);
        let cell = NodeRef::<u8>::new();

        let merged = merge_refs([
            Some(sink.clone()),
            Some(cell.clone().into()),
            Some(sink),
            Some(cell.clone().into()),
        ]);

        assert_eq!(merged.len(), 2, "same sink should only be merged once");

        merged.accept(Some(&1));
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn test_merged_ref_with_no_sinks_is_noop() {
        let merged = merge_refs::<u8, _>(std::iter::empty());
        assert!(merged.is_empty());
        merged.accept(Some(&9));
        merged.accept(None);
    }

    #[test]
    fn test_merged_refs_nest() {
        let inner_cell = NodeRef::<u8>::new();
        let outer_cell = NodeRef::<u8>::new();

        let inner = merge_refs([Some(inner_cell.clone().into())]);
        let outer = merge_refs([Some(NodeSink::from(inner)), Some(outer_cell.clone().into())]);

        outer.accept(Some(&4));
        assert_eq!(inner_cell.current(), Some(4));
        assert_eq!(outer_cell.current(), Some(4));
    }

    #[test]
    fn test_same_sinks_compares_identity() {
        let a = NodeRef::<u8>::new();
        let b = NodeRef::<u8>::new();

        let first = merge_refs([Some(a.clone().into()), Some(b.clone().into())]);
        let same = merge_refs([Some(a.clone().into()), Some(b.clone().into())]);
        let swapped = merge_refs([Some(b.into()), Some(a.into())]);

        assert!(first.same_sinks(&same));
        assert!(!first.same_sinks(&swapped));
    }

    proptest! {
        #[test]
        fn test_merged_ref_forwards_every_value_in_order(
            layout in proptest::collection::vec(any::<bool>(), 0..8),
            values in proptest::collection::vec(proptest::option::of(any::<u8>()), 0..16),
        ) {
            let log: Log = Rc::default();

            let mut index = 0;
            let entries: Vec<Option<NodeSink<u8>>> = layout
                .iter()
                .map(|present| {
                    if *present {
                        let sink = recorder(&log, index);
                        index += 1;
                        Some(sink)
                    } else {
                        None
                    }
                })
                .collect();
            let sink_count = index;

            let merged = merge_refs(entries);
            for value in &values {
                merged.accept(value.as_ref());
            }

            let expected: Vec<(usize, Option<u8>)> = values
                .iter()
                .flat_map(|value| (0..sink_count).map(move |index| (index, *value)))
                .collect();

            prop_assert_eq!(log.borrow().clone(), expected);
        }
    }
}
