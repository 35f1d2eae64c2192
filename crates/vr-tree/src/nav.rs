//! Minimal tree navigation trait shared by the shape tree (TNode links)
//! and the instance tree (LView/LContainer links).
//!
//! Trimmed down from a fuller tree-abstraction trait: the view runtime only
//! ever needs parent/children/ancestors traversal (for dirty propagation and
//! the recursive refresh walk), never lowest-common-ancestor or cursor-based
//! interactive navigation, so those are left out rather than carried as
//! unused surface.

/// Read-only navigation over a tree keyed by `Id`.
pub trait TreeNav<Id: Copy + Eq> {
    /// The parent of `id`, or `None` if `id` is a root.
    fn parent(&self, id: Id) -> Option<Id>;

    /// Immediate children of `id`, in tree order.
    fn children(&self, id: Id) -> impl Iterator<Item = Id> + '_;

    /// `id` itself, then its parent, grandparent, ... up to (and including)
    /// the root.
    fn ancestors(&self, start: Id) -> impl Iterator<Item = Id> + '_
    where
        Self: Sized,
    {
        Ancestors {
            tree: self,
            current: Some(start),
        }
    }

    /// Whether `id` has no parent.
    #[inline]
    fn is_root(&self, id: Id) -> bool {
        self.parent(id).is_none()
    }

    /// Walk up the parent chain until a node with no parent is found.
    fn find_root(&self, mut id: Id) -> Id {
        while let Some(parent) = self.parent(id) {
            id = parent;
        }
        id
    }
}

struct Ancestors<'a, T, Id> {
    tree: &'a T,
    current: Option<Id>,
}

impl<'a, T, Id> Iterator for Ancestors<'a, T, Id>
where
    T: TreeNav<Id>,
    Id: Copy + Eq,
{
    type Item = Id;

    fn next(&mut self) -> Option<Id> {
        let id = self.current.take()?;
        self.current = self.tree.parent(id);
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct TestTree(HashMap<u32, (Option<u32>, Vec<u32>)>);

    impl TreeNav<u32> for TestTree {
        fn parent(&self, id: u32) -> Option<u32> {
            self.0.get(&id).and_then(|(p, _)| *p)
        }

        fn children(&self, id: u32) -> impl Iterator<Item = u32> + '_ {
            self.0
                .get(&id)
                .map(|(_, c)| c.iter().copied())
                .into_iter()
                .flatten()
        }
    }

    fn sample() -> TestTree {
        let mut map = HashMap::new();
        map.insert(1, (None, vec![2, 3]));
        map.insert(2, (Some(1), vec![4]));
        map.insert(3, (Some(1), vec![]));
        map.insert(4, (Some(2), vec![]));
        TestTree(map)
    }

    #[test]
    fn ancestors_includes_self_then_walks_to_root() {
        let tree = sample();
        let chain: Vec<_> = tree.ancestors(4).collect();
        assert_eq!(chain, vec![4, 2, 1]);
    }

    #[test]
    fn find_root_walks_parent_chain() {
        let tree = sample();
        assert_eq!(tree.find_root(4), 1);
        assert_eq!(tree.find_root(1), 1);
    }

    #[test]
    fn is_root_true_only_without_parent() {
        let tree = sample();
        assert!(tree.is_root(1));
        assert!(!tree.is_root(2));
    }
}
