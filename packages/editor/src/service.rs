//! # Tree service
//!
//! Explicit owner of a bundle's live tree. Observers subscribe to a
//! `watch` channel and always see a complete tree: every change is a
//! whole-tree `Arc` replacement, never an in-place edit.
//!
//! ```text
//! load ──► publish(Arc<Tree>) ──► watch::Sender ──► subscribers
//!               ▲
//!   update(|tree| transform(tree))   (skipped when ptr_eq)
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use casebundle_tree::{Node, Tree, TreeResult};
use tokio::sync::watch;

/// Live tree of one bundle
#[derive(Debug)]
pub struct TreeService {
    bundle_id: String,
    tx: watch::Sender<Arc<Tree>>,
}

impl TreeService {
    pub fn new(bundle_id: impl Into<String>, tree: Tree) -> Self {
        let (tx, _rx) = watch::channel(Arc::new(tree));
        Self {
            bundle_id: bundle_id.into(),
            tx,
        }
    }

    /// Service over an empty tree whose root id is the bundle id
    pub fn empty(bundle_id: impl Into<String>) -> Self {
        let bundle_id = bundle_id.into();
        let tree = Tree::empty(bundle_id.clone());
        Self::new(bundle_id, tree)
    }

    pub fn bundle_id(&self) -> &str {
        &self.bundle_id
    }

    /// Current tree
    pub fn snapshot(&self) -> Arc<Tree> {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<Tree>> {
        self.tx.subscribe()
    }

    /// Replace the tree wholesale from a backend payload. No merge.
    pub fn load(&self, root: Node) -> TreeResult<()> {
        let tree = Tree::from_root(root)?;
        tracing::info!("Loaded bundle {} with {} nodes", self.bundle_id, tree.len());
        self.tx.send_replace(Arc::new(tree));
        Ok(())
    }

    /// Publish `tree` unless it is the tree already live. Returns whether
    /// subscribers were notified.
    pub fn publish(&self, tree: Arc<Tree>) -> bool {
        self.tx.send_if_modified(|current| {
            if Arc::ptr_eq(current, &tree) {
                return false;
            }
            *current = tree;
            true
        })
    }

    /// Publish `tree` only if the live tree is still `expected`
    pub fn compare_and_publish(&self, expected: &Arc<Tree>, tree: Arc<Tree>) -> bool {
        self.tx.send_if_modified(|current| {
            if !Arc::ptr_eq(current, expected) || Arc::ptr_eq(current, &tree) {
                return false;
            }
            *current = tree;
            true
        })
    }

    /// Run a transform against the latest tree and publish the result.
    ///
    /// Returns `(before, after)`; they are the same `Arc` when the transform
    /// was a no-op.
    pub fn update<F>(&self, transform: F) -> (Arc<Tree>, Arc<Tree>)
    where
        F: FnOnce(&Arc<Tree>) -> Arc<Tree>,
    {
        let mut before = None;
        let mut after = None;

        self.tx.send_if_modified(|current| {
            let next = transform(current);
            before = Some(Arc::clone(current));
            after = Some(Arc::clone(&next));

            if Arc::ptr_eq(current, &next) {
                return false;
            }
            *current = next;
            true
        });

        let before = before.unwrap_or_else(|| self.snapshot());
        let after = after.unwrap_or_else(|| Arc::clone(&before));
        (before, after)
    }

    /// Every id currently in the tree; used to prune client-side state
    pub fn valid_ids(&self) -> HashSet<String> {
        self.snapshot().entries().map(|e| e.id.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use casebundle_tree::transforms;

    fn service() -> TreeService {
        let tree = Tree::from_root(Node::folder(
            "b1",
            "Bundle",
            vec![Node::file("a", "A"), Node::file("b", "B")],
        ))
        .unwrap();
        TreeService::new("b1", tree)
    }

    #[test]
    fn test_noop_update_does_not_notify() {
        let service = service();
        let rx = service.subscribe();

        let (before, after) = service.update(|t| transforms::remove_node(t, "missing"));
        assert!(Arc::ptr_eq(&before, &after));
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn test_update_notifies_subscribers() {
        let service = service();
        let mut rx = service.subscribe();

        let (_, after) = service.update(|t| transforms::remove_node(t, "a"));
        assert!(rx.has_changed().unwrap());
        assert!(Arc::ptr_eq(&rx.borrow_and_update(), &after));
    }

    #[test]
    fn test_compare_and_publish_skips_stale_expectation() {
        let service = service();
        let original = service.snapshot();
        let (_, newer) = service.update(|t| transforms::remove_node(t, "a"));

        let restored = service.compare_and_publish(&original, Arc::clone(&original));
        assert!(!restored);
        assert!(Arc::ptr_eq(&service.snapshot(), &newer));
    }

    #[test]
    fn test_load_replaces_wholesale() {
        let service = service();
        service
            .load(Node::folder("b1", "Bundle", vec![Node::file("z", "Z")]))
            .unwrap();
        assert_eq!(service.valid_ids(), HashSet::from(["z".to_string()]));
    }
}
