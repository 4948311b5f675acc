//! # Remote store
//!
//! The backend that owns the persisted copy of each bundle's tree.
//!
//! Calls are the only suspension points in the editor. The backend is
//! assumed to apply writes last-write-wins; nothing here serializes
//! gestures.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use casebundle_tree::{transforms, Node, Tree};
use serde::{Deserialize, Serialize};

use crate::errors::RemoteError;

/// One entry of a "set sibling order" call. Scoped implicitly to the
/// parent all the ids share.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: String,
    /// 0-based position among siblings
    pub order: usize,
}

impl OrderItem {
    pub fn from_ordered_ids(ids: &[String]) -> Vec<OrderItem> {
        ids.iter()
            .enumerate()
            .map(|(order, id)| OrderItem {
                id: id.clone(),
                order,
            })
            .collect()
    }
}

#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Fetch the full tree of a bundle
    async fn load_tree(&self, bundle_id: &str) -> Result<Node, RemoteError>;

    /// Move nodes under `new_parent_id` (appended at the end). Returns the
    /// updated tree; the destination's children in it are authoritative.
    async fn move_nodes(
        &self,
        bundle_id: &str,
        node_ids: &[String],
        new_parent_id: Option<&str>,
    ) -> Result<Node, RemoteError>;

    /// Persist a new sibling order
    async fn reorder(&self, bundle_id: &str, items: &[OrderItem]) -> Result<(), RemoteError>;

    /// Create a folder; the backend assigns the id
    async fn create_folder(
        &self,
        bundle_id: &str,
        name: &str,
        parent_id: Option<&str>,
    ) -> Result<Node, RemoteError>;

    async fn rename_node(
        &self,
        bundle_id: &str,
        node_id: &str,
        name: &str,
    ) -> Result<(), RemoteError>;

    async fn delete_nodes(&self, bundle_id: &str, node_ids: &[String]) -> Result<(), RemoteError>;
}

/// Children of `parent_id` (`None` = root) in a nested tree
pub fn children_in(root: &Node, parent_id: Option<&str>) -> Option<Vec<String>> {
    fn find<'a>(node: &'a Node, id: &str) -> Option<&'a Node> {
        if node.id == id {
            return Some(node);
        }
        node.children().iter().find_map(|child| find(child, id))
    }

    let parent = match parent_id {
        Some(id) => find(root, id)?,
        None => root,
    };
    parent
        .is_folder()
        .then(|| parent.children().iter().map(|c| c.id.clone()).collect())
}

/// A recorded backend call, in the order it was issued
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    Load,
    Move {
        node_ids: Vec<String>,
        new_parent_id: Option<String>,
    },
    Reorder(Vec<OrderItem>),
    CreateFolder {
        name: String,
        parent_id: Option<String>,
    },
    Rename {
        node_id: String,
        name: String,
    },
    Delete(Vec<String>),
}

/// Which call a [`MemoryRemote`] should reject next
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailOn {
    Move,
    Reorder,
    CreateFolder,
    Rename,
    Delete,
}

#[derive(Default)]
struct MemoryState {
    bundles: HashMap<String, Arc<Tree>>,
    calls: Vec<RemoteCall>,
    fail_next: Vec<FailOn>,
    next_id: u64,
}

/// In-process backend.
///
/// Applies every call to its own copy of each bundle, records the calls,
/// and can be told to reject the next call of a given kind.
#[derive(Default, Clone)]
pub struct MemoryRemote {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a bundle
    pub fn with_bundle(
        self,
        bundle_id: &str,
        root: Node,
    ) -> Result<Self, casebundle_tree::TreeError> {
        let tree = Tree::from_root(root)?;
        self.lock().bundles.insert(bundle_id.to_string(), Arc::new(tree));
        Ok(self)
    }

    /// Reject the next call of this kind
    pub fn fail_next(&self, call: FailOn) {
        self.lock().fail_next.push(call);
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        self.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// The backend's current copy of a bundle
    pub fn snapshot(&self, bundle_id: &str) -> Option<Arc<Tree>> {
        self.lock().bundles.get(bundle_id).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        // A panicking test thread must not poison every later assertion
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn begin(
        &self,
        bundle_id: &str,
        call: RemoteCall,
        fail: Option<FailOn>,
    ) -> Result<(std::sync::MutexGuard<'_, MemoryState>, Arc<Tree>), RemoteError> {
        let mut state = self.lock();
        state.calls.push(call);

        if let Some(kind) = fail {
            if let Some(pos) = state.fail_next.iter().position(|f| *f == kind) {
                state.fail_next.remove(pos);
                return Err(RemoteError::rejected(format!("{:?}", kind), "simulated failure"));
            }
        }

        let tree = state
            .bundles
            .get(bundle_id)
            .cloned()
            .ok_or_else(|| RemoteError::BundleNotFound(bundle_id.to_string()))?;
        Ok((state, tree))
    }
}

#[async_trait]
impl RemoteStore for MemoryRemote {
    async fn load_tree(&self, bundle_id: &str) -> Result<Node, RemoteError> {
        let (state, tree) = self.begin(bundle_id, RemoteCall::Load, None)?;
        drop(state);
        Ok(tree.to_node())
    }

    async fn move_nodes(
        &self,
        bundle_id: &str,
        node_ids: &[String],
        new_parent_id: Option<&str>,
    ) -> Result<Node, RemoteError> {
        let call = RemoteCall::Move {
            node_ids: node_ids.to_vec(),
            new_parent_id: new_parent_id.map(str::to_string),
        };
        let (mut state, tree) = self.begin(bundle_id, call, Some(FailOn::Move))?;

        if let Some(missing) = node_ids.iter().find(|id| !tree.contains(id)) {
            return Err(RemoteError::NodeNotFound(missing.clone()));
        }

        let next = transforms::move_nodes(&tree, node_ids, new_parent_id, usize::MAX);
        let response = next.to_node();
        state.bundles.insert(bundle_id.to_string(), next);
        Ok(response)
    }

    async fn reorder(&self, bundle_id: &str, items: &[OrderItem]) -> Result<(), RemoteError> {
        let call = RemoteCall::Reorder(items.to_vec());
        let (mut state, tree) = self.begin(bundle_id, call, Some(FailOn::Reorder))?;

        let first = match items.first() {
            Some(item) => item,
            None => return Ok(()),
        };
        if !tree.contains(&first.id) {
            return Err(RemoteError::NodeNotFound(first.id.clone()));
        }

        let mut sorted = items.to_vec();
        sorted.sort_by_key(|item| item.order);
        let ordered: Vec<String> = sorted.into_iter().map(|item| item.id).collect();

        let parent = tree.find_parent_id(&first.id).map(str::to_string);
        let next = transforms::set_child_order(&tree, parent.as_deref(), &ordered);
        let unchanged = Arc::ptr_eq(&tree, &next);
        if unchanged && tree.children_of(parent.as_deref()) != Some(ordered.as_slice()) {
            return Err(RemoteError::rejected("Reorder", "items are not the full sibling list"));
        }
        state.bundles.insert(bundle_id.to_string(), next);
        Ok(())
    }

    async fn create_folder(
        &self,
        bundle_id: &str,
        name: &str,
        parent_id: Option<&str>,
    ) -> Result<Node, RemoteError> {
        let call = RemoteCall::CreateFolder {
            name: name.to_string(),
            parent_id: parent_id.map(str::to_string),
        };
        let (mut state, tree) = self.begin(bundle_id, call, Some(FailOn::CreateFolder))?;

        if tree.children_of(parent_id).is_none() {
            return Err(RemoteError::NodeNotFound(parent_id.unwrap_or_default().to_string()));
        }

        state.next_id += 1;
        let folder = Node::folder(format!("folder-{}", state.next_id), name, Vec::new());
        let next = transforms::insert_nodes(&tree, parent_id, std::slice::from_ref(&folder), None);
        state.bundles.insert(bundle_id.to_string(), next);
        Ok(folder)
    }

    async fn rename_node(
        &self,
        bundle_id: &str,
        node_id: &str,
        name: &str,
    ) -> Result<(), RemoteError> {
        let call = RemoteCall::Rename {
            node_id: node_id.to_string(),
            name: name.to_string(),
        };
        let (mut state, tree) = self.begin(bundle_id, call, Some(FailOn::Rename))?;

        if !tree.contains(node_id) {
            return Err(RemoteError::NodeNotFound(node_id.to_string()));
        }
        let next = transforms::rename_node(&tree, node_id, name);
        state.bundles.insert(bundle_id.to_string(), next);
        Ok(())
    }

    async fn delete_nodes(&self, bundle_id: &str, node_ids: &[String]) -> Result<(), RemoteError> {
        let call = RemoteCall::Delete(node_ids.to_vec());
        let (mut state, tree) = self.begin(bundle_id, call, Some(FailOn::Delete))?;

        let next = transforms::remove_nodes(&tree, node_ids);
        state.bundles.insert(bundle_id.to_string(), next);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote() -> MemoryRemote {
        MemoryRemote::new()
            .with_bundle(
                "b1",
                Node::folder(
                    "root",
                    "Bundle",
                    vec![
                        Node::file("a", "A"),
                        Node::folder("x", "X", vec![Node::file("c", "C")]),
                    ],
                ),
            )
            .unwrap()
    }

    #[tokio::test]
    async fn test_move_appends_at_end() {
        let remote = remote();
        let tree = remote.move_nodes("b1", &["a".to_string()], Some("x")).await.unwrap();
        assert_eq!(children_in(&tree, Some("x")), Some(vec!["c".to_string(), "a".to_string()]));
    }

    #[tokio::test]
    async fn test_fail_next_rejects_once() {
        let remote = remote();
        remote.fail_next(FailOn::Reorder);
        let items = OrderItem::from_ordered_ids(&["x".to_string(), "a".to_string()]);

        assert!(matches!(
            remote.reorder("b1", &items).await,
            Err(RemoteError::Rejected { .. })
        ));
        assert!(remote.reorder("b1", &items).await.is_ok());
        assert_eq!(
            remote.snapshot("b1").unwrap().children_of(None).unwrap(),
            &["x", "a"]
        );
        assert_eq!(remote.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_bundle() {
        let remote = remote();
        assert_eq!(
            remote.load_tree("nope").await,
            Err(RemoteError::BundleNotFound("nope".to_string()))
        );
    }

    #[tokio::test]
    async fn test_load_returns_backend_copy_and_releases_state() {
        let remote = remote();
        let root = remote.load_tree("b1").await.unwrap();
        assert_eq!(children_in(&root, None), Some(vec!["a".to_string(), "x".to_string()]));

        // The state lock is free again once load returns
        remote.fail_next(FailOn::Move);
        assert_eq!(remote.calls(), vec![RemoteCall::Load]);
    }

    #[tokio::test]
    async fn test_create_folder_assigns_id() {
        let remote = remote();
        let folder = remote.create_folder("b1", "Exhibits", None).await.unwrap();
        assert!(folder.is_folder());
        assert!(remote.snapshot("b1").unwrap().contains(&folder.id));
    }
}
