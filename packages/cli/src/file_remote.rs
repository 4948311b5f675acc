//! Remote store backed by a JSON file on disk.
//!
//! Every call re-reads the file, applies the change with the same tree
//! transforms the editor uses, and writes it back.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use casebundle_editor::{OrderItem, RemoteError, RemoteStore};
use casebundle_tree::{transforms, Node, Tree, TreeError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to access {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed bundle file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid bundle tree: {0}")]
    Tree(#[from] TreeError),
}

impl From<StoreError> for RemoteError {
    fn from(e: StoreError) -> Self {
        RemoteError::Transport(e.to_string())
    }
}

/// On-disk layout of a bundle file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleFile {
    pub bundle_id: String,

    /// Counter for backend-assigned folder ids
    #[serde(default)]
    pub next_folder_id: u64,

    pub root: Node,
}

pub struct FileRemote {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process
    lock: Mutex<()>,
}

impl FileRemote {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Write a new, empty bundle file
    pub async fn create(
        path: impl Into<PathBuf>,
        bundle_id: &str,
        name: &str,
    ) -> Result<Self, StoreError> {
        let remote = Self::new(path);
        let file = BundleFile {
            bundle_id: bundle_id.to_string(),
            next_folder_id: 0,
            root: Node::folder(bundle_id, name, Vec::new()),
        };
        remote.write(&file).await?;
        Ok(remote)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Result<BundleFile, StoreError> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| self.io_error(source))?;
        Ok(serde_json::from_str(&content)?)
    }

    async fn write(&self, file: &BundleFile) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(file)?;
        tokio::fs::write(&self.path, json)
            .await
            .map_err(|source| self.io_error(source))
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }

    async fn open(&self, bundle_id: &str) -> Result<(BundleFile, Arc<Tree>), RemoteError> {
        let file = self.read().await?;
        if file.bundle_id != bundle_id {
            return Err(RemoteError::BundleNotFound(bundle_id.to_string()));
        }
        let tree = Tree::from_root(file.root.clone()).map_err(StoreError::from)?;
        Ok((file, Arc::new(tree)))
    }

    async fn commit(&self, mut file: BundleFile, tree: &Tree) -> Result<Node, RemoteError> {
        file.root = tree.to_node();
        self.write(&file).await?;
        Ok(file.root)
    }
}

#[async_trait]
impl RemoteStore for FileRemote {
    async fn load_tree(&self, bundle_id: &str) -> Result<Node, RemoteError> {
        let (file, _) = self.open(bundle_id).await?;
        Ok(file.root)
    }

    async fn move_nodes(
        &self,
        bundle_id: &str,
        node_ids: &[String],
        new_parent_id: Option<&str>,
    ) -> Result<Node, RemoteError> {
        let _guard = self.lock.lock().await;
        let (file, tree) = self.open(bundle_id).await?;

        if let Some(missing) = node_ids.iter().find(|id| !tree.contains(id)) {
            return Err(RemoteError::NodeNotFound(missing.clone()));
        }
        if tree.children_of(new_parent_id).is_none() {
            return Err(RemoteError::rejected("move", "destination is not a folder"));
        }

        let next = transforms::move_nodes(&tree, node_ids, new_parent_id, usize::MAX);
        self.commit(file, &next).await
    }

    async fn reorder(&self, bundle_id: &str, items: &[OrderItem]) -> Result<(), RemoteError> {
        let _guard = self.lock.lock().await;
        let (file, tree) = self.open(bundle_id).await?;

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
        if tree.children_of(parent.as_deref()) == Some(ordered.as_slice()) {
            return Ok(());
        }

        let next = transforms::set_child_order(&tree, parent.as_deref(), &ordered);
        if Arc::ptr_eq(&tree, &next) {
            return Err(RemoteError::rejected("reorder", "items are not the full sibling list"));
        }
        self.commit(file, &next).await?;
        Ok(())
    }

    async fn create_folder(
        &self,
        bundle_id: &str,
        name: &str,
        parent_id: Option<&str>,
    ) -> Result<Node, RemoteError> {
        let _guard = self.lock.lock().await;
        let (mut file, tree) = self.open(bundle_id).await?;

        if tree.children_of(parent_id).is_none() {
            return Err(RemoteError::NodeNotFound(parent_id.unwrap_or_default().to_string()));
        }

        let id = loop {
            file.next_folder_id += 1;
            let candidate = format!("folder-{}", file.next_folder_id);
            if !tree.contains(&candidate) && candidate != tree.root_id() {
                break candidate;
            }
        };

        let folder = Node::folder(id, name, Vec::new());
        let next = transforms::insert_nodes(&tree, parent_id, std::slice::from_ref(&folder), None);
        self.commit(file, &next).await?;
        Ok(folder)
    }

    async fn rename_node(
        &self,
        bundle_id: &str,
        node_id: &str,
        name: &str,
    ) -> Result<(), RemoteError> {
        let _guard = self.lock.lock().await;
        let (file, tree) = self.open(bundle_id).await?;

        if !tree.contains(node_id) {
            return Err(RemoteError::NodeNotFound(node_id.to_string()));
        }
        let next = transforms::rename_node(&tree, node_id, name);
        self.commit(file, &next).await?;
        Ok(())
    }

    async fn delete_nodes(&self, bundle_id: &str, node_ids: &[String]) -> Result<(), RemoteError> {
        let _guard = self.lock.lock().await;
        let (file, tree) = self.open(bundle_id).await?;

        let next = transforms::remove_nodes(&tree, node_ids);
        self.commit(file, &next).await?;
        Ok(())
    }
}
