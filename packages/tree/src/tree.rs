//! # Arena-backed document tree
//!
//! Nodes are stored in a map keyed by id. Each entry carries its parent
//! pointer and its ordered child list, so:
//!
//! - lookups by id are O(1)
//! - ancestor checks walk parent pointers, O(depth)
//! - removal drops exactly the removed subtree's entries
//!
//! The root folder is an ordinary entry, but it is never exposed as a parent:
//! [`Tree::find_parent_id`] reports `None` for its direct children, and every
//! API that takes a parent accepts `None` to mean "the root".

use std::collections::HashMap;

use crate::node::{Node, NodeKind};
use crate::result::TreeResult;
use crate::visitor::{walk_tree, Visitor};
use crate::TreeError;

/// One node in the arena
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeEntry {
    pub id: String,
    pub name: String,
    pub kind: NodeKind,
    /// Parent id; `None` only for the root itself
    pub parent: Option<String>,
    /// Ordered child ids (always empty for files)
    pub children: Vec<String>,
}

impl NodeEntry {
    pub fn is_folder(&self) -> bool {
        self.kind == NodeKind::Folder
    }

    pub fn is_file(&self) -> bool {
        self.kind == NodeKind::File
    }
}

/// Where a node sits: its parent (root = `None`) and its index among siblings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    pub parent_id: Option<String>,
    pub index: usize,
}

/// The canonical ordered tree of a bundle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tree {
    root_id: String,
    nodes: HashMap<String, NodeEntry>,
}

impl Tree {
    /// Empty tree consisting only of the root folder
    pub fn empty(root_id: impl Into<String>) -> Self {
        let root_id = root_id.into();
        let mut nodes = HashMap::new();
        nodes.insert(
            root_id.clone(),
            NodeEntry {
                id: root_id.clone(),
                name: String::new(),
                kind: NodeKind::Folder,
                parent: None,
                children: Vec::new(),
            },
        );
        Self { root_id, nodes }
    }

    /// Build the arena from a nested payload, validating the invariants
    pub fn from_root(root: Node) -> TreeResult<Self> {
        if !root.is_folder() {
            return Err(TreeError::RootNotFolder(root.id));
        }
        if root.id.is_empty() {
            return Err(TreeError::EmptyId);
        }

        let mut tree = Self::empty(root.id.clone());
        if let Some(entry) = tree.nodes.get_mut(&root.id) {
            entry.name = root.name.clone();
        }

        for child in root.children() {
            tree.validate_block_node(child)?;
            let root_id = tree.root_id.clone();
            tree.link_subtree(&root_id, usize::MAX, child);
        }

        Ok(tree)
    }

    pub fn root_id(&self) -> &str {
        &self.root_id
    }

    /// Name of the root folder (usually the bundle title)
    pub fn root_name(&self) -> &str {
        self.nodes
            .get(&self.root_id)
            .map(|e| e.name.as_str())
            .unwrap_or_default()
    }

    /// Number of nodes, excluding the root
    pub fn len(&self) -> usize {
        self.nodes.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: &str) -> bool {
        id != self.root_id && self.nodes.contains_key(id)
    }

    /// Look a node up by id. The root is not addressable this way.
    pub fn find_node(&self, id: &str) -> Option<&NodeEntry> {
        if id == self.root_id {
            return None;
        }
        self.nodes.get(id)
    }

    /// Direct parent of `id`; `None` for root children and unknown ids
    pub fn find_parent_id(&self, id: &str) -> Option<&str> {
        let parent = self.find_node(id)?.parent.as_deref()?;
        if parent == self.root_id {
            None
        } else {
            Some(parent)
        }
    }

    /// Parent and sibling index of `id`
    pub fn position_of(&self, id: &str) -> Option<Position> {
        let entry = self.find_node(id)?;
        let parent = entry.parent.as_deref()?;
        let siblings = &self.nodes.get(parent)?.children;
        let index = siblings.iter().position(|c| c == id)?;

        Some(Position {
            parent_id: (parent != self.root_id).then(|| parent.to_string()),
            index,
        })
    }

    /// Ordered children of a folder (`None` = root). `None` if the parent is
    /// unknown or is a file.
    pub fn children_of(&self, parent_id: Option<&str>) -> Option<&[String]> {
        let entry = self.nodes.get(self.resolve_parent(parent_id))?;
        entry.is_folder().then_some(entry.children.as_slice())
    }

    /// Resolved children entries of a folder, in order
    pub fn child_entries(&self, parent_id: Option<&str>) -> Vec<&NodeEntry> {
        self.children_of(parent_id)
            .unwrap_or_default()
            .iter()
            .filter_map(|id| self.nodes.get(id))
            .collect()
    }

    /// Whether `target_id` lies strictly below `ancestor_id`.
    ///
    /// Walks parent pointers upward from the target, so the cost is the
    /// target's depth rather than the ancestor's subtree size.
    pub fn is_descendant(&self, ancestor_id: &str, target_id: &str) -> bool {
        let mut current = match self.nodes.get(target_id) {
            Some(entry) => entry.parent.as_deref(),
            None => return false,
        };

        while let Some(id) = current {
            if id == ancestor_id {
                return true;
            }
            current = self.nodes.get(id).and_then(|e| e.parent.as_deref());
        }

        false
    }

    /// Rebuild the nested form of one subtree
    pub fn subtree(&self, id: &str) -> Option<Node> {
        let entry = self.nodes.get(id)?;
        let children = match entry.kind {
            NodeKind::File => None,
            NodeKind::Folder => Some(
                entry
                    .children
                    .iter()
                    .filter_map(|child| self.subtree(child))
                    .collect(),
            ),
        };

        Some(Node {
            id: entry.id.clone(),
            name: entry.name.clone(),
            kind: entry.kind,
            children,
        })
    }

    /// Nested form of the whole tree, root included
    pub fn to_node(&self) -> Node {
        self.subtree(&self.root_id)
            .unwrap_or_else(|| Node::folder(self.root_id.clone(), "", Vec::new()))
    }

    /// Every id in display order (pre-order, root excluded)
    pub fn document_order(&self) -> Vec<String> {
        struct Collect(Vec<String>);

        impl Visitor for Collect {
            fn visit_node(&mut self, tree: &Tree, entry: &NodeEntry) {
                self.0.push(entry.id.clone());
                crate::visitor::walk_children(self, tree, entry);
            }
        }

        let mut collect = Collect(Vec::with_capacity(self.len()));
        walk_tree(&mut collect, self);
        collect.0
    }

    /// Iterate every node entry, root excluded, in no particular order
    pub fn entries(&self) -> impl Iterator<Item = &NodeEntry> {
        self.nodes.values().filter(move |e| e.id != self.root_id)
    }

    pub(crate) fn resolve_parent<'a>(&'a self, parent_id: Option<&'a str>) -> &'a str {
        parent_id.unwrap_or(&self.root_id)
    }

    pub(crate) fn entry(&self, id: &str) -> Option<&NodeEntry> {
        self.nodes.get(id)
    }

    pub(crate) fn entry_mut(&mut self, id: &str) -> Option<&mut NodeEntry> {
        self.nodes.get_mut(id)
    }

    /// Check that a nested block can be linked without breaking id uniqueness
    pub(crate) fn validate_block_node(&self, node: &Node) -> TreeResult<()> {
        let mut seen = std::collections::HashSet::new();
        self.validate_into(node, &mut seen)
    }

    fn validate_into<'n>(
        &self,
        node: &'n Node,
        seen: &mut std::collections::HashSet<&'n str>,
    ) -> TreeResult<()> {
        if node.id.is_empty() {
            return Err(TreeError::EmptyId);
        }
        if self.nodes.contains_key(&node.id) || !seen.insert(node.id.as_str()) {
            return Err(TreeError::DuplicateId(node.id.clone()));
        }
        if !node.is_folder() && node.children.as_ref().is_some_and(|c| !c.is_empty()) {
            return Err(TreeError::FileWithChildren(node.id.clone()));
        }
        for child in node.children() {
            self.validate_into(child, seen)?;
        }
        Ok(())
    }

    /// Insert a nested subtree under `parent_id` at `index` (clamped).
    /// Callers validate first.
    pub(crate) fn link_subtree(&mut self, parent_id: &str, index: usize, node: &Node) {
        let children = match self.nodes.get_mut(parent_id) {
            Some(parent) => &mut parent.children,
            None => return,
        };
        let at = index.min(children.len());
        children.insert(at, node.id.clone());

        self.nodes.insert(
            node.id.clone(),
            NodeEntry {
                id: node.id.clone(),
                name: node.name.clone(),
                kind: node.kind,
                parent: Some(parent_id.to_string()),
                children: Vec::new(),
            },
        );

        for (i, child) in node.children().iter().enumerate() {
            self.link_subtree(&node.id, i, child);
        }
    }

    /// Remove `id` from its parent's child list and drop its whole subtree
    pub(crate) fn unlink(&mut self, id: &str) -> bool {
        let parent = match self.nodes.get(id).and_then(|e| e.parent.clone()) {
            Some(parent) => parent,
            None => return false,
        };

        if let Some(entry) = self.nodes.get_mut(&parent) {
            entry.children.retain(|c| c != id);
        }
        self.drop_subtree(id);
        true
    }

    fn drop_subtree(&mut self, id: &str) {
        if let Some(entry) = self.nodes.remove(id) {
            for child in entry.children {
                self.drop_subtree(&child);
            }
        }
    }

    /// Detach `id` from its parent but keep its entries, returning the
    /// nested form so it can be re-linked elsewhere
    pub(crate) fn detach(&mut self, id: &str) -> Option<Node> {
        let node = self.subtree(id)?;
        if self.unlink(id) {
            Some(node)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Tree {
        Tree::from_root(Node::folder(
            "root",
            "Bundle",
            vec![
                Node::file("a", "A"),
                Node::file("b", "B"),
                Node::folder(
                    "x",
                    "FolderX",
                    vec![
                        Node::file("c", "C"),
                        Node::folder("y", "FolderY", vec![Node::file("d", "D")]),
                    ],
                ),
            ],
        ))
        .unwrap()
    }

    #[test]
    fn test_from_root_rejects_duplicate_ids() {
        let result = Tree::from_root(Node::folder(
            "root",
            "Bundle",
            vec![
                Node::file("a", "A"),
                Node::folder("x", "X", vec![Node::file("a", "A again")]),
            ],
        ));
        assert_eq!(result, Err(TreeError::DuplicateId("a".to_string())));
    }

    #[test]
    fn test_from_root_rejects_file_root() {
        let result = Tree::from_root(Node::file("root", "Bundle"));
        assert_eq!(result, Err(TreeError::RootNotFolder("root".to_string())));
    }

    #[test]
    fn test_from_root_rejects_file_with_children() {
        let mut bad = Node::file("f", "F");
        bad.children = Some(vec![Node::file("g", "G")]);
        let result = Tree::from_root(Node::folder("root", "Bundle", vec![bad]));
        assert_eq!(result, Err(TreeError::FileWithChildren("f".to_string())));
    }

    #[test]
    fn test_find_parent_id_root_children_are_none() {
        let tree = sample();
        assert_eq!(tree.find_parent_id("a"), None);
        assert_eq!(tree.find_parent_id("c"), Some("x"));
        assert_eq!(tree.find_parent_id("d"), Some("y"));
        assert_eq!(tree.find_parent_id("missing"), None);
    }

    #[test]
    fn test_root_is_not_addressable() {
        let tree = sample();
        assert!(tree.find_node("root").is_none());
        assert!(!tree.contains("root"));
        assert_eq!(tree.len(), 6);
    }

    #[test]
    fn test_position_of() {
        let tree = sample();
        assert_eq!(
            tree.position_of("b"),
            Some(Position { parent_id: None, index: 1 })
        );
        assert_eq!(
            tree.position_of("y"),
            Some(Position { parent_id: Some("x".to_string()), index: 1 })
        );
    }

    #[test]
    fn test_is_descendant_is_strict() {
        let tree = sample();
        assert!(tree.is_descendant("x", "c"));
        assert!(tree.is_descendant("x", "d"));
        assert!(!tree.is_descendant("x", "x"));
        assert!(!tree.is_descendant("y", "c"));
        assert!(!tree.is_descendant("x", "missing"));
    }

    #[test]
    fn test_document_order_and_round_trip() {
        let tree = sample();
        assert_eq!(tree.document_order(), vec!["a", "b", "x", "c", "y", "d"]);

        let rebuilt = Tree::from_root(tree.to_node()).unwrap();
        assert_eq!(rebuilt, tree);
    }

    #[test]
    fn test_children_of_file_is_none() {
        let tree = sample();
        assert!(tree.children_of(Some("a")).is_none());
        assert_eq!(tree.children_of(None).unwrap(), &["a", "b", "x"]);
    }
}
