//! # Copy-on-write tree transforms
//!
//! Every transform takes the current `Arc<Tree>` and returns the next one.
//! When the operation changes nothing (unknown id, file used as a parent,
//! result identical to the input) the **same** `Arc` comes back, so callers
//! can test `Arc::ptr_eq` and skip re-render or re-dispatch.
//!
//! Unknown ids never error. Drag gestures race with reloads and deletions,
//! and a stale id simply degrades to a no-op.

use std::collections::HashSet;
use std::sync::Arc;

use crate::node::Node;
use crate::tree::Tree;

/// Splice `id` (and its subtree) out of whichever parent holds it
pub fn remove_node(tree: &Arc<Tree>, id: &str) -> Arc<Tree> {
    if !tree.contains(id) {
        tracing::debug!("remove_node: unknown id {}", id);
        return Arc::clone(tree);
    }

    let mut next = Tree::clone(tree);
    next.unlink(id);
    Arc::new(next)
}

/// Remove several nodes at once. Ids already covered by a removed ancestor
/// are skipped.
pub fn remove_nodes(tree: &Arc<Tree>, ids: &[String]) -> Arc<Tree> {
    let present: Vec<&String> = ids.iter().filter(|id| tree.contains(id)).collect();
    if present.is_empty() {
        return Arc::clone(tree);
    }

    let mut next = Tree::clone(tree);
    for id in present {
        next.unlink(id);
    }
    Arc::new(next)
}

/// Splice a block of new nodes into a parent's children at `at_index`
/// (default: end, clamped to the child count).
///
/// The block must not reuse ids already in the tree; a block that would is
/// dropped and the input tree is returned.
pub fn insert_nodes(
    tree: &Arc<Tree>,
    parent_id: Option<&str>,
    nodes: &[Node],
    at_index: Option<usize>,
) -> Arc<Tree> {
    if nodes.is_empty() {
        return Arc::clone(tree);
    }

    let parent = match tree.children_of(parent_id) {
        Some(_) => tree.resolve_parent(parent_id).to_string(),
        None => {
            tracing::warn!("insert_nodes: {:?} is not a folder in this tree", parent_id);
            return Arc::clone(tree);
        }
    };

    if let Err(e) = validate_block(tree, nodes) {
        tracing::warn!("insert_nodes: rejected block: {}", e);
        return Arc::clone(tree);
    }

    let mut next = Tree::clone(tree);
    let start = at_index.unwrap_or(usize::MAX);
    let start = start.min(next.children_of(parent_id).map_or(0, |c| c.len()));
    for (offset, node) in nodes.iter().enumerate() {
        next.link_subtree(&parent, start + offset, node);
    }
    Arc::new(next)
}

/// Replace a folder's entire child list with `new_children`.
///
/// The new block may reuse ids from the subtree being replaced, but not ids
/// living elsewhere in the tree.
pub fn replace_children_at_parent(
    tree: &Arc<Tree>,
    parent_id: Option<&str>,
    new_children: &[Node],
) -> Arc<Tree> {
    let current = match tree.children_of(parent_id) {
        Some(children) => children,
        None => return Arc::clone(tree),
    };

    let unchanged = current.len() == new_children.len()
        && current
            .iter()
            .zip(new_children)
            .all(|(id, node)| tree.subtree(id).as_ref() == Some(node));
    if unchanged {
        return Arc::clone(tree);
    }

    let parent = tree.resolve_parent(parent_id).to_string();
    let mut next = Tree::clone(tree);
    for child in current {
        next.unlink(child);
    }

    if let Err(e) = validate_block(&next, new_children) {
        tracing::warn!("replace_children_at_parent: rejected block: {}", e);
        return Arc::clone(tree);
    }

    for (i, node) in new_children.iter().enumerate() {
        next.link_subtree(&parent, i, node);
    }
    Arc::new(next)
}

/// Permute an existing folder's children into `ordered_ids`.
///
/// Anything other than an exact permutation of the current children is a
/// no-op.
pub fn set_child_order(
    tree: &Arc<Tree>,
    parent_id: Option<&str>,
    ordered_ids: &[String],
) -> Arc<Tree> {
    let current = match tree.children_of(parent_id) {
        Some(children) => children,
        None => return Arc::clone(tree),
    };

    if current == ordered_ids {
        return Arc::clone(tree);
    }

    let current_set: HashSet<&String> = current.iter().collect();
    let ordered_set: HashSet<&String> = ordered_ids.iter().collect();
    if current.len() != ordered_ids.len() || current_set != ordered_set {
        tracing::warn!(
            "set_child_order: {:?} is not a permutation of the children of {:?}",
            ordered_ids,
            parent_id
        );
        return Arc::clone(tree);
    }

    let parent = tree.resolve_parent(parent_id).to_string();
    let mut next = Tree::clone(tree);
    if let Some(entry) = next.entry_mut(&parent) {
        entry.children = ordered_ids.to_vec();
    }
    Arc::new(next)
}

/// Update a node's display name in place
pub fn rename_node(tree: &Arc<Tree>, id: &str, name: &str) -> Arc<Tree> {
    match tree.find_node(id) {
        Some(entry) if entry.name != name => {}
        _ => return Arc::clone(tree),
    }

    let mut next = Tree::clone(tree);
    if let Some(entry) = next.entry_mut(id) {
        entry.name = name.to_string();
    }
    Arc::new(next)
}

/// Move existing nodes, as one block in the given order, under
/// `parent_id` at `index`.
///
/// `index` addresses the destination's child list *after* the moved nodes
/// have been taken out of it. Unknown ids are skipped; moving a folder into
/// itself or one of its descendants is a no-op.
pub fn move_nodes(
    tree: &Arc<Tree>,
    ids: &[String],
    parent_id: Option<&str>,
    index: usize,
) -> Arc<Tree> {
    let ids: Vec<&String> = ids.iter().filter(|id| tree.contains(id)).collect();
    if ids.is_empty() || tree.children_of(parent_id).is_none() {
        return Arc::clone(tree);
    }

    let parent = tree.resolve_parent(parent_id).to_string();
    if ids
        .iter()
        .any(|id| **id == parent || tree.is_descendant(id, &parent))
    {
        tracing::debug!("move_nodes: refusing to move {:?} into {}", ids, parent);
        return Arc::clone(tree);
    }

    let mut next = Tree::clone(tree);
    let mut block = Vec::with_capacity(ids.len());
    for id in &ids {
        // A dragged node nested under another dragged node travels with it
        if ids.iter().any(|other| other != id && next.is_descendant(other, id)) {
            continue;
        }
        if let Some(node) = next.detach(id) {
            block.push(node);
        }
    }

    let start = index.min(next.children_of(parent_id).map_or(0, |c| c.len()));
    for (offset, node) in block.iter().enumerate() {
        next.link_subtree(&parent, start + offset, node);
    }

    if next == **tree {
        return Arc::clone(tree);
    }
    Arc::new(next)
}

fn validate_block(tree: &Tree, nodes: &[Node]) -> crate::TreeResult<()> {
    let mut ids = Vec::new();
    for node in nodes {
        tree.validate_block_node(node)?;
        node.collect_ids(&mut ids);
    }

    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id.clone()) {
            return Err(crate::TreeError::DuplicateId(id));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Arc<Tree> {
        Arc::new(
            Tree::from_root(Node::folder(
                "root",
                "Bundle",
                vec![
                    Node::file("a", "A"),
                    Node::file("b", "B"),
                    Node::folder("x", "FolderX", vec![Node::file("c", "C")]),
                ],
            ))
            .unwrap(),
        )
    }

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_remove_node_anywhere() {
        let tree = sample();
        let next = remove_node(&tree, "c");
        assert!(!Arc::ptr_eq(&tree, &next));
        assert!(next.children_of(Some("x")).unwrap().is_empty());
        // Input untouched
        assert_eq!(tree.children_of(Some("x")).unwrap(), &["c"]);
    }

    #[test]
    fn test_remove_unknown_is_same_reference() {
        let tree = sample();
        assert!(Arc::ptr_eq(&tree, &remove_node(&tree, "nope")));
        assert!(Arc::ptr_eq(&tree, &remove_node(&tree, "root")));
    }

    #[test]
    fn test_remove_folder_drops_subtree() {
        let tree = sample();
        let next = remove_node(&tree, "x");
        assert!(!next.contains("c"));
        assert_eq!(next.len(), 2);
    }

    #[test]
    fn test_insert_nodes_at_index_and_default_end() {
        let tree = sample();
        let added = [Node::file("n1", "N1"), Node::file("n2", "N2")];
        let next = insert_nodes(&tree, None, &added, Some(1));
        assert_eq!(next.children_of(None).unwrap(), &ids(&["a", "n1", "n2", "b", "x"])[..]);

        let appended = insert_nodes(&tree, Some("x"), &[Node::file("n3", "N3")], None);
        assert_eq!(appended.children_of(Some("x")).unwrap(), &ids(&["c", "n3"])[..]);
    }

    #[test]
    fn test_insert_into_file_or_duplicate_is_noop() {
        let tree = sample();
        assert!(Arc::ptr_eq(&tree, &insert_nodes(&tree, Some("a"), &[Node::file("n", "N")], None)));
        assert!(Arc::ptr_eq(&tree, &insert_nodes(&tree, None, &[Node::file("c", "dup")], None)));
        assert!(Arc::ptr_eq(
            &tree,
            &insert_nodes(&tree, None, &[Node::file("n", "N"), Node::file("n", "N")], None)
        ));
    }

    #[test]
    fn test_replace_children_allows_reusing_own_ids() {
        let tree = sample();
        let children = [Node::file("d", "D"), Node::file("c", "C")];
        let next = replace_children_at_parent(&tree, Some("x"), &children);
        assert_eq!(next.children_of(Some("x")).unwrap(), &ids(&["d", "c"])[..]);

        let same = replace_children_at_parent(&tree, Some("x"), &[Node::file("c", "C")]);
        assert!(Arc::ptr_eq(&tree, &same));

        let clash = replace_children_at_parent(&tree, Some("x"), &[Node::file("a", "A")]);
        assert!(Arc::ptr_eq(&tree, &clash));
    }

    #[test]
    fn test_set_child_order_requires_permutation() {
        let tree = sample();
        let next = set_child_order(&tree, None, &ids(&["x", "a", "b"]));
        assert_eq!(next.children_of(None).unwrap(), &ids(&["x", "a", "b"])[..]);

        assert!(Arc::ptr_eq(&tree, &set_child_order(&tree, None, &ids(&["a", "b", "x"]))));
        assert!(Arc::ptr_eq(&tree, &set_child_order(&tree, None, &ids(&["a", "b"]))));
        assert!(Arc::ptr_eq(&tree, &set_child_order(&tree, None, &ids(&["a", "b", "c"]))));
    }

    #[test]
    fn test_rename_node() {
        let tree = sample();
        let next = rename_node(&tree, "a", "Exhibit A");
        assert_eq!(next.find_node("a").unwrap().name, "Exhibit A");
        assert!(Arc::ptr_eq(&next, &rename_node(&next, "a", "Exhibit A")));
        assert!(Arc::ptr_eq(&tree, &rename_node(&tree, "zzz", "x")));
    }

    #[test]
    fn test_move_nodes_across_parents() {
        let tree = sample();
        let next = move_nodes(&tree, &ids(&["a", "b"]), Some("x"), 1);
        assert_eq!(next.children_of(Some("x")).unwrap(), &ids(&["c", "a", "b"])[..]);
        assert_eq!(next.children_of(None).unwrap(), &ids(&["x"])[..]);
        assert_eq!(next.find_parent_id("a"), Some("x"));
    }

    #[test]
    fn test_move_folder_into_descendant_is_noop() {
        let tree = sample();
        assert!(Arc::ptr_eq(&tree, &move_nodes(&tree, &ids(&["x"]), Some("x"), 0)));
    }

    #[test]
    fn test_move_to_same_place_is_same_reference() {
        let tree = sample();
        assert!(Arc::ptr_eq(&tree, &move_nodes(&tree, &ids(&["a"]), None, 0)));
    }
}
