use crate::tree::{NodeEntry, Tree};

/// Visitor pattern for traversing the tree in display order
///
/// The default implementation walks every node. Override `visit_node` and
/// decide whether to call [`walk_children`] to prune a branch.
pub trait Visitor: Sized {
    fn visit_node(&mut self, tree: &Tree, entry: &NodeEntry) {
        walk_children(self, tree, entry);
    }
}

/// Visit every direct child of the root, in order
pub fn walk_tree<V: Visitor>(visitor: &mut V, tree: &Tree) {
    if let Some(root) = tree.entry(tree.root_id()) {
        walk_children(visitor, tree, root);
    }
}

pub fn walk_children<V: Visitor>(visitor: &mut V, tree: &Tree, entry: &NodeEntry) {
    for child in &entry.children {
        if let Some(child) = tree.entry(child) {
            visitor.visit_node(tree, child);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Node;

    struct FileNames(Vec<String>);

    impl Visitor for FileNames {
        fn visit_node(&mut self, tree: &Tree, entry: &NodeEntry) {
            if entry.is_file() {
                self.0.push(entry.name.clone());
            }
            walk_children(self, tree, entry);
        }
    }

    #[test]
    fn test_visitor_walks_in_display_order() {
        let tree = Tree::from_root(Node::folder(
            "root",
            "Bundle",
            vec![
                Node::folder("x", "X", vec![Node::file("c", "C")]),
                Node::file("a", "A"),
            ],
        ))
        .unwrap();

        let mut names = FileNames(Vec::new());
        walk_tree(&mut names, &tree);
        assert_eq!(names.0, vec!["C", "A"]);
    }
}
