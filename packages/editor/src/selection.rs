//! # Selection and expansion state
//!
//! Tracks which *file* nodes are the target of a bulk operation. Folders
//! never join a multi-selection; clicking a folder makes it the single
//! active folder and clears the file selection.
//!
//! Range selection works in *visible order*: a depth-first list of file ids
//! that only descends into expanded folders. Collapsing a folder between two
//! shift-clicks therefore changes what "in between" means.

use std::collections::HashSet;

use casebundle_tree::{walk_children, walk_tree, NodeEntry, Tree, Visitor};

/// File selection plus the anchor used for shift-click ranges
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    pub selected_file_ids: HashSet<String>,
    pub anchor_id: Option<String>,
}

/// Modifier keys held during a click
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClickModifiers {
    pub shift: bool,
    /// Ctrl on Windows/Linux, Cmd on macOS
    pub toggle: bool,
}

#[derive(Debug, Clone, Default)]
pub struct SelectionManager {
    state: SelectionState,
    active_folder: Option<String>,
}

impl SelectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn active_folder(&self) -> Option<&str> {
        self.active_folder.as_deref()
    }

    pub fn anchor(&self) -> Option<&str> {
        self.state.anchor_id.as_deref()
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.state.selected_file_ids.contains(id)
    }

    pub fn is_empty(&self) -> bool {
        self.state.selected_file_ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.state.selected_file_ids.len()
    }

    /// Selected ids in display order
    pub fn ordered(&self, tree: &Tree) -> Vec<String> {
        tree.document_order()
            .into_iter()
            .filter(|id| self.is_selected(id))
            .collect()
    }

    /// Make `id` the only selected file. Folder and unknown ids are ignored.
    pub fn select_single(&mut self, tree: &Tree, id: &str) {
        if !is_file(tree, id) {
            return;
        }
        self.active_folder = None;
        self.state.selected_file_ids.clear();
        self.state.selected_file_ids.insert(id.to_string());
        self.state.anchor_id = Some(id.to_string());
    }

    /// Add or remove one file. Folder and unknown ids are ignored.
    pub fn select_toggle(&mut self, tree: &Tree, id: &str) {
        if !is_file(tree, id) {
            return;
        }
        self.active_folder = None;
        let was_empty = self.state.selected_file_ids.is_empty();

        if !self.state.selected_file_ids.remove(id) {
            self.state.selected_file_ids.insert(id.to_string());
        }

        if was_empty {
            self.state.anchor_id = Some(id.to_string());
        }
    }

    /// Select the inclusive slice of `visible_order` between `anchor_id` and
    /// `target_id`, whichever comes first. The anchor stays where it was.
    pub fn select_range(
        &mut self,
        tree: &Tree,
        anchor_id: &str,
        target_id: &str,
        visible_order: &[String],
    ) {
        let anchor = visible_order.iter().position(|id| id == anchor_id);
        let target = visible_order.iter().position(|id| id == target_id);

        let (anchor, target) = match (anchor, target) {
            (Some(a), Some(t)) => (a, t),
            _ => {
                // Anchor scrolled out of view (collapsed or deleted)
                self.select_single(tree, target_id);
                return;
            }
        };

        let (start, end) = if anchor <= target {
            (anchor, target)
        } else {
            (target, anchor)
        };

        self.active_folder = None;
        self.state.selected_file_ids = visible_order[start..=end].iter().cloned().collect();
        self.state.anchor_id = Some(anchor_id.to_string());
    }

    /// Dispatch a click on any node according to its kind and modifiers
    pub fn click(
        &mut self,
        tree: &Tree,
        id: &str,
        modifiers: ClickModifiers,
        expansion: &ExpansionState,
    ) {
        let entry = match tree.find_node(id) {
            Some(entry) => entry,
            None => return,
        };

        if entry.is_folder() {
            self.select_folder(id);
            return;
        }

        match (modifiers.shift, modifiers.toggle, self.state.anchor_id.clone()) {
            (true, _, Some(anchor)) => {
                let order = visible_file_order(tree, expansion);
                self.select_range(tree, &anchor, id, &order);
            }
            (false, true, _) => self.select_toggle(tree, id),
            _ => self.select_single(tree, id),
        }
    }

    /// Make `id` the single active folder, clearing the file selection
    pub fn select_folder(&mut self, id: &str) {
        self.state = SelectionState::default();
        self.active_folder = Some(id.to_string());
    }

    pub fn clear(&mut self) {
        self.state = SelectionState::default();
        self.active_folder = None;
    }

    /// Drop ids that are no longer in the tree. Called on every tree change.
    pub fn prune_invalid(&mut self, valid_ids: &HashSet<String>) {
        self.state.selected_file_ids.retain(|id| valid_ids.contains(id));

        if self
            .state
            .anchor_id
            .as_ref()
            .is_some_and(|anchor| !valid_ids.contains(anchor))
        {
            self.state.anchor_id = None;
        }

        if self
            .active_folder
            .as_ref()
            .is_some_and(|folder| !valid_ids.contains(folder))
        {
            self.active_folder = None;
        }
    }
}

/// Which folders are currently expanded
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpansionState {
    expanded: HashSet<String>,
}

impl ExpansionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_expanded(&self, folder_id: &str) -> bool {
        self.expanded.contains(folder_id)
    }

    pub fn expand(&mut self, folder_id: &str) {
        self.expanded.insert(folder_id.to_string());
    }

    pub fn collapse(&mut self, folder_id: &str) {
        self.expanded.remove(folder_id);
    }

    pub fn toggle(&mut self, folder_id: &str) {
        if !self.expanded.remove(folder_id) {
            self.expanded.insert(folder_id.to_string());
        }
    }

    /// Expand every folder on the path to `id` so it becomes visible
    pub fn reveal(&mut self, tree: &Tree, id: &str) {
        let mut current = tree.find_parent_id(id);
        while let Some(parent) = current {
            self.expanded.insert(parent.to_string());
            current = tree.find_parent_id(parent);
        }
    }

    pub fn prune_invalid(&mut self, valid_ids: &HashSet<String>) {
        self.expanded.retain(|id| valid_ids.contains(id));
    }
}

struct VisibleFiles<'a> {
    expansion: &'a ExpansionState,
    out: Vec<String>,
}

impl Visitor for VisibleFiles<'_> {
    fn visit_node(&mut self, tree: &Tree, entry: &NodeEntry) {
        if entry.is_file() {
            self.out.push(entry.id.clone());
        } else if self.expansion.is_expanded(&entry.id) {
            walk_children(self, tree, entry);
        }
    }
}

fn is_file(tree: &Tree, id: &str) -> bool {
    tree.find_node(id).is_some_and(|entry| entry.is_file())
}

/// Depth-first file ids, descending only into expanded folders. The root is
/// always traversed.
pub fn visible_file_order(tree: &Tree, expansion: &ExpansionState) -> Vec<String> {
    let mut visitor = VisibleFiles {
        expansion,
        out: Vec::new(),
    };
    walk_tree(&mut visitor, tree);
    visitor.out
}
