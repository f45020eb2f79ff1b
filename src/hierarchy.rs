use crate::model::{LibraryEntity, Playable};
use std::collections::BTreeSet;

/// Handle to a node owned by a [`HierarchyController`]. Stable for the
/// lifetime of one forest; invalidated by [`HierarchyController::clear`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeKey(usize);

#[derive(Debug)]
pub struct HierarchyNode {
    pub entity: LibraryEntity,
    /// Dense pre-order id. Assigned by `reset_node_ids`; never persisted,
    /// not stable across library reloads.
    pub id: usize,
    /// Id of the last node of this subtree: `[id, highest_child_id]` covers
    /// exactly this node and all of its descendants, with no gaps and no
    /// overlap into sibling subtrees.
    pub highest_child_id: usize,
    pub is_expanded: bool,
    parent: Option<NodeKey>,
    children: Vec<NodeKey>,
    is_multi_selected: bool,
}

impl HierarchyNode {
    pub fn is_multi_selected(&self) -> bool {
        self.is_multi_selected
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}

/// Navigation and selection engine over the flattened library browser.
///
/// The forest lives in an arena; nodes address each other by [`NodeKey`].
/// After every structural change the caller runs [`Self::reset_node_ids`],
/// which renumbers the forest in pre-order. All range and traversal queries
/// then reduce to integer comparisons on `[id, highest_child_id]` intervals.
///
/// Every mutating operation raises `dirty`; the UI layer polls and resets
/// it, the same way the rest of the client schedules redraws.
#[derive(Debug, Default)]
pub struct HierarchyController {
    nodes: Vec<HierarchyNode>,
    roots: Vec<NodeKey>,
    multi_selection: BTreeSet<usize>,
    by_id: Vec<NodeKey>,
    current: Option<NodeKey>,
    pivot: Option<NodeKey>,
    pub dirty: bool,
}

impl HierarchyController {
    pub fn new() -> HierarchyController {
        HierarchyController::default()
    }

    pub fn add_root(&mut self, entity: LibraryEntity) -> NodeKey {
        let key = self.insert(entity, None);
        self.roots.push(key);
        key
    }

    pub fn add_child(&mut self, parent: NodeKey, entity: LibraryEntity) -> NodeKey {
        let key = self.insert(entity, Some(parent));
        self.nodes[parent.0].children.push(key);
        key
    }

    fn insert(&mut self, entity: LibraryEntity, parent: Option<NodeKey>) -> NodeKey {
        let key = NodeKey(self.nodes.len());
        // Provisional id; canonical pre-order ids come from reset_node_ids.
        self.nodes.push(HierarchyNode {
            entity,
            id: key.0,
            highest_child_id: key.0,
            is_expanded: false,
            parent,
            children: Vec::new(),
            is_multi_selected: false,
        });
        self.by_id.push(key);
        self.dirty = true;
        key
    }

    /// Drop the whole forest along with selection, cursor and pivot. Called
    /// on library reload before the loader rebuilds the tree.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.roots.clear();
        self.by_id.clear();
        self.multi_selection.clear();
        self.current = None;
        self.pivot = None;
        self.dirty = true;
    }

    /// Renumber the forest: a zero-based counter assigned in pre-order
    /// (root first, each child subtree fully before the next sibling), then
    /// `highest_child_id` set to the last id handed out inside the subtree.
    pub fn reset_node_ids(&mut self) {
        let mut counter = 0;
        let roots = self.roots.clone();
        for root in roots {
            self.assign_ids(root, &mut counter);
        }

        self.by_id = vec![NodeKey(0); self.nodes.len()];
        for (index, node) in self.nodes.iter().enumerate() {
            self.by_id[node.id] = NodeKey(index);
        }

        self.multi_selection = self
            .nodes
            .iter()
            .filter(|node| node.is_multi_selected)
            .map(|node| node.id)
            .collect();
        self.dirty = true;
    }

    fn assign_ids(&mut self, key: NodeKey, counter: &mut usize) {
        self.nodes[key.0].id = *counter;
        *counter += 1;
        let children = self.nodes[key.0].children.clone();
        for child in children {
            self.assign_ids(child, counter);
        }
        self.nodes[key.0].highest_child_id = *counter - 1;
    }

    pub fn node(&self, key: NodeKey) -> &HierarchyNode {
        &self.nodes[key.0]
    }

    pub fn roots(&self) -> &[NodeKey] {
        &self.roots
    }

    pub fn children(&self, key: NodeKey) -> &[NodeKey] {
        &self.nodes[key.0].children
    }

    pub fn parent(&self, key: NodeKey) -> Option<NodeKey> {
        self.nodes[key.0].parent
    }

    pub fn node_by_id(&self, id: usize) -> Option<NodeKey> {
        self.by_id.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn set_expanded(&mut self, key: NodeKey, expanded: bool) {
        if self.nodes[key.0].is_expanded != expanded {
            self.nodes[key.0].is_expanded = expanded;
            self.dirty = true;
        }
    }

    /// A node is visible when no ancestor is collapsed.
    pub fn is_visible(&self, key: NodeKey) -> bool {
        let mut cursor = self.nodes[key.0].parent;
        while let Some(parent) = cursor {
            if !self.nodes[parent.0].is_expanded {
                return false;
            }
            cursor = self.nodes[parent.0].parent;
        }
        true
    }

    pub fn current(&self) -> Option<NodeKey> {
        self.current
    }

    pub fn set_current(&mut self, key: Option<NodeKey>) {
        if self.current != key {
            self.current = key;
            self.dirty = true;
        }
    }

    pub fn pivot(&self) -> Option<NodeKey> {
        self.pivot
    }

    pub fn set_pivot(&mut self, key: Option<NodeKey>) {
        if self.pivot != key {
            self.pivot = key;
            self.dirty = true;
        }
    }

    /// Selected ids in ascending (visual top-to-bottom) order. Mirrors the
    /// per-node flags exactly; the two are mutated in lockstep.
    pub fn multi_selection(&self) -> &BTreeSet<usize> {
        &self.multi_selection
    }

    pub fn add_to_selection(&mut self, key: NodeKey) {
        self.set_multi_selected(key, true);
    }

    pub fn toggle_selection(&mut self, key: NodeKey) {
        let on = self.nodes[key.0].is_multi_selected;
        self.set_multi_selected(key, !on);
    }

    pub fn clear_multi_selection(&mut self) {
        if self.multi_selection.is_empty() {
            return;
        }
        self.multi_selection.clear();
        for node in &mut self.nodes {
            node.is_multi_selected = false;
        }
        self.dirty = true;
    }

    fn set_multi_selected(&mut self, key: NodeKey, on: bool) {
        let node = &mut self.nodes[key.0];
        if node.is_multi_selected == on {
            return;
        }
        node.is_multi_selected = on;
        if on {
            self.multi_selection.insert(node.id);
        } else {
            self.multi_selection.remove(&node.id);
        }
        self.dirty = true;
    }

    /// Shift-click: mark every visible row between the pivot and `target`.
    ///
    /// A collapsed subtree counts as the single row the user can see, so
    /// descent stops at collapsed nodes, and a subtree whose id interval
    /// falls entirely outside `[min, max]` is skipped without visiting it.
    /// Without a pivot there is nothing to anchor the range to: no-op.
    pub fn select_range(&mut self, target: NodeKey) {
        let Some(pivot) = self.pivot else {
            return;
        };
        let pivot_id = self.nodes[pivot.0].id;
        let target_id = self.nodes[target.0].id;
        let (min_id, max_id) = if pivot_id <= target_id {
            (pivot_id, target_id)
        } else {
            (target_id, pivot_id)
        };

        let roots = self.roots.clone();
        for root in roots {
            self.select_within(root, min_id, max_id);
        }
    }

    fn select_within(&mut self, key: NodeKey, min_id: usize, max_id: usize) {
        let (id, highest, expanded) = {
            let node = &self.nodes[key.0];
            (node.id, node.highest_child_id, node.is_expanded)
        };

        if id >= min_id && id <= max_id {
            self.set_multi_selected(key, true);
        }
        if expanded && id < max_id && highest >= min_id {
            let children = self.nodes[key.0].children.clone();
            for child in children {
                self.select_within(child, min_id, max_id);
            }
        }
    }

    /// The visible row immediately above the cursor, clamped to the first
    /// visible node of the forest. `None` when there is no cursor yet.
    pub fn previous(&self) -> Option<NodeKey> {
        let current = self.current?;
        let current_id = self.nodes[current.0].id;
        let parent = self.nodes[current.0].parent;

        let siblings = match parent {
            Some(parent) => &self.nodes[parent.0].children,
            None => &self.roots,
        };
        let mut preceding: Option<NodeKey> = None;
        for &sibling in siblings {
            let id = self.nodes[sibling.0].id;
            if id < current_id
                && preceding.is_none_or(|best| id > self.nodes[best.0].id)
            {
                preceding = Some(sibling);
            }
        }

        match (preceding, parent) {
            // The preceding sibling's last visible descendant sits directly
            // above the cursor.
            (Some(sibling), _) => Some(self.last_visible_descendant(sibling)),
            (None, Some(parent)) => Some(parent),
            // First root: pinned.
            (None, None) => Some(current),
        }
    }

    /// The visible row immediately below the cursor, clamped to the last
    /// visible node of the forest. `None` when there is no cursor yet.
    pub fn next(&self) -> Option<NodeKey> {
        let current = self.current?;

        if self.nodes[current.0].is_expanded {
            if let Some(&first) = self.nodes[current.0].children.first() {
                return Some(first);
            }
        }

        let mut cursor = current;
        loop {
            let cursor_id = self.nodes[cursor.0].id;
            let parent = self.nodes[cursor.0].parent;
            let siblings = match parent {
                Some(parent) => &self.nodes[parent.0].children,
                None => &self.roots,
            };

            let mut following: Option<NodeKey> = None;
            for &sibling in siblings {
                let id = self.nodes[sibling.0].id;
                if id > cursor_id
                    && following.is_none_or(|best| id < self.nodes[best.0].id)
                {
                    following = Some(sibling);
                }
            }

            if let Some(sibling) = following {
                return Some(sibling);
            }
            match parent {
                Some(parent) => cursor = parent,
                // Last visible node: pinned.
                None => return Some(current),
            }
        }
    }

    fn last_visible_descendant(&self, key: NodeKey) -> NodeKey {
        let mut cursor = key;
        while self.nodes[cursor.0].is_expanded {
            match self.nodes[cursor.0].children.last() {
                Some(&last) => cursor = last,
                None => break,
            }
        }
        cursor
    }

    /// Every leaf of the forest in pre-order, expansion state ignored.
    pub fn leaf_nodes(&self) -> Vec<NodeKey> {
        let mut leaves = Vec::new();
        for &root in &self.roots {
            self.collect_leaves(root, &mut leaves);
        }
        leaves
    }

    /// Leaves under the current selection, top to bottom. Selecting a
    /// collapsed directory selects all of its leaf descendants for playback
    /// purposes even though none of them is visibly marked. A selected node
    /// inside an already-collected subtree is skipped by interval test, so
    /// no leaf appears twice.
    pub fn selected_leaves(&self) -> Vec<NodeKey> {
        let mut leaves = Vec::new();
        let mut covered_up_to: Option<usize> = None;
        for &id in &self.multi_selection {
            if covered_up_to.is_some_and(|highest| id <= highest) {
                continue;
            }
            let key = self.by_id[id];
            self.collect_leaves(key, &mut leaves);
            covered_up_to = Some(self.nodes[key.0].highest_child_id);
        }
        leaves
    }

    /// The selected rows themselves (not their descendants), in id order.
    pub fn selected_entities(&self) -> Vec<&LibraryEntity> {
        self.multi_selection
            .iter()
            .map(|&id| &self.nodes[self.by_id[id].0].entity)
            .collect()
    }

    /// Flat playback list for the selection, ready for the play queue.
    pub fn selected_playables(&self) -> Vec<&dyn Playable> {
        self.selected_leaves()
            .into_iter()
            .filter_map(|key| self.nodes[key.0].entity.playable())
            .collect()
    }

    fn collect_leaves(&self, key: NodeKey, out: &mut Vec<NodeKey>) {
        let node = &self.nodes[key.0];
        if node.children.is_empty() {
            out.push(key);
            return;
        }
        for &child in &node.children {
            self.collect_leaves(child, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Artist, Song};
    use proptest::prelude::*;

    fn artist(name: &str) -> LibraryEntity {
        LibraryEntity::Artist(Artist::new(name))
    }

    fn song(path: &str) -> LibraryEntity {
        LibraryEntity::Song(Song::new(path))
    }

    /// A { X { s0, s1 }, Y { s2 } }, B { Z { s3 } }, everything expanded.
    fn sample_forest() -> HierarchyController {
        let mut controller = HierarchyController::new();
        let a = controller.add_root(artist("A"));
        let x = controller.add_child(a, artist("X"));
        controller.add_child(x, song("x/0.mp3"));
        controller.add_child(x, song("x/1.mp3"));
        let y = controller.add_child(a, artist("Y"));
        controller.add_child(y, song("y/2.mp3"));
        let b = controller.add_root(artist("B"));
        let z = controller.add_child(b, artist("Z"));
        controller.add_child(z, song("z/3.mp3"));
        for index in 0..controller.len() {
            controller.set_expanded(NodeKey(index), true);
        }
        controller.reset_node_ids();
        controller
    }

    fn visible_in_order(controller: &HierarchyController) -> Vec<NodeKey> {
        fn walk(controller: &HierarchyController, key: NodeKey, out: &mut Vec<NodeKey>) {
            out.push(key);
            if controller.node(key).is_expanded {
                for &child in controller.children(key) {
                    walk(controller, child, out);
                }
            }
        }
        let mut out = Vec::new();
        for &root in controller.roots() {
            walk(controller, root, &mut out);
        }
        out
    }

    #[test]
    fn ids_are_dense_pre_order() {
        let controller = sample_forest();
        let a = controller.roots()[0];
        let b = controller.roots()[1];

        assert_eq!(controller.node(a).id, 0);
        assert_eq!(controller.node(a).highest_child_id, 5);
        assert_eq!(controller.node(b).id, 6);
        assert_eq!(controller.node(b).highest_child_id, 8);

        let x = controller.children(a)[0];
        assert_eq!(controller.node(x).id, 1);
        assert_eq!(controller.node(x).highest_child_id, 3);
    }

    #[test]
    fn childless_node_owns_a_single_id_interval() {
        let controller = sample_forest();
        let a = controller.roots()[0];
        let x = controller.children(a)[0];
        let leaf = controller.children(x)[0];
        assert_eq!(controller.node(leaf).id, controller.node(leaf).highest_child_id);
    }

    #[test]
    fn select_range_marks_visible_rows_between_pivot_and_target() {
        let mut controller = sample_forest();
        let a = controller.roots()[0];
        let x = controller.children(a)[0];
        let y = controller.children(a)[1];

        controller.set_pivot(Some(x));
        controller.select_range(y);

        // x(1) s(2) s(3) y(4)
        let selected: Vec<usize> = controller.multi_selection().iter().copied().collect();
        assert_eq!(selected, vec![1, 2, 3, 4]);
    }

    #[test]
    fn select_range_treats_collapsed_subtree_as_one_row() {
        let mut controller = sample_forest();
        let a = controller.roots()[0];
        let x = controller.children(a)[0];
        let y = controller.children(a)[1];
        controller.set_expanded(x, false);

        controller.set_pivot(Some(a));
        controller.select_range(y);

        // a(0) x(1) y(4): the two songs hidden under x stay unmarked.
        let selected: Vec<usize> = controller.multi_selection().iter().copied().collect();
        assert_eq!(selected, vec![0, 1, 4]);
    }

    #[test]
    fn select_range_without_pivot_is_a_no_op() {
        let mut controller = sample_forest();
        let a = controller.roots()[0];
        controller.select_range(a);
        assert!(controller.multi_selection().is_empty());
    }

    #[test]
    fn selection_set_and_flags_stay_in_lockstep() {
        let mut controller = sample_forest();
        let a = controller.roots()[0];

        controller.add_to_selection(a);
        assert!(controller.node(a).is_multi_selected());
        assert!(controller.multi_selection().contains(&0));

        controller.toggle_selection(a);
        assert!(!controller.node(a).is_multi_selected());
        assert!(controller.multi_selection().is_empty());
    }

    #[test]
    fn previous_descends_into_expanded_preceding_sibling() {
        let mut controller = sample_forest();
        let a = controller.roots()[0];
        let y = controller.children(a)[1];

        controller.set_current(Some(y));
        let previous = controller.previous().expect("previous");
        // The row above Y is X's last song, not X itself.
        assert_eq!(controller.node(previous).id, 3);
    }

    #[test]
    fn previous_over_collapsed_sibling_lands_on_the_sibling() {
        let mut controller = sample_forest();
        let a = controller.roots()[0];
        let x = controller.children(a)[0];
        let y = controller.children(a)[1];
        controller.set_expanded(x, false);

        controller.set_current(Some(y));
        assert_eq!(controller.previous(), Some(x));
    }

    #[test]
    fn next_crosses_from_subtree_end_to_next_root() {
        let mut controller = sample_forest();
        let a = controller.roots()[0];
        let b = controller.roots()[1];
        let y = controller.children(a)[1];
        let last_song = controller.children(y)[0];

        controller.set_current(Some(last_song));
        assert_eq!(controller.next(), Some(b));
    }

    #[test]
    fn traversal_is_pinned_at_forest_boundaries() {
        let mut controller = sample_forest();
        let first = controller.roots()[0];
        let seq = visible_in_order(&controller);
        let last = *seq.last().expect("non-empty");

        controller.set_current(Some(first));
        assert_eq!(controller.previous(), Some(first));

        controller.set_current(Some(last));
        assert_eq!(controller.next(), Some(last));
    }

    #[test]
    fn traversal_without_cursor_yields_none() {
        let controller = sample_forest();
        assert_eq!(controller.previous(), None);
        assert_eq!(controller.next(), None);
    }

    #[test]
    fn selected_collapsed_directory_contributes_hidden_leaves() {
        let mut controller = sample_forest();
        let a = controller.roots()[0];
        let x = controller.children(a)[0];
        controller.set_expanded(x, false);

        controller.add_to_selection(x);
        let leaves = controller.selected_leaves();
        let ids: Vec<usize> = leaves.iter().map(|&key| controller.node(key).id).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn selected_leaves_do_not_duplicate_nested_selections() {
        let mut controller = sample_forest();
        let a = controller.roots()[0];
        let x = controller.children(a)[0];
        let first_song = controller.children(x)[0];

        controller.add_to_selection(x);
        controller.add_to_selection(first_song);

        let ids: Vec<usize> = controller
            .selected_leaves()
            .iter()
            .map(|&key| controller.node(key).id)
            .collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn leaf_nodes_ignore_expansion() {
        let mut controller = sample_forest();
        let a = controller.roots()[0];
        controller.set_expanded(a, false);
        assert_eq!(controller.leaf_nodes().len(), 4);
    }

    #[test]
    fn clear_drops_everything() {
        let mut controller = sample_forest();
        let a = controller.roots()[0];
        controller.set_current(Some(a));
        controller.set_pivot(Some(a));
        controller.add_to_selection(a);

        controller.clear();
        assert!(controller.is_empty());
        assert_eq!(controller.current(), None);
        assert_eq!(controller.pivot(), None);
        assert!(controller.multi_selection().is_empty());
    }

    /// Build a random forest from a script of (parent choice, expanded)
    /// pairs, then renumber it.
    fn forest_from_script(script: &[(u8, bool)]) -> HierarchyController {
        let mut controller = HierarchyController::new();
        for (index, &(choice, expanded)) in script.iter().enumerate() {
            let key = if controller.is_empty() || choice % 4 == 0 {
                controller.add_root(song(&format!("{index}.mp3")))
            } else {
                let parent = NodeKey((choice as usize) % controller.len());
                controller.add_child(parent, song(&format!("{index}.mp3")))
            };
            controller.set_expanded(key, expanded);
        }
        controller.reset_node_ids();
        controller
    }

    fn subtree_ids(controller: &HierarchyController, key: NodeKey, out: &mut Vec<usize>) {
        out.push(controller.node(key).id);
        for &child in controller.children(key) {
            subtree_ids(controller, child, out);
        }
    }

    proptest::proptest! {
        #[test]
        fn id_intervals_cover_subtrees_exactly(
            script in prop::collection::vec((any::<u8>(), any::<bool>()), 1..60),
        ) {
            let controller = forest_from_script(&script);

            for index in 0..controller.len() {
                let key = NodeKey(index);
                let node = controller.node(key);
                let mut ids = Vec::new();
                subtree_ids(&controller, key, &mut ids);
                ids.sort_unstable();

                let expected: Vec<usize> = (node.id..=node.highest_child_id).collect();
                prop_assert_eq!(ids, expected);
            }
        }

        #[test]
        fn traversal_matches_the_visible_pre_order_sequence(
            script in prop::collection::vec((any::<u8>(), any::<bool>()), 1..60),
        ) {
            let mut controller = forest_from_script(&script);
            let seq = visible_in_order(&controller);

            for (position, &key) in seq.iter().enumerate() {
                controller.set_current(Some(key));
                let expected_prev = if position == 0 { key } else { seq[position - 1] };
                let expected_next = if position + 1 == seq.len() { key } else { seq[position + 1] };
                prop_assert_eq!(controller.previous(), Some(expected_prev));
                prop_assert_eq!(controller.next(), Some(expected_next));
            }
        }

        #[test]
        fn select_range_selects_exactly_the_visible_ids_in_range(
            script in prop::collection::vec((any::<u8>(), any::<bool>()), 1..60),
            picks in (any::<usize>(), any::<usize>()),
        ) {
            let mut controller = forest_from_script(&script);
            let seq = visible_in_order(&controller);
            let pivot = seq[picks.0 % seq.len()];
            let target = seq[picks.1 % seq.len()];

            controller.set_pivot(Some(pivot));
            controller.select_range(target);

            let min_id = controller.node(pivot).id.min(controller.node(target).id);
            let max_id = controller.node(pivot).id.max(controller.node(target).id);
            let expected: BTreeSet<usize> = seq
                .iter()
                .map(|&key| controller.node(key).id)
                .filter(|&id| id >= min_id && id <= max_id)
                .collect();
            prop_assert_eq!(controller.multi_selection(), &expected);
        }
    }
}
