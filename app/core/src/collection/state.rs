//! Pure state core of the collection engine.
//!
//! Owns the ordered item list and the position-keyed selection set. All
//! mutations here are synchronous and infallible with respect to I/O; the
//! actor layers persistence and rollback on top. There is never more than
//! one copy of the list: rollback replaces the state wholesale from a
//! snapshot instead of patching in place.

use smallvec::SmallVec;

use super::{CollectionError, CollectionItem};

/// Positions are almost always a handful, so keep them inline.
type PositionList = SmallVec<[usize; 8]>;

// ============================================================================
// Selection
// ============================================================================

/// The three UI affordance states, driven purely by selection count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    /// Nothing selected.
    None,
    /// Exactly one item selected; single-target actions are available.
    Single,
    /// More than one item selected.
    Multi,
}

impl SelectionMode {
    /// Maps a selection count to the UI state it drives.
    #[must_use]
    pub const fn from_count(count: usize) -> Self {
        match count {
            0 => Self::None,
            1 => Self::Single,
            _ => Self::Multi,
        }
    }
}

/// Position-keyed selection, insertion order preserved.
///
/// The first entry is the "primary" item for single-target actions.
/// Positions are always valid indices into the current list ordering; the
/// owning [`CollectionState`] remaps or purges entries atomically with
/// every list mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    positions: PositionList,
}

impl SelectionSet {
    /// Number of selected positions.
    #[must_use]
    pub fn len(&self) -> usize { self.positions.len() }

    /// Whether nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.positions.is_empty() }

    /// Selected positions in insertion (selection) order.
    #[must_use]
    pub fn positions(&self) -> &[usize] { &self.positions }

    /// Whether `position` is currently selected.
    #[must_use]
    pub fn contains(&self, position: usize) -> bool { self.positions.contains(&position) }

    /// Toggles membership of `position`, returning the new count.
    fn toggle(&mut self, position: usize) -> usize {
        if let Some(index) = self.positions.iter().position(|&p| p == position) {
            self.positions.remove(index);
        } else {
            self.positions.push(position);
        }
        self.positions.len()
    }

    /// Remaps positions after an item moved from `from` to `to`.
    ///
    /// Reordering is a chain of adjacent swaps, so every entry strictly
    /// between the two endpoints shifts by exactly one; the moved entry
    /// lands on `to`.
    fn remap_after_reorder(&mut self, from: usize, to: usize) {
        for position in &mut self.positions {
            if *position == from {
                *position = to;
            } else if from < to && (*position > from && *position <= to) {
                *position -= 1;
            } else if from > to && (*position >= to && *position < from) {
                *position += 1;
            }
        }
    }

    fn clear(&mut self) { self.positions.clear(); }
}

// ============================================================================
// Collection State
// ============================================================================

/// Wholesale snapshot used for rollback on persistence failure.
#[derive(Debug, Clone)]
pub(crate) struct StateSnapshot {
    items: Vec<CollectionItem>,
    selection: SelectionSet,
}

/// The ordered item list plus its selection set.
#[derive(Debug, Default)]
pub(crate) struct CollectionState {
    items: Vec<CollectionItem>,
    selection: SelectionSet,
}

impl CollectionState {
    pub fn new(items: Vec<CollectionItem>) -> Self {
        Self { items, selection: SelectionSet::default() }
    }

    pub fn items(&self) -> &[CollectionItem] { &self.items }

    pub fn is_empty(&self) -> bool { self.items.is_empty() }

    pub fn selection(&self) -> &SelectionSet { &self.selection }

    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            items: self.items.clone(),
            selection: self.selection.clone(),
        }
    }

    pub fn restore(&mut self, snapshot: StateSnapshot) {
        self.items = snapshot.items;
        self.selection = snapshot.selection;
    }

    /// Moves the item at `from` to `to` by pairwise adjacent swaps in the
    /// direction of travel, remapping the selection in the same step.
    pub fn reorder(&mut self, from: usize, to: usize) -> Result<(), CollectionError> {
        let len = self.items.len();
        if from >= len {
            return Err(CollectionError::InvalidPosition(from));
        }
        if to >= len {
            return Err(CollectionError::InvalidPosition(to));
        }
        if from < to {
            for i in from..to {
                self.items.swap(i, i + 1);
            }
        } else {
            for i in (to + 1..=from).rev() {
                self.items.swap(i, i - 1);
            }
        }
        self.selection.remap_after_reorder(from, to);
        Ok(())
    }

    /// Toggles selection of `position`, returning the new count.
    pub fn toggle_select(&mut self, position: usize) -> Result<usize, CollectionError> {
        if position >= self.items.len() {
            return Err(CollectionError::InvalidPosition(position));
        }
        Ok(self.selection.toggle(position))
    }

    /// Removes the selected items in descending position order (so earlier
    /// removals never shift a position that is still to be removed) and
    /// clears the selection. Returns the removed items.
    pub fn delete_selected(&mut self) -> Vec<CollectionItem> {
        let mut positions: PositionList = self.selection.positions.clone();
        positions.sort_unstable_by(|a, b| b.cmp(a));
        let mut removed = Vec::with_capacity(positions.len());
        for position in positions {
            removed.push(self.items.remove(position));
        }
        self.selection.clear();
        removed
    }

    /// Appends `items`, rejecting the whole batch if any entry duplicates
    /// an existing item's provenance (same source path and operation).
    pub fn insert(&mut self, items: Vec<CollectionItem>) -> Result<usize, CollectionError> {
        for (index, candidate) in items.iter().enumerate() {
            let clashes = |existing: &CollectionItem| {
                existing.source_path == candidate.source_path
                    && existing.operation == candidate.operation
            };
            if self.items.iter().any(clashes) || items[..index].iter().any(clashes) {
                return Err(CollectionError::AlreadyInCollection);
            }
        }
        let added = items.len();
        self.items.extend(items);
        Ok(added)
    }

    /// The first item in selection order, for single-target actions.
    pub fn primary_selection(&self) -> Option<&CollectionItem> {
        self.selection.positions.first().map(|&position| &self.items[position])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::OperationKind;

    fn item(path: &str) -> CollectionItem {
        CollectionItem::new(path, OperationKind::Downloaded)
    }

    fn state(paths: &[&str]) -> CollectionState {
        CollectionState::new(paths.iter().map(|p| item(p)).collect())
    }

    fn paths(state: &CollectionState) -> Vec<&str> {
        state.items().iter().map(|i| i.source_path.as_str()).collect()
    }

    // ========================================================================
    // Reorder
    // ========================================================================

    #[test]
    fn test_reorder_forward_is_adjacent_swaps() {
        let mut s = state(&["a", "b", "c"]);
        s.reorder(0, 2).unwrap();
        assert_eq!(paths(&s), ["b", "c", "a"]);
    }

    #[test]
    fn test_reorder_backward_is_adjacent_swaps() {
        let mut s = state(&["a", "b", "c"]);
        s.reorder(2, 0).unwrap();
        assert_eq!(paths(&s), ["c", "a", "b"]);
    }

    #[test]
    fn test_reorder_to_same_position_is_noop() {
        let mut s = state(&["a", "b", "c"]);
        s.reorder(1, 1).unwrap();
        assert_eq!(paths(&s), ["a", "b", "c"]);
    }

    #[test]
    fn test_reorder_out_of_range_is_rejected() {
        let mut s = state(&["a", "b"]);
        assert_eq!(s.reorder(2, 0), Err(CollectionError::InvalidPosition(2)));
        assert_eq!(s.reorder(0, 5), Err(CollectionError::InvalidPosition(5)));
        assert_eq!(paths(&s), ["a", "b"]);
    }

    #[test]
    fn test_reorder_remaps_selection() {
        let mut s = state(&["a", "b", "c", "d"]);
        s.toggle_select(0).unwrap();
        s.toggle_select(2).unwrap();

        // "a" travels to the end; "c" shifts left by one.
        s.reorder(0, 3).unwrap();
        assert_eq!(paths(&s), ["b", "c", "d", "a"]);
        assert_eq!(s.selection().positions(), &[3, 1]);
        assert_eq!(s.primary_selection().unwrap().source_path, "a");
    }

    #[test]
    fn test_reorder_backward_remaps_selection() {
        let mut s = state(&["a", "b", "c", "d"]);
        s.toggle_select(1).unwrap();
        s.toggle_select(3).unwrap();

        s.reorder(3, 0).unwrap();
        assert_eq!(paths(&s), ["d", "a", "b", "c"]);
        // "b" shifted right by one, "d" landed at the front.
        assert_eq!(s.selection().positions(), &[2, 0]);
    }

    // ========================================================================
    // Selection
    // ========================================================================

    #[test]
    fn test_selection_mode_transitions() {
        let mut s = state(&["a", "b", "c"]);

        let counts = [
            s.toggle_select(0).unwrap(),
            s.toggle_select(1).unwrap(),
            s.toggle_select(1).unwrap(),
            s.toggle_select(0).unwrap(),
        ];
        assert_eq!(counts, [1, 2, 1, 0]);

        let modes: Vec<SelectionMode> =
            [0, 1, 2, 1, 0].iter().map(|&c| SelectionMode::from_count(c)).collect();
        assert_eq!(
            modes,
            [
                SelectionMode::None,
                SelectionMode::Single,
                SelectionMode::Multi,
                SelectionMode::Single,
                SelectionMode::None,
            ]
        );
    }

    #[test]
    fn test_selection_order_is_insertion_order() {
        let mut s = state(&["a", "b", "c"]);
        s.toggle_select(2).unwrap();
        s.toggle_select(0).unwrap();
        assert_eq!(s.selection().positions(), &[2, 0]);
        assert_eq!(s.primary_selection().unwrap().source_path, "c");
    }

    #[test]
    fn test_toggle_out_of_range_is_rejected() {
        let mut s = state(&["a"]);
        assert_eq!(s.toggle_select(1), Err(CollectionError::InvalidPosition(1)));
    }

    // ========================================================================
    // Delete
    // ========================================================================

    #[test]
    fn test_delete_removes_in_descending_order() {
        let mut s = state(&["a", "b", "c", "d"]);
        s.toggle_select(0).unwrap();
        s.toggle_select(2).unwrap();

        let removed = s.delete_selected();
        let removed_paths: Vec<&str> =
            removed.iter().map(|i| i.source_path.as_str()).collect();

        // Descending removal: "c" first, then "a"; neither shifted the other.
        assert_eq!(removed_paths, ["c", "a"]);
        assert_eq!(paths(&s), ["b", "d"]);
        assert!(s.selection().is_empty());
    }

    #[test]
    fn test_delete_everything_empties_collection() {
        let mut s = state(&["a", "b"]);
        s.toggle_select(0).unwrap();
        s.toggle_select(1).unwrap();
        let removed = s.delete_selected();
        assert_eq!(removed.len(), 2);
        assert!(s.is_empty());
    }

    #[test]
    fn test_delete_with_empty_selection_removes_nothing() {
        let mut s = state(&["a"]);
        assert!(s.delete_selected().is_empty());
        assert_eq!(paths(&s), ["a"]);
    }

    // ========================================================================
    // Insert
    // ========================================================================

    #[test]
    fn test_insert_appends() {
        let mut s = state(&["a"]);
        let added = s.insert(vec![item("b"), item("c")]).unwrap();
        assert_eq!(added, 2);
        assert_eq!(paths(&s), ["a", "b", "c"]);
    }

    #[test]
    fn test_insert_duplicate_provenance_is_rejected() {
        let mut s = state(&["a"]);
        let err = s.insert(vec![item("a")]).unwrap_err();
        assert_eq!(err, CollectionError::AlreadyInCollection);
        assert_eq!(paths(&s), ["a"]);
    }

    #[test]
    fn test_insert_duplicate_within_batch_is_rejected() {
        let mut s = state(&[]);
        let err = s.insert(vec![item("x"), item("x")]).unwrap_err();
        assert_eq!(err, CollectionError::AlreadyInCollection);
        assert!(s.is_empty());
    }

    #[test]
    fn test_same_path_different_operation_coexists() {
        let mut s = state(&["a"]);
        s.insert(vec![CollectionItem::new("a", OperationKind::Crystallized)])
            .unwrap();
        assert_eq!(s.items().len(), 2);
    }

    // ========================================================================
    // Snapshot / restore
    // ========================================================================

    #[test]
    fn test_restore_recovers_items_and_selection() {
        let mut s = state(&["a", "b", "c"]);
        s.toggle_select(1).unwrap();
        let snapshot = s.snapshot();

        s.reorder(0, 2).unwrap();
        s.toggle_select(0).unwrap();
        assert_ne!(paths(&s), ["a", "b", "c"]);

        s.restore(snapshot);
        assert_eq!(paths(&s), ["a", "b", "c"]);
        assert_eq!(s.selection().positions(), &[1]);
    }
}
