//! Selected-node bookkeeping.
//!
//! Selection travels over the broadcast channel as a single node id (or a
//! cleared value). [`SelectionManager`] folds that stream into a set: in
//! single-select mode each broadcast replaces the set, in multi-select mode
//! ids accumulate until the channel is cleared. Individual deselection is
//! not reachable in multi-select mode; that matches the observed behavior
//! this engine preserves.

use crate::hierarchy::NodeId;
use slint::{Model, VecModel};
use std::collections::HashSet;

#[derive(Default)]
pub struct SelectionManager {
    selected: HashSet<NodeId>,
}

impl SelectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one broadcast value into the set.
    ///
    /// A cleared broadcast empties the selection. Otherwise the id replaces
    /// the set (single-select) or joins it (multi-select).
    pub fn apply(&mut self, broadcast: Option<NodeId>, multiple: bool) {
        match broadcast {
            None => self.selected.clear(),
            Some(id) => {
                if !multiple {
                    self.selected.clear();
                }
                self.selected.insert(id);
            }
        }
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.selected.contains(&id)
    }

    pub fn iter(&self) -> std::collections::hash_set::Iter<'_, NodeId> {
        self.selected.iter()
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Sync the selection set to a Slint `VecModel` for UI binding.
    pub fn sync_to_model(&self, model: &VecModel<NodeId>) {
        while model.row_count() > 0 {
            model.remove(0);
        }
        for &id in &self.selected {
            model.push(id);
        }
    }
}
