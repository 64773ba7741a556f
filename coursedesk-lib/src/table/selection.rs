//! Row selection that survives pagination.
//!
//! Selection is keyed by row id, so ids from pages that are not currently
//! loaded stay selected until explicitly removed.

use std::collections::HashSet;

use crate::model::RowId;

/// Tri-state of a header checkbox over the current page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckState {
    Unchecked,
    Indeterminate,
    Checked,
}

/// A set of selected row ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    selected: HashSet<RowId>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all selected ids (sorted for deterministic ordering).
    pub fn ids(&self) -> Vec<RowId> {
        let mut ids: Vec<_> = self.selected.iter().cloned().collect();
        ids.sort();
        ids
    }

    pub fn contains(&self, id: &RowId) -> bool {
        self.selected.contains(id)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Flips membership of one id. Returns `true` if it is now selected.
    pub fn toggle(&mut self, id: &RowId) -> bool {
        if self.selected.remove(id) {
            false
        } else {
            self.selected.insert(id.clone());
            true
        }
    }

    /// Select-all over the current page: deselects `page_ids` if all of them
    /// are selected, selects them otherwise. Ids of other pages are kept.
    pub fn toggle_page(&mut self, page_ids: &[RowId]) {
        if self.page_state(page_ids) == CheckState::Checked {
            for id in page_ids {
                self.selected.remove(id);
            }
        } else {
            self.selected.extend(page_ids.iter().cloned());
        }
    }

    /// Header checkbox state for the current page.
    pub fn page_state(&self, page_ids: &[RowId]) -> CheckState {
        let selected = page_ids.iter().filter(|id| self.contains(id)).count();
        match selected {
            0 => CheckState::Unchecked,
            n if n == page_ids.len() => CheckState::Checked,
            _ => CheckState::Indeterminate,
        }
    }

    /// Drops ids, e.g. after they were deleted server-side.
    /// Returns how many were removed.
    pub fn remove_all<'a>(&mut self, ids: impl IntoIterator<Item = &'a RowId>) -> usize {
        ids.into_iter().filter(|id| self.selected.remove(id)).count()
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }
}

impl FromIterator<RowId> for SelectionSet {
    fn from_iter<I: IntoIterator<Item = RowId>>(iter: I) -> Self {
        Self {
            selected: iter.into_iter().collect(),
        }
    }
}
