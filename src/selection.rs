//! Pure selection state for the four-level hierarchy.
//!
//! One insertion-ordered id set per level, with a single structural rule:
//! a child id is only ever selected while its parent id is selected.
//! Deselecting an entity removes every selected descendant in the same
//! step, so the rule holds after every operation, not just eventually.
//!
//! Everything here is synchronous and side-effect free. Callers hand in the
//! `Catalog` on each call instead of the state owning one, which keeps the
//! state testable with hand-built catalogs and reusable across reloads.

use crate::catalog::Catalog;
use crate::entity::{Entity, Level};
use indexmap::IndexSet;
use serde::Serialize;

/// Derived state of a level's "select all" control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectAll {
    /// No visible entity is selected, or nothing is visible at all.
    Unchecked,
    /// Some but not all visible entities are selected.
    Indeterminate,
    /// Every visible entity is selected.
    Checked,
}

/// Selected ids per level, in the order the user picked them.
#[derive(Debug, Clone, Default)]
pub struct SelectionState {
    colleges: IndexSet<String>,
    departments: IndexSet<String>,
    batches: IndexSet<String>,
    topics: IndexSet<String>,
}

/// Plain-data copy of the selection, one id list per level in selection
/// order. This is what change callbacks receive and what the CLI prints.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectionSnapshot {
    pub colleges: Vec<String>,
    pub departments: Vec<String>,
    pub batches: Vec<String>,
    pub topics: Vec<String>,
}

impl SelectionSnapshot {
    pub fn level(&self, level: Level) -> &[String] {
        match level {
            Level::College => &self.colleges,
            Level::Department => &self.departments,
            Level::Batch => &self.batches,
            Level::Topic => &self.topics,
        }
    }

    pub fn total(&self) -> usize {
        self.colleges.len() + self.departments.len() + self.batches.len() + self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

impl SelectionState {
    pub fn new() -> Self {
        SelectionState::default()
    }

    fn set(&self, level: Level) -> &IndexSet<String> {
        match level {
            Level::College => &self.colleges,
            Level::Department => &self.departments,
            Level::Batch => &self.batches,
            Level::Topic => &self.topics,
        }
    }

    fn set_mut(&mut self, level: Level) -> &mut IndexSet<String> {
        match level {
            Level::College => &mut self.colleges,
            Level::Department => &mut self.departments,
            Level::Batch => &mut self.batches,
            Level::Topic => &mut self.topics,
        }
    }

    pub fn is_selected(&self, level: Level, id: &str) -> bool {
        self.set(level).contains(id)
    }

    /// Selected ids at one level, insertion-ordered.
    pub fn selected(&self, level: Level) -> &IndexSet<String> {
        self.set(level)
    }

    pub fn count(&self, level: Level) -> usize {
        self.set(level).len()
    }

    /// Entities eligible for selection at `level`: the whole catalog for
    /// colleges, otherwise the children of currently selected parents,
    /// parents in selection order.
    pub fn visible<'a>(&'a self, catalog: &'a Catalog, level: Level) -> Vec<&'a Entity> {
        match level.parent() {
            None => catalog.level(level).iter().collect(),
            Some(parent_level) => self
                .set(parent_level)
                .iter()
                .flat_map(|parent_id| catalog.children_of(level, parent_id))
                .collect(),
        }
    }

    fn is_visible(&self, catalog: &Catalog, level: Level, id: &str) -> bool {
        let Some(entity) = catalog.get(level, id) else {
            return false;
        };
        match level.parent() {
            None => true,
            Some(parent_level) => entity
                .parent_id
                .as_deref()
                .is_some_and(|pid| self.is_selected(parent_level, pid)),
        }
    }

    /// Select or deselect one entity. Selecting an entity that is not
    /// currently visible (unknown id, or parent not selected) is a no-op;
    /// deselecting always removes the id and every selected descendant.
    pub fn toggle(&mut self, catalog: &Catalog, level: Level, id: &str, checked: bool) {
        if checked {
            if self.is_visible(catalog, level, id) {
                self.set_mut(level).insert(id.to_string());
            }
        } else {
            self.set_mut(level).shift_remove(id);
            self.remove_descendants(catalog, level, id);
        }
    }

    /// Apply `checked` to every visible entity at `level`. Deselecting
    /// cascades below each removed entity, so turning a level off empties
    /// that level and everything under it.
    pub fn toggle_all(&mut self, catalog: &Catalog, level: Level, checked: bool) {
        let ids: Vec<String> = self
            .visible(catalog, level)
            .iter()
            .map(|e| e.id.clone())
            .collect();
        for id in ids {
            if checked {
                self.set_mut(level).insert(id);
            } else {
                self.set_mut(level).shift_remove(&id);
                self.remove_descendants(catalog, level, &id);
            }
        }
    }

    /// Drop every selected id reachable below `id` through catalog parent
    /// keys. Walks catalog children rather than the selected sets so the
    /// traversal order matches the hierarchy.
    fn remove_descendants(&mut self, catalog: &Catalog, level: Level, id: &str) {
        let Some(child_level) = level.child() else {
            return;
        };
        let child_ids: Vec<String> = catalog
            .children_of(child_level, id)
            .map(|e| e.id.clone())
            .collect();
        for child_id in child_ids {
            self.set_mut(child_level).shift_remove(&child_id);
            self.remove_descendants(catalog, child_level, &child_id);
        }
    }

    /// Derive the select-all state for a level from the current selection
    /// and the visible candidates. Nothing visible always reads as
    /// `Unchecked`, never as vacuously `Checked`.
    pub fn select_all_state(&self, catalog: &Catalog, level: Level) -> SelectAll {
        let visible = self.visible(catalog, level);
        if visible.is_empty() {
            return SelectAll::Unchecked;
        }
        let selected = visible
            .iter()
            .filter(|e| self.is_selected(level, &e.id))
            .count();
        if selected == 0 {
            SelectAll::Unchecked
        } else if selected == visible.len() {
            SelectAll::Checked
        } else {
            SelectAll::Indeterminate
        }
    }

    pub fn snapshot(&self) -> SelectionSnapshot {
        SelectionSnapshot {
            colleges: self.colleges.iter().cloned().collect(),
            departments: self.departments.iter().cloned().collect(),
            batches: self.batches.iter().cloned().collect(),
            topics: self.topics.iter().cloned().collect(),
        }
    }

    pub fn clear(&mut self) {
        self.colleges.clear();
        self.departments.clear();
        self.batches.clear();
        self.topics.clear();
    }
}
