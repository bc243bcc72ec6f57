//! Cascading hierarchy selector.
//!
//! `HierarchySelector` owns one catalog and one selection, so independent
//! selectors (one per dialog, one per task) never share state. It adds the
//! pieces the pure state layer deliberately leaves out: loading the catalog
//! from the admin API, the topics-on-or-off mode, resolving the final
//! selection into leaf records, and a change callback for hosts that want
//! to react to every toggle.

use crate::api::AdminApi;
use crate::catalog::{BatchLeaf, Catalog, TopicLeaf};
use crate::entity::Level;
use crate::selection::{SelectAll, SelectionSnapshot, SelectionState};
use serde::Serialize;

/// Called after every toggle with a fresh snapshot.
pub type SelectionCallback = Box<dyn FnMut(&SelectionSnapshot)>;

#[derive(Debug, Clone, Copy, Default)]
pub struct SelectorConfig {
    /// Extend the cascade past batches down to topics.
    pub include_topics: bool,
}

/// The resolved leaf records for whichever level is deepest in this
/// selector's mode. Serializes as a plain array either way.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LeafSelection {
    Batches(Vec<BatchLeaf>),
    Topics(Vec<TopicLeaf>),
}

impl LeafSelection {
    pub fn len(&self) -> usize {
        match self {
            LeafSelection::Batches(v) => v.len(),
            LeafSelection::Topics(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub struct HierarchySelector {
    config: SelectorConfig,
    catalog: Catalog,
    selection: SelectionState,
    on_change: Option<SelectionCallback>,
}

impl HierarchySelector {
    /// An empty selector; call `load` to fill it from the API.
    pub fn new(config: SelectorConfig) -> Self {
        HierarchySelector {
            config,
            catalog: Catalog::new(),
            selection: SelectionState::new(),
            on_change: None,
        }
    }

    /// A selector over an already-built catalog.
    pub fn with_catalog(config: SelectorConfig, catalog: Catalog) -> Self {
        HierarchySelector {
            config,
            catalog,
            selection: SelectionState::new(),
            on_change: None,
        }
    }

    /// Fetch all levels and start over with an empty selection. A level
    /// that fails to load simply comes back empty (the client logs it),
    /// so a dead backend yields a working selector with nothing in it.
    pub async fn load(&mut self, api: &AdminApi) {
        self.catalog = api.load_catalog(self.config.include_topics).await;
        self.selection.clear();
    }

    pub fn config(&self) -> SelectorConfig {
        self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    /// The levels this selector drives, root first.
    pub fn levels(&self) -> &'static [Level] {
        if self.config.include_topics {
            &Level::ALL
        } else {
            &Level::ALL[..3]
        }
    }

    /// The level whose entities count as leaves in this mode.
    pub fn leaf_level(&self) -> Level {
        if self.config.include_topics {
            Level::Topic
        } else {
            Level::Batch
        }
    }

    pub fn toggle(&mut self, level: Level, id: &str, checked: bool) {
        self.selection.toggle(&self.catalog, level, id, checked);
        self.fire_change();
    }

    pub fn toggle_all(&mut self, level: Level, checked: bool) {
        self.selection.toggle_all(&self.catalog, level, checked);
        self.fire_change();
    }

    pub fn select_all_state(&self, level: Level) -> SelectAll {
        self.selection.select_all_state(&self.catalog, level)
    }

    /// Clear the selection, e.g. when the host dialog reopens. Does not
    /// fire the change callback; hosts resetting already know.
    pub fn reset(&mut self) {
        self.selection.clear();
    }

    pub fn snapshot(&self) -> SelectionSnapshot {
        self.selection.snapshot()
    }

    pub fn set_on_change(&mut self, callback: SelectionCallback) {
        self.on_change = Some(callback);
    }

    fn fire_change(&mut self) {
        if let Some(callback) = &mut self.on_change {
            callback(&self.selection.snapshot());
        }
    }

    /// Selected batches resolved to full records, in selection order.
    /// Ids that no longer resolve against the catalog are skipped.
    pub fn selected_batch_leaves(&self) -> Vec<BatchLeaf> {
        self.selection
            .selected(Level::Batch)
            .iter()
            .filter_map(|id| self.catalog.batch_ancestry(id))
            .collect()
    }

    /// Selected topics resolved to full records, in selection order.
    pub fn selected_topic_leaves(&self) -> Vec<TopicLeaf> {
        self.selection
            .selected(Level::Topic)
            .iter()
            .filter_map(|id| self.catalog.topic_ancestry(id))
            .collect()
    }

    /// The leaf records for this selector's deepest level.
    pub fn selected_leaves(&self) -> LeafSelection {
        if self.config.include_topics {
            LeafSelection::Topics(self.selected_topic_leaves())
        } else {
            LeafSelection::Batches(self.selected_batch_leaves())
        }
    }
}
