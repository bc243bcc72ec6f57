//! Admin-side selection library for a coding-practice platform.
//!
//! The platform organizes everything under college > department > batch >
//! topic. This crate models that hierarchy, drives the cascading
//! multi-select used to target content at slices of it, and posts the
//! resulting per-leaf creations back to the admin API.
//!
//! - `entity` / `catalog`: the hierarchy data and ancestry resolution
//! - `selection`: pure selection state (cascade rule, tri-state select-all)
//! - `selector`: instantiable selector tying catalog, selection and mode
//! - `render`: text views derived from catalog plus selection
//! - `api` / `bulk`: admin API client and per-leaf bulk creation
//! - `settings`: config file plus env overrides

pub mod api;
pub mod bulk;
pub mod catalog;
pub mod entity;
pub mod render;
pub mod selection;
pub mod selector;
pub mod settings;
pub mod utils;

pub use api::AdminApi;
pub use catalog::{BatchLeaf, Catalog, TopicLeaf};
pub use entity::{Entity, Level};
pub use selection::{SelectAll, SelectionSnapshot, SelectionState};
pub use selector::{HierarchySelector, LeafSelection, SelectorConfig};
