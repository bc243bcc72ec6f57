//! In-memory catalog of hierarchy entities with ancestry resolution.
//!
//! The catalog holds whatever the admin API returned for each level, in API
//! order. Ancestry is resolved through foreign keys only, so a leaf whose
//! chain is broken (deleted parent, missing key) still resolves, just with
//! the unreachable ancestor fields left empty.

use crate::entity::{Entity, Level};
use serde::Serialize;

/// Entities for all four levels. Levels the caller never loaded stay empty.
#[derive(Debug, Default, Clone)]
pub struct Catalog {
    colleges: Vec<Entity>,
    departments: Vec<Entity>,
    batches: Vec<Entity>,
    topics: Vec<Entity>,
}

/// A selected batch with its ancestry resolved as far as the catalog allows.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchLeaf {
    pub batch_id: String,
    pub batch_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub college_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub college_name: Option<String>,
}

/// A selected topic with its ancestry resolved as far as the catalog allows.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicLeaf {
    pub topic_id: String,
    pub topic_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub college_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub college_name: Option<String>,
}

impl Catalog {
    pub fn new() -> Self {
        Catalog::default()
    }

    /// Replace one level's entities wholesale.
    pub fn set_level(&mut self, level: Level, entities: Vec<Entity>) {
        *self.level_mut(level) = entities;
    }

    pub fn level(&self, level: Level) -> &[Entity] {
        match level {
            Level::College => &self.colleges,
            Level::Department => &self.departments,
            Level::Batch => &self.batches,
            Level::Topic => &self.topics,
        }
    }

    fn level_mut(&mut self, level: Level) -> &mut Vec<Entity> {
        match level {
            Level::College => &mut self.colleges,
            Level::Department => &mut self.departments,
            Level::Batch => &mut self.batches,
            Level::Topic => &mut self.topics,
        }
    }

    pub fn is_empty(&self, level: Level) -> bool {
        self.level(level).is_empty()
    }

    pub fn get(&self, level: Level, id: &str) -> Option<&Entity> {
        self.level(level).iter().find(|e| e.id == id)
    }

    /// Entities at `level` whose parent key is `parent_id`, in catalog order.
    pub fn children_of<'a>(
        &'a self,
        level: Level,
        parent_id: &'a str,
    ) -> impl Iterator<Item = &'a Entity> {
        self.level(level)
            .iter()
            .filter(move |e| e.parent_id.as_deref() == Some(parent_id))
    }

    /// Resolve a batch id into a leaf record. Returns None when the batch
    /// itself is unknown; missing ancestors come back as None fields,
    /// and a missing department also leaves the college unset since the
    /// college is only reachable through it.
    pub fn batch_ancestry(&self, batch_id: &str) -> Option<BatchLeaf> {
        let batch = self.get(Level::Batch, batch_id)?;
        let department = batch
            .parent_id
            .as_deref()
            .and_then(|id| self.get(Level::Department, id));
        let college = department
            .and_then(|d| d.parent_id.as_deref())
            .and_then(|id| self.get(Level::College, id));
        Some(BatchLeaf {
            batch_id: batch.id.clone(),
            batch_name: batch.name.clone(),
            department_id: department.map(|d| d.id.clone()),
            department_name: department.map(|d| d.name.clone()),
            college_id: college.map(|c| c.id.clone()),
            college_name: college.map(|c| c.name.clone()),
        })
    }

    /// Resolve a topic id into a leaf record, walking topic to batch to
    /// department to college. Same missing-ancestor behavior as
    /// `batch_ancestry`.
    pub fn topic_ancestry(&self, topic_id: &str) -> Option<TopicLeaf> {
        let topic = self.get(Level::Topic, topic_id)?;
        let batch = topic
            .parent_id
            .as_deref()
            .and_then(|id| self.get(Level::Batch, id));
        let department = batch
            .and_then(|b| b.parent_id.as_deref())
            .and_then(|id| self.get(Level::Department, id));
        let college = department
            .and_then(|d| d.parent_id.as_deref())
            .and_then(|id| self.get(Level::College, id));
        Some(TopicLeaf {
            topic_id: topic.id.clone(),
            topic_name: topic.name.clone(),
            batch_id: batch.map(|b| b.id.clone()),
            batch_name: batch.map(|b| b.name.clone()),
            department_id: department.map(|d| d.id.clone()),
            department_name: department.map(|d| d.name.clone()),
            college_id: college.map(|c| c.id.clone()),
            college_name: college.map(|c| c.name.clone()),
        })
    }
}
