//! Bulk creation against every selected leaf.
//!
//! The platform has no batch endpoints, so creating a note "in" five
//! batches means five POSTs with the same content and different ancestry
//! ids. This module builds those per-leaf payloads, runs them with bounded
//! concurrency, and tallies the outcome instead of failing fast: three
//! created and two failed is a normal result, not an error.

use crate::api::AdminApi;
use crate::catalog::{BatchLeaf, TopicLeaf};
use crate::utils::format_count;
use futures::{stream, StreamExt};
use serde::Serialize;
use serde_json::json;

const CONCURRENT_REQUESTS: usize = 4;

/// One record to create across a set of selected leaves.
#[derive(Debug, Clone)]
pub enum BulkPlan {
    /// A drive-linked note in every selected batch.
    Notes {
        title: String,
        drive_link: String,
        leaves: Vec<BatchLeaf>,
    },
    /// A topic in every selected batch.
    Topics {
        topic_name: String,
        leaves: Vec<BatchLeaf>,
    },
    /// A question under every selected topic.
    Questions {
        title: String,
        description: String,
        leaves: Vec<TopicLeaf>,
    },
}

/// One pending POST: a display label for error reporting plus the payload,
/// or the reason it could not even be built.
struct LeafRequest {
    label: String,
    payload: Result<serde_json::Value, String>,
}

impl BulkPlan {
    /// The admin API route segment this plan posts to.
    pub fn kind(&self) -> &'static str {
        match self {
            BulkPlan::Notes { .. } => "notes",
            BulkPlan::Topics { .. } => "topics",
            BulkPlan::Questions { .. } => "questions",
        }
    }

    pub fn noun(&self) -> (&'static str, &'static str) {
        match self {
            BulkPlan::Notes { .. } => ("note", "notes"),
            BulkPlan::Topics { .. } => ("topic", "topics"),
            BulkPlan::Questions { .. } => ("question", "questions"),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            BulkPlan::Notes { leaves, .. } => leaves.len(),
            BulkPlan::Topics { leaves, .. } => leaves.len(),
            BulkPlan::Questions { leaves, .. } => leaves.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn requests(&self) -> Vec<LeafRequest> {
        match self {
            BulkPlan::Notes {
                title,
                drive_link,
                leaves,
            } => leaves
                .iter()
                .map(|leaf| LeafRequest {
                    label: batch_label(leaf),
                    payload: note_payload(title, drive_link, leaf),
                })
                .collect(),
            BulkPlan::Topics { topic_name, leaves } => leaves
                .iter()
                .map(|leaf| LeafRequest {
                    label: batch_label(leaf),
                    payload: topic_payload(topic_name, leaf),
                })
                .collect(),
            BulkPlan::Questions {
                title,
                description,
                leaves,
            } => leaves
                .iter()
                .map(|leaf| LeafRequest {
                    label: topic_label(leaf),
                    payload: question_payload(title, description, leaf),
                })
                .collect(),
        }
    }
}

fn batch_label(leaf: &BatchLeaf) -> String {
    match &leaf.department_name {
        Some(dept) => format!("{} / {}", dept, leaf.batch_name),
        None => leaf.batch_name.clone(),
    }
}

fn topic_label(leaf: &TopicLeaf) -> String {
    match &leaf.batch_name {
        Some(batch) => format!("{} / {}", batch, leaf.topic_name),
        None => leaf.topic_name.clone(),
    }
}

/// The creation endpoints require the full ancestry, so a leaf whose chain
/// broke during resolution fails here, before any request goes out.
fn batch_ancestry_ids(leaf: &BatchLeaf) -> Result<(&str, &str), String> {
    let department_id = leaf
        .department_id
        .as_deref()
        .ok_or_else(|| format!("batch '{}' has no resolvable department", leaf.batch_name))?;
    let college_id = leaf
        .college_id
        .as_deref()
        .ok_or_else(|| format!("batch '{}' has no resolvable college", leaf.batch_name))?;
    Ok((college_id, department_id))
}

fn note_payload(title: &str, drive_link: &str, leaf: &BatchLeaf) -> Result<serde_json::Value, String> {
    let (college_id, department_id) = batch_ancestry_ids(leaf)?;
    Ok(json!({
        "title": title,
        "drive_link": drive_link,
        "college_id": college_id,
        "department_id": department_id,
        "batch_id": leaf.batch_id,
    }))
}

fn topic_payload(topic_name: &str, leaf: &BatchLeaf) -> Result<serde_json::Value, String> {
    let (college_id, department_id) = batch_ancestry_ids(leaf)?;
    Ok(json!({
        "topic_name": topic_name,
        "college_id": college_id,
        "department_id": department_id,
        "batch_id": leaf.batch_id,
    }))
}

fn question_payload(
    title: &str,
    description: &str,
    leaf: &TopicLeaf,
) -> Result<serde_json::Value, String> {
    let batch_id = leaf
        .batch_id
        .as_deref()
        .ok_or_else(|| format!("topic '{}' has no resolvable batch", leaf.topic_name))?;
    let department_id = leaf
        .department_id
        .as_deref()
        .ok_or_else(|| format!("topic '{}' has no resolvable department", leaf.topic_name))?;
    let college_id = leaf
        .college_id
        .as_deref()
        .ok_or_else(|| format!("topic '{}' has no resolvable college", leaf.topic_name))?;
    Ok(json!({
        "title": title,
        "description": description,
        "college_id": college_id,
        "department_id": department_id,
        "batch_id": batch_id,
        "topic_id": leaf.topic_id,
    }))
}

/// Tally of one bulk run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BulkOutcome {
    pub created: usize,
    pub failed: usize,
    /// One "label: reason" line per failure.
    pub errors: Vec<String>,
}

impl BulkOutcome {
    pub fn summary(&self, singular: &str, plural: &str) -> String {
        let created = format!("Created {}", format_count(self.created, singular, plural));
        if self.failed == 0 {
            created
        } else {
            format!("{}, {} failed", created, self.failed)
        }
    }
}

/// Run the plan: one POST per leaf, `CONCURRENT_REQUESTS` in flight at a
/// time. Leaves that cannot build a payload count as failures without
/// touching the network.
pub async fn run(api: &AdminApi, plan: &BulkPlan) -> BulkOutcome {
    let mut outcome = BulkOutcome::default();
    let mut pending = Vec::new();
    for request in plan.requests() {
        match request.payload {
            Ok(payload) => pending.push((request.label, payload)),
            Err(e) => {
                outcome.failed += 1;
                outcome.errors.push(format!("{}: {}", request.label, e));
            }
        }
    }

    let kind = plan.kind();
    let results: Vec<(String, Result<(), String>)> = stream::iter(pending)
        .map(|(label, payload)| async move {
            let result = api.create(kind, &payload).await;
            (label, result)
        })
        .buffer_unordered(CONCURRENT_REQUESTS)
        .collect()
        .await;

    for (label, result) in results {
        match result {
            Ok(()) => outcome.created += 1,
            Err(e) => {
                outcome.failed += 1;
                outcome.errors.push(format!("{}: {}", label, e));
            }
        }
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_batch() -> BatchLeaf {
        BatchLeaf {
            batch_id: "b1".to_string(),
            batch_name: "2024".to_string(),
            department_id: Some("d1".to_string()),
            department_name: Some("CS".to_string()),
            college_id: Some("c1".to_string()),
            college_name: Some("Tech U".to_string()),
        }
    }

    fn orphan_batch() -> BatchLeaf {
        BatchLeaf {
            batch_id: "b9".to_string(),
            batch_name: "2030".to_string(),
            department_id: None,
            department_name: None,
            college_id: None,
            college_name: None,
        }
    }

    fn full_topic() -> TopicLeaf {
        TopicLeaf {
            topic_id: "t1".to_string(),
            topic_name: "Arrays".to_string(),
            batch_id: Some("b1".to_string()),
            batch_name: Some("2024".to_string()),
            department_id: Some("d1".to_string()),
            department_name: Some("CS".to_string()),
            college_id: Some("c1".to_string()),
            college_name: Some("Tech U".to_string()),
        }
    }

    #[test]
    fn test_note_payload_fields() {
        let payload = note_payload("Week 1", "https://drive.example/x", &full_batch()).unwrap();
        assert_eq!(payload["title"], "Week 1");
        assert_eq!(payload["drive_link"], "https://drive.example/x");
        assert_eq!(payload["college_id"], "c1");
        assert_eq!(payload["department_id"], "d1");
        assert_eq!(payload["batch_id"], "b1");
    }

    #[test]
    fn test_topic_payload_fields() {
        let payload = topic_payload("Recursion", &full_batch()).unwrap();
        assert_eq!(payload["topic_name"], "Recursion");
        assert_eq!(payload["batch_id"], "b1");
    }

    #[test]
    fn test_question_payload_fields() {
        let payload = question_payload("Two Sum", "Classic warmup", &full_topic()).unwrap();
        assert_eq!(payload["title"], "Two Sum");
        assert_eq!(payload["description"], "Classic warmup");
        assert_eq!(payload["topic_id"], "t1");
        assert_eq!(payload["batch_id"], "b1");
        assert_eq!(payload["college_id"], "c1");
    }

    #[test]
    fn test_orphan_leaf_fails_before_posting() {
        let err = note_payload("Week 1", "https://drive.example/x", &orphan_batch()).unwrap_err();
        assert!(err.contains("2030"));
        assert!(err.contains("department"));
    }

    #[test]
    fn test_plan_requests_split_good_and_bad() {
        let plan = BulkPlan::Topics {
            topic_name: "Graphs".to_string(),
            leaves: vec![full_batch(), orphan_batch()],
        };
        assert_eq!(plan.kind(), "topics");
        assert_eq!(plan.len(), 2);
        let requests = plan.requests();
        assert!(requests[0].payload.is_ok());
        assert!(requests[1].payload.is_err());
        assert_eq!(requests[0].label, "CS / 2024");
        assert_eq!(requests[1].label, "2030");
    }

    #[test]
    fn test_outcome_summary() {
        let clean = BulkOutcome {
            created: 3,
            failed: 0,
            errors: vec![],
        };
        assert_eq!(clean.summary("topic", "topics"), "Created 3 topics");
        let mixed = BulkOutcome {
            created: 1,
            failed: 2,
            errors: vec!["a".into(), "b".into()],
        };
        assert_eq!(mixed.summary("note", "notes"), "Created 1 note, 2 failed");
    }
}
