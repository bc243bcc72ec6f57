//! Entity model for the four-level teaching hierarchy.
//!
//! Colleges contain departments, departments contain batches, batches contain
//! topics. Every entity arrives from the platform's admin API, which is loose
//! about shape: list responses come either flat (`{"colleges": [...]}`) or
//! wrapped in a data envelope (`{"data": {"colleges": [...]}}`), and name
//! fields appear as either `name` or the level-prefixed form
//! (`college_name`, `department_name`, ...). Parsing accepts all of it.

use serde::{Deserialize, Serialize};

// ==================== Levels ====================

/// One level of the hierarchy, ordered root to leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    College,
    Department,
    Batch,
    Topic,
}

impl Level {
    /// All levels, root first.
    pub const ALL: [Level; 4] = [
        Level::College,
        Level::Department,
        Level::Batch,
        Level::Topic,
    ];

    /// The level above, if any.
    pub fn parent(self) -> Option<Level> {
        match self {
            Level::College => None,
            Level::Department => Some(Level::College),
            Level::Batch => Some(Level::Department),
            Level::Topic => Some(Level::Batch),
        }
    }

    /// The level below, if any.
    pub fn child(self) -> Option<Level> {
        match self {
            Level::College => Some(Level::Department),
            Level::Department => Some(Level::Batch),
            Level::Batch => Some(Level::Topic),
            Level::Topic => None,
        }
    }

    /// Singular display name ("College").
    pub fn label(self) -> &'static str {
        match self {
            Level::College => "College",
            Level::Department => "Department",
            Level::Batch => "Batch",
            Level::Topic => "Topic",
        }
    }

    /// Lowercase plural, doubling as the admin API route segment
    /// (`/admin/colleges` etc).
    pub fn plural(self) -> &'static str {
        match self {
            Level::College => "colleges",
            Level::Department => "departments",
            Level::Batch => "batches",
            Level::Topic => "topics",
        }
    }

    /// Capitalized plural for headings ("Select All Batches").
    pub fn title_plural(self) -> &'static str {
        match self {
            Level::College => "Colleges",
            Level::Department => "Departments",
            Level::Batch => "Batches",
            Level::Topic => "Topics",
        }
    }

    /// Parse a plural level name as used on the CLI ("departments").
    pub fn from_plural(s: &str) -> Option<Level> {
        Level::ALL.into_iter().find(|l| l.plural() == s)
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ==================== Entities ====================

/// One catalog row at any level. `parent_id` is the foreign key to the level
/// above (None for colleges, and for rows the API served without one).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entity {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

impl Entity {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Entity {
            id: id.into(),
            name: name.into(),
            parent_id: None,
        }
    }

    pub fn with_parent(
        id: impl Into<String>,
        name: impl Into<String>,
        parent_id: impl Into<String>,
    ) -> Self {
        Entity {
            id: id.into(),
            name: name.into(),
            parent_id: Some(parent_id.into()),
        }
    }
}

// ==================== Wire parsing ====================

/// Raw list row as the API serves it. Every field is optional because the
/// backend is inconsistent across levels; `into_entity` decides what counts
/// as usable.
#[derive(Debug, Deserialize)]
struct RawEntity {
    id: Option<serde_json::Value>,
    #[serde(
        alias = "college_name",
        alias = "department_name",
        alias = "batch_name",
        alias = "topic_name"
    )]
    name: Option<String>,
    college_id: Option<serde_json::Value>,
    department_id: Option<serde_json::Value>,
    batch_id: Option<serde_json::Value>,
    #[serde(default)]
    is_disabled: bool,
}

/// Ids arrive as strings or numbers depending on the backing table.
fn id_string(value: Option<serde_json::Value>) -> Option<String> {
    match value? {
        serde_json::Value::String(s) if !s.is_empty() => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl RawEntity {
    /// Disabled rows and rows without an id or name are dropped; a missing
    /// parent key is kept as None so the row still lists, it just never
    /// shows under any parent.
    fn into_entity(self, level: Level) -> Option<Entity> {
        if self.is_disabled {
            return None;
        }
        let id = id_string(self.id)?;
        let name = self.name?;
        let parent_id = match level {
            Level::College => None,
            Level::Department => id_string(self.college_id),
            Level::Batch => id_string(self.department_id),
            Level::Topic => id_string(self.batch_id),
        };
        Some(Entity {
            id,
            name,
            parent_id,
        })
    }
}

/// List response body, tolerating both the flat and the enveloped shape.
#[derive(Debug, Default, Deserialize)]
struct ListEnvelope {
    colleges: Option<Vec<RawEntity>>,
    departments: Option<Vec<RawEntity>>,
    batches: Option<Vec<RawEntity>>,
    topics: Option<Vec<RawEntity>>,
    data: Option<Box<ListEnvelope>>,
}

impl ListEnvelope {
    fn take(&mut self, level: Level) -> Option<Vec<RawEntity>> {
        let own = match level {
            Level::College => self.colleges.take(),
            Level::Department => self.departments.take(),
            Level::Batch => self.batches.take(),
            Level::Topic => self.topics.take(),
        };
        match own {
            Some(rows) => Some(rows),
            None => self.data.as_mut().and_then(|inner| inner.take(level)),
        }
    }
}

/// Parse one level's list response. Unknown keys are ignored, disabled rows
/// are filtered out, and a body missing the expected key parses as empty.
pub fn parse_list(level: Level, body: &str) -> Result<Vec<Entity>, String> {
    let mut envelope: ListEnvelope = serde_json::from_str(body)
        .map_err(|e| format!("Failed to parse {} response: {}", level.plural(), e))?;
    let rows = envelope.take(level).unwrap_or_default();
    Ok(rows
        .into_iter()
        .filter_map(|raw| raw.into_entity(level))
        .collect())
}

// ==================== Tests ====================
