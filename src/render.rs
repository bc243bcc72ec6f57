//! Text rendering for selection views.
//!
//! Everything here derives display strings from catalog plus selection and
//! touches no terminal. The interactive picker builds its list rows from
//! the same grouping so the two surfaces cannot drift apart.

use crate::catalog::Catalog;
use crate::entity::{Entity, Level};
use crate::selection::{SelectAll, SelectionSnapshot, SelectionState};
use crate::utils::format_count;

/// Visible entities at one level, grouped for display. The college level is
/// a single untitled group; deeper levels get one group per selected parent
/// that has children, in parent selection order.
pub struct LevelGroup<'a> {
    pub title: String,
    pub entities: Vec<&'a Entity>,
}

pub fn mark(selected: bool) -> &'static str {
    if selected {
        "[x]"
    } else {
        "[ ]"
    }
}

pub fn select_all_mark(state: SelectAll) -> &'static str {
    match state {
        SelectAll::Unchecked => "[ ]",
        SelectAll::Indeterminate => "[~]",
        SelectAll::Checked => "[x]",
    }
}

/// Group heading for one selected parent. From the batch level down the
/// heading carries the grandparent in parens ("CS (Tech U)") so duplicate
/// names across branches stay tellable apart.
fn group_title(catalog: &Catalog, parent_level: Level, parent: &Entity) -> String {
    let grandparent = parent_level.parent().and_then(|gp_level| {
        parent
            .parent_id
            .as_deref()
            .and_then(|id| catalog.get(gp_level, id))
    });
    match grandparent {
        Some(gp) => format!("{} ({})", parent.name, gp.name),
        None => parent.name.clone(),
    }
}

/// Group the visible entities at `level` for display.
pub fn level_groups<'a>(
    catalog: &'a Catalog,
    selection: &'a SelectionState,
    level: Level,
) -> Vec<LevelGroup<'a>> {
    match level.parent() {
        None => vec![LevelGroup {
            title: String::new(),
            entities: catalog.level(level).iter().collect(),
        }],
        Some(parent_level) => selection
            .selected(parent_level)
            .iter()
            .filter_map(|parent_id| {
                let parent = catalog.get(parent_level, parent_id)?;
                let entities: Vec<&Entity> = catalog.children_of(level, parent_id).collect();
                if entities.is_empty() {
                    return None;
                }
                Some(LevelGroup {
                    title: group_title(catalog, parent_level, parent),
                    entities,
                })
            })
            .collect(),
    }
}

/// The message shown instead of a list when a level has nothing to offer:
/// the catalog level is empty, no parent is selected yet, or the selected
/// parents have no children.
pub fn empty_message(
    catalog: &Catalog,
    selection: &SelectionState,
    level: Level,
) -> Option<String> {
    match level.parent() {
        None => {
            if catalog.is_empty(level) {
                Some(format!("No {} available", level.plural()))
            } else {
                None
            }
        }
        Some(parent_level) => {
            if selection.count(parent_level) == 0 {
                Some(format!("Select {} first", parent_level.plural()))
            } else if selection.visible(catalog, level).is_empty() {
                Some(format!(
                    "No {} found for selected {}",
                    level.plural(),
                    parent_level.plural()
                ))
            } else {
                None
            }
        }
    }
}

/// Render one level as checkbox lines under a select-all header.
pub fn render_level(catalog: &Catalog, selection: &SelectionState, level: Level) -> String {
    if let Some(message) = empty_message(catalog, selection, level) {
        return message;
    }
    let mut out = String::new();
    out.push_str(&format!(
        "{} Select All {}\n",
        select_all_mark(selection.select_all_state(catalog, level)),
        level.title_plural()
    ));
    for group in level_groups(catalog, selection, level) {
        let indent = if group.title.is_empty() {
            ""
        } else {
            out.push_str(&group.title);
            out.push('\n');
            "  "
        };
        for entity in &group.entities {
            out.push_str(&format!(
                "{}{} {}\n",
                indent,
                mark(selection.is_selected(level, &entity.id)),
                entity.name
            ));
        }
    }
    out
}

/// Render the whole catalog as an indented tree, ignoring selection.
pub fn render_tree(catalog: &Catalog, include_topics: bool) -> String {
    if catalog.is_empty(Level::College) {
        return "No colleges available".to_string();
    }
    let mut out = String::new();
    for college in catalog.level(Level::College) {
        out.push_str(&college.name);
        out.push('\n');
        for department in catalog.children_of(Level::Department, &college.id) {
            out.push_str(&format!("  {}\n", department.name));
            for batch in catalog.children_of(Level::Batch, &department.id) {
                out.push_str(&format!("    {}\n", batch.name));
                if include_topics {
                    for topic in catalog.children_of(Level::Topic, &batch.id) {
                        out.push_str(&format!("      {}\n", topic.name));
                    }
                }
            }
        }
    }
    out
}

/// One-line count summary for status bars ("1 college, 2 batches selected").
pub fn summarize(snapshot: &SelectionSnapshot, include_topics: bool) -> String {
    let mut parts = vec![
        format_count(snapshot.colleges.len(), "college", "colleges"),
        format_count(snapshot.departments.len(), "department", "departments"),
        format_count(snapshot.batches.len(), "batch", "batches"),
    ];
    if include_topics {
        parts.push(format_count(snapshot.topics.len(), "topic", "topics"));
    }
    format!("{} selected", parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Entity;

    fn sample() -> Catalog {
        let mut catalog = Catalog::new();
        catalog.set_level(
            Level::College,
            vec![Entity::new("c1", "Tech U"), Entity::new("c2", "State College")],
        );
        catalog.set_level(
            Level::Department,
            vec![
                Entity::with_parent("d1", "CS", "c1"),
                Entity::with_parent("d2", "EE", "c1"),
            ],
        );
        catalog.set_level(
            Level::Batch,
            vec![
                Entity::with_parent("b1", "2024", "d1"),
                Entity::with_parent("b2", "2025", "d1"),
            ],
        );
        catalog
    }

    #[test]
    fn test_render_colleges_flat() {
        let catalog = sample();
        let mut selection = SelectionState::new();
        selection.toggle(&catalog, Level::College, "c1", true);
        let text = render_level(&catalog, &selection, Level::College);
        assert_eq!(
            text,
            "[~] Select All Colleges\n[x] Tech U\n[ ] State College\n"
        );
    }

    #[test]
    fn test_render_empty_catalog() {
        let catalog = Catalog::new();
        let selection = SelectionState::new();
        assert_eq!(
            render_level(&catalog, &selection, Level::College),
            "No colleges available"
        );
    }

    #[test]
    fn test_render_waits_for_parent_selection() {
        let catalog = sample();
        let selection = SelectionState::new();
        assert_eq!(
            render_level(&catalog, &selection, Level::Department),
            "Select colleges first"
        );
        assert_eq!(
            render_level(&catalog, &selection, Level::Batch),
            "Select departments first"
        );
    }

    #[test]
    fn test_render_childless_parents() {
        let catalog = sample();
        let mut selection = SelectionState::new();
        selection.toggle(&catalog, Level::College, "c2", true);
        assert_eq!(
            render_level(&catalog, &selection, Level::Department),
            "No departments found for selected colleges"
        );
    }

    #[test]
    fn test_render_groups_with_grandparent_subtitle() {
        let catalog = sample();
        let mut selection = SelectionState::new();
        selection.toggle(&catalog, Level::College, "c1", true);
        selection.toggle(&catalog, Level::Department, "d1", true);
        selection.toggle(&catalog, Level::Batch, "b1", true);
        let text = render_level(&catalog, &selection, Level::Batch);
        assert_eq!(
            text,
            "[~] Select All Batches\nCS (Tech U)\n  [x] 2024\n  [ ] 2025\n"
        );
    }

    #[test]
    fn test_render_department_groups_have_no_subtitle() {
        let catalog = sample();
        let mut selection = SelectionState::new();
        selection.toggle(&catalog, Level::College, "c1", true);
        let text = render_level(&catalog, &selection, Level::Department);
        assert!(text.contains("Tech U\n"));
        assert!(!text.contains("("));
    }

    #[test]
    fn test_group_title_survives_broken_chain() {
        let mut catalog = sample();
        catalog.set_level(
            Level::Department,
            vec![Entity::with_parent("d9", "Ghost Dept", "c9")],
        );
        catalog.set_level(Level::Batch, vec![Entity::with_parent("b9", "2030", "d9")]);
        // d9's college c9 is unknown, so the heading is just the name
        let parent = catalog.get(Level::Department, "d9").unwrap();
        assert_eq!(group_title(&catalog, Level::Department, parent), "Ghost Dept");
    }

    #[test]
    fn test_select_all_marks() {
        assert_eq!(select_all_mark(SelectAll::Unchecked), "[ ]");
        assert_eq!(select_all_mark(SelectAll::Indeterminate), "[~]");
        assert_eq!(select_all_mark(SelectAll::Checked), "[x]");
    }

    #[test]
    fn test_render_tree() {
        let mut catalog = sample();
        catalog.set_level(Level::Topic, vec![Entity::with_parent("t1", "Arrays", "b1")]);
        let without_topics = render_tree(&catalog, false);
        assert!(without_topics.contains("Tech U\n  CS\n    2024\n    2025\n"));
        assert!(!without_topics.contains("Arrays"));
        let with_topics = render_tree(&catalog, true);
        assert!(with_topics.contains("    2024\n      Arrays\n"));
    }

    #[test]
    fn test_summarize() {
        let catalog = sample();
        let mut selection = SelectionState::new();
        selection.toggle(&catalog, Level::College, "c1", true);
        selection.toggle(&catalog, Level::Department, "d1", true);
        selection.toggle(&catalog, Level::Batch, "b1", true);
        selection.toggle(&catalog, Level::Batch, "b2", true);
        assert_eq!(
            summarize(&selection.snapshot(), false),
            "1 college, 1 department, 2 batches selected"
        );
    }
}
