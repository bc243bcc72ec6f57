use super::*;
use cohortree_lib::selection::SelectAll;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame, Terminal,
};

// ============================================================================
// Selector TUI
// ============================================================================

/// One row in a level pane. Headers and messages are decoration; the cursor
/// only ever rests on selectable rows.
enum PaneRow {
    SelectAll,
    Header(String),
    Entity {
        id: String,
        name: String,
        selected: bool,
    },
    Message(String),
}

impl PaneRow {
    fn selectable(&self) -> bool {
        matches!(self, PaneRow::SelectAll | PaneRow::Entity { .. })
    }
}

/// Picker state: one pane per active level, one cursor per pane.
struct SelectorTui<'a> {
    selector: &'a mut HierarchySelector,
    focus: usize,
    cursors: [usize; 4],
    status_message: String,
}

/// Build the display rows for one level from the same grouping the text
/// renderer uses.
fn pane_rows(selector: &HierarchySelector, level: Level) -> Vec<PaneRow> {
    let catalog = selector.catalog();
    let selection = selector.selection();
    if let Some(message) = render::empty_message(catalog, selection, level) {
        return vec![PaneRow::Message(message)];
    }
    let mut rows = vec![PaneRow::SelectAll];
    for group in render::level_groups(catalog, selection, level) {
        if !group.title.is_empty() {
            rows.push(PaneRow::Header(group.title));
        }
        for entity in group.entities {
            rows.push(PaneRow::Entity {
                id: entity.id.clone(),
                name: entity.name.clone(),
                selected: selection.is_selected(level, &entity.id),
            });
        }
    }
    rows
}

fn next_selectable(rows: &[PaneRow], from: usize) -> usize {
    let mut i = from;
    while i + 1 < rows.len() {
        i += 1;
        if rows[i].selectable() {
            return i;
        }
    }
    from
}

fn prev_selectable(rows: &[PaneRow], from: usize) -> usize {
    let mut i = from;
    while i > 0 {
        i -= 1;
        if rows[i].selectable() {
            return i;
        }
    }
    from
}

/// Re-anchor a cursor after the rows changed under it.
fn clamp_cursor(rows: &[PaneRow], cursor: usize) -> usize {
    if rows.is_empty() {
        return 0;
    }
    let cursor = cursor.min(rows.len() - 1);
    if rows[cursor].selectable() {
        return cursor;
    }
    let back = prev_selectable(rows, cursor);
    if rows[back].selectable() {
        back
    } else {
        next_selectable(rows, cursor)
    }
}

impl<'a> SelectorTui<'a> {
    fn new(selector: &'a mut HierarchySelector) -> Self {
        Self {
            selector,
            focus: 0,
            cursors: [0; 4],
            status_message:
                "Space toggle | a select all | r reset | Tab pane | Enter confirm | q cancel"
                    .to_string(),
        }
    }

    fn levels(&self) -> &'static [Level] {
        self.selector.levels()
    }

    fn focused_level(&self) -> Level {
        self.levels()[self.focus]
    }

    fn focus_next(&mut self) {
        self.focus = (self.focus + 1) % self.levels().len();
        self.status_message = format!("Focus: {}", self.focused_level().title_plural());
    }

    fn focus_prev(&mut self) {
        let count = self.levels().len();
        self.focus = (self.focus + count - 1) % count;
        self.status_message = format!("Focus: {}", self.focused_level().title_plural());
    }

    fn cursor_down(&mut self) {
        let rows = pane_rows(self.selector, self.focused_level());
        let cursor = clamp_cursor(&rows, self.cursors[self.focus]);
        self.cursors[self.focus] = next_selectable(&rows, cursor);
    }

    fn cursor_up(&mut self) {
        let rows = pane_rows(self.selector, self.focused_level());
        let cursor = clamp_cursor(&rows, self.cursors[self.focus]);
        self.cursors[self.focus] = prev_selectable(&rows, cursor);
    }

    fn toggle_current(&mut self) {
        let level = self.focused_level();
        let rows = pane_rows(self.selector, level);
        let cursor = clamp_cursor(&rows, self.cursors[self.focus]);
        match rows.get(cursor) {
            Some(PaneRow::SelectAll) => self.apply_select_all(level),
            Some(PaneRow::Entity { id, selected, .. }) => {
                let id = id.clone();
                let was_selected = *selected;
                self.selector.toggle(level, &id, !was_selected);
                self.refresh_status();
            }
            _ => {}
        }
    }

    /// Fully checked clears; unchecked or partial selects all visible.
    fn apply_select_all(&mut self, level: Level) {
        let checked = self.selector.select_all_state(level) != SelectAll::Checked;
        self.selector.toggle_all(level, checked);
        self.refresh_status();
    }

    fn select_all_focused(&mut self) {
        let level = self.focused_level();
        self.apply_select_all(level);
    }

    fn reset(&mut self) {
        self.selector.reset();
        self.cursors = [0; 4];
        self.status_message = "Selection cleared".to_string();
    }

    fn refresh_status(&mut self) {
        let include_topics = self.selector.config().include_topics;
        self.status_message = render::summarize(&self.selector.snapshot(), include_topics);
    }
}

/// Run the interactive picker over a loaded selector. Returns true when the
/// user confirmed with Enter, false on q/Esc.
pub(crate) fn run_selector(selector: &mut HierarchySelector) -> Result<bool, String> {
    // Setup terminal
    enable_raw_mode().map_err(|e| e.to_string())?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture).map_err(|e| e.to_string())?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).map_err(|e| e.to_string())?;

    let mut app = SelectorTui::new(selector);

    // Main loop
    let result = run_selector_loop(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode().map_err(|e| e.to_string())?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .map_err(|e| e.to_string())?;
    terminal.show_cursor().map_err(|e| e.to_string())?;

    result
}

fn run_selector_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    app: &mut SelectorTui,
) -> Result<bool, String> {
    loop {
        terminal.draw(|f| draw_ui(f, app)).map_err(|e| e.to_string())?;

        if event::poll(std::time::Duration::from_millis(100)).map_err(|e| e.to_string())? {
            if let Event::Key(key) = event::read().map_err(|e| e.to_string())? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }

                match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => return Ok(false),
                    KeyCode::Enter => return Ok(true),
                    KeyCode::Tab => app.focus_next(),
                    KeyCode::BackTab => app.focus_prev(),
                    KeyCode::Char('j') | KeyCode::Down => app.cursor_down(),
                    KeyCode::Char('k') | KeyCode::Up => app.cursor_up(),
                    KeyCode::Char(' ') => app.toggle_current(),
                    KeyCode::Char('a') => app.select_all_focused(),
                    KeyCode::Char('r') => app.reset(),
                    _ => {}
                }
            }
        }
    }
}

// ============================================================================
// Drawing
// ============================================================================

fn draw_ui(f: &mut Frame, app: &SelectorTui) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Summary bar
            Constraint::Min(0),    // Level panes
            Constraint::Length(1), // Status bar
        ])
        .split(f.size());

    // Live selection summary
    let include_topics = app.selector.config().include_topics;
    let summary = Paragraph::new(render::summarize(&app.selector.snapshot(), include_topics))
        .style(Style::default().fg(Color::White));
    f.render_widget(summary, chunks[0]);

    // One pane per active level
    let levels = app.levels();
    let constraints: Vec<Constraint> = levels
        .iter()
        .map(|_| Constraint::Ratio(1, levels.len() as u32))
        .collect();
    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(constraints)
        .split(chunks[1]);

    for (i, level) in levels.iter().enumerate() {
        draw_level_pane(f, app, *level, i, panes[i]);
    }

    // Status bar
    let status_bar = Paragraph::new(app.status_message.clone())
        .style(Style::default().bg(Color::DarkGray).fg(Color::White));
    f.render_widget(status_bar, chunks[2]);
}

fn draw_level_pane(f: &mut Frame, app: &SelectorTui, level: Level, pane_index: usize, area: Rect) {
    let rows = pane_rows(app.selector, level);
    let focused = pane_index == app.focus;
    let indent = if level.parent().is_some() { "  " } else { "" };

    let items: Vec<ListItem> = rows
        .iter()
        .map(|row| match row {
            PaneRow::SelectAll => {
                let mark = render::select_all_mark(app.selector.select_all_state(level));
                ListItem::new(format!("{} Select All {}", mark, level.title_plural()))
                    .style(Style::default().add_modifier(Modifier::BOLD))
            }
            PaneRow::Header(title) => ListItem::new(utils::ellipsize(title, 30))
                .style(Style::default().fg(Color::DarkGray)),
            PaneRow::Entity { name, selected, .. } => ListItem::new(format!(
                "{}{} {}",
                indent,
                render::mark(*selected),
                utils::ellipsize(name, 26)
            )),
            PaneRow::Message(message) => {
                ListItem::new(message.clone()).style(Style::default().fg(Color::DarkGray))
            }
        })
        .collect();

    let visible_count = rows
        .iter()
        .filter(|r| matches!(r, PaneRow::Entity { .. }))
        .count();
    let border_style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style)
                .title(format!(
                    " {} ({}/{}) ",
                    level.title_plural(),
                    app.selector.selection().count(level),
                    visible_count
                )),
        )
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("→ ");

    let mut state = ListState::default();
    if focused {
        state.select(Some(clamp_cursor(&rows, app.cursors[pane_index])));
    }
    f.render_stateful_widget(list, area, &mut state);
}

#[cfg(test)]
mod tests {
    use super::*;
    use cohortree_lib::catalog::Catalog;

    fn sample_selector() -> HierarchySelector {
        let mut catalog = Catalog::new();
        catalog.set_level(Level::College, vec![Entity::new("c1", "Tech U")]);
        catalog.set_level(
            Level::Department,
            vec![
                Entity::with_parent("d1", "CS", "c1"),
                Entity::with_parent("d2", "EE", "c1"),
            ],
        );
        catalog.set_level(Level::Batch, vec![Entity::with_parent("b1", "2024", "d1")]);
        HierarchySelector::with_catalog(SelectorConfig::default(), catalog)
    }

    #[test]
    fn test_pane_rows_structure() {
        let mut selector = sample_selector();
        selector.toggle(Level::College, "c1", true);
        let rows = pane_rows(&selector, Level::Department);
        assert!(matches!(rows[0], PaneRow::SelectAll));
        assert!(matches!(&rows[1], PaneRow::Header(t) if t == "Tech U"));
        assert!(matches!(&rows[2], PaneRow::Entity { name, .. } if name == "CS"));
        assert!(matches!(&rows[3], PaneRow::Entity { name, .. } if name == "EE"));
    }

    #[test]
    fn test_pane_rows_message_when_parent_unselected() {
        let selector = sample_selector();
        let rows = pane_rows(&selector, Level::Department);
        assert_eq!(rows.len(), 1);
        assert!(matches!(&rows[0], PaneRow::Message(m) if m == "Select colleges first"));
    }

    #[test]
    fn test_cursor_skips_headers() {
        let mut selector = sample_selector();
        selector.toggle(Level::College, "c1", true);
        let rows = pane_rows(&selector, Level::Department);
        // from select-all (0), the next selectable row skips the header at 1
        assert_eq!(next_selectable(&rows, 0), 2);
        assert_eq!(prev_selectable(&rows, 2), 0);
        // clamping onto the header snaps back to a selectable row
        assert_eq!(clamp_cursor(&rows, 1), 0);
        // past-the-end cursors clamp to the last row
        assert_eq!(clamp_cursor(&rows, 99), 3);
    }
}
