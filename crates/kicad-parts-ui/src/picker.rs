use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use kicad_parts_core::Result;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Terminal,
};
use std::collections::HashSet;
use std::io::{self, stdout};

use crate::categories::KICAD_LIBRARY_CATEGORIES;

type Term = Terminal<CrosstermBackend<io::Stdout>>;

struct PickerState {
    query: String,
    cursor: usize,
    marked: HashSet<String>,
}

impl PickerState {
    fn new() -> Self {
        Self {
            query: String::new(),
            cursor: 0,
            marked: HashSet::new(),
        }
    }
}

/// Prompt for a library category with type-to-filter selection over the
/// standard KiCad category list. Enter accepts the highlighted entry, or the
/// typed query itself as a custom name when nothing matches; Esc cancels.
pub fn pick_category() -> Result<Option<String>> {
    let items: Vec<String> = KICAD_LIBRARY_CATEGORIES
        .iter()
        .map(|s| s.to_string())
        .collect();
    with_terminal(|terminal| run_single(terminal, "Select library category", &items))
}

/// Multi-select over arbitrary display strings: Space toggles, Enter confirms
/// (falling back to the highlighted entry when nothing is toggled), Esc
/// cancels with an empty selection.
pub fn pick_parts(items: &[String]) -> Result<Vec<String>> {
    with_terminal(|terminal| run_multi(terminal, "Select parts to delete", items))
}

fn with_terminal<T>(f: impl FnOnce(&mut Term) -> Result<T>) -> Result<T> {
    enable_raw_mode()?;
    execute!(stdout(), EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout());
    let mut terminal = Terminal::new(backend)?;

    let result = f(&mut terminal);

    // Clean up terminal
    disable_raw_mode()?;
    execute!(stdout(), LeaveAlternateScreen)?;
    result
}

fn run_single(terminal: &mut Term, title: &str, items: &[String]) -> Result<Option<String>> {
    let mut state = PickerState::new();
    loop {
        let visible = filtered(items, &state.query);
        clamp_cursor(&mut state, visible.len());
        draw(terminal, title, &state, &visible, false)?;

        if let Event::Key(KeyEvent { code, modifiers, .. }) = event::read()? {
            match code {
                KeyCode::Esc => return Ok(None),
                KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                    return Ok(None);
                }
                KeyCode::Enter => {
                    if let Some(choice) = visible.get(state.cursor) {
                        return Ok(Some((*choice).clone()));
                    }
                    // no match: accept the typed query as a custom name
                    if !state.query.is_empty() {
                        return Ok(Some(state.query.clone()));
                    }
                }
                KeyCode::Up => state.cursor = state.cursor.saturating_sub(1),
                KeyCode::Down => {
                    if state.cursor + 1 < visible.len() {
                        state.cursor += 1;
                    }
                }
                KeyCode::Backspace => {
                    state.query.pop();
                    state.cursor = 0;
                }
                KeyCode::Char(c) => {
                    state.query.push(c);
                    state.cursor = 0;
                }
                _ => {}
            }
        }
    }
}

fn run_multi(terminal: &mut Term, title: &str, items: &[String]) -> Result<Vec<String>> {
    let mut state = PickerState::new();
    loop {
        let visible = filtered(items, &state.query);
        clamp_cursor(&mut state, visible.len());
        draw(terminal, title, &state, &visible, true)?;

        if let Event::Key(KeyEvent { code, modifiers, .. }) = event::read()? {
            match code {
                KeyCode::Esc => return Ok(Vec::new()),
                KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                    return Ok(Vec::new());
                }
                KeyCode::Enter => {
                    if state.marked.is_empty() {
                        if let Some(choice) = visible.get(state.cursor) {
                            return Ok(vec![(*choice).clone()]);
                        }
                        return Ok(Vec::new());
                    }
                    // keep the original item order
                    return Ok(items
                        .iter()
                        .filter(|item| state.marked.contains(*item))
                        .cloned()
                        .collect());
                }
                KeyCode::Char(' ') => {
                    if let Some(choice) = visible.get(state.cursor) {
                        let item = (*choice).clone();
                        if !state.marked.remove(&item) {
                            state.marked.insert(item);
                        }
                        if state.cursor + 1 < visible.len() {
                            state.cursor += 1;
                        }
                    }
                }
                KeyCode::Up => state.cursor = state.cursor.saturating_sub(1),
                KeyCode::Down => {
                    if state.cursor + 1 < visible.len() {
                        state.cursor += 1;
                    }
                }
                KeyCode::Backspace => {
                    state.query.pop();
                    state.cursor = 0;
                }
                KeyCode::Char(c) => {
                    state.query.push(c);
                    state.cursor = 0;
                }
                _ => {}
            }
        }
    }
}

fn filtered<'a>(items: &'a [String], query: &str) -> Vec<&'a String> {
    let needle = query.to_lowercase();
    items
        .iter()
        .filter(|item| item.to_lowercase().contains(&needle))
        .collect()
}

fn clamp_cursor(state: &mut PickerState, len: usize) {
    if state.cursor >= len {
        state.cursor = len.saturating_sub(1);
    }
}

fn draw(
    terminal: &mut Term,
    title: &str,
    state: &PickerState,
    visible: &[&String],
    multi: bool,
) -> Result<()> {
    terminal.draw(|f| {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Query input
                Constraint::Min(1),    // Result list
                Constraint::Length(1), // Help text
            ])
            .split(f.size());

        let input = Paragraph::new(state.query.as_str()).block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {title} ")),
        );
        f.render_widget(input, chunks[0]);

        let rows: Vec<ListItem> = visible
            .iter()
            .map(|item| {
                if multi {
                    let mark = if state.marked.contains(*item) { "[x] " } else { "[ ] " };
                    ListItem::new(format!("{mark}{item}"))
                } else {
                    ListItem::new(item.as_str())
                }
            })
            .collect();
        let list = List::new(rows)
            .block(Block::default().borders(Borders::ALL))
            .highlight_style(
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("> ");
        let mut list_state = ListState::default();
        if !visible.is_empty() {
            list_state.select(Some(state.cursor));
        }
        f.render_stateful_widget(list, chunks[1], &mut list_state);

        let help = if multi {
            "Space: toggle  Enter: confirm  Esc: cancel  Type to filter"
        } else {
            "Enter: select  Esc: cancel  Type to filter"
        };
        let help = Paragraph::new(help).style(Style::default().fg(Color::DarkGray));
        f.render_widget(help, chunks[2]);
    })?;
    Ok(())
}
