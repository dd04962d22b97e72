use crossterm::event::{KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use ratatui::Frame;

use strumkit_types::voicing_id;

use super::diagram::diagram_lines;
use crate::action::{Action, ChordAction, PracticeAction};
use crate::state::AppState;
use crate::ui::{style, Pane, PaneOutcome};

/// Chord browser: a searchable list on the left, the selected voicing on
/// the right.
pub struct ChordsPane {
    selected: usize,
    voicing: usize,
    searching: bool,
}

impl ChordsPane {
    pub fn new() -> Self {
        Self {
            selected: 0,
            voicing: 0,
            searching: false,
        }
    }

    pub fn is_searching(&self) -> bool {
        self.searching
    }

    fn clamp(&mut self, state: &AppState) {
        let count = state.library.filtered().len();
        self.selected = self.selected.min(count.saturating_sub(1));
        let voicings = state
            .library
            .filtered()
            .get(self.selected)
            .map(|g| g.diagrams.len())
            .unwrap_or(0);
        self.voicing = self.voicing.min(voicings.saturating_sub(1));
    }

    fn selected_name(&self, state: &AppState) -> Option<String> {
        state
            .library
            .filtered()
            .get(self.selected)
            .map(|g| g.name.clone())
    }

    fn move_selection(&mut self, delta: isize, state: &AppState) -> PaneOutcome {
        let count = state.library.filtered().len();
        if count > 0 {
            self.selected = (self.selected as isize + delta).clamp(0, count as isize - 1) as usize;
            self.voicing = 0;
        }
        PaneOutcome::Consumed
    }

    fn toggle_selected(&self, state: &AppState) -> PaneOutcome {
        match self.selected_name(state) {
            Some(chord) => PaneOutcome::Dispatch(Action::Practice(PracticeAction::ToggleVoicing {
                chord,
                diagram: self.voicing,
            })),
            None => PaneOutcome::Consumed,
        }
    }

    fn handle_search_key(&mut self, key: &KeyEvent, state: &AppState) -> PaneOutcome {
        let mut query = state.library.search().to_string();
        match key.code {
            KeyCode::Esc | KeyCode::Enter => {
                self.searching = false;
                return PaneOutcome::Consumed;
            }
            KeyCode::Backspace => {
                query.pop();
            }
            KeyCode::Char(c) => query.push(c),
            _ => return PaneOutcome::Consumed,
        }
        self.selected = 0;
        self.voicing = 0;
        PaneOutcome::Dispatch(Action::Chords(ChordAction::SetSearch(query)))
    }
}

impl Pane for ChordsPane {
    fn id(&self) -> &'static str {
        "chords"
    }

    fn handle_key(&mut self, key: &KeyEvent, state: &AppState) -> PaneOutcome {
        if self.searching {
            return self.handle_search_key(key, state);
        }
        self.clamp(state);
        match key.code {
            KeyCode::Char('/') => {
                self.searching = true;
                PaneOutcome::Consumed
            }
            KeyCode::Up | KeyCode::Char('k') => self.move_selection(-1, state),
            KeyCode::Down | KeyCode::Char('j') => self.move_selection(1, state),
            KeyCode::Left | KeyCode::Char('h') => {
                self.voicing = self.voicing.saturating_sub(1);
                PaneOutcome::Consumed
            }
            KeyCode::Right | KeyCode::Char('l') => {
                self.voicing += 1;
                self.clamp(state);
                PaneOutcome::Consumed
            }
            KeyCode::Enter => self.toggle_selected(state),
            _ => PaneOutcome::Ignored,
        }
    }

    fn handle_mouse(&mut self, event: &MouseEvent, area: Rect, state: &AppState) -> PaneOutcome {
        let list = list_area(area);
        let inside = event.column >= list.x
            && event.column < list.x + list.width
            && event.row > list.y
            && event.row + 1 < list.y + list.height;
        match event.kind {
            MouseEventKind::Down(MouseButton::Left) if inside => {
                let row = (event.row - list.y - 1) as usize;
                let count = state.library.filtered().len();
                let offset = self.selected.saturating_sub(list.height.saturating_sub(3) as usize);
                let index = offset + row;
                if index < count {
                    if index == self.selected {
                        return self.toggle_selected(state);
                    }
                    self.selected = index;
                    self.voicing = 0;
                }
                PaneOutcome::Consumed
            }
            MouseEventKind::ScrollUp => self.move_selection(-1, state),
            MouseEventKind::ScrollDown => self.move_selection(1, state),
            _ => PaneOutcome::Ignored,
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        self.clamp(state);
        let chords = state.library.filtered();
        let title = if self.searching || !state.library.search().is_empty() {
            format!(" {} chords /{} ", state.instrument.name(), state.library.search())
        } else {
            format!(" {} chords ", state.instrument.name())
        };

        let items: Vec<ListItem> = chords
            .iter()
            .map(|g| {
                let picked = g
                    .diagrams
                    .iter()
                    .any(|d| state.practice.contains(&g.name, d));
                let mut spans = vec![
                    Span::raw(if picked { "* " } else { "  " }),
                    Span::styled(g.name.clone(), Style::default().fg(style::TEXT)),
                ];
                if !g.aliases.is_empty() {
                    spans.push(Span::styled(
                        format!("  {}", g.aliases.join(" ")),
                        Style::default().fg(style::DIM),
                    ));
                }
                ListItem::new(Line::from(spans))
            })
            .collect();
        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(title)
                    .border_style(style::border(focused)),
            )
            .highlight_style(style::selected());
        let mut list_state = ListState::default();
        if !chords.is_empty() {
            list_state.select(Some(self.selected));
        }
        frame.render_stateful_widget(list, list_area(area), &mut list_state);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(style::border(focused));
        let Some(group) = chords.get(self.selected) else {
            frame.render_widget(
                Paragraph::new("No chords match").block(block.title(" Voicing ")),
                diagram_area(area),
            );
            return;
        };
        let Some(diagram) = group.diagrams.get(self.voicing) else {
            return;
        };
        let sounding = state
            .player
            .highlight
            .as_ref()
            .filter(|h| h.chord_id == voicing_id(&group.name, diagram))
            .map(|h| h.strings.clone())
            .unwrap_or_default();
        let mut lines = diagram_lines(diagram, state.instrument, &sounding);
        lines.push(Line::from(""));
        let in_set = state.practice.contains(&group.name, diagram);
        lines.push(Line::from(Span::styled(
            if in_set { "in practice set (Enter removes)" } else { "Enter adds to practice set" },
            Style::default().fg(style::DIM),
        )));
        let title = format!(
            " {} {}/{} ",
            group.name,
            self.voicing + 1,
            group.diagrams.len()
        );
        frame.render_widget(Paragraph::new(lines).block(block.title(title)), diagram_area(area));
    }
}

fn split(area: Rect) -> (Rect, Rect) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(24), Constraint::Min(10)])
        .split(area);
    (cols[0], cols[1])
}

fn list_area(area: Rect) -> Rect {
    split(area).0
}

fn diagram_area(area: Rect) -> Rect {
    split(area).1
}
