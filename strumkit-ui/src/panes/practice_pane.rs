use crossterm::event::{KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Gauge, List, ListItem, ListState, Paragraph};
use ratatui::Frame;

use super::diagram::diagram_lines;
use super::PromptKind;
use crate::action::{Action, PracticeAction};
use crate::state::AppState;
use crate::ui::{style, Pane, PaneOutcome};

/// The practice set in play order, the sounding chord and the saved sets.
pub struct PracticePane {
    selected: usize,
}

impl PracticePane {
    pub fn new() -> Self {
        Self { selected: 0 }
    }

    fn clamp(&mut self, state: &AppState) {
        self.selected = self.selected.min(state.practice.len().saturating_sub(1));
    }

    fn selected_id(&self, state: &AppState) -> Option<String> {
        state.practice.items().get(self.selected).map(|i| i.id.clone())
    }
}

impl Pane for PracticePane {
    fn id(&self) -> &'static str {
        "practice"
    }

    fn handle_key(&mut self, key: &KeyEvent, state: &AppState) -> PaneOutcome {
        self.clamp(state);
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = self.selected.saturating_sub(1);
                PaneOutcome::Consumed
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.selected = (self.selected + 1).min(state.practice.len().saturating_sub(1));
                PaneOutcome::Consumed
            }
            KeyCode::Char('K') => {
                let index = self.selected;
                self.selected = self.selected.saturating_sub(1);
                PaneOutcome::Dispatch(Action::Practice(PracticeAction::MoveUp(index)))
            }
            KeyCode::Char('J') => {
                let index = self.selected;
                if index + 1 < state.practice.len() {
                    self.selected += 1;
                }
                PaneOutcome::Dispatch(Action::Practice(PracticeAction::MoveDown(index)))
            }
            KeyCode::Char('x') | KeyCode::Delete => match self.selected_id(state) {
                Some(id) => PaneOutcome::Dispatch(Action::Practice(PracticeAction::Remove(id))),
                None => PaneOutcome::Consumed,
            },
            KeyCode::Char('c') => PaneOutcome::Dispatch(Action::Practice(PracticeAction::Clear)),
            KeyCode::Char('S') => PaneOutcome::Prompt(PromptKind::SaveSet),
            KeyCode::Char('L') => PaneOutcome::Prompt(PromptKind::LoadSet),
            KeyCode::Char('X') => PaneOutcome::Prompt(PromptKind::DeleteSet),
            _ => PaneOutcome::Ignored,
        }
    }

    fn handle_mouse(&mut self, event: &MouseEvent, area: Rect, state: &AppState) -> PaneOutcome {
        let list = regions(area).list;
        match event.kind {
            MouseEventKind::Down(MouseButton::Left)
                if event.row > list.y && event.row + 1 < list.y + list.height =>
            {
                let index = (event.row - list.y - 1) as usize;
                if index < state.practice.len() {
                    self.selected = index;
                }
                PaneOutcome::Consumed
            }
            _ => PaneOutcome::Ignored,
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        self.clamp(state);
        let r = regions(area);
        let highlight = state.player.highlight.as_ref();

        let items: Vec<ListItem> = state
            .practice
            .items()
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let sounding = highlight.is_some_and(|h| h.chord_id == item.id && h.position == i);
                let style = if sounding {
                    Style::default().fg(style::PLAYING).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(style::TEXT)
                };
                ListItem::new(Line::from(vec![
                    Span::styled(format!("{:>2}. ", i + 1), Style::default().fg(style::DIM)),
                    Span::styled(item.chord_name.clone(), style),
                    Span::styled(
                        format!("  fret {}", item.diagram.start_fret),
                        Style::default().fg(style::DIM),
                    ),
                ]))
            })
            .collect();
        let mut list_state = ListState::default();
        if focused && !state.practice.is_empty() {
            list_state.select(Some(self.selected));
        }
        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!(" Practice set ({}) ", state.practice.len()))
                    .border_style(style::border(focused)),
            )
            .highlight_style(style::selected());
        frame.render_stateful_widget(list, r.list, &mut list_state);

        // The sounding chord while playing, otherwise the selected one.
        let shown = highlight
            .and_then(|h| state.practice.items().get(h.position))
            .or_else(|| state.practice.items().get(self.selected));
        let sounding: &[usize] = highlight.map(|h| h.strings.as_slice()).unwrap_or(&[]);
        let lines = match shown {
            Some(item) => diagram_lines(&item.diagram, state.instrument, sounding),
            None => vec![Line::from(Span::styled(
                "Pick voicings in the chord list",
                Style::default().fg(style::DIM),
            ))],
        };
        let title = shown
            .map(|i| format!(" {} ", i.chord_name))
            .unwrap_or_else(|| " Chord ".to_string());
        frame.render_widget(
            Paragraph::new(lines).block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(title)
                    .border_style(style::border(false)),
            ),
            r.diagram,
        );

        let ratio = state.player.progress().unwrap_or(0.0).clamp(0.0, 1.0);
        let gauge = Gauge::default()
            .gauge_style(Style::default().fg(style::PLAYING))
            .ratio(ratio)
            .label(if state.player.active { "" } else { "stopped" });
        frame.render_widget(gauge, r.progress);

        let sets: Vec<Span> = state
            .saved_sets
            .sets()
            .iter()
            .map(|s| Span::styled(format!("{} ({})  ", s.name, s.voicings.len()), Style::default().fg(style::TEXT)))
            .collect();
        let sets_line = if sets.is_empty() {
            Line::from(Span::styled("none", Style::default().fg(style::DIM)))
        } else {
            Line::from(sets)
        };
        frame.render_widget(
            Paragraph::new(sets_line).block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" Saved sets  S save  L load  X delete ")
                    .border_style(style::border(false)),
            ),
            r.sets,
        );
    }
}

struct Regions {
    list: Rect,
    diagram: Rect,
    progress: Rect,
    sets: Rect,
}

fn regions(area: Rect) -> Regions {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(4),
            Constraint::Length(9),
            Constraint::Length(1),
            Constraint::Length(3),
        ])
        .split(area);
    Regions {
        list: rows[0],
        diagram: rows[1],
        progress: rows[2],
        sets: rows[3],
    }
}
