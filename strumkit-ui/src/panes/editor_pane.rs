use crossterm::event::{KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use strumkit_core::editor::{duration_label, EditorMode, EditorSession};
use strumkit_types::tuning::order;
use strumkit_types::{span_owner, GridCell, PatternKind, StrumKind};

use super::diagram::string_labels;
use super::PromptKind;
use crate::action::{Action, EditorAction};
use crate::state::AppState;
use crate::ui::{style, Pane, PaneOutcome};

const CELL_W: u16 = 3;
const LABEL_W: u16 = 4;
const HEADER_H: u16 = 2;
const PREVIEW_BPM_STEP: i32 = 5;

/// Where the grid sits on screen.
#[derive(Debug, Clone, Copy, PartialEq)]
struct GridGeometry {
    x: u16,
    y: u16,
    rows: usize,
    steps: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct GridHit {
    row: usize,
    step: usize,
    /// Column within the step's cell; the last column is the resize handle.
    offset: u16,
}

impl GridGeometry {
    fn new(area: Rect, editor: &EditorSession) -> Self {
        let rows = match editor.kind() {
            PatternKind::Strum => 1,
            PatternKind::Arpeggio => editor.arpeggio_lanes().len(),
        };
        Self {
            x: area.x + 1 + LABEL_W,
            y: area.y + 1 + HEADER_H,
            rows,
            steps: editor.total_steps(),
        }
    }

    fn hit(&self, column: u16, row: u16) -> Option<GridHit> {
        if column < self.x || row < self.y {
            return None;
        }
        let hit = GridHit {
            row: (row - self.y) as usize,
            step: ((column - self.x) / CELL_W) as usize,
            offset: (column - self.x) % CELL_W,
        };
        (hit.row < self.rows && hit.step < self.steps).then_some(hit)
    }
}

/// Arpeggio lane drawn on screen row `row`. Rows run highest string
/// first; the reversal is its own inverse.
fn lane_for_row(editor: &EditorSession, row: usize) -> Option<usize> {
    match editor.kind() {
        PatternKind::Strum => None,
        PatternKind::Arpeggio => order::diagram_index(row, editor.arpeggio_lanes().len()),
    }
}

/// Start step and duration of the placed span covering `step`, if any.
fn placed_span(editor: &EditorSession, lane: Option<usize>, step: usize) -> Option<(usize, usize)> {
    fn span<C: GridCell>(cells: &[C], step: usize) -> Option<(usize, usize)> {
        if step >= cells.len() {
            return None;
        }
        let owner = span_owner(cells, step);
        cells[owner]
            .is_placed()
            .then(|| (owner, cells[owner].duration()))
            .filter(|(o, d)| step < o + d)
    }
    match lane {
        None => span(editor.strum_cells(), step),
        Some(l) => span(editor.arpeggio_lanes().get(l)?, step),
    }
}

/// Rhythm editor over the open session, with a preview playhead.
pub struct EditorPane {
    cursor_row: usize,
    cursor_step: usize,
}

impl EditorPane {
    pub fn new() -> Self {
        Self {
            cursor_row: 0,
            cursor_step: 0,
        }
    }

    fn clamp(&mut self, editor: &EditorSession) {
        let rows = match editor.kind() {
            PatternKind::Strum => 1,
            PatternKind::Arpeggio => editor.arpeggio_lanes().len(),
        };
        self.cursor_row = self.cursor_row.min(rows.saturating_sub(1));
        self.cursor_step = self.cursor_step.min(editor.total_steps().saturating_sub(1));
    }

    fn click_at(&self, editor: &EditorSession, row: usize, step: usize) -> Action {
        match lane_for_row(editor, row) {
            None => Action::Editor(EditorAction::PressStrum(step)),
            Some(lane) => Action::Editor(EditorAction::ClickArpeggio { lane, step }),
        }
    }

    fn right_click_at(&self, editor: &EditorSession, row: usize, step: usize) -> Action {
        match lane_for_row(editor, row) {
            None => Action::Editor(EditorAction::RightClickStrum(step)),
            Some(lane) => Action::Editor(EditorAction::RightClickArpeggio { lane, step }),
        }
    }

    /// Grow or shrink the span under the cursor by one step.
    fn nudge_duration(&self, editor: &EditorSession, delta: f64) -> PaneOutcome {
        let lane = lane_for_row(editor, self.cursor_row);
        let Some((owner, _)) = placed_span(editor, lane, self.cursor_step) else {
            return PaneOutcome::Consumed;
        };
        PaneOutcome::Batch(vec![
            Action::Editor(EditorAction::BeginResize {
                lane,
                step: owner,
                x: 0.0,
                cell_width: 1.0,
            }),
            Action::Editor(EditorAction::DragResize(delta)),
            Action::Editor(EditorAction::EndGesture),
        ])
    }

    fn header(&self, editor: &EditorSession, state: &AppState) -> Vec<Line<'static>> {
        let mode = match editor.mode() {
            EditorMode::New => "new",
            EditorMode::Edit => "edit",
            EditorMode::Clone => "copy",
        };
        let lane = lane_for_row(editor, self.cursor_row);
        let duration = placed_span(editor, lane, self.cursor_step)
            .map(|(_, d)| duration_label(d))
            .unwrap_or_else(|| "-".to_string());
        let preview = if state.preview.active {
            Span::styled("previewing", Style::default().fg(style::PLAYING))
        } else {
            Span::styled("p preview", Style::default().fg(style::DIM))
        };
        vec![
            Line::from(vec![
                Span::styled(editor.name().to_string(), style::title()),
                Span::styled(format!("  [{}]", mode), Style::default().fg(style::DIM)),
                Span::raw(format!(
                    "  {}  {}  step {}/{}  {}",
                    editor.time_signature().label(),
                    editor.kind().name(),
                    self.cursor_step + 1,
                    editor.total_steps(),
                    duration
                )),
            ]),
            Line::from(vec![
                Span::raw(format!(
                    "chord {}  {} bpm  ",
                    editor.preview_chord(),
                    editor.preview_bpm()
                )),
                preview,
            ]),
        ]
    }

    fn strum_row(&self, editor: &EditorSession, playhead: Option<usize>) -> Line<'static> {
        let cells = editor.strum_cells();
        let mut spans = vec![Span::styled(format!("{:<w$}", "str", w = LABEL_W as usize), Style::default().fg(style::DIM))];
        for step in 0..cells.len() {
            let span = placed_span(editor, None, step);
            let text = match span {
                Some((owner, duration)) => {
                    let cell = &cells[owner];
                    let first = if owner == step { cell.kind.symbol() } else { '=' };
                    let last = if step + 1 == owner + duration { ']' } else { '=' };
                    format!("{}{}{}", if owner == step { ' ' } else { '=' }, first, last)
                }
                None => " . ".to_string(),
            };
            let accented = span.is_some_and(|(owner, _)| cells[owner].accented);
            let muted = span.is_some_and(|(owner, _)| cells[owner].kind == StrumKind::Mute);
            spans.push(Span::styled(text, self.cell_style(0, step, accented, muted, playhead)));
        }
        Line::from(spans)
    }

    fn arpeggio_rows(&self, editor: &EditorSession, state: &AppState, playhead: Option<usize>) -> Vec<Line<'static>> {
        let labels = string_labels(state.instrument);
        let lanes = editor.arpeggio_lanes();
        (0..lanes.len())
            .filter_map(|row| {
                let lane = lane_for_row(editor, row)?;
                let cells = &lanes[lane];
                let label = labels.get(row).cloned().unwrap_or_default();
                let mut spans = vec![Span::styled(
                    format!("{:<w$}", label, w = LABEL_W as usize),
                    Style::default().fg(style::DIM),
                )];
                for step in 0..cells.len() {
                    let span = placed_span(editor, Some(lane), step);
                    let text = match span {
                        Some((owner, duration)) => {
                            let last = if step + 1 == owner + duration { ']' } else { '=' };
                            if owner == step {
                                format!(" o{}", last)
                            } else {
                                format!("=={}", last)
                            }
                        }
                        None => " . ".to_string(),
                    };
                    let accented = span.is_some_and(|(owner, _)| cells[owner].accented);
                    spans.push(Span::styled(text, self.cell_style(row, step, accented, false, playhead)));
                }
                Some(Line::from(spans))
            })
            .collect()
    }

    fn cell_style(&self, row: usize, step: usize, accented: bool, muted: bool, playhead: Option<usize>) -> Style {
        let mut s = Style::default().fg(style::TEXT);
        if muted {
            s = s.fg(style::MUTED);
        }
        if accented {
            s = s.fg(style::ACCENT).add_modifier(Modifier::BOLD);
        }
        if playhead == Some(step) {
            s = s.bg(style::PLAYHEAD_BG);
        }
        if row == self.cursor_row && step == self.cursor_step {
            s = s.bg(style::SELECTION_BG);
        }
        s
    }
}

impl Pane for EditorPane {
    fn id(&self) -> &'static str {
        "editor"
    }

    fn handle_key(&mut self, key: &KeyEvent, state: &AppState) -> PaneOutcome {
        let Some(editor) = state.editor.as_ref() else {
            return PaneOutcome::Ignored;
        };
        self.clamp(editor);
        let edit = |a: EditorAction| PaneOutcome::Dispatch(Action::Editor(a));
        match key.code {
            KeyCode::Esc => edit(EditorAction::Close),
            KeyCode::Left | KeyCode::Char('h') => {
                self.cursor_step = self.cursor_step.saturating_sub(1);
                PaneOutcome::Consumed
            }
            KeyCode::Right | KeyCode::Char('l') => {
                self.cursor_step += 1;
                self.clamp(editor);
                PaneOutcome::Consumed
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.cursor_row = self.cursor_row.saturating_sub(1);
                PaneOutcome::Consumed
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.cursor_row += 1;
                self.clamp(editor);
                PaneOutcome::Consumed
            }
            KeyCode::Enter => PaneOutcome::Batch(vec![
                self.click_at(editor, self.cursor_row, self.cursor_step),
                Action::Editor(EditorAction::EndGesture),
            ]),
            KeyCode::Char('a') => {
                PaneOutcome::Dispatch(self.right_click_at(editor, self.cursor_row, self.cursor_step))
            }
            KeyCode::Char('>') => self.nudge_duration(editor, 1.0),
            KeyCode::Char('<') => self.nudge_duration(editor, -1.0),
            KeyCode::Char('t') => edit(EditorAction::SetTimeSignature(editor.time_signature().next())),
            KeyCode::Char('m') => edit(EditorAction::SetKind(match editor.kind() {
                PatternKind::Strum => PatternKind::Arpeggio,
                PatternKind::Arpeggio => PatternKind::Strum,
            })),
            KeyCode::Char('c') => edit(EditorAction::Clear),
            KeyCode::Char('p') => edit(EditorAction::TogglePreview),
            KeyCode::Char('+') | KeyCode::Char('=') => edit(EditorAction::AdjustPreviewBpm(PREVIEW_BPM_STEP)),
            KeyCode::Char('-') => edit(EditorAction::AdjustPreviewBpm(-PREVIEW_BPM_STEP)),
            KeyCode::Char('r') => PaneOutcome::Prompt(PromptKind::RenamePattern),
            KeyCode::Char('o') => PaneOutcome::Prompt(PromptKind::PreviewChord),
            KeyCode::Char('w') => edit(EditorAction::Save { as_new: false }),
            KeyCode::Char('W') => edit(EditorAction::Save { as_new: true }),
            _ => PaneOutcome::Consumed,
        }
    }

    fn handle_mouse(&mut self, event: &MouseEvent, area: Rect, state: &AppState) -> PaneOutcome {
        let Some(editor) = state.editor.as_ref() else {
            return PaneOutcome::Ignored;
        };
        let geometry = GridGeometry::new(area, editor);
        let hit = geometry.hit(event.column, event.row);
        let x = event.column as f64;

        match event.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                let Some(hit) = hit else {
                    return PaneOutcome::Ignored;
                };
                self.cursor_row = hit.row;
                self.cursor_step = hit.step;
                let lane = lane_for_row(editor, hit.row);
                if let Some((owner, duration)) = placed_span(editor, lane, hit.step) {
                    if hit.offset == CELL_W - 1 && hit.step + 1 == owner + duration {
                        return PaneOutcome::Dispatch(Action::Editor(EditorAction::BeginResize {
                            lane,
                            step: owner,
                            x,
                            cell_width: CELL_W as f64,
                        }));
                    }
                }
                PaneOutcome::Dispatch(self.click_at(editor, hit.row, hit.step))
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                if editor.is_resizing() {
                    return PaneOutcome::Dispatch(Action::Editor(EditorAction::DragResize(x)));
                }
                match hit {
                    Some(hit) if editor.is_painting() && lane_for_row(editor, hit.row).is_none() => {
                        PaneOutcome::Dispatch(Action::Editor(EditorAction::EnterStrum(hit.step)))
                    }
                    _ => PaneOutcome::Consumed,
                }
            }
            MouseEventKind::Up(MouseButton::Left) => {
                PaneOutcome::Dispatch(Action::Editor(EditorAction::EndGesture))
            }
            MouseEventKind::Down(MouseButton::Right) => match hit {
                Some(hit) => PaneOutcome::Dispatch(self.right_click_at(editor, hit.row, hit.step)),
                None => PaneOutcome::Ignored,
            },
            _ => PaneOutcome::Ignored,
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Rhythm editor ")
            .border_style(style::border(focused));
        let Some(editor) = state.editor.as_ref() else {
            frame.render_widget(Paragraph::new("").block(block), area);
            return;
        };
        self.clamp(editor);

        let playhead = state
            .preview
            .highlight
            .as_ref()
            .filter(|_| state.preview.active)
            .map(|h| h.step);
        let mut lines = self.header(editor, state);
        match editor.kind() {
            PatternKind::Strum => lines.push(self.strum_row(editor, playhead)),
            PatternKind::Arpeggio => lines.extend(self.arpeggio_rows(editor, state, playhead)),
        }
        if let Some(step) = playhead {
            let pad = LABEL_W as usize + step * CELL_W as usize + 1;
            lines.push(Line::from(Span::styled(
                format!("{:>w$}", "^", w = pad + 1),
                Style::default().fg(style::PLAYING),
            )));
        } else {
            lines.push(Line::from(""));
        }
        lines.push(Line::from(Span::styled(
            "Enter/click place  a/right-click accent  </> or drag ] resize  t time  m type  c clear",
            Style::default().fg(style::DIM),
        )));
        lines.push(Line::from(Span::styled(
            "p preview  +/- tempo  o chord  r rename  w save  W save as new  Esc close",
            Style::default().fg(style::DIM),
        )));
        frame.render_widget(Paragraph::new(lines).block(block), area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;
    use strumkit_core::dispatch::dispatch_action;
    use strumkit_types::Instrument;

    const AREA: Rect = Rect {
        x: 0,
        y: 0,
        width: 80,
        height: 20,
    };

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    fn editing(kind: PatternKind) -> AppState {
        let mut state = AppState::new(Instrument::Ukulele);
        for action in [EditorAction::OpenNew, EditorAction::SetKind(kind)] {
            dispatch_action(&Action::Editor(action), &mut state, &mut Vec::new());
        }
        state
    }

    fn apply(state: &mut AppState, outcome: PaneOutcome) {
        let actions = match outcome {
            PaneOutcome::Dispatch(a) => vec![a],
            PaneOutcome::Batch(all) => all,
            other => panic!("unexpected outcome {:?}", other),
        };
        for action in actions {
            dispatch_action(&action, state, &mut Vec::new());
        }
    }

    /// Screen position of a step's cell: (column, row).
    fn cell(row: usize, step: usize, offset: u16) -> (u16, u16) {
        (
            1 + LABEL_W + step as u16 * CELL_W + offset,
            1 + HEADER_H + row as u16,
        )
    }

    #[test]
    fn hit_maps_columns_to_steps() {
        let state = editing(PatternKind::Arpeggio);
        let g = GridGeometry::new(AREA, state.editor.as_ref().unwrap());
        let (x, y) = cell(3, 5, 2);
        assert_eq!(g.hit(x, y), Some(GridHit { row: 3, step: 5, offset: 2 }));
        assert_eq!(g.hit(0, y), None);
        let (x, y) = cell(4, 0, 0);
        assert_eq!(g.hit(x, y), None);
    }

    #[test]
    fn top_row_is_highest_string() {
        let state = editing(PatternKind::Arpeggio);
        let editor = state.editor.as_ref().unwrap();
        assert_eq!(lane_for_row(editor, 0), Some(3));
        assert_eq!(lane_for_row(editor, 3), Some(0));
    }

    #[test]
    fn click_places_arpeggio_note_on_lane() {
        let mut state = editing(PatternKind::Arpeggio);
        let mut pane = EditorPane::new();
        let (x, y) = cell(0, 2, 1);
        let outcome = pane.handle_mouse(&mouse(MouseEventKind::Down(MouseButton::Left), x, y), AREA, &state);
        assert_eq!(
            outcome,
            PaneOutcome::Dispatch(Action::Editor(EditorAction::ClickArpeggio { lane: 3, step: 2 }))
        );
        apply(&mut state, outcome);
        assert!(state.editor.as_ref().unwrap().arpeggio_lanes()[3][2].active);
    }

    #[test]
    fn drag_on_handle_resizes() {
        let mut state = editing(PatternKind::Strum);
        let mut pane = EditorPane::new();
        let (x, y) = cell(0, 0, 1);
        let press = pane.handle_mouse(&mouse(MouseEventKind::Down(MouseButton::Left), x, y), AREA, &state);
        apply(&mut state, press);
        apply(&mut state, PaneOutcome::Dispatch(Action::Editor(EditorAction::EndGesture)));

        let (hx, hy) = cell(0, 0, 2);
        let grab = pane.handle_mouse(&mouse(MouseEventKind::Down(MouseButton::Left), hx, hy), AREA, &state);
        assert!(matches!(
            grab,
            PaneOutcome::Dispatch(Action::Editor(EditorAction::BeginResize { lane: None, step: 0, .. }))
        ));
        apply(&mut state, grab);

        let drag = pane.handle_mouse(
            &mouse(MouseEventKind::Drag(MouseButton::Left), hx + 3 * CELL_W, hy),
            AREA,
            &state,
        );
        apply(&mut state, drag);
        let up = pane.handle_mouse(&mouse(MouseEventKind::Up(MouseButton::Left), hx, hy), AREA, &state);
        apply(&mut state, up);

        let editor = state.editor.as_ref().unwrap();
        assert_eq!(editor.strum_cells()[0].kind, StrumKind::Down);
        assert_eq!(editor.strum_cells()[0].duration, 4);
        assert!(!editor.is_resizing());
    }

    #[test]
    fn drag_paints_strum_steps() {
        let mut state = editing(PatternKind::Strum);
        let mut pane = EditorPane::new();
        let (x, y) = cell(0, 0, 1);
        let press = pane.handle_mouse(&mouse(MouseEventKind::Down(MouseButton::Left), x, y), AREA, &state);
        apply(&mut state, press);
        let (x2, _) = cell(0, 1, 1);
        let drag = pane.handle_mouse(&mouse(MouseEventKind::Drag(MouseButton::Left), x2, y), AREA, &state);
        assert_eq!(drag, PaneOutcome::Dispatch(Action::Editor(EditorAction::EnterStrum(1))));
        apply(&mut state, drag);
        assert_eq!(state.editor.as_ref().unwrap().strum_cells()[1].kind, StrumKind::Down);
    }

    #[test]
    fn keyboard_nudge_grows_span() {
        let mut state = editing(PatternKind::Strum);
        let mut pane = EditorPane::new();
        let place = pane.handle_key(&key(KeyCode::Enter), &state);
        apply(&mut state, place);
        let grow = pane.handle_key(&key(KeyCode::Char('>')), &state);
        apply(&mut state, grow);
        assert_eq!(state.editor.as_ref().unwrap().strum_cells()[0].duration, 2);

        pane.handle_key(&key(KeyCode::Right), &state);
        pane.handle_key(&key(KeyCode::Right), &state);
        assert_eq!(pane.handle_key(&key(KeyCode::Char('>')), &state), PaneOutcome::Consumed);
    }

    #[test]
    fn keys_map_to_editor_actions() {
        let state = editing(PatternKind::Strum);
        let mut pane = EditorPane::new();
        assert_eq!(
            pane.handle_key(&key(KeyCode::Char('p')), &state),
            PaneOutcome::Dispatch(Action::Editor(EditorAction::TogglePreview))
        );
        assert_eq!(
            pane.handle_key(&key(KeyCode::Char('W')), &state),
            PaneOutcome::Dispatch(Action::Editor(EditorAction::Save { as_new: true }))
        );
        assert_eq!(
            pane.handle_key(&key(KeyCode::Char('r')), &state),
            PaneOutcome::Prompt(PromptKind::RenamePattern)
        );
        assert_eq!(
            pane.handle_key(&key(KeyCode::Esc), &state),
            PaneOutcome::Dispatch(Action::Editor(EditorAction::Close))
        );
    }
}
