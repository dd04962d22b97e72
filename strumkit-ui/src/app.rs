use std::io;
use std::time::Duration;

use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers, MouseEvent};
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use strumkit_core::persistence::Storage;
use strumkit_core::transport::Transport;

use crate::action::{Action, EditorAction};
use crate::dispatch::{apply_side_effects, dispatch_action, persist};
use crate::panes::{ChordsPane, EditorPane, PracticePane, PromptKind, PromptPane, PromptResult};
use crate::state::AppState;
use crate::ui::layout_helpers::{contains, screen_layout, split_body};
use crate::ui::{style, Pane, PaneOutcome, RatatuiBackend, StatusBar, StatusLevel};

const FRAME_INTERVAL: Duration = Duration::from_millis(16);
const BPM_STEP: i32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Chords,
    Practice,
}

/// Screen areas from the last frame, for mouse routing.
#[derive(Debug, Clone, Copy, Default)]
struct PaneAreas {
    chords: Rect,
    practice: Rect,
    editor: Rect,
}

pub struct App {
    state: AppState,
    transport: Transport,
    storage: Option<Storage>,
    chords: ChordsPane,
    practice: PracticePane,
    editor: EditorPane,
    focus: Focus,
    prompt: Option<PromptPane>,
    status: StatusBar,
    areas: PaneAreas,
    quit: bool,
}

impl App {
    pub fn new(state: AppState, transport: Transport, storage: Option<Storage>) -> Self {
        let mut app = Self {
            state,
            transport,
            storage,
            chords: ChordsPane::new(),
            practice: PracticePane::new(),
            editor: EditorPane::new(),
            focus: Focus::Chords,
            prompt: None,
            status: StatusBar::new(),
            areas: PaneAreas::default(),
            quit: false,
        };
        app.take_state_status();
        app
    }

    pub fn run(&mut self, backend: &mut RatatuiBackend) -> io::Result<()> {
        while !self.should_quit() {
            if let Some(event) = backend.poll_event(FRAME_INTERVAL)? {
                self.handle_event(event);
            }
            self.pump_feedback();
            backend.draw(|frame| self.render(frame))?;
        }
        log::info!(target: "app", "shutting down");
        Ok(())
    }

    pub fn handle_event(&mut self, event: Event) {
        let outcome = match event {
            Event::Key(key) => self.route_key(&key),
            Event::Mouse(mouse) => self.route_mouse(&mouse),
            _ => PaneOutcome::Ignored,
        };
        self.apply_outcome(outcome);
    }

    fn route_key(&mut self, key: &KeyEvent) -> PaneOutcome {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return PaneOutcome::Dispatch(Action::Quit);
        }
        if let Some(prompt) = self.prompt.as_mut() {
            return match prompt.handle_key(key) {
                PromptResult::Editing => PaneOutcome::Consumed,
                PromptResult::Cancelled => {
                    self.prompt = None;
                    PaneOutcome::Consumed
                }
                PromptResult::Submitted(action) => {
                    self.prompt = None;
                    action.map(PaneOutcome::Dispatch).unwrap_or(PaneOutcome::Consumed)
                }
            };
        }

        let outcome = if self.state.is_editing() {
            self.editor.handle_key(key, &self.state)
        } else {
            match self.focus {
                Focus::Chords => self.chords.handle_key(key, &self.state),
                Focus::Practice => self.practice.handle_key(key, &self.state),
            }
        };
        match outcome {
            PaneOutcome::Ignored => self.global_key(key),
            other => other,
        }
    }

    fn global_key(&mut self, key: &KeyEvent) -> PaneOutcome {
        let dispatch = PaneOutcome::Dispatch;
        match key.code {
            KeyCode::Char('q') => dispatch(Action::Quit),
            KeyCode::Char(' ') => dispatch(Action::TogglePlayback),
            KeyCode::Char('s') => dispatch(Action::Stop),
            KeyCode::Char('+') | KeyCode::Char('=') => dispatch(Action::AdjustBpm(BPM_STEP)),
            KeyCode::Char('-') => dispatch(Action::AdjustBpm(-BPM_STEP)),
            KeyCode::Char(']') => dispatch(Action::CyclePattern(1)),
            KeyCode::Char('[') => dispatch(Action::CyclePattern(-1)),
            KeyCode::Char('D') => {
                dispatch(Action::DeletePattern(self.state.patterns.active_id().to_string()))
            }
            KeyCode::Char('i') => dispatch(Action::SwitchInstrument(self.state.instrument.toggle())),
            KeyCode::Char('e') => dispatch(Action::Editor(EditorAction::Open(
                self.state.patterns.active_id().to_string(),
            ))),
            KeyCode::Char('n') => dispatch(Action::Editor(EditorAction::OpenNew)),
            KeyCode::Char('E') => PaneOutcome::Prompt(PromptKind::Export),
            KeyCode::Char('I') => PaneOutcome::Prompt(PromptKind::ImportChords),
            KeyCode::Tab => {
                self.focus = match self.focus {
                    Focus::Chords => Focus::Practice,
                    Focus::Practice => Focus::Chords,
                };
                PaneOutcome::Consumed
            }
            _ => PaneOutcome::Ignored,
        }
    }

    fn route_mouse(&mut self, mouse: &MouseEvent) -> PaneOutcome {
        if self.prompt.is_some() {
            return PaneOutcome::Consumed;
        }
        if self.state.is_editing() {
            return self.editor.handle_mouse(mouse, self.areas.editor, &self.state);
        }
        if contains(self.areas.chords, mouse.column, mouse.row) {
            self.focus = Focus::Chords;
            self.chords.handle_mouse(mouse, self.areas.chords, &self.state)
        } else if contains(self.areas.practice, mouse.column, mouse.row) {
            self.focus = Focus::Practice;
            self.practice.handle_mouse(mouse, self.areas.practice, &self.state)
        } else {
            PaneOutcome::Ignored
        }
    }

    fn apply_outcome(&mut self, outcome: PaneOutcome) {
        match outcome {
            PaneOutcome::Ignored | PaneOutcome::Consumed => {}
            PaneOutcome::Dispatch(action) => self.dispatch(&action),
            PaneOutcome::Batch(actions) => {
                for action in &actions {
                    self.dispatch(action);
                }
            }
            PaneOutcome::Prompt(kind) => {
                let initial = match (kind, self.state.editor.as_ref()) {
                    (PromptKind::RenamePattern, Some(editor)) => editor.name().to_string(),
                    (PromptKind::PreviewChord, Some(editor)) => editor.preview_chord().to_string(),
                    _ => String::new(),
                };
                self.prompt = Some(PromptPane::open(kind, &initial));
            }
        }
    }

    fn dispatch(&mut self, action: &Action) {
        log::debug!(target: "app", "dispatch {:?}", action);
        let mut effects = Vec::new();
        let result = dispatch_action(action, &mut self.state, &mut effects);
        apply_side_effects(&effects, &self.transport);

        if result.dirty.any() {
            if let Some(storage) = self.storage.as_ref() {
                if let Some(failure) = persist(storage, &self.state, result.dirty) {
                    self.status.push(failure, StatusLevel::Error);
                }
            }
        }
        if let Some(message) = result.status {
            self.status.push(message, result.severity.into());
        }
        self.take_state_status();
        if result.quit {
            self.quit = true;
        }
    }

    fn take_state_status(&mut self) {
        if let Some((message, severity)) = self.state.take_status() {
            self.status.push(message, severity.into());
        }
    }

    fn pump_feedback(&mut self) {
        let player = self.transport.main().drain_feedback();
        let preview = self.transport.preview().drain_feedback();
        if player.is_empty() && preview.is_empty() {
            return;
        }
        self.state.apply_feedback(player, preview);
        self.take_state_status();
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }

    fn render(&mut self, frame: &mut Frame) {
        let layout = screen_layout(frame.area());
        frame.render_widget(Paragraph::new(self.transport_line()), layout.transport);

        if self.state.is_editing() {
            self.areas.editor = layout.body;
            self.editor.render(frame, layout.body, true, &self.state);
        } else {
            let (left, right) = split_body(layout.body);
            self.areas.chords = left;
            self.areas.practice = right;
            self.chords
                .render(frame, left, self.focus == Focus::Chords, &self.state);
            self.practice
                .render(frame, right, self.focus == Focus::Practice, &self.state);
        }

        frame.render_widget(Paragraph::new(self.status_line()), layout.status);
        if let Some(prompt) = self.prompt.as_ref() {
            prompt.render(frame, frame.area());
        }
    }

    fn transport_line(&self) -> Line<'static> {
        let pattern = self.state.patterns.active();
        let (label, color) = if self.state.player.loading {
            ("LOADING", style::ACCENT)
        } else if self.state.player.active {
            ("PLAYING", style::PLAYING)
        } else {
            ("STOPPED", style::DIM)
        };
        Line::from(vec![
            Span::styled(
                format!(" {} ", label),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!(" {} bpm ", self.state.patterns.bpm()), style::title()),
            Span::raw(format!(
                " {} ({}, {}) ",
                pattern.name,
                pattern.time_signature.label(),
                pattern.kind().name()
            )),
            Span::styled(
                format!(" {} ", self.state.instrument.name()),
                Style::default().fg(style::DIM),
            ),
        ])
    }

    fn status_line(&self) -> Line<'static> {
        match self.status.current() {
            Some(message) => {
                let color = match message.level {
                    StatusLevel::Info => style::TEXT,
                    StatusLevel::Error => style::MUTED,
                };
                Line::from(Span::styled(format!(" {}", message.text), Style::default().fg(color)))
            }
            None => Line::from(Span::styled(
                " space play  s stop  +/- tempo  [/] pattern  e edit  n new  i instrument  E export  I import  Tab focus  q quit",
                Style::default().fg(style::DIM),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use strumkit_audio::{SchedulerTiming, TestOutput};
    use strumkit_types::Instrument;

    use crate::action::ChordAction;

    fn app() -> App {
        let transport =
            Transport::new(Arc::new(TestOutput::new()), SchedulerTiming::default()).unwrap();
        App::new(AppState::new(Instrument::Ukulele), transport, None)
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_event(Event::Key(KeyEvent::new(code, KeyModifiers::NONE)));
    }

    #[test]
    fn quit_key_stops_the_loop() {
        let mut app = app();
        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit());
    }

    #[test]
    fn empty_set_refuses_to_play() {
        let mut app = app();
        press(&mut app, KeyCode::Char(' '));
        assert!(!app.state.player.is_busy());
        assert_eq!(
            app.status.current().map(|m| m.text.clone()),
            Some("Add chords to the practice set first".to_string())
        );
        assert_eq!(app.status.current().map(|m| m.level), Some(StatusLevel::Info));
    }

    #[test]
    fn failed_import_shows_as_error() {
        let mut app = app();
        let dir = tempfile::tempdir().unwrap();
        app.dispatch(&Action::Chords(ChordAction::Import(dir.path().join("missing.json"))));
        let current = app.status.current().unwrap();
        assert!(current.text.starts_with("Import failed"));
        assert_eq!(current.level, StatusLevel::Error);
    }

    #[test]
    fn tempo_keys_adjust_bpm() {
        let mut app = app();
        let before = app.state.patterns.bpm();
        press(&mut app, KeyCode::Char('+'));
        assert_eq!(app.state.patterns.bpm(), before + BPM_STEP as u16);
    }

    #[test]
    fn prompt_takes_keys_until_closed() {
        let mut app = app();
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Char('S'));
        assert!(app.prompt.is_some());
        press(&mut app, KeyCode::Char('q'));
        assert!(!app.should_quit());
        press(&mut app, KeyCode::Esc);
        assert!(app.prompt.is_none());
    }

    #[test]
    fn editor_takes_keys_while_open() {
        let mut app = app();
        press(&mut app, KeyCode::Char('n'));
        assert!(app.state.is_editing());
        press(&mut app, KeyCode::Char('r'));
        assert_eq!(app.prompt.as_ref().map(|p| p.text().to_string()), Some("New Pattern".into()));
        press(&mut app, KeyCode::Esc);
        press(&mut app, KeyCode::Esc);
        assert!(!app.state.is_editing());
    }
}
