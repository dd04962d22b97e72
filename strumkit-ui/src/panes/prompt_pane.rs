use std::path::PathBuf;

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;

use strumkit_core::export::EXPORT_FILE_NAME;

use crate::action::{Action, ChordAction, EditorAction, PracticeAction};
use crate::ui::layout_helpers::center_rect;
use crate::ui::style;

/// What the entered text is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    SaveSet,
    LoadSet,
    DeleteSet,
    ImportChords,
    Export,
    RenamePattern,
    PreviewChord,
}

impl PromptKind {
    pub fn title(self) -> &'static str {
        match self {
            PromptKind::SaveSet => " Save set as ",
            PromptKind::LoadSet => " Load set ",
            PromptKind::DeleteSet => " Delete set ",
            PromptKind::ImportChords => " Import chords from ",
            PromptKind::Export => " Export to ",
            PromptKind::RenamePattern => " Pattern name ",
            PromptKind::PreviewChord => " Preview chord ",
        }
    }

    fn action(self, text: &str) -> Option<Action> {
        let text = text.trim();
        if text.is_empty() && self != PromptKind::SaveSet {
            return None;
        }
        Some(match self {
            PromptKind::SaveSet => Action::Practice(PracticeAction::SaveSet(text.to_string())),
            PromptKind::LoadSet => Action::Practice(PracticeAction::LoadSet(text.to_string())),
            PromptKind::DeleteSet => Action::Practice(PracticeAction::DeleteSet(text.to_string())),
            PromptKind::ImportChords => Action::Chords(ChordAction::Import(PathBuf::from(text))),
            PromptKind::Export => Action::Export(PathBuf::from(text)),
            PromptKind::RenamePattern => Action::Editor(EditorAction::SetName(text.to_string())),
            PromptKind::PreviewChord => {
                Action::Editor(EditorAction::SetPreviewChord(text.to_string()))
            }
        })
    }
}

/// Result of a key press in the prompt.
#[derive(Debug, Clone, PartialEq)]
pub enum PromptResult {
    Editing,
    Cancelled,
    Submitted(Option<Action>),
}

/// One-line text input shown over the screen.
pub struct PromptPane {
    kind: PromptKind,
    text: String,
}

impl PromptPane {
    /// Start a prompt, pre-filled where a sensible default exists.
    pub fn open(kind: PromptKind, initial: &str) -> Self {
        let text = if initial.is_empty() && kind == PromptKind::Export {
            EXPORT_FILE_NAME.to_string()
        } else {
            initial.to_string()
        };
        Self { kind, text }
    }

    pub fn kind(&self) -> PromptKind {
        self.kind
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn handle_key(&mut self, key: &KeyEvent) -> PromptResult {
        match key.code {
            KeyCode::Esc => PromptResult::Cancelled,
            KeyCode::Enter => PromptResult::Submitted(self.kind.action(&self.text)),
            KeyCode::Backspace => {
                self.text.pop();
                PromptResult::Editing
            }
            KeyCode::Char(c) => {
                self.text.push(c);
                PromptResult::Editing
            }
            _ => PromptResult::Editing,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let rect = center_rect(area, 50, 3);
        let block = Block::default()
            .borders(Borders::ALL)
            .title(self.kind.title())
            .border_style(style::border(true));
        let line = Line::from(vec![
            Span::raw(self.text.as_str()),
            Span::styled("_", style::selected()),
        ]);
        frame.render_widget(Clear, rect);
        frame.render_widget(Paragraph::new(line).block(block), rect);
    }
}
