//! Actions the UI can dispatch, and what dispatch reports back.

use std::path::PathBuf;

use strumkit_types::{Instrument, PatternKind, TimeSignature};

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Quit,
    /// Start the practice set, or stop it if running.
    TogglePlayback,
    Stop,
    SetBpm(u16),
    AdjustBpm(i32),
    SelectPattern(String),
    CyclePattern(isize),
    DeletePattern(String),
    SwitchInstrument(Instrument),
    Chords(ChordAction),
    Practice(PracticeAction),
    Editor(EditorAction),
    Export(PathBuf),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChordAction {
    SetSearch(String),
    Import(PathBuf),
}

#[derive(Debug, Clone, PartialEq)]
pub enum PracticeAction {
    /// Add or remove one voicing of a chord in the library.
    ToggleVoicing { chord: String, diagram: usize },
    Remove(String),
    Clear,
    MoveUp(usize),
    MoveDown(usize),
    SaveSet(String),
    LoadSet(String),
    DeleteSet(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum EditorAction {
    OpenNew,
    /// Open a preset (as a copy) or custom pattern.
    Open(String),
    Close,
    SetName(String),
    SetTimeSignature(TimeSignature),
    SetKind(PatternKind),
    Clear,
    PressStrum(usize),
    EnterStrum(usize),
    RightClickStrum(usize),
    ClickArpeggio { lane: usize, step: usize },
    RightClickArpeggio { lane: usize, step: usize },
    /// `lane` is `None` for the strum lane.
    BeginResize {
        lane: Option<usize>,
        step: usize,
        x: f64,
        cell_width: f64,
    },
    DragResize(f64),
    EndGesture,
    SetPreviewChord(String),
    AdjustPreviewBpm(i32),
    TogglePreview,
    Save { as_new: bool },
}

impl EditorAction {
    /// Actions that change the grid shape or cells. A running preview is
    /// stopped before these apply.
    pub fn edits_grid(&self) -> bool {
        matches!(
            self,
            EditorAction::SetTimeSignature(_)
                | EditorAction::SetKind(_)
                | EditorAction::Clear
                | EditorAction::PressStrum(_)
                | EditorAction::EnterStrum(_)
                | EditorAction::RightClickStrum(_)
                | EditorAction::ClickArpeggio { .. }
                | EditorAction::RightClickArpeggio { .. }
                | EditorAction::BeginResize { .. }
                | EditorAction::DragResize(_)
                | EditorAction::SetPreviewChord(_)
                | EditorAction::AdjustPreviewBpm(_)
        )
    }
}

/// Which stored documents changed and need writing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistDirty {
    pub custom_patterns: bool,
    pub saved_sets: bool,
}

impl PersistDirty {
    pub fn any(&self) -> bool {
        self.custom_patterns || self.saved_sets
    }
}

/// How prominently a status message is shown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Severity {
    #[default]
    Info,
    Error,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DispatchResult {
    pub quit: bool,
    pub dirty: PersistDirty,
    /// One-line message for the status bar.
    pub status: Option<String>,
    pub severity: Severity,
}

impl DispatchResult {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_quit() -> Self {
        Self {
            quit: true,
            ..Self::default()
        }
    }

    pub fn with_status(message: impl Into<String>) -> Self {
        Self {
            status: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn with_error(message: impl Into<String>) -> Self {
        Self {
            status: Some(message.into()),
            severity: Severity::Error,
            ..Self::default()
        }
    }

    pub fn patterns_changed(mut self) -> Self {
        self.dirty.custom_patterns = true;
        self
    }

    pub fn sets_changed(mut self) -> Self {
        self.dirty.saved_sets = true;
        self
    }
}
