//! Application state shared by dispatch and the UI.

use strumkit_audio::{ChordSource, Highlight, PlaybackFeedback, PlaybackRequest, ScheduledChord};
use strumkit_types::{Instrument, PracticeSetItem};

use crate::action::Severity;
use crate::chords::ChordLibrary;
use crate::config::Config;
use crate::editor::EditorSession;
use crate::patterns::PatternStore;
use crate::persistence::StoredData;
use crate::practice::{PracticeSet, SavedSets};

/// What the UI knows about one playback session, built from feedback.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaybackView {
    pub active: bool,
    /// Play was requested and the voice is still loading.
    pub loading: bool,
    pub epoch: u64,
    pub highlight: Option<Highlight>,
}

impl PlaybackView {
    /// Fold one feedback message in. Returns a message for the status bar
    /// when the session could not start.
    pub fn apply(&mut self, feedback: PlaybackFeedback) -> Option<String> {
        match feedback {
            PlaybackFeedback::Started { epoch } => {
                self.active = true;
                self.loading = false;
                self.epoch = epoch;
                self.highlight = None;
                None
            }
            PlaybackFeedback::Highlight(h) => {
                if self.active && h.epoch == self.epoch {
                    self.highlight = Some(h);
                }
                None
            }
            PlaybackFeedback::Stopped { epoch } => {
                if epoch == self.epoch {
                    self.clear();
                }
                None
            }
            PlaybackFeedback::AudioLoading => {
                self.loading = true;
                Some("Loading instrument...".to_string())
            }
            PlaybackFeedback::AudioUnavailable(reason) => {
                self.clear();
                Some(format!("Audio unavailable: {}", reason))
            }
            PlaybackFeedback::NothingToPlay => {
                self.clear();
                Some("Nothing to play".to_string())
            }
        }
    }

    /// Back to idle: no highlight, progress hidden.
    pub fn clear(&mut self) {
        self.active = false;
        self.loading = false;
        self.highlight = None;
    }

    /// Playhead position, `None` while stopped.
    pub fn progress(&self) -> Option<f64> {
        if !self.active {
            return None;
        }
        self.highlight.as_ref().map(Highlight::progress)
    }

    /// Whether play/stop should read as "stop". Covers the wait for the
    /// voice to load.
    pub fn is_busy(&self) -> bool {
        self.active || self.loading
    }
}

pub struct AppState {
    pub instrument: Instrument,
    pub library: ChordLibrary,
    pub practice: PracticeSet,
    pub saved_sets: SavedSets,
    pub patterns: PatternStore,
    pub editor: Option<EditorSession>,
    pub player: PlaybackView,
    pub preview: PlaybackView,
    /// Latest status message, until the UI takes it.
    status: Option<(String, Severity)>,
}

impl AppState {
    pub fn new(instrument: Instrument) -> Self {
        Self {
            instrument,
            library: ChordLibrary::new(instrument),
            practice: PracticeSet::new(),
            saved_sets: SavedSets::new(),
            patterns: PatternStore::new(),
            editor: None,
            player: PlaybackView::default(),
            preview: PlaybackView::default(),
            status: None,
        }
    }

    /// Start-up state from the config: instrument, tempo, pattern and any
    /// extra chord files.
    pub fn from_config(config: &Config) -> Self {
        let mut state = Self::new(config.instrument());
        state.patterns.set_bpm(config.bpm());
        state.select_default_pattern(config);

        let mut summaries = Vec::new();
        let mut severity = Severity::Info;
        for path in config.chord_files() {
            match state.library.import_file(path) {
                Ok(report) => summaries.push(report.summary()),
                Err(e) => {
                    log::warn!(target: "ingest", "{}", e);
                    summaries.push(format!("Import failed: {}", e));
                    severity = Severity::Error;
                }
            }
        }
        if !summaries.is_empty() {
            state.set_status(summaries.join("; "), severity);
        }
        state
    }

    fn select_default_pattern(&mut self, config: &Config) {
        if let Some(id) = config.default_pattern_id() {
            if !self.patterns.set_active(id) {
                log::warn!(target: "config", "unknown default pattern '{}'", id);
            }
        }
    }

    /// Take in stored patterns and sets. Tempo and the selected pattern
    /// survive when the selection still exists.
    pub fn restore(&mut self, data: StoredData) {
        let active = self.patterns.active_id().to_string();
        let bpm = self.patterns.bpm();
        self.patterns = PatternStore::with_custom(data.custom_patterns);
        self.patterns.set_bpm(bpm);
        self.patterns.set_active(&active);
        self.saved_sets = SavedSets::from_sets(data.saved_sets);
        if !data.practice_set.is_empty() {
            self.practice.replace(data.practice_set);
        }
    }

    /// Change instrument. The practice set and chord imports are tied to the
    /// old instrument and are dropped.
    pub fn switch_instrument(&mut self, instrument: Instrument) -> bool {
        if instrument == self.instrument {
            return false;
        }
        self.instrument = instrument;
        self.library.switch_instrument(instrument);
        self.practice.clear();
        log::info!(target: "editor", "switched to {}", instrument.name());
        true
    }

    /// Practice set over the active pattern and tempo.
    pub fn playback_request(&self) -> PlaybackRequest {
        PlaybackRequest {
            source: ChordSource::from_practice_set(self.practice.items(), self.instrument),
            pattern: self.patterns.active().clone(),
            bpm: self.patterns.bpm(),
        }
    }

    /// First voicing of the editor's preview chord, resolved.
    pub fn preview_chord(&self) -> Option<ScheduledChord> {
        let editor = self.editor.as_ref()?;
        let group = self.library.get(editor.preview_chord())?;
        let diagram = group.diagrams.first()?;
        let item = PracticeSetItem::new(&group.name, diagram.clone());
        match ScheduledChord::from_item(&item, self.instrument) {
            Ok(chord) => Some(chord),
            Err(e) => {
                log::warn!(target: "editor", "cannot preview {}: {}", group.name, e);
                None
            }
        }
    }

    /// The editor's grid over the preview chord at the preview tempo.
    pub fn preview_request(&self) -> Option<PlaybackRequest> {
        let editor = self.editor.as_ref()?;
        Some(PlaybackRequest {
            source: ChordSource::Preview(self.preview_chord()?),
            pattern: editor.preview_pattern(),
            bpm: editor.preview_bpm(),
        })
    }

    pub fn is_editing(&self) -> bool {
        self.editor.is_some()
    }

    pub fn set_status(&mut self, message: impl Into<String>, severity: Severity) {
        self.status = Some((message.into(), severity));
    }

    pub fn take_status(&mut self) -> Option<(String, Severity)> {
        self.status.take()
    }

    /// Feed player and preview feedback into their views.
    pub fn apply_feedback(
        &mut self,
        player: Vec<PlaybackFeedback>,
        preview: Vec<PlaybackFeedback>,
    ) {
        for feedback in player {
            let severity = feedback_severity(&feedback);
            if let Some(message) = self.player.apply(feedback) {
                self.status = Some((message, severity));
            }
        }
        for feedback in preview {
            let severity = feedback_severity(&feedback);
            if let Some(message) = self.preview.apply(feedback) {
                self.status = Some((message, severity));
            }
        }
    }
}

fn feedback_severity(feedback: &PlaybackFeedback) -> Severity {
    match feedback {
        PlaybackFeedback::AudioUnavailable(_) => Severity::Error,
        _ => Severity::Info,
    }
}
