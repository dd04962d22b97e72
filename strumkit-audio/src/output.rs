//! Audio output trait: what the scheduler asks of the sound engine.
//!
//! `AudioOutput` names the playback primitives (strum, note group, mute,
//! silence) independently of how they are rendered. The cpal engine
//! implements it for real output; `TestOutput` records calls so scheduling
//! can be tested without a sound card.
//!
//! Triggers never fail from the caller's point of view: before the output
//! is ready they do nothing.

use std::sync::Mutex;

use strumkit_types::{Pitch, StrumKind};

/// Lifecycle of the shared output context and instrument voice.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OutputState {
    #[default]
    Uninitialized,
    Loading,
    Ready,
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrumDirection {
    /// Lowest string first.
    Down,
    /// Highest string first.
    Up,
}

impl StrumDirection {
    pub fn from_kind(kind: StrumKind) -> Option<Self> {
        match kind {
            StrumKind::Down => Some(StrumDirection::Down),
            StrumKind::Up => Some(StrumDirection::Up),
            StrumKind::Rest | StrumKind::Mute => None,
        }
    }
}

/// One note of a simultaneous group.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteEvent {
    pub pitch: Pitch,
    pub accented: bool,
    pub duration_secs: f64,
}

pub trait AudioOutput: Send + Sync {
    /// Start acquiring the output device and loading the voice. Returns
    /// immediately; repeated calls while loading or ready do nothing.
    fn initialize(&self);

    fn state(&self) -> OutputState;

    fn is_ready(&self) -> bool {
        self.state() == OutputState::Ready
    }

    fn is_loading(&self) -> bool {
        self.state() == OutputState::Loading
    }

    /// Resume a suspended output. No-op when already running.
    fn resume(&self) {}

    /// Output clock in seconds.
    fn current_time(&self) -> f64;

    fn trigger_strum(
        &self,
        pitches: &[Pitch],
        direction: StrumDirection,
        duration_secs: f64,
        accented: bool,
        at: f64,
    );

    fn trigger_notes(&self, notes: &[NoteEvent], at: f64);

    fn trigger_mute(&self, duration_secs: f64, at: f64);

    /// Silence every sounding voice and forget them.
    fn stop_all(&self);
}

// ─── Test Output ────────────────────────────────────────────────────

/// A call recorded by `TestOutput`.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputOp {
    Initialize,
    Resume,
    Strum {
        pitches: Vec<Pitch>,
        direction: StrumDirection,
        duration_secs: f64,
        accented: bool,
        at: f64,
    },
    Notes {
        notes: Vec<NoteEvent>,
        at: f64,
    },
    Mute {
        duration_secs: f64,
        at: f64,
    },
    StopAll,
}

impl OutputOp {
    pub fn is_trigger(&self) -> bool {
        matches!(
            self,
            OutputOp::Strum { .. } | OutputOp::Notes { .. } | OutputOp::Mute { .. }
        )
    }

    pub fn at(&self) -> Option<f64> {
        match self {
            OutputOp::Strum { at, .. } | OutputOp::Notes { at, .. } | OutputOp::Mute { at, .. } => {
                Some(*at)
            }
            _ => None,
        }
    }
}

/// Records every call. The clock only moves through `set_time`/`advance`.
pub struct TestOutput {
    ops: Mutex<Vec<OutputOp>>,
    time: Mutex<f64>,
    state: Mutex<OutputState>,
    init_outcome: OutputState,
}

impl TestOutput {
    /// Already initialized.
    pub fn new() -> Self {
        Self::with_state(OutputState::Ready, OutputState::Ready)
    }

    /// Becomes ready on the first `initialize()`.
    pub fn uninitialized() -> Self {
        Self::with_state(OutputState::Uninitialized, OutputState::Ready)
    }

    /// `initialize()` fails with the given message.
    pub fn failing(message: &str) -> Self {
        Self::with_state(
            OutputState::Uninitialized,
            OutputState::Failed(message.to_string()),
        )
    }

    /// `initialize()` stays in the loading state until `finish_loading`.
    pub fn slow() -> Self {
        Self::with_state(OutputState::Uninitialized, OutputState::Loading)
    }

    fn with_state(state: OutputState, init_outcome: OutputState) -> Self {
        Self {
            ops: Mutex::new(Vec::new()),
            time: Mutex::new(0.0),
            state: Mutex::new(state),
            init_outcome,
        }
    }

    pub fn finish_loading(&self) {
        *self.state.lock().unwrap() = OutputState::Ready;
    }

    pub fn set_time(&self, secs: f64) {
        *self.time.lock().unwrap() = secs;
    }

    pub fn advance(&self, secs: f64) {
        *self.time.lock().unwrap() += secs;
    }

    pub fn operations(&self) -> Vec<OutputOp> {
        self.ops.lock().unwrap().clone()
    }

    /// Only strum, note-group and mute calls.
    pub fn triggers(&self) -> Vec<OutputOp> {
        self.ops
            .lock()
            .unwrap()
            .iter()
            .filter(|op| op.is_trigger())
            .cloned()
            .collect()
    }

    pub fn count<F: Fn(&OutputOp) -> bool>(&self, f: F) -> usize {
        self.ops.lock().unwrap().iter().filter(|op| f(op)).count()
    }

    pub fn clear(&self) {
        self.ops.lock().unwrap().clear();
    }

    fn record(&self, op: OutputOp) {
        self.ops.lock().unwrap().push(op);
    }
}

impl Default for TestOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioOutput for TestOutput {
    fn initialize(&self) {
        let mut state = self.state.lock().unwrap();
        if matches!(*state, OutputState::Ready | OutputState::Loading) {
            return;
        }
        self.record(OutputOp::Initialize);
        *state = self.init_outcome.clone();
    }

    fn state(&self) -> OutputState {
        self.state.lock().unwrap().clone()
    }

    fn resume(&self) {
        self.record(OutputOp::Resume);
    }

    fn current_time(&self) -> f64 {
        *self.time.lock().unwrap()
    }

    fn trigger_strum(
        &self,
        pitches: &[Pitch],
        direction: StrumDirection,
        duration_secs: f64,
        accented: bool,
        at: f64,
    ) {
        if !self.is_ready() {
            return;
        }
        self.record(OutputOp::Strum {
            pitches: pitches.to_vec(),
            direction,
            duration_secs,
            accented,
            at,
        });
    }

    fn trigger_notes(&self, notes: &[NoteEvent], at: f64) {
        if !self.is_ready() {
            return;
        }
        self.record(OutputOp::Notes {
            notes: notes.to_vec(),
            at,
        });
    }

    fn trigger_mute(&self, duration_secs: f64, at: f64) {
        if !self.is_ready() {
            return;
        }
        self.record(OutputOp::Mute { duration_secs, at });
    }

    fn stop_all(&self) {
        self.record(OutputOp::StopAll);
    }
}
