//! Lookahead step scheduler.
//!
//! One `Scheduler` drives either a practice sequence or a single-chord
//! preview; the two differ only in their [`ChordSource`]. The scheduler is
//! passive: its owner calls [`Scheduler::tick`] every few milliseconds and
//! collects due highlights with [`Scheduler::take_due`]. Each tick schedules
//! every step whose start falls inside the lookahead window against the
//! output clock, so timing depends on the audio clock and not on how
//! punctually the owner ticks.
//!
//! Step `n` of a session always starts at `origin + n * step_duration`; the
//! position is never accumulated, so long sessions do not drift.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use strumkit_types::tuning::{self, order};
use strumkit_types::{
    sanitize_bpm, Instrument, PatternGrid, Pitch, PracticeSetItem, ResolveError, RhythmPattern,
    StrumKind,
};

use crate::output::{AudioOutput, NoteEvent, StrumDirection};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SchedulerTiming {
    /// How far past the output clock steps are scheduled.
    pub lookahead_secs: f64,
    /// Delay between start and the first step.
    pub start_delay_secs: f64,
    /// How often the owner should call `tick`.
    pub tick_interval: Duration,
}

impl Default for SchedulerTiming {
    fn default() -> Self {
        Self {
            lookahead_secs: 0.1,
            start_delay_secs: 0.1,
            tick_interval: Duration::from_millis(25),
        }
    }
}

/// A chord with its pitches resolved, one slot per string, lowest first.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledChord {
    pub id: String,
    pub label: String,
    pub pitches: Vec<Option<Pitch>>,
}

impl ScheduledChord {
    pub fn from_item(item: &PracticeSetItem, instrument: Instrument) -> Result<Self, ResolveError> {
        Ok(Self {
            id: item.id.clone(),
            label: item.chord_name.clone(),
            pitches: tuning::resolve_diagram(&item.diagram, instrument)?,
        })
    }
}

/// Which chord sounds at each measure.
#[derive(Debug, Clone, PartialEq)]
pub enum ChordSource {
    /// Advance through the chords one measure each, wrapping.
    Sequence(Vec<ScheduledChord>),
    /// Repeat one chord.
    Preview(ScheduledChord),
}

impl ChordSource {
    /// Resolve a practice set. Items that do not fit the instrument are
    /// skipped with a warning.
    pub fn from_practice_set(items: &[PracticeSetItem], instrument: Instrument) -> Self {
        let chords = items
            .iter()
            .filter_map(|item| match ScheduledChord::from_item(item, instrument) {
                Ok(chord) => Some(chord),
                Err(e) => {
                    log::warn!(target: "playback", "skipping {}: {}", item.chord_name, e);
                    None
                }
            })
            .collect();
        ChordSource::Sequence(chords)
    }

    pub fn chord_at(&self, position: usize) -> Option<&ScheduledChord> {
        match self {
            ChordSource::Sequence(chords) => chords.get(position),
            ChordSource::Preview(chord) => Some(chord),
        }
    }

    /// Position after a measure wraps.
    pub fn next_position(&self, position: usize) -> usize {
        match self {
            ChordSource::Sequence(chords) if !chords.is_empty() => (position + 1) % chords.len(),
            _ => 0,
        }
    }

    pub fn is_playable(&self) -> bool {
        match self {
            ChordSource::Sequence(chords) => !chords.is_empty(),
            ChordSource::Preview(_) => true,
        }
    }
}

/// Everything a session needs. Fixed for the life of the session.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackRequest {
    pub source: ChordSource,
    pub pattern: RhythmPattern,
    pub bpm: u16,
}

/// What one step asks of the output.
#[derive(Debug, Clone, PartialEq)]
pub enum StepEvent {
    Silent,
    Strum {
        pitches: Vec<Pitch>,
        direction: StrumDirection,
        duration_secs: f64,
        accented: bool,
    },
    Mute {
        duration_secs: f64,
    },
    Notes(Vec<NoteEvent>),
}

/// Work out the sound for `step` of `pattern` over `chord`.
///
/// Only span starts produce sound; continuation steps are placeholders.
pub fn events_for_step(
    pattern: &RhythmPattern,
    chord: &ScheduledChord,
    step: usize,
    step_duration: f64,
) -> StepEvent {
    match &pattern.grid {
        PatternGrid::Strum(cells) => {
            let Some(cell) = cells.get(step) else {
                return StepEvent::Silent;
            };
            let duration_secs = step_duration * cell.duration.max(1) as f64;
            match cell.kind {
                StrumKind::Rest => StepEvent::Silent,
                StrumKind::Mute => StepEvent::Mute { duration_secs },
                StrumKind::Down | StrumKind::Up => {
                    let direction = match cell.kind {
                        StrumKind::Up => StrumDirection::Up,
                        _ => StrumDirection::Down,
                    };
                    StepEvent::Strum {
                        pitches: tuning::sounding(&chord.pitches),
                        direction,
                        duration_secs,
                        accented: cell.accented,
                    }
                }
            }
        }
        PatternGrid::Arpeggio(lanes) => {
            let notes: Vec<NoteEvent> = lanes
                .iter()
                .enumerate()
                .filter_map(|(string, lane)| {
                    let cell = lane.get(step).filter(|c| c.active)?;
                    let pitch = chord.pitches.get(string).copied().flatten()?;
                    Some(NoteEvent {
                        pitch,
                        accented: cell.accented,
                        duration_secs: step_duration * cell.duration.max(1) as f64,
                    })
                })
                .collect();
            if notes.is_empty() {
                StepEvent::Silent
            } else {
                StepEvent::Notes(notes)
            }
        }
    }
}

/// Strings to highlight for `step`, in diagram order. Empty for strums.
pub fn highlighted_strings(pattern: &RhythmPattern, chord: &ScheduledChord, step: usize) -> Vec<usize> {
    let PatternGrid::Arpeggio(lanes) = &pattern.grid else {
        return Vec::new();
    };
    let string_count = chord.pitches.len();
    lanes
        .iter()
        .enumerate()
        .filter(|(string, lane)| {
            lane.get(step).is_some_and(|c| c.active)
                && chord.pitches.get(*string).is_some_and(|p| p.is_some())
        })
        .filter_map(|(string, _)| order::diagram_index(string, string_count))
        .collect()
}

/// UI update matching one scheduled step.
#[derive(Debug, Clone, PartialEq)]
pub struct Highlight {
    pub epoch: u64,
    pub chord_id: String,
    pub position: usize,
    pub step: usize,
    pub total_steps: usize,
    pub strings: Vec<usize>,
}

impl Highlight {
    /// Playhead position in `0.0..1.0`.
    pub fn progress(&self) -> f64 {
        if self.total_steps == 0 {
            0.0
        } else {
            self.step as f64 / self.total_steps as f64
        }
    }
}

#[derive(Debug)]
struct PendingHighlight {
    fire_at: Instant,
    highlight: Highlight,
}

#[derive(Debug)]
struct PlaybackSession {
    request: PlaybackRequest,
    step_duration: f64,
    total_steps: usize,
    origin: f64,
    scheduled_steps: u64,
    step: usize,
    position: usize,
    pending: VecDeque<PendingHighlight>,
}

impl PlaybackSession {
    fn next_time(&self) -> f64 {
        self.origin + self.scheduled_steps as f64 * self.step_duration
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started { epoch: u64 },
    AlreadyRunning,
    AudioNotReady,
    NothingToPlay,
}

pub struct Scheduler {
    timing: SchedulerTiming,
    session: Option<PlaybackSession>,
    epoch: u64,
}

impl Scheduler {
    pub fn new(timing: SchedulerTiming) -> Self {
        Self {
            timing,
            session: None,
            epoch: 0,
        }
    }

    pub fn timing(&self) -> SchedulerTiming {
        self.timing
    }

    pub fn is_running(&self) -> bool {
        self.session.is_some()
    }

    /// Changes on every start and stop; highlights from older epochs are stale.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn current_step(&self) -> Option<usize> {
        self.session.as_ref().map(|s| s.step)
    }

    pub fn current_position(&self) -> Option<usize> {
        self.session.as_ref().map(|s| s.position)
    }

    pub fn next_scheduled_time(&self) -> Option<f64> {
        self.session.as_ref().map(|s| s.next_time())
    }

    pub fn pending_callbacks(&self) -> usize {
        self.session.as_ref().map_or(0, |s| s.pending.len())
    }

    pub fn start(&mut self, request: PlaybackRequest, output: &dyn AudioOutput) -> StartOutcome {
        if self.session.is_some() {
            return StartOutcome::AlreadyRunning;
        }
        if !request.source.is_playable() {
            return StartOutcome::NothingToPlay;
        }
        if !output.is_ready() {
            return StartOutcome::AudioNotReady;
        }

        output.resume();
        output.stop_all();

        let info = request.pattern.info();
        let bpm = sanitize_bpm(request.bpm);
        let step_duration = info.step_duration_secs(bpm);
        self.epoch += 1;
        log::debug!(
            target: "playback",
            "start '{}' at {} bpm ({} steps of {:.3}s), epoch {}",
            request.pattern.name,
            bpm,
            info.total_steps,
            step_duration,
            self.epoch
        );

        self.session = Some(PlaybackSession {
            request,
            step_duration,
            total_steps: info.total_steps,
            origin: output.current_time() + self.timing.start_delay_secs,
            scheduled_steps: 0,
            step: 0,
            position: 0,
            pending: VecDeque::new(),
        });
        StartOutcome::Started { epoch: self.epoch }
    }

    /// Schedule every step due within the lookahead window. Returns how many
    /// steps were scheduled.
    pub fn tick(&mut self, output: &dyn AudioOutput, wall_now: Instant) -> usize {
        let epoch = self.epoch;
        let lookahead = self.timing.lookahead_secs;
        let Some(session) = self.session.as_mut() else {
            return 0;
        };

        let audio_now = output.current_time();
        let mut scheduled = 0;

        while session.next_time() < audio_now + lookahead {
            let at = session.next_time();
            let step = session.step;
            let position = session.position;

            if let Some(chord) = session.request.source.chord_at(position) {
                let pattern = &session.request.pattern;
                dispatch(
                    output,
                    events_for_step(pattern, chord, step, session.step_duration),
                    at,
                );

                let lead = Duration::from_secs_f64((at - audio_now).max(0.0));
                session.pending.push_back(PendingHighlight {
                    fire_at: wall_now + lead,
                    highlight: Highlight {
                        epoch,
                        chord_id: chord.id.clone(),
                        position,
                        step,
                        total_steps: session.total_steps,
                        strings: highlighted_strings(pattern, chord, step),
                    },
                });
            }

            session.scheduled_steps += 1;
            session.step += 1;
            if session.step >= session.total_steps {
                session.step = 0;
                session.position = session.request.source.next_position(position);
            }
            scheduled += 1;
        }

        scheduled
    }

    /// Highlights whose time has come, oldest first.
    pub fn take_due(&mut self, wall_now: Instant) -> Vec<Highlight> {
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };
        let mut due = Vec::new();
        while session
            .pending
            .front()
            .is_some_and(|p| p.fire_at <= wall_now)
        {
            if let Some(p) = session.pending.pop_front() {
                due.push(p.highlight);
            }
        }
        due
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.session
            .as_ref()
            .and_then(|s| s.pending.front())
            .map(|p| p.fire_at)
    }

    /// End the session: drop pending highlights and silence output. Safe in
    /// any state. Returns whether a session was running.
    pub fn stop(&mut self, output: &dyn AudioOutput) -> bool {
        let was_running = self.session.take().is_some();
        if was_running {
            self.epoch += 1;
            log::debug!(target: "playback", "stopped, epoch {}", self.epoch);
        }
        output.stop_all();
        was_running
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(SchedulerTiming::default())
    }
}

fn dispatch(output: &dyn AudioOutput, event: StepEvent, at: f64) {
    match event {
        StepEvent::Silent => {}
        StepEvent::Strum {
            pitches,
            direction,
            duration_secs,
            accented,
        } => output.trigger_strum(&pitches, direction, duration_secs, accented, at),
        StepEvent::Mute { duration_secs } => output.trigger_mute(duration_secs, at),
        StepEvent::Notes(notes) => output.trigger_notes(&notes, at),
    }
}
