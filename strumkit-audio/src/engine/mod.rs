//! The sound engine: output device, instrument voice and voice mixer.
//!
//! `AudioEngine` is cheap to clone; all clones share one output context, so
//! the practice player and the editor preview drive the same voice.

mod device;
pub mod mixer;
pub mod voice;

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use strumkit_types::Pitch;

use self::device::OutputStream;
use self::mixer::Mixer;
use self::voice::{VoiceSample, VOICE_ROOT_MIDI};
use crate::output::{AudioOutput, NoteEvent, OutputState, StrumDirection};
use crate::AudioError;

pub const STRUM_ACCENT_GAIN: f32 = 1.0;
pub const STRUM_GAIN: f32 = 0.7;
pub const NOTE_ACCENT_GAIN: f32 = 1.2;
pub const NOTE_GAIN: f32 = 0.8;
pub const MUTE_GAIN: f32 = 0.15;
/// C2, played short and quiet for a muted strum.
pub const MUTE_MIDI: u8 = 36;

const FALLBACK_SAMPLE_RATE: u32 = 44_100;

#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// WAV file for the instrument voice; a synthesized pluck when `None`.
    pub sample_path: Option<PathBuf>,
    pub master_gain: f32,
    /// Gap between successive strings of a strum.
    pub strum_stagger_secs: f64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            sample_path: None,
            master_gain: 0.8,
            strum_stagger_secs: 0.01,
        }
    }
}

struct EngineInner {
    settings: EngineSettings,
    state: Mutex<OutputState>,
    settled: Condvar,
    mixer: Arc<Mutex<Mixer>>,
    clock: Arc<AtomicU64>,
    stream: Mutex<Option<OutputStream>>,
}

#[derive(Clone)]
pub struct AudioEngine {
    inner: Arc<EngineInner>,
}

impl AudioEngine {
    pub fn new(settings: EngineSettings) -> Self {
        let mixer = Mixer::new(FALLBACK_SAMPLE_RATE, settings.master_gain);
        Self {
            inner: Arc::new(EngineInner {
                settings,
                state: Mutex::new(OutputState::Uninitialized),
                settled: Condvar::new(),
                mixer: Arc::new(Mutex::new(mixer)),
                clock: Arc::new(AtomicU64::new(0)),
                stream: Mutex::new(None),
            }),
        }
    }

    /// Block until initialization finishes or the timeout passes.
    pub fn wait_until_settled(&self, timeout: Duration) -> OutputState {
        let guard = match self.inner.state.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        let result = self
            .inner
            .settled
            .wait_timeout_while(guard, timeout, |s| *s == OutputState::Loading);
        match result {
            Ok((state, _)) => state.clone(),
            Err(poisoned) => poisoned.into_inner().0.clone(),
        }
    }

    pub fn active_voices(&self) -> usize {
        self.inner.mixer.lock().map(|m| m.active_voices()).unwrap_or(0)
    }

    fn set_state(&self, state: OutputState) {
        if let Ok(mut s) = self.inner.state.lock() {
            *s = state;
        }
        self.inner.settled.notify_all();
    }

    fn load(&self) -> Result<(), AudioError> {
        let stream = device::open_default_output(
            Arc::clone(&self.inner.mixer),
            Arc::clone(&self.inner.clock),
        )?;

        let sample = match &self.inner.settings.sample_path {
            Some(path) => VoiceSample::load_wav(path, VOICE_ROOT_MIDI)?,
            None => VoiceSample::synthesized_pluck(stream.sample_rate),
        };

        if let Ok(mut mixer) = self.inner.mixer.lock() {
            mixer.set_sample(Arc::new(sample));
        }
        if let Ok(mut slot) = self.inner.stream.lock() {
            *slot = Some(stream);
        }
        Ok(())
    }

    fn with_mixer<F: FnOnce(&mut Mixer)>(&self, f: F) {
        if !self.is_ready() {
            return;
        }
        match self.inner.mixer.lock() {
            Ok(mut mixer) => f(&mut mixer),
            Err(_) => log::error!(target: "audio", "mixer lock poisoned"),
        }
    }
}

impl Default for AudioEngine {
    fn default() -> Self {
        Self::new(EngineSettings::default())
    }
}

impl AudioOutput for AudioEngine {
    fn initialize(&self) {
        {
            let Ok(mut state) = self.inner.state.lock() else {
                return;
            };
            if matches!(*state, OutputState::Ready | OutputState::Loading) {
                return;
            }
            *state = OutputState::Loading;
        }

        let engine = self.clone();
        let spawned = std::thread::Builder::new()
            .name("strumkit::audio-init".to_owned())
            .spawn(move || match engine.load() {
                Ok(()) => {
                    log::info!(target: "audio", "audio engine ready");
                    engine.set_state(OutputState::Ready);
                }
                Err(e) => {
                    log::error!(target: "audio", "failed to initialize audio: {}", e);
                    engine.set_state(OutputState::Failed(e.to_string()));
                }
            });

        if let Err(e) = spawned {
            log::error!(target: "audio", "failed to spawn audio init thread: {}", e);
            self.set_state(OutputState::Failed(e.to_string()));
        }
    }

    fn state(&self) -> OutputState {
        self.inner
            .state
            .lock()
            .map(|s| s.clone())
            .unwrap_or(OutputState::Failed("state lock poisoned".to_string()))
    }

    fn resume(&self) {
        if let Ok(stream) = self.inner.stream.lock() {
            if let Some(stream) = stream.as_ref() {
                stream.resume();
            }
        }
    }

    fn current_time(&self) -> f64 {
        let frames = self.inner.clock.load(Ordering::Acquire);
        let rate = self
            .inner
            .stream
            .lock()
            .ok()
            .and_then(|s| s.as_ref().map(|s| s.sample_rate))
            .unwrap_or(FALLBACK_SAMPLE_RATE);
        frames as f64 / rate.max(1) as f64
    }

    fn trigger_strum(
        &self,
        pitches: &[Pitch],
        direction: StrumDirection,
        duration_secs: f64,
        accented: bool,
        at: f64,
    ) {
        let gain = if accented { STRUM_ACCENT_GAIN } else { STRUM_GAIN };
        let stagger = self.inner.settings.strum_stagger_secs;
        self.with_mixer(|mixer| {
            let ordered: Box<dyn Iterator<Item = &Pitch>> = match direction {
                StrumDirection::Down => Box::new(pitches.iter()),
                StrumDirection::Up => Box::new(pitches.iter().rev()),
            };
            for (i, pitch) in ordered.enumerate() {
                mixer.add_voice(pitch.midi(), gain, at + i as f64 * stagger, duration_secs);
            }
        });
    }

    fn trigger_notes(&self, notes: &[NoteEvent], at: f64) {
        self.with_mixer(|mixer| {
            for note in notes {
                let gain = if note.accented { NOTE_ACCENT_GAIN } else { NOTE_GAIN };
                mixer.add_voice(note.pitch.midi(), gain, at, note.duration_secs);
            }
        });
    }

    fn trigger_mute(&self, duration_secs: f64, at: f64) {
        self.with_mixer(|mixer| {
            mixer.add_voice(MUTE_MIDI, MUTE_GAIN, at, duration_secs * 0.5);
        });
    }

    fn stop_all(&self) {
        match self.inner.mixer.lock() {
            Ok(mut mixer) => mixer.clear(),
            Err(_) => log::error!(target: "audio", "mixer lock poisoned"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triggers_before_init_are_silent() {
        let engine = AudioEngine::default();
        let pitch = Pitch::from_midi(60).unwrap();
        engine.trigger_strum(&[pitch], StrumDirection::Down, 0.5, true, 0.0);
        engine.trigger_notes(
            &[NoteEvent { pitch, accented: false, duration_secs: 0.5 }],
            0.0,
        );
        engine.trigger_mute(0.5, 0.0);
        assert_eq!(engine.active_voices(), 0);
        assert_eq!(engine.state(), OutputState::Uninitialized);
    }

    #[test]
    fn stop_all_is_safe_before_init() {
        let engine = AudioEngine::default();
        engine.stop_all();
        engine.stop_all();
        assert_eq!(engine.active_voices(), 0);
    }

    #[test]
    fn clock_starts_at_zero() {
        let engine = AudioEngine::default();
        assert_eq!(engine.current_time(), 0.0);
    }

    #[test]
    fn clones_share_state() {
        let engine = AudioEngine::default();
        let other = engine.clone();
        other.set_state(OutputState::Failed("test".into()));
        assert_eq!(engine.state(), OutputState::Failed("test".into()));
    }
}
