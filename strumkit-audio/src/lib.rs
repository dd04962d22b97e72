pub mod commands;
pub mod engine;
pub mod handle;
pub mod output;
pub mod playback_thread;
pub mod scheduler;

pub use commands::{PlaybackCmd, PlaybackFeedback};
pub use engine::{AudioEngine, EngineSettings};
pub use handle::PlaybackHandle;
pub use output::{AudioOutput, NoteEvent, OutputState, StrumDirection, TestOutput};
pub use scheduler::{
    ChordSource, Highlight, PlaybackRequest, ScheduledChord, Scheduler, SchedulerTiming,
    StartOutcome, StepEvent,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("no audio output device available")]
    NoDevice,
    #[error("unsupported output sample format {0}")]
    UnsupportedFormat(String),
    #[error("{0}")]
    Stream(String),
    #[error("failed to start output stream: {0}")]
    Play(String),
    #[error("failed to load voice sample: {0}")]
    Sample(#[from] hound::Error),
    #[error("voice sample {0} contains no audio")]
    EmptySample(String),
    #[error("failed to spawn audio thread: {0}")]
    Thread(#[source] std::io::Error),
}
