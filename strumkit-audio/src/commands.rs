use crossbeam_channel::Sender;

use crate::output::NoteEvent;
use crate::scheduler::{Highlight, PlaybackRequest};

/// Commands sent from the UI to the playback thread.
#[derive(Debug)]
pub enum PlaybackCmd {
    /// Start a session. Ignored while one is running or waiting for audio.
    Play { request: PlaybackRequest },
    /// Stop and silence. The reply fires once nothing more will sound.
    Stop { reply: Option<Sender<()>> },
    /// Sound one note now, or as soon as the voice has loaded.
    Audition { note: NoteEvent },
    Shutdown,
}

/// Messages sent from the playback thread back to the UI.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackFeedback {
    Started { epoch: u64 },
    Highlight(Highlight),
    /// Carries the epoch of the session that ended, as sent in `Started`.
    Stopped { epoch: u64 },
    /// Play was requested before the voice finished loading; it will start
    /// once loading completes.
    AudioLoading,
    AudioUnavailable(String),
    NothingToPlay,
}
