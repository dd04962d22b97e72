//! The two playback sessions and the output they share.

use std::sync::Arc;

use strumkit_audio::{AudioError, AudioOutput, PlaybackHandle, SchedulerTiming};

/// Owns the practice player and the editor preview. Both drive the same
/// output; only one should run at a time, which dispatch enforces by
/// stopping the other before starting either. Auditions go through the
/// preview thread so they can wait for the voice to load.
pub struct Transport {
    main: PlaybackHandle,
    preview: PlaybackHandle,
}

impl Transport {
    pub fn new(output: Arc<dyn AudioOutput>, timing: SchedulerTiming) -> Result<Self, AudioError> {
        let main = PlaybackHandle::spawn("player", Arc::clone(&output), timing)?;
        let preview = PlaybackHandle::spawn("preview", output, timing)?;
        Ok(Self { main, preview })
    }

    pub fn main(&self) -> &PlaybackHandle {
        &self.main
    }

    pub fn preview(&self) -> &PlaybackHandle {
        &self.preview
    }
}
