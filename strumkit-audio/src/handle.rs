//! Main-thread side of a playback session.
//!
//! A `PlaybackHandle` owns one playback thread. The practice player and the
//! editor preview each hold their own handle over the same shared output.

use std::sync::atomic::Ordering;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::Sender;

use crate::commands::{PlaybackCmd, PlaybackFeedback};
use crate::output::{AudioOutput, NoteEvent};
use crate::playback_thread::{PlaybackThread, SharedStatus};
use crate::scheduler::{PlaybackRequest, SchedulerTiming};
use crate::AudioError;

const STOP_REPLY_TIMEOUT: Duration = Duration::from_millis(200);

pub struct PlaybackHandle {
    cmd_tx: Sender<PlaybackCmd>,
    feedback_rx: Receiver<PlaybackFeedback>,
    status: Arc<SharedStatus>,
    thread: Option<JoinHandle<()>>,
}

impl PlaybackHandle {
    pub fn spawn(
        name: &str,
        output: Arc<dyn AudioOutput>,
        timing: SchedulerTiming,
    ) -> Result<Self, AudioError> {
        let (cmd_tx, cmd_rx) = crossbeam_channel::unbounded();
        let (feedback_tx, feedback_rx) = mpsc::channel();
        let status = Arc::new(SharedStatus::new());

        let worker = PlaybackThread::new(output, timing, cmd_rx, feedback_tx, Arc::clone(&status));
        let thread = std::thread::Builder::new()
            .name(format!("strumkit::{}", name))
            .spawn(move || worker.run())
            .map_err(AudioError::Thread)?;

        Ok(Self {
            cmd_tx,
            feedback_rx,
            status,
            thread: Some(thread),
        })
    }

    /// Ask for playback to start. Ignored if a session is already running.
    pub fn play(&self, request: PlaybackRequest) {
        if self.cmd_tx.send(PlaybackCmd::Play { request }).is_err() {
            log::error!(target: "playback", "playback thread is gone");
        }
    }

    /// Sound one note without starting a session. If the voice is still
    /// loading the note plays once it is ready.
    pub fn audition(&self, note: NoteEvent) {
        if self.cmd_tx.send(PlaybackCmd::Audition { note }).is_err() {
            log::error!(target: "playback", "playback thread is gone");
        }
    }

    /// Stop and wait briefly until the thread has silenced the output.
    pub fn stop(&self) {
        let (reply_tx, reply_rx) = crossbeam_channel::bounded(1);
        if self
            .cmd_tx
            .send(PlaybackCmd::Stop { reply: Some(reply_tx) })
            .is_err()
        {
            return;
        }
        if reply_rx.recv_timeout(STOP_REPLY_TIMEOUT).is_err() {
            log::warn!(target: "playback", "stop was not acknowledged in time");
        }
    }

    pub fn is_running(&self) -> bool {
        self.status.running.load(Ordering::Acquire)
    }

    /// All pending feedback, minus highlights from sessions that have ended.
    pub fn drain_feedback(&self) -> Vec<PlaybackFeedback> {
        let mut out = Vec::new();
        while let Ok(feedback) = self.feedback_rx.try_recv() {
            if self.is_current(&feedback) {
                out.push(feedback);
            }
        }
        out
    }

    /// Wait for the next current feedback message.
    pub fn next_feedback(&self, timeout: Duration) -> Option<PlaybackFeedback> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.feedback_rx.recv_timeout(remaining) {
                Ok(feedback) if self.is_current(&feedback) => return Some(feedback),
                Ok(_) => continue,
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                    return None
                }
            }
        }
    }

    fn is_current(&self, feedback: &PlaybackFeedback) -> bool {
        match feedback {
            PlaybackFeedback::Highlight(h) => h.epoch == self.status.epoch.load(Ordering::Acquire),
            _ => true,
        }
    }
}

impl Drop for PlaybackHandle {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(PlaybackCmd::Shutdown);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}
