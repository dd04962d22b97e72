use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::time::Instant;

use crossbeam_channel::Receiver;

use crate::commands::{PlaybackCmd, PlaybackFeedback};
use crate::output::{AudioOutput, NoteEvent, OutputState};
use crate::scheduler::{PlaybackRequest, Scheduler, SchedulerTiming, StartOutcome};

/// Flags the handle reads without a round trip.
pub(crate) struct SharedStatus {
    pub running: AtomicBool,
    pub epoch: AtomicU64,
}

impl SharedStatus {
    pub fn new() -> Self {
        Self {
            running: AtomicBool::new(false),
            epoch: AtomicU64::new(0),
        }
    }
}

pub(crate) struct PlaybackThread {
    output: Arc<dyn AudioOutput>,
    scheduler: Scheduler,
    cmd_rx: Receiver<PlaybackCmd>,
    feedback_tx: Sender<PlaybackFeedback>,
    status: Arc<SharedStatus>,
    /// Play request waiting for the voice to finish loading.
    pending_start: Option<PlaybackRequest>,
    /// Latest audition waiting for the same.
    pending_audition: Option<NoteEvent>,
    last_tick: Instant,
}

impl PlaybackThread {
    pub(crate) fn new(
        output: Arc<dyn AudioOutput>,
        timing: SchedulerTiming,
        cmd_rx: Receiver<PlaybackCmd>,
        feedback_tx: Sender<PlaybackFeedback>,
        status: Arc<SharedStatus>,
    ) -> Self {
        Self {
            output,
            scheduler: Scheduler::new(timing),
            cmd_rx,
            feedback_tx,
            status,
            pending_start: None,
            pending_audition: None,
            last_tick: Instant::now(),
        }
    }

    pub(crate) fn run(mut self) {
        let tick_interval = self.scheduler.timing().tick_interval;

        loop {
            let mut remaining = tick_interval.saturating_sub(self.last_tick.elapsed());
            if let Some(deadline) = self.scheduler.next_deadline() {
                remaining = remaining.min(deadline.saturating_duration_since(Instant::now()));
            }

            crossbeam_channel::select! {
                recv(self.cmd_rx) -> result => {
                    match result {
                        Ok(cmd) => {
                            if self.handle_cmd(cmd) {
                                break;
                            }
                        }
                        Err(_) => break,
                    }
                }
                default(remaining) => {}
            }

            let now = Instant::now();
            if now.duration_since(self.last_tick) >= tick_interval {
                self.last_tick = now;
                self.poll_pending_start();
                self.poll_pending_audition();
                self.scheduler.tick(self.output.as_ref(), now);
            }

            for highlight in self.scheduler.take_due(Instant::now()) {
                self.send(PlaybackFeedback::Highlight(highlight));
            }
        }

        self.scheduler.stop(self.output.as_ref());
        self.status.running.store(false, Ordering::Release);
        log::debug!(target: "playback", "playback thread exiting");
    }

    /// Returns true when the thread should exit.
    fn handle_cmd(&mut self, cmd: PlaybackCmd) -> bool {
        match cmd {
            PlaybackCmd::Play { request } => {
                if self.scheduler.is_running() || self.pending_start.is_some() {
                    log::debug!(target: "playback", "play ignored, already running");
                } else {
                    self.request_start(request);
                }
            }
            PlaybackCmd::Stop { reply } => {
                self.stop();
                if let Some(reply) = reply {
                    let _ = reply.send(());
                }
            }
            PlaybackCmd::Audition { note } => self.audition(note),
            PlaybackCmd::Shutdown => return true,
        }
        false
    }

    fn request_start(&mut self, request: PlaybackRequest) {
        if !request.source.is_playable() {
            self.send(PlaybackFeedback::NothingToPlay);
            return;
        }

        if !self.output.is_ready() {
            self.output.initialize();
        }

        match self.output.state() {
            OutputState::Ready => self.start(request),
            OutputState::Loading => {
                log::info!(target: "playback", "waiting for audio before starting");
                self.pending_start = Some(request);
                self.send(PlaybackFeedback::AudioLoading);
            }
            OutputState::Failed(reason) => {
                log::warn!(target: "playback", "cannot play: {}", reason);
                self.send(PlaybackFeedback::AudioUnavailable(reason));
            }
            OutputState::Uninitialized => {
                self.send(PlaybackFeedback::AudioUnavailable(
                    "audio output not initialized".to_string(),
                ));
            }
        }
    }

    fn poll_pending_start(&mut self) {
        if self.pending_start.is_none() {
            return;
        }
        match self.output.state() {
            OutputState::Loading => {}
            OutputState::Ready => {
                if let Some(request) = self.pending_start.take() {
                    self.start(request);
                }
            }
            OutputState::Failed(reason) => {
                self.pending_start = None;
                log::warn!(target: "playback", "audio failed while waiting to play: {}", reason);
                self.send(PlaybackFeedback::AudioUnavailable(reason));
            }
            OutputState::Uninitialized => {
                self.pending_start = None;
            }
        }
    }

    fn audition(&mut self, note: NoteEvent) {
        if !self.output.is_ready() {
            self.output.initialize();
        }
        match self.output.state() {
            OutputState::Ready => self.trigger_audition(note),
            OutputState::Loading => self.pending_audition = Some(note),
            OutputState::Failed(reason) => {
                log::warn!(target: "playback", "cannot audition: {}", reason);
                self.send(PlaybackFeedback::AudioUnavailable(reason));
            }
            OutputState::Uninitialized => {}
        }
    }

    fn poll_pending_audition(&mut self) {
        if self.pending_audition.is_none() {
            return;
        }
        match self.output.state() {
            OutputState::Loading => {}
            OutputState::Ready => {
                if let Some(note) = self.pending_audition.take() {
                    self.trigger_audition(note);
                }
            }
            OutputState::Failed(_) | OutputState::Uninitialized => {
                self.pending_audition = None;
            }
        }
    }

    fn trigger_audition(&self, note: NoteEvent) {
        self.output.resume();
        self.output.trigger_notes(&[note], self.output.current_time());
    }

    fn start(&mut self, request: PlaybackRequest) {
        match self.scheduler.start(request, self.output.as_ref()) {
            StartOutcome::Started { epoch } => {
                self.status.epoch.store(epoch, Ordering::Release);
                self.status.running.store(true, Ordering::Release);
                // Schedule the first window right away.
                self.last_tick = Instant::now();
                self.scheduler.tick(self.output.as_ref(), self.last_tick);
                self.send(PlaybackFeedback::Started { epoch });
            }
            StartOutcome::AlreadyRunning => {}
            StartOutcome::AudioNotReady => {
                self.send(PlaybackFeedback::AudioUnavailable(
                    "audio output not ready".to_string(),
                ));
            }
            StartOutcome::NothingToPlay => self.send(PlaybackFeedback::NothingToPlay),
        }
    }

    fn stop(&mut self) {
        self.pending_start = None;
        self.pending_audition = None;
        let ended = self.scheduler.epoch();
        let was_running = self.scheduler.stop(self.output.as_ref());
        // Highlights still queued from the ended session now fail the
        // handle's epoch check.
        self.status.epoch.store(self.scheduler.epoch(), Ordering::Release);
        self.status.running.store(false, Ordering::Release);
        if was_running {
            self.send(PlaybackFeedback::Stopped { epoch: ended });
        }
    }

    fn send(&self, feedback: PlaybackFeedback) {
        let _ = self.feedback_tx.send(feedback);
    }
}
