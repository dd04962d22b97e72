//! Playback operations produced by dispatch.
//!
//! Dispatch pushes these instead of touching the playback threads, so state
//! changes can be tested without audio. The caller applies them once
//! dispatch returns.

use strumkit_audio::PlaybackRequest;
use strumkit_types::Pitch;

use crate::editor::audition_note;
use crate::transport::Transport;

#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEffect {
    PlayMain { request: PlaybackRequest },
    StopMain,
    PlayPreview { request: PlaybackRequest },
    StopPreview,
    /// Sound one string of the preview chord.
    Audition {
        pitches: Vec<Option<Pitch>>,
        lane: usize,
    },
}

pub fn apply_side_effects(effects: &[PlaybackEffect], transport: &Transport) {
    for effect in effects {
        apply_one(effect, transport);
    }
}

fn apply_one(effect: &PlaybackEffect, transport: &Transport) {
    match effect {
        PlaybackEffect::PlayMain { request } => transport.main().play(request.clone()),
        PlaybackEffect::StopMain => transport.main().stop(),
        PlaybackEffect::PlayPreview { request } => transport.preview().play(request.clone()),
        PlaybackEffect::StopPreview => transport.preview().stop(),
        PlaybackEffect::Audition { pitches, lane } => match audition_note(pitches, *lane) {
            Some(note) => transport.preview().audition(note),
            None => log::debug!(target: "editor", "nothing to audition on lane {}", lane),
        },
    }
}
