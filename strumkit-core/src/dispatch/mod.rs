mod editor;
mod practice;
pub mod side_effects;

pub use side_effects::{apply_side_effects, PlaybackEffect};

use crate::action::{Action, ChordAction, DispatchResult, PersistDirty};
use crate::export::ExportDocument;
use crate::persistence::Storage;
use crate::state::AppState;

/// Dispatch an action against the state.
///
/// Playback operations are collected into `effects` rather than executed
/// inline; the caller applies them with [`apply_side_effects`]. Tempo and
/// pattern changes are refused while the practice player is running.
pub fn dispatch_action(
    action: &Action,
    state: &mut AppState,
    effects: &mut Vec<PlaybackEffect>,
) -> DispatchResult {
    match action {
        Action::Quit => {
            stop_main(state, effects);
            stop_preview(state, effects);
            DispatchResult::with_quit()
        }
        Action::TogglePlayback => {
            if state.player.is_busy() {
                stop_main(state, effects);
                DispatchResult::none()
            } else {
                start_main(state, effects)
            }
        }
        Action::Stop => {
            stop_main(state, effects);
            DispatchResult::none()
        }
        Action::SetBpm(bpm) => {
            if let Some(locked) = transport_locked(state) {
                return locked;
            }
            state.patterns.set_bpm(*bpm);
            DispatchResult::none()
        }
        Action::AdjustBpm(delta) => {
            if let Some(locked) = transport_locked(state) {
                return locked;
            }
            state.patterns.adjust_bpm(*delta);
            DispatchResult::none()
        }
        Action::SelectPattern(id) => {
            if let Some(locked) = transport_locked(state) {
                return locked;
            }
            if state.patterns.set_active(id) {
                DispatchResult::none()
            } else {
                DispatchResult::with_status(format!("Unknown pattern '{}'", id))
            }
        }
        Action::CyclePattern(delta) => {
            if let Some(locked) = transport_locked(state) {
                return locked;
            }
            state.patterns.cycle_active(*delta);
            DispatchResult::none()
        }
        Action::DeletePattern(id) => delete_pattern(id, state),
        Action::SwitchInstrument(instrument) => {
            if state.is_editing() {
                return DispatchResult::with_status("Close the editor to switch instrument");
            }
            stop_main(state, effects);
            if state.switch_instrument(*instrument) {
                DispatchResult::with_status(format!("Switched to {}", instrument.name()))
            } else {
                DispatchResult::none()
            }
        }
        Action::Chords(a) => dispatch_chords(a, state),
        Action::Practice(a) => practice::dispatch_practice(a, state),
        Action::Editor(a) => editor::dispatch_editor(a, state, effects),
        Action::Export(path) => {
            let doc = ExportDocument {
                practice_set: state.practice.items(),
                saved_sets: state.saved_sets.sets(),
                custom_patterns: state.patterns.custom(),
            };
            match doc.write_to(path) {
                Ok(()) => DispatchResult::with_status(format!("Exported to {}", path.display())),
                Err(e) => {
                    log::error!(target: "persistence", "export to {} failed: {}", path.display(), e);
                    DispatchResult::with_error(format!("Export failed: {}", e))
                }
            }
        }
    }
}

/// Status to return when the player holds the tempo and pattern.
fn transport_locked(state: &AppState) -> Option<DispatchResult> {
    state
        .player
        .is_busy()
        .then(|| DispatchResult::with_status("Stop playback to change tempo or pattern"))
}

fn start_main(state: &mut AppState, effects: &mut Vec<PlaybackEffect>) -> DispatchResult {
    if state.practice.is_empty() {
        return DispatchResult::with_status("Add chords to the practice set first");
    }
    stop_preview(state, effects);
    effects.push(PlaybackEffect::PlayMain {
        request: state.playback_request(),
    });
    DispatchResult::none()
}

/// Always safe: stopping an idle player only silences the output.
pub(crate) fn stop_main(state: &mut AppState, effects: &mut Vec<PlaybackEffect>) {
    effects.push(PlaybackEffect::StopMain);
    state.player.clear();
}

/// Pushed even when the view looks idle: a preview started in this frame
/// has not reported back yet.
pub(crate) fn stop_preview(state: &mut AppState, effects: &mut Vec<PlaybackEffect>) {
    effects.push(PlaybackEffect::StopPreview);
    state.preview.clear();
}

fn delete_pattern(id: &str, state: &mut AppState) -> DispatchResult {
    if state.patterns.is_preset(id) {
        return DispatchResult::with_status("Presets cannot be deleted");
    }
    if state.patterns.active_id() == id {
        if let Some(locked) = transport_locked(state) {
            return locked;
        }
    }
    match state.patterns.delete_custom(id) {
        Some(removed) => {
            DispatchResult::with_status(format!("Deleted '{}'", removed.name)).patterns_changed()
        }
        None => DispatchResult::none(),
    }
}

fn dispatch_chords(action: &ChordAction, state: &mut AppState) -> DispatchResult {
    match action {
        ChordAction::SetSearch(query) => {
            state.library.set_search(query);
            DispatchResult::none()
        }
        ChordAction::Import(path) => match state.library.import_file(path) {
            Ok(report) => DispatchResult::with_status(report.summary()),
            Err(e) => {
                log::warn!(target: "ingest", "{}", e);
                DispatchResult::with_error(format!("Import failed: {}", e))
            }
        },
    }
}

/// Write whatever the result marks dirty. Failures are logged and reported
/// as a status message; the in-memory state is kept.
pub fn persist(storage: &Storage, state: &AppState, dirty: PersistDirty) -> Option<String> {
    let mut failure = None;
    if dirty.custom_patterns {
        if let Err(e) = storage.save_custom_patterns(state.patterns.custom()) {
            log::error!(target: "persistence", "failed to save custom patterns: {}", e);
            failure = Some(format!("Could not save patterns: {}", e));
        }
    }
    if dirty.saved_sets {
        if let Err(e) = storage.save_saved_sets(state.saved_sets.sets()) {
            log::error!(target: "persistence", "failed to save sets: {}", e);
            failure = Some(format!("Could not save sets: {}", e));
        }
    }
    failure
}
