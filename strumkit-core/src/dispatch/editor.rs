use strumkit_types::{MAX_BPM, MIN_BPM};

use super::{stop_main, stop_preview, PlaybackEffect};
use crate::action::{DispatchResult, EditorAction};
use crate::editor::{ArpeggioClick, EditorSession};
use crate::state::AppState;

pub(super) fn dispatch_editor(
    action: &EditorAction,
    state: &mut AppState,
    effects: &mut Vec<PlaybackEffect>,
) -> DispatchResult {
    if action.edits_grid() || matches!(action, EditorAction::Close | EditorAction::Save { .. }) {
        stop_preview(state, effects);
    }

    match action {
        EditorAction::OpenNew => {
            stop_preview(state, effects);
            state.editor = Some(EditorSession::new_pattern(state.instrument));
            DispatchResult::none()
        }
        EditorAction::Open(id) => {
            stop_preview(state, effects);
            let Some(pattern) = state.patterns.get(id) else {
                return DispatchResult::with_status(format!("Unknown pattern '{}'", id));
            };
            let is_preset = state.patterns.is_preset(id);
            state.editor = Some(EditorSession::open(pattern, is_preset, state.instrument));
            DispatchResult::none()
        }
        EditorAction::Close => {
            state.editor = None;
            DispatchResult::none()
        }
        EditorAction::TogglePreview => toggle_preview(state, effects),
        EditorAction::ClickArpeggio { lane, step } => {
            let Some(editor) = state.editor.as_mut() else {
                return DispatchResult::none();
            };
            if editor.click_arpeggio(*lane, *step) == ArpeggioClick::Activated {
                if let Some(chord) = state.preview_chord() {
                    effects.push(PlaybackEffect::Audition {
                        pitches: chord.pitches,
                        lane: *lane,
                    });
                }
            }
            DispatchResult::none()
        }
        EditorAction::Save { as_new } => {
            let Some(editor) = state.editor.take() else {
                return DispatchResult::none();
            };
            let id = editor.save(&mut state.patterns, *as_new);
            let name = state
                .patterns
                .get(&id)
                .map(|p| p.name.clone())
                .unwrap_or_default();
            DispatchResult::with_status(format!("Saved '{}'", name)).patterns_changed()
        }
        other => {
            if let Some(editor) = state.editor.as_mut() {
                edit_session(other, editor);
            }
            DispatchResult::none()
        }
    }
}

/// Session edits with no effect outside the editor.
fn edit_session(action: &EditorAction, editor: &mut EditorSession) {
    match action {
        EditorAction::SetName(name) => editor.set_name(name),
        EditorAction::SetTimeSignature(ts) => editor.set_time_signature(*ts),
        EditorAction::SetKind(kind) => editor.set_kind(*kind),
        EditorAction::Clear => editor.clear(),
        EditorAction::PressStrum(step) => {
            editor.press_strum(*step);
        }
        EditorAction::EnterStrum(step) => {
            editor.enter_strum(*step);
        }
        EditorAction::RightClickStrum(step) => {
            editor.right_click_strum(*step);
        }
        EditorAction::RightClickArpeggio { lane, step } => {
            editor.right_click_arpeggio(*lane, *step);
        }
        EditorAction::BeginResize {
            lane,
            step,
            x,
            cell_width,
        } => {
            editor.begin_resize(*lane, *step, *x, *cell_width);
        }
        EditorAction::DragResize(x) => {
            editor.drag_resize(*x);
        }
        EditorAction::EndGesture => editor.end_gesture(),
        EditorAction::SetPreviewChord(name) => editor.set_preview_chord(name),
        EditorAction::AdjustPreviewBpm(delta) => {
            let next = (editor.preview_bpm() as i32 + delta).clamp(MIN_BPM as i32, MAX_BPM as i32);
            editor.set_preview_bpm(next as u16);
        }
        EditorAction::OpenNew
        | EditorAction::Open(_)
        | EditorAction::Close
        | EditorAction::ClickArpeggio { .. }
        | EditorAction::TogglePreview
        | EditorAction::Save { .. } => {}
    }
}

fn toggle_preview(state: &mut AppState, effects: &mut Vec<PlaybackEffect>) -> DispatchResult {
    if state.preview.is_busy() {
        stop_preview(state, effects);
        return DispatchResult::none();
    }
    let Some(editor) = state.editor.as_ref() else {
        return DispatchResult::none();
    };
    let chord = editor.preview_chord().to_string();
    match state.preview_request() {
        Some(request) => {
            if state.player.is_busy() {
                stop_main(state, effects);
            }
            effects.push(PlaybackEffect::PlayPreview { request });
            DispatchResult::none()
        }
        None => DispatchResult::with_status(format!("No voicing for '{}'", chord)),
    }
}
