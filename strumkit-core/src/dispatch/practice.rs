use crate::action::{DispatchResult, PracticeAction};
use crate::state::AppState;

pub(super) fn dispatch_practice(action: &PracticeAction, state: &mut AppState) -> DispatchResult {
    match action {
        PracticeAction::ToggleVoicing { chord, diagram } => {
            let Some(group) = state.library.get(chord) else {
                return DispatchResult::with_status(format!("Unknown chord '{}'", chord));
            };
            let Some(d) = group.diagrams.get(*diagram) else {
                return DispatchResult::none();
            };
            let name = group.name.clone();
            let d = d.clone();
            state.practice.toggle(&name, &d);
            DispatchResult::none()
        }
        PracticeAction::Remove(id) => {
            state.practice.remove(id);
            DispatchResult::none()
        }
        PracticeAction::Clear => {
            state.practice.clear();
            DispatchResult::none()
        }
        PracticeAction::MoveUp(index) => {
            state.practice.move_up(*index);
            DispatchResult::none()
        }
        PracticeAction::MoveDown(index) => {
            state.practice.move_down(*index);
            DispatchResult::none()
        }
        PracticeAction::SaveSet(name) => {
            if state.saved_sets.save(name, &state.practice) {
                DispatchResult::with_status(format!("Saved set '{}'", name.trim())).sets_changed()
            } else if state.practice.is_empty() {
                DispatchResult::with_status("The practice set is empty")
            } else {
                DispatchResult::with_status("A saved set needs a name")
            }
        }
        PracticeAction::LoadSet(name) => {
            if state.saved_sets.load_into(name, &mut state.practice) {
                DispatchResult::with_status(format!("Loaded set '{}'", name))
            } else {
                DispatchResult::with_status(format!("No saved set '{}'", name))
            }
        }
        PracticeAction::DeleteSet(name) => {
            if state.saved_sets.delete(name) {
                DispatchResult::with_status(format!("Deleted set '{}'", name)).sets_changed()
            } else {
                DispatchResult::none()
            }
        }
    }
}
