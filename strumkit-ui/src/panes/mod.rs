mod chords_pane;
mod diagram;
mod editor_pane;
mod practice_pane;
mod prompt_pane;

pub use chords_pane::ChordsPane;
pub use editor_pane::EditorPane;
pub use practice_pane::PracticePane;
pub use prompt_pane::{PromptKind, PromptPane, PromptResult};
