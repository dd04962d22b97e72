pub mod layout_helpers;
pub mod ratatui_impl;
pub mod status_bar;
pub mod style;

pub use ratatui_impl::RatatuiBackend;
pub use status_bar::{StatusBar, StatusLevel};

use crossterm::event::{KeyEvent, MouseEvent};
use ratatui::layout::Rect;
use ratatui::Frame;

use crate::action::Action;
use crate::state::AppState;

/// What a pane asks of the app after input.
#[derive(Debug, Clone, PartialEq)]
pub enum PaneOutcome {
    /// Not handled; try global bindings.
    Ignored,
    /// Handled without a state change.
    Consumed,
    Dispatch(Action),
    /// Several actions in order, e.g. a whole pointer gesture from one key.
    Batch(Vec<Action>),
    /// Ask for a line of text.
    Prompt(crate::panes::PromptKind),
}

/// Trait for UI panes.
pub trait Pane {
    /// Unique identifier for this pane
    fn id(&self) -> &'static str;

    fn handle_key(&mut self, key: &KeyEvent, state: &AppState) -> PaneOutcome;

    /// `area` is the pane's last rendered area.
    fn handle_mouse(&mut self, _event: &MouseEvent, _area: Rect, _state: &AppState) -> PaneOutcome {
        PaneOutcome::Ignored
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState);
}
