use ratatui::style::{Color, Modifier, Style};

pub const ACCENT: Color = Color::Rgb(255, 165, 0);
pub const PLAYING: Color = Color::Rgb(80, 220, 100);
pub const SOUNDING: Color = Color::Rgb(255, 220, 50);
pub const MUTED: Color = Color::Rgb(255, 100, 100);
pub const DIM: Color = Color::Rgb(100, 100, 100);
pub const TEXT: Color = Color::Rgb(220, 220, 220);
pub const SELECTION_BG: Color = Color::Rgb(60, 100, 180);
pub const PLAYHEAD_BG: Color = Color::Rgb(40, 70, 40);

pub fn border(focused: bool) -> Style {
    if focused {
        Style::default().fg(ACCENT)
    } else {
        Style::default().fg(DIM)
    }
}

pub fn selected() -> Style {
    Style::default().fg(Color::White).bg(SELECTION_BG)
}

pub fn title() -> Style {
    Style::default().fg(TEXT).add_modifier(Modifier::BOLD)
}
