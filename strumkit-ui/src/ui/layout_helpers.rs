use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Center a rect of `width x height` within the given `area`.
/// Clamps dimensions to available space with padding to prevent overflow.
pub fn center_rect(area: Rect, width: u16, height: u16) -> Rect {
    let max_w = area.width.saturating_sub(2);
    let max_h = area.height.saturating_sub(2);
    let w = width.min(max_w);
    let h = height.min(max_h);

    let x = area.x + (area.width.saturating_sub(w)) / 2;
    let y = area.y + (area.height.saturating_sub(h)) / 2;
    Rect::new(x, y, w, h)
}

/// Screen regions: transport line, the body, status line.
pub struct ScreenLayout {
    pub transport: Rect,
    pub body: Rect,
    pub status: Rect,
}

pub fn screen_layout(area: Rect) -> ScreenLayout {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(area);
    ScreenLayout {
        transport: rows[0],
        body: rows[1],
        status: rows[2],
    }
}

/// Left and right halves of the body.
pub fn split_body(body: Rect) -> (Rect, Rect) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(body);
    (cols[0], cols[1])
}

pub fn contains(rect: Rect, column: u16, row: u16) -> bool {
    column >= rect.x && column < rect.x + rect.width && row >= rect.y && row < rect.y + rect.height
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_rect_clamps() {
        let area = Rect::new(0, 0, 20, 10);
        let r = center_rect(area, 100, 4);
        assert_eq!(r.width, 18);
        assert_eq!(r.height, 4);
        assert_eq!(r.y, 3);
    }

    #[test]
    fn screen_layout_reserves_lines() {
        let layout = screen_layout(Rect::new(0, 0, 80, 24));
        assert_eq!(layout.transport.height, 1);
        assert_eq!(layout.status.y, 23);
        assert_eq!(layout.body.height, 22);
    }

    #[test]
    fn contains_is_half_open() {
        let r = Rect::new(2, 2, 3, 3);
        assert!(contains(r, 2, 2));
        assert!(contains(r, 4, 4));
        assert!(!contains(r, 5, 2));
    }
}
