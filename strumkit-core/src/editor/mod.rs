//! Rhythm grid editing.
//!
//! The free functions here mutate one strum lane or one arpeggio lane and
//! keep the span invariant: a placed cell of duration N is followed by N-1
//! placeholders. Clicks that land inside a span act on the span's owner.
//! [`EditorSession`] wraps them with the state of an open editor.

mod labels;
mod session;

pub use labels::duration_label;
pub use session::{audition_note, EditorMode, EditorSession, AUDITION_SECS};

use strumkit_types::{span_owner, ArpeggioCell, GridCell, StrumCell, StrumKind};

use crate::patterns::normalize_lane;

/// Outcome of a left click on an arpeggio step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArpeggioClick {
    Activated,
    Deactivated,
    Ignored,
}

/// Reset the trailing steps of the span starting at `start` to placeholders.
fn release_span<C: GridCell>(lane: &mut [C], start: usize) {
    let end = (start + lane[start].duration()).min(lane.len());
    for cell in &mut lane[start + 1..end] {
        *cell = C::placeholder();
    }
}

/// Advance the clicked cell through rest, down, up, mute. Returns the kind
/// now at the owning step, which a drag gesture then paints with, or `None`
/// when the click was ignored.
pub fn cycle_strum(cells: &mut [StrumCell], step: usize) -> Option<StrumKind> {
    if step >= cells.len() {
        return None;
    }
    let target = span_owner(cells, step);
    if cells[target].kind == StrumKind::Rest && target != step {
        return None;
    }

    release_span(cells, target);
    let cell = &mut cells[target];
    let next = cell.kind.next();
    cell.kind = next;
    cell.duration = 1;
    if !next.accepts_accent() || next == StrumKind::Down {
        cell.accented = false;
    }
    Some(next)
}

/// Paint `kind` onto a step entered during a drag gesture. Only bare rests
/// are painted.
pub fn paint_strum(cells: &mut [StrumCell], step: usize, kind: StrumKind) -> bool {
    if step >= cells.len() || kind == StrumKind::Rest {
        return false;
    }
    if cells[step].kind != StrumKind::Rest || span_owner(cells, step) != step {
        return false;
    }
    cells[step] = StrumCell::new(kind, false, 1);
    true
}

/// Toggle the accent of the owning cell if it is a down or up strum.
pub fn toggle_strum_accent(cells: &mut [StrumCell], step: usize) -> bool {
    if step >= cells.len() {
        return false;
    }
    let cell = &mut cells[span_owner(cells, step)];
    if !cell.kind.accepts_accent() {
        return false;
    }
    cell.accented = !cell.accented;
    true
}

/// Switch an arpeggio step on or off. Turning a span off releases it;
/// turning on only works on a free step.
pub fn toggle_arpeggio(lane: &mut [ArpeggioCell], step: usize) -> ArpeggioClick {
    if step >= lane.len() {
        return ArpeggioClick::Ignored;
    }
    let target = span_owner(lane, step);
    if lane[target].active {
        release_span(lane, target);
        lane[target] = ArpeggioCell::inactive();
        return ArpeggioClick::Deactivated;
    }
    if target != step {
        return ArpeggioClick::Ignored;
    }
    lane[step] = ArpeggioCell::new(true, false, 1);
    ArpeggioClick::Activated
}

pub fn toggle_arpeggio_accent(lane: &mut [ArpeggioCell], step: usize) -> bool {
    if step >= lane.len() {
        return false;
    }
    let cell = &mut lane[span_owner(lane, step)];
    if !cell.active {
        return false;
    }
    cell.accented = !cell.accented;
    true
}

/// Set the duration of the span starting at `start`, clamped to the lane
/// end and to the next placed cell. Returns the duration applied, or `None`
/// if `start` holds no placed cell.
pub fn resize_span<C: GridCell>(lane: &mut [C], start: usize, requested: usize) -> Option<usize> {
    if start >= lane.len() || !lane[start].is_placed() {
        return None;
    }
    let max = lane.len() - start;
    let mut duration = requested.clamp(1, max);
    if let Some(blocker) = (1..duration).find(|i| lane[start + i].is_placed()) {
        duration = blocker;
    }

    let old = lane[start].duration();
    if duration != old {
        lane[start].set_duration(duration);
        let end = (start + old).min(lane.len());
        for cell in lane.iter_mut().take(end).skip(start + duration) {
            *cell = C::placeholder();
        }
    }
    Some(duration)
}

/// Fit arpeggio lanes to another string count, aligning the highest
/// strings. Lanes and steps that do not fit are dropped; new ones start
/// empty.
pub fn remap_lanes(
    source: &[Vec<ArpeggioCell>],
    lanes: usize,
    total_steps: usize,
) -> Vec<Vec<ArpeggioCell>> {
    let mut grid = vec![vec![ArpeggioCell::inactive(); total_steps]; lanes];
    let copied = source.len().min(lanes);
    for i in 0..copied {
        let from = &source[source.len() - 1 - i];
        let to = &mut grid[lanes - 1 - i];
        let steps = from.len().min(to.len());
        to[..steps].copy_from_slice(&from[..steps]);
        normalize_lane(to, total_steps);
    }
    grid
}

/// A resize drag in progress, tracked in pointer units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeDrag {
    /// `None` for the strum lane.
    pub lane: Option<usize>,
    pub step: usize,
    pub start_x: f64,
    pub cell_width: f64,
    pub initial_duration: usize,
}

impl ResizeDrag {
    /// Requested duration with the pointer at `x`, before clamping to the
    /// lane.
    pub fn requested(&self, x: f64) -> usize {
        if self.cell_width <= 0.0 {
            return self.initial_duration;
        }
        let delta = ((x - self.start_x) / self.cell_width).round() as i64;
        (self.initial_duration as i64 + delta).max(1) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strumkit_types::spans_are_valid;

    fn lane(n: usize) -> Vec<StrumCell> {
        vec![StrumCell::rest(); n]
    }

    #[test]
    fn click_cycles_through_kinds() {
        let mut cells = lane(4);
        assert_eq!(cycle_strum(&mut cells, 1), Some(StrumKind::Down));
        assert_eq!(cycle_strum(&mut cells, 1), Some(StrumKind::Up));
        assert_eq!(cycle_strum(&mut cells, 1), Some(StrumKind::Mute));
        assert_eq!(cycle_strum(&mut cells, 1), Some(StrumKind::Rest));
        assert_eq!(cells[1], StrumCell::rest());
    }

    #[test]
    fn click_inside_span_acts_on_owner() {
        let mut cells = lane(8);
        cells[2] = StrumCell::new(StrumKind::Down, true, 3);
        assert_eq!(cycle_strum(&mut cells, 4), Some(StrumKind::Up));
        assert_eq!(cells[2].kind, StrumKind::Up);
        assert_eq!(cells[2].duration, 1);
        assert!(cells[2].accented);
        assert!(spans_are_valid(&cells));
    }

    #[test]
    fn accent_cleared_when_leaving_strums() {
        let mut cells = lane(4);
        cells[0] = StrumCell::new(StrumKind::Up, true, 2);
        assert_eq!(cycle_strum(&mut cells, 0), Some(StrumKind::Mute));
        assert!(!cells[0].accented);
        assert_eq!(cells[1], StrumCell::rest());
    }

    #[test]
    fn paint_only_on_free_rests() {
        let mut cells = lane(6);
        cells[0] = StrumCell::new(StrumKind::Down, false, 2);
        assert!(!paint_strum(&mut cells, 1, StrumKind::Up));
        assert!(paint_strum(&mut cells, 2, StrumKind::Up));
        assert!(!paint_strum(&mut cells, 2, StrumKind::Down));
        assert!(!paint_strum(&mut cells, 3, StrumKind::Rest));
        assert_eq!(cells[2].kind, StrumKind::Up);
        assert!(spans_are_valid(&cells));
    }

    #[test]
    fn right_click_accents_only_strums() {
        let mut cells = lane(4);
        cells[0] = StrumCell::new(StrumKind::Down, false, 2);
        cells[2] = StrumCell::new(StrumKind::Mute, false, 1);
        assert!(toggle_strum_accent(&mut cells, 1));
        assert!(cells[0].accented);
        assert!(!toggle_strum_accent(&mut cells, 2));
        assert!(!toggle_strum_accent(&mut cells, 3));
    }

    #[test]
    fn arpeggio_toggle_rules() {
        let mut lane = vec![ArpeggioCell::inactive(); 8];
        lane[0] = ArpeggioCell::new(true, true, 4);
        assert_eq!(toggle_arpeggio(&mut lane, 2), ArpeggioClick::Deactivated);
        assert_eq!(lane[0], ArpeggioCell::inactive());

        assert_eq!(toggle_arpeggio(&mut lane, 5), ArpeggioClick::Activated);
        assert!(lane[5].active);
        assert!(resize_span(&mut lane, 5, 3).is_some());
        assert_eq!(toggle_arpeggio(&mut lane, 6), ArpeggioClick::Deactivated);
        assert!(spans_are_valid(&lane));
    }

    #[test]
    fn arpeggio_accent_needs_active_cell() {
        let mut lane = vec![ArpeggioCell::inactive(); 4];
        assert!(!toggle_arpeggio_accent(&mut lane, 1));
        lane[0] = ArpeggioCell::new(true, false, 2);
        assert!(toggle_arpeggio_accent(&mut lane, 1));
        assert!(lane[0].accented);
    }

    #[test]
    fn resize_stops_at_next_start() {
        let mut cells = lane(16);
        cells[0] = StrumCell::new(StrumKind::Down, false, 1);
        cells[5] = StrumCell::new(StrumKind::Up, false, 1);
        assert_eq!(resize_span(&mut cells, 0, 10), Some(5));
        assert_eq!(cells[5].kind, StrumKind::Up);
        assert!(spans_are_valid(&cells));
    }

    #[test]
    fn resize_clamps_to_measure_and_minimum() {
        let mut cells = lane(16);
        cells[14] = StrumCell::new(StrumKind::Down, false, 1);
        assert_eq!(resize_span(&mut cells, 14, 8), Some(2));
        assert_eq!(resize_span(&mut cells, 14, 0), Some(1));
        assert_eq!(resize_span(&mut cells, 3, 4), None);
    }

    #[test]
    fn shrinking_releases_tail() {
        let mut cells = lane(8);
        cells[0] = StrumCell::new(StrumKind::Down, false, 6);
        assert_eq!(resize_span(&mut cells, 0, 2), Some(2));
        assert!(cells[2..].iter().all(|c| *c == StrumCell::rest()));
        assert!(spans_are_valid(&cells));
    }

    #[test]
    fn drag_rounds_to_cells() {
        let drag = ResizeDrag {
            lane: None,
            step: 0,
            start_x: 10.0,
            cell_width: 4.0,
            initial_duration: 2,
        };
        assert_eq!(drag.requested(10.0), 2);
        assert_eq!(drag.requested(15.9), 3);
        assert_eq!(drag.requested(18.0), 4);
        assert_eq!(drag.requested(-100.0), 1);
    }

    #[test]
    fn remap_aligns_highest_strings() {
        let mut guitar = vec![vec![ArpeggioCell::inactive(); 16]; 6];
        guitar[5][0] = ArpeggioCell::new(true, true, 2);
        guitar[0][3] = ArpeggioCell::new(true, false, 1);

        let uke = remap_lanes(&guitar, 4, 12);
        assert_eq!(uke.len(), 4);
        assert!(uke.iter().all(|l| l.len() == 12));
        assert_eq!(uke[3][0], ArpeggioCell::new(true, true, 2));
        // The low E lane has no ukulele counterpart.
        assert!(uke.iter().all(|l| !l[3].active));

        let back = remap_lanes(&uke, 6, 16);
        assert_eq!(back[5][0], ArpeggioCell::new(true, true, 2));
        assert!(back[0].iter().all(|c| !c.active));
        assert!(back[1].iter().all(|c| !c.active));
    }
}
