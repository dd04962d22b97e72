use std::time::{SystemTime, UNIX_EPOCH};

use strumkit_audio::NoteEvent;
use strumkit_types::{
    sanitize_bpm, ArpeggioCell, Instrument, PatternGrid, PatternKind, Pitch, RhythmPattern,
    StrumCell, StrumKind, TimeSignature, DEFAULT_BPM,
};

use super::{
    cycle_strum, paint_strum, remap_lanes, resize_span, toggle_arpeggio, toggle_arpeggio_accent,
    toggle_strum_accent, ArpeggioClick, ResizeDrag,
};
use crate::patterns::PatternStore;

/// Length of the note played when an arpeggio step is switched on.
pub const AUDITION_SECS: f64 = 0.5;

const NEW_PATTERN_NAME: &str = "New Pattern";
const UNNAMED_PATTERN: &str = "Unnamed Pattern";
const PREVIEW_PATTERN_ID: &str = "editor-preview";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorMode {
    /// A blank pattern.
    New,
    /// A custom pattern; saving can replace it.
    Edit,
    /// A copy of a preset; saving always creates a new pattern.
    Clone,
}

/// State of the open rhythm editor.
///
/// Both grids are kept so switching the pattern type starts from an empty
/// grid of the other type without rebuilding the session.
#[derive(Debug, Clone)]
pub struct EditorSession {
    mode: EditorMode,
    editing_id: Option<String>,
    name: String,
    time_signature: TimeSignature,
    kind: PatternKind,
    strum: Vec<StrumCell>,
    arpeggio: Vec<Vec<ArpeggioCell>>,
    instrument: Instrument,
    preview_chord: String,
    preview_bpm: u16,
    draw_kind: Option<StrumKind>,
    drag: Option<ResizeDrag>,
}

impl EditorSession {
    pub fn new_pattern(instrument: Instrument) -> Self {
        let time_signature = TimeSignature::FourFour;
        let total = time_signature.describe().total_steps;
        Self {
            mode: EditorMode::New,
            editing_id: None,
            name: NEW_PATTERN_NAME.to_string(),
            time_signature,
            kind: PatternKind::Arpeggio,
            strum: vec![StrumCell::rest(); total],
            arpeggio: fresh_lanes(instrument, total),
            instrument,
            preview_chord: "C".to_string(),
            preview_bpm: DEFAULT_BPM,
            draw_kind: None,
            drag: None,
        }
    }

    /// Open an existing pattern. Presets open as a copy.
    pub fn open(pattern: &RhythmPattern, is_preset: bool, instrument: Instrument) -> Self {
        let total = pattern.total_steps();
        let mut session = Self::new_pattern(instrument);
        session.mode = if is_preset { EditorMode::Clone } else { EditorMode::Edit };
        session.editing_id = Some(pattern.id.clone());
        session.name = if is_preset {
            format!("Copy of {}", pattern.name)
        } else {
            pattern.name.clone()
        };
        session.time_signature = pattern.time_signature;
        session.kind = pattern.kind();
        session.strum = vec![StrumCell::rest(); total];
        session.arpeggio = fresh_lanes(instrument, total);

        match &pattern.grid {
            PatternGrid::Strum(cells) => {
                session.strum = cells.clone();
                super::normalize_lane(&mut session.strum, total);
            }
            PatternGrid::Arpeggio(lanes) => {
                session.arpeggio = if lanes.len() == instrument.string_count() {
                    let mut lanes = lanes.clone();
                    for lane in &mut lanes {
                        super::normalize_lane(lane, total);
                    }
                    lanes
                } else {
                    log::debug!(
                        target: "editor",
                        "remapping {} lanes of '{}' to {}",
                        lanes.len(),
                        pattern.name,
                        instrument.string_count()
                    );
                    remap_lanes(lanes, instrument.string_count(), total)
                };
            }
        }
        session
    }

    pub fn mode(&self) -> EditorMode {
        self.mode
    }

    pub fn editing_id(&self) -> Option<&str> {
        self.editing_id.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    pub fn instrument(&self) -> Instrument {
        self.instrument
    }

    pub fn time_signature(&self) -> TimeSignature {
        self.time_signature
    }

    pub fn total_steps(&self) -> usize {
        self.time_signature.describe().total_steps
    }

    /// Changing the signature starts both grids over.
    pub fn set_time_signature(&mut self, ts: TimeSignature) {
        if ts == self.time_signature {
            return;
        }
        self.time_signature = ts;
        self.reset_grids();
    }

    pub fn kind(&self) -> PatternKind {
        self.kind
    }

    /// Changing the type starts both grids over.
    pub fn set_kind(&mut self, kind: PatternKind) {
        if kind == self.kind {
            return;
        }
        self.kind = kind;
        self.reset_grids();
    }

    /// Empty the grid of the current type.
    pub fn clear(&mut self) {
        let total = self.total_steps();
        match self.kind {
            PatternKind::Strum => self.strum = vec![StrumCell::rest(); total],
            PatternKind::Arpeggio => self.arpeggio = fresh_lanes(self.instrument, total),
        }
        self.end_gesture();
    }

    fn reset_grids(&mut self) {
        let total = self.total_steps();
        self.strum = vec![StrumCell::rest(); total];
        self.arpeggio = fresh_lanes(self.instrument, total);
        self.end_gesture();
    }

    pub fn strum_cells(&self) -> &[StrumCell] {
        &self.strum
    }

    pub fn arpeggio_lanes(&self) -> &[Vec<ArpeggioCell>] {
        &self.arpeggio
    }

    pub fn grid(&self) -> PatternGrid {
        match self.kind {
            PatternKind::Strum => PatternGrid::Strum(self.strum.clone()),
            PatternKind::Arpeggio => PatternGrid::Arpeggio(self.arpeggio.clone()),
        }
    }

    /// The grid as it stands, for the preview player.
    pub fn preview_pattern(&self) -> RhythmPattern {
        RhythmPattern {
            id: PREVIEW_PATTERN_ID.to_string(),
            name: self.save_name(),
            time_signature: self.time_signature,
            grid: self.grid(),
        }
    }

    pub fn preview_chord(&self) -> &str {
        &self.preview_chord
    }

    pub fn set_preview_chord(&mut self, name: &str) {
        self.preview_chord = name.to_string();
    }

    pub fn preview_bpm(&self) -> u16 {
        self.preview_bpm
    }

    pub fn set_preview_bpm(&mut self, bpm: u16) {
        self.preview_bpm = sanitize_bpm(bpm);
    }

    // ─── Pointer gestures ───────────────────────────────────────────

    /// Left press on a strum step. Starts a paint gesture with the kind
    /// the step cycled to.
    pub fn press_strum(&mut self, step: usize) -> bool {
        match cycle_strum(&mut self.strum, step) {
            Some(kind) => {
                self.draw_kind = Some(kind);
                true
            }
            None => false,
        }
    }

    /// Pointer entered a strum step with the button held.
    pub fn enter_strum(&mut self, step: usize) -> bool {
        match self.draw_kind {
            Some(kind) => paint_strum(&mut self.strum, step, kind),
            None => false,
        }
    }

    pub fn right_click_strum(&mut self, step: usize) -> bool {
        toggle_strum_accent(&mut self.strum, step)
    }

    pub fn click_arpeggio(&mut self, lane: usize, step: usize) -> ArpeggioClick {
        match self.arpeggio.get_mut(lane) {
            Some(cells) => toggle_arpeggio(cells, step),
            None => ArpeggioClick::Ignored,
        }
    }

    pub fn right_click_arpeggio(&mut self, lane: usize, step: usize) -> bool {
        match self.arpeggio.get_mut(lane) {
            Some(cells) => toggle_arpeggio_accent(cells, step),
            None => false,
        }
    }

    /// Grab the resize handle of the cell at `step`. `lane` is `None` for
    /// the strum lane.
    pub fn begin_resize(&mut self, lane: Option<usize>, step: usize, x: f64, cell_width: f64) -> bool {
        let initial = match lane {
            None => self
                .strum
                .get(step)
                .filter(|c| c.kind != StrumKind::Rest)
                .map(|c| c.duration),
            Some(l) => self
                .arpeggio
                .get(l)
                .and_then(|cells| cells.get(step))
                .filter(|c| c.active)
                .map(|c| c.duration),
        };
        let Some(initial_duration) = initial else {
            return false;
        };
        self.drag = Some(ResizeDrag {
            lane,
            step,
            start_x: x,
            cell_width,
            initial_duration,
        });
        true
    }

    /// Pointer moved during a resize. Returns the duration now applied.
    pub fn drag_resize(&mut self, x: f64) -> Option<usize> {
        let drag = self.drag?;
        let requested = drag.requested(x);
        match drag.lane {
            None => resize_span(&mut self.strum, drag.step, requested),
            Some(l) => resize_span(self.arpeggio.get_mut(l)?, drag.step, requested),
        }
    }

    pub fn is_resizing(&self) -> bool {
        self.drag.is_some()
    }

    pub fn is_painting(&self) -> bool {
        self.draw_kind.is_some()
    }

    /// Button released: end any paint or resize gesture.
    pub fn end_gesture(&mut self) {
        self.draw_kind = None;
        self.drag = None;
    }

    // ─── Saving ─────────────────────────────────────────────────────

    fn save_name(&self) -> String {
        let trimmed = self.name.trim();
        if trimmed.is_empty() {
            UNNAMED_PATTERN.to_string()
        } else {
            trimmed.to_string()
        }
    }

    /// Store the pattern and make it active. Edits replace the original
    /// unless `as_new` is set; everything else is appended under a fresh
    /// id. Returns the saved id.
    pub fn save(&self, store: &mut PatternStore, as_new: bool) -> String {
        let id = match (&self.editing_id, self.mode, as_new) {
            (Some(id), EditorMode::Edit, false) => id.clone(),
            _ => fresh_custom_id(store),
        };
        let pattern = RhythmPattern {
            id: id.clone(),
            name: self.save_name(),
            time_signature: self.time_signature,
            grid: self.grid(),
        };
        log::info!(target: "editor", "saved pattern '{}' ({})", pattern.name, id);
        store.upsert_custom(pattern);
        store.set_active(&id);
        id
    }
}

fn fresh_lanes(instrument: Instrument, total: usize) -> Vec<Vec<ArpeggioCell>> {
    vec![vec![ArpeggioCell::inactive(); total]; instrument.string_count()]
}

/// `custom_<unix millis>`, bumped past any id already in the store.
fn fresh_custom_id(store: &PatternStore) -> String {
    let mut millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    loop {
        let id = format!("custom_{}", millis);
        if store.get(&id).is_none() {
            return id;
        }
        millis += 1;
    }
}

/// The note that lets a newly placed arpeggio step be heard: one string
/// of the preview chord. `None` for a muted or missing string.
pub fn audition_note(pitches: &[Option<Pitch>], lane: usize) -> Option<NoteEvent> {
    let pitch = pitches.get(lane).copied().flatten()?;
    Some(NoteEvent {
        pitch,
        accented: false,
        duration_secs: AUDITION_SECS,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use strumkit_types::spans_are_valid;

    fn store() -> PatternStore {
        PatternStore::new()
    }

    #[test]
    fn new_session_defaults() {
        let s = EditorSession::new_pattern(Instrument::Ukulele);
        assert_eq!(s.mode(), EditorMode::New);
        assert_eq!(s.name(), "New Pattern");
        assert_eq!(s.kind(), PatternKind::Arpeggio);
        assert_eq!(s.time_signature(), TimeSignature::FourFour);
        assert_eq!(s.arpeggio_lanes().len(), 4);
        assert_eq!(s.strum_cells().len(), 16);
        assert_eq!(s.preview_chord(), "C");
    }

    #[test]
    fn presets_open_as_copies() {
        let store = store();
        let waltz = store.get("waltz").unwrap();
        let s = EditorSession::open(waltz, true, Instrument::Ukulele);
        assert_eq!(s.mode(), EditorMode::Clone);
        assert_eq!(s.name(), "Copy of Waltz Strum");
        assert_eq!(s.total_steps(), 12);
        assert_eq!(s.grid(), waltz.grid);
    }

    #[test]
    fn ukulele_arpeggio_opens_on_guitar_remapped() {
        let store = store();
        let arp = store.get("ascending-8th").unwrap();
        let s = EditorSession::open(arp, true, Instrument::Guitar);
        let lanes = s.arpeggio_lanes();
        assert_eq!(lanes.len(), 6);
        let PatternGrid::Arpeggio(source) = &arp.grid else {
            panic!("ascending-8th should be an arpeggio");
        };
        assert_eq!(lanes[5], source[3]);
        assert_eq!(lanes[2], source[0]);
        assert!(lanes[0].iter().all(|c| !c.active));
    }

    #[test]
    fn time_signature_change_resets_grid() {
        let mut s = EditorSession::new_pattern(Instrument::Ukulele);
        s.set_kind(PatternKind::Strum);
        s.press_strum(0);
        s.set_time_signature(TimeSignature::SixEight);
        assert_eq!(s.strum_cells().len(), 12);
        assert!(s.strum_cells().iter().all(|c| c.kind == StrumKind::Rest));
        assert!(!s.is_painting());
    }

    #[test]
    fn same_time_signature_keeps_grid() {
        let mut s = EditorSession::new_pattern(Instrument::Ukulele);
        s.click_arpeggio(0, 0);
        s.set_time_signature(TimeSignature::FourFour);
        assert!(s.arpeggio_lanes()[0][0].active);
    }

    #[test]
    fn press_then_drag_paints_rests() {
        let mut s = EditorSession::new_pattern(Instrument::Ukulele);
        s.set_kind(PatternKind::Strum);
        assert!(s.press_strum(0));
        assert!(s.enter_strum(1));
        assert!(s.enter_strum(2));
        s.end_gesture();
        assert!(!s.enter_strum(3));
        let kinds: Vec<_> = s.strum_cells()[..4].iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![StrumKind::Down, StrumKind::Down, StrumKind::Down, StrumKind::Rest]
        );
    }

    #[test]
    fn resize_gesture_clamps() {
        let mut s = EditorSession::new_pattern(Instrument::Ukulele);
        s.click_arpeggio(1, 0);
        s.click_arpeggio(1, 3);
        assert!(s.begin_resize(Some(1), 0, 100.0, 10.0));
        assert_eq!(s.drag_resize(160.0), Some(3));
        assert_eq!(s.drag_resize(120.0), Some(3));
        assert_eq!(s.drag_resize(105.0), Some(2));
        s.end_gesture();
        assert_eq!(s.drag_resize(200.0), None);
        assert!(spans_are_valid(&s.arpeggio_lanes()[1]));
        assert_eq!(s.arpeggio_lanes()[1][0].duration, 2);
    }

    #[test]
    fn resize_needs_placed_cell() {
        let mut s = EditorSession::new_pattern(Instrument::Ukulele);
        assert!(!s.begin_resize(Some(0), 0, 0.0, 10.0));
        assert!(!s.begin_resize(None, 0, 0.0, 10.0));
        assert!(!s.begin_resize(Some(9), 0, 0.0, 10.0));
    }

    #[test]
    fn save_new_appends_and_activates() {
        let mut store = store();
        let mut s = EditorSession::new_pattern(Instrument::Ukulele);
        s.set_name("   ");
        s.click_arpeggio(0, 0);
        let id = s.save(&mut store, false);
        assert!(id.starts_with("custom_"));
        assert_eq!(store.active_id(), id);
        assert_eq!(store.get(&id).unwrap().name, "Unnamed Pattern");

        let second = s.save(&mut store, false);
        assert_ne!(id, second);
        assert_eq!(store.custom().len(), 2);
    }

    #[test]
    fn save_edit_replaces_unless_as_new() {
        let mut store = store();
        let mut s = EditorSession::new_pattern(Instrument::Ukulele);
        s.set_name("Mine");
        let id = s.save(&mut store, false);

        let mut edit = EditorSession::open(store.get(&id).unwrap(), false, Instrument::Ukulele);
        assert_eq!(edit.mode(), EditorMode::Edit);
        edit.set_name("Mine v2");
        assert_eq!(edit.save(&mut store, false), id);
        assert_eq!(store.custom().len(), 1);
        assert_eq!(store.get(&id).unwrap().name, "Mine v2");

        let copy = edit.save(&mut store, true);
        assert_ne!(copy, id);
        assert_eq!(store.custom().len(), 2);
    }

    #[test]
    fn clone_never_overwrites_preset() {
        let mut store = store();
        let s = EditorSession::open(store.get("waltz").unwrap(), true, Instrument::Ukulele);
        let id = s.save(&mut store, false);
        assert_ne!(id, "waltz");
        assert_eq!(store.get("waltz").unwrap().name, "Waltz Strum");
    }

    #[test]
    fn audition_uses_lane_pitch() {
        let pitches = vec![Pitch::from_midi(67), Pitch::from_midi(60), None, Pitch::from_midi(69)];
        let note = audition_note(&pitches, 1).unwrap();
        assert_eq!(note.pitch.midi(), 60);
        assert!(!note.accented);
        assert!((note.duration_secs - AUDITION_SECS).abs() < 1e-12);
        assert!(audition_note(&pitches, 2).is_none());
        assert!(audition_note(&pitches, 9).is_none());
    }
}
