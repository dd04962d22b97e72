//! Rhythm pattern types.
//!
//! A pattern is a grid of cells over one measure. A cell with duration N
//! occupies the N-1 steps after it; those steps must hold placeholder cells
//! (rest / inactive, duration 1) so no two spans overlap.

use serde::{Deserialize, Serialize};

use crate::time_signature::{TimeSignature, TimeSignatureInfo};

/// What a strum-lane step does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrumKind {
    #[default]
    Rest,
    Down,
    Up,
    Mute,
}

impl StrumKind {
    /// Click cycle: rest -> down -> up -> mute -> rest.
    pub fn next(self) -> Self {
        match self {
            StrumKind::Rest => StrumKind::Down,
            StrumKind::Down => StrumKind::Up,
            StrumKind::Up => StrumKind::Mute,
            StrumKind::Mute => StrumKind::Rest,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            StrumKind::Rest => '·',
            StrumKind::Down => '↓',
            StrumKind::Up => '↑',
            StrumKind::Mute => 'x',
        }
    }

    /// Down and up strums can carry an accent; rests and mutes cannot.
    pub fn accepts_accent(self) -> bool {
        matches!(self, StrumKind::Down | StrumKind::Up)
    }
}

/// One step of a strum lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrumCell {
    #[serde(rename = "type")]
    pub kind: StrumKind,
    #[serde(rename = "accent")]
    pub accented: bool,
    /// Length in steps, at least 1.
    pub duration: usize,
}

impl StrumCell {
    pub fn new(kind: StrumKind, accented: bool, duration: usize) -> Self {
        Self {
            kind,
            accented,
            duration: duration.max(1),
        }
    }

    pub fn rest() -> Self {
        Self::new(StrumKind::Rest, false, 1)
    }
}

impl Default for StrumCell {
    fn default() -> Self {
        Self::rest()
    }
}

/// One step of one string lane in an arpeggio grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArpeggioCell {
    pub active: bool,
    #[serde(rename = "accent")]
    pub accented: bool,
    pub duration: usize,
}

impl ArpeggioCell {
    pub fn new(active: bool, accented: bool, duration: usize) -> Self {
        Self {
            active,
            accented,
            duration: duration.max(1),
        }
    }

    pub fn inactive() -> Self {
        Self::new(false, false, 1)
    }
}

impl Default for ArpeggioCell {
    fn default() -> Self {
        Self::inactive()
    }
}

/// Common view of strum and arpeggio cells for span bookkeeping.
pub trait GridCell: Copy {
    /// True for non-rest strum cells and active arpeggio cells.
    fn is_placed(&self) -> bool;
    fn duration(&self) -> usize;
    fn set_duration(&mut self, steps: usize);
    fn placeholder() -> Self;
}

impl GridCell for StrumCell {
    fn is_placed(&self) -> bool {
        self.kind != StrumKind::Rest
    }
    fn duration(&self) -> usize {
        self.duration
    }
    fn set_duration(&mut self, steps: usize) {
        self.duration = steps.max(1);
    }
    fn placeholder() -> Self {
        StrumCell::rest()
    }
}

impl GridCell for ArpeggioCell {
    fn is_placed(&self) -> bool {
        self.active
    }
    fn duration(&self) -> usize {
        self.duration
    }
    fn set_duration(&mut self, steps: usize) {
        self.duration = steps.max(1);
    }
    fn placeholder() -> Self {
        ArpeggioCell::inactive()
    }
}

/// Index of the cell whose span covers `step`: the nearest earlier placed
/// cell reaching this far, otherwise `step` itself.
pub fn span_owner<C: GridCell>(lane: &[C], step: usize) -> usize {
    let step = step.min(lane.len().saturating_sub(1));
    for i in (0..step).rev() {
        let cell = &lane[i];
        if cell.is_placed() && cell.duration() > step - i {
            return i;
        }
    }
    step
}

/// Check that every span stays inside the lane, covers only placeholders,
/// and that placeholders have duration 1.
pub fn spans_are_valid<C: GridCell>(lane: &[C]) -> bool {
    let mut covered_until = 0;
    for (i, cell) in lane.iter().enumerate() {
        if i < covered_until {
            if cell.is_placed() || cell.duration() != 1 {
                return false;
            }
            continue;
        }
        if cell.is_placed() {
            if i + cell.duration() > lane.len() {
                return false;
            }
            covered_until = i + cell.duration();
        } else if cell.duration() != 1 {
            return false;
        }
    }
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternKind {
    Strum,
    Arpeggio,
}

impl PatternKind {
    pub fn name(&self) -> &'static str {
        match self {
            PatternKind::Strum => "strum",
            PatternKind::Arpeggio => "arpeggio",
        }
    }
}

/// Cells of a pattern. Arpeggio lanes are ordered lowest string first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PatternGrid {
    Strum(Vec<StrumCell>),
    Arpeggio(Vec<Vec<ArpeggioCell>>),
}

impl PatternGrid {
    pub fn fresh_strum(total_steps: usize) -> Self {
        PatternGrid::Strum(vec![StrumCell::rest(); total_steps])
    }

    pub fn fresh_arpeggio(lanes: usize, total_steps: usize) -> Self {
        PatternGrid::Arpeggio(vec![vec![ArpeggioCell::inactive(); total_steps]; lanes])
    }

    pub fn kind(&self) -> PatternKind {
        match self {
            PatternGrid::Strum(_) => PatternKind::Strum,
            PatternGrid::Arpeggio(_) => PatternKind::Arpeggio,
        }
    }

    pub fn is_valid(&self) -> bool {
        match self {
            PatternGrid::Strum(cells) => spans_are_valid(cells),
            PatternGrid::Arpeggio(lanes) => lanes.iter().all(|lane| spans_are_valid(lane)),
        }
    }
}

/// A named rhythm over one measure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PatternRecord", into = "PatternRecord")]
pub struct RhythmPattern {
    pub id: String,
    pub name: String,
    pub time_signature: TimeSignature,
    pub grid: PatternGrid,
}

impl RhythmPattern {
    pub fn kind(&self) -> PatternKind {
        self.grid.kind()
    }

    pub fn info(&self) -> TimeSignatureInfo {
        self.time_signature.describe()
    }

    pub fn total_steps(&self) -> usize {
        self.info().total_steps
    }
}

/// On-disk shape: `{id, name, timeSignature, type, pattern}`.
#[derive(Serialize, Deserialize)]
struct PatternRecord {
    id: String,
    name: String,
    #[serde(rename = "timeSignature")]
    time_signature: TimeSignature,
    #[serde(rename = "type")]
    kind: PatternKind,
    pattern: PatternGrid,
}

impl TryFrom<PatternRecord> for RhythmPattern {
    type Error = String;

    fn try_from(record: PatternRecord) -> Result<Self, Self::Error> {
        let grid = match (record.kind, record.pattern) {
            // An empty list decodes as a strum grid whatever it was meant to be.
            (PatternKind::Arpeggio, PatternGrid::Strum(cells)) if cells.is_empty() => {
                PatternGrid::Arpeggio(Vec::new())
            }
            (kind, grid) if kind == grid.kind() => grid,
            (kind, _) => {
                return Err(format!(
                    "pattern '{}' is declared {} but its cells do not match",
                    record.id,
                    kind.name()
                ))
            }
        };
        Ok(RhythmPattern {
            id: record.id,
            name: record.name,
            time_signature: record.time_signature,
            grid,
        })
    }
}

impl From<RhythmPattern> for PatternRecord {
    fn from(pattern: RhythmPattern) -> Self {
        PatternRecord {
            id: pattern.id,
            name: pattern.name,
            time_signature: pattern.time_signature,
            kind: pattern.grid.kind(),
            pattern: pattern.grid,
        }
    }
}
