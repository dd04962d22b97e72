//! # strumkit-types
//!
//! Shared type definitions for strumkit: time signatures, rhythm patterns,
//! chord diagrams and practice sets, plus the pure pitch resolver.
//! Everything here is plain data or side-effect-free functions.

pub mod chord;
pub mod instrument;
pub mod pattern;
pub mod time_signature;
pub mod tuning;

pub use chord::{voicing_id, Barre, ChordGroup, Diagram, Finger, Fret, PracticeSetItem, SavedSet};
pub use instrument::Instrument;
pub use pattern::{
    span_owner, spans_are_valid, ArpeggioCell, GridCell, PatternGrid, PatternKind, RhythmPattern,
    StrumCell, StrumKind,
};
pub use time_signature::{TimeSignature, TimeSignatureInfo};
pub use tuning::{Pitch, PitchClass, ResolveError};

/// Lowest tempo accepted by the transport.
pub const MIN_BPM: u16 = 40;
/// Highest tempo accepted by the transport.
pub const MAX_BPM: u16 = 240;
/// Tempo used when none (or an out-of-range one) is given.
pub const DEFAULT_BPM: u16 = 120;

/// Out-of-range tempos fall back to the default instead of saturating.
pub fn sanitize_bpm(bpm: u16) -> u16 {
    if (MIN_BPM..=MAX_BPM).contains(&bpm) {
        bpm
    } else {
        DEFAULT_BPM
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bpm_in_range_is_kept() {
        assert_eq!(sanitize_bpm(40), 40);
        assert_eq!(sanitize_bpm(96), 96);
        assert_eq!(sanitize_bpm(240), 240);
    }

    #[test]
    fn bpm_out_of_range_falls_back() {
        assert_eq!(sanitize_bpm(0), DEFAULT_BPM);
        assert_eq!(sanitize_bpm(39), DEFAULT_BPM);
        assert_eq!(sanitize_bpm(241), DEFAULT_BPM);
    }
}
