//! Pitch resolution: which note sounds on each string of a voicing.
//!
//! Pure functions, no audio dependencies. Spelling is sharp-only.

pub mod order;

use thiserror::Error;

use crate::chord::{Diagram, Fret};
use crate::instrument::Instrument;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PitchClass {
    C,
    Cs,
    D,
    Ds,
    E,
    F,
    Fs,
    G,
    Gs,
    A,
    As,
    B,
}

impl PitchClass {
    pub const ALL: [PitchClass; 12] = [
        PitchClass::C,
        PitchClass::Cs,
        PitchClass::D,
        PitchClass::Ds,
        PitchClass::E,
        PitchClass::F,
        PitchClass::Fs,
        PitchClass::G,
        PitchClass::Gs,
        PitchClass::A,
        PitchClass::As,
        PitchClass::B,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            PitchClass::C => "C",
            PitchClass::Cs => "C#",
            PitchClass::D => "D",
            PitchClass::Ds => "D#",
            PitchClass::E => "E",
            PitchClass::F => "F",
            PitchClass::Fs => "F#",
            PitchClass::G => "G",
            PitchClass::Gs => "G#",
            PitchClass::A => "A",
            PitchClass::As => "A#",
            PitchClass::B => "B",
        }
    }

    pub fn semitone(&self) -> u8 {
        *self as u8
    }
}

/// A sounding note, stored as a MIDI number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pitch(u8);

impl Pitch {
    pub fn from_midi(midi: u8) -> Option<Self> {
        (midi <= 127).then_some(Pitch(midi))
    }

    pub fn midi(&self) -> u8 {
        self.0
    }

    pub fn class(&self) -> PitchClass {
        PitchClass::ALL[(self.0 % 12) as usize]
    }

    pub fn octave(&self) -> i8 {
        (self.0 / 12) as i8 - 1
    }

    /// Name with octave, e.g. "C#4".
    pub fn name(&self) -> String {
        format!("{}{}", self.class().name(), self.octave())
    }

    /// Equal-tempered frequency, A4 = 440 Hz.
    pub fn frequency(&self) -> f64 {
        440.0 * 2f64.powf((self.0 as f64 - 69.0) / 12.0)
    }
}

impl std::fmt::Display for Pitch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.class().name(), self.octave())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("{instrument} has {expected} strings but the voicing lists {found}")]
    StringCount {
        instrument: Instrument,
        expected: usize,
        found: usize,
    },
    #[error("fret {fret} on string {string} is out of MIDI range")]
    OutOfRange { string: usize, fret: u8 },
}

/// Resolve frets given in tuning order (lowest string first).
///
/// The result has one slot per string; muted strings are `None` so indices
/// stay aligned with the tuning table and arpeggio lanes.
pub fn resolve(frets: &[Fret], instrument: Instrument) -> Result<Vec<Option<Pitch>>, ResolveError> {
    let tuning = instrument.open_strings_midi();
    if frets.len() != tuning.len() {
        return Err(ResolveError::StringCount {
            instrument,
            expected: tuning.len(),
            found: frets.len(),
        });
    }

    frets
        .iter()
        .zip(tuning)
        .enumerate()
        .map(|(string, (fret, open))| match fret {
            Fret::Muted => Ok(None),
            Fret::At(n) => {
                let midi = u16::from(*open) + u16::from(*n);
                u8::try_from(midi)
                    .ok()
                    .and_then(Pitch::from_midi)
                    .map(Some)
                    .ok_or(ResolveError::OutOfRange { string, fret: *n })
            }
        })
        .collect()
}

/// Resolve a diagram, whose frets are stored highest string first.
pub fn resolve_diagram(
    diagram: &Diagram,
    instrument: Instrument,
) -> Result<Vec<Option<Pitch>>, ResolveError> {
    resolve(&order::to_tuning_order(&diagram.frets), instrument)
}

/// Only the strings that sound, lowest first.
pub fn sounding(pitches: &[Option<Pitch>]) -> Vec<Pitch> {
    pitches.iter().flatten().copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(pitches: &[Option<Pitch>]) -> Vec<Option<String>> {
        pitches.iter().map(|p| p.map(|p| p.name())).collect()
    }

    #[test]
    fn ukulele_open_strings() {
        let frets = [Fret::At(0); 4];
        let resolved = resolve(&frets, Instrument::Ukulele).unwrap();
        assert_eq!(
            names(&resolved),
            vec![
                Some("G4".to_string()),
                Some("C4".to_string()),
                Some("E4".to_string()),
                Some("A4".to_string())
            ]
        );
    }

    #[test]
    fn fretting_lowest_string_moves_only_that_entry() {
        let open = resolve(&[Fret::At(0); 4], Instrument::Ukulele).unwrap();
        let fretted = resolve(
            &[Fret::At(2), Fret::At(0), Fret::At(0), Fret::At(0)],
            Instrument::Ukulele,
        )
        .unwrap();
        assert_eq!(fretted[0].unwrap().midi(), open[0].unwrap().midi() + 2);
        assert_eq!(fretted[0].unwrap().name(), "A4");
        assert_eq!(&fretted[1..], &open[1..]);
    }

    #[test]
    fn octave_carries_at_twelve_semitones() {
        // A4 + 3 = C5
        let resolved = resolve(
            &[Fret::At(0), Fret::At(0), Fret::At(0), Fret::At(3)],
            Instrument::Ukulele,
        )
        .unwrap();
        assert_eq!(resolved[3].unwrap().name(), "C5");

        // B3 + 1 = C4
        let guitar = resolve(
            &[Fret::Muted, Fret::Muted, Fret::Muted, Fret::Muted, Fret::At(1), Fret::Muted],
            Instrument::Guitar,
        )
        .unwrap();
        assert_eq!(guitar[4].unwrap().name(), "C4");
    }

    #[test]
    fn muted_strings_keep_alignment() {
        let resolved = resolve(
            &[Fret::Muted, Fret::At(0), Fret::At(0), Fret::At(3)],
            Instrument::Ukulele,
        )
        .unwrap();
        assert_eq!(resolved.len(), 4);
        assert!(resolved[0].is_none());
        assert_eq!(sounding(&resolved).len(), 3);
    }

    #[test]
    fn guitar_e_major() {
        let frets = [Fret::At(0), Fret::At(2), Fret::At(2), Fret::At(1), Fret::At(0), Fret::At(0)];
        let resolved = resolve(&frets, Instrument::Guitar).unwrap();
        let expected = ["E2", "B2", "E3", "G#3", "B3", "E4"];
        for (pitch, name) in resolved.iter().zip(expected) {
            assert_eq!(pitch.unwrap().name(), name);
        }
    }

    #[test]
    fn string_count_mismatch_is_an_error() {
        let err = resolve(&[Fret::At(0); 6], Instrument::Ukulele).unwrap_err();
        assert_eq!(
            err,
            ResolveError::StringCount {
                instrument: Instrument::Ukulele,
                expected: 4,
                found: 6
            }
        );
    }

    #[test]
    fn diagram_frets_are_reversed_before_lookup() {
        // Drawn A E C G; C major shape has the A string on fret 3.
        let diagram = Diagram {
            start_fret: 1,
            frets: vec![Fret::At(3), Fret::At(0), Fret::At(0), Fret::At(0)],
            barres: vec![],
            fingering: vec![],
            position: String::new(),
            intervals: vec![],
        };
        let resolved = resolve_diagram(&diagram, Instrument::Ukulele).unwrap();
        assert_eq!(resolved[0].unwrap().name(), "G4");
        assert_eq!(resolved[3].unwrap().name(), "C5");
    }

    #[test]
    fn deterministic() {
        let frets = [Fret::At(2), Fret::At(2), Fret::At(2), Fret::At(0)];
        assert_eq!(
            resolve(&frets, Instrument::Ukulele),
            resolve(&frets, Instrument::Ukulele)
        );
    }

    #[test]
    fn frequency_reference() {
        let a4 = Pitch::from_midi(69).unwrap();
        assert!((a4.frequency() - 440.0).abs() < 1e-9);
    }
}
