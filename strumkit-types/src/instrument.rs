use serde::{Deserialize, Serialize};

/// Fretted instruments with a chord library and tuning table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Instrument {
    #[default]
    Ukulele,
    Guitar,
}

/// Re-entrant G4 C4 E4 A4.
const UKULELE_OPEN_MIDI: [u8; 4] = [67, 60, 64, 69];
/// E2 A2 D3 G3 B3 E4.
const GUITAR_OPEN_MIDI: [u8; 6] = [40, 45, 50, 55, 59, 64];

impl Instrument {
    pub const ALL: [Instrument; 2] = [Instrument::Ukulele, Instrument::Guitar];

    pub fn name(&self) -> &'static str {
        match self {
            Instrument::Ukulele => "Ukulele",
            Instrument::Guitar => "Guitar",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "ukulele" | "uke" => Some(Instrument::Ukulele),
            "guitar" => Some(Instrument::Guitar),
            _ => None,
        }
    }

    pub fn string_count(&self) -> usize {
        self.open_strings_midi().len()
    }

    /// Open-string MIDI pitches in tuning order (first string listed first
    /// in chord data, i.e. the G of GCEA and the low E of EADGBE).
    pub fn open_strings_midi(&self) -> &'static [u8] {
        match self {
            Instrument::Ukulele => &UKULELE_OPEN_MIDI,
            Instrument::Guitar => &GUITAR_OPEN_MIDI,
        }
    }

    pub fn toggle(&self) -> Self {
        match self {
            Instrument::Ukulele => Instrument::Guitar,
            Instrument::Guitar => Instrument::Ukulele,
        }
    }
}

impl std::fmt::Display for Instrument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
