//! Time signatures and the step grid they imply.
//!
//! Every pattern step is a sixteenth note. The grid shape for each signature
//! comes from a fixed table rather than from parsing the label.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TimeSignature {
    TwoTwo,
    TwoFour,
    ThreeFour,
    #[default]
    FourFour,
    ThreeEight,
    SixEight,
    NineEight,
    TwelveEight,
}

/// Grid shape derived from a time signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSignatureInfo {
    pub beats_per_measure: u8,
    pub beat_unit: u8,
    /// Sixteenth-note steps per counted beat.
    pub subdivisions_per_beat: u8,
    pub total_steps: usize,
}

impl TimeSignature {
    pub const ALL: [TimeSignature; 8] = [
        TimeSignature::FourFour,
        TimeSignature::ThreeFour,
        TimeSignature::TwoFour,
        TimeSignature::TwoTwo,
        TimeSignature::SixEight,
        TimeSignature::ThreeEight,
        TimeSignature::NineEight,
        TimeSignature::TwelveEight,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            TimeSignature::TwoTwo => "2/2",
            TimeSignature::TwoFour => "2/4",
            TimeSignature::ThreeFour => "3/4",
            TimeSignature::FourFour => "4/4",
            TimeSignature::ThreeEight => "3/8",
            TimeSignature::SixEight => "6/8",
            TimeSignature::NineEight => "9/8",
            TimeSignature::TwelveEight => "12/8",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|ts| ts.label() == label.trim())
    }

    /// Parse a label, falling back to 4/4 for anything unrecognised.
    pub fn from_label_or_default(label: &str) -> Self {
        Self::from_label(label).unwrap_or_default()
    }

    pub fn is_compound(&self) -> bool {
        self.beat_unit() == 8
    }

    pub fn beat_unit(&self) -> u8 {
        self.describe().beat_unit
    }

    pub fn describe(&self) -> TimeSignatureInfo {
        let (beats_per_measure, beat_unit, subdivisions_per_beat) = match self {
            // Simple time, one beat per written unit.
            TimeSignature::TwoTwo => (2, 2, 8),
            TimeSignature::TwoFour => (2, 4, 4),
            TimeSignature::ThreeFour => (3, 4, 4),
            TimeSignature::FourFour => (4, 4, 4),
            // 3/8 counts eighths; the others count dotted quarters.
            TimeSignature::ThreeEight => (3, 8, 2),
            TimeSignature::SixEight => (2, 8, 6),
            TimeSignature::NineEight => (3, 8, 6),
            TimeSignature::TwelveEight => (4, 8, 6),
        };
        TimeSignatureInfo {
            beats_per_measure,
            beat_unit,
            subdivisions_per_beat,
            total_steps: beats_per_measure as usize * subdivisions_per_beat as usize,
        }
    }

    /// Step after this one in `ALL`, wrapping.
    pub fn next(&self) -> Self {
        let idx = Self::ALL.iter().position(|ts| ts == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

/// Describe a raw label. Unknown labels get the 4/4 shape.
pub fn describe(label: &str) -> TimeSignatureInfo {
    TimeSignature::from_label_or_default(label).describe()
}

impl TimeSignatureInfo {
    /// Length of one step in seconds at the given tempo.
    pub fn step_duration_secs(&self, bpm: u16) -> f64 {
        (60.0 / bpm.max(1) as f64) / self.subdivisions_per_beat as f64
    }
}

impl From<String> for TimeSignature {
    fn from(label: String) -> Self {
        TimeSignature::from_label_or_default(&label)
    }
}

impl From<TimeSignature> for String {
    fn from(ts: TimeSignature) -> Self {
        ts.label().to_string()
    }
}

impl std::fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_steps_is_beats_times_subdivisions() {
        for ts in TimeSignature::ALL {
            let info = ts.describe();
            assert_eq!(
                info.total_steps,
                info.beats_per_measure as usize * info.subdivisions_per_beat as usize,
                "{}",
                ts
            );
        }
    }

    #[test]
    fn table_values() {
        assert_eq!(TimeSignature::FourFour.describe().total_steps, 16);
        assert_eq!(TimeSignature::SixEight.describe().total_steps, 12);
        assert_eq!(TimeSignature::ThreeEight.describe().total_steps, 6);
        assert_eq!(TimeSignature::ThreeFour.describe().total_steps, 12);
        assert_eq!(TimeSignature::TwoTwo.describe().subdivisions_per_beat, 8);
        assert_eq!(TimeSignature::TwelveEight.describe().total_steps, 24);
    }

    #[test]
    fn unknown_label_falls_back_to_four_four() {
        assert_eq!(describe("5/4"), TimeSignature::FourFour.describe());
        assert_eq!(describe(""), TimeSignature::FourFour.describe());
        assert_eq!(TimeSignature::from_label("7/8"), None);
    }

    #[test]
    fn labels_round_trip() {
        for ts in TimeSignature::ALL {
            assert_eq!(TimeSignature::from_label(ts.label()), Some(ts));
        }
    }

    #[test]
    fn step_duration_at_120() {
        let info = TimeSignature::FourFour.describe();
        assert!((info.step_duration_secs(120) - 0.125).abs() < 1e-12);
    }

    #[test]
    fn serde_uses_label() {
        let json = serde_json::to_string(&TimeSignature::SixEight).unwrap();
        assert_eq!(json, "\"6/8\"");
        let back: TimeSignature = serde_json::from_str("\"13/16\"").unwrap();
        assert_eq!(back, TimeSignature::FourFour);
    }
}
