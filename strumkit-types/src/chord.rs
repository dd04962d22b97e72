//! Chord diagrams and practice sets.
//!
//! Diagram string arrays are stored highest string first, the order they
//! are drawn in. Use [`crate::tuning::order`] to convert for pitch lookup.

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// Fret played on one string. `At(0)` is an open string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fret {
    Muted,
    At(u8),
}

impl Fret {
    pub fn number(&self) -> Option<u8> {
        match self {
            Fret::At(n) => Some(*n),
            Fret::Muted => None,
        }
    }

    /// Fretted (not open, not muted).
    pub fn is_fretted(&self) -> bool {
        matches!(self, Fret::At(n) if *n > 0)
    }

    pub fn symbol(&self) -> String {
        match self {
            Fret::Muted => "x".to_string(),
            Fret::At(n) => n.to_string(),
        }
    }
}

impl Serialize for Fret {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Fret::Muted => serializer.serialize_str("x"),
            Fret::At(n) => serializer.serialize_u8(*n),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawMark {
    Number(u8),
    Text(String),
    Null(()),
}

impl<'de> Deserialize<'de> for Fret {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match RawMark::deserialize(deserializer)? {
            RawMark::Number(n) => Ok(Fret::At(n)),
            RawMark::Text(s) if s.eq_ignore_ascii_case("x") => Ok(Fret::Muted),
            RawMark::Text(s) => Err(de::Error::custom(format!("invalid fret '{}'", s))),
            RawMark::Null(()) => Err(de::Error::custom("fret is null")),
        }
    }
}

/// Finger marker drawn under a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Finger {
    Finger(u8),
    Open,
    Muted,
    Unassigned,
}

impl Finger {
    pub fn symbol(&self) -> String {
        match self {
            Finger::Finger(n) => n.to_string(),
            Finger::Open => "O".to_string(),
            Finger::Muted => "x".to_string(),
            Finger::Unassigned => " ".to_string(),
        }
    }
}

impl Serialize for Finger {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Finger::Finger(n) => serializer.serialize_u8(*n),
            Finger::Open => serializer.serialize_str("O"),
            Finger::Muted => serializer.serialize_str("x"),
            Finger::Unassigned => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for Finger {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RawMark::deserialize(deserializer)? {
            RawMark::Number(0) => Finger::Open,
            RawMark::Number(n) => Finger::Finger(n),
            RawMark::Text(s) if s.eq_ignore_ascii_case("o") => Finger::Open,
            RawMark::Text(s) if s.eq_ignore_ascii_case("x") => Finger::Muted,
            RawMark::Text(_) | RawMark::Null(()) => Finger::Unassigned,
        })
    }
}

/// A barre across a run of strings, indices inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Barre {
    pub fret: u8,
    pub strings: [usize; 2],
}

/// One voicing ready for display and playback.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagram {
    pub start_fret: u8,
    pub frets: Vec<Fret>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub barres: Vec<Barre>,
    #[serde(default)]
    pub fingering: Vec<Finger>,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub intervals: Vec<String>,
}

/// All known voicings for one chord name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChordGroup {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub tuning: String,
    pub diagrams: Vec<Diagram>,
}

/// A voicing picked into the practice set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeSetItem {
    pub id: String,
    pub chord_name: String,
    pub diagram: Diagram,
}

impl PracticeSetItem {
    pub fn new(chord_name: &str, diagram: Diagram) -> Self {
        Self {
            id: voicing_id(chord_name, &diagram),
            chord_name: chord_name.to_string(),
            diagram,
        }
    }
}

/// A named, saved practice set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedSet {
    pub name: String,
    pub voicings: Vec<PracticeSetItem>,
}

/// Stable id for a voicing: chord name, start fret, frets and barres.
pub fn voicing_id(chord_name: &str, diagram: &Diagram) -> String {
    let frets: String = diagram.frets.iter().map(Fret::symbol).collect();
    let barres: String = diagram
        .barres
        .iter()
        .map(|b| format!("{}{}{}", b.fret, b.strings[0], b.strings[1]))
        .collect();
    format!("{}-{}-{}-{}", chord_name, diagram.start_fret, frets, barres)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c_major() -> Diagram {
        Diagram {
            start_fret: 1,
            frets: vec![Fret::At(3), Fret::At(0), Fret::At(0), Fret::At(0)],
            barres: vec![],
            fingering: vec![Finger::Finger(3), Finger::Open, Finger::Open, Finger::Open],
            position: "1".into(),
            intervals: vec!["R".into(), "5".into(), "3".into(), "R".into()],
        }
    }

    #[test]
    fn voicing_id_format() {
        assert_eq!(voicing_id("C", &c_major()), "C-1-3000-");

        let mut barred = c_major();
        barred.barres.push(Barre { fret: 2, strings: [0, 3] });
        assert_eq!(voicing_id("C", &barred), "C-1-3000-203");
    }

    #[test]
    fn fret_serde() {
        let frets: Vec<Fret> = serde_json::from_str(r#"[0, "x", 12]"#).unwrap();
        assert_eq!(frets, vec![Fret::At(0), Fret::Muted, Fret::At(12)]);
        assert_eq!(serde_json::to_string(&frets).unwrap(), r#"[0,"x",12]"#);
        assert!(serde_json::from_str::<Fret>("\"q\"").is_err());
    }

    #[test]
    fn finger_serde() {
        let fingers: Vec<Finger> = serde_json::from_str(r#"[1, "O", "x", null]"#).unwrap();
        assert_eq!(
            fingers,
            vec![Finger::Finger(1), Finger::Open, Finger::Muted, Finger::Unassigned]
        );
    }

    #[test]
    fn practice_item_uses_voicing_id() {
        let item = PracticeSetItem::new("C", c_major());
        assert_eq!(item.id, "C-1-3000-");
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["chordName"], "C");
        assert_eq!(json["diagram"]["startFret"], 1);
    }
}
