//! Chord data files to display-ready chord groups.
//!
//! Input is a JSON array of `{chord, aliases, tuning, voicings}` entries
//! with strings listed lowest first. Voicings come out as [`Diagram`]s in
//! drawing order. Entries that cannot be read are reported and skipped; the
//! rest of the file still loads.

use regex::Regex;
use serde_json::Value;
use strumkit_types::tuning::order;
use strumkit_types::{Barre, ChordGroup, Diagram, Finger, Fret, Instrument};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("chord data is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("chord data must be a JSON array")]
    NotAnArray,
    #[error("entry {index} is not an object")]
    NotAnObject { index: usize },
    #[error("entry {index} has no chord name")]
    MissingChord { index: usize },
    #[error("entry {index} ({chord}) has no voicings list")]
    MissingVoicings { index: usize, chord: String },
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Groups read from one file, plus the entries that were rejected.
#[derive(Debug, Default)]
pub struct IngestReport {
    pub groups: Vec<ChordGroup>,
    pub rejected: Vec<IngestError>,
}

impl IngestReport {
    /// One line for the status bar covering the whole batch.
    pub fn summary(&self) -> String {
        let accepted = self.groups.len();
        match self.rejected.first() {
            None => format!("Imported {} chords", accepted),
            Some(first) => format!(
                "Imported {} chords, skipped {} ({}{})",
                accepted,
                self.rejected.len(),
                first,
                if self.rejected.len() > 1 { ", ..." } else { "" }
            ),
        }
    }
}

/// A voicing as read from the file, lowest string first. `None` frets are
/// nulls in the data.
#[derive(Debug, Clone)]
struct RawVoicing {
    frets: Vec<Option<Fret>>,
    barres: Vec<Barre>,
    fingering: Vec<Finger>,
    intervals: Vec<String>,
    position: String,
}

/// Name patterns for splitting a bare root into major and minor groups.
struct QualityRules {
    bare_root: Regex,
    minor_alias: Regex,
    trailing_m: Regex,
}

impl QualityRules {
    fn new() -> Option<Self> {
        Some(Self {
            bare_root: Regex::new(r"^[A-G][#b]?$").ok()?,
            minor_alias: Regex::new(r"(?i)min").ok()?,
            trailing_m: Regex::new(r"(?i)m$").ok()?,
        })
    }
}

/// Parse chord JSON text.
pub fn parse_chord_json(text: &str, instrument: Instrument) -> Result<IngestReport, IngestError> {
    let value: Value = serde_json::from_str(text)?;
    transform(&value, instrument)
}

/// Turn parsed chord data into chord groups.
///
/// On ukulele a bare root name such as `A` or `Bb` may hold both major and
/// minor voicings; those are split into `A` (voicings with a `3`) and `Am`
/// (voicings with an `m3`). Voicings with neither are dropped.
pub fn transform(value: &Value, instrument: Instrument) -> Result<IngestReport, IngestError> {
    let entries = value.as_array().ok_or(IngestError::NotAnArray)?;
    let rules = QualityRules::new();
    let mut report = IngestReport::default();

    for (index, entry) in entries.iter().enumerate() {
        match read_entry(index, entry, instrument, rules.as_ref()) {
            Ok(groups) => report.groups.extend(groups),
            Err(e) => {
                log::warn!(target: "ingest", "skipping chord entry: {}", e);
                report.rejected.push(e);
            }
        }
    }
    Ok(report)
}

fn read_entry(
    index: usize,
    entry: &Value,
    instrument: Instrument,
    rules: Option<&QualityRules>,
) -> Result<Vec<ChordGroup>, IngestError> {
    let obj = entry.as_object().ok_or(IngestError::NotAnObject { index })?;
    let name = obj
        .get("chord")
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .ok_or(IngestError::MissingChord { index })?
        .to_string();
    let voicings = obj
        .get("voicings")
        .and_then(Value::as_array)
        .ok_or_else(|| IngestError::MissingVoicings {
            index,
            chord: name.clone(),
        })?;
    let aliases = string_list(obj.get("aliases"));
    let tuning = obj
        .get("tuning")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let valid: Vec<RawVoicing> = voicings.iter().filter_map(read_voicing).collect();
    let skipped = voicings.len() - valid.len();
    if skipped > 0 {
        log::debug!(target: "ingest", "{}: skipped {} unusable voicings", name, skipped);
    }

    let mut groups = Vec::new();
    let split = rules.filter(|r| instrument == Instrument::Ukulele && r.bare_root.is_match(&name));
    if let Some(rules) = split {
        let (minor, major): (Vec<_>, Vec<_>) = valid
            .into_iter()
            .filter(|v| has_interval(v, "m3") || has_interval(v, "3"))
            .partition(|v| has_interval(v, "m3"));

        if !major.is_empty() {
            groups.push(ChordGroup {
                name: name.clone(),
                aliases: aliases
                    .iter()
                    .filter(|a| !rules.minor_alias.is_match(a) && !rules.trailing_m.is_match(a))
                    .cloned()
                    .collect(),
                tuning: tuning.clone(),
                diagrams: major.iter().map(to_diagram).collect(),
            });
        }
        if !minor.is_empty() {
            groups.push(ChordGroup {
                name: format!("{}m", name),
                aliases: aliases
                    .iter()
                    .filter(|a| rules.minor_alias.is_match(a))
                    .cloned()
                    .collect(),
                tuning,
                diagrams: minor.iter().map(to_diagram).collect(),
            });
        }
    } else if !valid.is_empty() {
        groups.push(ChordGroup {
            name,
            aliases,
            tuning,
            diagrams: valid.iter().map(to_diagram).collect(),
        });
    }
    Ok(groups)
}

fn has_interval(v: &RawVoicing, interval: &str) -> bool {
    v.intervals.iter().any(|i| i == interval)
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// `None` for null voicings, missing or empty fret lists, fret lists with
/// no usable value, and fret values that are neither numbers nor `x`.
fn read_voicing(value: &Value) -> Option<RawVoicing> {
    let obj = value.as_object()?;
    let raw_frets = obj.get("frets")?.as_array()?;
    if raw_frets.is_empty() {
        return None;
    }
    let frets = raw_frets
        .iter()
        .map(|f| match f {
            Value::Null => Some(None),
            Value::Number(n) => n
                .as_u64()
                .and_then(|n| u8::try_from(n).ok())
                .map(|n| Some(Fret::At(n))),
            Value::String(s) if s.eq_ignore_ascii_case("x") => Some(Some(Fret::Muted)),
            _ => None,
        })
        .collect::<Option<Vec<_>>>()?;
    if frets.iter().all(Option::is_none) {
        return None;
    }

    let barres = obj
        .get("barres")
        .and_then(|b| serde_json::from_value::<Vec<Barre>>(b.clone()).ok())
        .unwrap_or_default();
    let fingering = obj
        .get("fingering")
        .and_then(|f| serde_json::from_value::<Vec<Finger>>(f.clone()).ok())
        .filter(|f| !f.is_empty())
        .unwrap_or_else(|| fingering_for(&frets));
    let position = match obj.get("position") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    };

    Some(RawVoicing {
        frets,
        barres,
        fingering,
        intervals: string_list(obj.get("intervals")),
        position,
    })
}

/// Guess fingers for a voicing with no fingering: the lowest distinct fret
/// gets finger 1, the next finger 2, up to four. Frets beyond the fourth
/// distinct one are left unassigned.
pub fn fingering_for(frets: &[Option<Fret>]) -> Vec<Finger> {
    let mut distinct: Vec<u8> = frets
        .iter()
        .filter_map(|f| match f {
            Some(Fret::At(n)) if *n > 0 => Some(*n),
            _ => None,
        })
        .collect();
    distinct.sort_unstable();
    distinct.dedup();

    frets
        .iter()
        .map(|f| match f {
            Some(Fret::Muted) => Finger::Muted,
            Some(Fret::At(0)) => Finger::Open,
            Some(Fret::At(n)) => distinct
                .iter()
                .position(|d| d == n)
                .filter(|i| *i < 4)
                .map(|i| Finger::Finger(i as u8 + 1))
                .unwrap_or(Finger::Unassigned),
            None => Finger::Unassigned,
        })
        .collect()
}

/// First fret drawn: 1 when everything fits in the first four frets,
/// otherwise the lowest fretted position.
pub fn start_fret(frets: &[Option<Fret>]) -> u8 {
    let fretted: Vec<u8> = frets
        .iter()
        .filter_map(|f| match f {
            Some(Fret::At(n)) if *n > 0 => Some(*n),
            _ => None,
        })
        .collect();
    match (fretted.iter().min(), fretted.iter().max()) {
        (Some(&min), Some(&max)) if max > 4 => min,
        _ => 1,
    }
}

fn to_diagram(v: &RawVoicing) -> Diagram {
    let strings = v.frets.len();
    let frets: Vec<Fret> = v.frets.iter().map(|f| f.unwrap_or(Fret::Muted)).collect();
    Diagram {
        start_fret: start_fret(&v.frets),
        frets: order::to_diagram_order(&frets),
        barres: v
            .barres
            .iter()
            .filter_map(|b| {
                order::range_to_diagram_order(b.strings, strings).map(|s| Barre {
                    fret: b.fret,
                    strings: s,
                })
            })
            .collect(),
        fingering: order::to_diagram_order(&v.fingering),
        position: v.position.clone(),
        intervals: order::to_diagram_order(&v.intervals),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn uke(value: Value) -> IngestReport {
        transform(&value, Instrument::Ukulele).unwrap()
    }

    #[test]
    fn top_level_must_be_array() {
        let err = transform(&json!({"chord": "C"}), Instrument::Ukulele).unwrap_err();
        assert!(matches!(err, IngestError::NotAnArray));
        assert!(matches!(
            parse_chord_json("[", Instrument::Ukulele),
            Err(IngestError::Json(_))
        ));
    }

    #[test]
    fn bad_entries_are_reported_not_fatal() {
        let report = uke(json!([
            42,
            {"aliases": []},
            {"chord": "C7"},
            {"chord": "C", "voicings": [{"frets": [0, 0, 0, 3], "intervals": ["5", "R", "3", "R"]}]}
        ]));
        assert_eq!(report.groups.len(), 1);
        assert_eq!(report.rejected.len(), 3);
        assert!(matches!(report.rejected[0], IngestError::NotAnObject { index: 0 }));
        assert!(matches!(report.rejected[1], IngestError::MissingChord { index: 1 }));
        assert!(matches!(report.rejected[2], IngestError::MissingVoicings { index: 2, .. }));
    }

    #[test]
    fn one_good_one_missing_voicings() {
        let report = uke(json!([
            {"chord": "C", "voicings": [{"frets": [0, 0, 0, 3], "intervals": ["5", "R", "3", "R"]}]},
            {"chord": "G"}
        ]));
        assert_eq!(report.groups.len(), 1);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(
            report.summary(),
            "Imported 1 chords, skipped 1 (entry 1 (G) has no voicings list)"
        );
        assert_eq!(IngestReport::default().summary(), "Imported 0 chords");
    }

    #[test]
    fn unusable_voicings_are_filtered() {
        let report = uke(json!([{
            "chord": "C",
            "voicings": [
                null,
                {"frets": []},
                {"frets": [null, null, null, null]},
                {"intervals": ["R"]},
                {"frets": [0, 0, 0, "q"]},
                {"frets": [0, 0, 0, 3], "intervals": ["5", "R", "3", "R"]}
            ]
        }]));
        assert_eq!(report.groups[0].diagrams.len(), 1);
    }

    #[test]
    fn entries_without_voicings_produce_nothing() {
        let report = uke(json!([{"chord": "C", "voicings": [null]}]));
        assert!(report.groups.is_empty());
        assert!(report.rejected.is_empty());
    }

    #[test]
    fn diagram_is_reversed() {
        let report = uke(json!([{
            "chord": "Bb",
            "aliases": ["Bbmaj"],
            "tuning": "GCEA",
            "voicings": [{
                "frets": [3, 2, 1, 1],
                "barres": [{"fret": 1, "strings": [2, 3]}],
                "fingering": [3, 2, 1, 1],
                "intervals": ["R", "3", "5", "R"],
                "position": "1"
            }]
        }]));
        let d = &report.groups[0].diagrams[0];
        assert_eq!(d.frets, vec![Fret::At(1), Fret::At(1), Fret::At(2), Fret::At(3)]);
        assert_eq!(d.barres, vec![Barre { fret: 1, strings: [0, 1] }]);
        assert_eq!(d.fingering[3], Finger::Finger(3));
        assert_eq!(d.intervals, vec!["R", "5", "3", "R"]);
        assert_eq!(d.start_fret, 1);
        assert_eq!(report.groups[0].tuning, "GCEA");
    }

    #[test]
    fn ambiguous_root_splits_on_ukulele() {
        let data = json!([{
            "chord": "A",
            "aliases": ["Amaj", "Amin", "Am", "A minor"],
            "voicings": [
                {"frets": [2, 1, 0, 0], "intervals": ["R", "3", "5", "R"]},
                {"frets": [2, 0, 0, 0], "intervals": ["R", "m3", "5", "R"]},
                {"frets": [2, 0, 0, 2], "intervals": ["R", "4", "5", "R"]}
            ]
        }]);
        let report = uke(data.clone());
        let names: Vec<_> = report.groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["A", "Am"]);
        assert_eq!(report.groups[0].aliases, vec!["Amaj"]);
        assert_eq!(report.groups[1].aliases, vec!["Amin", "A minor"]);
        assert_eq!(report.groups[0].diagrams.len(), 1);
        assert_eq!(report.groups[1].diagrams.len(), 1);

        let guitar = transform(&data, Instrument::Guitar).unwrap();
        assert_eq!(guitar.groups.len(), 1);
        assert_eq!(guitar.groups[0].diagrams.len(), 3);
    }

    #[test]
    fn start_fret_rule() {
        let f = |v: &[u8]| v.iter().map(|n| Some(Fret::At(*n))).collect::<Vec<_>>();
        assert_eq!(start_fret(&f(&[0, 0, 0, 0])), 1);
        assert_eq!(start_fret(&f(&[0, 4, 3, 2])), 1);
        assert_eq!(start_fret(&f(&[5, 4, 3, 3])), 3);
        assert_eq!(start_fret(&[Some(Fret::Muted), Some(Fret::At(7)), None]), 7);
    }

    #[test]
    fn fingering_heuristic() {
        let frets = vec![
            Some(Fret::Muted),
            Some(Fret::At(0)),
            Some(Fret::At(3)),
            Some(Fret::At(1)),
            Some(Fret::At(3)),
            None,
        ];
        assert_eq!(
            fingering_for(&frets),
            vec![
                Finger::Muted,
                Finger::Open,
                Finger::Finger(2),
                Finger::Finger(1),
                Finger::Finger(2),
                Finger::Unassigned
            ]
        );

        let wide: Vec<_> = (1..=5).map(|n| Some(Fret::At(n))).collect();
        assert_eq!(fingering_for(&wide)[4], Finger::Unassigned);
    }

    #[test]
    fn empty_fingering_uses_heuristic() {
        let report = uke(json!([{
            "chord": "C",
            "voicings": [{"frets": [0, 0, 0, 3], "fingering": [], "intervals": ["5", "R", "3", "R"]}]
        }]));
        let d = &report.groups[0].diagrams[0];
        assert_eq!(
            d.fingering,
            vec![Finger::Finger(1), Finger::Open, Finger::Open, Finger::Open]
        );
    }

    #[test]
    fn null_frets_become_muted() {
        let report = uke(json!([{
            "chord": "C6",
            "voicings": [{"frets": [0, null, 0, 0], "position": 2}]
        }]));
        let d = &report.groups[0].diagrams[0];
        assert_eq!(d.frets[2], Fret::Muted);
        assert_eq!(d.position, "2");
    }
}
