use std::cmp::Ordering;
use std::path::Path;

use strumkit_types::{ChordGroup, Instrument};

use super::ingest::{parse_chord_json, IngestError, IngestReport};

const UKULELE_LIBRARY: &str = include_str!("../../library/ukulele.json");
const GUITAR_LIBRARY: &str = include_str!("../../library/guitar.json");

fn builtin_source(instrument: Instrument) -> &'static str {
    match instrument {
        Instrument::Ukulele => UKULELE_LIBRARY,
        Instrument::Guitar => GUITAR_LIBRARY,
    }
}

/// Chords for one instrument: the built-in set plus anything imported,
/// merged by name and sorted.
pub struct ChordLibrary {
    instrument: Instrument,
    builtin: Vec<ChordGroup>,
    imported: Vec<ChordGroup>,
    merged: Vec<ChordGroup>,
    search: String,
}

impl ChordLibrary {
    pub fn new(instrument: Instrument) -> Self {
        let mut lib = Self {
            instrument,
            builtin: Vec::new(),
            imported: Vec::new(),
            merged: Vec::new(),
            search: String::new(),
        };
        lib.load_builtin();
        lib
    }

    fn load_builtin(&mut self) {
        self.builtin = match parse_chord_json(builtin_source(self.instrument), self.instrument) {
            Ok(report) => report.groups,
            Err(e) => {
                log::error!(target: "ingest", "built-in {} library unreadable: {}", self.instrument, e);
                Vec::new()
            }
        };
        self.rebuild();
    }

    pub fn instrument(&self) -> Instrument {
        self.instrument
    }

    /// Change instrument. Imported chords and the search are dropped.
    pub fn switch_instrument(&mut self, instrument: Instrument) {
        self.instrument = instrument;
        self.imported.clear();
        self.search.clear();
        self.load_builtin();
    }

    /// All chords, sorted by name.
    pub fn chords(&self) -> &[ChordGroup] {
        &self.merged
    }

    pub fn get(&self, name: &str) -> Option<&ChordGroup> {
        self.merged.iter().find(|g| g.name == name)
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn set_search(&mut self, query: &str) {
        self.search = query.to_string();
    }

    /// Chords whose name or an alias starts with the search text, ignoring
    /// case. A blank search matches everything.
    pub fn filtered(&self) -> Vec<&ChordGroup> {
        let query = self.search.trim().to_lowercase();
        if query.is_empty() {
            return self.merged.iter().collect();
        }
        self.merged
            .iter()
            .filter(|g| {
                g.name.to_lowercase().starts_with(&query)
                    || g.aliases.iter().any(|a| a.to_lowercase().starts_with(&query))
            })
            .collect()
    }

    /// Add chords from JSON text. Returns the report so callers can show
    /// rejected entries.
    pub fn import_str(&mut self, text: &str) -> Result<IngestReport, IngestError> {
        let report = parse_chord_json(text, self.instrument)?;
        self.imported.extend(report.groups.iter().cloned());
        self.rebuild();
        log::info!(
            target: "ingest",
            "imported {} chord groups ({} rejected)",
            report.groups.len(),
            report.rejected.len()
        );
        Ok(report)
    }

    pub fn import_file(&mut self, path: &Path) -> Result<IngestReport, IngestError> {
        let text = std::fs::read_to_string(path).map_err(|source| IngestError::Io {
            path: path.display().to_string(),
            source,
        })?;
        self.import_str(&text)
    }

    fn rebuild(&mut self) {
        self.merged = merge_groups(self.builtin.iter().chain(self.imported.iter()).cloned());
    }
}

/// Merge groups sharing a name. Later diagrams identical to one already
/// present are dropped. The first group's aliases and tuning are kept.
pub fn merge_groups(groups: impl IntoIterator<Item = ChordGroup>) -> Vec<ChordGroup> {
    let mut merged: Vec<ChordGroup> = Vec::new();
    for group in groups {
        match merged.iter_mut().find(|g| g.name == group.name) {
            Some(existing) => {
                for diagram in group.diagrams {
                    if !existing.diagrams.contains(&diagram) {
                        existing.diagrams.push(diagram);
                    }
                }
            }
            None => merged.push(group),
        }
    }
    merged.sort_by(|a, b| compare_names(&a.name, &b.name));
    merged
}

fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn builtin_ukulele_library_loads_sorted() {
        let lib = ChordLibrary::new(Instrument::Ukulele);
        let names: Vec<_> = lib.chords().iter().map(|g| g.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["A", "A7", "Am", "Bb", "C", "C7", "D", "Dm", "E", "Em", "F", "G", "G7", "Gm"]
        );
        assert_eq!(lib.get("C").unwrap().diagrams.len(), 2);
    }

    #[test]
    fn builtin_guitar_library_has_six_strings() {
        let lib = ChordLibrary::new(Instrument::Guitar);
        assert!(!lib.chords().is_empty());
        for group in lib.chords() {
            for d in &group.diagrams {
                assert_eq!(d.frets.len(), 6, "{}", group.name);
            }
        }
    }

    #[test]
    fn search_matches_name_or_alias_prefix() {
        let mut lib = ChordLibrary::new(Instrument::Ukulele);
        lib.set_search("  g");
        let names: Vec<_> = lib.filtered().iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["G", "G7", "Gm"]);

        lib.set_search("A#");
        let names: Vec<_> = lib.filtered().iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["Bb"]);

        lib.set_search("   ");
        assert_eq!(lib.filtered().len(), lib.chords().len());
    }

    #[test]
    fn import_merges_without_duplicates() {
        let mut lib = ChordLibrary::new(Instrument::Ukulele);
        let before = lib.get("C").unwrap().diagrams.len();
        let report = lib
            .import_str(
                r#"[
                    {"chord": "C", "aliases": [], "voicings": [
                        {"frets": [0, 0, 0, 3], "fingering": ["O", "O", "O", 3], "intervals": ["5", "R", "3", "R"], "position": "1"},
                        {"frets": [0, 4, 3, 3], "intervals": ["5", "3", "5", "R"], "position": "3"}
                    ]},
                    {"chord": "Cadd9", "aliases": [], "voicings": [
                        {"frets": [0, 2, 0, 3], "intervals": ["5", "9", "3", "R"]}
                    ]}
                ]"#,
            )
            .unwrap();
        assert_eq!(report.groups.len(), 2);
        assert_eq!(lib.get("C").unwrap().diagrams.len(), before + 1);
        assert!(lib.get("Cadd9").is_some());
    }

    #[test]
    fn switching_instrument_drops_imports_and_search() {
        let mut lib = ChordLibrary::new(Instrument::Ukulele);
        lib.import_str(r#"[{"chord": "Cadd9", "voicings": [{"frets": [0, 2, 0, 3]}]}]"#)
            .unwrap();
        lib.set_search("cadd");
        lib.switch_instrument(Instrument::Guitar);
        assert_eq!(lib.instrument(), Instrument::Guitar);
        assert!(lib.get("Cadd9").is_none());
        assert_eq!(lib.search(), "");
    }

    #[test]
    fn import_file_reads_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"chord": "Fmaj7", "voicings": [{{"frets": [2, 4, 1, 3]}}]}}]"#).unwrap();
        let mut lib = ChordLibrary::new(Instrument::Ukulele);
        lib.import_file(file.path()).unwrap();
        assert!(lib.get("Fmaj7").is_some());

        let missing = lib.import_file(Path::new("/nonexistent/chords.json"));
        assert!(matches!(missing, Err(IngestError::Io { .. })));
    }

    #[test]
    fn merge_keeps_first_aliases() {
        let group = |aliases: &[&str]| ChordGroup {
            name: "C".into(),
            aliases: aliases.iter().map(|s| s.to_string()).collect(),
            tuning: String::new(),
            diagrams: vec![],
        };
        let merged = merge_groups(vec![group(&["Cmaj"]), group(&["other"])]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].aliases, vec!["Cmaj"]);
    }
}
