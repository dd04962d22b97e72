//! Export of the user's data as one JSON file.

use std::path::Path;

use serde::Serialize;
use strumkit_types::{PracticeSetItem, RhythmPattern, SavedSet};

use crate::persistence::PersistError;

/// Default file name offered for exports.
pub const EXPORT_FILE_NAME: &str = "instrument-chords-data.json";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument<'a> {
    pub practice_set: &'a [PracticeSetItem],
    pub saved_sets: &'a [SavedSet],
    pub custom_patterns: &'a [RhythmPattern],
}

impl ExportDocument<'_> {
    pub fn to_json(&self) -> Result<String, PersistError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_to(&self, path: &Path) -> Result<(), PersistError> {
        std::fs::write(path, self.to_json()?)?;
        log::info!(target: "persistence", "exported data to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::presets;
    use crate::persistence::parse_legacy;

    #[test]
    fn export_has_three_keys() {
        let custom: Vec<_> = presets().into_iter().take(1).collect();
        let doc = ExportDocument {
            practice_set: &[],
            saved_sets: &[],
            custom_patterns: &custom,
        };
        let value: serde_json::Value = serde_json::from_str(&doc.to_json().unwrap()).unwrap();
        assert!(value["practiceSet"].is_array());
        assert!(value["savedSets"].is_array());
        assert_eq!(value["customPatterns"][0]["type"], "strum");
        assert_eq!(value["customPatterns"][0]["timeSignature"], "4/4");
    }

    #[test]
    fn exported_file_imports_back() {
        let custom: Vec<_> = presets().into_iter().skip(8).take(2).collect();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(EXPORT_FILE_NAME);
        ExportDocument {
            practice_set: &[],
            saved_sets: &[],
            custom_patterns: &custom,
        }
        .write_to(&path)
        .unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains('\n'));
        assert_eq!(parse_legacy(&text).unwrap().custom_patterns, custom);
    }
}
