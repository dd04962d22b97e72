//! Preset and custom rhythm patterns, plus the active selection and tempo.

pub mod presets;

use strumkit_types::{sanitize_bpm, RhythmPattern, DEFAULT_BPM};

pub use presets::{normalize_lane, presets, FIRST_PRESET_ID};

pub struct PatternStore {
    presets: Vec<RhythmPattern>,
    custom: Vec<RhythmPattern>,
    active_id: String,
    bpm: u16,
}

impl PatternStore {
    pub fn new() -> Self {
        Self::with_custom(Vec::new())
    }

    pub fn with_custom(custom: Vec<RhythmPattern>) -> Self {
        Self {
            presets: presets(),
            custom,
            active_id: FIRST_PRESET_ID.to_string(),
            bpm: DEFAULT_BPM,
        }
    }

    pub fn presets(&self) -> &[RhythmPattern] {
        &self.presets
    }

    pub fn custom(&self) -> &[RhythmPattern] {
        &self.custom
    }

    /// Presets first, then custom patterns in creation order.
    pub fn all(&self) -> impl Iterator<Item = &RhythmPattern> {
        self.presets.iter().chain(self.custom.iter())
    }

    pub fn len(&self) -> usize {
        self.presets.len() + self.custom.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, id: &str) -> Option<&RhythmPattern> {
        self.all().find(|p| p.id == id)
    }

    pub fn is_preset(&self, id: &str) -> bool {
        self.presets.iter().any(|p| p.id == id)
    }

    pub fn active_id(&self) -> &str {
        &self.active_id
    }

    /// The active pattern, falling back to the first preset if the id is
    /// unknown.
    pub fn active(&self) -> &RhythmPattern {
        self.get(&self.active_id).unwrap_or(&self.presets[0])
    }

    /// Select a pattern. Returns false for unknown ids.
    pub fn set_active(&mut self, id: &str) -> bool {
        if self.get(id).is_none() {
            return false;
        }
        self.active_id = id.to_string();
        true
    }

    pub fn active_index(&self) -> usize {
        self.all()
            .position(|p| p.id == self.active_id)
            .unwrap_or(0)
    }

    /// Move the selection by `delta` places, wrapping.
    pub fn cycle_active(&mut self, delta: isize) {
        let len = self.len() as isize;
        if len == 0 {
            return;
        }
        let next = (self.active_index() as isize + delta).rem_euclid(len) as usize;
        let id = self.all().nth(next).map(|p| p.id.clone());
        if let Some(id) = id {
            self.active_id = id;
        }
    }

    pub fn bpm(&self) -> u16 {
        self.bpm
    }

    /// Out-of-range values fall back to the default tempo.
    pub fn set_bpm(&mut self, bpm: u16) {
        self.bpm = sanitize_bpm(bpm);
    }

    /// Nudge the tempo, stopping at the range ends.
    pub fn adjust_bpm(&mut self, delta: i32) {
        let next = (self.bpm as i32 + delta).clamp(
            strumkit_types::MIN_BPM as i32,
            strumkit_types::MAX_BPM as i32,
        );
        self.bpm = next as u16;
    }

    /// Replace the custom pattern with the same id, or append.
    pub fn upsert_custom(&mut self, pattern: RhythmPattern) {
        match self.custom.iter_mut().find(|p| p.id == pattern.id) {
            Some(slot) => *slot = pattern,
            None => self.custom.push(pattern),
        }
    }

    /// Remove a custom pattern. Presets cannot be removed. If the removed
    /// pattern was active the first preset becomes active.
    pub fn delete_custom(&mut self, id: &str) -> Option<RhythmPattern> {
        let index = self.custom.iter().position(|p| p.id == id)?;
        let removed = self.custom.remove(index);
        if self.active_id == id {
            self.active_id = FIRST_PRESET_ID.to_string();
        }
        Some(removed)
    }
}

impl Default for PatternStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strumkit_types::{PatternGrid, TimeSignature};

    fn custom(id: &str, name: &str) -> RhythmPattern {
        RhythmPattern {
            id: id.into(),
            name: name.into(),
            time_signature: TimeSignature::FourFour,
            grid: PatternGrid::fresh_strum(16),
        }
    }

    #[test]
    fn starts_on_first_preset() {
        let store = PatternStore::new();
        assert_eq!(store.active().id, FIRST_PRESET_ID);
        assert_eq!(store.bpm(), 120);
        assert_eq!(store.len(), 14);
    }

    #[test]
    fn custom_patterns_follow_presets() {
        let store = PatternStore::with_custom(vec![custom("custom_1", "Mine")]);
        let last = store.all().last().unwrap();
        assert_eq!(last.id, "custom_1");
        assert!(!store.is_preset("custom_1"));
        assert!(store.is_preset("waltz"));
    }

    #[test]
    fn upsert_replaces_in_place() {
        let mut store = PatternStore::new();
        store.upsert_custom(custom("custom_1", "A"));
        store.upsert_custom(custom("custom_2", "B"));
        store.upsert_custom(custom("custom_1", "A2"));
        let names: Vec<_> = store.custom().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["A2", "B"]);
    }

    #[test]
    fn deleting_active_custom_falls_back() {
        let mut store = PatternStore::with_custom(vec![custom("custom_1", "A")]);
        assert!(store.set_active("custom_1"));
        assert!(store.delete_custom("custom_1").is_some());
        assert_eq!(store.active_id(), FIRST_PRESET_ID);
        assert!(store.delete_custom(FIRST_PRESET_ID).is_none());
        assert_eq!(store.len(), 14);
    }

    #[test]
    fn unknown_active_id_is_rejected() {
        let mut store = PatternStore::new();
        assert!(!store.set_active("nope"));
        assert_eq!(store.active_id(), FIRST_PRESET_ID);
    }

    #[test]
    fn cycle_wraps_both_ways() {
        let mut store = PatternStore::new();
        store.cycle_active(-1);
        assert_eq!(store.active().id, "syncopated-picking");
        store.cycle_active(1);
        assert_eq!(store.active().id, FIRST_PRESET_ID);
    }

    #[test]
    fn bpm_rules() {
        let mut store = PatternStore::new();
        store.set_bpm(300);
        assert_eq!(store.bpm(), 120);
        store.set_bpm(60);
        store.adjust_bpm(-100);
        assert_eq!(store.bpm(), 40);
        store.adjust_bpm(1000);
        assert_eq!(store.bpm(), 240);
    }
}
