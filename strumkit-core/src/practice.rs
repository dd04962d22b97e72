//! The practice set being played and the named sets saved from it.

use strumkit_types::{voicing_id, Diagram, PracticeSetItem, SavedSet};

/// Ordered voicings that playback steps through.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PracticeSet {
    items: Vec<PracticeSetItem>,
}

impl PracticeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_items(items: Vec<PracticeSetItem>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[PracticeSetItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, chord_name: &str, diagram: &Diagram) -> bool {
        let id = voicing_id(chord_name, diagram);
        self.items.iter().any(|item| item.id == id)
    }

    /// Add the voicing, or remove it if it is already in the set. Returns
    /// true when it was added.
    pub fn toggle(&mut self, chord_name: &str, diagram: &Diagram) -> bool {
        let id = voicing_id(chord_name, diagram);
        if let Some(index) = self.items.iter().position(|item| item.id == id) {
            self.items.remove(index);
            false
        } else {
            self.items.push(PracticeSetItem::new(chord_name, diagram.clone()));
            true
        }
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id != id);
        self.items.len() != before
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Swap the item at `index` with the one before it.
    pub fn move_up(&mut self, index: usize) -> bool {
        if index == 0 || index >= self.items.len() {
            return false;
        }
        self.items.swap(index - 1, index);
        true
    }

    /// Swap the item at `index` with the one after it.
    pub fn move_down(&mut self, index: usize) -> bool {
        if index + 1 >= self.items.len() {
            return false;
        }
        self.items.swap(index, index + 1);
        true
    }

    pub fn replace(&mut self, items: Vec<PracticeSetItem>) {
        self.items = items;
    }
}

/// Named practice sets. A name appears at most once; saving under an
/// existing name replaces that set and moves it to the end.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SavedSets {
    sets: Vec<SavedSet>,
}

impl SavedSets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_sets(sets: Vec<SavedSet>) -> Self {
        Self { sets }
    }

    pub fn sets(&self) -> &[SavedSet] {
        &self.sets
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&SavedSet> {
        self.sets.iter().find(|s| s.name == name)
    }

    /// Save under the trimmed name. Blank names and empty sets are refused.
    pub fn save(&mut self, name: &str, practice: &PracticeSet) -> bool {
        let name = name.trim();
        if name.is_empty() || practice.is_empty() {
            return false;
        }
        self.sets.retain(|s| s.name != name);
        self.sets.push(SavedSet {
            name: name.to_string(),
            voicings: practice.items().to_vec(),
        });
        true
    }

    pub fn delete(&mut self, name: &str) -> bool {
        let before = self.sets.len();
        self.sets.retain(|s| s.name != name);
        self.sets.len() != before
    }

    /// Replace the practice set with a saved one.
    pub fn load_into(&self, name: &str, practice: &mut PracticeSet) -> bool {
        match self.get(name) {
            Some(set) => {
                practice.replace(set.voicings.clone());
                true
            }
            None => false,
        }
    }
}
