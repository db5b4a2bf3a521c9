use serde::{Deserialize, Serialize};

use super::grow::{GrowId, PlantId};
use super::stage::CanonicalStage;

/// A grow-log entry being edited
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrowLogEntry {
    /// `None` means the entry is not attached to a grow
    #[serde(default)]
    pub grow: Option<GrowId>,
    /// Plants this entry is scoped to; empty means the entire grow
    #[serde(default)]
    pub selected_plant_ids: Vec<PlantId>,
    #[serde(default)]
    pub stage: Option<CanonicalStage>,
    #[serde(default)]
    pub apply_stage_to_plants: bool,
    /// Aggregate last copied into `stage` while apply-to-plants was on.
    /// A `stage` that differs from it was edited by hand.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seeded_stage: Option<CanonicalStage>,

    // Free-text fields, carried through to the payload untouched
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub photos: Vec<String>,
}

impl GrowLogEntry {
    pub fn for_grow(grow: &str) -> Self {
        GrowLogEntry {
            grow: Some(grow.to_string()),
            ..GrowLogEntry::default()
        }
    }

    /// Replace the plant selection, dropping duplicates but keeping order
    pub fn set_selection<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<PlantId>,
    {
        self.selected_plant_ids.clear();
        for id in ids {
            let id = id.into();
            if !self.selected_plant_ids.contains(&id) {
                self.selected_plant_ids.push(id);
            }
        }
    }

    /// Add or remove one plant from the selection
    pub fn toggle_selected(&mut self, id: &str) {
        if let Some(pos) = self.selected_plant_ids.iter().position(|p| p == id) {
            self.selected_plant_ids.remove(pos);
        } else {
            self.selected_plant_ids.push(id.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_selection_dedups() {
        let mut entry = GrowLogEntry::for_grow("g1");
        entry.set_selection(["p1", "p2", "p1"]);
        assert_eq!(entry.selected_plant_ids, vec!["p1", "p2"]);
    }

    #[test]
    fn test_toggle_selected() {
        let mut entry = GrowLogEntry::for_grow("g1");
        entry.toggle_selected("p1");
        entry.toggle_selected("p2");
        entry.toggle_selected("p1");
        assert_eq!(entry.selected_plant_ids, vec!["p2"]);
    }

    #[test]
    fn test_deserialize_partial_entry() {
        let entry: GrowLogEntry = serde_json::from_str(r#"{"stage": "Flower"}"#).unwrap();
        assert_eq!(entry.grow, None);
        assert_eq!(entry.stage, Some(CanonicalStage::Flower));
        assert!(!entry.apply_stage_to_plants);
    }
}
