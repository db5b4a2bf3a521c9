use crate::model::grow::{Grow, Plant, PlantId, PlantKey};

/// Plants in scope for an entry.
///
/// An empty selection means the entire grow. A non-empty selection keeps the
/// grow's plant order regardless of selection order; ids that do not belong
/// to this grow match nothing.
pub fn resolve_relevant_plants<'a>(grow: Option<&'a Grow>, selected: &[PlantId]) -> Vec<&'a Plant> {
    let Some(grow) = grow else {
        return Vec::new();
    };
    if grow.plants.is_empty() {
        return Vec::new();
    }
    if selected.is_empty() {
        return grow.plants.iter().collect();
    }

    let wanted: Vec<PlantKey> = selected.iter().map(|s| grow.key_for(s)).collect();
    grow.keyed_plants()
        .filter(|(key, _)| wanted.contains(key))
        .map(|(_, plant)| plant)
        .collect()
}

/// Keys of the plants a cascade would touch, in grow order
pub fn relevant_plant_keys(grow: &Grow, selected: &[PlantId]) -> Vec<PlantKey> {
    if selected.is_empty() {
        return grow.keyed_plants().map(|(k, _)| k).collect();
    }
    let wanted: Vec<PlantKey> = selected.iter().map(|s| grow.key_for(s)).collect();
    grow.keyed_plants()
        .map(|(k, _)| k)
        .filter(|k| wanted.contains(k))
        .collect()
}
