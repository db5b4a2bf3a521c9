use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque plant identifier as stored with the grow
pub type PlantId = String;

/// Opaque grow identifier
pub type GrowId = String;

/// A single tracked plant inside a grow
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Plant {
    /// Missing on some legacy records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<PlantId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Raw stored stage, canonical or legacy form
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
}

impl Plant {
    pub fn new(id: &str, stage: Option<&str>) -> Self {
        Plant {
            id: Some(id.to_string()),
            name: None,
            stage: stage.map(str::to_string),
        }
    }
}

/// A cultivation run owning zero or more plants
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grow {
    pub id: GrowId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Absent in some stored records; treated as empty
    #[serde(default)]
    pub plants: Vec<Plant>,
    /// Fallback stage, consulted only when no plant carries one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
}

impl Grow {
    pub fn new(id: &str) -> Self {
        Grow {
            id: id.to_string(),
            name: None,
            plants: Vec::new(),
            stage: None,
        }
    }

    /// Stable key for each plant, paired with the plant, in grow order
    pub fn keyed_plants(&self) -> impl Iterator<Item = (PlantKey, &Plant)> {
        self.plants
            .iter()
            .enumerate()
            .map(|(i, p)| (PlantKey::for_plant(p, i), p))
    }

    pub fn plant_mut(&mut self, key: &PlantKey) -> Option<&mut Plant> {
        self.plants
            .iter_mut()
            .enumerate()
            .find(|(i, p)| PlantKey::for_plant(p, *i) == *key)
            .map(|(_, p)| p)
    }

    /// Resolve a selection token to a plant key.
    ///
    /// Ids are opaque, so a plant whose id is exactly `token` always wins.
    /// Otherwise `#<index>` addresses an id-less plant at that position.
    /// Tokens matching neither come back as an `Id` that selects nothing.
    pub fn key_for(&self, token: &str) -> PlantKey {
        let id_match = self
            .plants
            .iter()
            .any(|p| p.id.as_deref().is_some_and(|id| !id.is_empty() && id == token));
        if id_match {
            return PlantKey::Id(token.to_string());
        }
        match PlantKey::position_token(token) {
            Some(index) => PlantKey::Position(index),
            None => PlantKey::Id(token.to_string()),
        }
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

/// Address of a plant within its grow.
///
/// Plants with an id are addressed by it. Legacy plants without one are
/// addressed by their position as `#<index>`, which is what selections for
/// those plants carry. Use [`Grow::key_for`] to turn a selection token into
/// a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PlantKey {
    Id(PlantId),
    Position(usize),
}

impl PlantKey {
    pub fn for_plant(plant: &Plant, index: usize) -> PlantKey {
        match plant.id.as_deref() {
            Some(id) if !id.is_empty() => PlantKey::Id(id.to_string()),
            _ => PlantKey::Position(index),
        }
    }

    /// `#3` -> `Some(3)`
    fn position_token(token: &str) -> Option<usize> {
        token.strip_prefix('#').and_then(|n| n.parse::<usize>().ok())
    }
}

impl fmt::Display for PlantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlantKey::Id(id) => write!(f, "{}", id),
            PlantKey::Position(i) => write!(f, "#{}", i),
        }
    }
}

/// Find a grow by id in a snapshot
pub fn find_grow<'a>(grows: &'a [Grow], id: &str) -> Option<&'a Grow> {
    grows.iter().find(|g| g.id == id)
}

pub fn find_grow_mut<'a>(grows: &'a mut [Grow], id: &str) -> Option<&'a mut Grow> {
    grows.iter_mut().find(|g| g.id == id)
}
