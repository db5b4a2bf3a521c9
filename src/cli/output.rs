use serde::Serialize;

use crate::model::entry::GrowLogEntry;
use crate::model::grow::Grow;
use crate::model::stage::{AggregateStage, CanonicalStage, StageVocabulary};
use crate::ops::save::SavePayload;
use crate::ops::sync::{SyncState, SyncStatus};

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct StageJson {
    pub raw: String,
    pub stage: Option<CanonicalStage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legacy_key: Option<String>,
}

#[derive(Serialize)]
pub struct GrowJson {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub plants: usize,
    pub aggregate: Option<AggregateStage>,
}

#[derive(Serialize)]
pub struct DraftJson<'a> {
    pub draft: &'a GrowLogEntry,
    pub state: SyncState,
    pub aggregate: Option<AggregateStage>,
    pub toggle_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Serialize)]
pub struct SaveJson<'a> {
    pub saved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<&'a SavePayload>,
}

#[derive(Serialize)]
pub struct VocabularyJson {
    pub stages: Vec<VocabularyStageJson>,
    pub aliases: Vec<(String, CanonicalStage)>,
}

#[derive(Serialize)]
pub struct VocabularyStageJson {
    pub stage: CanonicalStage,
    pub legacy_key: String,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

pub fn grow_to_json(grow: &Grow, aggregate: Option<AggregateStage>) -> GrowJson {
    GrowJson {
        id: grow.id.clone(),
        name: grow.name.clone(),
        plants: grow.plants.len(),
        aggregate,
    }
}

pub fn vocabulary_to_json(vocab: &StageVocabulary) -> VocabularyJson {
    VocabularyJson {
        stages: CanonicalStage::ALL
            .into_iter()
            .map(|stage| VocabularyStageJson {
                stage,
                legacy_key: vocab.denormalize(stage),
            })
            .collect(),
        aliases: vocab
            .aliases()
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect(),
    }
}

// ---------------------------------------------------------------------------
// Text formatting
// ---------------------------------------------------------------------------

pub fn format_aggregate(aggregate: Option<AggregateStage>) -> String {
    match aggregate {
        Some(a) => a.to_string(),
        None => "-".to_string(),
    }
}

/// One line per grow: `ID  AGGREGATE  (N plants)  name`
pub fn format_grow_line(grow: &Grow, aggregate: Option<AggregateStage>) -> String {
    let mut line = format!(
        "{:<12} {:<10} ({} plant{})",
        grow.id,
        format_aggregate(aggregate),
        grow.plants.len(),
        if grow.plants.len() == 1 { "" } else { "s" }
    );
    if let Some(name) = &grow.name {
        line.push_str("  ");
        line.push_str(name);
    }
    line
}

pub fn format_draft(entry: &GrowLogEntry, status: &SyncStatus) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "grow:      {}\n",
        entry.grow.as_deref().unwrap_or("-")
    ));
    let plants = if entry.selected_plant_ids.is_empty() {
        "all".to_string()
    } else {
        entry.selected_plant_ids.join(", ")
    };
    out.push_str(&format!("plants:    {}\n", plants));
    out.push_str(&format!(
        "stage:     {}\n",
        entry.stage.map(|s| s.to_string()).unwrap_or_else(|| "-".into())
    ));
    out.push_str(&format!("aggregate: {}\n", format_aggregate(status.aggregate)));
    out.push_str(&format!(
        "apply:     {} ({})\n",
        if entry.apply_stage_to_plants { "on" } else { "off" },
        status.state
    ));
    if !entry.title.is_empty() {
        out.push_str(&format!("title:     {}\n", entry.title));
    }
    out
}
