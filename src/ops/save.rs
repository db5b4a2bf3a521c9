use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::entry::GrowLogEntry;
use crate::model::grow::{Grow, GrowId, PlantId};
use crate::model::stage::{CanonicalStage, StageVocabulary};

/// Error type for save validation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SaveError {
    #[error("cannot apply stage to plants: no grow selected")]
    SyncWithoutGrow,
    #[error("cannot apply stage to plants: no stage to apply")]
    SyncWithoutStage,
    #[error("entry belongs to grow {entry} but grow {given} was supplied")]
    GrowMismatch { entry: GrowId, given: GrowId },
}

/// What the entry repository receives. Serialized in camelCase, the field
/// names journal hosts read (`applyStageToPlants`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavePayload {
    pub grow: Option<GrowId>,
    /// Plants to cascade to; empty means every plant in the grow
    pub plants: Vec<PlantId>,
    /// Legacy storage key
    pub stage: Option<String>,
    pub apply_stage_to_plants: bool,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub photos: Vec<String>,
}

/// Which plants a cascade touches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlantScope {
    WholeGrow,
    One,
    Many(usize),
}

impl PlantScope {
    pub fn of(selected: &[PlantId]) -> PlantScope {
        match selected.len() {
            0 => PlantScope::WholeGrow,
            1 => PlantScope::One,
            n => PlantScope::Many(n),
        }
    }
}

impl fmt::Display for PlantScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlantScope::WholeGrow => write!(f, "all plants in this grow"),
            PlantScope::One => write!(f, "the selected plant"),
            PlantScope::Many(n) => write!(f, "{} selected plants", n),
        }
    }
}

/// What the host shows before a cascading save
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationPrompt {
    pub summary: String,
    pub stage: CanonicalStage,
    pub grow_name: Option<String>,
}

impl fmt::Display for ConfirmationPrompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Update the stage of {} to {}", self.summary, self.stage)?;
        if let Some(name) = &self.grow_name {
            write!(f, " ({})", name)?;
        }
        write!(f, "?")
    }
}

/// Asks the user to approve a cascading save
pub trait Confirmer {
    fn confirm(&mut self, prompt: &ConfirmationPrompt) -> bool;
}

/// A built save that may still need the user's approval.
///
/// The entry is never modified here, so dropping the decision (or
/// declining) leaves everything as it was before the save attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveDecision {
    prompt: Option<ConfirmationPrompt>,
    payload: SavePayload,
}

impl SaveDecision {
    pub fn requires_confirmation(&self) -> bool {
        self.prompt.is_some()
    }

    pub fn summary(&self) -> Option<&str> {
        self.prompt.as_ref().map(|p| p.summary.as_str())
    }

    pub fn prompt(&self) -> Option<&ConfirmationPrompt> {
        self.prompt.as_ref()
    }

    /// Release the payload. When confirmation is required, call this only
    /// after the user approved the prompt; [`SaveDecision::resolve`] does
    /// that check for you.
    pub fn proceed(self) -> SavePayload {
        self.payload
    }

    /// Release the payload if no confirmation is needed or the user
    /// confirmed. Declining drops it.
    pub fn resolve(self, confirmed: bool) -> Option<SavePayload> {
        if self.requires_confirmation() && !confirmed {
            tracing::debug!("cascading save declined");
            return None;
        }
        Some(self.proceed())
    }

    /// Run the confirmation step through `confirmer` when needed.
    pub fn confirm_with(self, confirmer: &mut dyn Confirmer) -> Option<SavePayload> {
        let confirmed = match &self.prompt {
            Some(prompt) => confirmer.confirm(prompt),
            None => true,
        };
        self.resolve(confirmed)
    }
}

/// Build the save decision for an entry.
///
/// Without apply-to-plants the payload is ready immediately. With it, the
/// entry must name a grow and a target stage, and the returned decision
/// requires confirmation.
pub fn build_save_decision(
    vocab: &StageVocabulary,
    entry: &GrowLogEntry,
    grow: Option<&Grow>,
) -> Result<SaveDecision, SaveError> {
    let stage_key = entry.stage.map(|s| vocab.denormalize(s));

    if !entry.apply_stage_to_plants {
        return Ok(SaveDecision {
            prompt: None,
            payload: SavePayload {
                grow: entry.grow.clone(),
                plants: entry.selected_plant_ids.clone(),
                stage: stage_key,
                apply_stage_to_plants: false,
                title: entry.title.clone(),
                notes: entry.notes.clone(),
                photos: entry.photos.clone(),
            },
        });
    }

    let Some(grow_id) = entry.grow.clone() else {
        tracing::warn!("apply-to-plants requested without a grow");
        return Err(SaveError::SyncWithoutGrow);
    };
    if let Some(g) = grow
        && g.id != grow_id
    {
        return Err(SaveError::GrowMismatch {
            entry: grow_id,
            given: g.id.clone(),
        });
    }
    let Some(stage) = entry.stage else {
        tracing::warn!(grow = %grow_id, "apply-to-plants requested without a stage");
        return Err(SaveError::SyncWithoutStage);
    };

    Ok(SaveDecision {
        prompt: Some(ConfirmationPrompt {
            summary: PlantScope::of(&entry.selected_plant_ids).to_string(),
            stage,
            grow_name: grow.and_then(|g| g.name.clone()),
        }),
        payload: SavePayload {
            grow: Some(grow_id),
            plants: entry.selected_plant_ids.clone(),
            stage: stage_key,
            apply_stage_to_plants: true,
            title: entry.title.clone(),
            notes: entry.notes.clone(),
            photos: entry.photos.clone(),
        },
    })
}
