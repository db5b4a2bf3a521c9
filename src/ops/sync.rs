use serde::Serialize;
use std::fmt;

use crate::model::config::SyncConfig;
use crate::model::entry::GrowLogEntry;
use crate::model::grow::{Grow, PlantId, find_grow};
use crate::model::stage::{AggregateStage, CanonicalStage, StageVocabulary};
use crate::ops::aggregate::aggregate_with;

/// Whether the "apply stage to plants" toggle may be on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncState {
    /// No grow selected, or the selected grow is not in the snapshot
    Unavailable,
    /// In-scope plants disagree on stage
    Ambiguous,
    Eligible,
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncState::Unavailable => write!(f, "unavailable"),
            SyncState::Ambiguous => write!(f, "ambiguous"),
            SyncState::Eligible => write!(f, "eligible"),
        }
    }
}

/// Result of evaluating an entry against a grow snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SyncStatus {
    pub state: SyncState,
    pub aggregate: Option<AggregateStage>,
}

impl SyncStatus {
    pub fn toggle_enabled(&self) -> bool {
        self.state == SyncState::Eligible
    }
}

/// Outcome of a request to flip the toggle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// Toggle is on; `seeded` is the stage copied into the entry, if any
    Enabled { seeded: Option<CanonicalStage> },
    Disabled,
    /// Toggle left off; `reason` is meant for the user
    Rejected { reason: String },
}

/// Keeps an entry's sync toggle and stage field consistent with the
/// aggregate stage of its grow.
///
/// Every method that changes an input (grow, plant selection, snapshot)
/// re-runs [`SyncController::recompute`] before returning. Nothing is
/// cached between calls.
#[derive(Debug, Clone, Default)]
pub struct SyncController {
    vocab: StageVocabulary,
    messages: SyncConfig,
}

impl SyncController {
    pub fn new(vocab: StageVocabulary, messages: SyncConfig) -> Self {
        SyncController { vocab, messages }
    }

    pub fn vocabulary(&self) -> &StageVocabulary {
        &self.vocab
    }

    /// Pure evaluation; does not touch the entry.
    pub fn evaluate(&self, entry: &GrowLogEntry, grows: &[Grow]) -> SyncStatus {
        let grow = match entry.grow.as_deref() {
            Some(id) => find_grow(grows, id),
            None => None,
        };
        let Some(grow) = grow else {
            return SyncStatus {
                state: SyncState::Unavailable,
                aggregate: None,
            };
        };

        let aggregate = aggregate_with(&self.vocab, Some(grow), &entry.selected_plant_ids);
        let state = match aggregate {
            Some(AggregateStage::Mixed) => SyncState::Ambiguous,
            _ => SyncState::Eligible,
        };
        SyncStatus { state, aggregate }
    }

    /// Re-apply the toggle invariants after any input change.
    ///
    /// Forces the toggle off when sync is not eligible. While the toggle is
    /// on, a concrete aggregate is copied into `entry.stage`. The stage is
    /// left alone while the toggle is off.
    pub fn recompute(&self, entry: &mut GrowLogEntry, grows: &[Grow]) -> SyncStatus {
        let status = self.evaluate(entry, grows);
        match status.state {
            SyncState::Unavailable | SyncState::Ambiguous => force_off(entry, status.state),
            SyncState::Eligible => {
                if entry.apply_stage_to_plants
                    && let Some(stage) = status.aggregate.and_then(AggregateStage::concrete)
                {
                    entry.stage = Some(stage);
                    entry.seeded_stage = Some(stage);
                }
            }
        }
        status
    }

    /// Turn apply-to-plants on or off.
    ///
    /// Turning it on is refused unless the entry is eligible; on success the
    /// stage field is seeded from the aggregate right away.
    pub fn set_apply_stage_to_plants(
        &self,
        entry: &mut GrowLogEntry,
        grows: &[Grow],
        enabled: bool,
    ) -> ToggleOutcome {
        if !enabled {
            entry.apply_stage_to_plants = false;
            entry.seeded_stage = None;
            return ToggleOutcome::Disabled;
        }

        let status = self.evaluate(entry, grows);
        let reason = match status.state {
            SyncState::Unavailable => &self.messages.no_grow_reason,
            SyncState::Ambiguous => &self.messages.mixed_reason,
            SyncState::Eligible => {
                entry.apply_stage_to_plants = true;
                let seeded = status.aggregate.and_then(AggregateStage::concrete);
                if let Some(stage) = seeded {
                    entry.stage = Some(stage);
                }
                entry.seeded_stage = seeded;
                tracing::debug!(seeded = ?seeded, "apply-to-plants enabled");
                return ToggleOutcome::Enabled { seeded };
            }
        };

        tracing::warn!(state = %status.state, "refused to enable apply-to-plants");
        entry.apply_stage_to_plants = false;
        entry.seeded_stage = None;
        ToggleOutcome::Rejected {
            reason: reason.clone(),
        }
    }

    /// Attach the entry to a grow (or detach it). Switching grows clears
    /// the plant selection.
    pub fn select_grow(
        &self,
        entry: &mut GrowLogEntry,
        grows: &[Grow],
        grow: Option<&str>,
    ) -> SyncStatus {
        if entry.grow.as_deref() != grow {
            entry.grow = grow.map(str::to_string);
            entry.selected_plant_ids.clear();
        }
        self.recompute(entry, grows)
    }

    /// Replace the plant selection. An empty list means the whole grow.
    pub fn select_plants(
        &self,
        entry: &mut GrowLogEntry,
        grows: &[Grow],
        ids: Vec<PlantId>,
    ) -> SyncStatus {
        entry.set_selection(ids);
        self.recompute(entry, grows)
    }

    pub fn toggle_plant(&self, entry: &mut GrowLogEntry, grows: &[Grow], id: &str) -> SyncStatus {
        entry.toggle_selected(id);
        self.recompute(entry, grows)
    }

    /// Manual edit of the stage field. Not a recompute trigger, so the edit
    /// stands until the grow, selection or snapshot changes.
    pub fn set_stage(&self, entry: &mut GrowLogEntry, stage: Option<CanonicalStage>) {
        entry.stage = stage;
    }

    /// A fresh snapshot arrived from the grow source.
    pub fn refresh(&self, entry: &mut GrowLogEntry, grows: &[Grow]) -> SyncStatus {
        self.recompute(entry, grows)
    }

    /// Re-check an entry reopened from storage.
    ///
    /// While the stored stage is still the one last seeded, this is a full
    /// [`SyncController::recompute`], so a snapshot whose aggregate moved
    /// re-seeds the target. A stage edited by hand after seeding is kept;
    /// only the force-off invariant is enforced for it.
    pub fn reopen(&self, entry: &mut GrowLogEntry, grows: &[Grow]) -> SyncStatus {
        let seeded = entry.seeded_stage.is_some() && entry.stage == entry.seeded_stage;
        if entry.apply_stage_to_plants && seeded {
            return self.recompute(entry, grows);
        }
        let status = self.evaluate(entry, grows);
        if !status.toggle_enabled() {
            force_off(entry, status.state);
        }
        status
    }
}

fn force_off(entry: &mut GrowLogEntry, state: SyncState) {
    if entry.apply_stage_to_plants {
        tracing::debug!(state = %state, "forcing apply-to-plants off");
        entry.apply_stage_to_plants = false;
    }
    entry.seeded_stage = None;
}
