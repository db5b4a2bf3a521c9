use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::stage::{StageVocabulary, VocabularyError};

/// Configuration from stagesync.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub stages: StagesConfig,
    #[serde(default)]
    pub sync: SyncConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StagesConfig {
    /// Extra raw spellings, e.g. `veggie = "Vegetative"`
    #[serde(default)]
    pub aliases: IndexMap<String, String>,
    /// Legacy storage key overrides, e.g. `Drying = "dry"`.
    /// Stages not listed use the built-in key.
    #[serde(default)]
    pub legacy_keys: IndexMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Shown when enabling sync is refused for a mixed selection
    #[serde(default = "default_mixed_reason")]
    pub mixed_reason: String,
    /// Shown when enabling sync is refused because no grow is selected
    #[serde(default = "default_no_grow_reason")]
    pub no_grow_reason: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            mixed_reason: default_mixed_reason(),
            no_grow_reason: default_no_grow_reason(),
        }
    }
}

fn default_mixed_reason() -> String {
    "Select specific plants before updating".to_string()
}

fn default_no_grow_reason() -> String {
    "Select a grow before updating".to_string()
}

impl EngineConfig {
    pub fn vocabulary(&self) -> Result<StageVocabulary, VocabularyError> {
        StageVocabulary::from_tables(&self.stages.aliases, &self.stages.legacy_keys)
    }
}
