use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

/// Growth phase after normalization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CanonicalStage {
    Seedling,
    Vegetative,
    Flower,
    Drying,
    Curing,
}

impl CanonicalStage {
    /// All stages in lifecycle order
    pub const ALL: [CanonicalStage; 5] = [
        CanonicalStage::Seedling,
        CanonicalStage::Vegetative,
        CanonicalStage::Flower,
        CanonicalStage::Drying,
        CanonicalStage::Curing,
    ];

    /// Display label, e.g. `Vegetative`
    pub fn label(self) -> &'static str {
        match self {
            CanonicalStage::Seedling => "Seedling",
            CanonicalStage::Vegetative => "Vegetative",
            CanonicalStage::Flower => "Flower",
            CanonicalStage::Drying => "Drying",
            CanonicalStage::Curing => "Curing",
        }
    }

    /// Parse an exact display label (case-insensitive). Legacy synonyms are
    /// not accepted here; use [`normalize`] for stored values.
    pub fn from_label(s: &str) -> Option<CanonicalStage> {
        CanonicalStage::ALL
            .into_iter()
            .find(|stage| stage.label().eq_ignore_ascii_case(s.trim()))
    }
}

impl fmt::Display for CanonicalStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

/// Result of reducing several plant stages to one value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateStage {
    Stage(CanonicalStage),
    /// In-scope plants disagree
    Mixed,
}

impl AggregateStage {
    pub fn concrete(self) -> Option<CanonicalStage> {
        match self {
            AggregateStage::Stage(s) => Some(s),
            AggregateStage::Mixed => None,
        }
    }

    pub fn is_mixed(self) -> bool {
        self == AggregateStage::Mixed
    }
}

impl fmt::Display for AggregateStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggregateStage::Stage(s) => write!(f, "{}", s),
            AggregateStage::Mixed => write!(f, "Mixed"),
        }
    }
}

impl Serialize for AggregateStage {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Raw keys recognized by the fixed vocabulary.
const BUILTIN_KEYS: [(&str, CanonicalStage); 7] = [
    ("seedling", CanonicalStage::Seedling),
    ("veg", CanonicalStage::Vegetative),
    ("vegetative", CanonicalStage::Vegetative),
    ("flower", CanonicalStage::Flower),
    ("flowering", CanonicalStage::Flower),
    ("drying", CanonicalStage::Drying),
    ("curing", CanonicalStage::Curing),
];

/// Normalize a stored stage string with the built-in vocabulary.
pub fn normalize(raw: Option<&str>) -> Option<CanonicalStage> {
    StageVocabulary::builtin().normalize(raw)
}

/// Legacy persistence key for a stage with the built-in vocabulary.
pub fn denormalize(stage: CanonicalStage) -> String {
    StageVocabulary::builtin().denormalize(stage)
}

fn builtin_legacy_key(stage: CanonicalStage) -> Option<&'static str> {
    match stage {
        CanonicalStage::Seedling => Some("seedling"),
        CanonicalStage::Vegetative => Some("veg"),
        CanonicalStage::Flower => Some("flower"),
        CanonicalStage::Drying | CanonicalStage::Curing => None,
    }
}

/// Error type for building a vocabulary from configuration
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VocabularyError {
    #[error("unknown stage label: {0}")]
    UnknownStage(String),
    #[error("alias '{alias}' already means {existing}, cannot map it to {requested}")]
    ConflictingAlias {
        alias: String,
        existing: CanonicalStage,
        requested: CanonicalStage,
    },
    #[error("legacy key '{key}' for {stage} does not normalize back to {stage}")]
    BrokenRoundTrip { key: String, stage: CanonicalStage },
}

/// Stage vocabulary: raw key lookup plus legacy key overrides.
///
/// The default value is the fixed built-in table. Extra aliases and legacy
/// key overrides come from `[stages]` in the config file, and are checked so
/// that `normalize(denormalize(s)) == s` keeps holding for every stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageVocabulary {
    aliases: IndexMap<String, CanonicalStage>,
    legacy_keys: IndexMap<CanonicalStage, String>,
}

impl StageVocabulary {
    pub fn builtin() -> &'static StageVocabulary {
        static BUILTIN: LazyLock<StageVocabulary> = LazyLock::new(StageVocabulary::default);
        &BUILTIN
    }

    /// Build from config tables (`alias -> label`, `label -> key`).
    pub fn from_tables(
        aliases: &IndexMap<String, String>,
        legacy_keys: &IndexMap<String, String>,
    ) -> Result<StageVocabulary, VocabularyError> {
        let mut vocab = StageVocabulary::default();

        for (alias, label) in aliases {
            let stage = CanonicalStage::from_label(label)
                .ok_or_else(|| VocabularyError::UnknownStage(label.clone()))?;
            let key = alias.trim().to_lowercase();
            if let Some(existing) = vocab.lookup(&key)
                && existing != stage
            {
                return Err(VocabularyError::ConflictingAlias {
                    alias: key,
                    existing,
                    requested: stage,
                });
            }
            vocab.aliases.insert(key, stage);
        }

        for (label, key) in legacy_keys {
            let stage = CanonicalStage::from_label(label)
                .ok_or_else(|| VocabularyError::UnknownStage(label.clone()))?;
            if vocab.normalize(Some(key)) != Some(stage) {
                return Err(VocabularyError::BrokenRoundTrip {
                    key: key.clone(),
                    stage,
                });
            }
            vocab.legacy_keys.insert(stage, key.clone());
        }

        Ok(vocab)
    }

    fn lookup(&self, key: &str) -> Option<CanonicalStage> {
        BUILTIN_KEYS
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, s)| *s)
            .or_else(|| self.aliases.get(key).copied())
    }

    /// Map a raw stored string to a canonical stage. Unknown, empty and
    /// absent values are `None` (no signal), never an error.
    pub fn normalize(&self, raw: Option<&str>) -> Option<CanonicalStage> {
        let raw = raw?;
        let key = raw.trim().to_lowercase();
        if key.is_empty() {
            return None;
        }
        let stage = self.lookup(&key);
        if stage.is_none() {
            tracing::debug!(raw, "stage value has no canonical mapping");
        }
        stage
    }

    /// Legacy key written to storage for a canonical stage.
    pub fn denormalize(&self, stage: CanonicalStage) -> String {
        if let Some(key) = self.legacy_keys.get(&stage) {
            return key.clone();
        }
        builtin_legacy_key(stage)
            .map(str::to_string)
            .unwrap_or_else(|| stage.label().to_lowercase())
    }

    pub fn aliases(&self) -> &IndexMap<String, CanonicalStage> {
        &self.aliases
    }

    pub fn legacy_keys(&self) -> &IndexMap<CanonicalStage, String> {
        &self.legacy_keys
    }
}
