use std::fs;

use crate::io::data_io::{DataDir, DataError, atomic_write};
use crate::model::config::EngineConfig;
use crate::model::stage::{CanonicalStage, StageVocabulary};

/// Read the config, returning both the parsed config and the raw toml_edit
/// document for formatting-preserving edits. A missing file is the default
/// config.
pub fn read_config(dir: &DataDir) -> Result<(EngineConfig, toml_edit::DocumentMut), DataError> {
    let path = dir.config_path();
    let text = if path.exists() {
        fs::read_to_string(&path).map_err(|e| DataError::ReadError {
            path: path.clone(),
            source: e,
        })?
    } else {
        String::new()
    };
    let config: EngineConfig = toml::from_str(&text)?;
    // toml accepted the text above, so toml_edit will too
    let doc: toml_edit::DocumentMut = text.parse().unwrap_or_default();
    Ok((config, doc))
}

/// Load the config and build its stage vocabulary, rejecting overrides
/// that would break the stage round trip.
pub fn load_config(dir: &DataDir) -> Result<(EngineConfig, StageVocabulary), DataError> {
    let (config, _) = read_config(dir)?;
    let vocab = config.vocabulary()?;
    Ok((config, vocab))
}

pub fn write_config(dir: &DataDir, doc: &toml_edit::DocumentMut) -> Result<(), DataError> {
    let path = dir.config_path();
    atomic_write(&path, doc.to_string().as_bytes())
        .map_err(|e| DataError::WriteError { path, source: e })
}

/// Set `[stages.legacy_keys] <Stage> = "<key>"` in the document.
///
/// The edited document is re-parsed and its vocabulary rebuilt before the
/// change is accepted, so a key that would not normalize back is refused.
pub fn set_legacy_key(
    doc: &mut toml_edit::DocumentMut,
    stage: CanonicalStage,
    key: &str,
) -> Result<(), DataError> {
    let mut edited = doc.clone();
    if !edited.contains_key("stages") {
        edited["stages"] = toml_edit::Item::Table(toml_edit::Table::new());
    }
    if edited["stages"].get("legacy_keys").is_none() {
        edited["stages"]["legacy_keys"] = toml_edit::Item::Table(toml_edit::Table::new());
    }
    edited["stages"]["legacy_keys"][stage.label()] = toml_edit::value(key);

    let config: EngineConfig = toml::from_str(&edited.to_string())?;
    config.vocabulary()?;
    *doc = edited;
    Ok(())
}
