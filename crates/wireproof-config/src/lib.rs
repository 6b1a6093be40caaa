//! Configuration loading for wireproof.
//!
//! Two kinds of files are loaded here: the umbrella config (validator
//! policies plus an optional inline dictionary) and standalone dictionary
//! files. Dictionary files come in three shapes:
//!
//! - structured (JSON/YAML): `{strategy, mappings: [{path, value}, ...]}`
//! - bare sequence (JSON/YAML): `[{path, value}, ...]`
//! - properties lines: `path=value`, `#` comments, blank lines ignored
//!
//! All three preserve document order, which matters: prefix and suffix
//! strategies resolve overlapping keys by first match.

use anyhow::{Context as _, Result, bail};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use wireproof_dictionary::{Dictionary, PathMappingStrategy};
use wireproof_text::TextValidatorConfig;

/// Configuration file formats supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigFormat {
    Json,
    Yaml,
    Properties,
}

impl ConfigFormat {
    /// Guess the format from a file extension. Unknown extensions fall
    /// back to properties, the least structured shape.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("json") => ConfigFormat::Json,
            Some("yaml") | Some("yml") => ConfigFormat::Yaml,
            _ => ConfigFormat::Properties,
        }
    }
}

/// One dictionary mapping entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingEntry {
    pub path: String,
    pub value: String,
}

/// Declarative dictionary definition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DictionaryConfig {
    #[serde(default)]
    pub strategy: PathMappingStrategy,
    #[serde(default)]
    pub mappings: Vec<MappingEntry>,
}

impl DictionaryConfig {
    pub fn build(&self) -> Dictionary {
        Dictionary::from_pairs(
            self.mappings
                .iter()
                .map(|entry| (entry.path.clone(), entry.value.clone())),
            self.strategy,
        )
    }
}

/// Umbrella configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WireproofConfig {
    #[serde(default)]
    pub validator: TextValidatorConfig,
    #[serde(default)]
    pub dictionary: Option<DictionaryConfig>,
}

/// Load the umbrella config from a JSON or YAML file.
pub fn load_config(path: &Path) -> Result<WireproofConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("read config file {}", path.display()))?;
    match ConfigFormat::from_path(path) {
        ConfigFormat::Json => serde_json::from_str(&raw)
            .with_context(|| format!("parse JSON config {}", path.display())),
        ConfigFormat::Yaml => serde_yaml::from_str(&raw)
            .with_context(|| format!("parse YAML config {}", path.display())),
        ConfigFormat::Properties => {
            bail!("config file {} must be JSON or YAML", path.display())
        }
    }
}

/// Load a dictionary from a file, with an optional strategy override.
pub fn load_dictionary(
    path: &Path,
    strategy_override: Option<PathMappingStrategy>,
) -> Result<Dictionary> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("read dictionary file {}", path.display()))?;
    let mut config = match ConfigFormat::from_path(path) {
        ConfigFormat::Json => {
            let value: Value = serde_json::from_str(&raw)
                .with_context(|| format!("parse JSON dictionary {}", path.display()))?;
            dictionary_from_value(value)?
        }
        ConfigFormat::Yaml => {
            // Deserialize through serde_json::Value so mapping order
            // follows the document.
            let value: Value = serde_yaml::from_str(&raw)
                .with_context(|| format!("parse YAML dictionary {}", path.display()))?;
            dictionary_from_value(value)?
        }
        ConfigFormat::Properties => parse_properties(&raw)?,
    };
    if let Some(strategy) = strategy_override {
        config.strategy = strategy;
    }
    Ok(config.build())
}

fn dictionary_from_value(value: Value) -> Result<DictionaryConfig> {
    match value {
        Value::Object(object) if object.contains_key("mappings") => {
            serde_json::from_value(Value::Object(object)).context("parse dictionary definition")
        }
        Value::Object(object) => {
            // Bare map form: each entry is path -> replacement.
            let mut mappings = Vec::with_capacity(object.len());
            for (path, value) in object {
                mappings.push(MappingEntry {
                    path,
                    value: scalar_to_string(&value)?,
                });
            }
            Ok(DictionaryConfig {
                strategy: PathMappingStrategy::default(),
                mappings,
            })
        }
        Value::Array(_) => {
            let mappings: Vec<MappingEntry> =
                serde_json::from_value(value).context("parse dictionary mapping sequence")?;
            Ok(DictionaryConfig {
                strategy: PathMappingStrategy::default(),
                mappings,
            })
        }
        other => bail!("dictionary file must be a map or a sequence, got {other}"),
    }
}

fn scalar_to_string(value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Ok("null".to_string()),
        other => bail!("dictionary replacement must be a scalar, got {other}"),
    }
}

/// Parse `path=value` lines. Values keep everything after the first `=`,
/// including further `=` signs.
fn parse_properties(raw: &str) -> Result<DictionaryConfig> {
    let mut mappings = Vec::new();
    for (lineno, line) in raw.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((path, value)) = line.split_once('=') else {
            bail!("dictionary line {} has no '=': '{line}'", lineno + 1);
        };
        mappings.push(MappingEntry {
            path: path.trim().to_string(),
            value: value.trim().to_string(),
        });
    }
    Ok(DictionaryConfig {
        strategy: PathMappingStrategy::default(),
        mappings,
    })
}
