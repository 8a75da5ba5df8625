use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::filters::{EvalOptions, ParseLimits, ValidatorOptions};
use crate::sql::SqlOptions;

use super::constants::{
    CONFIG_FILE_NAME, ENV_ALLOWED_COLUMNS, ENV_EVAL_FULL_OPERATOR_SET, ENV_MAX_FILTER_JSON_BYTES,
    ENV_MAX_PREDICATES, ENV_SQL_ESCAPE_BACKSLASHES, ENV_VALIDATOR_BLOCK,
};

// =============================================================================
// File Configuration (JSON)
// =============================================================================

/// Parser limits section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ParseFileConfig {
    pub max_predicates: Option<usize>,
    pub max_json_bytes: Option<usize>,
    pub allowed_columns: Option<Vec<String>>,
}

/// SQL rendering section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct SqlFileConfig {
    pub escape_backslashes: Option<bool>,
}

/// Preview evaluator section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct EvalFileConfig {
    pub full_operator_set: Option<bool>,
}

/// Keyword validator section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ValidatorFileConfig {
    pub block_on_keywords: Option<bool>,
    pub keywords: Option<Vec<String>>,
}

/// File-based configuration (JSON)
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub parse: Option<ParseFileConfig>,
    pub sql: Option<SqlFileConfig>,
    pub eval: Option<EvalFileConfig>,
    pub validator: Option<ValidatorFileConfig>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

impl FileConfig {
    /// Load configuration from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading config file");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        tracing::trace!(config = ?config, "Parsed config file");
        Ok(config)
    }

    /// Warn about unknown fields in the config
    fn warn_unknown_fields(&self) {
        if let serde_json::Value::Object(map) = &self.extra
            && !map.is_empty()
        {
            let keys_str: String = map
                .keys()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            tracing::warn!(
                fields = %keys_str,
                "Unknown fields in config file (possible typos)"
            );
        }
    }

    /// Merge another FileConfig into this one (other takes precedence)
    pub fn merge(&mut self, other: FileConfig) {
        if let Some(parse) = other.parse {
            let current = self.parse.get_or_insert_with(ParseFileConfig::default);
            if parse.max_predicates.is_some() {
                tracing::trace!(max = ?parse.max_predicates, "Merging parse.max_predicates");
                current.max_predicates = parse.max_predicates;
            }
            if parse.max_json_bytes.is_some() {
                tracing::trace!(max = ?parse.max_json_bytes, "Merging parse.max_json_bytes");
                current.max_json_bytes = parse.max_json_bytes;
            }
            if parse.allowed_columns.is_some() {
                tracing::trace!("Merging parse.allowed_columns");
                current.allowed_columns = parse.allowed_columns;
            }
        }

        if let Some(sql) = other.sql {
            let current = self.sql.get_or_insert_with(SqlFileConfig::default);
            if sql.escape_backslashes.is_some() {
                tracing::trace!(
                    enabled = ?sql.escape_backslashes,
                    "Merging sql.escape_backslashes"
                );
                current.escape_backslashes = sql.escape_backslashes;
            }
        }

        if let Some(eval) = other.eval {
            let current = self.eval.get_or_insert_with(EvalFileConfig::default);
            if eval.full_operator_set.is_some() {
                tracing::trace!(
                    enabled = ?eval.full_operator_set,
                    "Merging eval.full_operator_set"
                );
                current.full_operator_set = eval.full_operator_set;
            }
        }

        if let Some(validator) = other.validator {
            let current = self.validator.get_or_insert_with(ValidatorFileConfig::default);
            if validator.block_on_keywords.is_some() {
                tracing::trace!(
                    enabled = ?validator.block_on_keywords,
                    "Merging validator.block_on_keywords"
                );
                current.block_on_keywords = validator.block_on_keywords;
            }
            if validator.keywords.is_some() {
                tracing::trace!("Merging validator.keywords");
                current.keywords = validator.keywords;
            }
        }
    }
}

// =============================================================================
// Resolved Configuration
// =============================================================================

/// Fully resolved engine configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EngineConfig {
    pub parse: ParseLimits,
    pub sql: SqlOptions,
    pub eval: EvalOptions,
    pub validator: ValidatorOptions,
}

impl EngineConfig {
    /// Load configuration from all sources
    ///
    /// Priority (lowest to highest):
    /// 1. Defaults
    /// 2. Config files given in `paths`, in order (or `./filterql.json` when none)
    /// 3. Environment variables
    pub fn load(paths: &[PathBuf]) -> Result<Self> {
        tracing::debug!("Loading engine configuration");

        let sources: Vec<PathBuf> = if paths.is_empty() {
            let local = PathBuf::from(CONFIG_FILE_NAME);
            if local.exists() { vec![local] } else { Vec::new() }
        } else {
            if let Some(missing) = paths.iter().find(|p| !p.exists()) {
                anyhow::bail!("Config file not found: {}", missing.display());
            }
            paths.to_vec()
        };

        let mut file_config = FileConfig::default();
        for path in &sources {
            let overlay = FileConfig::load_from_file(path)?;
            overlay.warn_unknown_fields();
            file_config.merge(overlay);
        }
        tracing::debug!(configs = ?sources, "Config files loaded");

        let mut config = Self::from_file_config(file_config);
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;

        tracing::debug!(config = ?config, "Engine configuration resolved");
        Ok(config)
    }

    /// Layer a merged file config over the defaults
    pub fn from_file_config(file: FileConfig) -> Self {
        let defaults = Self::default();
        let file_parse = file.parse.unwrap_or_default();
        let file_sql = file.sql.unwrap_or_default();
        let file_eval = file.eval.unwrap_or_default();
        let file_validator = file.validator.unwrap_or_default();

        Self {
            parse: ParseLimits {
                max_predicates: file_parse
                    .max_predicates
                    .unwrap_or(defaults.parse.max_predicates),
                max_json_bytes: file_parse
                    .max_json_bytes
                    .unwrap_or(defaults.parse.max_json_bytes),
                allowed_columns: file_parse.allowed_columns,
            },
            sql: SqlOptions {
                escape_backslashes: file_sql
                    .escape_backslashes
                    .unwrap_or(defaults.sql.escape_backslashes),
            },
            eval: EvalOptions {
                full_operator_set: file_eval
                    .full_operator_set
                    .unwrap_or(defaults.eval.full_operator_set),
            },
            validator: ValidatorOptions {
                block_on_keywords: file_validator
                    .block_on_keywords
                    .unwrap_or(defaults.validator.block_on_keywords),
                keywords: file_validator
                    .keywords
                    .unwrap_or(defaults.validator.keywords),
            },
        }
    }

    /// Apply `FILTERQL_*` overrides read through `lookup`
    ///
    /// Blank values count as unset.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(max) = env_parse::<usize>(&lookup, ENV_MAX_PREDICATES)? {
            self.parse.max_predicates = max;
        }
        if let Some(max) = env_parse::<usize>(&lookup, ENV_MAX_FILTER_JSON_BYTES)? {
            self.parse.max_json_bytes = max;
        }
        if let Some(raw) = lookup(ENV_ALLOWED_COLUMNS) {
            self.parse.allowed_columns = Some(
                raw.split(',')
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .map(str::to_string)
                    .collect(),
            );
        }
        if let Some(enabled) = env_bool(&lookup, ENV_SQL_ESCAPE_BACKSLASHES)? {
            self.sql.escape_backslashes = enabled;
        }
        if let Some(enabled) = env_bool(&lookup, ENV_EVAL_FULL_OPERATOR_SET)? {
            self.eval.full_operator_set = enabled;
        }
        if let Some(enabled) = env_bool(&lookup, ENV_VALIDATOR_BLOCK)? {
            self.validator.block_on_keywords = enabled;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.parse.max_predicates > 0,
            "parse.max_predicates must be greater than 0"
        );
        anyhow::ensure!(
            self.parse.max_json_bytes > 0,
            "parse.max_json_bytes must be greater than 0"
        );
        Ok(())
    }
}

fn env_parse<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .with_context(|| format!("Invalid value for {}: {:?}", key, raw))
        })
        .transpose()
}

fn env_bool(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<bool>> {
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(Some(true)),
        "0" | "false" | "no" | "off" => Ok(Some(false)),
        _ => anyhow::bail!("Invalid value for {}: {:?} (expected true or false)", key, raw),
    }
}
