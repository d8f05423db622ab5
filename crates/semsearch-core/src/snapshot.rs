//! Typed view over the `semantic_search` settings.
//!
//! A [`ConfigSnapshot`] is built once from a [`Config`] and never mutated.
//! Reloading builds a new snapshot and swaps it into the shared
//! [`SnapshotCell`]; readers keep whatever `Arc` they already hold.
use parking_lot::RwLock;
use serde::Deserialize;
use std::fmt::Display;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::Config;
use crate::keys;

pub const DEFAULT_SPACE_TYPE: &str = "cosinesimil";
pub const DEFAULT_PARAM_M: u32 = 16;
pub const DEFAULT_PARAM_EF_CONSTRUCTION: u32 = 100;
pub const DEFAULT_CHUNK_SIZE: usize = 1;
pub const DEFAULT_MODEL_ENDPOINT: &str = "http://localhost:9200";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;
pub const DEFAULT_MAX_POLL_ATTEMPTS: u32 = 60;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// A raw setting as it arrives from TOML or the environment.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl SettingValue {
    pub fn as_text(&self) -> String {
        match self {
            Self::Bool(b) => b.to_string(),
            Self::Int(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Text(s) => s.clone(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawSettings {
    pipeline: Option<SettingValue>,
    min_score: Option<SettingValue>,
    min_content_length: Option<SettingValue>,
    content: RawContent,
    model_service: RawModelService,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawContent {
    model_id: Option<SettingValue>,
    field: Option<SettingValue>,
    nested_field: Option<SettingValue>,
    chunk_field: Option<SettingValue>,
    chunk_size: Option<SettingValue>,
    dimension: Option<SettingValue>,
    engine: Option<SettingValue>,
    method: Option<SettingValue>,
    space_type: Option<SettingValue>,
    param: RawParam,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawParam {
    m: Option<SettingValue>,
    ef_construction: Option<SettingValue>,
    ef_search: Option<SettingValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawModelService {
    endpoint: Option<SettingValue>,
    poll_interval_ms: Option<SettingValue>,
    max_poll_attempts: Option<SettingValue>,
    timeout_secs: Option<SettingValue>,
}

/// How to reach the ML service and how long to wait for a deployment.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelServiceSettings {
    pub endpoint: String,
    pub poll_interval: Duration,
    pub max_poll_attempts: u32,
    pub timeout: Duration,
}

impl Default for ModelServiceSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_MODEL_ENDPOINT.to_string(),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            max_poll_attempts: DEFAULT_MAX_POLL_ATTEMPTS,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Immutable, typed semantic-search settings.
///
/// Text settings are `None` when missing or blank. Numeric settings that
/// fail to parse are `None` (or fall back to their documented default) and
/// are reported once, at load time.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigSnapshot {
    pub pipeline: Option<String>,
    pub model_id: Option<String>,
    pub field: Option<String>,
    pub nested_field: Option<String>,
    pub chunk_field: Option<String>,
    pub chunk_size: Option<usize>,
    pub dimension: Option<u32>,
    pub engine: Option<String>,
    pub method: Option<String>,
    pub space_type: String,
    pub param_m: u32,
    pub param_ef_construction: u32,
    pub param_ef_search: Option<u32>,
    pub min_score: Option<f32>,
    pub min_content_length: Option<i64>,
    pub model_service: ModelServiceSettings,
}

impl Default for ConfigSnapshot {
    fn default() -> Self {
        Self {
            pipeline: None,
            model_id: None,
            field: None,
            nested_field: None,
            chunk_field: None,
            chunk_size: None,
            dimension: None,
            engine: None,
            method: None,
            space_type: DEFAULT_SPACE_TYPE.to_string(),
            param_m: DEFAULT_PARAM_M,
            param_ef_construction: DEFAULT_PARAM_EF_CONSTRUCTION,
            param_ef_search: None,
            min_score: None,
            min_content_length: None,
            model_service: ModelServiceSettings::default(),
        }
    }
}

impl ConfigSnapshot {
    /// Parse the `semantic_search` tree. Never fails: a missing or
    /// malformed tree yields the defaults.
    pub fn load(config: &Config) -> Self {
        if !config.contains(keys::ROOT) {
            debug!("no {} settings found, semantic search is inactive", keys::ROOT);
            return Self::default();
        }
        match config.get::<RawSettings>(keys::ROOT) {
            Ok(raw) => Self::from_raw(&raw),
            Err(e) => {
                warn!(error = %e, "failed to read {} settings", keys::ROOT);
                Self::default()
            }
        }
    }

    fn from_raw(raw: &RawSettings) -> Self {
        let c = &raw.content;
        let ms = &raw.model_service;
        let defaults = ModelServiceSettings::default();
        Self {
            pipeline: text(&raw.pipeline),
            model_id: text(&c.model_id),
            field: text(&c.field),
            nested_field: text(&c.nested_field),
            chunk_field: text(&c.chunk_field),
            chunk_size: number(keys::CONTENT_CHUNK_SIZE, &c.chunk_size),
            dimension: number(keys::CONTENT_DIMENSION, &c.dimension),
            engine: text(&c.engine),
            method: text(&c.method),
            space_type: text(&c.space_type).unwrap_or_else(|| DEFAULT_SPACE_TYPE.to_string()),
            param_m: number(keys::CONTENT_PARAM_M, &c.param.m).unwrap_or(DEFAULT_PARAM_M),
            param_ef_construction: number(keys::CONTENT_PARAM_EF_CONSTRUCTION, &c.param.ef_construction)
                .unwrap_or(DEFAULT_PARAM_EF_CONSTRUCTION),
            param_ef_search: number(keys::CONTENT_PARAM_EF_SEARCH, &c.param.ef_search),
            min_score: number(keys::MIN_SCORE, &raw.min_score),
            min_content_length: number(keys::MIN_CONTENT_LENGTH, &raw.min_content_length),
            model_service: ModelServiceSettings {
                endpoint: text(&ms.endpoint).unwrap_or(defaults.endpoint),
                poll_interval: number(keys::MODEL_SERVICE_POLL_INTERVAL_MS, &ms.poll_interval_ms)
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.poll_interval),
                max_poll_attempts: number(keys::MODEL_SERVICE_MAX_POLL_ATTEMPTS, &ms.max_poll_attempts)
                    .unwrap_or(defaults.max_poll_attempts),
                timeout: number(keys::MODEL_SERVICE_TIMEOUT_SECS, &ms.timeout_secs)
                    .map(Duration::from_secs)
                    .unwrap_or(defaults.timeout),
            },
        }
    }

    /// Number of inner hits (chunks) requested per nested match.
    pub fn inner_hits_size(&self) -> usize {
        self.chunk_size.unwrap_or(DEFAULT_CHUNK_SIZE)
    }

    pub fn is_nested(&self) -> bool {
        self.nested_field.is_some()
    }
}

fn text(value: &Option<SettingValue>) -> Option<String> {
    value
        .as_ref()
        .map(|v| v.as_text().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn number<T>(key: &str, value: &Option<SettingValue>) -> Option<T>
where
    T: FromStr,
    T::Err: Display,
{
    let raw = text(value)?;
    match raw.parse::<T>() {
        Ok(v) => Some(v),
        Err(e) => {
            warn!(key, value = %raw, error = %e, "ignoring unparsable setting");
            None
        }
    }
}

/// Shared holder of the current snapshot.
///
/// Written only by the reload path; every request clones the `Arc` and
/// works against that copy for its whole duration.
#[derive(Debug)]
pub struct SnapshotCell {
    current: RwLock<Arc<ConfigSnapshot>>,
}

impl SnapshotCell {
    pub fn new(snapshot: ConfigSnapshot) -> Self {
        Self { current: RwLock::new(Arc::new(snapshot)) }
    }

    pub fn load(&self) -> Arc<ConfigSnapshot> {
        Arc::clone(&self.current.read())
    }

    /// Swap in a new snapshot, returning the one it replaced.
    pub fn replace(&self, snapshot: ConfigSnapshot) -> Arc<ConfigSnapshot> {
        std::mem::replace(&mut *self.current.write(), Arc::new(snapshot))
    }
}

impl Default for SnapshotCell {
    fn default() -> Self {
        Self::new(ConfigSnapshot::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_trims_and_drops_blank() {
        assert_eq!(text(&Some(SettingValue::Text("  ".into()))), None);
        assert_eq!(text(&Some(SettingValue::Text(" m1 ".into()))), Some("m1".to_string()));
        assert_eq!(text(&Some(SettingValue::Int(384))), Some("384".to_string()));
    }

    #[test]
    fn number_rejects_garbage() {
        assert_eq!(number::<u32>("k", &Some(SettingValue::Text("abc".into()))), None);
        assert_eq!(number::<u32>("k", &Some(SettingValue::Text("150".into()))), Some(150));
        assert_eq!(number::<f32>("k", &Some(SettingValue::Float(0.5))), Some(0.5));
    }
}
