//! Index template rewriting.
//!
//! Templates are parsed, edited as a tree and serialized again. Each
//! injected entry lands directly before an anchor key (`index`, `codec`,
//! `content`) in every object that carries the anchor. A template with no
//! anchor comes back byte-for-byte unchanged.
use serde_json::{json, Map, Value};
use std::fmt;
use tracing::debug;

use semsearch_core::error::Result;
use semsearch_core::snapshot::ConfigSnapshot;

const INDEX_ANCHOR: &str = "index";
const CODEC_ANCHOR: &str = "codec";
const CONTENT_ANCHOR: &str = "content";

/// A transformation over a serialized template.
pub type RewriteRule = Box<dyn Fn(&str) -> Result<String> + Send + Sync>;

/// Rules applied, in registration order, when the index settings and
/// mapping templates are materialized.
#[derive(Default)]
pub struct TemplateRules {
    settings: Vec<RewriteRule>,
    mapping: Vec<RewriteRule>,
}

impl TemplateRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_setting_rule(&mut self, rule: RewriteRule) {
        self.settings.push(rule);
    }

    pub fn add_mapping_rule(&mut self, rule: RewriteRule) {
        self.mapping.push(rule);
    }

    pub fn apply_settings(&self, template: &str) -> Result<String> {
        apply(&self.settings, template)
    }

    pub fn apply_mapping(&self, template: &str) -> Result<String> {
        apply(&self.mapping, template)
    }
}

impl fmt::Debug for TemplateRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateRules")
            .field("settings", &self.settings.len())
            .field("mapping", &self.mapping.len())
            .finish()
    }
}

fn apply(rules: &[RewriteRule], template: &str) -> Result<String> {
    rules.iter().try_fold(template.to_string(), |current, rule| rule(&current))
}

/// Adds `default_pipeline` ahead of the `index` block when a pipeline is
/// configured, and `knn: true` ahead of `codec`.
pub fn rewrite_settings(snapshot: &ConfigSnapshot, template: &str) -> Result<String> {
    debug!(pipeline = ?snapshot.pipeline, "rewriting index settings");
    let mut root: Value = serde_json::from_str(template)?;
    let mut inserted = 0;
    if let Some(pipeline) = &snapshot.pipeline {
        inserted += insert_before(&mut root, INDEX_ANCHOR, &[("default_pipeline", json!(pipeline))]);
    }
    inserted += insert_before(&mut root, CODEC_ANCHOR, &[("knn", json!(true))]);
    finish(root, inserted, template)
}

/// Adds the vector field definition ahead of the `content` property.
///
/// Identity unless dimension, field, method and engine are all configured.
/// With a nested field the vector lives inside a `nested` block and the
/// chunk texts get a stored, non-indexed field next to it.
pub fn rewrite_mapping(snapshot: &ConfigSnapshot, template: &str) -> Result<String> {
    let (Some(dimension), Some(field), Some(method), Some(engine)) = (
        snapshot.dimension,
        snapshot.field.as_deref(),
        snapshot.method.as_deref(),
        snapshot.engine.as_deref(),
    ) else {
        debug!(
            field = ?snapshot.field,
            dimension = ?snapshot.dimension,
            method = ?snapshot.method,
            engine = ?snapshot.engine,
            "vector mapping not configured"
        );
        return Ok(template.to_string());
    };

    let vector = json!({
        "type": "knn_vector",
        "dimension": dimension,
        "method": {
            "name": method,
            "engine": engine,
            "space_type": snapshot.space_type,
            "parameters": {
                "m": snapshot.param_m,
                "ef_construction": snapshot.param_ef_construction
            }
        }
    });

    let mut entries: Vec<(&str, Value)> = Vec::new();
    match snapshot.nested_field.as_deref() {
        Some(nested) => {
            entries.push((nested, json!({ "type": "nested", "properties": { field: vector } })));
            if let Some(chunk_field) = snapshot.chunk_field.as_deref() {
                entries.push((chunk_field, json!({ "type": "text", "index": false })));
            }
        }
        None => entries.push((field, vector)),
    }

    let mut root: Value = serde_json::from_str(template)?;
    let inserted = insert_before(&mut root, CONTENT_ANCHOR, &entries);
    finish(root, inserted, template)
}

fn finish(root: Value, inserted: usize, template: &str) -> Result<String> {
    if inserted == 0 {
        return Ok(template.to_string());
    }
    Ok(serde_json::to_string_pretty(&root)?)
}

/// Insert `entries` before `anchor` in every object holding that key.
/// An entry whose key already exists in the object replaces it.
fn insert_before(value: &mut Value, anchor: &str, entries: &[(&str, Value)]) -> usize {
    match value {
        Value::Object(map) => {
            let mut inserted: usize = map.values_mut().map(|child| insert_before(child, anchor, entries)).sum();
            if map.contains_key(anchor) {
                let old = std::mem::take(map);
                let mut rebuilt = Map::with_capacity(old.len() + entries.len());
                for (key, child) in old {
                    if entries.iter().any(|(name, _)| *name == key) {
                        continue;
                    }
                    if key == anchor {
                        for (name, entry) in entries {
                            rebuilt.insert((*name).to_string(), entry.clone());
                        }
                    }
                    rebuilt.insert(key, child);
                }
                *map = rebuilt;
                inserted += 1;
            }
            inserted
        }
        Value::Array(items) => items.iter_mut().map(|item| insert_before(item, anchor, entries)).sum(),
        _ => 0,
    }
}
