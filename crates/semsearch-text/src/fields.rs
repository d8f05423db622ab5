use serde::Deserialize;
use tracing::warn;

use semsearch_core::config::Config;
use semsearch_core::keys;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BoostedField {
    pub name: String,
    #[serde(default = "one")]
    pub boost: f32,
}

fn one() -> f32 {
    1.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DefaultOperator {
    #[default]
    And,
    Or,
}

/// Field layout of the document index as seen by the query compiler.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct QueryFieldConfig {
    pub index: String,
    /// Fields an unqualified term expands to.
    pub default_fields: Vec<BoostedField>,
    /// Fields a user may qualify a term with (`field:value`).
    pub search_fields: Vec<String>,
    pub response_fields: Vec<String>,
    pub content_length_field: String,
    pub content_description_field: String,
    pub default_operator: DefaultOperator,
    pub fuzzy_field: String,
    pub fuzzy_min_length: usize,
}

impl Default for QueryFieldConfig {
    fn default() -> Self {
        let strings = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        Self {
            index: "documents".to_string(),
            default_fields: vec![
                BoostedField { name: "title".to_string(), boost: 0.5 },
                BoostedField { name: "content".to_string(), boost: 0.05 },
            ],
            search_fields: strings(&[
                "title", "content", "url", "host", "site", "filetype", "label", "lang",
                "content_length", "last_modified", "timestamp",
            ]),
            response_fields: strings(&[
                "title", "url", "host", "site", "filetype", "content_length", "last_modified",
                "lang", "content_description",
            ]),
            content_length_field: "content_length".to_string(),
            content_description_field: "content_description".to_string(),
            default_operator: DefaultOperator::And,
            fuzzy_field: "content".to_string(),
            fuzzy_min_length: 4,
        }
    }
}

impl QueryFieldConfig {
    pub fn load(config: &Config) -> Self {
        if !config.contains(keys::QUERY) {
            return Self::default();
        }
        config.get::<Self>(keys::QUERY).unwrap_or_else(|e| {
            warn!(error = %e, "failed to read query field settings, using defaults");
            Self::default()
        })
    }

    pub fn is_searchable(&self, field: &str) -> bool {
        self.search_fields.iter().any(|f| f == field)
    }
}
