//! Domain types shared by the lexical and semantic search paths.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Page size used when a request does not carry one.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// The engine's single unified search field: unqualified query terms target it.
pub const DEFAULT_FIELD: &str = "_default";

/// A returned document, as a JSON object of field name to value.
pub type Document = Map<String, Value>;

/// Identity of the user issuing a search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub user_id: String,
    pub roles: Vec<String>,
}

/// Geographic restriction, already expressed as an engine filter clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoInfo {
    pub filter: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacetInfo {
    pub fields: Vec<String>,
    pub size: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighlightInfo {
    pub fields: Vec<String>,
    pub fragment_size: usize,
    pub number_of_fragments: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchRequestType {
    #[default]
    Search,
    Json,
    Admin,
}

/// Caller-supplied search parameters.
///
/// This is the plain value the web layer builds; the [`SearchParams`]
/// trait is what the search pipeline consumes so that it can be wrapped.
///
/// [`SearchParams`]: crate::traits::SearchParams
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchRequestParams {
    pub query: String,
    pub fields: HashMap<String, Vec<String>>,
    pub conditions: HashMap<String, Vec<String>>,
    pub languages: Vec<String>,
    pub geo_info: Option<GeoInfo>,
    pub facet_info: Option<FacetInfo>,
    pub highlight_info: Option<HighlightInfo>,
    pub sort: Option<String>,
    pub start_position: usize,
    pub page_size: Option<usize>,
    pub offset: usize,
    pub extra_queries: Vec<String>,
    pub attributes: HashMap<String, Value>,
    pub locale: Option<String>,
    pub request_type: SearchRequestType,
    pub similar_doc_hash: Option<String>,
    pub min_score: Option<f32>,
}

impl SearchRequestParams {
    pub fn new(query: impl Into<String>) -> Self {
        Self { query: query.into(), ..Self::default() }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size);
        self
    }
}

/// Position of a nested sub-document inside its parent's array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NestedIdentity {
    pub field: String,
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InnerHit {
    #[serde(rename = "_nested", default, skip_serializing_if = "Option::is_none")]
    pub nested: Option<NestedIdentity>,
    #[serde(rename = "_score", default)]
    pub score: Option<f32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InnerHitList {
    #[serde(default)]
    pub hits: Vec<InnerHit>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InnerHits {
    #[serde(default)]
    pub hits: InnerHitList,
}

/// One hit as returned by the engine, before any post-processing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_score", default)]
    pub score: Option<f32>,
    #[serde(rename = "_source", default)]
    pub source: Document,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub inner_hits: HashMap<String, InnerHits>,
}

impl SearchHit {
    /// Flatten into a document, adding `_id` and `score`.
    pub fn into_document(self) -> Document {
        let mut doc = self.source;
        doc.insert("_id".to_string(), Value::String(self.id));
        if let Some(score) = self.score {
            doc.insert("score".to_string(), Value::from(score));
        }
        doc
    }
}
