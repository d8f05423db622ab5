//! The `neural` query clause.
//!
//! A [`NeuralQuery`] only describes the clause; the engine embeds the query
//! text with the named model and runs the vector search. It can be shipped
//! over the wire but never executed locally.
use serde::{Serialize, Serializer};
use serde_json::{json, Map, Value};
use std::convert::Infallible;
use std::fmt;
use std::hash::{Hash, Hasher};

use semsearch_core::error::{Error, Result};
use semsearch_core::types::DEFAULT_PAGE_SIZE;

pub const NAME: &str = "neural";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeuralQuery {
    field: String,
    query_text: String,
    model_id: String,
    k: usize,
    ef_search: Option<u32>,
    filter: Option<Value>,
}

impl NeuralQuery {
    pub fn builder() -> NeuralQueryBuilder {
        NeuralQueryBuilder::default()
    }

    pub fn field(&self) -> &str { &self.field }
    pub fn query_text(&self) -> &str { &self.query_text }
    pub fn model_id(&self) -> &str { &self.model_id }
    pub fn k(&self) -> usize { self.k }
    pub fn ef_search(&self) -> Option<u32> { self.ef_search }
    pub fn filter(&self) -> Option<&Value> { self.filter.as_ref() }

    pub fn to_json(&self) -> Value {
        let mut body = Map::new();
        body.insert("query_text".to_string(), json!(self.query_text));
        body.insert("model_id".to_string(), json!(self.model_id));
        body.insert("k".to_string(), json!(self.k));
        if let Some(ef_search) = self.ef_search {
            body.insert("ef_search".to_string(), json!(ef_search));
        }
        if let Some(filter) = &self.filter {
            body.insert("filter".to_string(), filter.clone());
        }
        json!({ NAME: { self.field.as_str(): body } })
    }

    /// Neural clauses are evaluated by the remote engine only; reaching
    /// this means a caller tried to score one in-process.
    pub fn to_local_query(&self) -> Result<Infallible> {
        Err(Error::Unsupported(format!("local execution of the {NAME} query on {}", self.field)))
    }
}

// `filter` takes part in equality but not in the hash; equal values still hash equally.
impl Hash for NeuralQuery {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.field.hash(state);
        self.query_text.hash(state);
        self.model_id.hash(state);
        self.k.hash(state);
        self.ef_search.hash(state);
    }
}

impl Serialize for NeuralQuery {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl fmt::Display for NeuralQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

#[derive(Debug, Default, Clone)]
pub struct NeuralQueryBuilder {
    field: Option<String>,
    query_text: Option<String>,
    model_id: Option<String>,
    k: Option<usize>,
    ef_search: Option<u32>,
    filter: Option<Value>,
}

impl NeuralQueryBuilder {
    pub fn field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn query(mut self, query_text: impl Into<String>) -> Self {
        self.query_text = Some(query_text.into());
        self
    }

    pub fn model_id(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = Some(model_id.into());
        self
    }

    pub fn k(mut self, k: usize) -> Self {
        self.k = Some(k);
        self
    }

    pub fn ef_search(mut self, ef_search: Option<u32>) -> Self {
        self.ef_search = ef_search;
        self
    }

    pub fn filter(mut self, filter: Value) -> Self {
        self.filter = Some(filter);
        self
    }

    /// `None` unless field, model id and query text are all non-blank.
    /// A zero or missing `k` becomes the default page size.
    pub fn build(self) -> Option<NeuralQuery> {
        let non_blank = |s: Option<String>| s.filter(|s| !s.trim().is_empty());
        Some(NeuralQuery {
            field: non_blank(self.field)?,
            query_text: non_blank(self.query_text)?,
            model_id: non_blank(self.model_id)?,
            k: self.k.filter(|k| *k > 0).unwrap_or(DEFAULT_PAGE_SIZE),
            ef_search: self.ef_search,
            filter: self.filter,
        })
    }
}

/// A neural query as placed in the query tree: flat against a top-level
/// vector field, or wrapped in a `nested` query over chunk vectors.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NeuralClause {
    Flat(NeuralQuery),
    Nested { path: String, query: NeuralQuery, inner_hits_size: usize },
}

impl NeuralClause {
    pub fn query(&self) -> &NeuralQuery {
        match self {
            Self::Flat(query) | Self::Nested { query, .. } => query,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Self::Flat(query) => query.to_json(),
            Self::Nested { path, query, inner_hits_size } => json!({
                "nested": {
                    "path": path,
                    "query": query.to_json(),
                    "score_mode": "max",
                    "inner_hits": { "size": inner_hits_size, "_source": false }
                }
            }),
        }
    }
}

impl fmt::Display for NeuralClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}
