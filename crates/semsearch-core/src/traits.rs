use serde_json::Value;
use std::collections::HashMap;
use std::fmt::Debug;

use crate::types::{FacetInfo, GeoInfo, HighlightInfo, SearchRequestParams, SearchRequestType};

/// Read-only view over a search request's parameters.
///
/// The pipeline only ever sees this trait, which lets a caller wrap the
/// parameters it received and override individual accessors.
pub trait SearchParams: Debug + Send + Sync {
    fn query(&self) -> &str;
    fn fields(&self) -> &HashMap<String, Vec<String>>;
    fn conditions(&self) -> &HashMap<String, Vec<String>>;
    fn languages(&self) -> &[String];
    fn geo_info(&self) -> Option<&GeoInfo>;
    fn facet_info(&self) -> Option<&FacetInfo>;
    fn highlight_info(&self) -> Option<&HighlightInfo>;
    fn sort(&self) -> Option<&str>;
    fn start_position(&self) -> usize;
    /// `None` when the caller did not ask for a specific page size.
    fn page_size(&self) -> Option<usize>;
    fn offset(&self) -> usize;
    fn extra_queries(&self) -> &[String];
    fn attribute(&self, name: &str) -> Option<&Value>;
    fn locale(&self) -> Option<&str>;
    fn request_type(&self) -> SearchRequestType;
    fn similar_doc_hash(&self) -> Option<&str>;
    fn min_score(&self) -> Option<f32>;
}

impl SearchParams for SearchRequestParams {
    fn query(&self) -> &str { &self.query }
    fn fields(&self) -> &HashMap<String, Vec<String>> { &self.fields }
    fn conditions(&self) -> &HashMap<String, Vec<String>> { &self.conditions }
    fn languages(&self) -> &[String] { &self.languages }
    fn geo_info(&self) -> Option<&GeoInfo> { self.geo_info.as_ref() }
    fn facet_info(&self) -> Option<&FacetInfo> { self.facet_info.as_ref() }
    fn highlight_info(&self) -> Option<&HighlightInfo> { self.highlight_info.as_ref() }
    fn sort(&self) -> Option<&str> { self.sort.as_deref() }
    fn start_position(&self) -> usize { self.start_position }
    fn page_size(&self) -> Option<usize> { self.page_size }
    fn offset(&self) -> usize { self.offset }
    fn extra_queries(&self) -> &[String] { &self.extra_queries }
    fn attribute(&self, name: &str) -> Option<&Value> { self.attributes.get(name) }
    fn locale(&self) -> Option<&str> { self.locale.as_deref() }
    fn request_type(&self) -> SearchRequestType { self.request_type }
    fn similar_doc_hash(&self) -> Option<&str> { self.similar_doc_hash.as_deref() }
    fn min_score(&self) -> Option<f32> { self.min_score }
}

/// Executes a JSON search request body against an index.
pub trait SearchTransport: Send + Sync {
    fn search(&self, index: &str, body: &Value) -> anyhow::Result<Value>;
}
