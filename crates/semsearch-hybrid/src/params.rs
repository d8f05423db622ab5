use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use semsearch_core::traits::SearchParams;
use semsearch_core::types::{FacetInfo, GeoInfo, HighlightInfo, SearchRequestType};

/// The caller's parameters as the semantic path sees them: the configured
/// score floor replaces the caller's, and geo, facet and highlight requests
/// are dropped. Everything else reads through.
#[derive(Debug, Clone)]
pub struct AugmentedParams {
    inner: Arc<dyn SearchParams>,
    min_score: Option<f32>,
}

impl AugmentedParams {
    pub fn new(inner: Arc<dyn SearchParams>, min_score: Option<f32>) -> Self {
        Self { inner, min_score }
    }

    pub fn inner(&self) -> &dyn SearchParams {
        self.inner.as_ref()
    }
}

impl SearchParams for AugmentedParams {
    fn query(&self) -> &str { self.inner.query() }
    fn fields(&self) -> &HashMap<String, Vec<String>> { self.inner.fields() }
    fn conditions(&self) -> &HashMap<String, Vec<String>> { self.inner.conditions() }
    fn languages(&self) -> &[String] { self.inner.languages() }
    fn geo_info(&self) -> Option<&GeoInfo> { None }
    fn facet_info(&self) -> Option<&FacetInfo> { None }
    fn highlight_info(&self) -> Option<&HighlightInfo> { None }
    fn sort(&self) -> Option<&str> { self.inner.sort() }
    fn start_position(&self) -> usize { self.inner.start_position() }
    fn page_size(&self) -> Option<usize> { self.inner.page_size() }
    fn offset(&self) -> usize { self.inner.offset() }
    fn extra_queries(&self) -> &[String] { self.inner.extra_queries() }
    fn attribute(&self, name: &str) -> Option<&Value> { self.inner.attribute(name) }
    fn locale(&self) -> Option<&str> { self.inner.locale() }
    fn request_type(&self) -> SearchRequestType { self.inner.request_type() }
    fn similar_doc_hash(&self) -> Option<&str> { self.inner.similar_doc_hash() }
    fn min_score(&self) -> Option<f32> { self.min_score }
}
