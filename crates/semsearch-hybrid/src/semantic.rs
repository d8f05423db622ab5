use anyhow::Result;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use semsearch_core::context::ContextStore;
use semsearch_core::snapshot::{ConfigSnapshot, SnapshotCell};
use semsearch_core::traits::SearchParams;
use semsearch_core::types::{Caller, Document, SearchHit};
use semsearch_neural::SemanticRewriter;
use semsearch_text::QueryContext;

use crate::chunks::{self, ChunkFields};
use crate::params::AugmentedParams;
use crate::searcher::{LexicalSearcher, SearchResults};

/// Keyword searcher with the neural rewrite hooked in.
///
/// Each search publishes a request context for its own duration, so that
/// the rewriter can find the caller's page size while the query compiles.
pub struct SemanticSearcher {
    lexical: LexicalSearcher,
    rewriter: Arc<SemanticRewriter>,
    snapshot: Arc<SnapshotCell>,
    contexts: Arc<ContextStore>,
}

impl SemanticSearcher {
    /// Register the pre-parse filter and the node interceptor with `lexical`.
    pub fn new(mut lexical: LexicalSearcher, snapshot: Arc<SnapshotCell>, contexts: Arc<ContextStore>) -> Self {
        let rewriter = Arc::new(SemanticRewriter::new(
            Arc::clone(&snapshot),
            Arc::clone(&contexts),
            lexical.fields().search_fields.clone(),
        ));
        let filter = Arc::clone(&rewriter);
        lexical.parser_mut().add_filter(move |query: &str| filter.rewrite_query(query));
        lexical.compiler_mut().add_interceptor(rewriter.clone());
        Self { lexical, rewriter, snapshot, contexts }
    }

    pub fn lexical(&self) -> &LexicalSearcher {
        &self.lexical
    }

    pub fn rewriter(&self) -> &SemanticRewriter {
        &self.rewriter
    }

    /// Query text as sent to the parser: the caller's text plus, when a
    /// content-length floor is configured and the field is searchable, a
    /// range clause on that field. The caller's text is quoted first so the
    /// range stays a clause of its own.
    pub fn augment_query(&self, query: &str, snapshot: &ConfigSnapshot) -> String {
        let field = &self.lexical.fields().content_length_field;
        match snapshot.min_content_length {
            Some(min) if min >= 0 && self.lexical.fields().is_searchable(field) => {
                let augmented = format!("{} {field}:[{min} TO *]", self.rewriter.rewrite_query(query));
                debug!(query = %augmented, "appended content length range");
                augmented
            }
            _ => query.to_string(),
        }
    }

    /// Compile the augmented request body without running it.
    pub fn build_request(&self, params: Arc<dyn SearchParams>, caller: Option<Caller>) -> Result<Value> {
        let snapshot = self.snapshot.load();
        let (params, query) = self.prepare(params, &snapshot);
        let _guard = self.contexts.enter(params.query(), Arc::clone(&params), caller);
        let (body, _) = self.request_body(&query, params.as_ref(), &snapshot)?;
        Ok(body)
    }

    pub fn search(&self, params: Arc<dyn SearchParams>, caller: Option<Caller>) -> Result<SearchResults> {
        let snapshot = self.snapshot.load();
        let (params, query) = self.prepare(params, &snapshot);
        let _guard = self.contexts.enter(params.query(), Arc::clone(&params), caller);

        let (body, query_context) = self.request_body(&query, params.as_ref(), &snapshot)?;
        let response = self.lexical.execute(&body)?;
        let documents = response.hits.into_iter().map(|hit| self.reconstruct(hit, &snapshot)).collect();
        Ok(SearchResults { total: response.total, documents, query_context })
    }

    fn prepare(&self, params: Arc<dyn SearchParams>, snapshot: &ConfigSnapshot) -> (Arc<dyn SearchParams>, String) {
        let query = self.augment_query(params.query(), snapshot);
        let params: Arc<dyn SearchParams> = Arc::new(AugmentedParams::new(params, snapshot.min_score));
        (params, query)
    }

    fn request_body(
        &self,
        query: &str,
        params: &dyn SearchParams,
        snapshot: &ConfigSnapshot,
    ) -> Result<(Value, QueryContext)> {
        let (mut body, context) = self.lexical.build_request(query, params)?;
        if let (Some(chunk_field), Some(Value::Array(source))) = (snapshot.chunk_field.as_deref(), body.get_mut("_source")) {
            if !source.iter().any(|f| f == chunk_field) {
                source.push(Value::from(chunk_field));
            }
        }
        Ok((body, context))
    }

    fn reconstruct(&self, hit: SearchHit, snapshot: &ConfigSnapshot) -> Document {
        match (snapshot.nested_field.as_deref(), snapshot.chunk_field.as_deref()) {
            (Some(nested_field), Some(chunk_field)) => chunks::reconstruct(
                hit,
                ChunkFields {
                    nested_field,
                    chunk_field,
                    description_field: &self.lexical.fields().content_description_field,
                },
            ),
            _ => hit.into_document(),
        }
    }
}
