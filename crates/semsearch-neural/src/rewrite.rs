//! Decides when a lexical query becomes a neural one.
//!
//! Two hooks into the lexical pipeline: [`SemanticRewriter::rewrite_query`]
//! runs on the raw query text before parsing, and the [`NodeInterceptor`]
//! impl runs on each term or phrase node of the parsed tree.
use std::sync::Arc;
use tracing::debug;

use semsearch_core::context::ContextStore;
use semsearch_core::snapshot::SnapshotCell;
use semsearch_core::types::{DEFAULT_FIELD, DEFAULT_PAGE_SIZE};
use semsearch_text::{NodeDecision, NodeInterceptor, QueryContext, QueryNode};

use crate::query::{NeuralClause, NeuralQuery};

pub struct SemanticRewriter {
    snapshot: Arc<SnapshotCell>,
    contexts: Arc<ContextStore>,
    search_fields: Vec<String>,
}

impl SemanticRewriter {
    pub fn new(snapshot: Arc<SnapshotCell>, contexts: Arc<ContextStore>, search_fields: Vec<String>) -> Self {
        Self { snapshot, contexts, search_fields }
    }

    /// Quote an unquoted multi-word query so it reaches the compiler as one
    /// phrase node. Queries that already quote something, qualify a
    /// searchable field, or arrive while no model is configured pass through.
    pub fn rewrite_query(&self, query: &str) -> String {
        let trimmed = query.trim();
        if trimmed.is_empty() || query.contains('"') || !trimmed.contains(char::is_whitespace) {
            return query.to_string();
        }
        if self.references_search_field(query) {
            return query.to_string();
        }
        if self.snapshot.load().model_id.is_none() {
            return query.to_string();
        }
        format!("\"{query}\"")
    }

    fn references_search_field(&self, query: &str) -> bool {
        self.search_fields
            .iter()
            .any(|field| query.contains(&format!("{field}:")))
    }

    /// Build the neural clause for `text`, or `None` when the model id, the
    /// vector field or the text itself is missing.
    pub fn build_neural_query(&self, text: &str) -> Option<NeuralClause> {
        let snapshot = self.snapshot.load();
        let k = self
            .contexts
            .current()
            .and_then(|ctx| ctx.params().page_size())
            .unwrap_or(DEFAULT_PAGE_SIZE);
        let field = snapshot.field.as_deref()?;
        let target = match snapshot.nested_field.as_deref() {
            Some(nested) => format!("{nested}.{field}"),
            None => field.to_string(),
        };
        let query = NeuralQuery::builder()
            .model_id(snapshot.model_id.clone()?)
            .field(target)
            .query(text.trim())
            .k(k)
            .ef_search(snapshot.param_ef_search)
            .build()?;
        Some(match snapshot.nested_field.as_deref() {
            Some(nested) => NeuralClause::Nested {
                path: nested.to_string(),
                query,
                inner_hits_size: snapshot.inner_hits_size(),
            },
            None => NeuralClause::Flat(query),
        })
    }
}

impl NodeInterceptor for SemanticRewriter {
    fn intercept(&self, node: &QueryNode<'_>, context: &mut QueryContext) -> NodeDecision {
        if node.field != DEFAULT_FIELD || self.contexts.current().is_none() {
            return NodeDecision::Defer;
        }
        let text = node.text();
        match self.build_neural_query(&text) {
            Some(clause) => {
                context.add_field_log(node.field, &text);
                context.add_highlighted_query(&text);
                debug!(%clause, "neural query");
                NodeDecision::Replace(clause.to_json())
            }
            None => NodeDecision::Defer,
        }
    }
}
