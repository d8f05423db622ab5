use anyhow::{Context, Result};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::debug;

use semsearch_core::traits::{SearchParams, SearchTransport};
use semsearch_core::types::{Document, SearchHit, DEFAULT_PAGE_SIZE};
use semsearch_text::{QueryCompiler, QueryContext, QueryFieldConfig, QueryParser};

/// Raw engine answer: hit count plus the hits themselves.
#[derive(Debug, Clone, Default)]
pub struct SearchResponse {
    pub total: u64,
    pub hits: Vec<SearchHit>,
}

impl SearchResponse {
    pub fn from_json(response: &Value) -> Result<Self> {
        let hits = &response["hits"];
        let total = hits["total"]["value"].as_u64().or_else(|| hits["total"].as_u64()).unwrap_or(0);
        let list = hits.get("hits").cloned().unwrap_or_else(|| json!([]));
        let hits: Vec<SearchHit> = serde_json::from_value(list).context("decoding search hits")?;
        Ok(Self { total, hits })
    }
}

/// Documents ready for display, plus what the compiler recorded.
#[derive(Debug, Clone, Default)]
pub struct SearchResults {
    pub total: u64,
    pub documents: Vec<Document>,
    pub query_context: QueryContext,
}

/// Builds and runs keyword search requests.
pub struct LexicalSearcher {
    parser: QueryParser,
    compiler: QueryCompiler,
    transport: Arc<dyn SearchTransport>,
}

impl LexicalSearcher {
    pub fn new(fields: QueryFieldConfig, transport: Arc<dyn SearchTransport>) -> Self {
        Self { parser: QueryParser::new(), compiler: QueryCompiler::new(fields), transport }
    }

    pub fn fields(&self) -> &QueryFieldConfig {
        self.compiler.fields()
    }

    pub fn parser_mut(&mut self) -> &mut QueryParser {
        &mut self.parser
    }

    pub fn compiler_mut(&mut self) -> &mut QueryCompiler {
        &mut self.compiler
    }

    /// Compile `query` and wrap it in a complete request body.
    pub fn build_request(&self, query: &str, params: &dyn SearchParams) -> Result<(Value, QueryContext)> {
        let mut text = query.to_string();
        for extra in params.extra_queries() {
            text.push(' ');
            text.push_str(extra);
        }
        let ast = self.parser.parse(&text)?;
        let mut context = QueryContext::new();
        let compiled = self.compiler.compile(&ast, &mut context)?;

        let filters = filters(params);
        let query = if filters.is_empty() {
            compiled
        } else {
            json!({ "bool": { "must": [compiled], "filter": filters } })
        };

        let mut body = Map::new();
        body.insert("query".to_string(), query);
        body.insert("from".to_string(), json!(params.start_position()));
        body.insert("size".to_string(), json!(params.page_size().unwrap_or(DEFAULT_PAGE_SIZE)));
        body.insert("track_total_hits".to_string(), json!(true));
        body.insert("_source".to_string(), json!(self.fields().response_fields));
        if let Some(min_score) = params.min_score() {
            body.insert("min_score".to_string(), json!(min_score));
        }
        if let Some(sort) = params.sort().map(sort_clauses).filter(|s| !s.is_empty()) {
            body.insert("sort".to_string(), Value::Array(sort));
        }
        if let Some(highlight) = params.highlight_info() {
            let fields: Map<String, Value> = highlight.fields.iter().map(|f| (f.clone(), json!({}))).collect();
            body.insert(
                "highlight".to_string(),
                json!({
                    "fields": fields,
                    "fragment_size": highlight.fragment_size,
                    "number_of_fragments": highlight.number_of_fragments
                }),
            );
        }
        if let Some(facet) = params.facet_info() {
            let aggs: Map<String, Value> = facet
                .fields
                .iter()
                .map(|f| (f.clone(), json!({ "terms": { "field": f, "size": facet.size } })))
                .collect();
            body.insert("aggs".to_string(), Value::Object(aggs));
        }
        Ok((Value::Object(body), context))
    }

    pub fn execute(&self, body: &Value) -> Result<SearchResponse> {
        let index = &self.fields().index;
        debug!(index = %index, %body, "search request");
        let response = self.transport.search(index, body)?;
        SearchResponse::from_json(&response)
    }

    pub fn search(&self, query: &str, params: &dyn SearchParams) -> Result<SearchResults> {
        let (body, query_context) = self.build_request(query, params)?;
        let response = self.execute(&body)?;
        Ok(SearchResults {
            total: response.total,
            documents: response.hits.into_iter().map(SearchHit::into_document).collect(),
            query_context,
        })
    }
}

fn filters(params: &dyn SearchParams) -> Vec<Value> {
    let mut filters = Vec::new();
    let mut fields: Vec<(&String, &Vec<String>)> = params.fields().iter().filter(|(_, v)| !v.is_empty()).collect();
    fields.sort_by(|a, b| a.0.cmp(b.0));
    for (field, values) in fields {
        filters.push(json!({ "terms": { field.as_str(): values } }));
    }
    if !params.languages().is_empty() {
        filters.push(json!({ "terms": { "lang": params.languages() } }));
    }
    if let Some(geo) = params.geo_info() {
        filters.push(geo.filter.clone());
    }
    filters
}

/// `"last_modified.desc,score"` to engine sort clauses.
fn sort_clauses(sort: &str) -> Vec<Value> {
    sort.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| match s.rsplit_once('.') {
            Some((field, order @ ("asc" | "desc"))) => json!({ field: { "order": order } }),
            _ => json!(s),
        })
        .collect()
}
