use serde_json::{json, Value};
use std::sync::Arc;

use semsearch_text::{
    DefaultOperator, LiteralKind, NodeDecision, NodeInterceptor, QueryCompiler, QueryContext, QueryFieldConfig, QueryNode,
    QueryParser,
};

fn compile(query: &str) -> (Value, QueryContext) {
    compile_with(QueryCompiler::new(QueryFieldConfig::default()), query)
}

fn compile_with(compiler: QueryCompiler, query: &str) -> (Value, QueryContext) {
    let ast = QueryParser::new().parse(query).expect("parse");
    let mut ctx = QueryContext::new();
    let value = compiler.compile(&ast, &mut ctx).expect("compile");
    (value, ctx)
}

#[test]
fn default_field_term_fans_out_over_default_fields() {
    let (q, ctx) = compile("search");
    let should = q["bool"]["should"].as_array().expect("should");
    assert_eq!(should[0], json!({ "match_phrase": { "title": { "query": "search", "boost": 0.5 } } }));
    assert_eq!(should[1]["match_phrase"]["content"]["query"], "search");
    assert_eq!(should[2]["fuzzy"]["content"]["value"], "search", "long terms get a fuzzy clause");
    assert_eq!(ctx.field_logs(), &[("_default".to_string(), "search".to_string())]);
    assert_eq!(ctx.highlighted_queries(), &["search".to_string()]);
}

#[test]
fn short_terms_skip_fuzzy() {
    let (q, _) = compile("abc");
    assert_eq!(q["bool"]["should"].as_array().expect("should").len(), 2);
}

#[test]
fn quoted_text_is_a_phrase() {
    let (q, ctx) = compile("\"semantic   search\"");
    let should = q["bool"]["should"].as_array().expect("should");
    assert_eq!(should[0]["match_phrase"]["title"]["query"], "semantic search");
    assert_eq!(ctx.highlighted_queries(), &["semantic search".to_string()]);
}

#[test]
fn explicit_field_gets_single_clause() {
    let (q, _) = compile("title:rust");
    assert_eq!(q, json!({ "match_phrase": { "title": { "query": "rust", "boost": 1.0 } } }));
}

#[test]
fn open_range_becomes_range_clause() {
    let (q, _) = compile("content_length:[100 TO *]");
    assert_eq!(q, json!({ "range": { "content_length": { "gte": "100" } } }));
}

#[test]
fn default_operator_and_requires_every_clause() {
    let (q, _) = compile("alpha -beta");
    assert_eq!(q["bool"]["must"].as_array().expect("must").len(), 1);
    assert_eq!(q["bool"]["must_not"].as_array().expect("must_not").len(), 1);

    let (q, _) = compile("alpha gamma");
    assert_eq!(q["bool"]["must"].as_array().expect("must").len(), 2);
}

#[test]
fn default_operator_or_uses_should() {
    let fields = QueryFieldConfig { default_operator: DefaultOperator::Or, ..QueryFieldConfig::default() };
    let (q, _) = compile_with(QueryCompiler::new(fields), "alpha gamma");
    assert_eq!(q["bool"]["should"].as_array().expect("should").len(), 2);
    assert!(q["bool"].get("must").is_none());
}

struct Claim;

impl NodeInterceptor for Claim {
    fn intercept(&self, node: &QueryNode<'_>, context: &mut QueryContext) -> NodeDecision {
        if node.field != "_default" {
            return NodeDecision::Defer;
        }
        let text = node.text();
        context.add_highlighted_query(&text);
        NodeDecision::Replace(json!({ "claimed": { "text": text, "phrase": node.kind == LiteralKind::Phrase } }))
    }
}

#[test]
fn interceptor_replaces_default_field_nodes_only() {
    let mut compiler = QueryCompiler::new(QueryFieldConfig::default());
    compiler.add_interceptor(Arc::new(Claim));

    let (q, ctx) = compile_with(compiler, "\"This is   Fess.\" title:rust");
    let must = q["bool"]["must"].as_array().expect("must");
    assert_eq!(must[0], json!({ "claimed": { "text": "This is Fess.", "phrase": true } }));
    assert!(must[1].get("match_phrase").is_some(), "qualified node fell back");
    assert_eq!(ctx.highlighted_queries(), &["This is Fess.".to_string(), "rust".to_string()]);
    assert_eq!(ctx.field_logs(), &[("title".to_string(), "rust".to_string())]);
}

#[test]
fn filter_chain_runs_before_parsing() {
    let mut parser = QueryParser::new();
    parser.add_filter(|q: &str| format!("\"{q}\""));
    let ast = parser.parse("two words").expect("parse");
    let mut ctx = QueryContext::new();
    let q = QueryCompiler::new(QueryFieldConfig::default()).compile(&ast, &mut ctx).expect("compile");
    assert_eq!(q["bool"]["should"][0]["match_phrase"]["title"]["query"], "two words");
}
