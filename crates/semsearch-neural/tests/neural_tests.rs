use serde_json::{json, Value};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use semsearch_core::context::ContextStore;
use semsearch_core::error::Error;
use semsearch_core::snapshot::{ConfigSnapshot, SnapshotCell};
use semsearch_core::types::SearchRequestParams;
use semsearch_neural::{rewrite_mapping, rewrite_settings, NeuralClause, NeuralQuery, SemanticRewriter, TemplateRules};
use semsearch_text::{QueryCompiler, QueryContext, QueryFieldConfig, QueryParser};

fn snapshot() -> ConfigSnapshot {
    ConfigSnapshot {
        model_id: Some("modelx".to_string()),
        field: Some("content_vector".to_string()),
        ..ConfigSnapshot::default()
    }
}

fn setup(snapshot: ConfigSnapshot) -> (SemanticRewriter, Arc<ContextStore>) {
    let contexts = Arc::new(ContextStore::new());
    let search_fields = vec!["title".to_string(), "content".to_string()];
    let rewriter = SemanticRewriter::new(Arc::new(SnapshotCell::new(snapshot)), Arc::clone(&contexts), search_fields);
    (rewriter, contexts)
}

fn compile(rewriter: SemanticRewriter, query: &str) -> (Value, QueryContext) {
    let rewriter = Arc::new(rewriter);
    let mut parser = QueryParser::new();
    let pre = Arc::clone(&rewriter);
    parser.add_filter(move |q: &str| pre.rewrite_query(q));
    let mut compiler = QueryCompiler::new(QueryFieldConfig::default());
    compiler.add_interceptor(rewriter);
    let ast = parser.parse(query).expect("parse");
    let mut ctx = QueryContext::new();
    let value = compiler.compile(&ast, &mut ctx).expect("compile");
    (value, ctx)
}

#[test]
fn default_page_size_becomes_k() {
    let (rewriter, contexts) = setup(snapshot());
    let _guard = contexts.enter("This is Fess.", Arc::new(SearchRequestParams::new("This is Fess.")), None);

    let (q, ctx) = compile(rewriter, "This  is Fess.");
    assert_eq!(
        q,
        json!({ "neural": { "content_vector": { "query_text": "This is Fess.", "model_id": "modelx", "k": 20 } } })
    );
    assert_eq!(ctx.highlighted_queries(), &["This is Fess.".to_string()]);
    assert_eq!(ctx.field_logs(), &[("_default".to_string(), "This is Fess.".to_string())]);
}

#[test]
fn request_page_size_becomes_k() {
    let (rewriter, contexts) = setup(snapshot());
    let params = SearchRequestParams::new("fess").with_page_size(35);
    let _guard = contexts.enter("fess", Arc::new(params), None);

    let clause = rewriter.build_neural_query("fess").expect("clause");
    assert_eq!(clause.query().k(), 35);
}

#[test]
fn nested_field_wraps_the_clause() {
    let snapshot = ConfigSnapshot {
        nested_field: Some("content_nested".to_string()),
        chunk_size: Some(3),
        param_ef_search: Some(64),
        ..snapshot()
    };
    let (rewriter, contexts) = setup(snapshot);
    let _guard = contexts.enter("q", Arc::new(SearchRequestParams::new("q")), None);

    let clause = rewriter.build_neural_query("This is Fess.").expect("clause");
    assert!(matches!(clause, NeuralClause::Nested { .. }));
    let q = clause.to_json();
    assert_eq!(q["nested"]["path"], "content_nested");
    assert_eq!(q["nested"]["score_mode"], "max");
    assert_eq!(q["nested"]["inner_hits"], json!({ "size": 3, "_source": false }));
    let neural = &q["nested"]["query"]["neural"]["content_nested.content_vector"];
    assert_eq!(neural["ef_search"], 64);
    assert_eq!(neural["k"], 20);
}

#[test]
fn missing_preconditions_yield_nothing() {
    let (rewriter, _) = setup(snapshot());
    assert!(rewriter.build_neural_query("   ").is_none());

    let (rewriter, _) = setup(ConfigSnapshot { model_id: None, ..snapshot() });
    assert!(rewriter.build_neural_query("text").is_none());

    let (rewriter, _) = setup(ConfigSnapshot { field: None, ..snapshot() });
    assert!(rewriter.build_neural_query("text").is_none());
}

#[test]
fn without_context_nodes_stay_lexical() {
    let (rewriter, _) = setup(snapshot());
    let (q, _) = compile(rewriter, "search");
    assert!(q.get("neural").is_none());
    assert_eq!(q["bool"]["should"][0]["match_phrase"]["title"]["query"], "search");
}

#[test]
fn qualified_fields_stay_lexical() {
    let (rewriter, contexts) = setup(snapshot());
    let _guard = contexts.enter("title:rust", Arc::new(SearchRequestParams::new("title:rust")), None);
    let (q, _) = compile(rewriter, "title:rust");
    assert_eq!(q, json!({ "match_phrase": { "title": { "query": "rust", "boost": 1.0 } } }));
}

#[test]
fn pre_parse_quoting() {
    let (rewriter, _) = setup(snapshot());
    assert_eq!(rewriter.rewrite_query("two words"), "\"two words\"");
    assert_eq!(rewriter.rewrite_query("single"), "single");
    assert_eq!(rewriter.rewrite_query("  "), "  ");
    assert_eq!(rewriter.rewrite_query("\"already\" quoted"), "\"already\" quoted");
    assert_eq!(rewriter.rewrite_query("title:rust lang"), "title:rust lang");
    // operators are quoted along with everything else
    assert_eq!(rewriter.rewrite_query("a AND b"), "\"a AND b\"");

    let (rewriter, _) = setup(ConfigSnapshot::default());
    assert_eq!(rewriter.rewrite_query("two words"), "two words");
}

#[test]
fn local_execution_is_rejected() {
    let query = NeuralQuery::builder().field("v").query("q").model_id("m").build().expect("query");
    assert!(matches!(query.to_local_query(), Err(Error::Unsupported(_))));
}

#[test]
fn builder_defaults_and_filter() {
    let query = NeuralQuery::builder()
        .field("v")
        .query("q")
        .model_id("m")
        .k(0)
        .filter(json!({ "term": { "lang": "en" } }))
        .build()
        .expect("query");
    assert_eq!(query.k(), 20);
    assert_eq!(query.to_json()["neural"]["v"]["filter"], json!({ "term": { "lang": "en" } }));
    assert_eq!(serde_json::to_value(&query).expect("serialize"), query.to_json());
    assert!(NeuralQuery::builder().field("v").query("q").build().is_none());
}

#[test]
fn equality_covers_filter_hash_does_not() {
    let base = NeuralQuery::builder().field("v").query("q").model_id("m").k(5);
    let plain = base.clone().build().expect("query");
    let filtered = base.filter(json!({ "match_all": {} })).build().expect("query");
    assert_ne!(plain, filtered);

    let hash = |q: &NeuralQuery| {
        let mut h = DefaultHasher::new();
        q.hash(&mut h);
        h.finish()
    };
    assert_eq!(hash(&plain), hash(&filtered));
    assert_eq!(plain, plain.clone());
}

const MAPPING: &str = r#"{
  "properties": {
    "title": { "type": "text" },
    "content": { "type": "text" }
  }
}"#;

fn vector_snapshot() -> ConfigSnapshot {
    ConfigSnapshot {
        dimension: Some(384),
        method: Some("hnsw".to_string()),
        engine: Some("lucene".to_string()),
        space_type: "cosinesimil".to_string(),
        param_m: 16,
        param_ef_construction: 100,
        ..snapshot()
    }
}

#[test]
fn mapping_is_identity_without_vector_settings() {
    for snapshot in [
        ConfigSnapshot { dimension: None, ..vector_snapshot() },
        ConfigSnapshot { field: None, ..vector_snapshot() },
        ConfigSnapshot { method: None, ..vector_snapshot() },
        ConfigSnapshot { engine: None, ..vector_snapshot() },
    ] {
        assert_eq!(rewrite_mapping(&snapshot, MAPPING).expect("rewrite"), MAPPING);
    }
}

#[test]
fn flat_mapping_inserts_vector_before_content() {
    let out: Value = serde_json::from_str(&rewrite_mapping(&vector_snapshot(), MAPPING).expect("rewrite")).expect("json");
    let props = out["properties"].as_object().expect("properties");
    let keys: Vec<&str> = props.keys().map(String::as_str).collect();
    assert_eq!(keys, ["title", "content_vector", "content"]);
    assert_eq!(
        props["content_vector"],
        json!({
            "type": "knn_vector",
            "dimension": 384,
            "method": {
                "name": "hnsw",
                "engine": "lucene",
                "space_type": "cosinesimil",
                "parameters": { "m": 16, "ef_construction": 100 }
            }
        })
    );
}

#[test]
fn nested_mapping_adds_nested_block_and_chunk_field() {
    let snapshot = ConfigSnapshot {
        nested_field: Some("content_nested".to_string()),
        chunk_field: Some("content_chunks".to_string()),
        ..vector_snapshot()
    };
    let out: Value = serde_json::from_str(&rewrite_mapping(&snapshot, MAPPING).expect("rewrite")).expect("json");
    let props = &out["properties"];
    assert_eq!(props["content_nested"]["type"], "nested");
    assert_eq!(props["content_nested"]["properties"]["content_vector"]["type"], "knn_vector");
    assert_eq!(props["content_chunks"], json!({ "type": "text", "index": false }));
    assert!(props.get("content_vector").is_none());
}

const SETTINGS: &str = r#"{ "index": { "number_of_shards": 1, "codec": "best_compression" } }"#;

#[test]
fn settings_gain_pipeline_and_knn_flag() {
    let snapshot = ConfigSnapshot { pipeline: Some("neural_pipeline".to_string()), ..ConfigSnapshot::default() };
    let out: Value = serde_json::from_str(&rewrite_settings(&snapshot, SETTINGS).expect("rewrite")).expect("json");
    let keys: Vec<&str> = out.as_object().expect("object").keys().map(String::as_str).collect();
    assert_eq!(keys, ["default_pipeline", "index"]);
    assert_eq!(out["default_pipeline"], "neural_pipeline");
    let index: Vec<&str> = out["index"].as_object().expect("index").keys().map(String::as_str).collect();
    assert_eq!(index, ["number_of_shards", "knn", "codec"]);
    assert_eq!(out["index"]["knn"], true);
}

#[test]
fn settings_without_pipeline_only_flag_knn() {
    let out: Value =
        serde_json::from_str(&rewrite_settings(&ConfigSnapshot::default(), SETTINGS).expect("rewrite")).expect("json");
    assert!(out.get("default_pipeline").is_none());
    assert_eq!(out["index"]["knn"], true);

    let bare = r#"{"analysis":{}}"#;
    assert_eq!(rewrite_settings(&ConfigSnapshot::default(), bare).expect("rewrite"), bare);
}

#[test]
fn malformed_template_is_an_error() {
    assert!(matches!(rewrite_mapping(&vector_snapshot(), "{"), Err(Error::Template(_))));
}

#[test]
fn rules_apply_in_order() {
    let snapshot = Arc::new(vector_snapshot());
    let mut rules = TemplateRules::new();
    let s = Arc::clone(&snapshot);
    rules.add_mapping_rule(Box::new(move |t: &str| rewrite_mapping(&s, t)));
    rules.add_mapping_rule(Box::new(|t: &str| Ok(t.replace("knn_vector", "knn_vector "))));
    let out = rules.apply_mapping(MAPPING).expect("apply");
    assert!(out.contains("\"knn_vector \""));
    assert_eq!(rules.apply_settings(SETTINGS).expect("apply"), SETTINGS);
}
