//! Lexical clause builders for literal query nodes.
//!
//! These are the fallback for every node no interceptor claimed. The unified
//! default field fans out over the configured default fields with their
//! boosts; an explicit field gets a single clause.
use serde_json::{json, Value};

use semsearch_core::types::DEFAULT_FIELD;

use crate::compile::QueryNode;
use crate::fields::QueryFieldConfig;

pub fn term_query(fields: &QueryFieldConfig, node: &QueryNode<'_>) -> Value {
    let text = node.text();
    if node.field != DEFAULT_FIELD {
        return match_phrase(node.field, &text, 0, node.boost);
    }
    let mut should: Vec<Value> = fields
        .default_fields
        .iter()
        .map(|f| match_phrase(&f.name, &text, 0, f.boost * node.boost))
        .collect();
    if text.chars().count() >= fields.fuzzy_min_length {
        should.push(json!({
            "fuzzy": { fields.fuzzy_field.as_str(): { "value": text, "boost": 0.01 * node.boost } }
        }));
    }
    json!({ "bool": { "should": should, "minimum_should_match": 1 } })
}

pub fn phrase_query(fields: &QueryFieldConfig, node: &QueryNode<'_>) -> Value {
    let text = node.text();
    if node.field != DEFAULT_FIELD {
        return match_phrase(node.field, &text, node.slop, node.boost);
    }
    let should: Vec<Value> = fields
        .default_fields
        .iter()
        .map(|f| match_phrase(&f.name, &text, node.slop, f.boost * node.boost))
        .collect();
    json!({ "bool": { "should": should, "minimum_should_match": 1 } })
}

pub fn prefix_query(fields: &QueryFieldConfig, node: &QueryNode<'_>) -> Value {
    let text = node.text();
    if node.field != DEFAULT_FIELD {
        return json!({ "prefix": { node.field: { "value": text, "boost": node.boost } } });
    }
    let should: Vec<Value> = fields
        .default_fields
        .iter()
        .map(|f| json!({ "prefix": { f.name.as_str(): { "value": text, "boost": f.boost * node.boost } } }))
        .collect();
    json!({ "bool": { "should": should, "minimum_should_match": 1 } })
}

fn match_phrase(field: &str, text: &str, slop: u32, boost: f32) -> Value {
    let mut body = json!({ "query": text, "boost": boost });
    if slop > 0 {
        body["slop"] = json!(slop);
    }
    json!({ "match_phrase": { field: body } })
}
