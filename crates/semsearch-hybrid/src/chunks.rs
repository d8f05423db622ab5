//! Stitch matched content chunks back into nested-vector hits.
use serde_json::Value;
use tracing::debug;

use semsearch_core::types::{Document, SearchHit};

/// Where the chunk data lives in a hit and where the result goes.
#[derive(Debug, Clone, Copy)]
pub struct ChunkFields<'a> {
    pub nested_field: &'a str,
    pub chunk_field: &'a str,
    pub description_field: &'a str,
}

/// Flatten `hit` into a document, replacing the stored chunk array with the
/// chunks its inner hits point at.
///
/// Hits without inner hits under the nested field are returned unchanged.
/// Offsets past the end of the chunk array are skipped, repeated offsets
/// count once, and the first matched chunk doubles as the description.
pub fn reconstruct(mut hit: SearchHit, fields: ChunkFields<'_>) -> Document {
    let Some(inner) = hit.inner_hits.remove(fields.nested_field) else {
        return hit.into_document();
    };
    let id = hit.id.clone();
    let mut doc = hit.into_document();
    let chunks = match doc.remove(fields.chunk_field) {
        Some(Value::Array(items)) => items,
        Some(Value::String(single)) => vec![Value::String(single)],
        _ => Vec::new(),
    };

    let mut offsets: Vec<usize> = Vec::new();
    for offset in inner.hits.hits.iter().filter_map(|h| h.nested.as_ref()).map(|n| n.offset) {
        if offset >= chunks.len() {
            debug!(id = %id, offset, chunks = chunks.len(), "inner hit offset out of range");
            continue;
        }
        if !offsets.contains(&offset) {
            offsets.push(offset);
        }
    }
    let matched: Vec<Value> = offsets.into_iter().map(|i| chunks[i].clone()).collect();

    if let Some(first) = matched.first() {
        doc.insert(fields.description_field.to_string(), first.clone());
    }
    doc.insert(fields.chunk_field.to_string(), Value::Array(matched));
    doc
}
