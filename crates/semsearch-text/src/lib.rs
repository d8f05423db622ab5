//! semsearch-text
//!
//! The lexical query pipeline: a filter chain over raw query text, parsing
//! with the tantivy query grammar, and compilation of the resulting tree into
//! the engine's JSON query DSL. Literal nodes pass through registered
//! [`NodeInterceptor`]s before the lexical builders see them.
pub mod compile;
pub mod context;
pub mod fields;
pub mod lexical;
pub mod parser;

pub use compile::{LiteralKind, NodeDecision, NodeInterceptor, QueryCompiler, QueryNode};
pub use context::QueryContext;
pub use fields::{BoostedField, DefaultOperator, QueryFieldConfig};
pub use parser::{QueryFilter, QueryParser};
pub use tantivy_query_grammar::UserInputAst;
