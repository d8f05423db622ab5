//! semsearch-neural
//!
//! Neural query construction and the index template rewrites that make the
//! vector field exist in the first place.
pub mod mapping;
pub mod query;
pub mod rewrite;

pub use mapping::{rewrite_mapping, rewrite_settings, RewriteRule, TemplateRules};
pub use query::{NeuralClause, NeuralQuery, NeuralQueryBuilder};
pub use rewrite::SemanticRewriter;
