//! semsearch-hybrid
//!
//! The search entry points. [`LexicalSearcher`] compiles and runs keyword
//! requests; [`SemanticSearcher`] wraps it with the neural rewrite, the
//! request augmentation and chunk reconstruction; [`SemanticSearchPlugin`]
//! wires all of it from configuration.
pub mod chunks;
pub mod params;
pub mod plugin;
pub mod searcher;
pub mod semantic;

pub use chunks::{reconstruct, ChunkFields};
pub use params::AugmentedParams;
pub use plugin::SemanticSearchPlugin;
pub use searcher::{LexicalSearcher, SearchResponse, SearchResults};
pub use semantic::SemanticSearcher;
