//! Setting keys, as dotted figment paths. Numeric keys are named in
//! parse warnings.

pub const ROOT: &str = "semantic_search";

pub const MIN_SCORE: &str = "semantic_search.min_score";
pub const MIN_CONTENT_LENGTH: &str = "semantic_search.min_content_length";

pub const CONTENT_MODEL_ID: &str = "semantic_search.content.model_id";
pub const CONTENT_CHUNK_SIZE: &str = "semantic_search.content.chunk_size";
pub const CONTENT_DIMENSION: &str = "semantic_search.content.dimension";
pub const CONTENT_PARAM_M: &str = "semantic_search.content.param.m";
pub const CONTENT_PARAM_EF_CONSTRUCTION: &str = "semantic_search.content.param.ef_construction";
pub const CONTENT_PARAM_EF_SEARCH: &str = "semantic_search.content.param.ef_search";

pub const MODEL_SERVICE_ENDPOINT: &str = "semantic_search.model_service.endpoint";
pub const MODEL_SERVICE_POLL_INTERVAL_MS: &str = "semantic_search.model_service.poll_interval_ms";
pub const MODEL_SERVICE_MAX_POLL_ATTEMPTS: &str = "semantic_search.model_service.max_poll_attempts";
pub const MODEL_SERVICE_TIMEOUT_SECS: &str = "semantic_search.model_service.timeout_secs";

pub const QUERY: &str = "query";
