use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info, warn};

use semsearch_core::config::Config;
use semsearch_core::context::ContextStore;
use semsearch_core::snapshot::{ConfigSnapshot, SnapshotCell};
use semsearch_core::traits::SearchTransport;
use semsearch_model::{EngineHttp, MlTransport, ModelLifecycle, PollPolicy};
use semsearch_neural::{rewrite_mapping, rewrite_settings, TemplateRules};
use semsearch_text::QueryFieldConfig;

use crate::searcher::LexicalSearcher;
use crate::semantic::SemanticSearcher;

/// Everything the semantic search path needs, wired together once at
/// startup.
pub struct SemanticSearchPlugin {
    snapshot: Arc<SnapshotCell>,
    contexts: Arc<ContextStore>,
    templates: TemplateRules,
    searcher: SemanticSearcher,
    ml: Arc<dyn MlTransport>,
}

impl SemanticSearchPlugin {
    /// Load settings, register the template rewrites and the query hooks,
    /// then make sure the configured model is deployed.
    pub fn init(config: &Config, ml: Arc<dyn MlTransport>, search: Arc<dyn SearchTransport>) -> Self {
        let snapshot = Arc::new(SnapshotCell::new(ConfigSnapshot::load(config)));
        let contexts = Arc::new(ContextStore::new());

        let mut templates = TemplateRules::new();
        let cell = Arc::clone(&snapshot);
        templates.add_setting_rule(Box::new(move |template: &str| rewrite_settings(&cell.load(), template)));
        let cell = Arc::clone(&snapshot);
        templates.add_mapping_rule(Box::new(move |template: &str| rewrite_mapping(&cell.load(), template)));

        let lexical = LexicalSearcher::new(QueryFieldConfig::load(config), search);
        let searcher = SemanticSearcher::new(lexical, Arc::clone(&snapshot), Arc::clone(&contexts));

        let plugin = Self { snapshot, contexts, templates, searcher, ml };
        info!(snapshot = ?plugin.snapshot.load(), "semantic search initialized");
        plugin.deploy_model();
        plugin
    }

    /// Same as [`init`](Self::init), talking to the endpoint from the
    /// `model_service` settings for both model management and search.
    pub fn connect(config: &Config) -> Result<Self> {
        let settings = ConfigSnapshot::load(config).model_service;
        let http = Arc::new(EngineHttp::from_settings(&settings)?);
        Ok(Self::init(config, http.clone(), http))
    }

    /// Swap in a snapshot built from `config` and re-check the model.
    pub fn reload(&self, config: &Config) {
        let previous = self.snapshot.replace(ConfigSnapshot::load(config));
        debug!(?previous, current = ?self.snapshot.load(), "semantic search settings reloaded");
        self.deploy_model();
    }

    pub fn snapshot(&self) -> Arc<ConfigSnapshot> {
        self.snapshot.load()
    }

    pub fn contexts(&self) -> &Arc<ContextStore> {
        &self.contexts
    }

    pub fn templates(&self) -> &TemplateRules {
        &self.templates
    }

    pub fn searcher(&self) -> &SemanticSearcher {
        &self.searcher
    }

    /// A lifecycle handle using the current polling settings.
    pub fn lifecycle(&self) -> ModelLifecycle {
        let policy = PollPolicy::from(&self.snapshot.load().model_service);
        ModelLifecycle::new(Arc::clone(&self.ml), policy)
    }

    fn deploy_model(&self) {
        let Some(model_id) = self.snapshot.load().model_id.clone() else {
            debug!("no model configured, neural rewriting disabled");
            return;
        };
        if !self.lifecycle().ensure_deployed(&model_id) {
            warn!(model_id = %model_id, "model is not deployed, searches fall back to keyword matching");
        }
    }
}
