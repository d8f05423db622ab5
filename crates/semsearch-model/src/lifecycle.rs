use serde_json::{Map, Value};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

use semsearch_core::snapshot::ModelServiceSettings;

use crate::transport::MlTransport;

const ML_PREFIX: &str = "_plugins/_ml";

/// Model state as reported by the ML plugin's `model_state`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelStatus {
    Unknown,
    LoadFailed,
    Created,
    Running,
    Deployed,
}

impl ModelStatus {
    /// Read the status out of a model description. A missing or
    /// unrecognized state is `Unknown`.
    pub fn from_model(model: &Map<String, Value>) -> Self {
        match model.get("model_state").and_then(Value::as_str) {
            Some("DEPLOYED" | "LOADED" | "COMPLETED") => Self::Deployed,
            Some("LOAD_FAILED" | "DEPLOY_FAILED") => Self::LoadFailed,
            Some("CREATED") => Self::Created,
            Some("RUNNING" | "DEPLOYING" | "LOADING") => Self::Running,
            _ => Self::Unknown,
        }
    }
}

/// State of a deploy task. Any reported state other than `CREATED` and
/// `RUNNING` ends the poll; a task that could not be read is polled again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskState {
    Unknown,
    Created,
    Running,
    Finished(String),
}

impl TaskState {
    pub fn from_task(task: &Map<String, Value>) -> Self {
        match task.get("state").and_then(Value::as_str) {
            Some("CREATED") => Self::Created,
            Some("RUNNING") => Self::Running,
            Some(other) => Self::Finished(other.to_string()),
            None => Self::Unknown,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Unknown | Self::Created | Self::Running)
    }
}

/// How long to wait on a deploy task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl From<&ModelServiceSettings> for PollPolicy {
    fn from(settings: &ModelServiceSettings) -> Self {
        Self { interval: settings.poll_interval, max_attempts: settings.max_poll_attempts }
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::from(&ModelServiceSettings::default())
    }
}

pub struct ModelLifecycle {
    transport: Arc<dyn MlTransport>,
    policy: PollPolicy,
}

impl ModelLifecycle {
    pub fn new(transport: Arc<dyn MlTransport>, policy: PollPolicy) -> Self {
        Self { transport, policy }
    }

    pub fn policy(&self) -> PollPolicy {
        self.policy
    }

    /// Fetch the model description; empty when the request fails or the
    /// model does not exist.
    pub fn get_model(&self, model_id: &str) -> Map<String, Value> {
        self.fetch(&format!("{ML_PREFIX}/models/{model_id}"), "model", model_id)
    }

    pub fn get_task(&self, task_id: &str) -> Map<String, Value> {
        self.fetch(&format!("{ML_PREFIX}/tasks/{task_id}"), "task", task_id)
    }

    fn fetch(&self, path: &str, kind: &str, id: &str) -> Map<String, Value> {
        match self.transport.get(path) {
            Ok((200, Value::Object(body))) => body,
            Ok((status, body)) => {
                debug!(kind, id, status, %body, "lookup did not return a description");
                Map::new()
            }
            Err(e) => {
                warn!(kind, id, error = %e, "lookup failed");
                Map::new()
            }
        }
    }

    pub fn status(&self, model_id: &str) -> ModelStatus {
        ModelStatus::from_model(&self.get_model(model_id))
    }

    /// Ask the engine to deploy the model and wait for the deploy task.
    /// Returns `true` once the task leaves its pending states.
    pub fn load_model(&self, model_id: &str) -> bool {
        let body = match self.transport.post(&format!("{ML_PREFIX}/models/{model_id}/_load")) {
            Ok((200, body)) => body,
            Ok((status, body)) => {
                debug!(model_id, status, %body, "load request rejected");
                return false;
            }
            Err(e) => {
                warn!(model_id, error = %e, "load request failed");
                return false;
            }
        };
        debug!(model_id, %body, "loading model");
        let Some(task_id) = body.get("task_id").and_then(Value::as_str) else {
            debug!(model_id, "load response carried no task id");
            return false;
        };
        self.wait_for_task(task_id)
    }

    fn wait_for_task(&self, task_id: &str) -> bool {
        for attempt in 1..=self.policy.max_attempts {
            thread::sleep(self.policy.interval);
            let state = TaskState::from_task(&self.get_task(task_id));
            debug!(task_id, attempt, ?state, "polled deploy task");
            if !state.is_pending() {
                return true;
            }
        }
        warn!(task_id, attempts = self.policy.max_attempts, "deploy task still pending, giving up");
        false
    }

    /// Deploy the model unless the engine already reports it deployed.
    pub fn ensure_deployed(&self, model_id: &str) -> bool {
        let status = self.status(model_id);
        debug!(model_id, ?status, "model status");
        if status == ModelStatus::Deployed {
            return true;
        }
        if self.load_model(model_id) {
            info!(model_id, "model loaded");
            true
        } else {
            warn!(model_id, "failed to load model");
            false
        }
    }
}
