use anyhow::{bail, Context, Result};
use reqwest::blocking::{Client, RequestBuilder};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use semsearch_core::snapshot::ModelServiceSettings;
use semsearch_core::traits::SearchTransport;

/// Minimal HTTP surface needed to talk to the ML plugin.
///
/// Returns the status code and the decoded body; a body that is not JSON
/// comes back as a JSON string.
pub trait MlTransport: Send + Sync {
    fn get(&self, path: &str) -> Result<(u16, Value)>;
    fn post(&self, path: &str) -> Result<(u16, Value)>;
}

/// Blocking client for the search engine's REST API.
#[derive(Debug, Clone)]
pub struct EngineHttp {
    client: Client,
    base_url: String,
}

impl EngineHttp {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("semsearch/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("building http client")?;
        Ok(Self { client, base_url: base_url.trim_end_matches('/').to_string() })
    }

    pub fn from_settings(settings: &ModelServiceSettings) -> Result<Self> {
        Self::new(&settings.endpoint, settings.timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn send(request: RequestBuilder, path: &str) -> Result<(u16, Value)> {
        let response = request.send().with_context(|| format!("requesting {path}"))?;
        let status = response.status().as_u16();
        let text = response.text().with_context(|| format!("reading response of {path}"))?;
        debug!(path, status, "engine response");
        let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
        Ok((status, body))
    }
}

impl MlTransport for EngineHttp {
    fn get(&self, path: &str) -> Result<(u16, Value)> {
        Self::send(self.client.get(self.url(path)), path)
    }

    fn post(&self, path: &str) -> Result<(u16, Value)> {
        Self::send(self.client.post(self.url(path)), path)
    }
}

impl SearchTransport for EngineHttp {
    fn search(&self, index: &str, body: &Value) -> Result<Value> {
        let path = format!("{index}/_search");
        let (status, response) = Self::send(self.client.post(self.url(&path)).json(body), &path)?;
        if !(200..300).contains(&status) {
            bail!("search on {index} returned {status}: {response}");
        }
        Ok(response)
    }
}
