//! Lightweight configuration loader and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars
//! (`__` separates nesting levels). Provides a helper to expand `~` and
//! `${VAR}` in user-supplied paths.
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::env;
use std::path::{Path, PathBuf};

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        Self::load_file(Path::new("config.toml"))
    }

    /// Load `base` plus its `<stem>.<env>.toml` sibling, then `APP_*` env vars.
    pub fn load_file(base: &Path) -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::new().merge(Toml::file(base));
        let suffix = match env_name.as_str() {
            "dev" | "development" => Some("dev"),
            "prod" | "production" => Some("prod"),
            "test" | "testing" => Some("test"),
            _ => None,
        };
        if let Some(suffix) = suffix {
            figment = figment.merge(Toml::file(env_variant(base, suffix)));
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.validate_for_env(&env_name)?;
        Ok(config)
    }

    pub fn from_figment(figment: Figment) -> Self {
        Self { figment }
    }

    pub fn from_toml_str(toml: &str) -> Self {
        Self { figment: Figment::from(Toml::string(toml)) }
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.figment.find_value(key).is_ok()
    }

    fn validate_for_env(&self, env: &str) -> anyhow::Result<()> {
        if matches!(env, "prod" | "production") && !self.contains(crate::keys::MODEL_SERVICE_ENDPOINT) {
            tracing::warn!(env, "no model_service.endpoint configured, using the default");
        }
        Ok(())
    }
}

fn env_variant(base: &Path, suffix: &str) -> PathBuf {
    let stem = base.file_stem().and_then(|s| s.to_str()).unwrap_or("config");
    base.with_file_name(format!("{stem}.{suffix}.toml"))
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}
