use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{NavigatorError, Result};

/// Top-level Navigator configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub defaults: DefaultsConfig,
    #[serde(default)]
    pub execution: ExecutionConfig,
}

/// Where and how operation chains are sent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Base URL of the REST service, e.g. `http://localhost:8080/rest`.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_execute_path")]
    pub execute_path: String,
    /// Per-request timeout. No timeout when unset.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    /// Operation classes the backend accepts. Any class accepted when unset.
    #[serde(default)]
    pub supported_operations: Option<Vec<String>>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            execute_path: default_execute_path(),
            timeout_secs: None,
            supported_operations: None,
        }
    }
}

impl GatewayConfig {
    /// Full URL chains are posted to.
    pub fn execute_url(&self) -> String {
        format!(
            "{}/{}",
            self.endpoint.trim_end_matches('/'),
            self.execute_path.trim_start_matches('/')
        )
    }
}

/// Parameters of the default post-processing operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// `0` disables the limit operation.
    #[serde(default = "default_result_limit")]
    pub result_limit: u64,
    #[serde(default = "default_truncate")]
    pub truncate: bool,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            result_limit: default_result_limit(),
            truncate: default_truncate(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    #[serde(default)]
    pub loading_policy: LoadingPolicy,
    /// Largest batch the event bus should hold without subscribers lagging.
    #[serde(default = "default_expected_batch_size")]
    pub expected_batch_size: usize,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            loading_policy: LoadingPolicy::default(),
            expected_batch_size: default_expected_batch_size(),
        }
    }
}

/// When the loading flag of an execute-all batch is cleared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadingPolicy {
    /// Any successful completion clears the flag, even while other requests
    /// of the batch are still pending.
    #[default]
    FirstCompletion,
    /// The flag is cleared once every request of the batch has settled.
    AllSettled,
}

fn default_endpoint() -> String {
    "http://localhost:8080/rest".to_string()
}

fn default_execute_path() -> String {
    "/graph/operations/execute".to_string()
}

fn default_result_limit() -> u64 {
    1000
}

fn default_truncate() -> bool {
    true
}

fn default_expected_batch_size() -> usize {
    crate::event::DEFAULT_BATCH_SIZE
}

impl AppConfig {
    /// Load config from a TOML file, with env var expansion.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|_| NavigatorError::ConfigNotFound(path.display().to_string()))?;

        // Expand ${ENV_VAR} references
        let expanded = expand_env_vars(&content);

        toml::from_str(&expanded).map_err(|e| NavigatorError::Config(e.to_string()))
    }

    /// Load from `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            Ok(Self::default())
        }
    }
}

/// Expand `${VAR}` and `${VAR:-fallback}` references.
///
/// An unset `${VAR}` is left as written so TOML parsing points at it; an
/// unset or empty `${VAR:-fallback}` becomes `fallback`. A `$` not followed
/// by `{`, or a reference with no closing `}`, is copied through.
fn expand_env_vars(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            result.push_str(&rest[start..]);
            return result;
        };
        let reference = &after[..end];
        let (name, fallback) = match reference.split_once(":-") {
            Some((name, fallback)) => (name, Some(fallback)),
            None => (reference, None),
        };
        match (std::env::var(name), fallback) {
            (Ok(val), Some(fallback)) if val.is_empty() => result.push_str(fallback),
            (Ok(val), _) => result.push_str(&val),
            (Err(_), Some(fallback)) => result.push_str(fallback),
            (Err(_), None) => result.push_str(&rest[start..start + 2 + end + 1]),
        }
        rest = &after[end + 1..];
    }
    result.push_str(rest);
    result
}
