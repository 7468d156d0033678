//! Settings Models
//!
//! Application configuration stored in config.json.

use std::collections::BTreeMap;
use std::time::Duration;

use code_insight_core::Language;
use code_insight_execution::{DispatcherConfig, ExecutorRegistry};
use code_insight_llm::ProviderConfig;
use serde::{Deserialize, Serialize};

/// How execution results turn into runtime errors
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeErrorPolicy {
    /// Flag output containing "error" (case-insensitive)
    #[default]
    OutputHeuristic,
    /// Flag only processes that failed to exit cleanly
    ExitStatus,
}

/// Where batch records are persisted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    Sqlite,
}

/// Execution dispatcher settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionSettings {
    /// Wall-clock limit per child process
    #[serde(default = "default_execution_timeout")]
    pub timeout_secs: u64,
    /// Cap per captured output stream
    #[serde(default = "default_max_output_bytes")]
    pub max_output_bytes: usize,
    /// Executable overrides, e.g. python -> python3
    #[serde(default)]
    pub executors: BTreeMap<Language, String>,
    /// Languages that must never be executed
    #[serde(default)]
    pub disabled_languages: Vec<Language>,
    #[serde(default)]
    pub runtime_error_policy: RuntimeErrorPolicy,
}

fn default_execution_timeout() -> u64 {
    30
}

fn default_max_output_bytes() -> usize {
    1024 * 1024
}

impl Default for ExecutionSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_execution_timeout(),
            max_output_bytes: default_max_output_bytes(),
            executors: BTreeMap::new(),
            disabled_languages: Vec::new(),
            runtime_error_policy: RuntimeErrorPolicy::default(),
        }
    }
}

impl ExecutionSettings {
    /// Built-in executors with overrides applied and disabled languages removed
    pub fn registry(&self) -> ExecutorRegistry {
        ExecutorRegistry::new()
            .with_overrides(self.executors.iter().map(|(l, e)| (*l, e.clone())))
            .without(self.disabled_languages.iter().copied())
    }

    pub fn dispatcher_config(&self) -> DispatcherConfig {
        DispatcherConfig {
            timeout: Duration::from_secs(self.timeout_secs),
            max_output_bytes: self.max_output_bytes,
            ..Default::default()
        }
    }
}

/// Application configuration stored in config.json
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Advisory service provider; the API key is never written to disk
    #[serde(default)]
    pub advisory: ProviderConfig,
    #[serde(default)]
    pub execution: ExecutionSettings,
    /// Files analyzed concurrently within one batch
    #[serde(default = "default_batch_concurrency")]
    pub batch_concurrency: usize,
    /// Oldest history entries per file are evicted past this count
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history_cap_per_file: Option<usize>,
    #[serde(default)]
    pub storage: StorageBackend,
}

fn default_batch_concurrency() -> usize {
    4
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            advisory: ProviderConfig::default(),
            execution: ExecutionSettings::default(),
            batch_concurrency: default_batch_concurrency(),
            history_cap_per_file: None,
            storage: StorageBackend::default(),
        }
    }
}

impl AppConfig {
    /// Provider config with the API key filled from the environment when unset
    pub fn resolved_advisory(&self) -> ProviderConfig {
        let mut config = self.advisory.clone();
        if config.api_key.as_deref().map_or(true, str::is_empty) {
            config.api_key = config
                .provider
                .api_key_env()
                .and_then(|var| std::env::var(var).ok())
                .filter(|key| !key.is_empty());
        }
        config
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.advisory.timeout_secs == 0 {
            return Err("advisory.timeout_secs must be greater than 0".to_string());
        }

        if self.advisory.max_tokens == 0 {
            return Err("advisory.max_tokens must be greater than 0".to_string());
        }

        if !(0.0..=2.0).contains(&self.advisory.temperature) {
            return Err(format!(
                "Invalid advisory.temperature: {}. Must be between 0 and 2",
                self.advisory.temperature
            ));
        }

        if self.execution.timeout_secs == 0 {
            return Err("execution.timeout_secs must be greater than 0".to_string());
        }

        if self.execution.max_output_bytes == 0 {
            return Err("execution.max_output_bytes must be greater than 0".to_string());
        }

        if let Some((language, _)) = self
            .execution
            .executors
            .iter()
            .find(|(_, exe)| exe.trim().is_empty())
        {
            return Err(format!("Empty executor configured for {}", language));
        }

        if self.batch_concurrency == 0 {
            return Err("batch_concurrency must be at least 1".to_string());
        }

        if self.history_cap_per_file == Some(0) {
            return Err("history_cap_per_file must be at least 1 when set".to_string());
        }

        Ok(())
    }
}
