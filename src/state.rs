//! Application State
//!
//! Wires configuration into the long-lived services every command uses.

use std::sync::Arc;
use std::time::Duration;

use code_insight_llm::create_provider;
use tracing::info;

use crate::models::settings::{AppConfig, StorageBackend};
use crate::services::analysis::{Advisor, AnalysisHistory, BatchAnalyzer, CodeAnalyzer};
use crate::storage::{AnalysisStore, ConfigService, Database, MemoryAnalysisStore};
use crate::utils::error::{AppError, AppResult};

/// Services shared by all commands
pub struct AppState {
    config: AppConfig,
    batch: BatchAnalyzer,
}

impl AppState {
    /// Load the config file at its default location and build services
    pub fn initialize() -> AppResult<Self> {
        let service = ConfigService::new()?;
        info!(path = %service.config_path().display(), "configuration loaded");
        Self::from_config(service.get_config_clone())
    }

    /// Build services from a config with the store it selects
    pub fn from_config(config: AppConfig) -> AppResult<Self> {
        let store: Arc<dyn AnalysisStore> = match config.storage {
            StorageBackend::Memory => Arc::new(MemoryAnalysisStore::new()),
            StorageBackend::Sqlite => Arc::new(checked(Database::new()?)?),
        };
        Self::with_store(config, store)
    }

    /// Build services around an explicit store
    pub fn with_store(config: AppConfig, store: Arc<dyn AnalysisStore>) -> AppResult<Self> {
        config.validate().map_err(AppError::config)?;

        let advisory = config.resolved_advisory();
        let provider = create_provider(advisory.clone())
            .map_err(|e| AppError::config(format!("Failed to create advisory provider: {}", e)))?;
        let advisor = Advisor::new(provider, Duration::from_secs(advisory.timeout_secs));

        let dispatcher = code_insight_execution::Dispatcher::new(
            config.execution.registry(),
            config.execution.dispatcher_config(),
        );
        let analyzer = CodeAnalyzer::new(advisor, dispatcher, config.execution.runtime_error_policy);

        let history = match config.history_cap_per_file {
            Some(cap) => AnalysisHistory::with_cap(cap),
            None => AnalysisHistory::new(),
        };

        info!(
            provider = %advisory.provider,
            model = %advisory.model,
            storage = ?config.storage,
            concurrency = config.batch_concurrency,
            "services initialized"
        );

        let batch = BatchAnalyzer::new(
            analyzer,
            Arc::new(history),
            store,
            config.batch_concurrency,
        );
        Ok(Self { config, batch })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn batch(&self) -> &BatchAnalyzer {
        &self.batch
    }
}

/// Refuse a database that cannot answer a trivial query
fn checked(db: Database) -> AppResult<Database> {
    if db.is_healthy() {
        Ok(db)
    } else {
        Err(AppError::database("Database failed its health check"))
    }
}
