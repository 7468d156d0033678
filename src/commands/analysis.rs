//! Analysis Commands
//!
//! Entry points for submitting batches and reading back results. Every
//! command answers with a `CommandResponse` envelope.

use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::models::analysis::{AnalysisResult, AnalyzeRequest, StoredAnalysis};
use crate::models::response::{AdvisoryHealth, CommandResponse};
use crate::services::analysis::BatchOutcome;
use crate::state::AppState;
use crate::utils::error::AppError;

/// Analyze a batch of files and persist the aggregate
pub async fn analyze_files(
    state: &AppState,
    request: AnalyzeRequest,
    cancel: &CancellationToken,
) -> CommandResponse<BatchOutcome> {
    let result = state.batch().analyze_batch(request, cancel).await;
    if let Err(e) = &result {
        warn!(error = %e, "batch analysis rejected");
    }
    result.into()
}

/// Fetch a saved batch by id
pub fn get_analysis(state: &AppState, id: i64) -> CommandResponse<StoredAnalysis> {
    state
        .batch()
        .store()
        .get(id)
        .and_then(|found| found.ok_or_else(|| AppError::not_found(format!("Analysis {}", id))))
        .into()
}

/// Most recent saved batches
pub fn list_analyses(state: &AppState, limit: usize) -> CommandResponse<Vec<StoredAnalysis>> {
    state.batch().store().list_recent(limit).into()
}

/// Every result recorded for a filename in this process, oldest first
pub fn get_file_history(state: &AppState, filename: &str) -> CommandResponse<Vec<AnalysisResult>> {
    CommandResponse::ok(state.batch().history().history(filename))
}

/// Check whether the advisory service answers
pub async fn check_advisory_health(state: &AppState) -> CommandResponse<AdvisoryHealth> {
    let provider = state.batch().analyzer().advisor().provider();
    let outcome = provider.health_check().await;
    CommandResponse::ok(AdvisoryHealth {
        provider: provider.name().to_string(),
        model: provider.model().to_string(),
        healthy: outcome.is_ok(),
        error: outcome.err().map(|e| e.to_string()),
    })
}
