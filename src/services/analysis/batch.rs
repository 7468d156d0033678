//! Batch Analysis
//!
//! Analyzes every file of a request with bounded parallelism, folds the
//! per-file results in request order, records each one in the history and
//! persists the batch.

use std::sync::Arc;

use code_insight_core::{CodeSubmission, Language};
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::aggregator::CodeAnalyzer;
use super::history::AnalysisHistory;
use crate::models::analysis::{AnalysisResult, AnalyzeRequest, FileInput, NewAnalysisRecord};
use crate::storage::AnalysisStore;
use crate::utils::error::{AppError, AppResult};

/// Aggregated result of a saved batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchOutcome {
    /// Id of the persisted record
    pub id: i64,
    #[serde(flatten)]
    pub result: AnalysisResult,
}

/// Turn request files into submissions.
///
/// Rejects empty batches, nameless files and declared languages outside the
/// supported set. Files without a declared language are inferred from their
/// extension.
pub fn submissions_from_request(files: &[FileInput]) -> AppResult<Vec<CodeSubmission>> {
    if files.is_empty() {
        return Err(AppError::validation("No files provided"));
    }

    files
        .iter()
        .map(|file| {
            if file.name.trim().is_empty() {
                return Err(AppError::validation("File name is required"));
            }
            let language = match file.language.as_deref() {
                Some(declared) => declared.parse::<Language>().map_err(|_| {
                    AppError::validation(format!(
                        "Unsupported language '{}' for {}",
                        declared, file.name
                    ))
                })?,
                None => Language::infer_from_filename(&file.name),
            };
            Ok(CodeSubmission::new(
                file.content.clone(),
                language,
                file.name.clone(),
            ))
        })
        .collect()
}

/// Runs whole batches
pub struct BatchAnalyzer {
    analyzer: CodeAnalyzer,
    history: Arc<AnalysisHistory>,
    store: Arc<dyn AnalysisStore>,
    concurrency: usize,
}

impl BatchAnalyzer {
    pub fn new(
        analyzer: CodeAnalyzer,
        history: Arc<AnalysisHistory>,
        store: Arc<dyn AnalysisStore>,
        concurrency: usize,
    ) -> Self {
        Self {
            analyzer,
            history,
            store,
            concurrency: concurrency.max(1),
        }
    }

    pub fn analyzer(&self) -> &CodeAnalyzer {
        &self.analyzer
    }

    pub fn history(&self) -> &Arc<AnalysisHistory> {
        &self.history
    }

    pub fn store(&self) -> &Arc<dyn AnalysisStore> {
        &self.store
    }

    /// Analyze, aggregate and persist a batch. A batch cancelled before it
    /// finishes is neither recorded in the history nor saved.
    pub async fn analyze_batch(
        &self,
        request: AnalyzeRequest,
        cancel: &CancellationToken,
    ) -> AppResult<BatchOutcome> {
        let submissions = submissions_from_request(&request.files)?;
        let result = self.run(&submissions, cancel).await?;

        let stored = self
            .store
            .save(NewAnalysisRecord::from_batch(request.files, &result))?;

        info!(
            id = stored.id,
            files = submissions.len(),
            errors = result.errors.len(),
            suggestions = result.suggestions.len(),
            "batch analysis saved"
        );

        Ok(BatchOutcome {
            id: stored.id,
            result,
        })
    }

    /// Analyze submissions concurrently; the aggregate follows input order
    /// regardless of completion order. Files still waiting for a permit when
    /// the token fires are never started.
    async fn run(
        &self,
        submissions: &[CodeSubmission],
        cancel: &CancellationToken,
    ) -> AppResult<AnalysisResult> {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));

        let futures = submissions.iter().map(|submission| {
            let semaphore = Arc::clone(&semaphore);
            async move {
                // The semaphore is never closed; a failed acquire just runs unbounded
                let _permit = semaphore.acquire().await.ok();
                if cancel.is_cancelled() {
                    return None;
                }
                Some(self.analyzer.analyze(submission, cancel).await)
            }
        });
        let results = join_all(futures).await;

        if cancel.is_cancelled() {
            let started = results.iter().filter(|r| r.is_some()).count();
            warn!(files = submissions.len(), started, "batch cancelled, discarding results");
            return Err(AppError::cancelled("Batch analysis cancelled"));
        }

        let mut aggregate = AnalysisResult::default();
        for (submission, result) in submissions.iter().zip(results.into_iter().flatten()) {
            self.history.record(submission.filename(), result.clone());
            aggregate.absorb(result);
        }
        Ok(aggregate)
    }
}
