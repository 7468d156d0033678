//! Analysis Records
//!
//! Persistence seam for saved batches. The in-memory store lives for the
//! process; the SQLite store in `database` survives restarts.

use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::models::analysis::{NewAnalysisRecord, StoredAnalysis};
use crate::utils::error::{AppError, AppResult};

/// Storage for batch analysis records. Ids are assigned by the store,
/// start at 1 and increase with every save.
pub trait AnalysisStore: Send + Sync {
    /// Persist a record and return it with its id and timestamp
    fn save(&self, record: NewAnalysisRecord) -> AppResult<StoredAnalysis>;

    /// Fetch a record by id
    fn get(&self, id: i64) -> AppResult<Option<StoredAnalysis>>;

    /// Most recent records first, at most `limit`
    fn list_recent(&self, limit: usize) -> AppResult<Vec<StoredAnalysis>>;
}

/// Current time in the format every store writes
pub(crate) fn timestamp_now() -> String {
    chrono::Utc::now().to_rfc3339()
}

#[derive(Debug, Default)]
struct MemoryInner {
    next_id: i64,
    records: BTreeMap<i64, StoredAnalysis>,
}

/// Process-lifetime store
#[derive(Debug, Default)]
pub struct MemoryAnalysisStore {
    inner: Mutex<MemoryInner>,
}

impl MemoryAnalysisStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> AppResult<std::sync::MutexGuard<'_, MemoryInner>> {
        self.inner
            .lock()
            .map_err(|e| AppError::internal(format!("Analysis store lock poisoned: {}", e)))
    }
}

impl AnalysisStore for MemoryAnalysisStore {
    fn save(&self, record: NewAnalysisRecord) -> AppResult<StoredAnalysis> {
        let mut inner = self.lock()?;
        inner.next_id += 1;
        let stored = StoredAnalysis {
            id: inner.next_id,
            record,
            created_at: timestamp_now(),
        };
        inner.records.insert(stored.id, stored.clone());
        Ok(stored)
    }

    fn get(&self, id: i64) -> AppResult<Option<StoredAnalysis>> {
        Ok(self.lock()?.records.get(&id).cloned())
    }

    fn list_recent(&self, limit: usize) -> AppResult<Vec<StoredAnalysis>> {
        Ok(self
            .lock()?
            .records
            .values()
            .rev()
            .take(limit)
            .cloned()
            .collect())
    }
}
