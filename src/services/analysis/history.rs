//! Analysis History
//!
//! Process-lifetime, append-only record of per-file analysis results in
//! chronological order. Appends for one filename are atomic with respect to
//! each other; different filenames never contend on the same lock.

use dashmap::DashMap;

use crate::models::analysis::AnalysisResult;

/// Per-filename history of analysis results
#[derive(Debug, Default)]
pub struct AnalysisHistory {
    entries: DashMap<String, Vec<AnalysisResult>>,
    /// Keep at most this many results per filename, evicting the oldest
    cap_per_file: Option<usize>,
}

impl AnalysisHistory {
    /// Unbounded history
    pub fn new() -> Self {
        Self::default()
    }

    /// History that keeps at most `cap` results per filename
    pub fn with_cap(cap: usize) -> Self {
        Self {
            entries: DashMap::new(),
            cap_per_file: Some(cap.max(1)),
        }
    }

    /// Append a result to the filename's sequence
    pub fn record(&self, filename: &str, result: AnalysisResult) {
        let mut sequence = self.entries.entry(filename.to_string()).or_default();
        sequence.push(result);
        if let Some(cap) = self.cap_per_file {
            if sequence.len() > cap {
                let excess = sequence.len() - cap;
                sequence.drain(..excess);
            }
        }
    }

    /// Results recorded for a filename, oldest first; empty when unseen
    pub fn history(&self, filename: &str) -> Vec<AnalysisResult> {
        self.entries
            .get(filename)
            .map(|sequence| sequence.value().clone())
            .unwrap_or_default()
    }

    /// Filenames with at least one recorded result, sorted
    pub fn filenames(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Number of distinct filenames
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
