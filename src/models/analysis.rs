//! Analysis Models
//!
//! Findings, metrics and the per-file / per-batch analysis result, plus the
//! batch request and stored-record shapes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Finding kind used when the reply could not be decoded
pub const KIND_PARSING: &str = "parsing";
/// Finding kind used when the advisory service gave nothing usable
pub const KIND_ANALYSIS_ERROR: &str = "analysis_error";
/// Finding kind used when a file could not be analyzed at all
pub const KIND_AGENT_ERROR: &str = "agent_error";
/// Finding kind for output that looks like a failure
pub const KIND_RUNTIME: &str = "RUNTIME";
/// Finding kind for a process that failed without saying so in its output
pub const KIND_RUNTIME_FAILURE: &str = "runtime";

/// Finding severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    /// Parse a severity label case-insensitively; unknown labels give None
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "error" => Some(Self::Error),
            "warning" | "warn" => Some(Self::Warning),
            "info" => Some(Self::Info),
            _ => None,
        }
    }
}

/// An error entry attributable to one file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    pub file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    /// Column within `line`, kept when a stored record carries one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
}

impl Finding {
    pub fn new(kind: impl Into<String>, message: impl Into<String>, file: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            file: file.into(),
            line: None,
            column: None,
            severity: None,
        }
    }

    pub fn with_line(mut self, line: u32) -> Self {
        self.line = Some(line);
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }
}

/// A suggestion: a finding plus an optional replacement snippet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    #[serde(flatten)]
    pub finding: Finding,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performance_impact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl From<Finding> for Suggestion {
    fn from(finding: Finding) -> Self {
        Self {
            finding,
            code: None,
            performance_impact: None,
            confidence: None,
        }
    }
}

/// Numeric metrics. Batches sum these field-wise.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    /// Seconds
    #[serde(default)]
    pub execution_time: f64,
    /// Bytes
    #[serde(default)]
    pub memory_usage: u64,
    #[serde(default)]
    pub complexity: u32,
}

impl Metrics {
    /// Field-wise sum
    pub fn add(&mut self, other: &Metrics) {
        self.execution_time += other.execution_time;
        self.memory_usage = self.memory_usage.saturating_add(other.memory_usage);
        self.complexity = self.complexity.saturating_add(other.complexity);
    }
}

/// Result of analyzing one file, or a whole batch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default)]
    pub errors: Vec<Finding>,
    #[serde(default)]
    pub suggestions: Vec<Suggestion>,
    #[serde(default)]
    pub metrics: Metrics,
    /// Execution output by filename
    #[serde(default)]
    pub output: BTreeMap<String, String>,
}

impl AnalysisResult {
    /// A result holding a single error finding and zeroed metrics
    pub fn single_error(kind: &str, message: impl Into<String>, file: impl Into<String>) -> Self {
        Self {
            errors: vec![Finding::new(kind, message, file).with_severity(Severity::Error)],
            ..Default::default()
        }
    }

    /// Merge another result into this one: findings are appended in order,
    /// metrics summed and output maps unioned.
    pub fn absorb(&mut self, other: AnalysisResult) {
        self.errors.extend(other.errors);
        self.suggestions.extend(other.suggestions);
        self.metrics.add(&other.metrics);
        self.output.extend(other.output);
    }

    /// For each file, the code of the last suggestion that carries one
    pub fn improved_code(&self) -> BTreeMap<String, String> {
        let mut improved = BTreeMap::new();
        for suggestion in &self.suggestions {
            if let Some(code) = &suggestion.code {
                if !suggestion.finding.file.is_empty() {
                    improved.insert(suggestion.finding.file.clone(), code.clone());
                }
            }
        }
        improved
    }
}

/// One file in a batch request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInput {
    pub name: String,
    pub content: String,
    /// Declared language; inferred from the extension when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl FileInput {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            language: None,
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }
}

/// Batch analysis request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    pub files: Vec<FileInput>,
}

/// Everything persisted for one batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAnalysisRecord {
    pub files: Vec<FileInput>,
    pub analysis: AnalysisResult,
    pub suggestions: Vec<Suggestion>,
    pub improved_code: BTreeMap<String, String>,
    pub output: BTreeMap<String, String>,
}

impl NewAnalysisRecord {
    /// Bundle a batch's input and aggregated result for storage
    pub fn from_batch(files: Vec<FileInput>, analysis: &AnalysisResult) -> Self {
        Self {
            files,
            suggestions: analysis.suggestions.clone(),
            improved_code: analysis.improved_code(),
            output: analysis.output.clone(),
            analysis: analysis.clone(),
        }
    }
}

/// A saved batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredAnalysis {
    pub id: i64,
    #[serde(flatten)]
    pub record: NewAnalysisRecord,
    pub created_at: String,
}
