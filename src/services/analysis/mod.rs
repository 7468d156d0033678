//! Code Analysis
//!
//! Orchestrates advisory review and execution of submitted code:
//!
//! - `prompt` / `parser` - request text and reply extraction
//! - `advisor` - advisory requests that never fail outward
//! - `aggregator` - per-file merge of advice and execution
//! - `batch` - multi-file batches, persistence
//! - `history` - per-file result history

pub mod advisor;
pub mod aggregator;
pub mod batch;
pub mod history;
pub mod parser;
pub mod prompt;

pub use advisor::Advisor;
pub use aggregator::{output_indicates_error, CodeAnalyzer};
pub use batch::{submissions_from_request, BatchAnalyzer, BatchOutcome};
pub use history::AnalysisHistory;
pub use parser::{parse_advisory_text, AdvisoryParseError, ParsedAdvisory};
pub use prompt::build_analysis_prompt;
