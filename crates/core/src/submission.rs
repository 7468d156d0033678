//! Code Submissions
//!
//! A submission is one file's source code plus its declared or inferred
//! language: the unit every analysis operates on.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::language::Language;

/// Optional project context attached to a submission
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionContext {
    /// Root of the project the file came from
    pub project_root: String,
    /// Declared dependencies (name -> version)
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,
    /// Environment variables exported to the executed program
    #[serde(default)]
    pub environment: BTreeMap<String, String>,
}

/// One file submitted for analysis. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeSubmission {
    code: String,
    language: Language,
    filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    context: Option<SubmissionContext>,
}

impl CodeSubmission {
    /// Create a submission without project context
    pub fn new(code: impl Into<String>, language: Language, filename: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            language,
            filename: filename.into(),
            context: None,
        }
    }

    /// Attach project context via builder pattern
    pub fn with_context(mut self, context: SubmissionContext) -> Self {
        self.context = Some(context);
        self
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn context(&self) -> Option<&SubmissionContext> {
        self.context.as_ref()
    }

    /// Environment entries to export to the executed program
    pub fn environment(&self) -> impl Iterator<Item = (&String, &String)> {
        self.context
            .iter()
            .flat_map(|ctx| ctx.environment.iter())
    }
}
