//! Scratch Workspaces
//!
//! Every execution gets a freshly created, uniquely named directory that
//! holds the materialized source file. The directory is removed when the
//! `Workspace` is dropped, whichever way the execution ended.

use std::path::{Path, PathBuf};

use code_insight_core::Language;
use tempfile::TempDir;
use tracing::debug;

const WORKSPACE_PREFIX: &str = "code-insight-";

/// Name of the file the source is written to.
///
/// The stem comes from the submitted filename (last path component, text
/// before the first `.`); the extension always comes from the language.
pub fn source_file_name(filename: &str, language: Language) -> String {
    let last = filename
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or_default();
    let stem = last.split('.').next().unwrap_or_default().trim();
    let stem = if stem.is_empty() { "main" } else { stem };
    format!("{}.{}", stem, language.canonical_extension())
}

/// A scratch directory holding one materialized source file
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
    source_path: PathBuf,
}

impl Workspace {
    /// Create a new directory under the system temp dir and write `code` into it
    pub async fn create(filename: &str, language: Language, code: &str) -> std::io::Result<Self> {
        Self::create_in(std::env::temp_dir(), filename, language, code).await
    }

    /// Create a new directory under `parent` and write `code` into it
    pub async fn create_in(
        parent: impl AsRef<Path>,
        filename: &str,
        language: Language,
        code: &str,
    ) -> std::io::Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(WORKSPACE_PREFIX)
            .tempdir_in(parent)?;
        let source_path = dir.path().join(source_file_name(filename, language));
        tokio::fs::write(&source_path, code).await?;

        debug!(path = %source_path.display(), "materialized submission");
        Ok(Self { dir, source_path })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }
}
