//! Supported Languages
//!
//! The closed set of languages a submission may declare, their canonical
//! source extensions, and inference from a filename's extension.

use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Language of a code submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    JavaScript,
    TypeScript,
    Java,
    Cpp,
    Go,
    Rust,
}

impl Language {
    /// All supported languages, in declaration order
    pub const ALL: [Language; 7] = [
        Language::Python,
        Language::JavaScript,
        Language::TypeScript,
        Language::Java,
        Language::Cpp,
        Language::Go,
        Language::Rust,
    ];

    /// Lowercase identifier used on the wire and in configuration
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Java => "java",
            Language::Cpp => "cpp",
            Language::Go => "go",
            Language::Rust => "rust",
        }
    }

    /// Extension (without the dot) a source file of this language is written with
    pub fn canonical_extension(&self) -> &'static str {
        match self {
            Language::Python => "py",
            Language::JavaScript => "js",
            Language::TypeScript => "ts",
            Language::Java => "java",
            Language::Cpp => "cpp",
            Language::Go => "go",
            Language::Rust => "rs",
        }
    }

    /// Map a file extension to a language, if it is a known one
    pub fn from_extension(extension: &str) -> Option<Language> {
        match extension.to_ascii_lowercase().as_str() {
            "py" | "pyw" => Some(Language::Python),
            "js" | "mjs" | "cjs" | "jsx" => Some(Language::JavaScript),
            "ts" | "mts" | "cts" | "tsx" => Some(Language::TypeScript),
            "java" => Some(Language::Java),
            "cpp" | "cc" | "cxx" | "c++" | "hpp" | "hh" => Some(Language::Cpp),
            "go" => Some(Language::Go),
            "rs" => Some(Language::Rust),
            _ => None,
        }
    }

    /// Infer the language of a file from its name.
    ///
    /// Unrecognized or missing extensions fall back to Python.
    pub fn infer_from_filename(filename: &str) -> Language {
        Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Language::from_extension)
            .unwrap_or(Language::Python)
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Language {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Language::ALL
            .iter()
            .copied()
            .find(|lang| lang.as_str() == normalized)
            .ok_or_else(|| CoreError::parse(format!("Unsupported language: {}", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_from_filename() {
        assert_eq!(Language::infer_from_filename("a.py"), Language::Python);
        assert_eq!(Language::infer_from_filename("app.js"), Language::JavaScript);
        assert_eq!(Language::infer_from_filename("index.tsx"), Language::TypeScript);
        assert_eq!(Language::infer_from_filename("Main.java"), Language::Java);
        assert_eq!(Language::infer_from_filename("main.cc"), Language::Cpp);
        assert_eq!(Language::infer_from_filename("main.go"), Language::Go);
        assert_eq!(Language::infer_from_filename("lib.RS"), Language::Rust);
    }

    #[test]
    fn test_infer_defaults_to_python() {
        assert_eq!(Language::infer_from_filename("notes.txt"), Language::Python);
        assert_eq!(Language::infer_from_filename("Makefile"), Language::Python);
        assert_eq!(Language::infer_from_filename(""), Language::Python);
    }

    #[test]
    fn test_from_str() {
        assert_eq!("python".parse::<Language>().unwrap(), Language::Python);
        assert_eq!(" JavaScript ".parse::<Language>().unwrap(), Language::JavaScript);
        assert!(matches!("cobol".parse::<Language>(), Err(CoreError::Parse(_))));
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&Language::TypeScript).unwrap();
        assert_eq!(json, "\"typescript\"");
        let parsed: Language = serde_json::from_str("\"cpp\"").unwrap();
        assert_eq!(parsed, Language::Cpp);
    }

    #[test]
    fn test_canonical_extension_round_trips_through_inference() {
        for lang in Language::ALL {
            let name = format!("file.{}", lang.canonical_extension());
            assert_eq!(Language::infer_from_filename(&name), lang);
        }
    }
}
