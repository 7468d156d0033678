//! Executor Registry
//!
//! Maps each language to the executable that runs a source file of that
//! language. Starts from the built-in table; configuration can override
//! entries or remove languages entirely.

use std::collections::HashMap;

use code_insight_core::Language;

/// Registry of language executors
#[derive(Debug, Clone)]
pub struct ExecutorRegistry {
    executors: HashMap<Language, String>,
}

impl ExecutorRegistry {
    /// Create a registry with the built-in executors
    pub fn new() -> Self {
        let mut registry = Self {
            executors: HashMap::new(),
        };
        registry.register_defaults();
        registry
    }

    /// Create a registry with nothing registered
    pub fn empty() -> Self {
        Self {
            executors: HashMap::new(),
        }
    }

    fn register_defaults(&mut self) {
        for (language, executable) in [
            (Language::Python, "python"),
            (Language::JavaScript, "node"),
            (Language::TypeScript, "tsx"),
            (Language::Java, "java"),
            (Language::Cpp, "g++"),
            (Language::Go, "go"),
            (Language::Rust, "rustc"),
        ] {
            self.register(language, executable);
        }
    }

    /// Register (or replace) the executor for a language
    pub fn register(&mut self, language: Language, executable: impl Into<String>) {
        self.executors.insert(language, executable.into());
    }

    /// Apply configured overrides via builder pattern
    pub fn with_overrides<I, S>(mut self, overrides: I) -> Self
    where
        I: IntoIterator<Item = (Language, S)>,
        S: Into<String>,
    {
        for (language, executable) in overrides {
            self.register(language, executable);
        }
        self
    }

    /// Remove languages via builder pattern
    pub fn without<I>(mut self, languages: I) -> Self
    where
        I: IntoIterator<Item = Language>,
    {
        for language in languages {
            self.executors.remove(&language);
        }
        self
    }

    /// Executable for a language, if one is registered
    pub fn resolve(&self, language: Language) -> Option<&str> {
        self.executors.get(&language).map(String::as_str)
    }

    /// Registered languages in declaration order
    pub fn languages(&self) -> Vec<Language> {
        Language::ALL
            .iter()
            .copied()
            .filter(|l| self.executors.contains_key(l))
            .collect()
    }
}

impl Default for ExecutorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table() {
        let registry = ExecutorRegistry::new();
        assert_eq!(registry.resolve(Language::Python), Some("python"));
        assert_eq!(registry.resolve(Language::JavaScript), Some("node"));
        assert_eq!(registry.resolve(Language::TypeScript), Some("tsx"));
        assert_eq!(registry.resolve(Language::Java), Some("java"));
        assert_eq!(registry.resolve(Language::Cpp), Some("g++"));
        assert_eq!(registry.resolve(Language::Go), Some("go"));
        assert_eq!(registry.resolve(Language::Rust), Some("rustc"));
        assert_eq!(registry.languages().len(), 7);
    }

    #[test]
    fn test_overrides_and_removal() {
        let registry = ExecutorRegistry::new()
            .with_overrides([(Language::Python, "python3")])
            .without([Language::Java]);

        assert_eq!(registry.resolve(Language::Python), Some("python3"));
        assert!(registry.resolve(Language::Java).is_none());
        assert!(!registry.languages().contains(&Language::Java));
    }

    #[test]
    fn test_empty_registry() {
        let registry = ExecutorRegistry::empty();
        assert!(registry.languages().is_empty());
        assert!(registry.resolve(Language::Rust).is_none());
    }
}
