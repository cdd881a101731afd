use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Workspace-wide result alias.
pub type Result<T> = color_eyre::eyre::Result<T>;

/// Which of the two reconciled sources an entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntrySource {
    Crowdin,
    TermCustomizer,
}

/// Minimal unit used across crates to represent one translated string,
/// identified by its key and locale within the file it was parsed from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationEntry {
    pub key: String,
    /// Lowercased locale code ("en", "de", "de-ch").
    pub locale: String,
    pub value: String,
    pub source: EntrySource,
    /// Path of the file this entry was parsed from.
    pub origin: PathBuf,
}

/// Settings that gate and normalize value comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonPolicy {
    /// Only compare entries whose customizer value is non-empty.
    pub require_customizer_value: bool,
    /// Compare even when one side is empty after trimming.
    pub include_empty_values: bool,
    pub case_sensitive: bool,
}

impl Default for ComparisonPolicy {
    fn default() -> Self {
        ComparisonPolicy {
            require_customizer_value: true,
            include_empty_values: false,
            case_sensitive: true,
        }
    }
}

impl ComparisonPolicy {
    /// Trim, and lowercase unless the policy is case sensitive.
    pub fn normalize(&self, value: &str) -> String {
        let trimmed = value.trim();
        if self.case_sensitive {
            trimmed.to_string()
        } else {
            trimmed.to_lowercase()
        }
    }

    /// Whether the entry should be looked at at all.
    pub fn should_check(&self, customizer_value: &str) -> bool {
        !self.require_customizer_value || !customizer_value.is_empty()
    }

    /// Whether two values count as differing under this policy.
    pub fn values_differ(&self, a: &str, b: &str) -> bool {
        if !self.include_empty_values && (a.trim().is_empty() || b.trim().is_empty()) {
            return false;
        }
        self.normalize(a) != self.normalize(b)
    }
}

/// Outcome of comparing one (key, locale) pair between the two sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Classification {
    Match,
    Mismatch { crowdin: String, customizer: String },
    CustomizerOnly { value: String },
    CrowdinOnly { value: String },
}

#[derive(Debug, Error)]
pub enum TermdiffError {
    #[error("XML parse error: {0}")]
    Xml(String),
    #[error("CSV error: {0}")]
    Csv(String),
    #[error("{0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_insensitive_policy_folds_case() {
        let policy = ComparisonPolicy {
            case_sensitive: false,
            ..ComparisonPolicy::default()
        };
        assert!(!policy.values_differ("Hello", "hello"));

        let strict = ComparisonPolicy::default();
        assert!(strict.values_differ("Hello", "hello"));
    }

    #[test]
    fn empty_values_skipped_unless_included() {
        let policy = ComparisonPolicy::default();
        assert!(!policy.values_differ("Hello", ""));

        let with_empty = ComparisonPolicy {
            include_empty_values: true,
            ..ComparisonPolicy::default()
        };
        assert!(with_empty.values_differ("Hello", ""));
    }

    #[test]
    fn require_value_gates_checking() {
        let policy = ComparisonPolicy::default();
        assert!(!policy.should_check(""));
        assert!(policy.should_check("x"));

        let lax = ComparisonPolicy {
            require_customizer_value: false,
            ..ComparisonPolicy::default()
        };
        assert!(lax.should_check(""));
    }

    #[test]
    fn normalization_trims() {
        let policy = ComparisonPolicy::default();
        assert!(!policy.values_differ("  Hello ", "Hello"));
    }
}
