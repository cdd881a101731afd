use std::collections::BTreeSet;
use std::path::PathBuf;

use termdiff_core::{Classification, ComparisonPolicy};
use termdiff_domain::{ComparisonReport, ComparisonStats, FileStats, MismatchRow, SCHEMA_VERSION};

use crate::catalog::Workspace;

/// One differing (key, locale) pair within a customizer file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    pub key: String,
    pub locale: String,
    pub crowdin_value: String,
    pub customizer_value: String,
}

#[derive(Debug, Clone)]
pub struct FileComparison {
    pub path: PathBuf,
    pub mismatches: Vec<Mismatch>,
    pub total_keys: usize,
    pub keys_in_crowdin: usize,
}

impl FileComparison {
    pub fn mismatched_keys(&self) -> BTreeSet<&str> {
        self.mismatches.iter().map(|m| m.key.as_str()).collect()
    }
}

/// Result of diffing the whole workspace under one policy. Derived data;
/// recompute after any input or policy change.
#[derive(Debug, Clone)]
pub struct Comparison {
    pub files: Vec<FileComparison>,
    /// Keys present only in customizer files, slated for deletion on export.
    pub keys_to_delete: Vec<String>,
    pub matched_locales: BTreeSet<String>,
    pub warnings: Vec<String>,
}

/// Locales both sides declare; customizer locales the Crowdin catalog never
/// mentions become warnings and are left out of the comparison.
pub fn match_locales(ws: &Workspace) -> (BTreeSet<String>, Vec<String>) {
    let crowdin = ws.catalog.locales();
    let mut matched = BTreeSet::new();
    let mut warnings = Vec::new();
    for locale in ws.customizer_locales() {
        if crowdin.contains(&locale) {
            matched.insert(locale);
        } else {
            warnings.push(format!(
                "locale '{locale}' is not declared by any Crowdin file; excluded from comparison"
            ));
        }
    }
    (matched, warnings)
}

/// Classify one (key, locale) pair, resolving both sides. Pairs carried by
/// neither side classify as Match: there is nothing to reconcile.
pub fn classify(
    ws: &Workspace,
    policy: &ComparisonPolicy,
    key: &str,
    locale: &str,
) -> Classification {
    let customizer_value = ws
        .customizer
        .iter()
        .find_map(|f| f.entries.get(key).and_then(|l| l.get(locale)));
    match customizer_value {
        Some(value) => classify_value(ws, policy, key, locale, value),
        None => match ws.catalog.value_for(key, locale) {
            Some(value) => Classification::CrowdinOnly { value },
            None => Classification::Match,
        },
    }
}

fn classify_value(
    ws: &Workspace,
    policy: &ComparisonPolicy,
    key: &str,
    locale: &str,
    customizer_value: &str,
) -> Classification {
    if !ws.catalog.contains_key(key) {
        return Classification::CustomizerOnly {
            value: customizer_value.to_string(),
        };
    }
    let crowdin_value = ws.catalog.value_for(key, locale).unwrap_or_default();
    if policy.should_check(customizer_value)
        && policy.values_differ(customizer_value, &crowdin_value)
    {
        Classification::Mismatch {
            crowdin: crowdin_value,
            customizer: customizer_value.to_string(),
        }
    } else {
        Classification::Match
    }
}

/// Diff every customizer file against the Crowdin catalog. Pure over its
/// inputs: the same workspace and policy always produce the same result.
pub fn compare(ws: &Workspace, policy: &ComparisonPolicy) -> Comparison {
    let (matched_locales, warnings) = match_locales(ws);

    let crowdin_keys = ws.catalog.keys();
    let customizer_keys = ws.customizer_keys();
    let keys_to_delete: Vec<String> = customizer_keys
        .difference(&crowdin_keys)
        .cloned()
        .collect();

    let mut files = Vec::new();
    for file in &ws.customizer {
        let mut mismatches = Vec::new();
        let mut keys_in_crowdin = 0usize;
        for (key, locales) in &file.entries {
            if !crowdin_keys.contains(key) {
                continue;
            }
            keys_in_crowdin += 1;
            for (locale, value) in locales {
                if !matched_locales.contains(locale) {
                    continue;
                }
                if let Classification::Mismatch { crowdin, customizer } =
                    classify_value(ws, policy, key, locale, value)
                {
                    mismatches.push(Mismatch {
                        key: key.clone(),
                        locale: locale.clone(),
                        crowdin_value: crowdin,
                        customizer_value: customizer,
                    });
                }
            }
        }
        files.push(FileComparison {
            path: file.path.clone(),
            mismatches,
            total_keys: file.entries.len(),
            keys_in_crowdin,
        });
    }

    tracing::debug!(
        event = "compare_done",
        files = files.len(),
        mismatches = files.iter().map(|f| f.mismatches.len()).sum::<usize>(),
        keys_to_delete = keys_to_delete.len()
    );

    Comparison {
        files,
        keys_to_delete,
        matched_locales,
        warnings,
    }
}

impl Comparison {
    pub fn total_mismatches(&self) -> usize {
        self.files.iter().map(|f| f.mismatches.len()).sum()
    }

    /// Distinct keys with at least one mismatched locale, across files.
    pub fn mismatched_key_set(&self) -> BTreeSet<&str> {
        self.files
            .iter()
            .flat_map(|f| f.mismatches.iter().map(|m| m.key.as_str()))
            .collect()
    }

    pub fn stats(&self, ws: &Workspace) -> ComparisonStats {
        let crowdin_keys = ws.catalog.keys();
        let customizer_keys = ws.customizer_keys();
        let keys_in_both = crowdin_keys.intersection(&customizer_keys).count();
        let mismatched = self.mismatched_key_set().len();

        let per_file = self
            .files
            .iter()
            .map(|f| {
                let file_mismatched = f.mismatched_keys().len();
                FileStats {
                    file: f.path.display().to_string(),
                    total_keys: f.total_keys,
                    keys_in_crowdin: f.keys_in_crowdin,
                    keys_only_in_file: f.total_keys - f.keys_in_crowdin,
                    mismatched_keys: file_mismatched,
                    matching_keys: f.keys_in_crowdin.saturating_sub(file_mismatched),
                }
            })
            .collect();

        ComparisonStats {
            total_crowdin_keys: crowdin_keys.len(),
            total_customizer_keys: customizer_keys.len(),
            keys_in_both,
            keys_only_in_crowdin: crowdin_keys.difference(&customizer_keys).count(),
            keys_only_in_customizer: customizer_keys.difference(&crowdin_keys).count(),
            mismatched_keys: mismatched,
            matching_keys: keys_in_both.saturating_sub(mismatched),
            locales_compared: self.matched_locales.len(),
            per_file,
        }
    }

    pub fn to_report(&self, ws: &Workspace) -> ComparisonReport {
        let mismatches = self
            .files
            .iter()
            .flat_map(|f| {
                f.mismatches.iter().map(|m| MismatchRow {
                    key: m.key.clone(),
                    locale: m.locale.clone(),
                    crowdin_value: m.crowdin_value.clone(),
                    customizer_value: m.customizer_value.clone(),
                    file: f.path.display().to_string(),
                })
            })
            .collect();
        let mut warnings = self.warnings.clone();
        warnings.extend(ws.row_warnings());
        ComparisonReport {
            schema_version: SCHEMA_VERSION,
            mismatches,
            keys_to_delete: self.keys_to_delete.clone(),
            warnings,
            stats: self.stats(ws),
        }
    }
}
