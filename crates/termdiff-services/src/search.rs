use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use regex::Regex;
use termdiff_core::{Result, TranslationEntry};
use termdiff_domain::{SearchHit, SearchReport, SCHEMA_VERSION};
use termdiff_export_csv::{timestamped_name, unique_path, write_rows_atomic, OutputRow, RowSchema};

use crate::catalog::Workspace;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchOptions {
    pub case_sensitive: bool,
    pub whole_word: bool,
}

fn word_pattern(term: &str, case_sensitive: bool) -> Regex {
    let escaped = regex::escape(term);
    let pattern = if case_sensitive {
        format!(r"\b{escaped}\b")
    } else {
        format!(r"(?i)\b{escaped}\b")
    };
    // escape() guarantees a valid pattern
    Regex::new(&pattern).unwrap()
}

pub fn matches(text: &str, term: &str, opts: SearchOptions) -> bool {
    if text.is_empty() {
        return false;
    }
    if opts.whole_word {
        word_pattern(term, opts.case_sensitive).is_match(text)
    } else if opts.case_sensitive {
        text.contains(term)
    } else {
        text.to_lowercase().contains(&term.to_lowercase())
    }
}

/// Literal replacement; `$` in the replacement is never treated as a capture.
pub fn replace(text: &str, term: &str, replacement: &str, opts: SearchOptions) -> String {
    if opts.whole_word {
        word_pattern(term, opts.case_sensitive)
            .replace_all(text, regex::NoExpand(replacement))
            .into_owned()
    } else if opts.case_sensitive {
        text.replace(term, replacement)
    } else {
        let pattern = Regex::new(&format!("(?i){}", regex::escape(term))).unwrap();
        pattern
            .replace_all(text, regex::NoExpand(replacement))
            .into_owned()
    }
}

/// A planned, not yet committed, set of replacements grouped by origin file.
#[derive(Debug, Clone, Default)]
pub struct ReplacementPreview {
    pub locale: String,
    /// origin file -> changed entries with their before/after values.
    pub files: BTreeMap<PathBuf, Vec<(TranslationEntry, String)>>,
}

impl ReplacementPreview {
    pub fn total(&self) -> usize {
        self.files.values().map(Vec::len).sum()
    }

    pub fn to_report(&self) -> SearchReport {
        let hits = self
            .files
            .iter()
            .flat_map(|(path, entries)| {
                entries.iter().map(|(entry, after)| SearchHit {
                    file: path.display().to_string(),
                    key: entry.key.clone(),
                    locale: entry.locale.clone(),
                    before: entry.value.clone(),
                    after: after.clone(),
                })
            })
            .collect();
        SearchReport {
            schema_version: SCHEMA_VERSION,
            hits,
            files_affected: self.files.len(),
        }
    }
}

/// Scan every loaded value for one locale and plan replacements. Nothing is
/// mutated; commit happens in [`apply_preview`].
pub fn preview(
    ws: &Workspace,
    locale: &str,
    term: &str,
    replacement: &str,
    opts: SearchOptions,
) -> ReplacementPreview {
    let mut out = ReplacementPreview {
        locale: locale.to_lowercase(),
        files: BTreeMap::new(),
    };
    for entry in ws.entries_for_locale(locale) {
        if !matches(&entry.value, term, opts) {
            continue;
        }
        let after = replace(&entry.value, term, replacement, opts);
        if after == entry.value {
            continue;
        }
        out.files
            .entry(entry.origin.clone())
            .or_default()
            .push((entry, after));
    }
    out
}

/// Write one `<base>_replaced_<timestamp>.csv` per affected file, schema
/// `locale;key;value`, originals untouched.
pub fn apply_preview(
    preview: &ReplacementPreview,
    out_dir: Option<&Path>,
    timestamp: &str,
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    for (origin, entries) in &preview.files {
        let rows: Vec<OutputRow> = entries
            .iter()
            .map(|(entry, after)| OutputRow {
                key: entry.key.clone(),
                locale: entry.locale.clone(),
                value: after.clone(),
            })
            .collect();
        let dir = match out_dir {
            Some(dir) => dir.to_path_buf(),
            None => origin
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(".")),
        };
        let base = origin
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "terms".to_string());
        let name = timestamped_name(&base, Some("replaced"), timestamp);
        let path = unique_path(&dir, &name);
        write_rows_atomic(&path, &rows, RowSchema::LocaleKeyValue)?;
        tracing::info!(event = "replacements_written", path = %path.display(), rows = rows.len());
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CrowdinCatalog, CrowdinFile};
    use termdiff_parsers_csv::parse_customizer_reader;
    use termdiff_parsers_xliff::parse_xliff_str;

    #[test]
    fn case_insensitive_is_the_default() {
        let opts = SearchOptions::default();
        assert!(matches("Der Haushalt", "haushalt", opts));
        assert_eq!(replace("Der Haushalt", "haushalt", "Etat", opts), "Der Etat");
    }

    #[test]
    fn whole_word_respects_boundaries() {
        let opts = SearchOptions {
            whole_word: true,
            ..SearchOptions::default()
        };
        assert!(matches("the vote is in", "vote", opts));
        assert!(!matches("devoted", "vote", opts));
        assert_eq!(
            replace("vote for votes", "vote", "ballot", opts),
            "ballot for votes"
        );
    }

    #[test]
    fn replacement_dollar_signs_stay_literal() {
        let opts = SearchOptions::default();
        assert_eq!(replace("price", "price", "$1 fee", opts), "$1 fee");
    }

    #[test]
    fn preview_scans_both_sources_for_the_locale() {
        let xliff = r#"<xliff version="1.2">
          <file source-language="en" target-language="de">
            <body>
              <trans-unit resname="title"><source>Budget</source><target>Der Haushalt</target></trans-unit>
            </body>
          </file>
        </xliff>"#;
        let doc = parse_xliff_str(xliff, Path::new("export.xliff")).unwrap();
        let terms = parse_customizer_reader(
            "key;value;locale\ntitle;Haushalt hier;de\nother;Kein Treffer;de\n".as_bytes(),
            Path::new("terms.csv"),
        )
        .unwrap();
        let ws = Workspace {
            catalog: CrowdinCatalog {
                files: vec![CrowdinFile::Xliff(doc)],
            },
            customizer: vec![terms],
        };

        let planned = preview(&ws, "de", "Haushalt", "Etat", SearchOptions::default());
        assert_eq!(planned.total(), 2);
        assert_eq!(planned.files.len(), 2);

        // English scope sees only the XLIFF source text.
        let en = preview(&ws, "en", "Budget", "Spend", SearchOptions::default());
        assert_eq!(en.total(), 1);
    }

    #[test]
    fn apply_writes_new_files_only() {
        let tmp = tempfile::tempdir().unwrap();
        let terms_path = tmp.path().join("terms.csv");
        std::fs::write(&terms_path, "key;value;locale\ntitle;Alter Wert;de\n").unwrap();
        let ws = Workspace::load(&[], &[terms_path.clone()]).unwrap();

        let planned = preview(&ws, "de", "Alter", "Neuer", SearchOptions::default());
        let written = apply_preview(&planned, None, "20250101_120000").unwrap();
        assert_eq!(written.len(), 1);
        assert_ne!(written[0], terms_path);
        let text = std::fs::read_to_string(&written[0]).unwrap();
        assert!(text.contains("de;title;Neuer Wert"));
        // original untouched
        assert!(std::fs::read_to_string(&terms_path)
            .unwrap()
            .contains("Alter Wert"));
    }
}
