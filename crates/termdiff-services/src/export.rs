use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use termdiff_core::Result;
use termdiff_export_csv::{timestamped_name, unique_path, write_rows_atomic, OutputRow, RowSchema};
use termdiff_parsers_csv::parse_customizer_file;

use crate::catalog::Workspace;
use crate::diff::Comparison;

/// Manual edits to apply on export, keyed by (key, locale).
pub type EditOverlay = BTreeMap<(String, String), String>;

/// Load an overlay from a `locale;key;value` (or `key;value;locale`) CSV.
pub fn load_edit_overlay(path: &Path) -> Result<EditOverlay> {
    let file = parse_customizer_file(path)?;
    let mut overlay = EditOverlay::new();
    for (key, locales) in file.entries {
        for (locale, value) in locales {
            overlay.insert((key.clone(), locale), value);
        }
    }
    Ok(overlay)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportMode {
    /// One output next to each input file.
    Individual,
    /// A single deduplicated output in a chosen directory.
    Merged,
}

#[derive(Debug, Clone)]
pub struct ExportedFiles {
    pub files: Vec<PathBuf>,
    pub rows: usize,
}

fn edited_value<'a>(overlay: &'a EditOverlay, key: &str, locale: &str, original: &'a str) -> &'a str {
    overlay
        .get(&(key.to_string(), locale.to_string()))
        .map(String::as_str)
        .unwrap_or(original)
}

/// Write the mismatch rows (with edits applied) to new `locale;key;value`
/// files. Inputs are never reused as outputs: names carry a timestamp and a
/// counter is appended while the name is taken.
pub fn export_updated(
    ws: &Workspace,
    comparison: &Comparison,
    overlay: &EditOverlay,
    mode: ExportMode,
    suffix: Option<&str>,
    out_dir: Option<&Path>,
    timestamp: &str,
) -> Result<ExportedFiles> {
    let mut written = Vec::new();
    let mut rows_total = 0usize;

    match mode {
        ExportMode::Individual => {
            for file in &comparison.files {
                if file.mismatches.is_empty() {
                    continue;
                }
                let rows: Vec<OutputRow> = file
                    .mismatches
                    .iter()
                    .map(|m| OutputRow {
                        key: m.key.clone(),
                        locale: m.locale.clone(),
                        value: edited_value(overlay, &m.key, &m.locale, &m.customizer_value)
                            .to_string(),
                    })
                    .collect();

                let dir = match out_dir {
                    Some(dir) => dir.to_path_buf(),
                    None => file
                        .path
                        .parent()
                        .filter(|p| !p.as_os_str().is_empty())
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| PathBuf::from(".")),
                };
                let base = file
                    .path
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "terms".to_string());
                let name = timestamped_name(&base, suffix.or(Some("updated")), timestamp);
                let path = unique_path(&dir, &name);
                write_rows_atomic(&path, &rows, RowSchema::LocaleKeyValue)?;
                tracing::info!(event = "export_written", path = %path.display(), rows = rows.len());
                rows_total += rows.len();
                written.push(path);
            }
        }
        ExportMode::Merged => {
            let dir = out_dir.unwrap_or_else(|| Path::new("."));
            let mut seen: BTreeSet<(String, String)> = BTreeSet::new();
            let mut rows: Vec<OutputRow> = Vec::new();
            for file in &comparison.files {
                for m in &file.mismatches {
                    if !seen.insert((m.key.clone(), m.locale.clone())) {
                        continue;
                    }
                    rows.push(OutputRow {
                        key: m.key.clone(),
                        locale: m.locale.clone(),
                        value: edited_value(overlay, &m.key, &m.locale, &m.customizer_value)
                            .to_string(),
                    });
                }
            }
            if !rows.is_empty() {
                let name = timestamped_name("merged", suffix, timestamp);
                let path = unique_path(dir, &name);
                write_rows_atomic(&path, &rows, RowSchema::LocaleKeyValue)?;
                tracing::info!(event = "export_written", path = %path.display(), rows = rows.len());
                rows_total += rows.len();
                written.push(path);
            }
        }
    }

    debug_assert!(written
        .iter()
        .all(|w| !ws.input_paths().iter().any(|i| i == w)));
    Ok(ExportedFiles {
        files: written,
        rows: rows_total,
    })
}

/// Keys present only in the customizer files, written with every locale and
/// value they carry, schema `key;locale;value`.
pub fn export_deleted(
    ws: &Workspace,
    comparison: &Comparison,
    out_dir: &Path,
    timestamp: &str,
) -> Result<ExportedFiles> {
    let mut rows = Vec::new();
    for key in &comparison.keys_to_delete {
        for file in &ws.customizer {
            if let Some(locales) = file.entries.get(key) {
                for (locale, value) in locales {
                    rows.push(OutputRow {
                        key: key.clone(),
                        locale: locale.clone(),
                        value: value.clone(),
                    });
                }
            }
        }
    }
    if rows.is_empty() {
        return Ok(ExportedFiles {
            files: Vec::new(),
            rows: 0,
        });
    }
    let name = timestamped_name("deleted_keys", None, timestamp);
    let path = unique_path(out_dir, &name);
    write_rows_atomic(&path, &rows, RowSchema::KeyLocaleValue)?;
    tracing::info!(event = "deleted_keys_written", path = %path.display(), rows = rows.len());
    Ok(ExportedFiles {
        files: vec![path],
        rows: rows.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use termdiff_core::ComparisonPolicy;
    use termdiff_parsers_csv::parse_customizer_file as reload;

    const XLIFF: &str = r#"<xliff version="1.2">
      <file source-language="en" target-language="de">
        <body>
          <trans-unit resname="title"><source>Budgets</source><target>Haushalte</target></trans-unit>
          <trans-unit resname="vote"><source>Vote</source><target>Abstimmen</target></trans-unit>
        </body>
      </file>
    </xliff>"#;

    fn seed_workspace(dir: &Path) -> Workspace {
        let xliff_path = dir.join("export.xliff");
        std::fs::write(&xliff_path, XLIFF).unwrap();
        let terms_path = dir.join("terms.csv");
        std::fs::write(
            &terms_path,
            "key;value;locale\ntitle;Etats;de\nvote;Stimmen;de\nghost.key;Spuk;de\n",
        )
        .unwrap();
        Workspace::load(&[xliff_path], &[terms_path]).unwrap()
    }

    #[test]
    fn individual_export_lands_next_to_input_and_never_reuses_it() {
        let tmp = tempfile::tempdir().unwrap();
        let ws = seed_workspace(tmp.path());
        let comparison = crate::diff::compare(&ws, &ComparisonPolicy::default());

        let out = export_updated(
            &ws,
            &comparison,
            &EditOverlay::new(),
            ExportMode::Individual,
            None,
            None,
            "20250101_120000",
        )
        .unwrap();

        assert_eq!(out.files.len(), 1);
        assert_eq!(out.rows, 2);
        let written = &out.files[0];
        assert_eq!(written.parent().unwrap(), tmp.path());
        assert!(ws.input_paths().iter().all(|p| p != written));
        assert!(written
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("terms_updated_20250101_120000"));
    }

    #[test]
    fn export_round_trips_through_the_customizer_parser() {
        let tmp = tempfile::tempdir().unwrap();
        let ws = seed_workspace(tmp.path());
        let comparison = crate::diff::compare(&ws, &ComparisonPolicy::default());

        let mut overlay = EditOverlay::new();
        overlay.insert(
            ("title".to_string(), "de".to_string()),
            "Etats 2025".to_string(),
        );

        let out = export_updated(
            &ws,
            &comparison,
            &overlay,
            ExportMode::Merged,
            None,
            Some(tmp.path()),
            "20250101_120000",
        )
        .unwrap();

        let reloaded = reload(&out.files[0]).unwrap();
        assert_eq!(reloaded.entries["title"]["de"], "Etats 2025");
        assert_eq!(reloaded.entries["vote"]["de"], "Stimmen");
    }

    #[test]
    fn deleted_keys_export_contains_only_orphans() {
        let tmp = tempfile::tempdir().unwrap();
        let ws = seed_workspace(tmp.path());
        let comparison = crate::diff::compare(&ws, &ComparisonPolicy::default());

        let out =
            export_deleted(&ws, &comparison, tmp.path(), "20250101_120000").unwrap();
        assert_eq!(out.rows, 1);
        let text = std::fs::read_to_string(&out.files[0]).unwrap();
        assert!(text.starts_with("key;locale;value\n"));
        assert!(text.contains("ghost.key;de;Spuk"));
        assert!(!text.contains("title"));
    }

    #[test]
    fn second_export_gets_a_counter_not_an_overwrite() {
        let tmp = tempfile::tempdir().unwrap();
        let ws = seed_workspace(tmp.path());
        let comparison = crate::diff::compare(&ws, &ComparisonPolicy::default());
        let overlay = EditOverlay::new();

        let first = export_updated(
            &ws,
            &comparison,
            &overlay,
            ExportMode::Individual,
            None,
            None,
            "20250101_120000",
        )
        .unwrap();
        let second = export_updated(
            &ws,
            &comparison,
            &overlay,
            ExportMode::Individual,
            None,
            None,
            "20250101_120000",
        )
        .unwrap();
        assert_ne!(first.files[0], second.files[0]);
        assert!(first.files[0].exists() && second.files[0].exists());
    }
}
