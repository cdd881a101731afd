use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use termdiff_core::{Result, TermdiffError, TranslationEntry};
use termdiff_correct::{placeholders_preserved, CorrectionClient, ToneMode};
use termdiff_domain::{
    CorrectionFailure, CorrectionReport, CorrectionRow, SCHEMA_VERSION,
};
use termdiff_export_csv::{timestamped_name, unique_path, write_rows_atomic, OutputRow, RowSchema};

use crate::catalog::Workspace;

/// Entries worth sending for one locale, grouped by origin file. Empty
/// values are left out; there is nothing to correct in them.
pub fn collect_entries(ws: &Workspace, locale: &str) -> BTreeMap<PathBuf, Vec<TranslationEntry>> {
    let mut out: BTreeMap<PathBuf, Vec<TranslationEntry>> = BTreeMap::new();
    for entry in ws.entries_for_locale(locale) {
        if entry.value.trim().is_empty() {
            continue;
        }
        out.entry(entry.origin.clone()).or_default().push(entry);
    }
    out
}

enum Run {
    Grammar,
    Tone(ToneMode),
}

/// Batch the collected entries through the correction service. A failed
/// batch is recorded and skipped; a correction that loses placeholders is
/// dropped and the original kept. Never retries.
fn run(
    client: &CorrectionClient,
    locale: &str,
    per_file: &BTreeMap<PathBuf, Vec<TranslationEntry>>,
    batch_size: usize,
    mode: Run,
) -> CorrectionReport {
    let mut report = CorrectionReport {
        schema_version: SCHEMA_VERSION,
        checked: 0,
        changed: 0,
        corrections: Vec::new(),
        failures: Vec::new(),
    };
    let batch_size = batch_size.max(1);

    for (path, entries) in per_file {
        for (batch_no, batch) in entries.chunks(batch_size).enumerate() {
            let values: Vec<String> = batch.iter().map(|e| e.value.clone()).collect();
            let outcome = match mode {
                Run::Grammar => client.correct_grammar(locale, &values),
                Run::Tone(tone) => client.adjust_tone(locale, tone, &values),
            };
            let corrected = match outcome {
                Ok(corrected) => corrected,
                Err(e) => {
                    tracing::warn!(
                        event = "correction_batch_failed",
                        path = %path.display(),
                        batch = batch_no + 1,
                        error = %e
                    );
                    report.failures.push(CorrectionFailure {
                        file: path.display().to_string(),
                        batch: batch_no + 1,
                        error: e.to_string(),
                    });
                    continue;
                }
            };
            report.checked += batch.len();
            for (entry, corrected) in batch.iter().zip(corrected) {
                let corrected = match placeholders_preserved(&entry.value, &corrected) {
                    Ok(()) => corrected,
                    Err(msg) => {
                        tracing::warn!(
                            event = "placeholder_guard",
                            key = %entry.key,
                            error = %msg
                        );
                        report.failures.push(CorrectionFailure {
                            file: path.display().to_string(),
                            batch: batch_no + 1,
                            error: format!("{}: {msg}; original kept", entry.key),
                        });
                        entry.value.clone()
                    }
                };
                if corrected != entry.value {
                    report.changed += 1;
                    report.corrections.push(CorrectionRow {
                        file: path.display().to_string(),
                        key: entry.key.clone(),
                        locale: entry.locale.clone(),
                        original: entry.value.clone(),
                        corrected,
                    });
                }
            }
        }
    }
    report
}

pub fn run_grammar(
    client: &CorrectionClient,
    locale: &str,
    per_file: &BTreeMap<PathBuf, Vec<TranslationEntry>>,
    batch_size: usize,
) -> CorrectionReport {
    run(client, locale, per_file, batch_size, Run::Grammar)
}

/// Tone conversion is offered for German locales only.
pub fn run_tone(
    client: &CorrectionClient,
    locale: &str,
    per_file: &BTreeMap<PathBuf, Vec<TranslationEntry>>,
    batch_size: usize,
    mode: ToneMode,
) -> Result<CorrectionReport> {
    if !termdiff_correct::is_german(locale) {
        return Err(TermdiffError::Other(format!(
            "tone adjustment is only supported for German locales, got '{locale}'"
        ))
        .into());
    }
    Ok(run(client, locale, per_file, batch_size, Run::Tone(mode)))
}

/// Write accepted corrections as a `locale;key;value` overlay file.
pub fn export_corrections(
    report: &CorrectionReport,
    out_dir: &Path,
    timestamp: &str,
) -> Result<Option<PathBuf>> {
    if report.corrections.is_empty() {
        return Ok(None);
    }
    let rows: Vec<OutputRow> = report
        .corrections
        .iter()
        .map(|c| OutputRow {
            key: c.key.clone(),
            locale: c.locale.clone(),
            value: c.corrected.clone(),
        })
        .collect();
    let name = timestamped_name("corrections", None, timestamp);
    let path = unique_path(out_dir, &name);
    write_rows_atomic(&path, &rows, RowSchema::LocaleKeyValue)?;
    tracing::info!(event = "corrections_written", path = %path.display(), rows = rows.len());
    Ok(Some(path))
}

/// Planned batches for a dry run: (file, batch count, entry count).
pub fn plan_batches(
    per_file: &BTreeMap<PathBuf, Vec<TranslationEntry>>,
    batch_size: usize,
) -> Vec<(PathBuf, usize, usize)> {
    let batch_size = batch_size.max(1);
    per_file
        .iter()
        .map(|(path, entries)| {
            (
                path.clone(),
                entries.len().div_ceil(batch_size),
                entries.len(),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Workspace;

    #[test]
    fn collects_non_empty_entries_per_file() {
        let tmp = tempfile::tempdir().unwrap();
        let terms = tmp.path().join("terms.csv");
        std::fs::write(
            &terms,
            "key;value;locale\na;Wert;de\nb;;de\nc;Autre;fr\n",
        )
        .unwrap();
        let ws = Workspace::load(&[], &[terms.clone()]).unwrap();

        let collected = collect_entries(&ws, "de");
        assert_eq!(collected.len(), 1);
        assert_eq!(collected[&terms].len(), 1);
        assert_eq!(collected[&terms][0].key, "a");
    }

    #[test]
    fn batch_planning_rounds_up() {
        let tmp = tempfile::tempdir().unwrap();
        let terms = tmp.path().join("terms.csv");
        let mut csv = String::from("key;value;locale\n");
        for i in 0..25 {
            csv.push_str(&format!("k{i};Wert {i};de\n"));
        }
        std::fs::write(&terms, csv).unwrap();
        let ws = Workspace::load(&[], &[terms]).unwrap();

        let plan = plan_batches(&collect_entries(&ws, "de"), 10);
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].1, 3);
        assert_eq!(plan[0].2, 25);
    }

    #[test]
    fn tone_rejects_non_german_locales() {
        let client = CorrectionClient::new("http://localhost:1/none", "", "m", 0.1).unwrap();
        let err = run_tone(&client, "fr", &BTreeMap::new(), 10, ToneMode::Formal);
        assert!(err.is_err());
    }
}
