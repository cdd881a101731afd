use std::io::Write;
use std::path::{Path, PathBuf};

use termdiff_core::Result;

/// One row of a reconciliation export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRow {
    pub key: String,
    pub locale: String,
    pub value: String,
}

/// Column order of the output file. Updated-value and replacement exports use
/// `locale;key;value`; the deleted-keys export uses `key;locale;value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowSchema {
    LocaleKeyValue,
    KeyLocaleValue,
}

pub fn write_rows<W: Write>(writer: W, rows: &[OutputRow], schema: RowSchema) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().delimiter(b';').from_writer(writer);

    match schema {
        RowSchema::LocaleKeyValue => wtr.write_record(["locale", "key", "value"])?,
        RowSchema::KeyLocaleValue => wtr.write_record(["key", "locale", "value"])?,
    }
    for row in rows {
        match schema {
            RowSchema::LocaleKeyValue => {
                wtr.write_record([&row.locale, &row.key, &row.value])?
            }
            RowSchema::KeyLocaleValue => {
                wtr.write_record([&row.key, &row.locale, &row.value])?
            }
        }
    }

    wtr.flush()?;
    Ok(())
}

/// `<base><_suffix>_<timestamp>.csv`; a suffix gets a leading underscore if
/// the caller left it off.
pub fn timestamped_name(base: &str, suffix: Option<&str>, timestamp: &str) -> String {
    match suffix.filter(|s| !s.is_empty()) {
        Some(s) if s.starts_with('_') => format!("{base}{s}_{timestamp}.csv"),
        Some(s) => format!("{base}_{s}_{timestamp}.csv"),
        None => format!("{base}_{timestamp}.csv"),
    }
}

/// Append `_1`, `_2`… to the stem while the name is already taken.
pub fn unique_path(dir: &Path, file_name: &str) -> PathBuf {
    let candidate = dir.join(file_name);
    if !candidate.exists() {
        return candidate;
    }
    let stem = Path::new(file_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_name.to_string());
    let ext = Path::new(file_name)
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut counter = 1usize;
    loop {
        let name = if ext.is_empty() {
            format!("{stem}_{counter}")
        } else {
            format!("{stem}_{counter}.{ext}")
        };
        let candidate = dir.join(&name);
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}

/// All-or-nothing write: the file appears at `path` complete or not at all.
pub fn write_rows_atomic(path: &Path, rows: &[OutputRow], schema: RowSchema) -> Result<()> {
    let tmp = path.with_extension("csv.tmp");
    let result = (|| -> Result<()> {
        let file = std::fs::File::create(&tmp)?;
        write_rows(file, rows, schema)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    })();
    if result.is_err() {
        let _ = std::fs::remove_file(&tmp);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(key: &str, locale: &str, value: &str) -> OutputRow {
        OutputRow {
            key: key.to_string(),
            locale: locale.to_string(),
            value: value.to_string(),
        }
    }

    #[test]
    fn writes_semicolon_delimited_rows() {
        let mut buf = Vec::new();
        write_rows(
            &mut buf,
            &[row("a.b", "de", "Wert")],
            RowSchema::LocaleKeyValue,
        )
        .unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "locale;key;value\nde;a.b;Wert\n");
    }

    #[test]
    fn deleted_keys_schema_leads_with_key() {
        let mut buf = Vec::new();
        write_rows(
            &mut buf,
            &[row("a.b", "de", "Wert")],
            RowSchema::KeyLocaleValue,
        )
        .unwrap();
        assert!(String::from_utf8(buf).unwrap().starts_with("key;locale;value\n"));
    }

    #[test]
    fn timestamp_naming() {
        assert_eq!(
            timestamped_name("terms", None, "20250101_120000"),
            "terms_20250101_120000.csv"
        );
        assert_eq!(
            timestamped_name("terms", Some("review"), "20250101_120000"),
            "terms_review_20250101_120000.csv"
        );
        assert_eq!(
            timestamped_name("terms", Some("_review"), "20250101_120000"),
            "terms_review_20250101_120000.csv"
        );
    }

    #[test]
    fn unique_path_counts_up() {
        let dir = tempfile::tempdir().unwrap();
        let first = unique_path(dir.path(), "out.csv");
        assert_eq!(first, dir.path().join("out.csv"));
        std::fs::write(&first, "x").unwrap();
        let second = unique_path(dir.path(), "out.csv");
        assert_eq!(second, dir.path().join("out_1.csv"));
        std::fs::write(&second, "x").unwrap();
        assert_eq!(unique_path(dir.path(), "out.csv"), dir.path().join("out_2.csv"));
    }

    #[test]
    fn atomic_write_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.csv");
        write_rows_atomic(&out, &[row("k", "de", "v")], RowSchema::LocaleKeyValue).unwrap();
        assert!(out.exists());
        assert!(!dir.path().join("out.csv.tmp").exists());
    }
}
