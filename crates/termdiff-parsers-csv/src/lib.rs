use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use termdiff_core::{Result, TermdiffError};
use walkdir::WalkDir;

/// Locale the legacy export's "Source Text" column is written in.
pub const LEGACY_SOURCE_LOCALE: &str = "en";

/// A malformed row that was skipped while the rest of the file loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowError {
    /// 1-based line number in the input file.
    pub line: u64,
    pub message: String,
}

/// One parsed Term Customizer override file (`key;value;locale`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomizerFile {
    pub path: PathBuf,
    /// key -> locale -> value, locales lowercased.
    pub entries: BTreeMap<String, BTreeMap<String, String>>,
    pub locales: BTreeSet<String>,
    pub row_errors: Vec<RowError>,
}

impl CustomizerFile {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub fn parse_customizer_file(path: &Path) -> Result<CustomizerFile> {
    let file = std::fs::File::open(path)?;
    parse_customizer_reader(file, path)
}

/// Columns `key`, `value`, `locale` are located by header name in any order.
/// A row with the wrong field count or a blank key/locale is collected as a
/// per-row error; only a missing header column aborts the file.
pub fn parse_customizer_reader<R: Read>(reader: R, path: &Path) -> Result<CustomizerFile> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .from_reader(reader);

    let headers = rdr
        .headers()
        .map_err(|e| TermdiffError::Csv(format!("{}: {e}", path.display())))?
        .clone();
    let idx = |name: &str| headers.iter().position(|h| h.trim() == name);
    let (key_idx, value_idx, locale_idx) = match (idx("key"), idx("value"), idx("locale")) {
        (Some(k), Some(v), Some(l)) => (k, v, l),
        _ => {
            return Err(TermdiffError::Csv(format!(
                "{}: header must contain key, value and locale columns (got: {})",
                path.display(),
                headers.iter().collect::<Vec<_>>().join(";")
            ))
            .into())
        }
    };

    let mut out = CustomizerFile {
        path: PathBuf::from(path),
        entries: BTreeMap::new(),
        locales: BTreeSet::new(),
        row_errors: Vec::new(),
    };

    for record in rdr.records() {
        let record = record.map_err(|e| TermdiffError::Csv(format!("{}: {e}", path.display())))?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        if record.len() != headers.len() {
            out.row_errors.push(RowError {
                line,
                message: format!("expected {} fields, got {}", headers.len(), record.len()),
            });
            continue;
        }
        let key = record.get(key_idx).unwrap_or("").to_string();
        let value = record.get(value_idx).unwrap_or("").to_string();
        let locale = record.get(locale_idx).unwrap_or("").to_lowercase();
        if key.is_empty() || locale.is_empty() {
            out.row_errors.push(RowError {
                line,
                message: "blank key or locale".to_string(),
            });
            continue;
        }
        out.locales.insert(locale.clone());
        out.entries.entry(key).or_default().insert(locale, value);
    }

    Ok(out)
}

/// A legacy Crowdin CSV export: `ID;key;Source Text;<LOCALE>...;Context`.
/// Every column between the fixed ones is treated as a target locale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegacyCatalog {
    pub path: PathBuf,
    /// key -> "Source Text" value (the source language).
    pub source_texts: BTreeMap<String, String>,
    /// locale -> key -> value, locales lowercased.
    pub locale_values: BTreeMap<String, BTreeMap<String, String>>,
    pub locales: BTreeSet<String>,
    pub row_errors: Vec<RowError>,
}

impl LegacyCatalog {
    pub fn value_for(&self, key: &str, locale: &str) -> Option<&str> {
        if locale.eq_ignore_ascii_case(LEGACY_SOURCE_LOCALE) {
            self.source_texts.get(key).map(String::as_str)
        } else {
            self.locale_values
                .get(&locale.to_lowercase())?
                .get(key)
                .map(String::as_str)
        }
    }
}

pub fn parse_legacy_file(path: &Path) -> Result<LegacyCatalog> {
    let file = std::fs::File::open(path)?;
    parse_legacy_reader(file, path)
}

pub fn parse_legacy_reader<R: Read>(reader: R, path: &Path) -> Result<LegacyCatalog> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .from_reader(reader);

    let headers = rdr
        .headers()
        .map_err(|e| TermdiffError::Csv(format!("{}: {e}", path.display())))?
        .clone();
    let idx = |name: &str| headers.iter().position(|h| h.trim() == name);
    let (key_idx, source_idx) = match (idx("key"), idx("Source Text")) {
        (Some(k), Some(s)) => (k, s),
        _ => {
            return Err(TermdiffError::Csv(format!(
                "{}: not a legacy export, header must contain key and Source Text",
                path.display()
            ))
            .into())
        }
    };
    let fixed = ["ID", "key", "Source Text", "Context"];
    let locale_cols: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter(|(_, h)| !fixed.contains(&h.trim()))
        .map(|(i, h)| (i, h.trim().to_lowercase()))
        .collect();

    let mut out = LegacyCatalog {
        path: PathBuf::from(path),
        source_texts: BTreeMap::new(),
        locale_values: BTreeMap::new(),
        locales: locale_cols.iter().map(|(_, l)| l.clone()).collect(),
        row_errors: Vec::new(),
    };

    for record in rdr.records() {
        let record = record.map_err(|e| TermdiffError::Csv(format!("{}: {e}", path.display())))?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        if record.len() != headers.len() {
            out.row_errors.push(RowError {
                line,
                message: format!("expected {} fields, got {}", headers.len(), record.len()),
            });
            continue;
        }
        let key = record.get(key_idx).unwrap_or("").to_string();
        if key.is_empty() {
            out.row_errors.push(RowError {
                line,
                message: "blank key".to_string(),
            });
            continue;
        }
        out.source_texts
            .insert(key.clone(), record.get(source_idx).unwrap_or("").to_string());
        for (col, locale) in &locale_cols {
            let value = record.get(*col).unwrap_or("");
            out.locale_values
                .entry(locale.clone())
                .or_default()
                .insert(key.clone(), value.to_string());
        }
    }

    Ok(out)
}

/// Expand an input path: a directory yields every `.csv` beneath it, sorted.
pub fn collect_csv_inputs(path: &Path) -> Result<Vec<PathBuf>> {
    if !path.is_dir() {
        return Ok(vec![PathBuf::from(path)]);
    }
    let mut found: Vec<PathBuf> = WalkDir::new(path)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("csv"))
        })
        .collect();
    found.sort();
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_customizer_rows() {
        let csv = "key;value;locale\n\
                   decidim.budgets.title;Budgets;en\n\
                   decidim.budgets.title;Haushalte;DE\n\
                   decidim.budgets.vote;Abstimmen;de\n";
        let file = parse_customizer_reader(csv.as_bytes(), Path::new("terms.csv")).unwrap();
        assert_eq!(file.len(), 2);
        assert_eq!(
            file.entries["decidim.budgets.title"]["de"],
            "Haushalte".to_string()
        );
        assert_eq!(
            file.locales.iter().collect::<Vec<_>>(),
            vec!["de", "en"]
        );
        assert!(file.row_errors.is_empty());
    }

    #[test]
    fn header_order_does_not_matter() {
        let csv = "locale;key;value\nde;a.b;Wert\n";
        let file = parse_customizer_reader(csv.as_bytes(), Path::new("terms.csv")).unwrap();
        assert_eq!(file.entries["a.b"]["de"], "Wert");
    }

    #[test]
    fn bad_rows_are_collected_not_fatal() {
        let csv = "key;value;locale\n\
                   good.key;Value;en\n\
                   short.row;only-two\n\
                   ;Missing;en\n";
        let file = parse_customizer_reader(csv.as_bytes(), Path::new("terms.csv")).unwrap();
        assert_eq!(file.len(), 1);
        assert_eq!(file.row_errors.len(), 2);
        assert_eq!(file.row_errors[0].line, 3);
    }

    #[test]
    fn missing_header_column_is_structural() {
        let csv = "key;translation\nx;y\n";
        assert!(parse_customizer_reader(csv.as_bytes(), Path::new("terms.csv")).is_err());
    }

    #[test]
    fn parses_legacy_export() {
        let csv = "ID;key;Source Text;DE;FR;Context\n\
                   1;decidim.budgets.title;Budgets;Haushalte;Budgets participatifs;module\n";
        let cat = parse_legacy_reader(csv.as_bytes(), Path::new("legacy.csv")).unwrap();
        assert_eq!(cat.value_for("decidim.budgets.title", "en"), Some("Budgets"));
        assert_eq!(
            cat.value_for("decidim.budgets.title", "de"),
            Some("Haushalte")
        );
        assert_eq!(cat.value_for("decidim.budgets.title", "es"), None);
        assert!(cat.locales.contains("fr"));
    }
}
