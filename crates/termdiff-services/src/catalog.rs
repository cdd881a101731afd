use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use termdiff_core::{EntrySource, Result, TermdiffError, TranslationEntry};
use termdiff_parsers_csv::{collect_csv_inputs, parse_customizer_file, CustomizerFile, LegacyCatalog};
use termdiff_parsers_xliff::XliffDocument;

/// One loaded Crowdin-side file.
#[derive(Debug, Clone)]
pub enum CrowdinFile {
    Xliff(XliffDocument),
    Legacy(LegacyCatalog),
}

impl CrowdinFile {
    pub fn path(&self) -> &Path {
        match self {
            CrowdinFile::Xliff(doc) => &doc.path,
            CrowdinFile::Legacy(cat) => &cat.path,
        }
    }
}

/// The Crowdin side of a comparison: any number of XLIFF exports and legacy
/// CSV exports merged into one key space.
#[derive(Debug, Clone, Default)]
pub struct CrowdinCatalog {
    pub files: Vec<CrowdinFile>,
}

impl CrowdinCatalog {
    pub fn load(paths: &[PathBuf]) -> Result<Self> {
        let mut files = Vec::new();
        for path in paths {
            files.push(load_crowdin_file(path)?);
        }
        Ok(CrowdinCatalog { files })
    }

    /// All locales the catalog can resolve: XLIFF source and target
    /// languages plus the legacy exports' source and column locales.
    pub fn locales(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        for file in &self.files {
            match file {
                CrowdinFile::Xliff(doc) => {
                    out.insert(doc.source_language.clone());
                    if !doc.target_language.is_empty() {
                        out.insert(doc.target_language.clone());
                    }
                }
                CrowdinFile::Legacy(cat) => {
                    out.insert(termdiff_parsers_csv::LEGACY_SOURCE_LOCALE.to_string());
                    out.extend(cat.locales.iter().cloned());
                }
            }
        }
        out
    }

    pub fn keys(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        for file in &self.files {
            match file {
                CrowdinFile::Xliff(doc) => out.extend(doc.units.iter().map(|u| u.key.clone())),
                CrowdinFile::Legacy(cat) => out.extend(cat.source_texts.keys().cloned()),
            }
        }
        out
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.files.iter().any(|file| match file {
            CrowdinFile::Xliff(doc) => doc.units.iter().any(|u| u.key == key),
            CrowdinFile::Legacy(cat) => cat.source_texts.contains_key(key),
        })
    }

    /// Resolve a (key, locale) pair. The first file that declares the locale
    /// and carries the key wins; a non-empty combined fallback follows so a
    /// key missing from one export can still resolve from another.
    pub fn value_for(&self, key: &str, locale: &str) -> Option<String> {
        for file in &self.files {
            let value = match file {
                CrowdinFile::Xliff(doc) => doc.value_for(key, locale),
                CrowdinFile::Legacy(cat) => cat.value_for(key, locale),
            };
            if let Some(v) = value {
                return Some(v.to_string());
            }
        }
        None
    }
}

fn load_crowdin_file(path: &Path) -> Result<CrowdinFile> {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("xliff") || ext.eq_ignore_ascii_case("xlf") => Ok(
            CrowdinFile::Xliff(termdiff_parsers_xliff::parse_xliff_file(path)?),
        ),
        Some(ext) if ext.eq_ignore_ascii_case("csv") => {
            Ok(CrowdinFile::Legacy(termdiff_parsers_csv::parse_legacy_file(path)?))
        }
        _ => Err(TermdiffError::Other(format!(
            "{}: unsupported Crowdin file type (expected .xliff or .csv)",
            path.display()
        ))
        .into()),
    }
}

/// Everything loaded for one run: the Crowdin catalog plus the Term
/// Customizer override files.
#[derive(Debug, Clone, Default)]
pub struct Workspace {
    pub catalog: CrowdinCatalog,
    pub customizer: Vec<CustomizerFile>,
}

impl Workspace {
    /// Load explicit files; customizer paths may be directories, expanded to
    /// the `.csv` files beneath them.
    pub fn load(crowdin_paths: &[PathBuf], customizer_paths: &[PathBuf]) -> Result<Self> {
        let catalog = CrowdinCatalog::load(crowdin_paths)?;
        let mut customizer = Vec::new();
        for input in customizer_paths {
            for path in collect_csv_inputs(input)? {
                let file = parse_customizer_file(&path)?;
                tracing::debug!(
                    event = "customizer_loaded",
                    path = %path.display(),
                    keys = file.len(),
                    skipped_rows = file.row_errors.len()
                );
                customizer.push(file);
            }
        }
        Ok(Workspace { catalog, customizer })
    }

    pub fn customizer_locales(&self) -> BTreeSet<String> {
        self.customizer
            .iter()
            .flat_map(|f| f.locales.iter().cloned())
            .collect()
    }

    /// Union of customizer keys across all override files.
    pub fn customizer_keys(&self) -> BTreeSet<String> {
        self.customizer
            .iter()
            .flat_map(|f| f.entries.keys().cloned())
            .collect()
    }

    /// Locales either side declares; what search and correction may scope to.
    pub fn declared_locales(&self) -> BTreeSet<String> {
        let mut out = self.catalog.locales();
        out.extend(self.customizer_locales());
        out
    }

    /// Every input path currently loaded; exports must never collide with these.
    pub fn input_paths(&self) -> Vec<PathBuf> {
        let mut out: Vec<PathBuf> = self
            .catalog
            .files
            .iter()
            .map(|f| f.path().to_path_buf())
            .collect();
        out.extend(self.customizer.iter().map(|f| f.path.clone()));
        out
    }

    /// Flatten every loaded value for one locale into entries, applying the
    /// XLIFF source/target asymmetry on the Crowdin side.
    pub fn entries_for_locale(&self, locale: &str) -> Vec<TranslationEntry> {
        let locale = locale.to_lowercase();
        let mut out = Vec::new();
        for file in &self.catalog.files {
            match file {
                CrowdinFile::Xliff(doc) => {
                    for unit in &doc.units {
                        if let Some(value) = doc.value_for(&unit.key, &locale) {
                            out.push(TranslationEntry {
                                key: unit.key.clone(),
                                locale: locale.clone(),
                                value: value.to_string(),
                                source: EntrySource::Crowdin,
                                origin: doc.path.clone(),
                            });
                        }
                    }
                }
                CrowdinFile::Legacy(cat) => {
                    for key in cat.source_texts.keys() {
                        if let Some(value) = cat.value_for(key, &locale) {
                            out.push(TranslationEntry {
                                key: key.clone(),
                                locale: locale.clone(),
                                value: value.to_string(),
                                source: EntrySource::Crowdin,
                                origin: cat.path.clone(),
                            });
                        }
                    }
                }
            }
        }
        for file in &self.customizer {
            for (key, locales) in &file.entries {
                if let Some(value) = locales.get(&locale) {
                    out.push(TranslationEntry {
                        key: key.clone(),
                        locale: locale.clone(),
                        value: value.clone(),
                        source: EntrySource::TermCustomizer,
                        origin: file.path.clone(),
                    });
                }
            }
        }
        out
    }

    /// Per-row parse problems across all loaded customizer files, rendered
    /// as user-facing warnings.
    pub fn row_warnings(&self) -> Vec<String> {
        let mut out = Vec::new();
        for file in &self.customizer {
            for err in &file.row_errors {
                out.push(format!(
                    "{} line {}: {}",
                    file.path.display(),
                    err.line,
                    err.message
                ));
            }
        }
        out
    }

    /// Group customizer entries by key -> locale -> value across all files,
    /// first file wins on conflicts.
    pub fn merged_customizer(&self) -> BTreeMap<String, BTreeMap<String, String>> {
        let mut merged: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();
        for file in &self.customizer {
            for (key, locales) in &file.entries {
                let slot = merged.entry(key.clone()).or_default();
                for (locale, value) in locales {
                    slot.entry(locale.clone()).or_insert_with(|| value.clone());
                }
            }
        }
        merged
    }
}
