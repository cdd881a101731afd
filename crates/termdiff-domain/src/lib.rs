use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MismatchRow {
    pub key: String,
    pub locale: String,
    pub crowdin_value: String,
    pub customizer_value: String,
    /// Customizer file the row came from.
    pub file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FileStats {
    pub file: String,
    pub total_keys: usize,
    pub keys_in_crowdin: usize,
    pub keys_only_in_file: usize,
    pub mismatched_keys: usize,
    pub matching_keys: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ComparisonStats {
    pub total_crowdin_keys: usize,
    pub total_customizer_keys: usize,
    pub keys_in_both: usize,
    pub keys_only_in_crowdin: usize,
    pub keys_only_in_customizer: usize,
    pub mismatched_keys: usize,
    pub matching_keys: usize,
    pub locales_compared: usize,
    pub per_file: Vec<FileStats>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ComparisonReport {
    pub schema_version: u32,
    pub mismatches: Vec<MismatchRow>,
    /// Keys present only in the customizer files, slated for deletion.
    pub keys_to_delete: Vec<String>,
    /// Non-fatal findings (unmatched locales, skipped CSV rows).
    pub warnings: Vec<String>,
    pub stats: ComparisonStats,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SearchHit {
    pub file: String,
    pub key: String,
    pub locale: String,
    pub before: String,
    pub after: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SearchReport {
    pub schema_version: u32,
    pub hits: Vec<SearchHit>,
    pub files_affected: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CorrectionRow {
    pub file: String,
    pub key: String,
    pub locale: String,
    pub original: String,
    pub corrected: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CorrectionFailure {
    pub file: String,
    /// 1-based batch number within the file.
    pub batch: usize,
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CorrectionReport {
    pub schema_version: u32,
    pub checked: usize,
    pub changed: usize,
    pub corrections: Vec<CorrectionRow>,
    pub failures: Vec<CorrectionFailure>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ExportOutcome {
    pub schema_version: u32,
    pub files: Vec<String>,
    pub rows: usize,
}
