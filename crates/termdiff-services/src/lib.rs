//! High-level orchestration layer over the parser, diff and export crates.
//! Intentionally thin: exposes stable functions used by the CLI without it
//! importing parser crates directly.

pub mod catalog;
pub mod diff;
pub mod export;
pub mod grammar;
pub mod search;

pub use catalog::{CrowdinCatalog, Workspace};
pub use diff::{compare, Comparison, FileComparison, Mismatch};
pub use termdiff_core::{
    Classification, ComparisonPolicy, EntrySource, Result, TranslationEntry,
};
