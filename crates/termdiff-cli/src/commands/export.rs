use std::path::PathBuf;

use color_eyre::eyre::{bail, Result};
use termdiff_core::ComparisonPolicy;
use termdiff_services::export::{
    export_deleted, export_updated, load_edit_overlay, EditOverlay, ExportMode,
};

use crate::{ExportModeArg, InputArgs};

pub fn run_export(
    input: InputArgs,
    policy: ComparisonPolicy,
    mode: ExportModeArg,
    suffix: Option<String>,
    out_dir: Option<PathBuf>,
    edits: Option<PathBuf>,
) -> Result<()> {
    let mode = match mode {
        ExportModeArg::Individual => ExportMode::Individual,
        ExportModeArg::Merged => ExportMode::Merged,
    };
    if mode == ExportMode::Merged && out_dir.is_none() {
        bail!("merged mode needs --out-dir");
    }

    let ws = super::load_workspace(input, true, true)?;
    let comparison = termdiff_services::compare(&ws, &policy);
    if comparison.total_mismatches() == 0 {
        crate::ui_info!("no mismatches found, nothing to export");
        return Ok(());
    }

    let overlay = match edits {
        Some(path) => {
            let overlay = load_edit_overlay(&path)?;
            crate::ui_info!("applying {} manual edit(s) from {}", overlay.len(), path.display());
            overlay
        }
        None => EditOverlay::new(),
    };

    let out = export_updated(
        &ws,
        &comparison,
        &overlay,
        mode,
        suffix.as_deref(),
        out_dir.as_deref(),
        &super::now_timestamp(),
    )?;
    for path in &out.files {
        crate::ui_ok!("saved {}", path.display());
    }
    crate::ui_ok!("{} row(s) across {} file(s)", out.rows, out.files.len());
    Ok(())
}

pub fn run_export_deleted(input: InputArgs, out_dir: PathBuf) -> Result<()> {
    let ws = super::load_workspace(input, true, true)?;
    let comparison = termdiff_services::compare(&ws, &ComparisonPolicy::default());
    if comparison.keys_to_delete.is_empty() {
        crate::ui_info!("no keys to delete; every customizer key exists in Crowdin");
        return Ok(());
    }

    let out = export_deleted(&ws, &comparison, &out_dir, &super::now_timestamp())?;
    crate::ui_ok!(
        "exported {} key(s) to delete, {} row(s), to {}",
        comparison.keys_to_delete.len(),
        out.rows,
        out.files[0].display()
    );
    Ok(())
}
