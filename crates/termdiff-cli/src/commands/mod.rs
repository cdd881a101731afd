pub mod compare;
pub mod config_cmd;
pub mod export;
pub mod grammar;
pub mod search;

use std::path::PathBuf;

use color_eyre::eyre::{bail, Result};
use termdiff_services::Workspace;

use crate::InputArgs;

/// Timestamp used in every generated output name.
pub fn now_timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Resolve the Crowdin inputs, falling back to the remembered path.
fn resolve_crowdin(given: Vec<PathBuf>) -> Result<Vec<PathBuf>> {
    if !given.is_empty() {
        return Ok(given);
    }
    let cfg = termdiff_config::load_config();
    match cfg.crowdin_file_path {
        Some(path) => {
            crate::ui_info!("using remembered Crowdin file {}", path.display());
            Ok(vec![path])
        }
        None => Ok(Vec::new()),
    }
}

/// Load the workspace for a command, enforcing that both sides exist where
/// the command needs them.
pub fn load_workspace(input: InputArgs, need_crowdin: bool, need_terms: bool) -> Result<Workspace> {
    let crowdin = resolve_crowdin(input.crowdin)?;
    if need_crowdin && crowdin.is_empty() {
        bail!("no Crowdin file given; pass --crowdin or remember one with `termdiff config --set-crowdin`");
    }
    if need_terms && input.terms.is_empty() {
        bail!("no Term Customizer file given; pass --terms");
    }
    let ws = Workspace::load(&crowdin, &input.terms)?;
    for warning in ws.row_warnings() {
        crate::ui_warn!("{warning}");
    }
    Ok(ws)
}
