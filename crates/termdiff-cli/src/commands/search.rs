use std::path::PathBuf;

use color_eyre::eyre::{bail, Result};
use termdiff_services::search::{apply_preview, preview, SearchOptions};

use crate::{InputArgs, OutputFormat};

#[allow(clippy::too_many_arguments)]
pub fn run_search(
    input: InputArgs,
    locale: String,
    term: String,
    replace: String,
    case_sensitive: bool,
    whole_word: bool,
    apply: bool,
    out_dir: Option<PathBuf>,
    format: OutputFormat,
) -> Result<()> {
    if term.trim().is_empty() {
        bail!("search term must not be empty");
    }
    let ws = super::load_workspace(input, false, false)?;

    let locale = locale.to_lowercase();
    if !ws.declared_locales().contains(&locale) {
        bail!(
            "locale '{locale}' is not declared by any loaded file (declared: {})",
            ws.declared_locales().into_iter().collect::<Vec<_>>().join(", ")
        );
    }

    let opts = SearchOptions {
        case_sensitive,
        whole_word,
    };
    let planned = preview(&ws, &locale, &term, &replace, opts);

    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(std::io::stdout().lock(), &planned.to_report())?;
            println!();
        }
        OutputFormat::Text => {
            if planned.total() == 0 {
                crate::ui_info!("no replacements found");
                return Ok(());
            }
            println!(
                "found {} replacement(s) in {} file(s)",
                planned.total(),
                planned.files.len()
            );
            for (path, entries) in &planned.files {
                println!("File: {}", path.display());
                for (entry, after) in entries {
                    println!("  {} [{}]", entry.key, entry.locale);
                    println!("    old: {}", entry.value);
                    println!("    new: {after}");
                }
            }
        }
    }

    if apply && planned.total() > 0 {
        let written = apply_preview(&planned, out_dir.as_deref(), &super::now_timestamp())?;
        for path in &written {
            crate::ui_ok!("saved {}", path.display());
        }
        crate::ui_info!("originals were not modified");
    }
    Ok(())
}
