use color_eyre::eyre::Result;
use termdiff_core::ComparisonPolicy;
use termdiff_services::{compare, Comparison};

use crate::{InputArgs, OutputFormat};

pub fn run_compare(
    input: InputArgs,
    policy: ComparisonPolicy,
    format: OutputFormat,
    strict: bool,
    use_color: bool,
) -> Result<()> {
    let ws = super::load_workspace(input, true, true)?;
    let comparison = compare(&ws, &policy);

    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(std::io::stdout().lock(), &comparison.to_report(&ws))?;
            println!();
        }
        OutputFormat::Text => print_text(&ws, &comparison, use_color),
    }

    let any_diff = comparison.total_mismatches() > 0 || !comparison.keys_to_delete.is_empty();
    if strict && any_diff {
        tracing::warn!(event = "strict_differences_found");
        std::process::exit(2);
    }
    Ok(())
}

fn print_text(ws: &termdiff_services::Workspace, comparison: &Comparison, use_color: bool) {
    for warning in &comparison.warnings {
        crate::ui_warn!("{warning}");
    }

    if comparison.total_mismatches() == 0 {
        crate::ui_ok!("no mismatches found, files are in sync");
    }

    for file in &comparison.files {
        if file.mismatches.is_empty() {
            continue;
        }
        println!("File: {}", file.path.display());
        for m in &file.mismatches {
            if use_color {
                use owo_colors::OwoColorize;
                println!("  {} [{}]", m.key.green(), m.locale.magenta());
                println!("    crowdin:    {}", m.crowdin_value.red());
                println!("    customizer: {}", m.customizer_value.yellow());
            } else {
                println!("  {} [{}]", m.key, m.locale);
                println!("    crowdin:    {}", m.crowdin_value);
                println!("    customizer: {}", m.customizer_value);
            }
        }
    }

    let stats = comparison.stats(ws);
    println!(
        "matching: {}  mismatched: {}  customizer-only: {}  crowdin-only: {}  locales: {}",
        stats.matching_keys,
        stats.mismatched_keys,
        stats.keys_only_in_customizer,
        stats.keys_only_in_crowdin,
        stats.locales_compared
    );
}
