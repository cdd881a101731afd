use std::path::PathBuf;

use color_eyre::eyre::{bail, Result};
use termdiff_config::DEFAULT_TEMPERATURE;
use termdiff_correct::{CorrectionClient, ToneMode};
use termdiff_domain::CorrectionReport;
use termdiff_services::grammar::{
    collect_entries, export_corrections, plan_batches, run_grammar as service_grammar,
    run_tone as service_tone,
};

use crate::{ApiArgs, InputArgs, ToneArg};

/// Build the client from flags over saved config over defaults. The key is
/// the only setting without a usable default.
pub fn build_client(api: &ApiArgs) -> Result<CorrectionClient> {
    let cfg = termdiff_config::load_config();
    let endpoint = api.endpoint.clone().unwrap_or(cfg.api_endpoint);
    let key = api.api_key.clone().unwrap_or(cfg.api_key);
    let model = api.model.clone().unwrap_or(cfg.api_model);
    if key.is_empty() {
        bail!("no API key configured; pass --api-key or save one with `termdiff config --set-api-key`");
    }
    Ok(CorrectionClient::new(endpoint, key, model, DEFAULT_TEMPERATURE)?)
}

pub fn run_grammar(
    input: InputArgs,
    api: ApiArgs,
    locale: String,
    batch_size: usize,
    dry_run: bool,
    out_dir: PathBuf,
) -> Result<()> {
    let ws = super::load_workspace(input, false, false)?;
    let locale = locale.to_lowercase();
    let per_file = collect_entries(&ws, &locale);
    if per_file.is_empty() {
        crate::ui_info!("no entries found to check for locale '{locale}'");
        return Ok(());
    }

    if dry_run {
        print_plan(&per_file, batch_size);
        return Ok(());
    }

    let client = build_client(&api)?;
    let report = service_grammar(&client, &locale, &per_file, batch_size);
    finish(&report, &out_dir)
}

pub fn run_tone(
    input: InputArgs,
    api: ApiArgs,
    locale: String,
    mode: ToneArg,
    batch_size: usize,
    dry_run: bool,
    out_dir: PathBuf,
) -> Result<()> {
    let mode = match mode {
        ToneArg::Formal => ToneMode::Formal,
        ToneArg::Informal => ToneMode::Informal,
    };
    let locale = locale.to_lowercase();
    if !termdiff_correct::is_german(&locale) {
        bail!("tone adjustment is only supported for German locales (de, de-ch)");
    }

    let ws = super::load_workspace(input, false, false)?;
    let per_file = collect_entries(&ws, &locale);
    if per_file.is_empty() {
        crate::ui_info!("no entries found to adjust for locale '{locale}'");
        return Ok(());
    }

    if dry_run {
        print_plan(&per_file, batch_size);
        return Ok(());
    }

    let client = build_client(&api)?;
    let report = service_tone(&client, &locale, &per_file, batch_size, mode)?;
    finish(&report, &out_dir)
}

fn print_plan(
    per_file: &std::collections::BTreeMap<PathBuf, Vec<termdiff_core::TranslationEntry>>,
    batch_size: usize,
) {
    let plan = plan_batches(per_file, batch_size);
    for (path, batches, entries) in &plan {
        println!(
            "{}: {} entr{} in {} batch(es)",
            path.display(),
            entries,
            if *entries == 1 { "y" } else { "ies" },
            batches
        );
    }
    let total: usize = plan.iter().map(|(_, _, n)| n).sum();
    crate::ui_info!("dry run, nothing sent; {total} entr(ies) total");
}

fn finish(report: &CorrectionReport, out_dir: &std::path::Path) -> Result<()> {
    for failure in &report.failures {
        crate::ui_warn!("{} batch {}: {}", failure.file, failure.batch, failure.error);
    }
    for c in &report.corrections {
        println!("{} [{}]", c.key, c.locale);
        println!("  original:  {}", c.original);
        println!("  corrected: {}", c.corrected);
    }
    crate::ui_ok!(
        "{} of {} checked entr(ies) changed, {} batch failure(s)",
        report.changed,
        report.checked,
        report.failures.len()
    );
    if let Some(path) = export_corrections(report, out_dir, &super::now_timestamp())? {
        crate::ui_ok!("corrections saved to {}", path.display());
    }
    Ok(())
}
