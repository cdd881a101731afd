use std::path::PathBuf;

use color_eyre::eyre::{bail, Result};

pub fn run_config(
    set_crowdin: Option<PathBuf>,
    set_endpoint: Option<String>,
    set_api_key: Option<String>,
    set_model: Option<String>,
) -> Result<()> {
    let mut cfg = termdiff_config::load_config();
    let changing = set_crowdin.is_some()
        || set_endpoint.is_some()
        || set_api_key.is_some()
        || set_model.is_some();

    if let Some(path) = set_crowdin {
        if !path.exists() {
            bail!("{} does not exist", path.display());
        }
        cfg.crowdin_file_path = Some(path);
    }
    if let Some(endpoint) = set_endpoint {
        cfg.api_endpoint = endpoint;
    }
    if let Some(key) = set_api_key {
        cfg.api_key = key;
    }
    if let Some(model) = set_model {
        cfg.api_model = model;
    }

    if changing {
        termdiff_config::save_config(&cfg)?;
        crate::ui_ok!("settings saved to {}", termdiff_config::config_path()?.display());
    }

    println!(
        "crowdin file: {}",
        cfg.crowdin_file_path
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(not set)".to_string())
    );
    println!("endpoint:     {}", cfg.api_endpoint);
    println!(
        "api key:      {}",
        if cfg.api_key.is_empty() { "(not set)" } else { "(set)" }
    );
    println!("model:        {}", cfg.api_model);
    Ok(())
}
