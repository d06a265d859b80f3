use std::path::Path;

use anyhow::{Context, Result};

use crate::color::ColorRamp;
use crate::config::AppConfig;
use crate::data::loader::{CoordinateLoader, DATASET};
use crate::data::midpoint::MidpointMemo;
use crate::layout::load_page;
use crate::render::scene::write_scenes;

/// Run a headless subcommand if one was given. `Ok(false)` means start the UI.
pub fn handle_commands(args: &[String], config: &AppConfig) -> Result<bool> {
    match args.get(1).map(|s| s.as_str()) {
        Some("export-scenes") => {
            let out = args
                .get(2)
                .context("usage: enrollment-sources export-scenes <out.json>")?;
            export_scenes(config, Path::new(out))?;
            Ok(true)
        }
        Some("help") | Some("--help") | Some("-h") => {
            print_help();
            Ok(true)
        }
        _ => Ok(false),
    }
}

fn export_scenes(config: &AppConfig, out: &Path) -> Result<()> {
    let loader = CoordinateLoader::new(
        config.data_path.clone(),
        config.fallback_base_url.clone(),
        config.column_order,
    );
    let page = load_page(
        config,
        &loader,
        &DATASET,
        &mut MidpointMemo::new(),
        &ColorRamp::default(),
    )
    .context("composing the page")?;
    let written = write_scenes(page.all_scenes(), out)?;
    log::info!("Wrote {written} scenes to {}", out.display());
    println!("Wrote {written} scenes to {}", out.display());
    Ok(())
}

pub fn print_help() {
    println!(
        "enrollment-sources [COMMAND]

Without a command, opens the map viewer.

Commands:
  export-scenes <out.json>   write every panel as deck.gl scene JSON
  help                       show this message

Environment:
  ENROLLMENT_CONFIG          JSON config file (default: ./enrollment.json if present)
  ENROLLMENT_DATA_PATH       local coordinate file (default: data.csv)
  ENROLLMENT_FALLBACK_URL    base URL used when the local file is missing
  RUST_LOG                   log filter, e.g. info"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn no_command_starts_the_ui() {
        let config = AppConfig::default();
        assert!(!handle_commands(&args(&["enrollment-sources"]), &config).unwrap());
        assert!(!handle_commands(&args(&["enrollment-sources", "--verbose"]), &config).unwrap());
    }

    #[test]
    fn export_requires_an_output_path() {
        let err = handle_commands(&args(&["enrollment-sources", "export-scenes"]), &AppConfig::default())
            .unwrap_err();
        assert!(err.to_string().contains("usage"));
    }
}
