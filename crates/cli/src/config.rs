//! Configuration management commands.
//!
//! Configuration is loaded from TOML files and merged with environment variables
//! prefixed with `INSTICATOR__`. For example, `INSTICATOR__BIDDER__BID_TTL`
//! will override `bidder.bid_ttl` in the TOML file.

use std::fs;
use std::path::{Path, PathBuf};

use insticator_common::settings::Settings;
use validator::Validate;

use crate::error::CliError;

/// Load and merge configuration from TOML file with environment variables.
///
/// Returns the settings and their canonical TOML after the merge.
pub(crate) fn load_and_merge_config(
    file: &Path,
    verbose: bool,
) -> Result<(Settings, String), CliError> {
    let content = fs::read_to_string(file)?;

    if verbose {
        println!("Loading config from: {}", file.display());
        println!("Environment variables with INSTICATOR__ prefix will be merged");
    }

    let settings = Settings::from_toml(&content)
        .map_err(|e| CliError::Config(format!("Failed to parse and merge config: {:?}", e)))?;

    settings
        .validate()
        .map_err(|e| CliError::Config(format!("Settings validation failed: {e}")))?;

    let merged_toml = settings
        .to_canonical_toml()
        .map_err(|e| CliError::Config(format!("Failed to serialize merged config: {e:?}")))?;

    Ok((settings, merged_toml))
}

/// Settings from `--config`, or the embedded defaults.
pub(crate) fn load_settings(file: Option<&Path>, verbose: bool) -> Result<Settings, CliError> {
    match file {
        Some(file) => Ok(load_and_merge_config(file, verbose)?.0),
        None => Settings::new().map_err(|e| {
            CliError::Config(format!("Failed to load embedded settings: {:?}", e))
        }),
    }
}

/// Validate configuration file.
///
/// Validates TOML syntax, URLs and ranges after merging environment variables.
pub fn validate(file: PathBuf, verbose: bool) -> Result<(), CliError> {
    let (settings, merged_toml) = load_and_merge_config(&file, verbose)?;

    println!("Configuration is valid");
    println!("  File: {}", file.display());
    println!(
        "  Bidder: {} ({})",
        if settings.bidder.enabled {
            "enabled"
        } else {
            "disabled"
        },
        settings.bidder.endpoint_url
    );
    println!(
        "  Analytics: {} ({})",
        if settings.analytics.enabled {
            "enabled"
        } else {
            "disabled"
        },
        settings.analytics.endpoint
    );

    if verbose {
        let value: toml::Value = toml::from_str(&merged_toml)?;
        if let Some(table) = value.as_table() {
            println!("\nSections found:");
            for key in table.keys() {
                println!("  - [{}]", key);
            }
        }

        println!("\nMerged configuration:");
        println!("---");
        print!("{merged_toml}");
        println!("---");
    }

    Ok(())
}
