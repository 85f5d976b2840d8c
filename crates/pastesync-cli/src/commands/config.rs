//! Config command handlers

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use pastesync_core::Config;

use crate::output::{Output, OutputFormat};

/// Show current configuration
pub fn show(config_path: Option<&PathBuf>, output: &Output) -> Result<()> {
    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "server_url": config.server_url,
                    "max_reconnect_attempts": config.max_reconnect_attempts,
                    "reconnect_base_delay_ms": config.reconnect_base_delay_ms,
                    "request_timeout_secs": config.request_timeout_secs,
                    "log_file": config.log_file
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", config.server_url);
        }
        OutputFormat::Human => {
            let effective_path = config_path
                .cloned()
                .unwrap_or_else(Config::config_file_path);
            println!("Configuration:");
            println!("  server_url:              {}", config.server_url);
            println!(
                "  max_reconnect_attempts:  {}",
                config.max_reconnect_attempts
            );
            println!(
                "  reconnect_base_delay_ms: {}",
                config.reconnect_base_delay_ms
            );
            println!("  request_timeout_secs:    {}", config.request_timeout_secs);
            println!(
                "  log_file:                {}",
                config
                    .log_file
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(not set)".to_string())
            );
            println!();
            println!("Config file: {}", effective_path.display());
        }
    }

    Ok(())
}

/// Set a configuration value
pub fn set(
    key: String,
    value: String,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    let mut config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    apply_setting(&mut config, &key, &value)?;

    // Save to the CLI-specified path or default
    let save_path = config_path
        .cloned()
        .unwrap_or_else(Config::config_file_path);
    config
        .save_to_path(&save_path)
        .context("Failed to save configuration")?;

    output.success(&format!("Set {} = {}", key, value));

    Ok(())
}

fn apply_setting(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        "server_url" => {
            config.server_url = value.trim_end_matches('/').to_string();
        }
        "max_reconnect_attempts" => {
            config.max_reconnect_attempts = value
                .parse()
                .context("Invalid value for max_reconnect_attempts. Use a whole number.")?;
        }
        "reconnect_base_delay_ms" => {
            config.reconnect_base_delay_ms = value
                .parse()
                .context("Invalid value for reconnect_base_delay_ms. Use milliseconds.")?;
        }
        "request_timeout_secs" => {
            config.request_timeout_secs = value
                .parse()
                .context("Invalid value for request_timeout_secs. Use seconds.")?;
        }
        "log_file" => {
            config.log_file = if value.is_empty() || value == "none" {
                None
            } else {
                Some(value.into())
            };
        }
        _ => {
            bail!(
                "Unknown configuration key: '{}'\n\
                 Valid keys: server_url, max_reconnect_attempts, reconnect_base_delay_ms, \
                 request_timeout_secs, log_file",
                key
            );
        }
    }
    config.validate()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_setting() {
        let mut config = Config::default();

        apply_setting(&mut config, "server_url", "https://paste.example.com/").unwrap();
        assert_eq!(config.server_url, "https://paste.example.com");

        apply_setting(&mut config, "max_reconnect_attempts", "3").unwrap();
        assert_eq!(config.max_reconnect_attempts, 3);

        apply_setting(&mut config, "log_file", "/tmp/pastesync.log").unwrap();
        assert!(config.log_file.is_some());
        apply_setting(&mut config, "log_file", "none").unwrap();
        assert!(config.log_file.is_none());
    }

    #[test]
    fn test_apply_setting_rejects_bad_values() {
        let mut config = Config::default();

        assert!(apply_setting(&mut config, "max_reconnect_attempts", "many").is_err());
        assert!(apply_setting(&mut config, "server_url", "ftp://example.com").is_err());

        let mut config = Config::default();
        assert!(apply_setting(&mut config, "request_timeout_secs", "0").is_err());

        let err = apply_setting(&mut config, "nope", "1").unwrap_err();
        assert!(err.to_string().contains("Unknown configuration key"));
    }
}
