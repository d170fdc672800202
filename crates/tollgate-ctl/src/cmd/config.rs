//! Show the effective configuration.

use anyhow::{Context, Result};
use tollgate_core::TollgateConfig;

pub fn cmd_config() -> Result<()> {
    let config = TollgateConfig::load().context("failed to load configuration")?;
    let path = TollgateConfig::file_path();

    println!("# {}{}", path.display(), if path.exists() { "" } else { " (not found, defaults)" });
    print!("{}", toml::to_string_pretty(&config).context("failed to render configuration")?);
    Ok(())
}

pub fn cmd_config_init() -> Result<()> {
    let path = TollgateConfig::write_default_if_missing().context("failed to write default configuration")?;
    println!("Config at {}", path.display());
    Ok(())
}
