//! Configuration commands.

use console::style;

use crate::config::Config;

/// Print the effective configuration as TOML.
pub fn cmd_config_show(config: &Config) -> anyhow::Result<()> {
    let source = config
        .source_path
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "built-in defaults".to_string());
    eprintln!("{}", style(format!("# Loaded from {}", source)).dim());
    print!("{}", config.to_toml()?);
    Ok(())
}
