//! Initialize duet configuration

use colored::*;
use eyre::{Context, Result};
use std::fs;
use std::path::PathBuf;

use crate::config::Config;

pub fn run(path: Option<PathBuf>, force: bool) -> Result<()> {
    let duet_dir = path.unwrap_or_else(Config::duet_dir);

    fs::create_dir_all(&duet_dir).context(format!("Failed to create {}", duet_dir.display()))?;

    let config_file = duet_dir.join("duet.yaml");
    if config_file.exists() && !force {
        eyre::bail!(
            "{} already exists, use --force to overwrite",
            config_file.display()
        );
    }

    let config = Config::default();
    let yaml = serde_yaml::to_string(&config).context("Failed to serialize default config")?;
    fs::write(&config_file, yaml).context(format!("Failed to write {}", config_file.display()))?;

    println!("{} Initialized duet configuration", "✓".green());
    println!("  {} {}", "config:".bold(), config_file.display());
    println!(
        "  {} {} ({}) and {} ({})",
        "personas:".bold(),
        config.personas.first.name,
        config.personas.first.model,
        config.personas.second.name,
        config.personas.second.model
    );
    println!("  {} {}", "endpoint:".bold(), config.ollama.host);
    println!();
    println!("Edit the personas in {} and run {}", config_file.display(), "duet run".cyan());

    Ok(())
}
