//! Diagnose duet setup issues

use colored::*;
use eyre::Result;

use crate::config::Config;

pub fn run(config: &Config) -> Result<()> {
    println!("{}", "Duet Doctor".bold());
    println!("{}", "═".repeat(50));
    println!();

    let mut issues = 0;

    // Check duet directory
    let duet_dir = Config::duet_dir();
    if duet_dir.exists() {
        println!("{} Duet directory: {}", "✓".green(), duet_dir.display());
    } else {
        println!("{} Duet directory missing: {}", "⚠".yellow(), duet_dir.display());
        println!("  Run {} to create it", "duet init".cyan());
    }

    // Check config file
    let config_file = duet_dir.join("duet.yaml");
    if config_file.exists() {
        println!("{} Config file: {}", "✓".green(), config_file.display());
    } else {
        println!(
            "{} Config file missing: {} (built-in defaults in use)",
            "⚠".yellow(),
            config_file.display()
        );
    }

    // Check Ollama endpoint
    println!();
    println!("{}", "Ollama:".bold());
    match installed_models(&config.ollama.host) {
        Ok(models) => {
            println!(
                "{} Endpoint reachable: {} ({} models installed)",
                "✓".green(),
                config.ollama.host,
                models.len()
            );

            for persona in [&config.personas.first, &config.personas.second] {
                if model_installed(&models, &persona.model) {
                    println!("{} Model for {}: {}", "✓".green(), persona.name, persona.model);
                } else {
                    println!(
                        "{} Model for {} not installed: {}",
                        "✗".red(),
                        persona.name,
                        persona.model
                    );
                    println!("  Run {} to pull it", format!("ollama pull {}", persona.model).cyan());
                    issues += 1;
                }
            }
        }
        Err(e) => {
            println!("{} Endpoint unreachable: {} ({})", "✗".red(), config.ollama.host, e);
            println!("  Is {} running?", "ollama serve".cyan());
            issues += 1;
        }
    }

    println!();
    if issues == 0 {
        println!("{} No issues found", "✓".green());
    } else {
        println!("{} {} issue(s) found", "✗".red(), issues);
    }

    Ok(())
}

/// Names of the models installed on the server, from /api/tags
fn installed_models(host: &str) -> Result<Vec<String>> {
    let url = format!("{}/api/tags", host.trim_end_matches('/'));
    let mut response = ureq::get(&url).call()?;
    let body = response.body_mut().read_to_string()?;
    let tags: serde_json::Value = serde_json::from_str(&body)?;

    let models = tags["models"]
        .as_array()
        .map(|models| {
            models
                .iter()
                .filter_map(|model| model["name"].as_str().map(|s| s.to_string()))
                .collect()
        })
        .unwrap_or_default();
    Ok(models)
}

/// An installed "llama3.1:latest" satisfies a configured "llama3.1"
fn model_installed(installed: &[String], wanted: &str) -> bool {
    installed
        .iter()
        .any(|name| name == wanted || name.split(':').next() == Some(wanted))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_installed_exact_and_tagged() {
        let installed = vec!["llama3.1:latest".to_string(), "mistral:7b".to_string()];
        assert!(model_installed(&installed, "llama3.1"));
        assert!(model_installed(&installed, "llama3.1:latest"));
        assert!(model_installed(&installed, "mistral"));
        assert!(!model_installed(&installed, "llama3.2"));
    }
}
