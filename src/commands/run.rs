//! Execute a full dialogue run: seed, alternating turns, JSON export, HTML render

use chrono::Utc;
use colored::*;
use eyre::{Context, Result};
use log::info;
use serde::Serialize;
use std::fs;

use crate::completion::OllamaClient;
use crate::config::Config;
use crate::dialogue::{DialogueLoop, DialogueSettings, RunReport};
use crate::persona::Persona;
use crate::render;
use crate::transcript::Transcript;

/// Per-invocation overrides on top of the config file
pub struct RunArgs {
    pub exchanges: Option<usize>,
    pub seed: Option<String>,
    pub sentinel: Option<String>,
    pub no_export: bool,
    pub no_render: bool,
    pub quiet: bool,
}

/// Full run log: both persona objects with their histories, plus run metadata
#[derive(Serialize)]
struct RunLog<'a> {
    generated_at: String,
    outcome: String,
    completions: usize,
    personas: Vec<&'a Persona>,
}

pub fn run(args: RunArgs, config: &Config) -> Result<()> {
    let mut first = Persona::new(&config.personas.first).context("Invalid config for first persona")?;
    let mut second = Persona::new(&config.personas.second).context("Invalid config for second persona")?;

    let settings = DialogueSettings {
        exchanges: args.exchanges.unwrap_or(config.dialogue.exchanges),
        seed_message: args.seed.unwrap_or_else(|| config.dialogue.seed_message.clone()),
        sentinel: args.sentinel.or_else(|| config.dialogue.sentinel.clone()),
        quiet: args.quiet,
    };

    info!(
        "starting run: {} <-> {} ({} exchange pairs max)",
        first.name, second.name, settings.exchanges
    );

    let client = OllamaClient::new(&config.ollama.host, config.ollama.options.clone());
    let report = DialogueLoop::new(&client, settings).run(&mut first, &mut second)?;
    info!("final state: {} visible turns per persona", first.visible().len());

    // The first persona's history carries every turn from the seed onward;
    // its `user` entries are the second persona's words.
    let transcript = Transcript::from_history(first.history()).relabel(&second.name, &first.name);

    if !args.no_export {
        export(&report, &first, &second, &transcript, config)?;
    }

    if !args.no_render {
        let html_path = Config::expand_path(&config.dialogue.html_output);
        render::write_html(&transcript, &html_path, &second.avatar, &first.avatar)?;
        println!("{} Rendered HTML to {}", "✓".green(), html_path.display());
    }

    if !args.quiet {
        println!();
        println!(
            "{} Run finished: {} ({} completion calls, {} turns)",
            "✓".green(),
            report.outcome.to_string().bold(),
            report.completions,
            transcript.len()
        );
    }

    Ok(())
}

fn export(
    report: &RunReport,
    first: &Persona,
    second: &Persona,
    transcript: &Transcript,
    config: &Config,
) -> Result<()> {
    let log_path = Config::expand_path(&config.dialogue.log_output);
    let log = RunLog {
        generated_at: Utc::now().to_rfc3339(),
        outcome: report.outcome.to_string(),
        completions: report.completions,
        personas: vec![first, second],
    };
    let json = serde_json::to_string_pretty(&log).context("Failed to serialize run log")?;
    fs::write(&log_path, json).context(format!("Failed to write run log to {}", log_path.display()))?;
    println!("{} Exported run log to {}", "✓".green(), log_path.display());

    let transcript_path = Config::expand_path(&config.dialogue.transcript_output);
    transcript.write_json(&transcript_path)?;
    println!("{} Exported transcript to {}", "✓".green(), transcript_path.display());

    Ok(())
}
