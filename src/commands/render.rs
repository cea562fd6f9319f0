//! Re-render an exported transcript JSON file to HTML, offline

use colored::*;
use eyre::Result;
use std::path::PathBuf;

use crate::config::Config;
use crate::render;
use crate::transcript::Transcript;

pub fn run(
    input: PathBuf,
    output: Option<PathBuf>,
    avatar_left: Option<String>,
    avatar_right: Option<String>,
    config: &Config,
) -> Result<()> {
    let transcript = Transcript::load_json(&Config::expand_path(&input))?;
    if transcript.is_empty() {
        println!("{} Transcript is empty, rendering an empty page", "⚠".yellow());
    }

    let output = Config::expand_path(&output.unwrap_or_else(|| config.dialogue.html_output.clone()));
    let avatar_left = avatar_left.unwrap_or_else(|| config.personas.second.avatar.clone());
    let avatar_right = avatar_right.unwrap_or_else(|| config.personas.first.avatar.clone());

    render::write_html(&transcript, &output, &avatar_left, &avatar_right)?;
    println!(
        "{} Rendered {} entries to {}",
        "✓".green(),
        transcript.len(),
        output.display()
    );
    Ok(())
}
