use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "duet",
    about = "Two-persona dialogue simulator for local Ollama models",
    version,
    after_help = "Logs are written to: ~/.local/share/duet/logs/duet.log"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to duet.yaml config file")]
    pub config: Option<PathBuf>,

    /// Suppress per-turn console output
    #[arg(short, long, global = true, help = "Suppress per-turn console output")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a dialogue, then export JSON and render HTML
    Run {
        /// Maximum exchange pairs (overrides config)
        #[arg(short = 'n', long)]
        exchanges: Option<usize>,

        /// Opening message credited to the second persona (overrides config)
        #[arg(long)]
        seed: Option<String>,

        /// Stop early when a completion contains this substring
        #[arg(long)]
        sentinel: Option<String>,

        /// Skip the JSON exports
        #[arg(long)]
        no_export: bool,

        /// Skip the HTML render
        #[arg(long)]
        no_render: bool,
    },

    /// Render a previously exported transcript JSON file to HTML
    Render {
        /// Transcript JSON file (ordered array of {role, content})
        input: PathBuf,

        /// Output HTML file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Avatar for even (left) entries
        #[arg(long)]
        avatar_left: Option<String>,

        /// Avatar for odd (right) entries
        #[arg(long)]
        avatar_right: Option<String>,
    },

    /// Write a default duet.yaml configuration
    Init {
        /// Directory to initialize (defaults to ~/.config/duet)
        #[arg(long)]
        path: Option<PathBuf>,

        /// Overwrite an existing configuration
        #[arg(long)]
        force: bool,
    },

    /// Diagnose setup issues
    Doctor,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}
