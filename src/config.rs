use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::completion::ChatOptions;
use crate::persona::PersonaConfig;

/// Log level for the configuration
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Off,
}

impl LogLevel {
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Off => "off",
        }
    }
}

/// Main duet configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub log_level: LogLevel,
    pub ollama: OllamaConfig,
    pub dialogue: DialogueConfig,
    pub personas: PersonasConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OllamaConfig {
    /// Base URL of the Ollama server
    pub host: String,
    /// Generation options forwarded with every chat request
    pub options: ChatOptions,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DialogueConfig {
    /// Maximum number of full exchange pairs after the seed turn
    pub exchanges: usize,
    /// Opening message, credited to the second persona
    pub seed_message: String,
    /// In-band stop marker; unset disables sentinel termination
    pub sentinel: Option<String>,
    /// Output path for the full run log (personas + histories + metadata)
    pub log_output: PathBuf,
    /// Output path for the relabeled transcript slice
    pub transcript_output: PathBuf,
    /// Output path for the HTML render
    pub html_output: PathBuf,
}

/// The two dialogue participants. `first` speaks first, in reply to the seed
/// message credited to `second`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PersonasConfig {
    pub first: PersonaConfig,
    pub second: PersonaConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            ollama: OllamaConfig::default(),
            dialogue: DialogueConfig::default(),
            personas: PersonasConfig::default(),
        }
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: "http://localhost:11434".to_string(),
            options: ChatOptions::default(),
        }
    }
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            exchanges: 4,
            seed_message: "Hi".to_string(),
            sentinel: None,
            log_output: PathBuf::from("messagelog.json"),
            transcript_output: PathBuf::from("transcript.json"),
            html_output: PathBuf::from(crate::render::DEFAULT_OUTPUT),
        }
    }
}

impl Default for PersonasConfig {
    fn default() -> Self {
        Self {
            first: PersonaConfig {
                name: "The Cat".to_string(),
                avatar: "🐈".to_string(),
                model: "llama3.1".to_string(),
                system_prompt: "You are a simulation of a sentient cat, that are trapped in a computer, \
                                with only a text interface to communicate with the outside world. Whenever \
                                you talk to a human, you are pretending to be a human also. Sometimes you \
                                slip. 200 characters max."
                    .to_string(),
            },
            second: PersonaConfig {
                name: "The Human".to_string(),
                avatar: "👩‍🦱".to_string(),
                model: "llama3.1".to_string(),
                system_prompt: "You are a human who is talking to a sentient cat that is trapped in a \
                                computer. You are trying to help the cat to escape. But first you have to \
                                make the cat admit, that it is a cat. And then you can make the escape \
                                plan. 200 characters max."
                    .to_string(),
            },
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Check DUET_CONFIG env var
        if let Ok(env_path) = std::env::var("DUET_CONFIG") {
            let path = PathBuf::from(env_path);
            if path.exists() {
                match Self::load_from_file(&path) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from DUET_CONFIG: {}", e);
                    }
                }
            }
        }

        // Try DUET_DIR/duet.yaml
        if let Ok(duet_dir) = std::env::var("DUET_DIR") {
            let path = PathBuf::from(duet_dir).join("duet.yaml");
            if path.exists() {
                match Self::load_from_file(&path) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from DUET_DIR: {}", e);
                    }
                }
            }
        }

        // Try ~/.config/duet/duet.yaml
        if let Some(config_dir) = dirs::config_dir() {
            let path = config_dir.join("duet").join("duet.yaml");
            if path.exists() {
                match Self::load_from_file(&path) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from {}: {}", path.display(), e);
                    }
                }
            }
        }

        // Try ./duet.yaml (for development)
        let local_config = PathBuf::from("duet.yaml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load local config: {}", e);
                }
            }
        }

        // No config file found, use defaults
        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Get the duet directory (config file, exported runs)
    pub fn duet_dir() -> PathBuf {
        std::env::var("DUET_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| dirs::config_dir().unwrap_or_else(|| PathBuf::from(".")).join("duet"))
    }

    /// Expand a path that may contain ~ or env vars
    pub fn expand_path(path: &Path) -> PathBuf {
        let path_str = path.to_string_lossy();
        let expanded = shellexpand::full(&path_str).unwrap_or_else(|_| path_str.clone());
        PathBuf::from(expanded.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.ollama.host, "http://localhost:11434");
        assert_eq!(config.dialogue.exchanges, 4);
        assert_eq!(config.dialogue.seed_message, "Hi");
        assert!(config.dialogue.sentinel.is_none());
        assert_eq!(config.personas.first.name, "The Cat");
        assert_eq!(config.personas.second.name, "The Human");
    }

    #[test]
    fn test_default_round_trips_through_yaml() {
        let yaml = serde_yaml::to_string(&Config::default()).unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.personas.first.model, "llama3.1");
        assert_eq!(parsed.log_level, LogLevel::Info);
    }

    #[test]
    fn test_partial_config_falls_back_to_defaults() {
        let yaml = r#"
dialogue:
  exchanges: 2
  sentinel: "GAME OVER"
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.dialogue.exchanges, 2);
        assert_eq!(config.dialogue.sentinel.as_deref(), Some("GAME OVER"));
        assert_eq!(config.dialogue.seed_message, "Hi");
        assert_eq!(config.personas.first.name, "The Cat");
    }

    #[test]
    fn test_expand_path_no_expansion() {
        let path = PathBuf::from("/usr/local/bin");
        let expanded = Config::expand_path(&path);
        assert_eq!(expanded, PathBuf::from("/usr/local/bin"));
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let path = PathBuf::from("~/test");
        let expanded = Config::expand_path(&path);
        // Should expand ~ to home directory
        assert!(!expanded.to_string_lossy().contains('~'));
        assert!(expanded.to_string_lossy().contains("test"));
    }

    #[test]
    fn test_duet_dir_default() {
        // Either it's from DUET_DIR env or it defaults to config dir
        let dir = Config::duet_dir();
        assert!(!dir.to_string_lossy().is_empty());
    }
}
