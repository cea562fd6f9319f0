//! Persona store: identity, configuration and conversation memory for one
//! dialogue participant.
//!
//! A persona's history is append-only for the lifetime of a run. The first
//! entry is always the single `system` instruction; after it, entries strictly
//! alternate between `user` (the other persona's words) and `assistant` (this
//! persona's own completions).

use colored::*;
use eyre::Result;
use serde::{Deserialize, Serialize};

/// Role of a single history entry, from the owning persona's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// One recorded message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn new(role: Role, content: &str) -> Self {
        Self {
            role,
            content: content.to_string(),
        }
    }
}

/// Static persona definition, loaded from config
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaConfig {
    /// Display label, e.g. "The Cat"
    pub name: String,
    /// Cosmetic display glyph for the HTML render
    pub avatar: String,
    /// Ollama model id this persona is addressed with
    pub model: String,
    /// System instruction, becomes the first history entry
    pub system_prompt: String,
}

impl PersonaConfig {
    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            eyre::bail!("persona config is missing 'name'");
        }
        if self.model.trim().is_empty() {
            eyre::bail!("persona config for '{}' is missing 'model'", self.name);
        }
        if self.system_prompt.trim().is_empty() {
            eyre::bail!("persona config for '{}' is missing 'system_prompt'", self.name);
        }
        Ok(())
    }
}

/// A configured participant plus its append-only message history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Persona {
    pub name: String,
    pub avatar: String,
    pub model: String,
    pub system_prompt: String,
    history: Vec<Turn>,
}

impl Persona {
    /// Build a persona from its static config. Fails on malformed config;
    /// on success the history already holds the system entry.
    pub fn new(config: &PersonaConfig) -> Result<Self> {
        config.validate()?;
        let mut persona = Self {
            name: config.name.clone(),
            avatar: config.avatar.clone(),
            model: config.model.clone(),
            system_prompt: config.system_prompt.clone(),
            history: Vec::new(),
        };
        persona.history.push(Turn::new(Role::System, &config.system_prompt));
        Ok(persona)
    }

    /// Append one turn. History length grows by exactly one.
    pub fn append(&mut self, role: Role, content: &str) {
        self.history.push(Turn::new(role, content));
    }

    /// Record words spoken by this persona
    pub fn record_spoken(&mut self, content: &str) {
        self.append(Role::Assistant, content);
    }

    /// Record words heard from the other persona
    pub fn record_heard(&mut self, content: &str) {
        self.append(Role::User, content);
    }

    /// Borrow the live history, system entry included
    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    /// Owned copy of the history; mutating it never touches the live store
    pub fn snapshot(&self) -> Vec<Turn> {
        self.history.clone()
    }

    /// History after the system entry, the presentation slice
    pub fn visible(&self) -> &[Turn] {
        &self.history[1..]
    }

    /// Console banner printed before this persona's turns
    pub fn banner(&self) -> String {
        format!("=======================  {}  =======================", self.name)
    }

    pub fn print_banner(&self) {
        println!("{}", self.banner().bold());
    }
}
