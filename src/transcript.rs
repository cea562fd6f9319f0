//! Presentation-ready transcript derived from a persona history.
//!
//! The transcript drops the system entry and relabels the machine roles to
//! the human-readable participant names. Relabeling is a pure derivation:
//! the live history is never touched, and re-applying the same mapping to
//! already-relabeled output changes nothing.

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::persona::Turn;

/// One transcript entry; `role` is a free-form label after relabeling
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub role: String,
    pub content: String,
}

/// Ordered presentation slice of one persona's history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    /// Build from a raw history; the leading system entry is dropped, roles
    /// keep their wire names (`user` / `assistant`)
    pub fn from_history(history: &[Turn]) -> Self {
        let entries = history
            .iter()
            .skip_while(|turn| turn.role == crate::persona::Role::System)
            .map(|turn| TranscriptEntry {
                role: turn.role.to_string(),
                content: turn.content.clone(),
            })
            .collect();
        Self { entries }
    }

    /// Rewrite `user` -> `name_for_user` and `assistant` -> `name_for_assistant`.
    /// Any other role label, including names from a previous relabel pass, is
    /// left untouched.
    pub fn relabel(&self, name_for_user: &str, name_for_assistant: &str) -> Self {
        let entries = self
            .entries
            .iter()
            .map(|entry| TranscriptEntry {
                role: match entry.role.as_str() {
                    "user" => name_for_user.to_string(),
                    "assistant" => name_for_assistant.to_string(),
                    other => other.to_string(),
                },
                content: entry.content.clone(),
            })
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pretty-printed JSON array, overwriting `path`
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.entries).context("Failed to serialize transcript")?;
        fs::write(path, json).context(format!("Failed to write transcript to {}", path.display()))?;
        Ok(())
    }

    /// Load a previously exported transcript JSON array
    pub fn load_json(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).context(format!("Failed to read transcript from {}", path.display()))?;
        let entries: Vec<TranscriptEntry> =
            serde_json::from_str(&content).context("Failed to parse transcript JSON")?;
        Ok(Self { entries })
    }
}
