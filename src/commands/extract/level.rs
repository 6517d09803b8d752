use anyhow::{Context, Result};
use regex::Regex;

use crate::model::Level;

/// Splits the suggested level off a quest-name cell.
#[derive(Debug, Clone)]
pub struct LevelParser {
    suffix: Regex,
}

impl LevelParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            suffix: Regex::new(r"^(.*?)\s*\((\d+)\)\s*$")
                .context("failed to compile level suffix regex")?,
        })
    }

    /// `"Kaer Morhen (1)"` becomes `("Kaer Morhen", Suggested { level: 1 })`.
    /// Anything without a trailing integer in parentheses is level `Any`.
    pub fn split(&self, raw: &str) -> (String, Level) {
        let raw = raw.trim();
        let Some(captures) = self.suffix.captures(raw) else {
            return (raw.to_string(), Level::Any);
        };

        let name = captures.get(1).map(|m| m.as_str()).unwrap_or_default();
        match captures.get(2).and_then(|m| m.as_str().parse::<u32>().ok()) {
            Some(level) if !name.is_empty() => (name.to_string(), Level::Suggested { level }),
            _ => (raw.to_string(), Level::Any),
        }
    }
}
