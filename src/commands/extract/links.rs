use std::collections::HashMap;
use std::path::Path;

use anyhow::Result;
use tracing::info;

use crate::util::read_json;

/// Known quest links keyed by the raw quest-name cell text, level suffix
/// included (`"Kaer Morhen (1)"`).
#[derive(Debug, Clone, Default)]
pub struct LinkTable {
    links: HashMap<String, String>,
}

impl LinkTable {
    pub fn load(path: &Path) -> Result<Self> {
        let links: HashMap<String, String> = read_json(path)?;
        info!(path = %path.display(), entries = links.len(), "loaded link table");
        Ok(Self { links })
    }

    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            links: pairs
                .into_iter()
                .map(|(name, url)| (name.to_string(), url.to_string()))
                .collect(),
        }
    }

    pub fn resolve(&self, raw_name: &str) -> Option<&str> {
        self.links.get(raw_name.trim()).map(String::as_str)
    }
}
