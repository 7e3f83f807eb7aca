use std::path::Path;

use anyhow::{Context, Result};

/// A document to harvest plus free-text context for categorization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub title: String,
    pub hint: String,
}

impl Target {
    /// Hint handed to the classifier; the title contributes keywords too.
    pub fn classifier_hint(&self) -> String {
        format!("{} {}", self.hint, self.title)
    }
}

pub fn load(path: &Path) -> Result<Vec<Target>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("{} not found. Create it with Wikipedia article titles.", path.display()))?;
    Ok(parse(&text))
}

/// `Title` or `Title | hint` per line; blank lines and `#` comments skipped.
pub fn parse(text: &str) -> Vec<Target> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(|line| {
            let (title, hint) = line.split_once('|').unwrap_or((line, ""));
            Target {
                title: title.trim().to_string(),
                hint: hint.trim().to_string(),
            }
        })
        .collect()
}

/// Keep targets whose title contains `needle`, ignoring case.
pub fn filter_by_title(targets: Vec<Target>, needle: &str) -> Vec<Target> {
    if needle.is_empty() {
        return targets;
    }
    let needle = needle.to_lowercase();
    targets
        .into_iter()
        .filter(|t| t.title.to_lowercase().contains(&needle))
        .collect()
}
