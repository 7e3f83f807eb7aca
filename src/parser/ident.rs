use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

static NON_SLUG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

const BASIS_CHARS: usize = 40;

/// `<year>-<first 40 chars of basis>`, lowercased, non-alphanumeric runs
/// collapsed to `-`, hyphens trimmed.
pub fn slugify(basis: &str, year: i32) -> String {
    let head: String = basis.chars().take(BASIS_CHARS).collect();
    let raw = format!("{}-{}", year, head).to_lowercase();
    NON_SLUG_RE
        .replace_all(&raw, "-")
        .trim_matches('-')
        .to_string()
}

/// Ids already taken: persisted entries plus everything accepted this run.
#[derive(Debug, Clone, Default)]
pub struct IdRegistry {
    known: HashSet<String>,
}

impl IdRegistry {
    pub fn new<I>(ids: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        IdRegistry {
            known: ids.into_iter().collect(),
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.known.contains(id)
    }

    pub fn len(&self) -> usize {
        self.known.len()
    }

    /// First of `base`, `base-1`, `base-2`, … not yet taken. Does not reserve it.
    pub fn resolve(&self, base: &str) -> String {
        if !self.contains(base) {
            return base.to_string();
        }
        let mut counter = 1usize;
        loop {
            let candidate = format!("{}-{}", base, counter);
            if !self.contains(&candidate) {
                return candidate;
            }
            counter += 1;
        }
    }

    /// Reserve an id. Returns false if it was already taken.
    pub fn insert(&mut self, id: String) -> bool {
        self.known.insert(id)
    }
}
