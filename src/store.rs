use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::parser::category::Category;

/// One dataset entry. Harvested entries carry `_harvested: true`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub year: i32,
    pub prediction: String,
    pub source: String,
    pub reality: String,
    pub category: Category,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(rename = "_harvested", default, skip_serializing_if = "is_false")]
    pub harvested: bool,
    /// Keys curated entries carry that this crate does not model.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl Record {
    pub fn harvested(
        id: String,
        year: i32,
        prediction: String,
        source: String,
        reality: String,
        category: Category,
    ) -> Self {
        Record {
            id,
            year,
            prediction,
            source,
            reality,
            category,
            tags: Vec::new(),
            harvested: true,
            extra: Map::new(),
        }
    }
}

/// The dataset file: a JSON object whose `entries` array holds the records.
///
/// Everything else in the document, and every entry, is kept as raw JSON so a
/// save rewrites curated content unchanged.
#[derive(Debug)]
pub struct RecordStore {
    path: PathBuf,
    doc: Map<String, Value>,
}

impl RecordStore {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read dataset {}", path.display()))?;
        let store = Self::from_json(path, &raw)?;
        info!("Loaded {} entries from {}", store.len(), path.display());
        Ok(store)
    }

    fn from_json(path: &Path, raw: &str) -> Result<Self> {
        let doc: Value = serde_json::from_str(raw)
            .with_context(|| format!("Invalid JSON in {}", path.display()))?;
        let Value::Object(doc) = doc else {
            bail!("{}: top level is not an object", path.display());
        };

        let store = RecordStore {
            path: path.to_path_buf(),
            doc,
        };
        let Some(entries) = store.doc.get("entries") else {
            bail!("{}: missing \"entries\" array", path.display());
        };
        let Some(entries) = entries.as_array() else {
            bail!("{}: \"entries\" is not an array", path.display());
        };

        let mut seen = HashSet::new();
        for (i, entry) in entries.iter().enumerate() {
            let Some(id) = entry.get("id").and_then(Value::as_str) else {
                bail!("{}: entry #{} has no string \"id\"", path.display(), i);
            };
            if !seen.insert(id) {
                warn!("Duplicate id in dataset: {}", id);
            }
        }
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn entries(&self) -> &[Value] {
        self.doc
            .get("entries")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    pub fn ids(&self) -> Vec<String> {
        self.entries()
            .iter()
            .filter_map(|e| e.get("id").and_then(Value::as_str))
            .map(str::to_string)
            .collect()
    }

    /// Entries that fit the record schema. Others are skipped.
    pub fn records(&self) -> Vec<Record> {
        self.entries()
            .iter()
            .filter_map(|e| serde_json::from_value(e.clone()).ok())
            .collect()
    }

    pub fn append(&mut self, records: &[Record]) -> Result<()> {
        let entries = self
            .doc
            .get_mut("entries")
            .and_then(Value::as_array_mut)
            .context("dataset has no entries array")?;
        for record in records {
            entries.push(serde_json::to_value(record)?);
        }
        Ok(())
    }

    /// Rewrite the whole dataset. Goes through a temp file so a failed write
    /// leaves the previous file intact.
    pub fn save(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.doc)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).with_context(|| format!("Failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;
        info!("Saved {} entries to {}", self.len(), self.path.display());
        Ok(())
    }
}
