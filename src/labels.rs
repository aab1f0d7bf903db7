// src/labels.rs

use anyhow::{ensure, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::info;

/// Ordered, immutable list of clothing label strings. Loaded once at
/// startup; index i corresponds to output index i of the classifier.
#[derive(Debug, Clone)]
pub struct LabelCatalog {
    labels: Vec<String>,
}

#[derive(Deserialize)]
struct Metadata {
    labels: Vec<String>,
}

impl LabelCatalog {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read label metadata {}", path.display()))?;
        let catalog = Self::from_json(&contents)?;
        info!("✓ Loaded {} clothing labels", catalog.len());
        Ok(catalog)
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        let metadata: Metadata =
            serde_json::from_str(contents).context("failed to parse label metadata")?;
        ensure!(!metadata.labels.is_empty(), "label metadata has no labels");
        Ok(Self {
            labels: metadata.labels,
        })
    }

    pub fn from_labels(labels: Vec<String>) -> Self {
        Self { labels }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }
}
