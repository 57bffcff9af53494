use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use tracing::{debug, info, warn};

use crate::entry::RevenueEntry;

#[derive(Debug)]
pub struct DataStore {
    pub data_path: PathBuf,
    format: DataFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DataFormat {
    JsonArray,
    JsonLines,
}

impl DataStore {
    #[tracing::instrument(skip(data_path))]
    pub fn open(data_path: &Path) -> anyhow::Result<Self> {
        if !data_path.is_file() {
            return Err(anyhow!(
                "revenue data file not found: {}",
                data_path.display()
            ));
        }

        let format = match data_path.extension().and_then(|ext| ext.to_str()) {
            Some("jsonl") | Some("ndjson") => DataFormat::JsonLines,
            _ => DataFormat::JsonArray,
        };

        info!(
            data = %data_path.display(),
            format = ?format,
            "opened datastore"
        );

        Ok(Self {
            data_path: data_path.to_path_buf(),
            format,
        })
    }

    /// Entries in file order. Later duplicates are kept; the index decides.
    #[tracing::instrument(skip(self))]
    pub fn load_entries(&self) -> anyhow::Result<Vec<RevenueEntry>> {
        let entries = match self.format {
            DataFormat::JsonArray => load_json_array(&self.data_path),
            DataFormat::JsonLines => load_jsonl(&self.data_path),
        }
        .with_context(|| format!("failed to load {}", self.data_path.display()))?;

        for entry in &entries {
            let composed = entry.composition_total();
            if !entry.composition.is_empty() && (composed - entry.total_revenue).abs() > 0.005 {
                debug!(
                    date = %entry.date,
                    total = entry.total_revenue,
                    composed,
                    "composition does not add up to total revenue"
                );
            }
            if entry.total_revenue < 0.0 {
                warn!(date = %entry.date, total = entry.total_revenue, "negative revenue entry");
            }
        }

        debug!(count = entries.len(), "loaded revenue entries");
        Ok(entries)
    }
}

#[tracing::instrument(skip(path))]
fn load_json_array(path: &Path) -> anyhow::Result<Vec<RevenueEntry>> {
    debug!(file = %path.display(), "loading json array");
    let raw = fs::read_to_string(path)?;
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }

    let entries: Vec<RevenueEntry> = serde_json::from_str(&raw)
        .with_context(|| format!("failed parsing {}", path.display()))?;
    Ok(entries)
}

#[tracing::instrument(skip(path))]
fn load_jsonl(path: &Path) -> anyhow::Result<Vec<RevenueEntry>> {
    debug!(file = %path.display(), "loading jsonl");
    let file = fs::File::open(path)?;
    let reader = BufReader::new(file);

    let mut out = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let entry: RevenueEntry = serde_json::from_str(trimmed)
            .with_context(|| format!("failed parsing {} line {}", path.display(), idx + 1))?;
        out.push(entry);
    }

    Ok(out)
}
