//! CSV dataset persistence with merge-on-load semantics.
//!
//! # File Format
//!
//! ```text
//! \u{FEFF}id,source,url,title,fetched_at,t_total_sec,content,h1,h2
//! 1,bbc,https://www.bbc.com/news/...,Title,2025-05-06T14:30:00.123456Z,1.204,"Para one
//!
//! Para two",Title,Subhead
//! ```
//!
//! UTF-8 with a byte-order mark, header row always present.
//!
//! # Run Lifecycle
//!
//! The dataset is read once at startup ([`DatasetStore::load_existing`]) to
//! learn the highest identifier, and rewritten in full once at the end
//! ([`DatasetStore::save`]). There is no incremental append: the last
//! successful write wins.

use crate::error::StoreError;
use crate::models::{COLUMNS, StoredRow};
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument, warn};

const BOM: &str = "\u{feff}";

/// Rows loaded from a previous run.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PersistedDataset {
    pub rows: Vec<StoredRow>,
    /// Largest identifier seen; 0 when there is none.
    pub max_id: u64,
}

impl PersistedDataset {
    /// First identifier for this run's new records; `None` when the id
    /// space is used up.
    pub fn next_id(&self) -> Option<u64> {
        self.max_id.checked_add(1)
    }
}

/// The dataset file at a fixed path.
#[derive(Debug, Clone)]
pub struct DatasetStore {
    path: PathBuf,
}

impl DatasetStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every row of the prior dataset.
    ///
    /// A missing file is not an error: it yields an empty dataset. Records
    /// that cannot be read are skipped with a warning; unparseable `id`
    /// values load as absent and unparseable timings as zero.
    #[instrument(level = "info", skip_all, fields(path = %self.path.display()))]
    pub async fn load_existing(&self) -> Result<PersistedDataset, StoreError> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("No prior dataset; starting fresh");
                return Ok(PersistedDataset::default());
            }
            Err(source) => return Err(self.io_error(source)),
        };

        let dataset = parse_dataset(raw.strip_prefix(BOM).unwrap_or(&raw))
            .map_err(|source| self.csv_error(source))?;
        info!(rows = dataset.rows.len(), max_id = dataset.max_id, "Loaded prior dataset");
        Ok(dataset)
    }

    /// Overwrite the dataset with `rows`, header first. An empty slice writes
    /// a header-only file. Parent directories are created as needed.
    #[instrument(level = "info", skip_all, fields(path = %self.path.display(), rows = rows.len()))]
    pub async fn save(&self, rows: &[StoredRow]) -> Result<(), StoreError> {
        let bytes = render_dataset(rows).map_err(|source| self.csv_error(source))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|source| self.io_error(source))?;
        }
        fs::write(&self.path, bytes)
            .await
            .map_err(|source| self.io_error(source))?;

        info!("Wrote dataset");
        Ok(())
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }

    fn csv_error(&self, source: csv::Error) -> StoreError {
        StoreError::Csv {
            path: self.path.display().to_string(),
            source,
        }
    }
}

fn parse_dataset(raw: &str) -> Result<PersistedDataset, csv::Error> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .from_reader(raw.as_bytes());

    let columns: HashMap<String, usize> = reader
        .headers()?
        .iter()
        .enumerate()
        .map(|(i, name)| (name.trim().to_string(), i))
        .collect();

    let mut rows = Vec::new();
    for (line, record) in reader.records().enumerate() {
        match record {
            Ok(record) => rows.push(row_from_record(&record, &columns)),
            Err(e) => warn!(record = line + 1, error = %e, "Skipping unreadable dataset record"),
        }
    }

    let max_id = rows.iter().filter_map(|r| r.id).max().unwrap_or(0);
    Ok(PersistedDataset { rows, max_id })
}

fn row_from_record(record: &StringRecord, columns: &HashMap<String, usize>) -> StoredRow {
    let field = |name: &str| -> &str {
        columns
            .get(name)
            .and_then(|&i| record.get(i))
            .unwrap_or_default()
    };

    StoredRow {
        id: field("id").trim().parse().ok(),
        source: field("source").to_string(),
        url: field("url").trim().to_string(),
        title: field("title").trim().to_string(),
        fetched_at: field("fetched_at").to_string(),
        t_total_sec: field("t_total_sec").trim().parse().unwrap_or(0.0),
        content: field("content").to_string(),
        h1: field("h1").to_string(),
        h2: field("h2").to_string(),
    }
}

fn render_dataset(rows: &[StoredRow]) -> Result<Vec<u8>, csv::Error> {
    let mut out = BOM.as_bytes().to_vec();
    {
        let mut writer = WriterBuilder::new().has_headers(false).from_writer(&mut out);
        writer.write_record(COLUMNS)?;
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
    }
    Ok(out)
}
