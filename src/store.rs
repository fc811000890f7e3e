//! CSV persistence for harvested speeches.
//!
//! The store is one UTF-8 CSV file with the header `title,content,date,url`.
//! Absent fields are written as empty cells and read back as `None`.
//!
//! # Atomicity
//!
//! Every write builds the complete new file content in memory, writes it to
//! a hidden sibling file and renames that over the store. Readers see either
//! the old file or the new one, never a half-written mix.

use crate::error::StoreError;
use crate::merge::MergePlan;
use crate::models::Record;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument, warn};

/// Fixed column order of the store.
pub const COLUMNS: [&str; 4] = ["title", "content", "date", "url"];

/// A CSV file holding one [`Record`] per row.
#[derive(Debug, Clone)]
pub struct CsvStore {
    path: PathBuf,
}

impl CsvStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        CsvStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every record, in file order.
    ///
    /// A missing or empty file is an empty store. A file that exists but is
    /// not valid CSV is an error, so a later rewrite cannot clobber it.
    #[instrument(level = "info", skip_all, fields(path = %self.path.display()))]
    pub async fn load(&self) -> Result<Vec<Record>, StoreError> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("No existing store; starting empty");
                return Ok(Vec::new());
            }
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            warn!("Store file is empty; starting empty");
            return Ok(Vec::new());
        }

        let records = csv::Reader::from_reader(bytes.as_slice())
            .deserialize::<Record>()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|source| StoreError::Corrupt {
                path: self.path.clone(),
                source,
            })?;

        info!(count = records.len(), "Loaded existing records");
        Ok(records)
    }

    /// Carry out a [`MergePlan`].
    pub async fn apply(&self, plan: &MergePlan) -> Result<(), StoreError> {
        match plan {
            MergePlan::Rewrite(records) => self.rewrite(records).await,
            MergePlan::Append { rows, .. } if rows.is_empty() => {
                info!("Nothing to append");
                Ok(())
            }
            MergePlan::Append { rows, .. } => self.append(rows).await,
        }
    }

    /// Replace the store with `records`, header first.
    #[instrument(level = "info", skip_all, fields(path = %self.path.display(), count = records.len()))]
    pub async fn rewrite(&self, records: &[Record]) -> Result<(), StoreError> {
        let bytes = serialize(records, true)?;
        self.write_atomically(bytes).await?;
        info!("Rewrote store");
        Ok(())
    }

    /// Add `records` after the existing rows without touching them.
    ///
    /// The header is written only if the store does not exist yet or is
    /// empty.
    #[instrument(level = "info", skip_all, fields(path = %self.path.display(), count = records.len()))]
    pub async fn append(&self, records: &[Record]) -> Result<(), StoreError> {
        let mut bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let has_rows = !bytes.iter().all(u8::is_ascii_whitespace);
        if !has_rows {
            bytes.clear();
        } else if bytes.last() != Some(&b'\n') {
            bytes.push(b'\n');
        }
        bytes.extend(serialize(records, !has_rows)?);

        self.write_atomically(bytes).await?;
        info!("Appended to store");
        Ok(())
    }

    async fn write_atomically(&self, bytes: Vec<u8>) -> Result<(), StoreError> {
        let write_err = |source: std::io::Error| StoreError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(write_err)?;
        }

        let tmp = self.temp_path();
        if let Err(source) = fs::write(&tmp, bytes).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(write_err(source));
        }
        if let Err(source) = fs::rename(&tmp, &self.path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(write_err(source));
        }
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "store.csv".to_string());
        self.path.with_file_name(format!(".{name}.tmp"))
    }
}

fn serialize(records: &[Record], with_header: bool) -> Result<Vec<u8>, StoreError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    if with_header {
        writer.write_record(COLUMNS)?;
    }
    for record in records {
        writer.serialize(record)?;
    }
    writer
        .into_inner()
        .map_err(|e| StoreError::Serialize(csv::Error::from(e.into_error())))
}
