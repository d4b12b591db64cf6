//! The file-backed `Store`.

use crate::error::{ErrorType, IntoResult, Res};
use crate::model::{Entry, Record};
use crate::store::{encode_rows, parse_records, separated, Records, Store};
use crate::{utils, Result};
use anyhow::Context;
use std::io::{ErrorKind, SeekFrom};
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tracing::{debug, info};

/// Stores records as rows of a CSV file with the header `date,sales,expenses,region,product`.
///
/// There is no locking. Two processes appending to the same file at the same time may interleave
/// their rows.
#[derive(Debug, Clone)]
pub struct CsvStore {
    path: PathBuf,
}

impl CsvStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creates the file with a header row if it is missing or empty.
    async fn init_file(&self) -> Res<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            utils::make_dir(parent).await?;
        }

        let mut file = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                let len = tokio::fs::metadata(&self.path)
                    .await
                    .with_context(|| format!("Unable to stat {}", self.path.display()))?
                    .len();
                if len > 0 {
                    return Ok(());
                }
                OpenOptions::new()
                    .write(true)
                    .open(&self.path)
                    .await
                    .with_context(|| format!("Unable to open {}", self.path.display()))?
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Unable to create {}", self.path.display()))
            }
        };

        let header = encode_rows(std::iter::empty(), true)?;
        file.write_all(&header)
            .await
            .with_context(|| format!("Unable to write header to {}", self.path.display()))?;
        file.flush().await?;
        info!("Created data file {}", self.path.display());
        Ok(())
    }

    async fn append_record(&self, record: &Record) -> Res<()> {
        self.init_file().await?;
        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .open(&self.path)
            .await
            .with_context(|| format!("Unable to open {} for appending", self.path.display()))?;

        let row = separated(last_byte(&mut file).await?, encode_rows([record], false)?);

        // a single write so that a failed append leaves no partial row behind
        file.write_all(&row)
            .await
            .with_context(|| format!("Unable to append to {}", self.path.display()))?;
        file.flush().await?;
        Ok(())
    }

    async fn write_fresh(&self, records: &[Record]) -> Res<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            utils::make_dir(parent).await?;
        }
        let data = encode_rows(records, true)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        utils::write(&tmp, data).await?;
        utils::rename(&tmp, &self.path).await
    }
}

async fn last_byte(file: &mut tokio::fs::File) -> Res<Option<u8>> {
    let len = file.metadata().await?.len();
    if len == 0 {
        return Ok(None);
    }
    file.seek(SeekFrom::Start(len - 1)).await?;
    let mut buf = [0u8; 1];
    file.read_exact(&mut buf).await?;
    Ok(Some(buf[0]))
}

#[async_trait::async_trait]
impl Store for CsvStore {
    async fn initialize(&self) -> Result<()> {
        self.init_file().await.pub_result(ErrorType::Store)
    }

    async fn append(&self, entry: &Entry) -> Result<Record> {
        let record = entry.record()?;
        self.append_record(&record)
            .await
            .pub_result(ErrorType::Store)?;
        debug!("Appended {:?} to {}", record, self.path.display());
        Ok(record)
    }

    async fn read_all(&self) -> Result<Records> {
        let data = utils::read_if_exists(&self.path)
            .await
            .pub_result(ErrorType::Store)?;
        let records = match data {
            Some(bytes) => parse_records(&bytes),
            None => Records::default(),
        };
        debug!(
            "Read {} records from {} ({} skipped)",
            records.len(),
            self.path.display(),
            records.dropped()
        );
        Ok(records)
    }

    async fn replace_all(&self, records: &[Record]) -> Result<()> {
        self.write_fresh(records)
            .await
            .pub_result(ErrorType::Store)?;
        info!(
            "Wrote {} records to {}",
            records.len(),
            self.path.display()
        );
        Ok(())
    }
}
