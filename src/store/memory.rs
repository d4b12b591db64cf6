//! Implements the `Store` trait using in-memory CSV data.
//!
//! Note: this is compiled in the production build too so that the dashboard routes and the
//! aggregation can be driven end-to-end without a data file.

use crate::error::{ErrorType, IntoResult};
use crate::model::{Entry, Record};
use crate::store::{encode_rows, parse_records, separated, Records, Store};
use crate::Result;
use tokio::sync::Mutex;

/// Holds the same bytes a `CsvStore` would write to disk. `None` plays the part of a missing file.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: Mutex<Option<Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store whose "file" already contains `csv`.
    pub fn with_csv(csv: impl Into<String>) -> Self {
        Self {
            data: Mutex::new(Some(csv.into().into_bytes())),
        }
    }

    /// The current contents of the "file", if it exists.
    pub async fn contents(&self) -> Option<String> {
        self.data
            .lock()
            .await
            .as_ref()
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }
}

#[async_trait::async_trait]
impl Store for MemoryStore {
    async fn initialize(&self) -> Result<()> {
        let mut data = self.data.lock().await;
        if data.as_ref().map_or(true, |bytes| bytes.is_empty()) {
            *data = Some(encode_rows(std::iter::empty(), true).pub_result(ErrorType::Store)?);
        }
        Ok(())
    }

    async fn append(&self, entry: &Entry) -> Result<Record> {
        let record = entry.record()?;
        self.initialize().await?;
        let row = encode_rows([&record], false).pub_result(ErrorType::Store)?;
        let mut data = self.data.lock().await;
        let bytes = data.get_or_insert_with(Vec::new);
        let row = separated(bytes.last().copied(), row);
        bytes.extend_from_slice(&row);
        Ok(record)
    }

    async fn read_all(&self) -> Result<Records> {
        Ok(match self.data.lock().await.as_ref() {
            Some(bytes) => parse_records(bytes),
            None => Records::default(),
        })
    }

    async fn replace_all(&self, records: &[Record]) -> Result<()> {
        let bytes = encode_rows(records, true).pub_result(ErrorType::Store)?;
        *self.data.lock().await = Some(bytes);
        Ok(())
    }
}
