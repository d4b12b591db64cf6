//! Persistence of transaction records.
//!
//! The dashboard only ever appends to its data and re-reads it in full, so the `Store` trait is
//! deliberately small. `CsvStore` keeps the records in a delimited text file and `MemoryStore`
//! keeps the same bytes in memory.

mod csv_store;
mod memory;

pub use csv_store::CsvStore;
pub use memory::MemoryStore;

use crate::error::Res;
use crate::model::{Entry, RawRow, Record, HEADERS};
use crate::Result;
use anyhow::anyhow;
use csv::Trim;
use tracing::debug;

/// Append-only storage for `Record`s.
#[async_trait::async_trait]
pub trait Store: Send + Sync {
    /// Makes sure the backing storage exists and carries the header row. Calling this more than
    /// once is harmless.
    async fn initialize(&self) -> Result<()>;

    /// Normalizes the entry's date and appends one row. If the date is malformed then an
    /// `ErrorType::MalformedDate` error is returned and nothing is written.
    async fn append(&self, entry: &Entry) -> Result<Record>;

    /// Reads every record, in storage order. Rows that cannot be parsed are skipped and counted.
    /// Missing storage is the same as no records.
    async fn read_all(&self) -> Result<Records>;

    /// Discards any existing records and writes `records` in their place.
    async fn replace_all(&self, records: &[Record]) -> Result<()>;
}

/// The result of reading a `Store`: the records that parsed and how many rows did not.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Records {
    records: Vec<Record>,
    dropped: usize,
}

impl Records {
    pub fn new(records: Vec<Record>, dropped: usize) -> Self {
        Self { records, dropped }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// The number of rows that were skipped because they could not be parsed.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Parses CSV data, with a header row, into `Records`.
pub(crate) fn parse_records(data: &[u8]) -> Records {
    let mut reader = csv::ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(data);

    let mut records = Vec::new();
    let mut dropped = 0;
    for (ix, result) in reader.deserialize::<RawRow>().enumerate() {
        match result.map_err(anyhow::Error::from).and_then(Record::try_from) {
            Ok(record) => records.push(record),
            Err(e) => {
                dropped += 1;
                // data rows start on line 2
                debug!("Skipping malformed row on line {}: {e:#}", ix + 2);
            }
        }
    }
    Records { records, dropped }
}

/// Encodes `records` as CSV rows, optionally preceded by the header row.
pub(crate) fn encode_rows<'a, I>(records: I, header: bool) -> Res<Vec<u8>>
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    if header {
        writer.write_record(HEADERS)?;
    }
    for record in records {
        writer.write_record(record.to_row())?;
    }
    writer
        .into_inner()
        .map_err(|e| anyhow!("Unable to flush CSV data: {}", e.error()))
}

/// The bytes to append for `row` given that the existing data ends in `last_byte`. A newline is
/// prepended when the existing data does not end with one.
pub(crate) fn separated(last_byte: Option<u8>, mut row: Vec<u8>) -> Vec<u8> {
    if matches!(last_byte, Some(b) if b != b'\n') {
        row.insert(0, b'\n');
    }
    row
}
