//! Buffered record source.
//!
//! A [`Record`] is one input row keyed by header name. Records are built once
//! and never mutated; the whole file is buffered into a [`Dataset`] because
//! inference must see every row before the first statement can be written.

use std::{io::Read, path::Path};

use anyhow::{Context, Result};
use encoding_rs::Encoding;
use log::debug;

use crate::io_utils;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Record {
    fields: Vec<(String, Option<String>)>,
    declared: usize,
}

impl Record {
    pub fn new(fields: Vec<(String, Option<String>)>) -> Self {
        let declared = fields.len();
        Self { fields, declared }
    }

    /// Builds a record from a header row and one decoded data row. Cells past
    /// the header get synthetic `field_<n>` keys that [`Record::keys`] never
    /// yields; missing trailing cells stay absent.
    pub fn from_row(headers: &[String], row: Vec<String>) -> Self {
        let width = headers.len().max(row.len());
        let mut cells = row.into_iter();
        let fields = (0..width)
            .map(|idx| {
                let name = headers
                    .get(idx)
                    .cloned()
                    .unwrap_or_else(|| synthetic_field_name(idx));
                (name, cells.next())
            })
            .collect();
        Self {
            fields,
            declared: headers.len(),
        }
    }

    /// Returns the raw value of the first field called `name`. `None` means
    /// the record has no such field or the cell is absent.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .and_then(|(_, value)| value.as_deref())
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.fields.iter().any(|(key, _)| key == name)
    }

    /// Header-named keys in column order. Synthetic keys for surplus cells
    /// are left out.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields[..self.declared]
            .iter()
            .map(|(key, _)| key.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K, V> FromIterator<(K, Option<V>)> for Record
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, Option<V>)>>(iter: I) -> Self {
        Self::new(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.map(Into::into)))
                .collect(),
        )
    }
}

fn synthetic_field_name(idx: usize) -> String {
    format!("field_{}", idx + 1)
}

#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub headers: Vec<String>,
    pub records: Vec<Record>,
}

impl Dataset {
    pub fn new(headers: Vec<String>, records: Vec<Record>) -> Self {
        Self { headers, records }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}

pub fn read_records<R: Read>(
    reader: &mut csv::Reader<R>,
    encoding: &'static Encoding,
) -> Result<Dataset> {
    let headers = io_utils::reader_headers(reader, encoding)?;
    let mut records = Vec::new();
    for (row_idx, record) in reader.byte_records().enumerate() {
        let record = record.with_context(|| format!("Reading row {}", row_idx + 2))?;
        let decoded = io_utils::decode_record(&record, encoding)
            .with_context(|| format!("Decoding row {}", row_idx + 2))?;
        records.push(Record::from_row(&headers, decoded));
    }
    Ok(Dataset::new(headers, records))
}

pub fn read_dataset(path: &Path, delimiter: u8, encoding: &'static Encoding) -> Result<Dataset> {
    let mut reader = io_utils::open_csv_reader_from_path(path, delimiter)?;
    let dataset =
        read_records(&mut reader, encoding).with_context(|| format!("Reading records from {path:?}"))?;
    debug!(
        "Buffered {} record(s) with {} header(s) from {:?}",
        dataset.len(),
        dataset.headers.len(),
        path
    );
    Ok(dataset)
}
