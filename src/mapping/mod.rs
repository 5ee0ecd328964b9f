//! Field mapping between source records and remote list columns.
//!
//! A [`MappingTable`] renames the keys of a [`Record`] into the column names
//! the remote list expects. Keys without a destination are dropped, unless the
//! table is empty, in which case the record passes through untouched. A table
//! emptied by an allow-list is not empty in that sense: it drops everything.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;


/// A flat record: field name to JSON value.
pub type Record = Map<String, Value>;

/// Source field key to destination column name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MappingTable {
    entries: BTreeMap<String, String>,
    // Set once `retain` has filtered a non-empty table.
    restricted: bool,
}

impl MappingTable {
    /// Builds a table from `(source, destination)` pairs.
    ///
    /// Pairs with an empty destination are unmapped and not stored.
    pub fn from_pairs<I, S, D>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, D)>,
        S: Into<String>,
        D: Into<String>,
    {
        let entries = pairs
            .into_iter()
            .map(|(source, destination)| (source.into(), destination.into()))
            .filter(|(_, destination)| !destination.is_empty())
            .collect();
        Self {
            entries,
            restricted: false,
        }
    }

    /// Builds a table from a raw JSON object.
    ///
    /// Entries whose value is not a string are ignored, as are empty strings.
    pub fn from_json_object(raw: &Map<String, Value>) -> Self {
        Self::from_pairs(
            raw.iter()
                .filter_map(|(source, value)| value.as_str().map(|d| (source.clone(), d.to_string()))),
        )
    }

    /// Destination for a source field, if mapped.
    pub fn destination(&self, source: &str) -> Option<&str> {
        self.entries.get(source).map(String::as_str)
    }

    /// Keeps only the mappings whose source key satisfies `keep`.
    ///
    /// Filtering a non-empty table never turns it into the identity mapping,
    /// even when nothing survives.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&str) -> bool,
    {
        if !self.entries.is_empty() {
            self.restricted = true;
        }
        self.entries.retain(|source, _| keep(source));
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True when records pass through unchanged: nothing was ever mapped.
    pub fn is_identity(&self) -> bool {
        self.entries.is_empty() && !self.restricted
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Payload shape accepted by the list items endpoint: `{"fields": {...}}`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EntryEnvelope {
    pub fields: Record,
}

impl EntryEnvelope {
    pub fn new(fields: Record) -> Self {
        Self { fields }
    }
}

/// Rename a record's keys according to `table`.
///
/// - Identity table (nothing configured): the record is returned unchanged.
/// - Otherwise each mapped key is stored under its destination and every
///   unmapped key is dropped.
///
/// The input is never modified. If two source keys map to the same
/// destination, the one that sorts last wins.
pub fn map_record(record: &Record, table: &MappingTable) -> Record {
    if table.is_identity() {
        return record.clone();
    }

    record
        .iter()
        .filter_map(|(key, value)| {
            table
                .destination(key)
                .map(|destination| (destination.to_string(), value.clone()))
        })
        .collect()
}

/// Map a record and wrap it in the envelope sent to the remote list.
pub fn prepare_fields(record: &Record, table: &MappingTable) -> EntryEnvelope {
    EntryEnvelope::new(map_record(record, table))
}
