//! Roster snapshot formats
//!
//! - [`json`]: the native format, versioned, with migration of older layouts
//! - [`csv`]: a one-line-per-servant export for spreadsheets
//! - [`webcrow`]: the tuple format of the third-party material simulator

pub mod csv;
pub mod json;
pub mod webcrow;

use crate::id::ItemId;
use crate::roster::{Filters, OwnedServant};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FormatError {
    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported snapshot version: {0}")]
    UnsupportedVersion(String),

    #[error("Failed to parse this data: {0}")]
    Layout(String),

    #[error("Entry {index}: {field} {problem}")]
    InvalidField {
        index: usize,
        field: &'static str,
        problem: String,
    },
}

/// Everything the player has entered: their roster, owned item counts and
/// display filters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub servants: Vec<OwnedServant>,
    pub items: BTreeMap<ItemId, u64>,
    pub filters: Filters,
}
