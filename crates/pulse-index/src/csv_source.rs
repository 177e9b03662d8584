//! Reader for the published index CSV.
//!
//! ## Column contract
//!
//! | Column                 | Meaning            |
//! |------------------------|--------------------|
//! | `Date`                 | period, e.g. `202504` |
//! | `景氣對策信號`          | signal (light)     |
//! | `景氣對策信號綜合分數`  | integer score      |
//!
//! Other columns are ignored. Rows whose signal or score is `-`, or whose
//! score is not an integer, are skipped. The latest row is the one with the
//! greatest `Date` string; on ties the first one wins.

use std::fmt;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::snapshot::IndexSnapshot;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const MISSING: &str = "-";

#[derive(Debug)]
pub enum IndexCsvError {
    Io(String),
    Csv(String),
    NoValidRows,
}

impl fmt::Display for IndexCsvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexCsvError::Io(m) => write!(f, "index csv io error: {m}"),
            IndexCsvError::Csv(m) => write!(f, "index csv error: {m}"),
            IndexCsvError::NoValidRows => write!(f, "index csv has no valid rows"),
        }
    }
}

impl std::error::Error for IndexCsvError {}

#[derive(Debug, Deserialize)]
struct IndexRow {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "景氣對策信號")]
    signal: String,
    #[serde(rename = "景氣對策信號綜合分數")]
    score: String,
}

impl IndexRow {
    fn into_snapshot(self) -> Option<IndexSnapshot> {
        let signal = self.signal.trim();
        let score = self.score.trim();
        if signal == MISSING || score == MISSING {
            return None;
        }
        let score: i64 = score.parse().ok()?;
        Some(IndexSnapshot {
            date: self.date.trim().to_string(),
            signal: signal.to_string(),
            score,
        })
    }
}

pub fn read_index_csv(path: &Path) -> Result<IndexSnapshot, IndexCsvError> {
    let bytes = std::fs::read(path)
        .map_err(|e| IndexCsvError::Io(format!("read '{}': {e}", path.display())))?;
    parse_index_csv(&bytes)
}

pub fn parse_index_csv(bytes: &[u8]) -> Result<IndexSnapshot, IndexCsvError> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let mut rdr = csv::Reader::from_reader(bytes);

    let mut latest: Option<IndexSnapshot> = None;
    for (i, rec) in rdr.deserialize::<IndexRow>().enumerate() {
        let row = rec.map_err(|e| IndexCsvError::Csv(e.to_string()))?;
        let Some(snap) = row.into_snapshot() else {
            debug!(row = i + 1, "skipping index row without signal or score");
            continue;
        };
        match &latest {
            Some(best) if best.date >= snap.date => {}
            _ => latest = Some(snap),
        }
    }

    latest.ok_or(IndexCsvError::NoValidRows)
}
