//! JSON-lines batch record reading.
//!
//! Batch files carry one `BidRecord` JSON object per line. Blank lines are
//! skipped; a malformed line is reported with its line number rather than
//! silently dropped.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::domain::BidRecord;
use crate::error::PredictError;

/// Read all records from a JSON-lines file.
pub fn read_records_jsonl(path: &Path) -> Result<Vec<BidRecord>, PredictError> {
    let file = File::open(path).map_err(|e| {
        PredictError::Usage(format!("failed to open records file '{}': {e}", path.display()))
    })?;

    let mut records = Vec::new();
    for (i, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|e| {
            PredictError::Usage(format!("failed to read '{}' line {}: {e}", path.display(), i + 1))
        })?;
        if line.trim().is_empty() {
            continue;
        }
        let record: BidRecord = serde_json::from_str(&line).map_err(|e| {
            PredictError::Usage(format!("invalid record on line {}: {e}", i + 1))
        })?;
        records.push(record);
    }
    Ok(records)
}
