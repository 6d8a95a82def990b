//! JSON recording loader
//!
//! A recording file is a JSON object holding a `channels x samples` array of
//! numbers under a known field (`"dadosEEG"` unless told otherwise).

use crate::error::{EegError, Result};
use crate::mmap_utils::mmap_file;
use crate::types::RawRecording;
use serde_json::Value;
use std::path::Path;

/// Field holding the sample matrix in recordings exported by the acquisition software
pub const DEFAULT_DATA_FIELD: &str = "dadosEEG";

/// Load one participant's recording from disk.
pub fn load_recording(path: &Path, field: &str, sample_rate_hz: f64) -> Result<RawRecording> {
    let mmap = mmap_file(path)?;
    log::debug!("Read {} bytes from {}", mmap.len(), path.display());
    parse_recording(&mmap, field, sample_rate_hz)
}

/// Parse a recording from raw JSON bytes.
pub fn parse_recording(bytes: &[u8], field: &str, sample_rate_hz: f64) -> Result<RawRecording> {
    let doc: Value = serde_json::from_slice(bytes)?;
    let matrix = doc
        .get(field)
        .ok_or_else(|| EegError::MalformedInput(format!("missing field '{}'", field)))?;
    let channels = parse_matrix(matrix, field)?;
    RawRecording::new(channels, sample_rate_hz)
}

fn parse_matrix(value: &Value, field: &str) -> Result<Vec<Vec<f64>>> {
    let rows = value.as_array().ok_or_else(|| {
        EegError::MalformedInput(format!("field '{}' is not an array", field))
    })?;

    rows.iter()
        .enumerate()
        .map(|(ch, row)| {
            let samples = row.as_array().ok_or_else(|| {
                EegError::MalformedInput(format!(
                    "field '{}': channel {} is not an array of samples",
                    field,
                    ch + 1
                ))
            })?;
            samples
                .iter()
                .enumerate()
                .map(|(i, v)| {
                    v.as_f64().ok_or_else(|| {
                        EegError::MalformedInput(format!(
                            "field '{}': channel {}, sample {} is not a number",
                            field,
                            ch + 1,
                            i
                        ))
                    })
                })
                .collect()
        })
        .collect()
}
