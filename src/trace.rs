//! Recorded observation traces
//!
//! A trace is either a JSON array of observations or one observation per
//! line (JSON lines). Blank lines and lines starting with `#` are skipped in
//! the line format.

use crate::errors::{ConvergeError, Result};
use crate::types::Observation;
use std::path::Path;

/// Parse a trace from text
pub fn parse_trace(contents: &str) -> Result<Vec<Observation>> {
    let trimmed = contents.trim_start();
    if trimmed.starts_with('[') {
        return Ok(serde_json::from_str(trimmed)?);
    }

    contents
        .lines()
        .enumerate()
        .map(|(idx, line)| (idx, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .map(|(idx, line)| {
            serde_json::from_str::<Observation>(line).map_err(|e| {
                ConvergeError::TraceError(format!("line {}: {}", idx + 1, e))
            })
        })
        .collect()
}

/// Load a trace file
pub fn load_trace(path: &Path) -> Result<Vec<Observation>> {
    let contents = std::fs::read_to_string(path)?;
    parse_trace(&contents)
}
