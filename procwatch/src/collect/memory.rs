//! Memory utilization from /proc/meminfo.
//!
//! Only the first two records are consulted, positionally: the first is the
//! total and the second is treated as the available amount.

use crate::fs::{MEMINFO_FILENAME, ProcFs};
use crate::text::{parse_trimmed, replace_first, split_in_two};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Errors that can occur while decoding /proc/meminfo.
#[derive(Error, Debug)]
pub enum MemoryError {
    #[error("failed to read /proc/meminfo: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("failed to parse /proc/meminfo: missing line {0}")]
    MissingLine(usize),

    #[error("failed to parse value for field '{field}': {value}")]
    ParseError { field: String, value: String },
}

/// The two leading meminfo figures, in kilobytes.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MemoryInfo {
    pub total_kb: u64,
    pub available_kb: u64,
}

impl MemoryInfo {
    /// Read `<root>/meminfo`.
    pub fn read(fs: &ProcFs) -> Result<Self, MemoryError> {
        let content = std::fs::read_to_string(fs.file(MEMINFO_FILENAME))?;
        Self::parse(&content)
    }

    /// Parse the first two `Label: value kB` lines.
    pub fn parse(content: &str) -> Result<Self, MemoryError> {
        let mut lines = content.lines();
        let total_kb = parse_record(lines.next().ok_or(MemoryError::MissingLine(1))?)?;
        let available_kb = parse_record(lines.next().ok_or(MemoryError::MissingLine(2))?)?;
        Ok(Self {
            total_kb,
            available_kb,
        })
    }

    pub fn used_kb(&self) -> u64 {
        self.total_kb.saturating_sub(self.available_kb)
    }

    /// Fraction of memory in use, in [0, 1]. Zero when the total is zero.
    pub fn used_ratio(&self) -> f64 {
        if self.total_kb == 0 {
            return 0.0;
        }
        self.used_kb() as f64 / self.total_kb as f64
    }
}

fn parse_record(row: &str) -> Result<u64, MemoryError> {
    let row = replace_first(row, "kB", "");
    let (label, value) = split_in_two(&row, ":");
    parse_trimmed(value).ok_or_else(|| MemoryError::ParseError {
        field: label.to_string(),
        value: value.to_string(),
    })
}

/// `(total - available) / total`, or 0.0 when meminfo is unusable.
pub fn memory_utilization(fs: &ProcFs) -> f64 {
    match MemoryInfo::read(fs) {
        Ok(info) => info.used_ratio(),
        Err(e) => {
            debug!(error = %e, "memory utilization unavailable");
            0.0
        }
    }
}
