//! Aggregate CPU counters from /proc/stat.
//!
//! Provides the jiffy counters used as the per-process CPU baseline and the
//! instantaneous busy ratio taken by the sampler on every tick.

use crate::fs::{ProcFs, STAT_FILENAME};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Counters the instantaneous reading needs: user through softirq.
pub const INSTANT_COUNTERS: usize = 7;

/// Errors that can occur while reading the aggregate counters.
#[derive(Error, Debug)]
pub enum CpuError {
    #[error("failed to read /proc/stat: {0}")]
    ReadStatError(#[from] std::io::Error),

    #[error("failed to parse /proc/stat: {0}")]
    ParseError(String),
}

/// Raw CPU statistics parsed from the aggregate `cpu` line of /proc/stat.
///
/// All values are in jiffies (typically 1/100 second) since boot.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CpuStats {
    /// Time spent in user mode.
    pub user: u64,
    /// Time spent in user mode with low priority (nice).
    pub nice: u64,
    /// Time spent in system mode.
    pub system: u64,
    /// Time spent idle.
    pub idle: u64,
    /// Time waiting for I/O to complete.
    pub iowait: u64,
    /// Time spent servicing hardware interrupts.
    pub irq: u64,
    /// Time spent servicing software interrupts.
    pub softirq: u64,
    /// Time stolen by other operating systems (virtualization).
    pub steal: u64,
    /// Time spent running virtual CPUs (guest).
    pub guest: u64,
    /// Time spent running niced guest (guest_nice).
    pub guest_nice: u64,
}

impl CpuStats {
    /// Read CPU statistics from `<root>/stat`.
    pub fn read(fs: &ProcFs) -> Result<Self, CpuError> {
        let content = std::fs::read_to_string(fs.file(STAT_FILENAME))?;
        Self::parse(&content)
    }

    /// Parse /proc/stat content for aggregate CPU stats.
    ///
    /// Format: `cpu user nice system idle iowait irq softirq steal guest guest_nice`
    pub fn parse(content: &str) -> Result<Self, CpuError> {
        for line in content.lines() {
            // The aggregate line, not "cpu0", "cpu1", ...
            if line.starts_with("cpu ") {
                return Self::parse_cpu_line(line);
            }
        }
        Err(CpuError::ParseError(
            "no aggregate cpu line found in /proc/stat".to_string(),
        ))
    }

    fn parse_cpu_line(line: &str) -> Result<Self, CpuError> {
        let parts: Vec<&str> = line.split_whitespace().collect();

        // Minimum required fields: cpu user nice system idle
        if parts.len() < 5 {
            return Err(CpuError::ParseError(format!(
                "cpu line too short: expected at least 5 fields, got {}",
                parts.len()
            )));
        }

        let parse_field =
            |idx: usize| -> u64 { parts.get(idx).and_then(|s| s.parse().ok()).unwrap_or(0) };

        Ok(Self {
            user: parse_field(1),
            nice: parse_field(2),
            system: parse_field(3),
            idle: parse_field(4),
            iowait: parse_field(5),
            irq: parse_field(6),
            softirq: parse_field(7),
            steal: parse_field(8),
            guest: parse_field(9),
            guest_nice: parse_field(10),
        })
    }

    /// Total accounted time with guest time counted once.
    ///
    /// The kernel already folds guest time into user and guest_nice into
    /// nice, so those are subtracted before the guest buckets are added back.
    /// Saturates at `u64::MAX`.
    pub fn accounting_total(&self) -> u64 {
        let user = self.user.saturating_sub(self.guest);
        let nice = self.nice.saturating_sub(self.guest_nice);
        [
            user,
            nice,
            self.system,
            self.irq,
            self.softirq,
            self.idle,
            self.iowait,
            self.steal,
            self.guest,
            self.guest_nice,
        ]
        .into_iter()
        .fold(0u64, u64::saturating_add)
    }

    /// Accounted time per logical core. `cores` below 1 is treated as 1.
    pub fn per_core_total(&self, cores: usize) -> u64 {
        self.accounting_total() / cores.max(1) as u64
    }
}

/// Percentage of `counters[..7]` spent idle, or `None` when fewer than seven
/// counters are present or their sum is zero or overflows.
pub fn idle_percent(counters: &[u64]) -> Option<f64> {
    if counters.len() < INSTANT_COUNTERS {
        return None;
    }
    let sum = counters[..INSTANT_COUNTERS]
        .iter()
        .try_fold(0u64, |acc, &counter| acc.checked_add(counter))?;
    if sum == 0 {
        return None;
    }
    Some(counters[3] as f64 * 100.0 / sum as f64)
}

/// Busy percentage (0-100) from the first line of /proc/stat.
///
/// Returns 0.0 when the line is missing, carries fewer than seven counters or
/// their sum overflows.
pub fn utilization_from_stat(content: &str) -> f64 {
    let Some(first) = content.lines().next() else {
        return 0.0;
    };
    let counters: Vec<u64> = first
        .split_whitespace()
        .skip_while(|token| token.starts_with("cpu"))
        .map_while(|token| token.parse().ok())
        .collect();

    match idle_percent(&counters) {
        Some(idle) => 100.0 - idle,
        None => {
            debug!(counters = counters.len(), "unusable cpu line, reading discarded");
            0.0
        }
    }
}

/// One instantaneous busy-percentage reading from `<root>/stat`.
pub fn read_instant_utilization(fs: &ProcFs) -> f64 {
    match std::fs::read_to_string(fs.file(STAT_FILENAME)) {
        Ok(content) => utilization_from_stat(&content),
        Err(e) => {
            debug!(error = %e, "cannot read stat for cpu sample");
            0.0
        }
    }
}
