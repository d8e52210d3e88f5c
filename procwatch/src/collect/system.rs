//! System-wide figures: OS identity, kernel, uptime and process counts.
//!
//! Each query re-reads its file and falls back to an empty or zero value when
//! the file is missing or malformed.

use crate::fs::{ProcFs, STAT_FILENAME, UPTIME_FILENAME, VERSION_FILENAME};
use crate::text::{parse_trimmed, read_optional, scan_numeric_subdirectories, split_in_two};
use tracing::debug;

const PRETTY_NAME_KEY: &str = "PRETTY_NAME";
const PROCS_RUNNING_KEY: &str = "procs_running";

/// Human-readable distribution name from an os-release file.
pub fn parse_os_release(content: &str) -> Option<String> {
    content.lines().find_map(|line| {
        let (key, value) = line.split_once('=')?;
        if key.trim() != PRETTY_NAME_KEY {
            return None;
        }
        Some(value.trim().trim_matches(|c: char| c == '"' || c == '\'').to_string())
    })
}

/// Third whitespace token of the first line of /proc/version.
pub fn parse_kernel_version(content: &str) -> Option<String> {
    content
        .lines()
        .next()?
        .split_whitespace()
        .nth(2)
        .map(str::to_string)
}

/// Seconds since boot, rounded, from the first field of /proc/uptime.
pub fn parse_uptime(content: &str) -> Option<u64> {
    let (uptime, _idle) = split_in_two(content.lines().next()?, " ");
    let seconds: f64 = parse_trimmed(uptime)?;
    if !seconds.is_finite() || seconds < 0.0 {
        return None;
    }
    Some(seconds.round() as u64)
}

/// Value of the `procs_running` line of /proc/stat.
pub fn parse_procs_running(content: &str) -> Option<u32> {
    let line = content.lines().find(|line| line.contains(PROCS_RUNNING_KEY))?;
    let (_key, value) = split_in_two(line, " ");
    parse_trimmed(value)
}

/// Distribution name, or an empty string.
pub fn operating_system_name(fs: &ProcFs) -> String {
    read_optional(fs.os_release())
        .and_then(|content| parse_os_release(&content))
        .unwrap_or_default()
}

/// Running kernel version, or an empty string.
pub fn kernel_version(fs: &ProcFs) -> String {
    read_optional(&fs.file(VERSION_FILENAME))
        .and_then(|content| parse_kernel_version(&content))
        .unwrap_or_default()
}

/// Seconds since boot, or 0.
pub fn uptime_seconds(fs: &ProcFs) -> u64 {
    read_optional(&fs.file(UPTIME_FILENAME))
        .and_then(|content| parse_uptime(&content))
        .unwrap_or(0)
}

/// Number of numeric entries in the process tree, or 0.
pub fn total_process_count(fs: &ProcFs) -> usize {
    match scan_numeric_subdirectories(fs.root(), |_| {}) {
        Ok(count) => count,
        Err(e) => {
            debug!(root = %fs.root().display(), error = %e, "cannot scan process tree");
            0
        }
    }
}

/// Processes currently on a CPU, or 0.
pub fn running_process_count(fs: &ProcFs) -> u32 {
    read_optional(&fs.file(STAT_FILENAME))
        .and_then(|content| parse_procs_running(&content))
        .unwrap_or(0)
}

/// Every pid in the process tree, in directory order.
pub fn list_process_ids(fs: &ProcFs) -> Vec<u32> {
    let mut pids = Vec::new();
    let scanned = scan_numeric_subdirectories(fs.root(), |name| {
        // Names are all digits; only out-of-range values are skipped.
        if let Ok(pid) = name.parse() {
            pids.push(pid);
        }
    });
    if let Err(e) = scanned {
        debug!(root = %fs.root().display(), error = %e, "cannot list pids");
    }
    pids
}
