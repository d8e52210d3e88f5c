//! Per-process records built from one `/proc/<pid>` directory.
//!
//! A record is only constructible through [`ProcessBuilder`], which refuses
//! directories whose name is not a pid. Every other problem (a file that
//! vanished, a short stat line, an unknown uid) degrades that single field to
//! its default, because processes come and go between listing and reading.

use crate::collect::cpu::CpuStats;
use crate::collect::processor;
use crate::collect::users::resolve_owner;
use crate::fs::{CMDLINE_FILENAME, ProcFs, STAT_FILENAME, STATUS_FILENAME};
use crate::text::{
    is_number, parse_trimmed, read_joined_lines, read_optional, replace_first, split, split_in_two,
};
use serde::Serialize;
use std::cmp::Ordering;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Fields a stat line must carry before utime/stime are trusted.
pub const MIN_STAT_FIELDS: usize = 22;

/// Assumed when the clock-tick rate cannot be queried.
const FALLBACK_CLOCK_TICKS: u64 = 100;

const VM_SIZE_KEY: &str = "VmSize";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProcessError {
    #[error("invalid process identifier '{0}': directory name must be a positive pid")]
    InvalidIdentifier(String),
}

/// Snapshot of one process. Identity and ordering are by pid.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessRecord {
    pid: u32,
    user: String,
    command: String,
    ram: String,
    cpu_utilization: f64,
    uptime: u64,
}

impl ProcessRecord {
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Owner name, empty when unresolved.
    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    /// Virtual size in MB, truncated to one decimal (e.g. `"168.4"`).
    pub fn ram(&self) -> &str {
        &self.ram
    }

    /// Share of the per-core CPU baseline, in [0, 1].
    pub fn cpu_utilization(&self) -> f64 {
        self.cpu_utilization
    }

    /// Accumulated CPU time, scaled like the TIME+ column of top.
    pub fn uptime(&self) -> u64 {
        self.uptime
    }
}

impl PartialEq for ProcessRecord {
    fn eq(&self, other: &Self) -> bool {
        self.pid == other.pid
    }
}

impl Eq for ProcessRecord {}

impl PartialOrd for ProcessRecord {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ProcessRecord {
    fn cmp(&self, other: &Self) -> Ordering {
        self.pid.cmp(&other.pid)
    }
}

/// utime and stime (fields 14 and 15) of a `/proc/<pid>/stat` line.
///
/// The command field may itself contain spaces, so positions are counted
/// from the closing parenthesis when there is one. Returns `None` for lines
/// with fewer than [`MIN_STAT_FIELDS`] fields.
pub fn parse_cpu_times(stat: &str) -> Option<(u64, u64)> {
    let (head_fields, rest) = match stat.rfind(')') {
        Some(pos) => (2, &stat[pos + 1..]),
        None => (0, stat),
    };
    let fields: Vec<&str> = rest.split_whitespace().collect();
    if head_fields + fields.len() < MIN_STAT_FIELDS {
        return None;
    }
    let utime = fields.get(13 - head_fields)?.parse().ok()?;
    let stime = fields.get(14 - head_fields)?.parse().ok()?;
    Some((utime, stime))
}

/// Virtual size from status content, in kB.
pub fn parse_vm_size_kb(status: &str) -> Option<f64> {
    status.lines().find_map(|line| {
        let (key, value) = split_in_two(line, ":");
        if key != VM_SIZE_KEY {
            return None;
        }
        parse_trimmed(&replace_first(value, "kB", ""))
    })
}

/// Format kB as MB, truncated (not rounded) to one fractional digit.
pub fn format_megabytes(kb: f64) -> String {
    let mb = format!("{:.6}", kb / 1024.0);
    match mb.find('.') {
        Some(dot) => mb[..dot + 2].to_string(),
        None => mb,
    }
}

/// First null-delimited argument of a cmdline file.
pub fn parse_cmdline(cmdline: &str) -> Option<&str> {
    split(cmdline, '\0').into_iter().next()
}

/// Command from the `Name:` line that opens a status file.
pub fn command_from_status(status: &str) -> Option<&str> {
    let (_key, value) = split_in_two(status.lines().next()?, ":");
    Some(value)
}

fn clock_ticks_per_second() -> u64 {
    match nix::unistd::sysconf(nix::unistd::SysconfVar::CLK_TCK) {
        Ok(Some(ticks)) if ticks > 0 => ticks as u64,
        _ => FALLBACK_CLOCK_TICKS,
    }
}

/// Builds [`ProcessRecord`]s against one CPU baseline.
///
/// The baseline (accounted CPU time per logical core) is read once when the
/// builder is created, so every record of a refresh is normalised alike.
#[derive(Debug, Clone)]
pub struct ProcessBuilder<'a> {
    fs: &'a ProcFs,
    baseline: u64,
    clock_ticks: u64,
}

impl<'a> ProcessBuilder<'a> {
    pub fn new(fs: &'a ProcFs) -> Self {
        let cores = processor::detect(fs).core_count();
        let baseline = match CpuStats::read(fs) {
            Ok(stats) => stats.per_core_total(cores),
            Err(e) => {
                debug!(error = %e, "no cpu baseline, process cpu ratios will be 0");
                0
            }
        };
        Self {
            fs,
            baseline,
            clock_ticks: clock_ticks_per_second(),
        }
    }

    /// Use a fixed baseline and tick rate instead of the live ones.
    pub fn with_baseline(fs: &'a ProcFs, baseline: u64, clock_ticks: u64) -> Self {
        Self {
            fs,
            baseline,
            clock_ticks: clock_ticks.max(1),
        }
    }

    pub fn baseline(&self) -> u64 {
        self.baseline
    }

    /// Build the record for `process_dir`, whose last component must be a
    /// positive pid that fits in a `u32`.
    pub fn build(&self, process_dir: &Path) -> Result<ProcessRecord, ProcessError> {
        let name = process_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if !is_number(&name) {
            return Err(ProcessError::InvalidIdentifier(name));
        }
        let pid = match name.parse::<u32>() {
            Ok(pid) if pid > 0 => pid,
            _ => return Err(ProcessError::InvalidIdentifier(name)),
        };

        let cpu_times = parse_cpu_times(&read_optional(&process_dir.join(STAT_FILENAME)).unwrap_or_default());
        let status = read_optional(&process_dir.join(STATUS_FILENAME));

        Ok(ProcessRecord {
            pid,
            user: resolve_owner(self.fs, process_dir),
            command: self.command(process_dir, status.as_deref()),
            ram: status
                .as_deref()
                .and_then(parse_vm_size_kb)
                .map(format_megabytes)
                .unwrap_or_default(),
            cpu_utilization: self.cpu_ratio(cpu_times),
            uptime: self.cpu_time_seconds(cpu_times),
        })
    }

    /// Build a record for every pid currently listed, skipping failures.
    pub fn build_all(&self) -> Vec<ProcessRecord> {
        let mut records: Vec<ProcessRecord> = crate::collect::system::list_process_ids(self.fs)
            .into_iter()
            .filter_map(|pid| match self.build(&self.fs.process_dir(pid)) {
                Ok(record) => Some(record),
                Err(e) => {
                    debug!(pid, error = %e, "skipping process");
                    None
                }
            })
            .collect();
        records.sort();
        records
    }

    fn command(&self, process_dir: &Path, status: Option<&str>) -> String {
        let cmdline = read_joined_lines(&process_dir.join(CMDLINE_FILENAME));
        if !cmdline.is_empty() {
            return parse_cmdline(&cmdline).unwrap_or_default().to_string();
        }
        // Kernel threads and zombies leave cmdline empty
        status
            .and_then(command_from_status)
            .unwrap_or_default()
            .to_string()
    }

    fn cpu_ratio(&self, cpu_times: Option<(u64, u64)>) -> f64 {
        match cpu_times {
            Some((utime, stime)) if self.baseline > 0 => {
                ((utime as f64 + stime as f64) / self.baseline as f64).clamp(0.0, 1.0)
            }
            _ => 0.0,
        }
    }

    fn cpu_time_seconds(&self, cpu_times: Option<(u64, u64)>) -> u64 {
        match cpu_times {
            Some((utime, stime)) => {
                utime.saturating_add(stime).saturating_mul(60) / self.clock_ticks
            }
            None => 0,
        }
    }
}

/// Build one record with a freshly read baseline.
pub fn build(fs: &ProcFs, process_dir: &Path) -> Result<ProcessRecord, ProcessError> {
    ProcessBuilder::new(fs).build(process_dir)
}
