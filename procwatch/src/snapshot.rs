//! Whole-system snapshots.
//!
//! [`SystemInfo`] holds the values that do not change while the machine is
//! up and is detected once. [`Snapshot`] is a single timestamped refresh of
//! everything else.

use crate::collect::memory::memory_utilization;
use crate::collect::process::{ProcessBuilder, ProcessRecord};
use crate::collect::processor::{self, ProcessorDescriptor, ProcessorDetection};
use crate::collect::system;
use crate::format::elapsed_time;
use crate::fs::ProcFs;
use crate::sampler::SamplerConfig;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

/// Ratio above which CPU or memory pressure is logged at warn level.
pub const PRESSURE_THRESHOLD: f64 = 0.9;

/// Identity of the machine.
#[derive(Debug, Clone, Serialize)]
pub struct SystemInfo {
    pub operating_system: String,
    pub kernel: String,
    pub processors: ProcessorDetection,
}

impl SystemInfo {
    pub fn detect(fs: &ProcFs) -> Self {
        let info = Self {
            operating_system: system::operating_system_name(fs),
            kernel: system::kernel_version(fs),
            processors: processor::detect(fs),
        };
        debug!(
            os = %info.operating_system,
            kernel = %info.kernel,
            cores = info.processors.core_count(),
            "system identity detected"
        );
        info
    }

    /// Descriptor of the first logical core, if detection found any.
    pub fn primary_processor(&self) -> Option<&ProcessorDescriptor> {
        self.processors.primary()
    }
}

/// One refresh of the live system figures.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub timestamp: DateTime<Utc>,
    pub system: SystemInfo,
    /// Smoothed busy ratio in [0, 1].
    pub cpu_utilization: f64,
    /// Used memory ratio in [0, 1].
    pub memory_utilization: f64,
    pub uptime_seconds: u64,
    /// `uptime_seconds` rendered as `HH:MM:SS`.
    pub uptime: String,
    pub total_processes: usize,
    pub running_processes: u32,
    /// Ordered by pid. Empty when process collection was skipped.
    pub processes: Vec<ProcessRecord>,
}

impl Snapshot {
    /// Collect a snapshot. Blocks for the duration of the CPU sampling run.
    pub fn collect(
        fs: &ProcFs,
        info: &SystemInfo,
        sampler: &SamplerConfig,
        include_processes: bool,
    ) -> Self {
        let memory_utilization = memory_utilization(fs);
        let uptime_seconds = system::uptime_seconds(fs);
        let total_processes = system::total_process_count(fs);
        let running_processes = system::running_process_count(fs);
        let cpu_utilization = processor::utilization(fs, sampler);

        let processes = if include_processes {
            ProcessBuilder::new(fs).build_all()
        } else {
            Vec::new()
        };

        let snapshot = Self {
            timestamp: Utc::now(),
            system: info.clone(),
            cpu_utilization,
            memory_utilization,
            uptime_seconds,
            // u64 seconds since boot never exceed i64
            uptime: elapsed_time(uptime_seconds as i64).unwrap_or_default(),
            total_processes,
            running_processes,
            processes,
        };
        snapshot.log_pressure();
        debug!(
            cpu = snapshot.cpu_utilization,
            memory = snapshot.memory_utilization,
            processes = snapshot.total_processes,
            running = snapshot.running_processes,
            "snapshot collected"
        );
        snapshot
    }

    fn log_pressure(&self) {
        if self.cpu_utilization > PRESSURE_THRESHOLD {
            warn!(cpu = self.cpu_utilization, "cpu utilization above threshold");
        }
        if self.memory_utilization > PRESSURE_THRESHOLD {
            warn!(memory = self.memory_utilization, "memory utilization above threshold");
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
