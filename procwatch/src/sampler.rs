//! Median-smoothed CPU utilization.
//!
//! A [`CpuSampler`] is a two-state machine: `Sampling { ticks }` while it
//! collects readings and `Done(median)` once the configured number of ticks
//! has been recorded, at which point the completion callback fires exactly
//! once. [`CpuSampler::record`] advances it by one tick, so any scheduler can
//! drive it; [`CpuSampler::run`] is the blocking driver that reads /proc/stat
//! and sleeps between ticks.

use crate::collect::cpu::read_instant_utilization;
use crate::fs::ProcFs;
use procwatch_common::{EnvError, EnvParser};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_SAMPLES: u32 = 10;
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(100);

/// Tick count and cadence of a sampling run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SamplerConfig {
    pub samples: u32,
    pub interval: Duration,
}

impl SamplerConfig {
    pub fn new(samples: u32, interval: Duration) -> Self {
        Self { samples, interval }
    }

    /// Read `PROCWATCH_CPU_SAMPLES` and `PROCWATCH_SAMPLE_INTERVAL_MS`.
    pub fn from_env() -> (Self, Vec<EnvError>) {
        let mut parser = EnvParser::new();
        let samples = parser
            .get_u32_range("CPU_SAMPLES", DEFAULT_SAMPLES, 1, 1000)
            .value;
        let interval_ms = parser
            .get_u64_range("SAMPLE_INTERVAL_MS", DEFAULT_INTERVAL.as_millis() as u64, 1, 10_000)
            .value;
        (
            Self::new(samples, Duration::from_millis(interval_ms)),
            parser.take_errors(),
        )
    }
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLES, DEFAULT_INTERVAL)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SamplerState {
    Sampling { ticks: u32 },
    Done(f64),
}

/// Sort ascending and take the element at `len / 2`.
///
/// For an even count this is the upper-middle element, not an average.
/// An empty set reduces to 0.0.
pub fn median(mut readings: Vec<f64>) -> f64 {
    if readings.is_empty() {
        return 0.0;
    }
    readings.sort_by(f64::total_cmp);
    readings[readings.len() / 2]
}

pub struct CpuSampler<F: FnOnce(f64)> {
    config: SamplerConfig,
    readings: Vec<f64>,
    state: SamplerState,
    on_complete: Option<F>,
}

impl<F: FnOnce(f64)> CpuSampler<F> {
    pub fn new(config: SamplerConfig, on_complete: F) -> Self {
        Self {
            readings: Vec::with_capacity(config.samples as usize),
            config,
            state: SamplerState::Sampling { ticks: 0 },
            on_complete: Some(on_complete),
        }
    }

    pub fn state(&self) -> SamplerState {
        self.state
    }

    /// Readings retained so far (strictly positive only).
    pub fn readings(&self) -> &[f64] {
        &self.readings
    }

    /// Record one tick. Non-positive readings count as a tick but are not
    /// retained. Has no effect once the sampler is done.
    pub fn record(&mut self, reading: f64) -> SamplerState {
        if let SamplerState::Sampling { ticks } = self.state {
            if reading > 0.0 && reading.is_finite() {
                self.readings.push(reading);
            }
            let ticks = ticks + 1;
            if ticks >= self.config.samples {
                self.finish();
            } else {
                self.state = SamplerState::Sampling { ticks };
            }
        }
        self.state
    }

    fn finish(&mut self) {
        let retained = self.readings.len();
        let value = median(std::mem::take(&mut self.readings));
        debug!(retained, median = value, "cpu sampling done");
        self.state = SamplerState::Done(value);
        if let Some(on_complete) = self.on_complete.take() {
            on_complete(value);
        }
    }

    /// Drive the sampler to completion with readings from `read`, sleeping
    /// the configured interval between ticks. Returns the median.
    pub fn run_with<R: FnMut() -> f64>(mut self, mut read: R) -> f64 {
        if self.config.samples == 0 {
            self.finish();
        }
        while let SamplerState::Sampling { .. } = self.state {
            if let SamplerState::Sampling { .. } = self.record(read()) {
                std::thread::sleep(self.config.interval);
            }
        }
        match self.state {
            SamplerState::Done(value) => value,
            SamplerState::Sampling { .. } => 0.0,
        }
    }

    /// Drive the sampler against `<root>/stat`.
    pub fn run(self, fs: &ProcFs) -> f64 {
        self.run_with(|| read_instant_utilization(fs))
    }
}
