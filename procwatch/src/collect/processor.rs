//! Logical core descriptors from /proc/cpuinfo.
//!
//! Each `processor\t:` line opens a block. Within a block only the model
//! name, clock frequency and cache size are captured; any of them missing
//! before the next block (or end of file) keeps its default value.

use crate::fs::{CPUINFO_FILENAME, ProcFs};
use crate::sampler::{CpuSampler, SamplerConfig};
use crate::text::{ltrim, parse_trimmed, rtrim, trim};
use serde::{Deserialize, Serialize};
use tracing::debug;

const PROCESSOR_MARKER: &str = "processor\t:";
const MODEL_NAME_KEY: &str = "model name";
const FREQUENCY_KEY: &str = "cpu MHz";
const CACHE_SIZE_KEY: &str = "cache size";
const CACHE_UNIT: &str = "KB";

/// Static identity of one logical core.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessorDescriptor {
    model_name: String,
    frequency_mhz: f64,
    cache_size_kb: u32,
}

impl ProcessorDescriptor {
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Clock frequency rounded to the nearest MHz.
    pub fn frequency_mhz(&self) -> f64 {
        self.frequency_mhz
    }

    pub fn cache_size_kb(&self) -> u32 {
        self.cache_size_kb
    }
}

/// Outcome of a detection pass.
///
/// `Unavailable` means the cpuinfo file could not be opened, which is not the
/// same as an opened file listing no cores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "cores", rename_all = "snake_case")]
pub enum ProcessorDetection {
    Unavailable,
    Available(Vec<ProcessorDescriptor>),
}

impl ProcessorDetection {
    /// Number of detected cores, falling back to 1 when unknown or zero.
    pub fn core_count(&self) -> usize {
        match self {
            Self::Available(cores) if !cores.is_empty() => cores.len(),
            _ => 1,
        }
    }

    /// The first descriptor, if any.
    pub fn primary(&self) -> Option<&ProcessorDescriptor> {
        match self {
            Self::Available(cores) => cores.first(),
            Self::Unavailable => None,
        }
    }

    pub fn cores(&self) -> &[ProcessorDescriptor] {
        match self {
            Self::Available(cores) => cores,
            Self::Unavailable => &[],
        }
    }
}

/// Split a cpuinfo line into its trimmed key and value.
fn parse_line(line: &str) -> (&str, &str) {
    match line.split_once(':') {
        Some((name, value)) => (rtrim(name), ltrim(value)),
        None => (rtrim(line), ""),
    }
}

/// Leading integer of a `3072 KB` style cache value.
fn parse_cache_size(value: &str) -> Option<u32> {
    let number = match value.find(CACHE_UNIT) {
        Some(pos) => &value[..pos],
        None => value,
    };
    parse_trimmed(number)
}

/// Fills one descriptor; `found` counts captured fields.
#[derive(Default)]
struct BlockParser {
    current: ProcessorDescriptor,
    found: u8,
}

impl BlockParser {
    fn complete(&self) -> bool {
        self.found >= 3
    }

    fn feed(&mut self, line: &str) {
        let (name, value) = parse_line(line);
        match name {
            MODEL_NAME_KEY => {
                self.current.model_name = trim(value).to_string();
                self.found += 1;
            }
            FREQUENCY_KEY => {
                self.current.frequency_mhz = parse_trimmed::<f64>(value)
                    .map(f64::round)
                    .unwrap_or_default();
                self.found += 1;
            }
            CACHE_SIZE_KEY => {
                self.current.cache_size_kb = parse_cache_size(value).unwrap_or_default();
                self.found += 1;
            }
            _ => {}
        }
    }
}

/// Parse cpuinfo content into one descriptor per `processor` block.
pub fn parse_cpuinfo(content: &str) -> Vec<ProcessorDescriptor> {
    let mut cores = Vec::new();
    let mut block: Option<BlockParser> = None;

    for line in content.lines() {
        if line.contains(PROCESSOR_MARKER) {
            if let Some(done) = block.take() {
                cores.push(done.current);
            }
            block = Some(BlockParser::default());
            continue;
        }
        if let Some(parser) = block.as_mut()
            && !parser.complete()
        {
            parser.feed(line);
        }
    }
    if let Some(done) = block {
        cores.push(done.current);
    }
    cores
}

/// Detect every logical core listed in `<root>/cpuinfo`.
pub fn detect(fs: &ProcFs) -> ProcessorDetection {
    match std::fs::read_to_string(fs.file(CPUINFO_FILENAME)) {
        Ok(content) => {
            let cores = parse_cpuinfo(&content);
            debug!(cores = cores.len(), "processor descriptors detected");
            ProcessorDetection::Available(cores)
        }
        Err(e) => {
            debug!(error = %e, "cpuinfo unavailable");
            ProcessorDetection::Unavailable
        }
    }
}

/// Smoothed system-wide busy ratio in [0, 1].
///
/// Blocks for `config.samples` ticks of `config.interval`.
pub fn utilization(fs: &ProcFs, config: &SamplerConfig) -> f64 {
    let mut result = 0.0;
    CpuSampler::new(config.clone(), |median| result = median).run(fs);
    result / 100.0
}
