//! Live system and per-process metrics read from the Linux `/proc` tree.
//!
//! Every reader re-opens its source on each call. Missing or malformed input
//! degrades to a zero or empty value; the only hard error is asking for a
//! process record from a directory whose name is not a pid.

pub mod collect;
pub mod format;
pub mod fs;
pub mod sampler;
pub mod snapshot;
pub mod text;

pub use collect::process::{ProcessError, ProcessRecord};
pub use collect::processor::{ProcessorDescriptor, ProcessorDetection};
pub use fs::ProcFs;
pub use sampler::{CpuSampler, SamplerConfig, SamplerState};
pub use procwatch_common::{LogConfig, init_logging};
