//! One-shot metrics CLI over the Linux process information tree.
#![forbid(unsafe_code)]

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use procwatch::collect::process::ProcessBuilder;
use procwatch::collect::processor::{self, ProcessorDetection};
use procwatch::format::elapsed_time;
use procwatch::snapshot::{Snapshot, SystemInfo};
use procwatch::{CpuSampler, LogConfig, ProcFs, SamplerConfig, init_logging};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Parser)]
#[command(name = "procwatch", about = "System and process metrics from /proc")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect a full snapshot and print it
    Collect {
        /// Output format (json or pretty)
        #[arg(long, default_value = "json")]
        format: OutputFormat,

        /// Skip the per-process table
        #[arg(long)]
        no_processes: bool,
    },
    /// Print one JSON line per process, ordered by pid
    Processes {
        /// Print at most this many processes
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Print the detected processor descriptors
    Cpus,
    /// Run the CPU sampler once and print the median busy percentage
    Sample {
        /// Number of ticks (overrides PROCWATCH_CPU_SAMPLES)
        #[arg(long)]
        samples: Option<u32>,

        /// Milliseconds between ticks (overrides PROCWATCH_SAMPLE_INTERVAL_MS)
        #[arg(long)]
        interval_ms: Option<u64>,
    },
}

#[derive(ValueEnum, Clone, Copy)]
enum OutputFormat {
    Json,
    Pretty,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut log_config = LogConfig::from_env("info").with_stderr();
    if cli.verbose {
        log_config = log_config.with_level("debug");
    }
    let _logging_guards = init_logging(&log_config)?;

    let (fs, fs_errors) = ProcFs::from_env();
    let (mut sampler, sampler_errors) = SamplerConfig::from_env();
    for error in fs_errors.iter().chain(sampler_errors.iter()) {
        warn!(%error, "ignoring invalid configuration value");
    }
    debug!(root = %fs.root().display(), samples = sampler.samples, "configuration resolved");

    match cli.command {
        Commands::Collect {
            format,
            no_processes,
        } => {
            let system = SystemInfo::detect(&fs);
            let snapshot = Snapshot::collect(&fs, &system, &sampler, !no_processes);
            let output = match format {
                OutputFormat::Json => snapshot.to_json()?,
                OutputFormat::Pretty => snapshot.to_json_pretty()?,
            };
            println!("{}", output);
        }
        Commands::Processes { limit } => {
            let records = ProcessBuilder::new(&fs).build_all();
            let limit = limit.unwrap_or(records.len());
            for record in records.iter().take(limit) {
                let line = json!({
                    "pid": record.pid(),
                    "user": record.user(),
                    "command": record.command(),
                    "ram_mb": record.ram(),
                    "cpu": record.cpu_utilization(),
                    "time": elapsed_time(record.uptime() as i64)
                        .context("rendering process cpu time")?,
                });
                println!("{}", line);
            }
        }
        Commands::Cpus => match processor::detect(&fs) {
            ProcessorDetection::Available(cores) => {
                for (index, core) in cores.iter().enumerate() {
                    println!(
                        "{index}: {} @ {} MHz, {} KB cache",
                        core.model_name(),
                        core.frequency_mhz(),
                        core.cache_size_kb()
                    );
                }
            }
            ProcessorDetection::Unavailable => {
                println!("processor information unavailable");
            }
        },
        Commands::Sample {
            samples,
            interval_ms,
        } => {
            if let Some(samples) = samples {
                sampler.samples = samples;
            }
            if let Some(ms) = interval_ms {
                sampler.interval = Duration::from_millis(ms);
            }
            let median = CpuSampler::new(sampler, |median| {
                debug!(median, "sampler completed");
            })
            .run(&fs);
            println!("{:.2}", median);
        }
    }

    Ok(())
}
