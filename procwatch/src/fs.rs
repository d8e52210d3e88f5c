//! Locations of the files the collectors read.

use procwatch_common::{EnvError, EnvParser};
use std::path::{Path, PathBuf};

pub const DEFAULT_PROC_ROOT: &str = "/proc";
pub const DEFAULT_OS_RELEASE: &str = "/etc/os-release";
pub const DEFAULT_PASSWD: &str = "/etc/passwd";

pub const STAT_FILENAME: &str = "stat";
pub const STATUS_FILENAME: &str = "status";
pub const CMDLINE_FILENAME: &str = "cmdline";
pub const MEMINFO_FILENAME: &str = "meminfo";
pub const UPTIME_FILENAME: &str = "uptime";
pub const VERSION_FILENAME: &str = "version";
pub const CPUINFO_FILENAME: &str = "cpuinfo";

/// Roots of the process information tree and the two `/etc` files.
///
/// Holds paths only. Nothing read through it is cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcFs {
    root: PathBuf,
    os_release: PathBuf,
    passwd: PathBuf,
}

impl ProcFs {
    /// A tree rooted at `root`, with the `/etc` files at their usual places.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            os_release: PathBuf::from(DEFAULT_OS_RELEASE),
            passwd: PathBuf::from(DEFAULT_PASSWD),
        }
    }

    pub fn with_os_release(mut self, path: impl Into<PathBuf>) -> Self {
        self.os_release = path.into();
        self
    }

    pub fn with_passwd(mut self, path: impl Into<PathBuf>) -> Self {
        self.passwd = path.into();
        self
    }

    /// Resolve the roots from `PROCWATCH_PROC_ROOT`, `PROCWATCH_OS_RELEASE`
    /// and `PROCWATCH_PASSWD`. Invalid entries are returned alongside.
    pub fn from_env() -> (Self, Vec<EnvError>) {
        let mut parser = EnvParser::new();
        let root = parser.get_path("PROC_ROOT", DEFAULT_PROC_ROOT, true).value;
        let os_release = parser.get_path("OS_RELEASE", DEFAULT_OS_RELEASE, false).value;
        let passwd = parser.get_path("PASSWD", DEFAULT_PASSWD, false).value;
        let fs = Self {
            root,
            os_release,
            passwd,
        };
        (fs, parser.take_errors())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn os_release(&self) -> &Path {
        &self.os_release
    }

    pub fn passwd(&self) -> &Path {
        &self.passwd
    }

    /// `<root>/<name>`, e.g. `/proc/stat`.
    pub fn file(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// `<root>/<pid>`.
    pub fn process_dir(&self, pid: u32) -> PathBuf {
        self.root.join(pid.to_string())
    }
}

impl Default for ProcFs {
    fn default() -> Self {
        Self::new(DEFAULT_PROC_ROOT)
    }
}
