use procwatch::ProcFs;
use std::path::{Path, PathBuf};
use std::sync::Once;
use tempfile::TempDir;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

static INIT: Once = Once::new();

pub fn init_test_logging() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_test_writer()
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_thread_ids(true)
                    .json(),
            )
            .with(filter)
            .init();
    });
}

#[allow(dead_code)]
pub fn fixture(name: &str) -> &'static str {
    match name {
        "proc_stat" => include_str!("../fixtures/proc_stat"),
        "meminfo" => include_str!("../fixtures/meminfo"),
        "uptime" => include_str!("../fixtures/uptime"),
        "version" => include_str!("../fixtures/version"),
        "cpuinfo" => include_str!("../fixtures/cpuinfo"),
        "os-release" => include_str!("../fixtures/os-release"),
        "passwd" => include_str!("../fixtures/passwd"),
        "pid1_status" => include_str!("../fixtures/pid1_status"),
        "pid1_stat" => include_str!("../fixtures/pid1_stat"),
        "pid1_cmdline" => include_str!("../fixtures/pid1_cmdline"),
        "pid42_status" => include_str!("../fixtures/pid42_status"),
        "pid42_stat" => include_str!("../fixtures/pid42_stat"),
        "pid1000_status" => include_str!("../fixtures/pid1000_status"),
        "pid1000_stat" => include_str!("../fixtures/pid1000_stat"),
        "pid1000_cmdline" => include_str!("../fixtures/pid1000_cmdline"),
        other => panic!("unknown fixture: {other}"),
    }
}

/// A throwaway information tree: `<tmp>/proc`, `<tmp>/etc/os-release` and
/// `<tmp>/etc/passwd`.
#[allow(dead_code)]
pub struct FixtureTree {
    _dir: TempDir,
    proc_root: PathBuf,
    etc: PathBuf,
}

#[allow(dead_code)]
impl FixtureTree {
    /// Empty directories only; every reader should degrade.
    pub fn empty() -> Self {
        let dir = tempfile::tempdir().expect("create tempdir");
        let proc_root = dir.path().join("proc");
        let etc = dir.path().join("etc");
        std::fs::create_dir_all(&proc_root).expect("create proc root");
        std::fs::create_dir_all(&etc).expect("create etc");
        Self {
            _dir: dir,
            proc_root,
            etc,
        }
    }

    /// System files plus processes 1, 42 (kernel thread) and 1000, and a
    /// couple of non-process entries that must be ignored.
    pub fn populated() -> Self {
        let tree = Self::empty();
        for (name, fixture_name) in [
            ("stat", "proc_stat"),
            ("meminfo", "meminfo"),
            ("uptime", "uptime"),
            ("version", "version"),
            ("cpuinfo", "cpuinfo"),
        ] {
            tree.write_proc(name, fixture(fixture_name));
        }
        tree.write_etc("os-release", fixture("os-release"));
        tree.write_etc("passwd", fixture("passwd"));

        tree.add_process(1, Some(fixture("pid1_stat")), Some(fixture("pid1_status")), Some(fixture("pid1_cmdline")));
        tree.add_process(42, Some(fixture("pid42_stat")), Some(fixture("pid42_status")), Some(""));
        tree.add_process(
            1000,
            Some(fixture("pid1000_stat")),
            Some(fixture("pid1000_status")),
            Some(fixture("pid1000_cmdline")),
        );

        std::fs::create_dir_all(tree.proc_root.join("sys")).expect("create sys");
        std::fs::create_dir_all(tree.proc_root.join("12abc")).expect("create mixed dir");
        // A numeric file, not a directory
        tree.write_proc("77", "");
        tree
    }

    pub fn fs(&self) -> ProcFs {
        ProcFs::new(&self.proc_root)
            .with_os_release(self.etc.join("os-release"))
            .with_passwd(self.etc.join("passwd"))
    }

    pub fn proc_root(&self) -> &Path {
        &self.proc_root
    }

    pub fn write_proc(&self, relative: &str, content: &str) {
        let path = self.proc_root.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent");
        }
        std::fs::write(path, content).expect("write proc file");
    }

    pub fn write_etc(&self, name: &str, content: &str) {
        std::fs::write(self.etc.join(name), content).expect("write etc file");
    }

    pub fn add_process(&self, pid: u32, stat: Option<&str>, status: Option<&str>, cmdline: Option<&str>) {
        let dir = self.proc_root.join(pid.to_string());
        std::fs::create_dir_all(&dir).expect("create process dir");
        for (name, content) in [("stat", stat), ("status", status), ("cmdline", cmdline)] {
            if let Some(content) = content {
                std::fs::write(dir.join(name), content).expect("write process file");
            }
        }
    }

    pub fn remove_proc(&self, relative: &str) {
        let path = self.proc_root.join(relative);
        if path.is_dir() {
            std::fs::remove_dir_all(path).expect("remove dir");
        } else {
            std::fs::remove_file(path).expect("remove file");
        }
    }
}
