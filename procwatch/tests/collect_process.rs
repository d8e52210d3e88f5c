mod common;

use common::{FixtureTree, fixture, init_test_logging};
use procwatch::collect::process::{self, ProcessBuilder};
use procwatch::{ProcessError, ProcessRecord};
use tracing::info;

#[test]
fn test_build_all_from_fixture_tree() {
    init_test_logging();
    info!(test = "test_build_all_from_fixture_tree", phase = "setup");

    let tree = FixtureTree::populated();
    let fs = tree.fs();
    let builder = ProcessBuilder::with_baseline(&fs, 1000, 100);

    let records = builder.build_all();
    let pids: Vec<u32> = records.iter().map(ProcessRecord::pid).collect();
    info!(test = "test_build_all_from_fixture_tree", phase = "assert", ?pids);
    assert_eq!(pids, vec![1, 42, 1000]);

    let init = &records[0];
    assert_eq!(init.user(), "root");
    assert_eq!(init.command(), "/sbin/init");
    assert_eq!(init.ram(), "164.5");
    assert!((init.cpu_utilization() - 0.42).abs() < 1e-9);
    assert_eq!(init.uptime(), 252);

    // Kernel thread: empty cmdline, no VmSize
    let kworker = &records[1];
    assert_eq!(kworker.user(), "root");
    assert_eq!(kworker.command(), "kworker/0:1H");
    assert_eq!(kworker.ram(), "");
    assert!((kworker.cpu_utilization() - 0.003).abs() < 1e-9);
    assert_eq!(kworker.uptime(), 1);

    let content = &records[2];
    assert_eq!(content.user(), "alice");
    assert_eq!(content.command(), "/usr/lib/firefox/firefox");
    assert_eq!(content.ram(), "1.9");
    assert!((content.cpu_utilization() - 0.1).abs() < 1e-9);
    assert_eq!(content.uptime(), 60);

    info!(
        test = "test_build_all_from_fixture_tree",
        phase = "complete",
        status = "passed"
    );
}

#[test]
fn test_builder_reads_live_baseline() {
    init_test_logging();

    let tree = FixtureTree::populated();
    let fs = tree.fs();
    // accounting total 22820 over two detected cores
    let builder = ProcessBuilder::new(&fs);
    assert_eq!(builder.baseline(), 11410);
}

#[test]
fn test_build_rejects_non_numeric_identifier() {
    init_test_logging();
    info!(test = "test_build_rejects_non_numeric_identifier", phase = "setup");

    let tree = FixtureTree::populated();
    let fs = tree.fs();

    let err = process::build(&fs, &tree.proc_root().join("abc")).expect_err("abc is not a pid");
    assert_eq!(err, ProcessError::InvalidIdentifier("abc".to_string()));
    assert!(err.to_string().contains("abc"));

    let record = process::build(&fs, &tree.proc_root().join("1")).expect("pid 1 builds");
    assert_eq!(record.pid(), 1);

    info!(
        test = "test_build_rejects_non_numeric_identifier",
        phase = "complete",
        status = "passed"
    );
}

#[test]
fn test_partial_process_directory_degrades_per_field() {
    init_test_logging();

    let tree = FixtureTree::populated();
    let fs = tree.fs();
    // Status only, with a uid that has no account
    tree.add_process(
        3000,
        Some("3000 (short) S 1 2 3"),
        Some("Name:\tghost\nUid:\t4242\t4242\t4242\t4242\nVmSize:\t1024 kB\n"),
        None,
    );
    let builder = ProcessBuilder::with_baseline(&fs, 1000, 100);
    let record = builder
        .build(&tree.proc_root().join("3000"))
        .expect("numeric dir builds");

    assert_eq!(record.user(), "");
    assert_eq!(record.command(), "ghost");
    assert_eq!(record.ram(), "1.0");
    assert_eq!(record.cpu_utilization(), 0.0);
    assert_eq!(record.uptime(), 0);
}

#[test]
fn test_vanished_process_keeps_identity() {
    init_test_logging();

    let tree = FixtureTree::populated();
    let fs = tree.fs();
    let builder = ProcessBuilder::with_baseline(&fs, 1000, 100);
    let dir = tree.proc_root().join("1000");
    tree.remove_proc("1000");

    let record = builder.build(&dir).expect("identity comes from the name");
    assert_eq!(record.pid(), 1000);
    assert_eq!(record.command(), "");
    assert_eq!(builder.build_all().len(), 2);
}

#[test]
fn test_missing_passwd_leaves_user_empty() {
    init_test_logging();

    let tree = FixtureTree::populated();
    tree.write_etc("passwd", "");
    let fs = tree.fs();
    let records = ProcessBuilder::with_baseline(&fs, 1000, 100).build_all();
    assert!(records.iter().all(|r| r.user().is_empty()));
}

#[test]
fn test_record_serializes_fields() {
    init_test_logging();

    let tree = FixtureTree::populated();
    let fs = tree.fs();
    let record = ProcessBuilder::with_baseline(&fs, 1000, 100)
        .build(&tree.proc_root().join("1"))
        .expect("build");
    let json = serde_json::to_value(&record).expect("serialize");
    assert_eq!(json["pid"], 1);
    assert_eq!(json["user"], "root");
    assert_eq!(json["ram"], "164.5");
    assert_eq!(fixture("pid1_cmdline").split('\0').next(), json["command"].as_str());
}

#[test]
fn test_extreme_counters_degrade_without_panicking() {
    init_test_logging();
    info!(test = "test_extreme_counters_degrade_without_panicking", phase = "setup");

    let tree = FixtureTree::populated();
    tree.write_proc("stat", "cpu  10 0 0 18446744073709551615 0 0 0 0 0 0\nprocs_running 1\n");
    let max = i64::MAX;
    tree.add_process(
        2000,
        Some(&format!(
            "2000 (spin) R 1 1 1 0 -1 0 0 0 0 0 {max} {max} 0 0 20 0 1 0 100 0 0"
        )),
        Some("Name:\tspin\nUid:\t0\t0\t0\t0\n"),
        None,
    );
    let fs = tree.fs();

    let builder = ProcessBuilder::new(&fs);
    assert_eq!(builder.baseline(), u64::MAX / 2);

    let record = builder
        .build(&tree.proc_root().join("2000"))
        .expect("numeric dir builds");
    info!(
        test = "test_extreme_counters_degrade_without_panicking",
        phase = "assert",
        cpu = record.cpu_utilization(),
        uptime = record.uptime()
    );
    assert!((0.0..=1.0).contains(&record.cpu_utilization()));
    assert!(record.uptime() > 0);

    info!(
        test = "test_extreme_counters_degrade_without_panicking",
        phase = "complete",
        status = "passed"
    );
}

#[test]
fn test_build_rejects_pid_zero() {
    init_test_logging();

    let tree = FixtureTree::populated();
    tree.add_process(0, None, Some("Name:\tswapper\n"), None);
    let fs = tree.fs();
    let err = process::build(&fs, &tree.proc_root().join("0")).expect_err("pid 0 is rejected");
    assert_eq!(err, ProcessError::InvalidIdentifier("0".to_string()));
    // Listing still sees the directory, but the refresh skips it
    let pids: Vec<u32> = ProcessBuilder::with_baseline(&fs, 1000, 100)
        .build_all()
        .iter()
        .map(ProcessRecord::pid)
        .collect();
    assert_eq!(pids, vec![1, 42, 1000]);
}
