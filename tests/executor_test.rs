//! Executor concurrency properties.
//!
//! Each job appends a start marker, sleeps, then appends an end marker to a
//! shared log (single-line appends are atomic under O_APPEND). Replaying the
//! marker stream gives the maximum number of jobs that were ever running at
//! once, which must never exceed the ceiling.
#![cfg(unix)]

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use smelt::build::{CommandJob, ExecOptions, run_jobs};
use smelt::descriptor::FailurePolicy;
use smelt::report::{MemorySink, Reporter, Severity};

fn reporter() -> Reporter {
    Reporter::new(Arc::new(MemorySink::new()), Severity::Error)
}

fn marker_jobs(log: &Path, count: usize, sleep_secs: f32) -> Vec<CommandJob> {
    (0..count)
        .map(|i| {
            CommandJob::shell(&format!(
                "echo 'S {i}' >> {log}; sleep {sleep_secs}; echo 'E {i}' >> {log}",
                log = log.display()
            ))
        })
        .collect()
}

fn max_overlap(log: &Path) -> usize {
    let mut running = 0usize;
    let mut peak = 0usize;
    for line in fs::read_to_string(log).unwrap().lines() {
        if line.starts_with('S') {
            running += 1;
            peak = peak.max(running);
        } else if line.starts_with('E') {
            running -= 1;
        }
    }
    peak
}

#[test]
fn test_ceiling_bounds_running_jobs() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("markers.log");
    let jobs = marker_jobs(&log, 6, 0.3);

    let opts = ExecOptions {
        ceiling: 2,
        policy: FailurePolicy::RunToCompletion,
        timeout: None,
    };
    assert!(run_jobs(&jobs, opts, &reporter()));

    let peak = max_overlap(&log);
    assert!(peak <= 2, "ceiling exceeded: {} jobs ran at once", peak);
    assert!(peak >= 2, "jobs never actually overlapped");
    assert_eq!(
        fs::read_to_string(&log).unwrap().lines().count(),
        12,
        "every job must have run to completion"
    );
}

#[test]
fn test_ceiling_one_serializes_in_list_order() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("markers.log");
    let jobs: Vec<CommandJob> = (0..5)
        .map(|i| CommandJob::shell(&format!("echo {i} >> {}", log.display())))
        .collect();

    assert!(run_jobs(&jobs, ExecOptions::serial(None), &reporter()));

    let order: Vec<String> = fs::read_to_string(&log)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect();
    assert_eq!(order, vec!["0", "1", "2", "3", "4"]);
}

#[test]
fn test_fail_fast_still_lets_inflight_jobs_finish() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("markers.log");

    // job 0 fails quickly while job 1 is already in flight; jobs 2..4 are
    // still queued and must not launch
    let mut jobs = vec![
        CommandJob::shell("sleep 0.1; exit 1"),
        CommandJob::shell(&format!("sleep 0.4; echo inflight >> {}", log.display())),
    ];
    for i in 2..5 {
        jobs.push(CommandJob::shell(&format!(
            "echo queued-{i} >> {}",
            log.display()
        )));
    }

    let opts = ExecOptions {
        ceiling: 2,
        policy: FailurePolicy::FailFast,
        timeout: None,
    };
    assert!(!run_jobs(&jobs, opts, &reporter()));

    let body = fs::read_to_string(&log).unwrap_or_default();
    assert!(
        body.contains("inflight"),
        "an already-launched job must run to exit"
    );
    assert!(!body.contains("queued"), "queued jobs must not launch");
}

#[test]
fn test_timeout_terminates_a_batch_member() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("markers.log");
    let jobs = vec![
        CommandJob::shell(&format!("echo fast >> {}", log.display())),
        CommandJob::shell("sleep 30"),
    ];

    let opts = ExecOptions {
        ceiling: 2,
        policy: FailurePolicy::RunToCompletion,
        timeout: Some(Duration::from_millis(300)),
    };
    let started = std::time::Instant::now();
    assert!(!run_jobs(&jobs, opts, &reporter()));
    assert!(
        started.elapsed() < Duration::from_secs(10),
        "the stuck job must be killed at the deadline"
    );
    assert!(fs::read_to_string(&log).unwrap().contains("fast"));
}
