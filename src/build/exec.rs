//! Bounded-parallel process execution.
//!
//! Jobs are spawned onto a dedicated FIFO thread pool sized to the
//! concurrency ceiling: each worker runs exactly one child process at a
//! time, so at most `ceiling` children exist at any instant, jobs launch in
//! list order, and waiting for a free slot blocks instead of polling.
//! Completion order across concurrent jobs is unspecified.

use std::io::Read;
use std::process::{Child, ExitStatus};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use crate::build::command::CommandJob;
use crate::descriptor::FailurePolicy;
use crate::error::BuildError;
use crate::report::Reporter;

const POLL_INTERVAL: Duration = Duration::from_millis(25);

#[derive(Debug, Clone, Copy)]
pub struct ExecOptions {
    /// Maximum number of simultaneously running child processes.
    pub ceiling: usize,
    pub policy: FailurePolicy,
    /// Deadline per job; expiry kills the child and fails the batch.
    pub timeout: Option<Duration>,
}

impl ExecOptions {
    /// One job at a time, run to completion. Hooks and single-job stages
    /// use this so ordering side effects are preserved.
    pub fn serial(timeout: Option<Duration>) -> Self {
        Self {
            ceiling: 1,
            policy: FailurePolicy::RunToCompletion,
            timeout,
        }
    }
}

/// Runs `jobs` under `opts`, streaming captured output to the reporter.
/// Returns `true` iff every job ran and exited zero.
pub fn run_jobs(jobs: &[CommandJob], opts: ExecOptions, reporter: &Reporter) -> bool {
    if jobs.is_empty() {
        return true;
    }

    let pool = match rayon::ThreadPoolBuilder::new()
        .num_threads(opts.ceiling.max(1))
        .build()
    {
        Ok(pool) => pool,
        Err(e) => {
            reporter.error(format!("failed to start worker pool: {}", e));
            return false;
        }
    };

    let halted = AtomicBool::new(false);
    let failures = AtomicUsize::new(0);
    reporter.batch_started(jobs.len());

    pool.scope_fifo(|scope| {
        let halted = &halted;
        let failures = &failures;
        for job in jobs {
            scope.spawn_fifo(move |_| {
                if opts.policy == FailurePolicy::FailFast && halted.load(Ordering::SeqCst) {
                    reporter.debug(format!("not launched: {}", job));
                    reporter.batch_advanced();
                    return;
                }
                if !run_one(job, opts.timeout, reporter) {
                    failures.fetch_add(1, Ordering::SeqCst);
                    halted.store(true, Ordering::SeqCst);
                }
                reporter.batch_advanced();
            });
        }
    });

    reporter.batch_finished();
    failures.load(Ordering::SeqCst) == 0
}

fn run_one(job: &CommandJob, timeout: Option<Duration>, reporter: &Reporter) -> bool {
    reporter.debug(job.to_string());

    let mut child = match job.spawn() {
        Ok(child) => child,
        Err(e) => {
            let err = BuildError::Process(format!("failed to spawn {}: {}", job.program, e));
            reporter.error(err.to_string());
            return false;
        }
    };

    // Drain both pipes on their own threads so a chatty child can't fill a
    // pipe and deadlock against our wait.
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let stdout_reader = thread::spawn(move || drain(stdout));
    let stderr_reader = thread::spawn(move || drain(stderr));

    let waited = wait_with_deadline(&mut child, timeout);

    // A killed job's grandchildren may still hold the pipe write ends open,
    // so the readers would block past the deadline; their output is dropped
    // instead of joined.
    let timed_out = matches!(waited, Ok((_, true)));
    let (output, errors) = if timed_out {
        (String::new(), String::new())
    } else {
        (
            stdout_reader.join().unwrap_or_default(),
            stderr_reader.join().unwrap_or_default(),
        )
    };

    // Output presence is independent of exit status; even successful
    // compilers write notes to stderr.
    if !output.trim().is_empty() {
        reporter.info(output.trim_end().to_string());
    }
    if !errors.trim().is_empty() {
        reporter.warn(format!("\n{}", errors.trim_end()));
    }

    match waited {
        Ok((_, true)) => {
            let err = BuildError::Timeout(format!("killed after deadline: {}", job));
            reporter.error(err.to_string());
            false
        }
        Ok((status, false)) if status.success() => {
            reporter.debug("success");
            true
        }
        Ok((status, false)) => {
            let err = BuildError::Process(format!(
                "exited with {}: {}",
                status.code().map_or("signal".to_string(), |c| c.to_string()),
                job
            ));
            reporter.error(err.to_string());
            false
        }
        Err(e) => {
            let err = BuildError::Process(format!("failed to wait on {}: {}", job.program, e));
            reporter.error(err.to_string());
            false
        }
    }
}

fn drain(pipe: Option<impl Read>) -> String {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        let _ = pipe.read_to_end(&mut buf);
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// Blocks until the child exits. With a timeout the wait degrades to a
/// coarse try_wait/sleep poll; on expiry the child is killed and reaped,
/// and the second field of the result is `true`.
fn wait_with_deadline(
    child: &mut Child,
    timeout: Option<Duration>,
) -> std::io::Result<(ExitStatus, bool)> {
    let Some(timeout) = timeout else {
        return child.wait().map(|status| (status, false));
    };

    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok((status, false));
        }
        if Instant::now() >= deadline {
            child.kill().ok();
            let status = child.wait()?;
            return Ok((status, true));
        }
        thread::sleep(POLL_INTERVAL);
    }
}
