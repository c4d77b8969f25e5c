//! Size report stage driver.
//!
//! Runs the toolchain's `size` over the linked artifact, inside the build
//! subdirectory. An unrecognized report format produces no job and the
//! stage succeeds trivially.

use crate::build::command::{self, CommandJob};
use crate::build::exec::{self, ExecOptions};
use crate::descriptor::ProjectDescriptor;
use crate::report::Reporter;

pub struct Sizer<'a> {
    desc: &'a ProjectDescriptor,
    job: Option<CommandJob>,
    /// `None` until the stage runs.
    pub succeeded: Option<bool>,
}

impl<'a> Sizer<'a> {
    pub fn prepare(desc: &'a ProjectDescriptor) -> Self {
        let job = command::size_job(
            &desc.tool(&desc.size),
            &desc.size_format,
            &desc.artifact_name(),
        )
        .map(|job| job.current_dir(desc.build_dir()));

        Self {
            desc,
            job,
            succeeded: None,
        }
    }

    pub fn run(&mut self, reporter: &Reporter) -> bool {
        let Some(job) = self.job.clone() else {
            self.succeeded = Some(true);
            return true;
        };
        reporter.info("sizing...");
        let ok = exec::run_jobs(&[job], ExecOptions::serial(self.desc.timeout), reporter);
        self.succeeded = Some(ok);
        ok
    }
}
