//! Export stage driver.
//!
//! Converts the linked artifact into each requested export format via
//! objcopy. Operates entirely inside the build subdirectory, referencing
//! the artifact by base name. Unrecognized format names contribute no job;
//! an empty batch is a trivial success.

use crate::build::command::{self, CommandJob};
use crate::build::exec::{self, ExecOptions};
use crate::descriptor::ProjectDescriptor;
use crate::report::Reporter;

pub struct Copier<'a> {
    desc: &'a ProjectDescriptor,
    jobs: Vec<CommandJob>,
    /// `None` until the stage runs.
    pub succeeded: Option<bool>,
}

impl<'a> Copier<'a> {
    pub fn prepare(desc: &'a ProjectDescriptor) -> Self {
        let jobs = command::objcopy_jobs(
            &desc.tool(&desc.objcopy),
            &desc.artifact_name(),
            &desc.name,
            &desc.exports,
        )
        .into_iter()
        .map(|job| job.current_dir(desc.build_dir()))
        .collect();

        Self {
            desc,
            jobs,
            succeeded: None,
        }
    }

    pub fn run(&mut self, reporter: &Reporter) -> bool {
        if self.jobs.is_empty() {
            self.succeeded = Some(true);
            return true;
        }
        reporter.info("copying...");
        let ok = exec::run_jobs(
            &self.jobs,
            ExecOptions::serial(self.desc.timeout),
            &reporter.verbose(),
        );
        self.succeeded = Some(ok);
        ok
    }
}
