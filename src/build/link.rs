//! Link stage driver.
//!
//! Always links when the stage runs: the input is the full object list from
//! the compile scan, in declaration order, regardless of how many objects
//! were actually recompiled.

use std::fs;
use std::path::PathBuf;
use std::slice;

use crate::build::command::{self, CommandJob};
use crate::build::exec::{self, ExecOptions};
use crate::descriptor::ProjectDescriptor;
use crate::error::BuildError;
use crate::report::Reporter;

pub struct Linker<'a> {
    desc: &'a ProjectDescriptor,
    job: CommandJob,
    /// Linked artifact path, relative to the project root.
    pub out_file: PathBuf,
    /// `None` until the stage runs.
    pub succeeded: Option<bool>,
}

impl<'a> Linker<'a> {
    /// Synthesizes the link job from the full object list. Script
    /// extensions were already validated by the descriptor.
    pub fn prepare(desc: &'a ProjectDescriptor, objects: Vec<PathBuf>) -> Self {
        let out_file = PathBuf::from(&desc.name).join(desc.artifact_name());
        let flags: Vec<String> = desc.flags.iter().chain(&desc.lflags).cloned().collect();
        let job = command::link_job(
            &desc.tool(&desc.linker),
            &out_file,
            &flags,
            &desc.lscripts,
            &objects,
        )
        .current_dir(&desc.root);

        Self {
            desc,
            job,
            out_file,
            succeeded: None,
        }
    }

    pub fn run(&mut self, reporter: &Reporter) -> bool {
        reporter.info("linking...");

        let build_dir = self.desc.build_dir();
        if let Err(e) = fs::create_dir_all(&build_dir) {
            let err = BuildError::Filesystem {
                path: build_dir,
                source: e,
            };
            reporter.error(err.to_string());
            self.succeeded = Some(false);
            return false;
        }

        let ok = exec::run_jobs(
            slice::from_ref(&self.job),
            ExecOptions::serial(self.desc.timeout),
            reporter,
        );
        self.succeeded = Some(ok);
        ok
    }
}
