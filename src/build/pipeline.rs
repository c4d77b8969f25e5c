//! Pipeline coordination.
//!
//! One `Pipeline` executes one build: pre-hooks, clean, directory setup,
//! compile, link, post-process (export + size), post-hooks. Once any stage
//! fails, no further stage is attempted. Every error is resolved into the
//! returned aggregate boolean plus log events; nothing propagates past
//! [`Pipeline::run`].

use std::fs;
use std::io;
use std::path::PathBuf;

use crate::build::command::CommandJob;
use crate::build::compile::Compiler;
use crate::build::exec::{self, ExecOptions};
use crate::build::link::Linker;
use crate::build::objcopy::Copier;
use crate::build::size::Sizer;
use crate::descriptor::ProjectDescriptor;
use crate::error::BuildError;
use crate::report::Reporter;

pub struct Pipeline<'a> {
    desc: &'a ProjectDescriptor,
    reporter: Reporter,
}

impl<'a> Pipeline<'a> {
    pub fn new(desc: &'a ProjectDescriptor, reporter: Reporter) -> Self {
        Self { desc, reporter }
    }

    /// Runs the build to completion and returns the aggregate outcome:
    /// `true` iff every attempted stage succeeded.
    pub fn run(&self) -> bool {
        let desc = self.desc;
        let reporter = &self.reporter;

        reporter.info("beginning...");
        if let Err(e) = desc.validate() {
            reporter.error(e.to_string());
            return false;
        }

        let building = desc.compile || desc.link;
        let clean_only = desc.clean && !building;
        let mut succeeded = true;

        reporter.debug(format!("out file path: {}", desc.artifact_path().display()));
        let export_names = desc.export_names();
        if !export_names.is_empty() {
            reporter.debug(format!("exports: {:?}", export_names));
        }

        if building && let Err(e) = fs::create_dir_all(&desc.root) {
            let err = BuildError::Filesystem {
                path: desc.root.clone(),
                source: e,
            };
            reporter.error(err.to_string());
            succeeded = false;
        }

        if !clean_only && !desc.pre_hooks.is_empty() {
            reporter.info("executing pre-build hooks...");
            if !self.run_hooks(&desc.pre_hooks) {
                succeeded = false;
            }
        }

        if desc.clean {
            reporter.info("cleaning...");
            let build_dir = desc.build_dir();
            match fs::remove_dir_all(&build_dir) {
                Ok(()) => reporter.debug(format!("removed {}", build_dir.display())),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    reporter.warn("build directory not found, nothing to clean");
                }
                Err(e) => {
                    let err = BuildError::Filesystem {
                        path: build_dir,
                        source: e,
                    };
                    reporter.error(err.to_string());
                    succeeded = false;
                }
            }
            // clean-only runs stop here, before the build directory would
            // be recreated
            if !building {
                return self.finish(succeeded);
            }
        }

        if building && succeeded && let Err(e) = fs::create_dir_all(desc.build_dir()) {
            let err = BuildError::Filesystem {
                path: desc.build_dir(),
                source: e,
            };
            reporter.error(err.to_string());
            succeeded = false;
        }

        // The unit scan feeds both stages: compile takes the stale subset,
        // link takes every object in declaration order.
        let mut compiler = None;
        let mut objects: Vec<PathBuf> = Vec::new();
        if building && succeeded {
            match Compiler::prepare(desc) {
                Ok(prepared) => {
                    objects = prepared.object_files();
                    compiler = Some(prepared);
                }
                Err(e) => {
                    reporter.error(e.to_string());
                    succeeded = false;
                }
            }
        }

        if desc.compile
            && succeeded
            && let Some(compiler) = compiler.as_mut()
        {
            succeeded = compiler.run(reporter);
        }

        if desc.link && succeeded {
            let mut linker = Linker::prepare(desc, objects);
            succeeded = linker.run(reporter);
        }

        if building && succeeded {
            let mut copier = Copier::prepare(desc);
            succeeded = copier.run(reporter);
        }

        if building && succeeded {
            let mut sizer = Sizer::prepare(desc);
            succeeded = sizer.run(reporter);
        }

        if !clean_only && succeeded && !desc.post_hooks.is_empty() {
            reporter.info("executing post-build hooks...");
            if !self.run_hooks(&desc.post_hooks) {
                succeeded = false;
            }
        }

        self.finish(succeeded)
    }

    /// Hooks run serially (ceiling 1) so their side effects stay ordered,
    /// at a lowered severity threshold so their commands and output are
    /// visible at default verbosity.
    fn run_hooks(&self, hooks: &[String]) -> bool {
        let jobs: Vec<CommandJob> = hooks
            .iter()
            .map(|line| CommandJob::shell(line).current_dir(&self.desc.root))
            .collect();
        exec::run_jobs(
            &jobs,
            ExecOptions::serial(self.desc.timeout),
            &self.reporter.verbose(),
        )
    }

    fn finish(&self, succeeded: bool) -> bool {
        if succeeded {
            self.reporter.info("complete!");
        } else {
            self.reporter
                .error("one or more stages failed, build halted prematurely");
        }
        succeeded
    }
}
