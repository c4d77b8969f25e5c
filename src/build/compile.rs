//! Compile stage driver.
//!
//! Scans declared sources for staleness, synthesizes one compile job per
//! stale unit, creates the nested object directories (the compiler won't),
//! and hands the batch to the executor. The full object list, stale or not,
//! is kept in declaration order for the linker.

use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};

use crate::build::command::{self, CommandJob};
use crate::build::exec::{self, ExecOptions};
use crate::build::stale::{self, TranslationUnit};
use crate::descriptor::ProjectDescriptor;
use crate::error::BuildError;
use crate::report::Reporter;

pub struct Compiler<'a> {
    desc: &'a ProjectDescriptor,
    units: Vec<TranslationUnit>,
    jobs: Vec<CommandJob>,
    clang_entries: Vec<serde_json::Value>,
    /// `None` until the stage runs.
    pub succeeded: Option<bool>,
}

impl<'a> Compiler<'a> {
    /// Scans sources and synthesizes the stale-job batch. Fails fast on a
    /// missing source file; nothing is spawned here.
    pub fn prepare(desc: &'a ProjectDescriptor) -> Result<Self, BuildError> {
        let units = stale::scan_units(&desc.root, Path::new(&desc.name), &desc.sources)?;

        let compiler_bin = desc.tool(&desc.compiler);
        let flags: Vec<String> = desc.flags.iter().chain(&desc.cflags).cloned().collect();
        let directory = desc.root.display().to_string();

        let mut jobs = Vec::new();
        let mut clang_entries = Vec::new();
        for unit in &units {
            let job = command::compile_job(
                &compiler_bin,
                &unit.source,
                &unit.object,
                &flags,
                &desc.includes,
            )
            .current_dir(&desc.root);

            clang_entries.push(json!({
                "directory": directory,
                "command": job.to_string(),
                "file": unit.source.display().to_string(),
            }));

            if unit.is_stale(desc.force) {
                jobs.push(job);
            }
        }

        Ok(Self {
            desc,
            units,
            jobs,
            clang_entries,
            succeeded: None,
        })
    }

    /// Object paths for every declared source, in declaration order.
    pub fn object_files(&self) -> Vec<PathBuf> {
        self.units.iter().map(|u| u.object.clone()).collect()
    }

    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }

    pub fn run(&mut self, reporter: &Reporter) -> bool {
        reporter.info("compiling...");

        for unit in &self.units {
            if let Some(parent) = unit.object.parent() {
                let dir = self.desc.root.join(parent);
                if let Err(e) = fs::create_dir_all(&dir) {
                    let err = BuildError::Filesystem {
                        path: dir,
                        source: e,
                    };
                    reporter.error(err.to_string());
                    self.succeeded = Some(false);
                    return false;
                }
            }
        }

        self.write_compile_commands(reporter);

        if self.jobs.is_empty() {
            reporter.debug("all objects up to date");
        }
        let ok = exec::run_jobs(
            &self.jobs,
            ExecOptions {
                ceiling: self.desc.jobs,
                policy: self.desc.policy(),
                timeout: self.desc.timeout,
            },
            reporter,
        );
        self.succeeded = Some(ok);
        ok
    }

    /// Emits `compile_commands.json` into the build directory, one entry per
    /// translation unit whether stale or not. Informational only; a write
    /// failure is a warning, never a build failure.
    fn write_compile_commands(&self, reporter: &Reporter) {
        let path = self.desc.build_dir().join("compile_commands.json");
        match serde_json::to_string_pretty(&self.clang_entries) {
            Ok(body) => {
                if let Err(e) = fs::write(&path, body) {
                    reporter.warn(format!(
                        "could not write {}: {}",
                        path.display(),
                        e
                    ));
                }
            }
            Err(e) => reporter.warn(format!("could not encode compile commands: {}", e)),
        }
    }
}
