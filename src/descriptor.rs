//! The fully resolved project descriptor the pipeline consumes.
//!
//! A descriptor is constructed once per invocation (by the manifest layer or
//! directly by an embedder) and read-only afterwards. Validation runs before
//! any process is spawned.

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use crate::error::BuildError;

/// Linker scripts must carry this extension; anything else is rejected
/// during validation.
pub const LINKER_SCRIPT_EXT: &str = "ld";

/// What the executor does with jobs still queued when one fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Launch and await every job, report aggregate failure at the end.
    /// Default: jobs already in flight are never killed mid-write.
    RunToCompletion,
    /// Stop launching not-yet-started jobs after the first failure.
    /// In-flight jobs still run to exit.
    FailFast,
}

#[derive(Debug, Clone)]
pub struct ProjectDescriptor {
    /// Logical target name, used verbatim as the build subdirectory.
    pub name: String,
    /// Project root; every relative path below resolves against it.
    pub root: PathBuf,
    /// Optional prefix directory for all tool binaries.
    pub toolchain_path: Option<PathBuf>,
    pub compiler: String,
    pub linker: String,
    pub objcopy: String,
    pub size: String,
    /// Flags shared by compile and link.
    pub flags: Vec<String>,
    /// Compile-only flags, appended after `flags`.
    pub cflags: Vec<String>,
    /// Link-only flags, appended after `flags`.
    pub lflags: Vec<String>,
    pub sources: Vec<PathBuf>,
    pub includes: Vec<PathBuf>,
    pub lscripts: Vec<PathBuf>,
    /// Extension of the linked artifact (`<name>.<out_extension>`).
    pub out_extension: String,
    /// Requested export formats, e.g. "hex", "bin".
    pub exports: Vec<String>,
    /// Size report format: "dec" or "hex".
    pub size_format: String,
    pub pre_hooks: Vec<String>,
    pub post_hooks: Vec<String>,
    pub compile: bool,
    pub link: bool,
    pub clean: bool,
    pub force: bool,
    /// Concurrency ceiling for compile jobs.
    pub jobs: usize,
    pub fail_fast: bool,
    /// Caller-supplied deadline per spawned command.
    pub timeout: Option<Duration>,
}

impl ProjectDescriptor {
    /// A descriptor with the stock GCC toolchain names, rooted at the
    /// current directory, building with every logical core.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            root: PathBuf::from("."),
            toolchain_path: None,
            compiler: "gcc".to_string(),
            linker: "gcc".to_string(),
            objcopy: "objcopy".to_string(),
            size: "size".to_string(),
            flags: Vec::new(),
            cflags: Vec::new(),
            lflags: Vec::new(),
            sources: Vec::new(),
            includes: Vec::new(),
            lscripts: Vec::new(),
            out_extension: "out".to_string(),
            exports: Vec::new(),
            size_format: "dec".to_string(),
            pre_hooks: Vec::new(),
            post_hooks: Vec::new(),
            compile: true,
            link: true,
            clean: false,
            force: false,
            jobs: default_jobs(),
            fail_fast: false,
            timeout: None,
        }
    }

    /// Build subdirectory, relative to the root.
    pub fn build_dir(&self) -> PathBuf {
        self.root.join(&self.name)
    }

    /// Base name of the linked artifact, e.g. `firmware.out`.
    pub fn artifact_name(&self) -> String {
        format!("{}.{}", self.name, self.out_extension)
    }

    pub fn artifact_path(&self) -> PathBuf {
        self.build_dir().join(self.artifact_name())
    }

    /// Export artifact base names, one per requested format, in order.
    pub fn export_names(&self) -> Vec<String> {
        self.exports
            .iter()
            .map(|e| format!("{}.{}", self.name, e))
            .collect()
    }

    /// Resolves a tool binary name against the toolchain prefix, if any.
    pub fn tool(&self, binary: &str) -> String {
        match &self.toolchain_path {
            Some(prefix) => prefix.join(binary).to_string_lossy().into_owned(),
            None => binary.to_string(),
        }
    }

    pub fn policy(&self) -> FailurePolicy {
        if self.fail_fast {
            FailurePolicy::FailFast
        } else {
            FailurePolicy::RunToCompletion
        }
    }

    /// Rejects descriptors that would misbehave before anything runs:
    /// names that escape the build directory and linker scripts with the
    /// wrong extension.
    pub fn validate(&self) -> Result<(), BuildError> {
        if self.name.is_empty() {
            return Err(BuildError::Config("project name is empty".to_string()));
        }
        if self.name == "." || self.name == ".." || self.name.contains(['/', '\\']) {
            return Err(BuildError::Config(format!(
                "project name must be a plain directory segment: {:?}",
                self.name
            )));
        }
        for script in &self.lscripts {
            let extension = script.extension().and_then(|e| e.to_str()).unwrap_or("");
            if extension != LINKER_SCRIPT_EXT {
                return Err(BuildError::Config(format!(
                    "linker script extension not valid: {}",
                    script.display()
                )));
            }
        }
        Ok(())
    }
}

fn default_jobs() -> usize {
    thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
}
