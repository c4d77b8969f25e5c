//! Manifest file parsing (`smelt.toml`).
//!
//! A manifest holds one `[project.<name>]` table per buildable target, each
//! mapping 1:1 onto a [`ProjectDescriptor`]. There are no layered defaults,
//! inheritance, or placeholder substitution; what is written is what the
//! pipeline gets.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::descriptor::ProjectDescriptor;

#[derive(Deserialize, Debug, Default)]
pub struct Manifest {
    #[serde(default)]
    pub project: HashMap<String, ProjectManifest>,
}

#[derive(Deserialize, Debug, Default)]
pub struct ProjectManifest {
    /// Project root; the invoking directory when omitted.
    pub path: Option<PathBuf>,
    pub toolchain_path: Option<PathBuf>,
    #[serde(default = "default_compiler")]
    pub compiler: String,
    #[serde(default = "default_compiler")]
    pub linker: String,
    #[serde(default = "default_objcopy")]
    pub objcopy: String,
    #[serde(default = "default_size")]
    pub size: String,
    #[serde(default)]
    pub flags: Vec<String>,
    #[serde(default)]
    pub cflags: Vec<String>,
    #[serde(default)]
    pub lflags: Vec<String>,
    #[serde(default)]
    pub sources: Vec<PathBuf>,
    #[serde(default)]
    pub includes: Vec<PathBuf>,
    #[serde(default)]
    pub lscripts: Vec<PathBuf>,
    #[serde(default = "default_out")]
    pub out: String,
    #[serde(default)]
    pub exports: Vec<String>,
    #[serde(default = "default_size_format")]
    pub size_format: String,
    pub scripts: Option<Hooks>,
    pub jobs: Option<usize>,
    #[serde(default)]
    pub fail_fast: bool,
    /// Per-command deadline in seconds.
    pub timeout: Option<u64>,
}

#[derive(Deserialize, Debug, Default)]
pub struct Hooks {
    #[serde(default)]
    pub pre: Vec<String>,
    #[serde(default)]
    pub post: Vec<String>,
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Manifest> {
        if !path.exists() {
            anyhow::bail!(
                "{} not found.\n\n\
                💡 Tip: Pass --project <file> or create one with a [project.<name>] table.",
                path.display()
            );
        }
        let body = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {} - check file permissions", path.display()))?;
        toml::from_str(&body).with_context(|| {
            format!(
                "Failed to parse {} - check for syntax errors (missing quotes, brackets)",
                path.display()
            )
        })
    }
}

impl ProjectManifest {
    /// Resolves this entry into a read-only descriptor. Mode flags stay at
    /// their defaults; the CLI sets them from its own arguments.
    pub fn into_descriptor(self, name: &str) -> ProjectDescriptor {
        let mut desc = ProjectDescriptor::new(name);
        desc.root = self
            .path
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
        desc.toolchain_path = self.toolchain_path;
        desc.compiler = self.compiler;
        desc.linker = self.linker;
        desc.objcopy = self.objcopy;
        desc.size = self.size;
        desc.flags = self.flags;
        desc.cflags = self.cflags;
        desc.lflags = self.lflags;
        desc.sources = self.sources;
        desc.includes = self.includes;
        desc.lscripts = self.lscripts;
        desc.out_extension = self.out;
        desc.exports = self.exports;
        desc.size_format = self.size_format;
        if let Some(hooks) = self.scripts {
            desc.pre_hooks = hooks.pre;
            desc.post_hooks = hooks.post;
        }
        if let Some(jobs) = self.jobs {
            desc.jobs = jobs.max(1);
        }
        desc.fail_fast = self.fail_fast;
        desc.timeout = self.timeout.map(Duration::from_secs);
        desc
    }
}

fn default_compiler() -> String {
    "gcc".to_string()
}

fn default_objcopy() -> String {
    "objcopy".to_string()
}

fn default_size() -> String {
    "size".to_string()
}

fn default_out() -> String {
    "out".to_string()
}

fn default_size_format() -> String {
    "dec".to_string()
}
