//! Command synthesis.
//!
//! Pure functions mapping toolchain parameters onto [`CommandJob`]s. Nothing
//! here touches the filesystem or spawns anything; the executor owns that.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// One process invocation: a program plus its ordered argument vector and an
/// optional working-directory override. Jobs are spawned directly, never
/// through a shell, so argument boundaries survive untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandJob {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
}

impl CommandJob {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    /// A user-supplied hook line, run through `sh -c` as written.
    pub fn shell(line: &str) -> Self {
        Self {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), line.to_string()],
            cwd: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn arg_path(mut self, path: &Path) -> Self {
        self.args.push(path.display().to_string());
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Spawns the job with captured stdio.
    pub fn spawn(&self) -> std::io::Result<std::process::Child> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }
        cmd.spawn()
    }
}

/// Shell-like rendering for debug logging only; never executed.
impl fmt::Display for CommandJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", quote(&self.program))?;
        for arg in &self.args {
            write!(f, " {}", quote(arg))?;
        }
        Ok(())
    }
}

fn quote(s: &str) -> String {
    if s.is_empty() || s.contains(char::is_whitespace) {
        format!("\"{}\"", s)
    } else {
        s.to_string()
    }
}

/// `<compiler> -c <source> -o <object> <flags...> <-I<include>...>`
pub fn compile_job(
    compiler: &str,
    source: &Path,
    object: &Path,
    flags: &[String],
    includes: &[PathBuf],
) -> CommandJob {
    let mut job = CommandJob::new(compiler)
        .arg("-c")
        .arg_path(source)
        .arg("-o")
        .arg_path(object);
    for flag in flags {
        job = job.arg(flag);
    }
    for include in includes {
        job = job.arg(format!("-I{}", include.display()));
    }
    job
}

/// `<linker> -o <out> <flags...> <-T <script>...> <objects...>`
///
/// Script extensions are validated by the descriptor before this runs.
pub fn link_job(
    linker: &str,
    out: &Path,
    flags: &[String],
    lscripts: &[PathBuf],
    objects: &[PathBuf],
) -> CommandJob {
    let mut job = CommandJob::new(linker).arg("-o").arg_path(out);
    for flag in flags {
        job = job.arg(flag);
    }
    for script in lscripts {
        job = job.arg("-T").arg_path(script);
    }
    for object in objects {
        job = job.arg_path(object);
    }
    job
}

/// One objcopy job per recognized export format. Detection is by substring
/// on the requested format name: "hex" wins over "bin" (so "binhex" produces
/// an ihex job), anything matching neither is skipped without a job.
pub fn objcopy_jobs(objcopy: &str, in_file: &str, base: &str, exports: &[String]) -> Vec<CommandJob> {
    let mut jobs = Vec::new();
    for export in exports {
        let lowered = export.to_lowercase();
        let format = if lowered.contains("hex") {
            "ihex"
        } else if lowered.contains("bin") {
            "binary"
        } else {
            continue;
        };
        jobs.push(
            CommandJob::new(objcopy)
                .arg("-O")
                .arg(format)
                .arg(in_file)
                .arg(format!("{}.{}", base, export)),
        );
    }
    jobs
}

/// `<size> <in>` for decimal, `<size> -x <in>` for hex; anything else
/// produces no job.
pub fn size_job(size: &str, format: &str, in_file: &str) -> Option<CommandJob> {
    let lowered = format.to_lowercase();
    if lowered.contains("dec") {
        Some(CommandJob::new(size).arg(in_file))
    } else if lowered.contains("hex") {
        Some(CommandJob::new(size).arg("-x").arg(in_file))
    } else {
        None
    }
}
