use std::fmt;
use std::io;
use std::path::PathBuf;

/// Error type for build operations.
///
/// Every variant is resolved into a stage outcome plus an error event before
/// it reaches the pipeline boundary; callers only ever see the aggregate
/// boolean and the event stream.
#[derive(Debug)]
pub enum BuildError {
    /// Invalid descriptor contents, detected before any process is spawned
    Config(String),
    /// Filesystem access failed (missing source, unwritable directory, ...)
    Filesystem { path: PathBuf, source: io::Error },
    /// A spawned command could not be started or exited with a non-zero status
    Process(String),
    /// A spawned command outlived the configured deadline and was killed
    Timeout(String),
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::Config(msg) => write!(f, "configuration error: {}", msg),
            BuildError::Filesystem { path, source } => {
                write!(f, "filesystem error: {}: {}", path.display(), source)
            }
            BuildError::Process(msg) => write!(f, "process error: {}", msg),
            BuildError::Timeout(msg) => write!(f, "timeout: {}", msg),
        }
    }
}

impl std::error::Error for BuildError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BuildError::Filesystem { source, .. } => Some(source),
            _ => None,
        }
    }
}
