//! Staleness detection.
//!
//! Each declared source maps onto one object file under the build
//! subdirectory, preserving sub-path structure. A unit is stale when its
//! source is newer than its object, or the object is missing. No header
//! dependencies are tracked; the comparison is strictly source vs object.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::error::BuildError;

/// One (source, object) pair with the mtimes observed this invocation.
/// Derived, never persisted; the filesystem itself is the only cache.
#[derive(Debug, Clone)]
pub struct TranslationUnit {
    /// Source path, relative to the project root as declared.
    pub source: PathBuf,
    /// Object path, relative to the project root, under the build dir.
    pub object: PathBuf,
    pub source_mtime: SystemTime,
    /// `None` when the object file does not exist yet.
    pub object_mtime: Option<SystemTime>,
}

impl TranslationUnit {
    pub fn is_stale(&self, force: bool) -> bool {
        force
            || match self.object_mtime {
                None => true,
                Some(object_mtime) => self.source_mtime > object_mtime,
            }
    }
}

/// Stats every declared source against its would-be object file.
///
/// A missing source is fatal for the build; a missing object just marks the
/// unit stale. The returned list preserves declaration order, which later
/// becomes the linker's input order.
pub fn scan_units(
    root: &Path,
    build_dir: &Path,
    sources: &[PathBuf],
) -> Result<Vec<TranslationUnit>, BuildError> {
    let mut units = Vec::with_capacity(sources.len());
    for source in sources {
        let absolute = root.join(source);
        let source_mtime = fs::metadata(&absolute)
            .and_then(|m| m.modified())
            .map_err(|e| BuildError::Filesystem {
                path: absolute.clone(),
                source: e,
            })?;

        let object = build_dir.join(source).with_extension("o");
        let object_mtime = fs::metadata(root.join(&object))
            .and_then(|m| m.modified())
            .ok();

        units.push(TranslationUnit {
            source: source.clone(),
            object,
            source_mtime,
            object_mtime,
        });
    }
    Ok(units)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::time::Duration;

    fn push_mtime_forward(path: &Path) {
        let future = SystemTime::now() + Duration::from_secs(60);
        File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(future)
            .unwrap();
    }

    #[test]
    fn test_missing_object_is_stale() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.c"), "int a;").unwrap();

        let units = scan_units(dir.path(), Path::new("app"), &[PathBuf::from("a.c")]).unwrap();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].object, PathBuf::from("app/a.o"));
        assert!(units[0].object_mtime.is_none());
        assert!(units[0].is_stale(false));
    }

    #[test]
    fn test_fresh_object_is_not_stale() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.c"), "int a;").unwrap();
        fs::create_dir_all(dir.path().join("app")).unwrap();
        fs::write(dir.path().join("app/a.o"), "obj").unwrap();
        push_mtime_forward(&dir.path().join("app/a.o"));

        let units = scan_units(dir.path(), Path::new("app"), &[PathBuf::from("a.c")]).unwrap();
        assert!(!units[0].is_stale(false));
        assert!(units[0].is_stale(true), "force overrides freshness");
    }

    #[test]
    fn test_stale_when_source_newer() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("app")).unwrap();
        fs::write(dir.path().join("app/a.o"), "obj").unwrap();
        fs::write(dir.path().join("a.c"), "int a;").unwrap();
        push_mtime_forward(&dir.path().join("a.c"));

        let units = scan_units(dir.path(), Path::new("app"), &[PathBuf::from("a.c")]).unwrap();
        assert!(units[0].is_stale(false));
    }

    #[test]
    fn test_missing_source_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err =
            scan_units(dir.path(), Path::new("app"), &[PathBuf::from("gone.c")]).unwrap_err();
        assert!(err.to_string().contains("gone.c"));
    }

    #[test]
    fn test_subpath_structure_preserved() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src/drivers")).unwrap();
        fs::write(dir.path().join("src/drivers/uart.c"), "int u;").unwrap();

        let units = scan_units(
            dir.path(),
            Path::new("fw"),
            &[PathBuf::from("src/drivers/uart.c")],
        )
        .unwrap();
        assert_eq!(units[0].object, PathBuf::from("fw/src/drivers/uart.o"));
    }
}
