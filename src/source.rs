//! Source bytes provider
//!
//! Reading a target from a path is delegated to a `SourceProvider`, so hosts
//! can serve files from memory, an archive or a virtual filesystem.

use crate::{Error, Result};
use std::io::ErrorKind;
use std::path::Path;

/// Provides the raw bytes of a file
pub trait SourceProvider: Send + Sync {
    /// Read a file. Errors are `SourceNotFound`, `PermissionDenied` or `Io`.
    fn read(&self, path: &Path) -> Result<Vec<u8>>;
}

/// Reads from the local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct FsSourceProvider;

impl SourceProvider for FsSourceProvider {
    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        std::fs::read(path).map_err(|e| io_error(path, e))
    }
}

/// Map an IO error onto the source error taxonomy
pub fn io_error(path: &Path, error: std::io::Error) -> Error {
    let path = path.to_path_buf();
    match error.kind() {
        ErrorKind::NotFound => Error::SourceNotFound { path },
        ErrorKind::PermissionDenied => Error::PermissionDenied { path },
        _ => Error::Io { path, source: error },
    }
}
