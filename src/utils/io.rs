//! File I/O primitives with consistent error handling.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use crate::error::{Error, Result};

/// Read file contents with standardized error handling.
pub fn read_file(path: &Path, operation: &str) -> Result<String> {
    fs::read_to_string(path)
        .map_err(|e| Error::io(format!("{} ({})", operation, path.display()), e))
}

/// Append content to a file, creating it if absent.
///
/// Open-append semantics: existing content is never truncated.
pub fn append_file(path: &Path, content: &str, operation: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| Error::io(format!("{} ({})", operation, path.display()), e))?;

    file.write_all(content.as_bytes())
        .map_err(|e| Error::io(format!("{} ({})", operation, path.display()), e))
}

/// Create a directory and its parents if missing.
pub fn ensure_dir(path: &Path, operation: &str) -> Result<()> {
    fs::create_dir_all(path)
        .map_err(|e| Error::io(format!("{} ({})", operation, path.display()), e))
}
