#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use rowsmith::data::{Row, Value};
use tempfile::{TempDir, tempdir};

/// Builds a row from `(key, value)` pairs, keeping their order.
pub fn row(pairs: &[(&str, Value)]) -> Row {
    pairs.iter().cloned().collect()
}

/// Scratch directory helper that cleans up files automatically on drop.
pub struct Scratch {
    temp_dir: TempDir,
}

impl Scratch {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this scratch directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the scratch directory and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }
}
