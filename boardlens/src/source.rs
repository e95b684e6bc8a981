//! Project file access abstraction.
//!
//! The analyzers never touch the filesystem directly; they go through a
//! [`ProjectSource`] so the same pipeline runs against a directory on
//! disk or a set of in-memory files (tests, embedding hosts).

use std::collections::BTreeMap;
use std::io;
use std::path::Path;

/// Read-only access to the files of one project directory.
pub trait ProjectSource {
    /// File names (not paths) directly inside `dir`.
    fn list_files(&self, dir: &str) -> io::Result<Vec<String>>;

    /// Full contents of a file by path.
    fn read_file(&self, path: &str) -> io::Result<String>;

    /// Join a directory and a file name into a path.
    fn join_path(&self, base: &str, name: &str) -> String;

    /// File name without directory, optionally stripping an extension.
    fn base_name(&self, path: &str, strip_ext: Option<&str>) -> String {
        let name = path.rsplit(['/', '\\']).next().unwrap_or(path);
        match strip_ext {
            Some(ext) => name.strip_suffix(ext).unwrap_or(name).to_string(),
            None => name.to_string(),
        }
    }
}

/// [`ProjectSource`] over the real filesystem.
#[derive(Debug, Default)]
pub struct FsSource;

impl ProjectSource for FsSource {
    fn list_files(&self, dir: &str) -> io::Result<Vec<String>> {
        let mut files = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                files.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        files.sort();
        Ok(files)
    }

    fn read_file(&self, path: &str) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn join_path(&self, base: &str, name: &str) -> String {
        Path::new(base).join(name).to_string_lossy().into_owned()
    }
}

/// In-memory [`ProjectSource`] keyed by file name; the directory argument
/// is ignored since there is only one virtual directory.
#[derive(Debug, Default)]
pub struct MemorySource {
    files: BTreeMap<String, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, content: impl Into<String>) -> &mut Self {
        self.files.insert(name.into(), content.into());
        self
    }
}

impl ProjectSource for MemorySource {
    fn list_files(&self, _dir: &str) -> io::Result<Vec<String>> {
        Ok(self.files.keys().cloned().collect())
    }

    fn read_file(&self, path: &str) -> io::Result<String> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.to_string()))
    }

    fn join_path(&self, _base: &str, name: &str) -> String {
        name.to_string()
    }
}
