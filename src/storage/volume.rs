//! Backing volume
//!
//! A slice of the local filesystem rooted at a configured directory,
//! exposed to the protocol as one storage. Capacity is a fixed configured
//! budget; used space is recomputed live by walking the tree, never cached.

use std::fs::{self, File, Metadata};
use std::io;
use std::path::{Path, PathBuf};

/// A single directory entry as seen by the session walk.
#[derive(Debug, Clone)]
pub struct DirEntryInfo {
    pub name: String,
    pub is_dir: bool,
}

pub struct Volume {
    root: PathBuf,
    capacity_bytes: u64,
}

impl Volume {
    pub fn new(root: impl Into<PathBuf>, capacity_bytes: u64) -> Self {
        Self {
            root: root.into(),
            capacity_bytes,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn capacity_bytes(&self) -> u64 {
        self.capacity_bytes
    }

    /// Bytes currently consumed below the root.
    pub fn used_bytes(&self) -> io::Result<u64> {
        dir_size(&self.root)
    }

    pub fn free_bytes(&self) -> io::Result<u64> {
        Ok(self.capacity_bytes.saturating_sub(self.used_bytes()?))
    }

    /// Lists a directory, sorted by name so session rebuilds are
    /// deterministic for a given tree.
    pub fn list_dir(&self, path: &Path) -> io::Result<Vec<DirEntryInfo>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(path)? {
            let entry = entry?;
            let file_type = entry.file_type()?;
            entries.push(DirEntryInfo {
                name: entry.file_name().to_string_lossy().to_string(),
                is_dir: file_type.is_dir(),
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    pub fn stat(&self, path: &Path) -> io::Result<Metadata> {
        fs::metadata(path)
    }

    pub fn open_read(&self, path: &Path) -> io::Result<File> {
        File::open(path)
    }

    pub fn create_write(&self, path: &Path) -> io::Result<File> {
        File::create(path)
    }

    pub fn unlink(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    pub fn mkdir(&self, path: &Path) -> io::Result<()> {
        fs::create_dir(path)
    }
}

fn dir_size(path: &Path) -> io::Result<u64> {
    let mut total = 0;
    for entry in fs::read_dir(path)? {
        let entry = entry?;
        let meta = entry.metadata()?;
        if meta.is_dir() {
            total += dir_size(&entry.path())?;
        } else {
            total += meta.len();
        }
    }
    Ok(total)
}
