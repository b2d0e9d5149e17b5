//! Finds image files under a set of directories.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A snapshot of every regular file found under the configured directories.
///
/// Snapshots are never edited, a reload replaces the whole thing.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Catalog {
    images: Vec<PathBuf>,
}

impl Catalog {
    /// Walks each directory recursively and collects the files in it.
    ///
    /// Unreadable entries and missing directories are skipped.
    pub fn scan<'a, I>(dirs: I) -> Self
    where
        I: IntoIterator<Item = &'a PathBuf>,
    {
        let mut found = BTreeSet::new();
        for dir in dirs {
            for entry in WalkDir::new(dir).follow_links(true) {
                match entry {
                    Ok(entry) if entry.file_type().is_file() => {
                        found.insert(entry.into_path());
                    }
                    Ok(_) => (),
                    Err(err) => log::debug!("skipping entry under {}: {err}", dir.display()),
                }
            }
        }
        Self {
            images: found.into_iter().collect(),
        }
    }

    pub fn images(&self) -> &[PathBuf] {
        &self.images
    }

    pub fn get(&self, index: usize) -> Option<&Path> {
        self.images.get(index).map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}
