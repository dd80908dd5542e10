//! Candidate file discovery

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{ConvertError, Result};
use crate::processing::formats::extension_of;

/// A regular file found under the input root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Input root joined with `relative`
    pub path: PathBuf,
    /// Path relative to the input root
    pub relative: PathBuf,
    /// Lower-cased extension with the leading dot, empty if none
    pub extension: String,
}

impl Candidate {
    /// Build a candidate for a file below `root`
    pub fn new(root: &Path, path: PathBuf) -> Self {
        let relative = match path.strip_prefix(root) {
            Ok(rel) => rel.to_path_buf(),
            Err(_) => path.file_name().map(PathBuf::from).unwrap_or_default(),
        };
        let extension = extension_of(&path);
        Self {
            path,
            relative,
            extension,
        }
    }
}

/// Lazy, deterministic walk over the files of an input root
pub struct FileEnumerator {
    root: PathBuf,
    walker: walkdir::IntoIter,
}

/// Start enumerating files under `root`.
///
/// Fails up front if the root is missing, not a directory or cannot be
/// listed. Entries are yielded sorted by file name within each directory.
pub fn enumerate<P: AsRef<Path>>(root: P, recursive: bool) -> Result<FileEnumerator> {
    let root = root.as_ref().to_path_buf();

    let metadata = fs::metadata(&root)
        .map_err(|e| ConvertError::input_directory(root.clone(), e.to_string()))?;
    if !metadata.is_dir() {
        return Err(ConvertError::input_directory(root, "not a directory"));
    }
    fs::read_dir(&root)
        .map_err(|e| ConvertError::input_directory(root.clone(), e.to_string()))?;

    debug!("Enumerating {:?} (recursive: {})", root, recursive);

    let walker = WalkDir::new(&root)
        .min_depth(1)
        .max_depth(if recursive { usize::MAX } else { 1 })
        .follow_links(false)
        .sort_by_file_name()
        .into_iter();

    Ok(FileEnumerator { root, walker })
}

impl Iterator for FileEnumerator {
    type Item = Candidate;

    fn next(&mut self) -> Option<Candidate> {
        loop {
            let entry = match self.walker.next()? {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry under {:?}: {}", self.root, e);
                    continue;
                }
            };

            let is_file = entry.file_type().is_file()
                || (entry.path_is_symlink() && entry.path().is_file());
            if !is_file {
                continue;
            }

            return Some(Candidate::new(&self.root, entry.into_path()));
        }
    }
}
