use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};

#[derive(Debug, PartialEq)]
pub enum DirEntryCategory {
    DoesNotExist,
    RegularFile,
    SymbolicLink,
    Directory,
    Unknown,
}

pub fn classify_file(path: &Path) -> DirEntryCategory {
    match fs::symlink_metadata(path) {
        Ok(metadata) => {
            if metadata.is_symlink() {
                DirEntryCategory::SymbolicLink
            } else if metadata.is_file() {
                DirEntryCategory::RegularFile
            } else if metadata.is_dir() {
                DirEntryCategory::Directory
            } else {
                DirEntryCategory::Unknown
            }
        },
        Err(_) => DirEntryCategory::DoesNotExist,
    }
}

/// Turns command line inputs into the list of files to convert. Directories
/// contribute their regular files (not recursively, sorted by name);
/// inputs that yield nothing are reported and skipped.
pub fn expand_inputs(inputs: &[String]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for input in inputs {
        let found = expand_input(Path::new(input));
        if found.is_empty() {
            warn!("{input:?} did not match any files");
        }
        files.extend(found);
    }
    files
}

fn expand_input(path: &Path) -> Vec<PathBuf> {
    match classify_file(path) {
        DirEntryCategory::RegularFile => vec![PathBuf::from(path)],
        DirEntryCategory::SymbolicLink => match path.is_file() {
            true => vec![PathBuf::from(path)],
            false => {
                debug!("skipping symlink {path:?}");
                vec![]
            },
        },
        DirEntryCategory::Directory => match fs::read_dir(path) {
            Ok(entries) => {
                let mut files: Vec<PathBuf> = entries
                    .filter_map(|e| e.ok())
                    .map(|e| e.path())
                    .filter(|p| p.is_file())
                    .collect();
                files.sort();
                files
            },
            Err(err) => {
                warn!("unable to read directory {path:?}: {err}");
                vec![]
            },
        },
        DirEntryCategory::DoesNotExist | DirEntryCategory::Unknown => vec![],
    }
}
