use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Conditions that stop the whole batch before any file is touched.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("unable to locate {name:?} in the suggested directory, next to this program, in the working directory or on the PATH")]
    BinaryNotFound { name: String },

    #[error("unable to determine the working directory: {0}")]
    WorkingDirectory(#[source] io::Error),
}

impl ToolError {
    pub fn binary_not_found(name: &str) -> Self {
        ToolError::BinaryNotFound { name: String::from(name) }
    }
}

/// A single subprocess invocation that could not be carried out.
#[derive(Debug, Error)]
#[error("error running {tool} for {path:?}: {msg}")]
pub struct ProcessError {
    tool: String,
    path: PathBuf,
    msg: String,
    #[source]
    source: Option<io::Error>,
}

impl ProcessError {
    pub fn for_file(tool: &str, path: &Path, msg: &str) -> Self {
        ProcessError {
            tool: String::from(tool),
            path: PathBuf::from(path),
            msg: String::from(msg),
            source: None,
        }
    }

    pub fn io(tool: &str, path: &Path, msg: &str, source: io::Error) -> Self {
        ProcessError {
            source: Some(source),
            ..ProcessError::for_file(tool, path, msg)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_error_display() {
        let err = ProcessError::for_file("ffmpeg", Path::new("/videos/a.mkv"), "pass 1 could not start");
        assert_eq!(err.to_string(), "error running ffmpeg for \"/videos/a.mkv\": pass 1 could not start");
    }

    #[test]
    fn test_binary_not_found_names_tool() {
        assert!(ToolError::binary_not_found("ffprobe").to_string().contains("\"ffprobe\""));
    }
}
