use std::path::PathBuf;

use crate::error::ToolError;
use crate::locator::BinaryLocator;

pub mod args;
pub mod containers;
pub mod probe;

pub const FFMPEG: &str = "ffmpeg";
pub const FFPROBE: &str = "ffprobe";

#[derive(Clone, Debug)]
pub struct FFmpeg {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
}

impl FFmpeg {
    /// Both tools must be found before any file is processed.
    pub fn locate(locator: &BinaryLocator, ffmpeg_dir: &str, ffprobe_dir: &str) -> Result<Self, ToolError> {
        let ffmpeg = locator
            .locate(ffmpeg_dir, FFMPEG)
            .ok_or_else(|| ToolError::binary_not_found(FFMPEG))?;
        let ffprobe = locator
            .locate(ffprobe_dir, FFPROBE)
            .ok_or_else(|| ToolError::binary_not_found(FFPROBE))?;
        Ok(FFmpeg { ffmpeg, ffprobe })
    }
}
