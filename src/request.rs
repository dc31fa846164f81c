use std::env;
use std::path::PathBuf;

use chrono::Local;
use log::warn;

use crate::error::ToolError;

pub const MAX_IMPROVEMENT: u8 = 99;

/// Settings shared by every file of a batch.
#[derive(Clone, Debug, PartialEq)]
pub struct ConversionRequest {
    pub extension: String,
    pub required_improvement: u8,
    pub video_encoder: String,
    pub video_bitrate: u32,
    pub audio_encoder: String,
    pub audio_bitrate: u32,
    pub match_timestamp: bool,
    pub full_paths: bool,
    pub quiet: bool,
}

impl Default for ConversionRequest {
    fn default() -> Self {
        ConversionRequest {
            extension: String::from("mp4"),
            required_improvement: 10,
            video_encoder: String::from("libx265"),
            video_bitrate: 1500,
            audio_encoder: String::from("aac"),
            audio_bitrate: 128,
            match_timestamp: true,
            full_paths: false,
            quiet: false,
        }
    }
}

impl ConversionRequest {
    /// Out of range values are clamped into 0..=99 rather than rejected.
    pub fn improvement(mut self, percent: i64) -> Self {
        let clamped = percent.clamp(0, MAX_IMPROVEMENT as i64);
        if clamped != percent {
            warn!("required improvement {percent}% is out of range; using {clamped}%");
        }
        self.required_improvement = clamped as u8;
        self
    }

    pub fn extension(mut self, extension: &str) -> Self {
        self.extension = String::from(extension.trim_start_matches('.'));
        self
    }
}

/// Values that would otherwise be ambient lookups, captured once per run.
#[derive(Clone, Debug)]
pub struct RunContext {
    /// Shared by every output and log file of the run.
    pub stamp: String,
    pub temp_dir: PathBuf,
    pub working_dir: PathBuf,
}

impl RunContext {
    pub fn from_environment() -> Result<Self, ToolError> {
        Ok(RunContext {
            stamp: Local::now().format("%Y%m%d%H%M%S").to_string(),
            temp_dir: env::temp_dir(),
            working_dir: env::current_dir().map_err(ToolError::WorkingDirectory)?,
        })
    }
}
