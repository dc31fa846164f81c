use std::fmt::Display;
use std::path::PathBuf;

use serde::Serialize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum ConversionOutcome {
    #[default]
    Unknown,
    Converted,
    Discarded,
    Unreadable,
    Error,
}

impl ConversionOutcome {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ConversionOutcome::Unknown)
    }
}

impl Display for ConversionOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(&format!("{:?}", self).to_lowercase())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FileResult {
    pub input: PathBuf,
    pub outcome: ConversionOutcome,
    pub improvement: f64,
    /// Empty when no output was kept.
    pub output: PathBuf,
}

impl FileResult {
    pub fn failed(input: PathBuf, outcome: ConversionOutcome) -> Self {
        FileResult {
            input,
            outcome,
            improvement: 0.0,
            output: PathBuf::new(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Evaluation {
    pub keep: bool,
    pub improvement: f64,
}

/// Keeps the output only when it is no larger than
/// `original * (1 - required / 100)`. With `required == 0` that means
/// "not larger than the original".
pub fn evaluate(original_size: u64, new_size: u64, required_improvement: u8) -> Evaluation {
    let original = original_size as f64;
    let new = new_size as f64;
    let improvement = match original_size {
        0 => 0.0,
        _ => (original - new) / original * 100.0,
    };
    let threshold = original * (1.0 - f64::from(required_improvement) / 100.0);

    Evaluation {
        keep: new <= threshold,
        improvement,
    }
}
