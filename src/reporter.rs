use kdam::{term, tqdm, Bar, BarExt};

use crate::outcome::{ConversionOutcome, FileResult};
use crate::progress::ProgressUpdate;

/// Draws one bar per encode pass.
pub struct ProgressReporter {
    bar: Option<Bar>,
    current: Option<(u8, String)>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        term::init(false);
        ProgressReporter {
            bar: None,
            current: None,
        }
    }

    pub fn update(&mut self, update: &ProgressUpdate) {
        let key = (update.pass, update.original_name.clone());
        if self.current.as_ref() != Some(&key) {
            self.finish();
            self.bar = Some(tqdm!(
                total = 100,
                desc = format!("{} -> {} (pass {}/2)", update.original_name, update.new_name, update.pass),
                position = 0,
                force_refresh = true
            ));
            self.current = Some(key);
        }

        if let Some(bar) = self.bar.as_mut() {
            bar.set_postfix(format!("eta {}", update.remaining));
            let _ = bar.update_to(update.percent.round() as usize);
        }
    }

    /// Ends the current bar so other output starts on a fresh line.
    pub fn finish(&mut self) {
        if self.bar.take().is_some() {
            eprintln!();
        }
        self.current = None;
    }
}

pub fn format_result(result: &FileResult, json: bool) -> String {
    if json {
        return serde_json::to_string(result).unwrap_or_else(|err| format!("{{\"error\":{:?}}}", err.to_string()));
    }

    match result.outcome {
        ConversionOutcome::Converted => format!(
            "{:<10} {:>6.1}%  {} -> {}",
            result.outcome, result.improvement, result.input.display(), result.output.display()
        ),
        ConversionOutcome::Discarded => format!(
            "{:<10} {:>6.1}%  {}",
            result.outcome, result.improvement, result.input.display()
        ),
        _ => format!("{:<10} {:>7}  {}", result.outcome, "-", result.input.display()),
    }
}

pub fn summarize(results: &[FileResult]) -> String {
    let count = |outcome: ConversionOutcome| results.iter().filter(|r| r.outcome == outcome).count();
    format!(
        "{} files: {} converted, {} discarded, {} unreadable, {} failed",
        results.len(),
        count(ConversionOutcome::Converted),
        count(ConversionOutcome::Discarded),
        count(ConversionOutcome::Unreadable),
        count(ConversionOutcome::Error),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn converted() -> FileResult {
        FileResult {
            input: PathBuf::from("in/a.avi"),
            outcome: ConversionOutcome::Converted,
            improvement: 42.26,
            output: PathBuf::from("in/a.1.mp4"),
        }
    }

    #[test]
    fn test_format_text() {
        assert_eq!(format_result(&converted(), false), "converted    42.3%  in/a.avi -> in/a.1.mp4");
        let failed = FileResult::failed(PathBuf::from("b.avi"), ConversionOutcome::Error);
        assert_eq!(format_result(&failed, false), "error            -  b.avi");
    }

    #[test]
    fn test_format_json() {
        let json = format_result(&converted(), true);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["outcome"], "Converted");
        assert_eq!(value["output"], "in/a.1.mp4");
    }

    #[test]
    fn test_summarize() {
        let results = vec![
            converted(),
            FileResult::failed(PathBuf::from("b"), ConversionOutcome::Error),
            FileResult::failed(PathBuf::from("c"), ConversionOutcome::Unreadable),
        ];
        assert_eq!(summarize(&results), "3 files: 1 converted, 0 discarded, 1 unreadable, 1 failed");
    }
}
