use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use human_repr::HumanDuration;

use crate::process::{ProcessExit, RunningProcess};

/// The encoder does not refresh its progress log more often than this.
pub const POLL_INTERVAL: Duration = Duration::from_millis(500);

const OUT_TIME_KEY: &str = "out_time_ms=";

#[derive(Clone, Debug, PartialEq)]
pub struct ProgressUpdate {
    pub pass: u8,
    pub percent: f64,
    pub remaining: String,
    pub original_name: String,
    pub new_name: String,
}

pub trait ProgressSource {
    fn sample(&mut self) -> Option<i64>;
}

pub struct LogFileSource {
    path: PathBuf,
}

impl LogFileSource {
    pub fn new(path: &Path) -> Self {
        LogFileSource { path: PathBuf::from(path) }
    }
}

impl ProgressSource for LogFileSource {
    fn sample(&mut self) -> Option<i64> {
        // the encoder may not have created the file yet
        let bytes = fs::read(&self.path).ok()?;
        last_out_time(&String::from_utf8_lossy(&bytes))
    }
}

pub fn last_out_time(log: &str) -> Option<i64> {
    // the last line may still be half written
    log.lines()
        .rev()
        .filter_map(|line| line.trim().strip_prefix(OUT_TIME_KEY))
        .find_map(|value| value.trim().parse::<i64>().ok())
}

/// Percent complete for an `out_time_ms` reading, bounded to 1..=100.
/// The reading divided by 10000 is already scaled so that dividing by the
/// duration in seconds yields a percentage.
pub fn completed_percent(out_time: i64, total_duration: f64) -> f64 {
    let current = f64::max(0.0, out_time as f64 / 10000.0);
    (current / total_duration).clamp(1.0, 100.0)
}

pub fn estimate_remaining(elapsed: Duration, percent: f64) -> Duration {
    Duration::from_secs_f64(elapsed.as_secs_f64() * (100.0 - percent) / percent)
}

#[derive(Clone, Debug)]
pub struct ProgressMonitor {
    interval: Duration,
    quiet: bool,
}

impl Default for ProgressMonitor {
    fn default() -> Self {
        ProgressMonitor {
            interval: POLL_INTERVAL,
            quiet: false,
        }
    }
}

impl ProgressMonitor {
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Polls `source` until `process` exits. There is no timeout.
    pub fn track<P, S>(
        &self,
        process: &mut P,
        source: &mut S,
        total_duration: f64,
        labels: (u8, &str, &str),
        on_update: &mut dyn FnMut(&ProgressUpdate),
    ) -> io::Result<ProcessExit>
    where
        P: RunningProcess + ?Sized,
        S: ProgressSource + ?Sized,
    {
        let (pass, original_name, new_name) = labels;
        let started = Instant::now();
        let mut last_percent: Option<f64> = None;

        loop {
            if let Some(exit) = process.try_wait()? {
                return Ok(exit);
            }

            if let Some(out_time) = source.sample() {
                let mut percent = completed_percent(out_time, total_duration);
                if let Some(previous) = last_percent {
                    percent = f64::max(percent, previous);
                }
                last_percent = Some(percent);

                if !self.quiet {
                    let remaining = estimate_remaining(started.elapsed(), percent);
                    on_update(&ProgressUpdate {
                        pass,
                        percent,
                        remaining: remaining.as_secs_f64().human_duration().to_string(),
                        original_name: String::from(original_name),
                        new_name: String::from(new_name),
                    });
                }
            }

            thread::sleep(self.interval);
        }
    }
}
