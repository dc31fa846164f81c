use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use filetime::FileTime;

use crate::request::RunContext;

/// Duration used when the probe cannot report one.
pub const PLACEHOLDER_DURATION: f64 = 1.0;

#[derive(Clone, Debug)]
pub struct FileTask {
    pub source: PathBuf,
    pub short_name: String,
    pub output: PathBuf,
    pub modified: FileTime,
    pub size: u64,
    pub duration: f64,
}

impl FileTask {
    pub fn new(source: &Path, extension: &str, context: &RunContext) -> io::Result<Self> {
        let metadata = fs::metadata(source)?;
        Ok(FileTask {
            source: PathBuf::from(source),
            short_name: short_name(source),
            output: generate_output_filename(source, extension, &context.stamp),
            modified: FileTime::from_last_modification_time(&metadata),
            size: metadata.len(),
            duration: PLACEHOLDER_DURATION,
        })
    }

    pub fn output_name(&self) -> String {
        short_name(&self.output)
    }
}

/// Log files written for one subprocess run.
#[derive(Clone, Debug, PartialEq)]
pub struct RunLogs {
    pub stdout: PathBuf,
    pub stderr: PathBuf,
    pub progress: PathBuf,
}

impl RunLogs {
    pub fn for_stage(context: &RunContext, stage: &str) -> Self {
        RunLogs {
            stdout: log_path(context, &format!("{stage}-stdout.log")),
            stderr: log_path(context, &format!("{stage}-stderr.log")),
            progress: log_path(context, &format!("{stage}-progress.log")),
        }
    }
}

/// Prefix handed to the encoder for its two-pass statistics files.
pub fn pass_log_prefix(context: &RunContext) -> PathBuf {
    log_path(context, "passlog")
}

fn log_path(context: &RunContext, suffix: &str) -> PathBuf {
    context.temp_dir.join(format!("{}-{suffix}", context.stamp))
}

fn short_name(path: &Path) -> String {
    match path.file_name() {
        Some(name) => name.to_string_lossy().into_owned(),
        None => path.to_string_lossy().into_owned(),
    }
}

/// Deletes every log and two-pass statistics file this run left in the temp
/// dir. Only names carrying the run stamp are touched.
pub fn remove_run_logs(context: &RunContext) -> io::Result<usize> {
    let prefix = format!("{}-", context.stamp);
    let mut removed = 0;
    for entry in fs::read_dir(&context.temp_dir)? {
        let entry = entry?;
        if entry.file_name().to_string_lossy().starts_with(&prefix) && entry.file_type()?.is_file() {
            fs::remove_file(entry.path())?;
            removed += 1;
        }
    }
    Ok(removed)
}

// keeps the source extension so `movie.avi` and `movie.mkv` never share an output
fn generate_output_filename(path: &Path, extension: &str, stamp: &str) -> PathBuf {
    match path.file_name() {
        Some(file_name) => {
            let mut out = PathBuf::from(path);
            out.set_file_name(format!("{}.{stamp}.{extension}", file_name.to_string_lossy()));
            out
        },
        None => PathBuf::from(format!("{}.{stamp}.{extension}", path.display())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(temp_dir: &Path) -> RunContext {
        RunContext {
            stamp: String::from("20240102030405"),
            temp_dir: PathBuf::from(temp_dir),
            working_dir: PathBuf::from(temp_dir),
        }
    }

    #[test]
    fn test_generate_output_filename() {
        assert_eq!(generate_output_filename(Path::new("/foo/bar/baz.mkv"), "mp4", "1"), PathBuf::from("/foo/bar/baz.mkv.1.mp4"));
        assert_eq!(generate_output_filename(Path::new("bar/baz.mp4"), "mp4", "1"), PathBuf::from("bar/baz.mp4.1.mp4"));
        assert_eq!(generate_output_filename(Path::new("noext"), "mkv", "7"), PathBuf::from("noext.7.mkv"));
    }

    #[test]
    fn test_same_stem_sources_get_distinct_outputs() {
        let avi = generate_output_filename(Path::new("media/movie.avi"), "mp4", "1");
        let mkv = generate_output_filename(Path::new("media/movie.mkv"), "mp4", "1");
        assert_ne!(avi, mkv);
    }

    #[test]
    fn test_new_task_reads_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("clip.avi");
        fs::write(&source, vec![0u8; 2048]).unwrap();

        let task = FileTask::new(&source, "mp4", &context(dir.path())).unwrap();
        assert_eq!(task.short_name, "clip.avi");
        assert_eq!(task.output_name(), "clip.avi.20240102030405.mp4");
        assert_eq!(task.size, 2048);
        assert_eq!(task.duration, PLACEHOLDER_DURATION);
    }

    #[test]
    fn test_new_task_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        assert!(FileTask::new(&dir.path().join("gone.avi"), "mp4", &context(dir.path())).is_err());
    }

    #[test]
    fn test_log_names_share_run_stamp() {
        let ctx = context(Path::new("/tmp/x"));
        let logs = RunLogs::for_stage(&ctx, "pass1");
        assert_eq!(logs.stderr, PathBuf::from("/tmp/x/20240102030405-pass1-stderr.log"));
        assert_eq!(logs.progress, PathBuf::from("/tmp/x/20240102030405-pass1-progress.log"));
        assert_eq!(pass_log_prefix(&ctx), PathBuf::from("/tmp/x/20240102030405-passlog"));
    }

    #[test]
    fn test_remove_run_logs_keeps_other_runs() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());
        let logs = RunLogs::for_stage(&ctx, "pass1");
        fs::write(&logs.stderr, "").unwrap();
        fs::write(&logs.progress, "out_time_ms=1\n").unwrap();
        fs::write(dir.path().join("20240102030405-passlog-0.log"), "stats").unwrap();
        let other = dir.path().join("20230101000000-pass1-stderr.log");
        fs::write(&other, "").unwrap();

        assert_eq!(remove_run_logs(&ctx).unwrap(), 3);
        assert!(!logs.progress.exists());
        assert!(other.exists());
    }
}
