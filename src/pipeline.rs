use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use human_repr::HumanCount;
use log::{debug, info, warn};

use crate::error::ProcessError;
use crate::ffmpeg::args::{pass1_args, pass2_args, probe_args};
use crate::ffmpeg::probe::parse_duration;
use crate::ffmpeg::{FFmpeg, FFMPEG, FFPROBE};
use crate::file_task::{pass_log_prefix, remove_run_logs, FileTask, RunLogs, PLACEHOLDER_DURATION};
use crate::outcome::{evaluate, ConversionOutcome, FileResult};
use crate::process::{run_failed, run_to_completion, ProcessRunner};
use crate::progress::{LogFileSource, ProgressMonitor, ProgressUpdate};
use crate::request::{ConversionRequest, RunContext};

/// Converts files one at a time: probe, two encode passes, then the
/// keep/discard decision. A failing file never stops the batch.
pub struct ConversionPipeline<'a, R: ProcessRunner> {
    request: &'a ConversionRequest,
    context: &'a RunContext,
    tools: &'a FFmpeg,
    runner: R,
    monitor: ProgressMonitor,
}

impl<'a, R: ProcessRunner> ConversionPipeline<'a, R> {
    pub fn new(request: &'a ConversionRequest, context: &'a RunContext, tools: &'a FFmpeg, runner: R) -> Self {
        ConversionPipeline {
            request,
            context,
            tools,
            runner,
            monitor: ProgressMonitor::default().quiet(request.quiet),
        }
    }

    pub fn monitor(mut self, monitor: ProgressMonitor) -> Self {
        self.monitor = monitor.quiet(self.request.quiet);
        self
    }

    /// One result per input, in input order. `on_result` sees each result
    /// as soon as it is known.
    pub fn run_batch(
        &self,
        inputs: &[PathBuf],
        on_progress: &mut dyn FnMut(&ProgressUpdate),
        on_result: &mut dyn FnMut(&FileResult),
    ) -> Vec<FileResult> {
        let mut results = Vec::with_capacity(inputs.len());
        for input in inputs {
            let result = self.process_file(input, on_progress);
            debug_assert!(result.outcome.is_terminal());
            on_result(&result);
            results.push(result);
        }

        match remove_run_logs(self.context) {
            Ok(count) => debug!("removed {count} log files from {:?}", self.context.temp_dir),
            Err(err) => warn!("unable to clean up logs in {:?}: {err}", self.context.temp_dir),
        }
        results
    }

    pub fn process_file(&self, input: &Path, on_progress: &mut dyn FnMut(&ProgressUpdate)) -> FileResult {
        let mut task = match FileTask::new(input, &self.request.extension, self.context) {
            Ok(task) => task,
            Err(err) => {
                warn!("unable to read {input:?}: {err}");
                return FileResult::failed(PathBuf::from(input), ConversionOutcome::Unreadable);
            },
        };

        info!("{}: probing", task.short_name);
        task.duration = match self.probe(&task) {
            Ok(duration) => duration,
            Err(err) => {
                warn!("{err}");
                return FileResult::failed(task.source, ConversionOutcome::Unreadable);
            },
        };

        for pass in [1, 2] {
            info!("{}: pass {pass} of 2", task.short_name);
            if let Err(err) = self.encode_pass(&task, pass, on_progress) {
                warn!("{err}");
                if pass == 2 && task.output.exists() {
                    warn!("leaving partial output {:?} in place", task.output);
                }
                return FileResult::failed(task.source, ConversionOutcome::Error);
            }
        }

        self.decide(task)
    }

    fn probe(&self, task: &FileTask) -> Result<f64, ProcessError> {
        let logs = RunLogs::for_stage(self.context, "probe");
        let exit = run_to_completion(
            &self.runner,
            FFPROBE,
            &self.tools.ffprobe,
            &probe_args(&task.source),
            &logs.stdout,
            &logs.stderr,
            &task.source,
        )?;

        if run_failed(FFPROBE, exit, &logs.stderr) {
            return Err(ProcessError::for_file(FFPROBE, &task.source, "not a readable media file"));
        }

        let stdout = fs::read(&logs.stdout)
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
            .unwrap_or_default();
        match parse_duration(&stdout) {
            Some(duration) => {
                debug!("{}: duration {duration}s", task.short_name);
                Ok(duration)
            },
            None => {
                warn!("{}: unable to read a duration from {:?}; progress will be approximate", task.short_name, stdout.trim());
                Ok(PLACEHOLDER_DURATION)
            },
        }
    }

    fn encode_pass(&self, task: &FileTask, pass: u8, on_progress: &mut dyn FnMut(&ProgressUpdate)) -> Result<(), ProcessError> {
        let logs = RunLogs::for_stage(self.context, &format!("pass{pass}"));
        remove_stale_log(&logs.progress);

        let prefix = pass_log_prefix(self.context);
        let args = match pass {
            1 => pass1_args(self.request, &task.source, &logs.progress, &prefix),
            _ => pass2_args(self.request, &task.source, &task.output, &logs.progress, &prefix),
        };

        let mut process = self
            .runner
            .run(&self.tools.ffmpeg, &args, &logs.stdout, &logs.stderr)
            .map_err(|e| ProcessError::io(FFMPEG, &task.source, &format!("unable to start pass {pass}"), e))?;

        let output_name = task.output_name();
        let exit = self
            .monitor
            .track(
                &mut process,
                &mut LogFileSource::new(&logs.progress),
                task.duration,
                (pass, task.short_name.as_str(), output_name.as_str()),
                on_progress,
            )
            .map_err(|e| ProcessError::io(FFMPEG, &task.source, &format!("lost track of pass {pass}"), e))?;

        match run_failed(FFMPEG, exit, &logs.stderr) {
            true => Err(ProcessError::for_file(FFMPEG, &task.source, &format!("pass {pass} failed"))),
            false => Ok(()),
        }
    }

    fn decide(&self, task: FileTask) -> FileResult {
        let new_size = match fs::metadata(&task.output) {
            Ok(metadata) => metadata.len(),
            Err(err) => {
                warn!("{}: encoder reported success but {:?} is unreadable: {err}", task.short_name, task.output);
                return FileResult::failed(task.source, ConversionOutcome::Error);
            },
        };

        if self.request.match_timestamp {
            if let Err(err) = filetime::set_file_mtime(&task.output, task.modified) {
                warn!("unable to set modification time on {:?}: {err}", task.output);
            }
        }

        let evaluation = evaluate(task.size, new_size, self.request.required_improvement);
        if !evaluation.keep {
            info!(
                "{}: discarding output, {} -> {} is {:.1}% smaller but {}% is required",
                task.short_name,
                task.size.human_count_bytes(),
                new_size.human_count_bytes(),
                evaluation.improvement,
                self.request.required_improvement
            );
            if let Err(err) = fs::remove_file(&task.output) {
                warn!("unable to delete {:?}: {err}", task.output);
            }
            return FileResult {
                input: task.source,
                outcome: ConversionOutcome::Discarded,
                improvement: evaluation.improvement,
                output: PathBuf::new(),
            };
        }

        info!(
            "{}: converted, {} -> {} ({:.1}% smaller)",
            task.short_name,
            task.size.human_count_bytes(),
            new_size.human_count_bytes(),
            evaluation.improvement
        );
        FileResult {
            output: self.display_path(&task.output),
            input: task.source,
            outcome: ConversionOutcome::Converted,
            improvement: evaluation.improvement,
        }
    }

    fn display_path(&self, path: &Path) -> PathBuf {
        let absolute = match path.is_absolute() {
            true => PathBuf::from(path),
            false => self.context.working_dir.join(path),
        };
        if self.request.full_paths {
            return absolute;
        }
        match absolute.strip_prefix(&self.context.working_dir) {
            Ok(relative) => PathBuf::from(relative),
            Err(_) => absolute,
        }
    }
}

/// A log left over from an earlier pass would skew the first readings.
fn remove_stale_log(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => debug!("removed stale {path:?}"),
        Err(err) if err.kind() == io::ErrorKind::NotFound => (),
        Err(err) => warn!("unable to remove {path:?}: {err}"),
    }
}
