use std::ffi::OsString;
use std::fs::{self, File};
use std::io;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};

use log::{debug, warn};

use crate::error::ProcessError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProcessExit {
    pub code: Option<i32>,
}

impl ProcessExit {
    pub fn with_code(code: i32) -> Self {
        ProcessExit { code: Some(code) }
    }
}

impl From<ExitStatus> for ProcessExit {
    fn from(status: ExitStatus) -> Self {
        ProcessExit { code: status.code() }
    }
}

pub trait RunningProcess {
    fn try_wait(&mut self) -> io::Result<Option<ProcessExit>>;

    fn wait(&mut self) -> io::Result<ProcessExit>;
}

pub trait ProcessRunner {
    type Process: RunningProcess;

    /// Starts `executable` without waiting. Standard output and standard
    /// error go to the given files, never to this program's console.
    fn run(
        &self,
        executable: &Path,
        args: &[OsString],
        stdout_log: &Path,
        stderr_log: &Path,
    ) -> io::Result<Self::Process>;
}

impl<T: ProcessRunner + ?Sized> ProcessRunner for &T {
    type Process = T::Process;

    fn run(&self, executable: &Path, args: &[OsString], stdout_log: &Path, stderr_log: &Path) -> io::Result<T::Process> {
        (**self).run(executable, args, stdout_log, stderr_log)
    }
}

pub struct ChildProcess {
    child: Child,
}

impl RunningProcess for ChildProcess {
    fn try_wait(&mut self) -> io::Result<Option<ProcessExit>> {
        Ok(self.child.try_wait()?.map(ProcessExit::from))
    }

    fn wait(&mut self) -> io::Result<ProcessExit> {
        Ok(self.child.wait()?.into())
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    type Process = ChildProcess;

    fn run(
        &self,
        executable: &Path,
        args: &[OsString],
        stdout_log: &Path,
        stderr_log: &Path,
    ) -> io::Result<ChildProcess> {
        debug!("{} {}", executable.display(), args.iter().map(|s| format!("{:?}", s)).collect::<Vec<String>>().join(" "));

        let child = Command::new(executable)
            .args(args)
            .stdin(Stdio::null())
            .stdout(File::create(stdout_log)?)
            .stderr(File::create(stderr_log)?)
            .spawn()?;
        Ok(ChildProcess { child })
    }
}

pub fn run_to_completion<R: ProcessRunner>(
    runner: &R,
    tool: &str,
    executable: &Path,
    args: &[OsString],
    stdout_log: &Path,
    stderr_log: &Path,
    input: &Path,
) -> Result<ProcessExit, ProcessError> {
    let mut process = runner
        .run(executable, args, stdout_log, stderr_log)
        .map_err(|e| ProcessError::io(tool, input, "unable to start", e))?;
    process
        .wait()
        .map_err(|e| ProcessError::io(tool, input, "unable to wait for exit", e))
}

/// A run failed when it exited with a positive code or wrote anything to its
/// error log. An exit without any code (killed by a signal) also counts as a
/// failure, which is stricter than the positive-code rule alone.
pub fn run_failed(tool: &str, exit: ProcessExit, stderr_log: &Path) -> bool {
    let diagnostics = match fs::read(stderr_log) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(err) if err.kind() == io::ErrorKind::NotFound => String::new(),
        Err(err) => {
            warn!("{tool}: unable to read {stderr_log:?}: {err}");
            String::new()
        },
    };

    let exited_badly = match exit.code {
        Some(code) => code > 0,
        // signalled
        None => true,
    };
    let failed = exited_badly || !diagnostics.is_empty();

    if failed {
        match exit.code {
            Some(code) => debug!("{tool} exited with {code}"),
            None => warn!("{tool} exited without an exit code"),
        }
        for line in diagnostics.lines() {
            warn!("{tool}: {line}");
        }
    }

    failed
}
