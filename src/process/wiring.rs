//! Stdio wiring for external processes.
//!
//! Each stage of a pipe gets an explicit wiring decision for all three
//! streams. Keeping this separate from the spawning code makes the chaining
//! rules visible in one place: stdin is the null device or the previous
//! stage's stdout, stdout goes wherever the redirect policy says, and stderr
//! always lands in the stage's own log file so a child can never stall on an
//! unread error stream.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::process::{ChildStdout, Command, Stdio};

/// Where a process's stdout goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedirectPolicy {
    /// Merge into the process's own log file, alongside stderr.
    ErrLog,
    /// Write to an explicitly configured output file.
    File,
    /// Feed the next stage of a pipe.
    Pipe,
    /// Inherit the parent's stdout.
    Inherit,
}

impl RedirectPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            RedirectPolicy::ErrLog => "err_log",
            RedirectPolicy::File => "file",
            RedirectPolicy::Pipe => "pipe",
            RedirectPolicy::Inherit => "inherit",
        }
    }
}

impl std::fmt::Display for RedirectPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a process reads stdin from.
#[derive(Debug)]
pub enum StdinSource {
    /// The null device. First stage of a pipe, and every standalone process.
    Null,
    /// The previous stage's stdout.
    Previous(ChildStdout),
}

/// Where a process writes stdout.
#[derive(Debug)]
pub enum StdoutTarget {
    /// A pipe read by the next stage.
    NextStage,
    /// An open file handle: an explicit output or the process's own log.
    File(File),
    /// The parent's stdout.
    Inherit,
}

/// Complete stdio wiring for one process.
#[derive(Debug)]
pub struct StdioWiring {
    pub stdin: StdinSource,
    pub stdout: StdoutTarget,
    /// The process's log file. stderr is never piped or inherited.
    pub stderr: File,
}

impl StdioWiring {
    /// Apply the wiring to a command builder, consuming the handles.
    pub fn apply(self, cmd: &mut Command) {
        match self.stdin {
            StdinSource::Null => cmd.stdin(Stdio::null()),
            StdinSource::Previous(out) => cmd.stdin(Stdio::from(out)),
        };
        match self.stdout {
            StdoutTarget::NextStage => cmd.stdout(Stdio::piped()),
            StdoutTarget::File(f) => cmd.stdout(Stdio::from(f)),
            StdoutTarget::Inherit => cmd.stdout(Stdio::inherit()),
        };
        cmd.stderr(Stdio::from(self.stderr));
    }
}
