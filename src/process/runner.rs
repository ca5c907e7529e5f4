//! Spawns and supervises external processes.

use crate::conversion::{OperationInfo, PipeOperationInfo};
use crate::process::wiring::{RedirectPolicy, StdinSource, StdioWiring, StdoutTarget};
use crate::process::{split_command, ExternalProcessInfo};
use imfconv_common::{Error, Result};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, ExitStatus};
use tracing::{debug, info, warn};

/// Runs resolved operations as OS processes.
///
/// Assigns every process a sequence number that is monotonically increasing
/// across the whole run, owns the per-process log files, and enforces the
/// exit-code discipline: the first nonzero exit anywhere fails the run.
#[derive(Debug)]
pub struct ProcessRunner {
    working_dir: PathBuf,
    logs_dir: PathBuf,
    dry_run: bool,
    next_sequence: u64,
}

impl ProcessRunner {
    pub fn new(working_dir: impl Into<PathBuf>, logs_dir: impl Into<PathBuf>, dry_run: bool) -> Self {
        Self {
            working_dir: working_dir.into(),
            logs_dir: logs_dir.into(),
            dry_run,
            next_sequence: 1,
        }
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn logs_dir(&self) -> &Path {
        &self.logs_dir
    }

    /// Number of processes prepared so far.
    pub fn process_count(&self) -> u64 {
        self.next_sequence - 1
    }

    /// Run one standalone operation and wait for it.
    pub fn run_once(&mut self, op: &OperationInfo) -> Result<()> {
        let proc = self.prepare(op)?;
        if self.dry_run {
            info!("[DRY RUN] Would execute: {}", proc.describe_command());
            return Ok(());
        }
        std::fs::create_dir_all(&self.logs_dir)?;
        let log = self.open_log(&proc)?;
        let stdout = match proc.redirect {
            RedirectPolicy::ErrLog => StdoutTarget::File(
                log.try_clone().map_err(|e| proc.io_error("log", &e))?,
            ),
            RedirectPolicy::File => StdoutTarget::File(self.create_output(&proc)?),
            RedirectPolicy::Inherit => StdoutTarget::Inherit,
            RedirectPolicy::Pipe => {
                return Err(Error::execution(format!(
                    "operation '{}' uses the pipe redirect outside a pipe",
                    proc.operation_name
                )))
            }
        };
        let wiring = StdioWiring {
            stdin: StdinSource::Null,
            stdout,
            stderr: log,
        };
        let mut child = self.spawn(&proc, wiring)?;
        let status = child.wait().map_err(|e| proc.io_error("wait", &e))?;
        check_exit(&proc, status)
    }

    /// Run a resolved pipe as one OS pipeline.
    ///
    /// All member processes are started in chain order, then all are waited
    /// on. The reported failure is the first failing member in chain order;
    /// every started member is waited on and its handles closed regardless.
    pub fn run_pipeline(&mut self, pipe: &PipeOperationInfo) -> Result<()> {
        let stages = pipe.stages();
        if stages.is_empty() {
            return Ok(());
        }
        let mut procs = Vec::with_capacity(stages.len());
        for (i, op) in stages.iter().enumerate() {
            let mut proc = self.prepare(op)?;
            if i + 1 < stages.len() {
                proc.redirect = RedirectPolicy::Pipe;
                proc.redirect_file = None;
            } else {
                proc.redirect = pipe.redirect();
                proc.redirect_file = pipe.redirect_file().cloned();
            }
            procs.push(proc);
        }
        if self.dry_run {
            let chain: Vec<String> = procs.iter().map(|p| p.describe_command()).collect();
            info!("[DRY RUN] Would execute pipe: {}", chain.join(" | "));
            return Ok(());
        }
        std::fs::create_dir_all(&self.logs_dir)?;

        debug!(stages = procs.len(), "starting pipe");
        let mut children: Vec<Child> = Vec::with_capacity(procs.len());
        if let Err(e) = self.spawn_chain(&procs, &mut children) {
            abort_chain(&mut children);
            return Err(e);
        }

        // Wait on every member before reporting, so no child leaks even when
        // an early stage fails.
        let mut first_failure: Option<Error> = None;
        for (proc, child) in procs.iter().zip(children.iter_mut()) {
            let outcome = match child.wait() {
                Ok(status) => check_exit(proc, status),
                Err(e) => Err(proc.io_error("wait", &e)),
            };
            if let Err(e) = outcome {
                if first_failure.is_none() {
                    first_failure = Some(e);
                }
            }
        }
        match first_failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn spawn_chain(&self, procs: &[ExternalProcessInfo], children: &mut Vec<Child>) -> Result<()> {
        let mut previous: Option<ChildStdout> = None;
        for (i, proc) in procs.iter().enumerate() {
            let last = i + 1 == procs.len();
            let log = self.open_log(proc)?;
            let stdin = match previous.take() {
                Some(out) => StdinSource::Previous(out),
                None => StdinSource::Null,
            };
            let stdout = if last {
                match proc.redirect {
                    RedirectPolicy::File => StdoutTarget::File(self.create_output(proc)?),
                    RedirectPolicy::Inherit => StdoutTarget::Inherit,
                    // err_log is the final-stage default; pipe cannot apply
                    // to the last member.
                    _ => StdoutTarget::File(log.try_clone().map_err(|e| proc.io_error("log", &e))?),
                }
            } else {
                StdoutTarget::NextStage
            };
            let wiring = StdioWiring {
                stdin,
                stdout,
                stderr: log,
            };
            let mut child = self.spawn(proc, wiring)?;
            if !last {
                previous = child.stdout.take();
            }
            children.push(child);
        }
        Ok(())
    }

    fn prepare(&mut self, op: &OperationInfo) -> Result<ExternalProcessInfo> {
        let args = split_command(&op.value);
        if args.is_empty() {
            return Err(Error::execution(format!(
                "operation '{}' resolved to an empty command",
                op.name
            )));
        }
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        let program = program_name(&args[0]);
        Ok(ExternalProcessInfo {
            sequence,
            operation_name: op.name.clone(),
            operation_type: op.op_type,
            program,
            args,
            working_dir: self.working_dir.clone(),
            redirect: op.redirect,
            redirect_file: op.redirect_file.clone(),
        })
    }

    fn spawn(&self, proc: &ExternalProcessInfo, wiring: StdioWiring) -> Result<Child> {
        let mut cmd = Command::new(&proc.args[0]);
        cmd.args(&proc.args[1..]);
        cmd.current_dir(&proc.working_dir);
        wiring.apply(&mut cmd);
        debug!(
            sequence = proc.sequence,
            program = %proc.program,
            operation = %proc.operation_name,
            "starting process"
        );
        cmd.spawn().map_err(|e| Error::ProcessIo {
            sequence: proc.sequence,
            name: proc.operation_name.clone(),
            op_type: proc.operation_type.to_string(),
            program: proc.program.clone(),
            message: format!("failed to spawn: {e}"),
        })
    }

    fn open_log(&self, proc: &ExternalProcessInfo) -> Result<File> {
        let path = self.logs_dir.join(proc.log_file_name());
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| proc.io_error("open log file", &e))
    }

    fn create_output(&self, proc: &ExternalProcessInfo) -> Result<File> {
        let path = proc.redirect_file.as_ref().ok_or_else(|| {
            Error::execution(format!(
                "operation '{}' uses the file redirect without an output path",
                proc.operation_name
            ))
        })?;
        File::create(path).map_err(|e| proc.io_error("create output file", &e))
    }
}

/// Kill and reap every already-started member of a failed pipe.
fn abort_chain(children: &mut Vec<Child>) {
    for child in children.iter_mut() {
        if let Err(e) = child.kill() {
            debug!(error = %e, "kill failed, process likely already exited");
        }
        if let Err(e) = child.wait() {
            warn!(error = %e, "failed to reap aborted pipe member");
        }
    }
    children.clear();
}

fn check_exit(proc: &ExternalProcessInfo, status: ExitStatus) -> Result<()> {
    if status.success() {
        debug!(sequence = proc.sequence, program = %proc.program, "process finished");
        return Ok(());
    }
    // Signal death has no exit code; report -1.
    let code = status.code().unwrap_or(-1);
    Err(Error::ProcessFailed {
        sequence: proc.sequence,
        name: proc.operation_name.clone(),
        op_type: proc.operation_type.to_string(),
        program: proc.program.clone(),
        code,
    })
}

/// The program's display name: the file stem of the first command token.
fn program_name(first_token: &str) -> String {
    let path = Path::new(first_token);
    path.file_stem()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| first_token.to_string())
}
