//! External process execution.
//!
//! The runner ([`runner`]) spawns one OS process per resolved leaf operation
//! and chains pipe stages through OS pipes; the wiring types ([`wiring`])
//! make every stdio decision explicit. Each process gets a dedicated log file
//! under the logs directory named
//! `{processNumber}_{operationName}_{operationType}_{programName}.log`,
//! stderr always included so children never block on an unread stream.

mod runner;
mod wiring;

pub use runner::ProcessRunner;
pub use wiring::{RedirectPolicy, StdinSource, StdioWiring, StdoutTarget};

use crate::conversion::OperationType;
use imfconv_common::Error;
use std::path::PathBuf;

/// Identity and launch parameters of one external process.
#[derive(Debug, Clone)]
pub struct ExternalProcessInfo {
    /// Monotonically increasing across the whole run, starting at 1.
    pub sequence: u64,
    /// Logical operation name from the pipeline description.
    pub operation_name: String,
    pub operation_type: OperationType,
    /// Display name of the program: the file stem of the first token.
    pub program: String,
    /// Full argv, program path first.
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    pub redirect: RedirectPolicy,
    pub redirect_file: Option<PathBuf>,
}

impl ExternalProcessInfo {
    /// Deterministic log file name for this process.
    pub fn log_file_name(&self) -> String {
        format!(
            "{}_{}_{}_{}.log",
            self.sequence,
            sanitize(&self.operation_name),
            self.operation_type,
            sanitize(&self.program),
        )
    }

    /// The command line for display, quoting arguments with spaces.
    pub fn describe_command(&self) -> String {
        self.args
            .iter()
            .map(|arg| {
                if arg.contains(char::is_whitespace) {
                    format!("\"{arg}\"")
                } else {
                    arg.clone()
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Wrap an I/O failure with this process's identity.
    pub fn io_error(&self, what: &str, e: &std::io::Error) -> Error {
        Error::ProcessIo {
            sequence: self.sequence,
            name: self.operation_name.clone(),
            op_type: self.operation_type.to_string(),
            program: self.program.clone(),
            message: format!("{what}: {e}"),
        }
    }
}

/// Split a resolved command line into argv tokens.
///
/// Whitespace separates tokens; double quotes group a token containing
/// spaces and are stripped. An unterminated quote runs to the end of the
/// string.
pub fn split_command(value: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    for c in value.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Restrict log-name components to filesystem-safe characters.
fn sanitize(part: &str) -> String {
    part.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
