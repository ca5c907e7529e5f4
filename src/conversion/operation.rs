//! Resolved operations ready for the process runner.

use crate::context::ContextInfo;
use crate::process::RedirectPolicy;
use std::path::PathBuf;

/// Classification of a leaf invocation.
///
/// Appears in log file names and failure diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationType {
    /// A standalone invocation.
    Once,
    /// A fixed head stage of a pipe.
    PipeTail,
    /// A stage contributed by a pipe's cycle.
    PipeCycle,
}

impl OperationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::Once => "once",
            OperationType::PipeTail => "pipe",
            OperationType::PipeCycle => "cycle",
        }
    }
}

impl std::fmt::Display for OperationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One fully resolved invocation.
///
/// `value` is the complete command line with every placeholder substituted.
/// When `skip` is set the operation was excluded before resolution and
/// `value` is empty; the runner never sees skipped operations.
#[derive(Debug, Clone)]
pub struct OperationInfo {
    pub name: String,
    pub op_type: OperationType,
    pub value: String,
    pub context: ContextInfo,
    pub skip: bool,
    /// Stdout policy when run standalone or as the final stage of a pipe.
    pub redirect: RedirectPolicy,
    /// Output path for the `file` policy, already resolved.
    pub redirect_file: Option<PathBuf>,
}

/// A resolved pipe: fixed tail stages plus per-iteration cycle groups.
///
/// The executable chain is the tail in document order followed by each cycle
/// group in iteration order, with skipped members omitted.
#[derive(Debug, Clone)]
pub struct PipeOperationInfo {
    tail: Vec<OperationInfo>,
    cycles: Vec<Vec<OperationInfo>>,
    redirect: RedirectPolicy,
    redirect_file: Option<PathBuf>,
}

impl PipeOperationInfo {
    /// An empty pipe whose final stage follows the given stdout policy.
    pub fn new(redirect: RedirectPolicy, redirect_file: Option<PathBuf>) -> Self {
        Self {
            tail: Vec::new(),
            cycles: Vec::new(),
            redirect,
            redirect_file,
        }
    }

    pub fn push_tail(&mut self, op: OperationInfo) {
        self.tail.push(op);
    }

    pub fn push_cycle(&mut self, group: Vec<OperationInfo>) {
        self.cycles.push(group);
    }

    pub fn tail(&self) -> &[OperationInfo] {
        &self.tail
    }

    pub fn cycles(&self) -> &[Vec<OperationInfo>] {
        &self.cycles
    }

    /// Stdout policy of the final executable stage.
    pub fn redirect(&self) -> RedirectPolicy {
        self.redirect
    }

    pub fn redirect_file(&self) -> Option<&PathBuf> {
        self.redirect_file.as_ref()
    }

    /// The executable chain: tail stages then cycle groups, skipped members
    /// omitted.
    pub fn stages(&self) -> Vec<&OperationInfo> {
        self.tail
            .iter()
            .chain(self.cycles.iter().flatten())
            .filter(|op| !op.skip)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(name: &str, op_type: OperationType, skip: bool) -> OperationInfo {
        OperationInfo {
            name: name.to_string(),
            op_type,
            value: if skip { String::new() } else { format!("{name} --run") },
            context: ContextInfo::empty(),
            skip,
            redirect: RedirectPolicy::ErrLog,
            redirect_file: None,
        }
    }

    #[test]
    fn test_stages_order_tail_then_cycles() {
        let mut pipe = PipeOperationInfo::new(RedirectPolicy::ErrLog, None);
        pipe.push_tail(op("t1", OperationType::PipeTail, false));
        pipe.push_tail(op("t2", OperationType::PipeTail, false));
        pipe.push_cycle(vec![op("c1", OperationType::PipeCycle, false)]);
        pipe.push_cycle(vec![
            op("c2a", OperationType::PipeCycle, false),
            op("c2b", OperationType::PipeCycle, false),
        ]);
        let names: Vec<&str> = pipe.stages().iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["t1", "t2", "c1", "c2a", "c2b"]);
    }

    #[test]
    fn test_stages_omit_skipped() {
        let mut pipe = PipeOperationInfo::new(RedirectPolicy::ErrLog, None);
        pipe.push_tail(op("t1", OperationType::PipeTail, true));
        pipe.push_cycle(vec![
            op("c1", OperationType::PipeCycle, false),
            op("c2", OperationType::PipeCycle, true),
        ]);
        let names: Vec<&str> = pipe.stages().iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["c1"]);
    }

    #[test]
    fn test_operation_type_tokens() {
        assert_eq!(OperationType::Once.to_string(), "once");
        assert_eq!(OperationType::PipeTail.to_string(), "pipe");
        assert_eq!(OperationType::PipeCycle.to_string(), "cycle");
    }
}
