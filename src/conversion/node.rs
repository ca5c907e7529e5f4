//! The pipeline description tree.
//!
//! A description is produced by an external loader and handed to the
//! executor already parsed. The node set is closed: the executor matches
//! exhaustively, so a malformed kind can only fail at deserialization, never
//! at run time.
//!
//! Every node carries an optional `skip` expression. Container nodes pass
//! theirs down to descendants; leaf nodes evaluate the inherited chain plus
//! their own right before acting.

use crate::process::RedirectPolicy;
use imfconv_common::SequenceType;
use serde::{Deserialize, Serialize};

/// A complete pipeline description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDescription {
    /// Display name for logs.
    #[serde(default)]
    pub name: Option<String>,
    pub operations: Vec<OperationNode>,
}

/// One node of a pipeline description.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OperationNode {
    ExecOnce(ExecOnce),
    DynamicParameter(DynamicParameter),
    For(For),
    If(If),
    Pipe(Pipe),
    ExecEachSegment(ExecEachSegment),
    ExecEachSequence(ExecEachSequence),
    ExecEachResource(ExecEachResource),
}

impl OperationNode {
    /// The node's own skip expression, if any.
    pub fn skip_expression(&self) -> Option<&str> {
        match self {
            OperationNode::ExecOnce(n) => n.skip.as_deref(),
            OperationNode::DynamicParameter(n) => n.skip.as_deref(),
            OperationNode::For(n) => n.skip.as_deref(),
            OperationNode::If(n) => n.skip.as_deref(),
            OperationNode::Pipe(n) => n.skip.as_deref(),
            OperationNode::ExecEachSegment(n) => n.skip.as_deref(),
            OperationNode::ExecEachSequence(n) => n.skip.as_deref(),
            OperationNode::ExecEachResource(n) => n.skip.as_deref(),
        }
    }

    /// The node kind token, as written in descriptions.
    pub fn kind(&self) -> &'static str {
        match self {
            OperationNode::ExecOnce(_) => "exec_once",
            OperationNode::DynamicParameter(_) => "dynamic_parameter",
            OperationNode::For(_) => "for",
            OperationNode::If(_) => "if",
            OperationNode::Pipe(_) => "pipe",
            OperationNode::ExecEachSegment(_) => "exec_each_segment",
            OperationNode::ExecEachSequence(_) => "exec_each_sequence",
            OperationNode::ExecEachResource(_) => "exec_each_resource",
        }
    }
}

/// A single external process invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecOnce {
    /// Logical name, used in log file names and diagnostics.
    pub name: String,
    /// Command template. The first token is the program, usually a
    /// `%{tool.*}` reference.
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip: Option<String>,
    /// Stdout policy. Defaults to `err_log`, or `file` when `output` is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<RedirectPolicy>,
    /// Output path template for the `file` policy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

/// A dynamic context write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DynamicParameter {
    /// Parameter name template. May itself contain placeholders.
    pub name: String,
    /// Value template, resolved at write time.
    pub value: String,
    /// Concatenate onto the existing value instead of overwriting.
    #[serde(default)]
    pub concat: bool,
    /// Remove the file or directory the value names when the run ends.
    #[serde(default)]
    pub delete_on_exit: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip: Option<String>,
}

/// A bounded counting loop.
///
/// `from`, `to`, and `count` are templates resolved to integers at run time.
/// The loop runs `count` times when `count` is nonzero, otherwise `to - from`
/// times, with the iterator taking consecutive values starting at `from`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct For {
    /// Iterator name bound for nested resolution, referenced as `%{name}`.
    pub iterator: String,
    #[serde(default = "zero")]
    pub from: String,
    #[serde(default = "zero")]
    pub to: String,
    #[serde(default = "zero")]
    pub count: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip: Option<String>,
    pub operations: Vec<OperationNode>,
}

fn zero() -> String {
    "0".to_string()
}

/// A conditional subtree.
///
/// When `test` resolves false the children never run, including any dynamic
/// context writes they would have made.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct If {
    pub test: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip: Option<String>,
    pub operations: Vec<OperationNode>,
}

/// A multi-stage OS pipeline.
///
/// The fixed `tail` stages come first in the chain; `cycle` children append
/// one group of stages per iteration. The whole flattened chain runs as one
/// OS pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pipe {
    #[serde(default)]
    pub tail: Vec<ExecOnce>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cycle: Option<Vec<OperationNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip: Option<String>,
    /// Stdout policy of the final stage. Defaults like [`ExecOnce`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<RedirectPolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

/// Runs children once per registered segment, in first-seen order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecEachSegment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip: Option<String>,
    pub operations: Vec<OperationNode>,
}

/// Runs children once per registered sequence of one type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecEachSequence {
    #[serde(rename = "type")]
    pub seq_type: SequenceType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip: Option<String>,
    pub operations: Vec<OperationNode>,
}

/// Runs children once per resource of the bound (segment, sequence) cell.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecEachResource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip: Option<String>,
    pub operations: Vec<OperationNode>,
}
