//! Pipeline interpretation.
//!
//! A pre-parsed description tree ([`node`]) enters the executor, which walks
//! it in document order: leaf operations resolve their templates and become
//! process invocations, containers iterate or gate their children, and
//! dynamic parameter nodes feed values back into the context store for later
//! siblings to read.

mod executor;
mod node;
mod operation;
mod skip;

pub use executor::ConversionExecutor;
pub use node::{
    DynamicParameter, ExecEachResource, ExecEachSegment, ExecEachSequence, ExecOnce, For, If,
    OperationNode, Pipe, PipelineDescription,
};
pub use operation::{OperationInfo, OperationType, PipeOperationInfo};
pub use skip::should_skip;
