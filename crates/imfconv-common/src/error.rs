//! Unified error type for the imfconv application.
//!
//! All crates funnel their failures into [`Error`]. The variants follow the
//! three fatal classes a conversion run can hit: template-parameter
//! resolution errors, execution errors (pipeline-description defects found at
//! runtime), and external-process failures. Nothing here is recoverable; the
//! first error anywhere aborts the whole run.

/// Unified error type covering all failure modes in imfconv.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A template placeholder is syntactically malformed (unbalanced braces,
    /// empty scope or name).
    #[error("invalid template parameter '{parameter}': {reason}")]
    InvalidTemplateParameter {
        /// The offending template text.
        parameter: String,
        /// What made it invalid.
        reason: String,
    },

    /// A placeholder names a scope that does not exist.
    #[error("unknown template parameter context '{context}' in '{parameter}'")]
    UnknownTemplateParameterContext {
        /// The full placeholder body as written.
        parameter: String,
        /// The unrecognized scope token.
        context: String,
    },

    /// A recognized scope has no parameter of the requested name at the
    /// resolved coordinate.
    #[error("unknown template parameter name '{name}' in context '{context}'")]
    UnknownTemplateParameterName {
        /// The scope that was consulted.
        context: String,
        /// The parameter name that is not defined there.
        name: String,
    },

    /// A recognized parameter has no value for the current coordinate, or
    /// resolved to an empty value.
    #[error("template parameter '{context}.{name}' not found: {reason}")]
    TemplateParameterNotFound {
        /// The scope that was consulted.
        context: String,
        /// The parameter name that was looked up.
        name: String,
        /// Which coordinate or value was missing.
        reason: String,
    },

    /// Placeholder resolution recursed past the fixed depth limit, which
    /// means a dynamic parameter refers to itself (directly or mutually).
    #[error("template parameter resolution exceeded depth {limit} for '{parameter}'")]
    TemplateDepthExceeded {
        /// The template whose resolution did not terminate.
        parameter: String,
        /// The depth limit that was hit.
        limit: u32,
    },

    /// A pipeline-description defect discovered at runtime (bad loop bounds,
    /// a resource iterator outside a (segment, sequence) binding, etc.).
    #[error("execution error: {0}")]
    Execution(String),

    /// An external process exited with a nonzero code.
    #[error("process {sequence} [{name}/{op_type}/{program}] exited with code {code}")]
    ProcessFailed {
        /// Run-wide process sequence number.
        sequence: u64,
        /// Logical operation name from the pipeline description.
        name: String,
        /// Operation type tag ("once", "pipe", "cycle").
        op_type: String,
        /// Program that was invoked.
        program: String,
        /// Exit code; -1 when the process died to a signal.
        code: i32,
    },

    /// An external process could not be started, waited on, or closed.
    #[error("process {sequence} [{name}/{op_type}/{program}] I/O failure: {message}")]
    ProcessIo {
        /// Run-wide process sequence number.
        sequence: u64,
        /// Logical operation name from the pipeline description.
        name: String,
        /// Operation type tag ("once", "pipe", "cycle").
        op_type: String,
        /// Program that was invoked.
        program: String,
        /// The underlying failure.
        message: String,
    },

    /// An I/O error outside any single process's lifecycle (log directory
    /// creation, redirect-file creation).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Convenience constructor for [`Error::InvalidTemplateParameter`].
    pub fn invalid_parameter(parameter: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidTemplateParameter {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }

    /// Convenience constructor for [`Error::UnknownTemplateParameterContext`].
    pub fn unknown_context(parameter: impl Into<String>, context: impl Into<String>) -> Self {
        Error::UnknownTemplateParameterContext {
            parameter: parameter.into(),
            context: context.into(),
        }
    }

    /// Convenience constructor for [`Error::UnknownTemplateParameterName`].
    pub fn unknown_name(context: impl Into<String>, name: impl Into<String>) -> Self {
        Error::UnknownTemplateParameterName {
            context: context.into(),
            name: name.into(),
        }
    }

    /// Convenience constructor for [`Error::TemplateParameterNotFound`].
    pub fn not_found(
        context: impl Into<String>,
        name: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Error::TemplateParameterNotFound {
            context: context.into(),
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Convenience constructor for [`Error::Execution`].
    pub fn execution(message: impl Into<String>) -> Self {
        Error::Execution(message.into())
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
