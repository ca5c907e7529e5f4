//! Shared types for the imfconv pipeline interpreter.
//!
//! This crate provides:
//! - Typed IDs for segments, sequences, and resources ([`ids`])
//! - The unified error type for template resolution and process execution
//!   ([`error`])
//!
//! # Example
//!
//! ```
//! use imfconv_common::{SegmentId, SequenceType};
//!
//! let id = SegmentId::new();
//! assert_eq!(SequenceType::Audio.as_str(), "audio");
//! ```

pub mod error;
pub mod ids;

pub use error::{Error, Result};
pub use ids::{ResourceId, SegmentId, SequenceId, SequenceType};
