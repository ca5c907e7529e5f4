//! Imfconv - declarative conversion-pipeline interpreter
//!
//! This library crate exposes the core functionality for integration testing.

pub mod config;
pub mod context;
pub mod conversion;
pub mod process;
pub mod template;
pub mod timeline;
