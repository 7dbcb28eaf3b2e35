//! Input/Output handling for the CLI.
//!
//! This module provides:
//! - Complaint and corpus file loading
//! - Unified output formatting (text, JSON)
//! - Consistent exit codes

pub mod exit_code;
pub mod format;
pub mod input;

pub use exit_code::ExitCode;
pub use format::{ErrorDetails, JsonResponse, OutputFormat, ResponseMeta};
pub use input::{InputError, read_complaints, read_corpus};
