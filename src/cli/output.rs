//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::DkrError;

/// Map domain/service errors to a string for CLI output.
pub fn map_error(e: &DkrError) -> String {
    e.to_string()
}

/// Process exit code for a failed command. Success is 0.
pub fn exit_code(e: &DkrError) -> i32 {
    e.severity().exit_code()
}
