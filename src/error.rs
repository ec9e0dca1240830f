//! Crate error type.
//!
//! Only configuration problems are errors. Unsatisfiable periods and
//! degenerate runs are handled inside the search and reported through
//! fitness and [`EngineOutput`](crate::ga::EngineOutput).

use crate::validation::ValidationError;

/// Errors raised before the generation loop starts.
#[derive(Debug, thiserror::Error)]
pub enum TimetableError {
    /// The problem instance failed validation.
    #[error("configuration rejected ({} problem(s)): {}", .0.len(), join_messages(.0))]
    Configuration(Vec<ValidationError>),

    /// A run was requested with zero generations.
    #[error("generation count must be at least 1")]
    ZeroGenerations,

    /// The configuration object was written for another schema version.
    #[error("unsupported config version {found} (expected {expected})")]
    UnsupportedConfigVersion { found: u32, expected: u32 },

    /// A numeric parameter is outside its allowed range.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// Configuration JSON could not be parsed.
    #[error("malformed configuration JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Crate result alias.
pub type Result<T> = std::result::Result<T, TimetableError>;

fn join_messages(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}
