use thiserror::Error;

/// Errors the core optimizer can raise.
///
/// All three variants are raised during validation, before the first
/// generation runs (see `SPEC_FULL.md` §7). `Cancelled` is deliberately not a
/// variant here: cancellation is a successful outcome, carried as
/// [`crate::response::Status::Cancelled`] inside an `Ok(OptimizeResponse)`.
#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid GA parameters: {0}")]
    InvalidParameters(String),

    #[error("internal invariant violated: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, PlannerError>;
