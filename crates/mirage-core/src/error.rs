//! Error types for Mirage operations.
//!
//! Configuration and genome-structure problems fail fast; replay
//! divergence is reported through a verification report instead.

use thiserror::Error;

/// Result type for Mirage operations.
pub type Result<T> = std::result::Result<T, MirageError>;

/// Errors that can occur while building worlds, genomes or trainers.
#[derive(Error, Debug)]
pub enum MirageError {
    /// A configuration value or argument is out of its legal domain.
    #[error("invalid configuration: {field}: {reason}")]
    InvalidConfiguration { field: String, reason: String },

    /// A genome violates a structural invariant (dangling node, duplicate edge, cycle).
    #[error("corrupt genome: {0}")]
    CorruptGenome(String),

    /// The same connection pair was seen with two different innovation ids,
    /// or one innovation id was seen on two different pairs.
    #[error(
        "conflicting innovation for {in_node}->{out_node}: table has {existing}, genome has {found}"
    )]
    ConflictingInnovation {
        in_node: u32,
        out_node: u32,
        existing: u64,
        found: u64,
    },

    /// I/O errors (wrapped).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// Convenience constructors
impl MirageError {
    pub fn invalid_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        MirageError::InvalidConfiguration {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn corrupt_genome(msg: impl Into<String>) -> Self {
        MirageError::CorruptGenome(msg.into())
    }

    /// True for configuration errors.
    pub fn is_invalid_config(&self) -> bool {
        matches!(self, MirageError::InvalidConfiguration { .. })
    }
}

/// Fail with `InvalidConfiguration` unless `value` lies in `[0, 1]`.
pub fn ensure_unit_interval(field: &str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(MirageError::invalid_config(
            field,
            format!("{} must be within [0, 1]", value),
        ));
    }
    Ok(())
}

/// Fail with `InvalidConfiguration` unless `value` is finite and strictly positive.
pub fn ensure_positive(field: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(MirageError::invalid_config(
            field,
            format!("{} must be a positive finite number", value),
        ));
    }
    Ok(())
}

/// Fail with `InvalidConfiguration` unless `value` is finite and not negative.
pub fn ensure_non_negative(field: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(MirageError::invalid_config(
            field,
            format!("{} must be a non-negative finite number", value),
        ));
    }
    Ok(())
}
