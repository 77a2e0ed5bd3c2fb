//! Error types for the dynamics engine.

use thiserror::Error;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, BallisticsError>;

/// Errors surfaced by validation, inversion and registry persistence
#[derive(Debug, Error)]
pub enum BallisticsError {
    /// A record field is missing or outside its declared domain
    #[error("invalid parameter `{field}`: {reason}")]
    InvalidParameter {
        field: &'static str,
        reason: String,
    },

    /// The position-from-velocity sensitivity block of `A^T` cannot be inverted
    #[error(
        "target unreachable: sensitivity matrix C = (A^{horizon})[0..2, 2..4] is singular \
         or ill-conditioned (det = {determinant:e})"
    )]
    TargetUnreachable { determinant: f64, horizon: usize },

    #[error("registry I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("registry serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BallisticsError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        BallisticsError::InvalidParameter {
            field,
            reason: reason.into(),
        }
    }

    /// Name of the offending field, for `InvalidParameter` errors
    pub fn field(&self) -> Option<&'static str> {
        match self {
            BallisticsError::InvalidParameter { field, .. } => Some(field),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_parameter_message_names_field() {
        let err = BallisticsError::invalid("m", "mass must be positive, got 0");
        assert_eq!(err.field(), Some("m"));
        assert_eq!(
            err.to_string(),
            "invalid parameter `m`: mass must be positive, got 0"
        );
    }

    #[test]
    fn test_target_unreachable_reports_horizon() {
        let err = BallisticsError::TargetUnreachable {
            determinant: 0.0,
            horizon: 4,
        };
        let msg = err.to_string();
        assert!(msg.contains("A^4"), "{msg}");
        assert!(msg.contains("singular"));
        assert_eq!(err.field(), None);
    }
}
