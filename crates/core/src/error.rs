use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid phase id: {0}")]
    InvalidPhase(String),

    #[error("Invalid lifecycle transition from {from} to {to}")]
    InvalidLifecycleTransition { from: String, to: String },

    #[error("Invalid unlock code: {0}")]
    InvalidCode(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = CoreError::InvalidPhase("42".to_string());
        assert!(error.to_string().contains("42"));
    }
}
