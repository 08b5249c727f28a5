use thiserror::Error;

#[derive(Debug, Error)]
pub enum NudgeError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("http error: {0}")]
    Http(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("malformed extraction: {0}")]
    MalformedExtraction(String),
    #[error("reminder time must be in the future")]
    PastOrInvalidTime,
    #[error("storage error: {0}")]
    Storage(String),
    #[error("delivery failure: {0}")]
    Delivery(String),
    #[error("runtime error: {0}")]
    Runtime(String),
}

impl NudgeError {
    /// True for failures the caller can fix by changing the input.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            NudgeError::MalformedExtraction(_) | NudgeError::PastOrInvalidTime
        )
    }
}

pub use crate::Result;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn covers_display_and_rejection_classes() {
        let err = NudgeError::Config("x".to_string());
        assert!(format!("{err}").contains("configuration error"));
        assert!(NudgeError::PastOrInvalidTime.is_rejection());
        assert!(NudgeError::MalformedExtraction("{".to_string()).is_rejection());
        assert!(!NudgeError::Storage("disk".to_string()).is_rejection());
    }
}
