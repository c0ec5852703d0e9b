use thiserror::Error;

#[derive(Error, Debug)]
pub enum DuelError {
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Backend call failed: {0}")]
    BackendCallFailed(String),

    #[error("Malformed response: {excerpt}")]
    MalformedResponse { excerpt: String },

    #[error("Incomplete record: {0}")]
    IncompleteRecord(String),

    #[error("Battle has not been initialized")]
    NotInitialized,

    #[error("Battle was already initialized")]
    AlreadyInitialized,

    #[error("Invalid action: {0}")]
    InvalidAction(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),
}

impl DuelError {
    /// True for errors caused by the caller driving the engine out of order.
    ///
    /// Everything else is a recoverable runtime condition the engine absorbs.
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, DuelError::NotInitialized | DuelError::AlreadyInitialized)
    }
}

pub type Result<T> = std::result::Result<T, DuelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contract_violations_are_distinct() {
        assert!(DuelError::NotInitialized.is_contract_violation());
        assert!(DuelError::AlreadyInitialized.is_contract_violation());
        assert!(!DuelError::BackendCallFailed("timeout".into()).is_contract_violation());
        assert!(!DuelError::MalformedResponse {
            excerpt: "oops".into()
        }
        .is_contract_violation());
    }

    #[test]
    fn test_serde_error_converts() {
        fn parse(text: &str) -> Result<serde_json::Value> {
            Ok(serde_json::from_str(text)?)
        }
        let err = parse("{not json").unwrap_err();
        assert!(matches!(err, DuelError::SerdeError(_)));
        assert!(err.to_string().starts_with("Serialization error"));
        assert!(!err.is_contract_violation());
    }

    #[test]
    fn test_error_messages() {
        let err = DuelError::IncompleteRecord("missing status".into());
        assert_eq!(err.to_string(), "Incomplete record: missing status");
    }
}
