//! Integration tests for error types

#[cfg(test)]
mod tests {
    use datalift_errors::*;

    #[test]
    fn test_error_conversion() {
        let net_err = NetworkError::Timeout {
            url: "https://example.com".into(),
        };
        let err: Error = net_err.into();
        assert!(matches!(err, Error::Network(_)));
    }

    #[test]
    fn test_error_display() {
        let err = StorageError::ObjectNotFound {
            bucket: "training-data".into(),
            object: "training/ICN123/att1.png".into(),
        };
        assert_eq!(
            err.to_string(),
            "object not found: training-data/training/ICN123/att1.png"
        );
    }

    #[test]
    fn test_error_clone() {
        let err = AutomlError::ImportAlreadyRunning {
            dataset: "ICN123".into(),
        };
        let cloned = err.clone();
        assert_eq!(err.to_string(), cloned.to_string());
    }

    #[test]
    fn test_retryability() {
        let err: Error = NetworkError::HttpError {
            status: 503,
            message: "service unavailable".into(),
        }
        .into();
        assert!(err.is_retryable());

        let err: Error = NetworkError::HttpError {
            status: 404,
            message: "not found".into(),
        }
        .into();
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_user_codes() {
        let err: Error = StateError::Conflict { expected: 3 }.into();
        assert_eq!(err.user_code(), Some("state.conflict"));
    }
}
