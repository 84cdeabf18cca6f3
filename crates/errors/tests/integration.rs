//! Integration tests for error types

#[cfg(test)]
mod tests {
    use plugkit_errors::*;

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
        let err = InstallError::MissingEntitlement {
            package: "acme-seo".into(),
        };
        assert_eq!(err.to_string(), "missing entitlement for package: acme-seo");
    }

    #[test]
    fn test_error_clone() {
        let err = RegistryError::PackageNotFound {
            package: "acme-seo".into(),
        };
        let cloned = err.clone();
        assert_eq!(err.to_string(), cloned.to_string());
    }

    #[test]
    fn test_user_facing_codes() {
        let err: Error = InstallError::Cancelled.into();
        assert_eq!(err.user_code(), Some("install.cancelled"));
        assert!(!err.is_retryable());

        let err: Error = NetworkError::DownloadFailed("reset by peer".into()).into();
        assert!(err.is_retryable());
    }

    #[test]
    fn test_io_error_with_path() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = Error::io_with_path(&io, "/srv/extensions");
        match err {
            Error::Io { kind, path, .. } => {
                assert_eq!(kind, std::io::ErrorKind::PermissionDenied);
                assert_eq!(
                    path.as_deref(),
                    Some(std::path::Path::new("/srv/extensions"))
                );
            }
            other => panic!("expected Io error, got {other:?}"),
        }
    }
}
