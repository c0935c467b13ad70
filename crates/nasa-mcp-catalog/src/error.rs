/// Errors from the upstream NASA image catalog. All variants fail closed:
/// the caller's result page is never touched when one of these surfaces.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("upstream returned status {status}")]
    Status { status: u16 },
    #[error("malformed upstream response: {0}")]
    Malformed(String),
}

impl CatalogError {
    /// Short classification string for logging.
    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::Network(_) => "network",
            Self::Status { .. } => "status",
            Self::Malformed(_) => "malformed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_message() {
        let err = CatalogError::Status { status: 503 };
        assert_eq!(err.to_string(), "upstream returned status 503");
        assert_eq!(err.error_kind(), "status");
    }

    #[test]
    fn malformed_error_kind() {
        let err = CatalogError::Malformed("missing collection".into());
        assert_eq!(err.error_kind(), "malformed");
    }
}
