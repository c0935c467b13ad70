/// Typed error hierarchy for session operations.
/// Classifies failures as client protocol errors, session-state errors,
/// upstream errors, or internal faults. The transport layer maps each
/// class to a structured protocol error; nothing here ever crosses the
/// wire as a raw panic or stack trace.
#[derive(Clone, Debug, thiserror::Error)]
pub enum OpError {
    // Client protocol — caller must correct and retry
    #[error("invalid params: {0}")]
    InvalidParams(String),
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    // Session state — recoverable by searching first
    #[error("No active search session. Please search first.")]
    NoActiveSearch,
    #[error("No image available. Please search first.")]
    NoImageAvailable,

    // Upstream — result page left untouched, caller may retry the search
    #[error("Failed to search NASA images: {0}")]
    SearchFailed(String),

    // Internal faults
    #[error("internal error: {0}")]
    Internal(String),
}

impl OpError {
    /// Short classification string for logging.
    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::InvalidParams(_) => "invalid_params",
            Self::UnknownTool(_) => "unknown_tool",
            Self::NoActiveSearch => "no_active_search",
            Self::NoImageAvailable => "no_image_available",
            Self::SearchFailed(_) => "search_failed",
            Self::Internal(_) => "internal",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kind_strings() {
        assert_eq!(OpError::NoActiveSearch.error_kind(), "no_active_search");
        assert_eq!(OpError::SearchFailed("x".into()).error_kind(), "search_failed");
        assert_eq!(OpError::UnknownTool("t".into()).error_kind(), "unknown_tool");
    }

    #[test]
    fn messages_are_descriptive() {
        let err = OpError::NoActiveSearch;
        assert_eq!(err.to_string(), "No active search session. Please search first.");

        let err = OpError::NoImageAvailable;
        assert_eq!(err.to_string(), "No image available. Please search first.");
    }
}
