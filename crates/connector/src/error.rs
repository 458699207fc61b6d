use ledgerbridge_journal::SourceError;

/// Error type for connector operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectorError {
    /// No token configured for the action API
    NotAuthenticated,
    /// 401/403 from the remote side
    Unauthorized(u16, String),
    /// 404: the record does not exist
    NotFound(String),
    /// 400/422: the request was rejected as invalid
    Validation(u16, String),
    /// Any other non-success status (including retries exhausted)
    Http(u16, String),
    /// Transport failure
    Network(String),
    /// Unexpected response body
    Parse(String),
    /// Local credential file I/O
    Io(String),
}

impl std::fmt::Display for ConnectorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectorError::NotAuthenticated => {
                write!(f, "Not authenticated: set LEDGERBRIDGE_TOKEN or save credentials")
            }
            ConnectorError::Unauthorized(code, msg) => write!(f, "Auth failed ({}): {}", code, msg),
            ConnectorError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ConnectorError::Validation(code, msg) => write!(f, "Request rejected ({}): {}", code, msg),
            ConnectorError::Http(code, msg) => write!(f, "HTTP {}: {}", code, msg),
            ConnectorError::Network(msg) => write!(f, "Network error: {}", msg),
            ConnectorError::Parse(msg) => write!(f, "Parse error: {}", msg),
            ConnectorError::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for ConnectorError {}

impl From<ConnectorError> for SourceError {
    fn from(err: ConnectorError) -> Self {
        match err {
            ConnectorError::NotAuthenticated => SourceError::NotAuthenticated,
            ConnectorError::Unauthorized(code, msg)
            | ConnectorError::Validation(code, msg)
            | ConnectorError::Http(code, msg) => SourceError::Http(code, msg),
            ConnectorError::NotFound(msg) => SourceError::Http(404, msg),
            ConnectorError::Network(msg) => SourceError::Network(msg),
            ConnectorError::Parse(msg) => SourceError::Parse(msg),
            ConnectorError::Io(msg) => SourceError::Internal(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_into_source_error() {
        assert_eq!(SourceError::from(ConnectorError::NotAuthenticated), SourceError::NotAuthenticated);
        assert_eq!(
            SourceError::from(ConnectorError::Unauthorized(401, "Invalid token".into())),
            SourceError::Http(401, "Invalid token".into())
        );
        assert_eq!(
            SourceError::from(ConnectorError::NotFound("Contractor not found".into())),
            SourceError::Http(404, "Contractor not found".into())
        );
        assert_eq!(
            SourceError::from(ConnectorError::Io("permission denied".into())),
            SourceError::Internal("permission denied".into())
        );
    }
}
