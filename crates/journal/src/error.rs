use std::fmt;

/// Failure of a single external retrieval call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// No credentials available for the external system.
    NotAuthenticated,
    /// Transport failure (connect, timeout, reset).
    Network(String),
    /// The external API answered with a non-success status.
    Http(u16, String),
    /// The response could not be decoded.
    Parse(String),
    /// The call never produced a result (worker thread died, local IO).
    Internal(String),
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAuthenticated => write!(f, "not authenticated"),
            Self::Network(msg) => write!(f, "network error: {msg}"),
            Self::Http(status, msg) => write!(f, "HTTP {status}: {msg}"),
            Self::Parse(msg) => write!(f, "parse error: {msg}"),
            Self::Internal(msg) => write!(f, "internal error: {msg}"),
        }
    }
}

impl std::error::Error for SourceError {}

/// Errors surfaced in a journal view's error banner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JournalError {
    /// The selection is empty; no fetch was attempted.
    NoAccountsSelected,
    /// One account's retrieval failed. Sibling accounts are unaffected.
    AccountFetch { account_id: String, cause: SourceError },
}

impl fmt::Display for JournalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoAccountsSelected => write!(f, "No accounts selected"),
            Self::AccountFetch { account_id, .. } => {
                write!(f, "Error fetching entries for account {account_id}")
            }
        }
    }
}

impl std::error::Error for JournalError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::NoAccountsSelected => None,
            Self::AccountFetch { cause, .. } => Some(cause),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn banner_messages() {
        assert_eq!(JournalError::NoAccountsSelected.to_string(), "No accounts selected");

        let err = JournalError::AccountFetch {
            account_id: "118".into(),
            cause: SourceError::Http(502, "bad gateway".into()),
        };
        assert_eq!(err.to_string(), "Error fetching entries for account 118");
        assert_eq!(err.source().map(|s| s.to_string()).as_deref(), Some("HTTP 502: bad gateway"));
    }
}
