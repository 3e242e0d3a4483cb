//! Error taxonomy shared by the fetch, analysis, and storage layers.
//!
//! Every variant carries a human-readable message. Fetch-side variants also
//! carry the URL that failed so a batch result can be attributed without
//! extra bookkeeping.

use thiserror::Error;

/// Convenience alias used throughout the library.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// DNS, connect, timeout, or non-2xx HTTP failure.
    #[error("HTTP error fetching {url}: {message}")]
    Transport { url: String, message: String },

    /// Undecodable response body or unusable markup.
    #[error("parse error for {url}: {message}")]
    Parse { url: String, message: String },

    /// Caller-supplied argument outside the accepted contract.
    #[error("invalid argument: {0}")]
    Validation(String),

    /// Storage unavailable or a constraint was violated.
    #[error("storage error: {0}")]
    Persistence(String),

    /// Unexpected failure while computing or encoding analysis output.
    #[error("analysis error: {0}")]
    Analysis(String),
}

impl Error {
    pub fn transport(url: &str, message: impl ToString) -> Self {
        Error::Transport {
            url: url.to_string(),
            message: message.to_string(),
        }
    }

    pub fn parse(url: &str, message: impl ToString) -> Self {
        Error::Parse {
            url: url.to_string(),
            message: message.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }

    /// Stable snake_case tag for JSON output.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Transport { .. } => "transport",
            Error::Parse { .. } => "parse",
            Error::Validation(_) => "validation",
            Error::Persistence(_) => "persistence",
            Error::Analysis(_) => "analysis",
        }
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Error::Persistence(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Analysis(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_tags() {
        assert_eq!(Error::transport("http://a", "refused").kind(), "transport");
        assert_eq!(Error::parse("http://a", "bad utf-8").kind(), "parse");
        assert_eq!(Error::validation("limit").kind(), "validation");
        assert_eq!(Error::Persistence("locked".into()).kind(), "persistence");
        assert_eq!(Error::Analysis("encode".into()).kind(), "analysis");
    }

    #[test]
    fn test_transport_message_names_url() {
        let err = Error::transport("https://example.com/a", "connection refused");
        assert_eq!(
            err.to_string(),
            "HTTP error fetching https://example.com/a: connection refused"
        );
    }
}
