//! Error types for the AsterDB SDK

use std::fmt;

use thiserror::Error;

/// Failure detail reported by the server for a non-2xx response.
///
/// The message is extracted from the response body (JSON `message` field,
/// falling back to `detail`, falling back to the raw body text). The
/// server-specific error code is carried when present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fault {
    /// Human-readable message, passed through from the server verbatim
    pub message: String,
    /// HTTP status code of the response
    pub status: u16,
    /// Server-specific error code (e.g. `QE0PE2`), if any
    pub code: Option<String>,
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "[{}] {}: {}", self.status, code, self.message),
            None => write!(f, "[{}] {}", self.status, self.message),
        }
    }
}

/// Errors that can occur when using the AsterDB SDK
#[derive(Debug, Error)]
pub enum AsterError {
    /// The server replied with 400 Bad Request
    #[error("bad request: {0}")]
    BadRequest(Fault),

    /// The server replied with 401 Unauthorized
    #[error("unauthorized: {0}")]
    Unauthorized(Fault),

    /// The server replied with 403 Forbidden
    #[error("forbidden: {0}")]
    Forbidden(Fault),

    /// The server replied with 404 Not Found
    #[error("not found: {0}")]
    NotFound(Fault),

    /// The server replied with 429 Too Many Requests
    #[error("rate limited: {0}")]
    RateLimited(Fault),

    /// The server replied with 500 Internal Server Error
    #[error("internal server error: {0}")]
    InternalServer(Fault),

    /// The server replied with 504 Gateway Timeout
    #[error("gateway timeout: {0}")]
    GatewayTimeout(Fault),

    /// The server replied with any other non-2xx status
    #[error("server error: {0}")]
    Server(Fault),

    /// Transaction protocol misuse, detected before any network call
    #[error("transaction error: {0}")]
    Transaction(String),

    /// A locally detected bad argument; no request was made
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A query results payload did not have the expected structure
    #[error("invalid query results: {0}")]
    InvalidResults(String),

    /// A format could not be derived from a filename
    #[error("cannot derive a format from `{0}`")]
    UnknownFormat(String),

    /// A response header could not be interpreted (e.g. multipart boundary)
    #[error("invalid response header: {0}")]
    InvalidHeader(String),

    /// HTTP transport error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl AsterError {
    /// Map a non-2xx response to the error variant bound to its status code.
    ///
    /// The message is taken from the body's JSON `message` field when it is
    /// present and non-empty, then from `detail`, then from the raw body
    /// text. An empty `message` string is treated the same as a missing one.
    pub(crate) fn from_response_parts(status: u16, body: &[u8]) -> AsterError {
        let text = String::from_utf8_lossy(body);
        let (message, code) = match serde_json::from_slice::<serde_json::Value>(body) {
            Ok(json) => {
                let message = json
                    .get("message")
                    .and_then(|v| v.as_str())
                    .filter(|s| !s.is_empty())
                    .or_else(|| json.get("detail").and_then(|v| v.as_str()))
                    .unwrap_or(&text)
                    .to_string();
                let code = json
                    .get("code")
                    .and_then(|v| v.as_str())
                    .map(str::to_string);
                (message, code)
            }
            Err(_) => (text.to_string(), None),
        };

        let fault = Fault {
            message,
            status,
            code,
        };
        match status {
            400 => AsterError::BadRequest(fault),
            401 => AsterError::Unauthorized(fault),
            403 => AsterError::Forbidden(fault),
            404 => AsterError::NotFound(fault),
            429 => AsterError::RateLimited(fault),
            500 => AsterError::InternalServer(fault),
            504 => AsterError::GatewayTimeout(fault),
            _ => AsterError::Server(fault),
        }
    }

    /// The server fault carried by this error, if it came from a non-2xx response.
    pub fn fault(&self) -> Option<&Fault> {
        match self {
            AsterError::BadRequest(f)
            | AsterError::Unauthorized(f)
            | AsterError::Forbidden(f)
            | AsterError::NotFound(f)
            | AsterError::RateLimited(f)
            | AsterError::InternalServer(f)
            | AsterError::GatewayTimeout(f)
            | AsterError::Server(f) => Some(f),
            _ => None,
        }
    }

    /// HTTP status code, if this error came from a non-2xx response.
    pub fn status(&self) -> Option<u16> {
        self.fault().map(|f| f.status)
    }

    /// Server-specific error code, if the server supplied one.
    pub fn server_code(&self) -> Option<&str> {
        self.fault().and_then(|f| f.code.as_deref())
    }
}

pub type AsterResult<T> = Result<T, AsterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_status_codes_to_variants() {
        let cases: &[(u16, fn(&AsterError) -> bool)] = &[
            (400, |e| matches!(e, AsterError::BadRequest(_))),
            (401, |e| matches!(e, AsterError::Unauthorized(_))),
            (403, |e| matches!(e, AsterError::Forbidden(_))),
            (404, |e| matches!(e, AsterError::NotFound(_))),
            (429, |e| matches!(e, AsterError::RateLimited(_))),
            (500, |e| matches!(e, AsterError::InternalServer(_))),
            (504, |e| matches!(e, AsterError::GatewayTimeout(_))),
        ];
        for (status, is_expected) in cases {
            let err = AsterError::from_response_parts(*status, br#"{"message":"boom"}"#);
            assert!(is_expected(&err), "wrong variant for {status}: {err}");
            assert_eq!(err.status(), Some(*status));
            assert_eq!(err.fault().unwrap().message, "boom");
        }
    }

    #[test]
    fn unmapped_status_becomes_generic_server_error() {
        let err = AsterError::from_response_parts(418, br#"{"message":"teapot"}"#);
        assert!(matches!(err, AsterError::Server(_)));
        assert_eq!(err.status(), Some(418));
    }

    #[test]
    fn extracts_server_code() {
        let err =
            AsterError::from_response_parts(400, br#"{"message":"bad db","code":"QE0PE2"}"#);
        assert_eq!(err.server_code(), Some("QE0PE2"));
        assert_eq!(err.to_string(), "bad request: [400] QE0PE2: bad db");
    }

    #[test]
    fn empty_message_falls_back_to_detail() {
        let err =
            AsterError::from_response_parts(404, br#"{"message":"","detail":"no such db"}"#);
        assert_eq!(err.fault().unwrap().message, "no such db");
    }

    #[test]
    fn missing_message_falls_back_to_detail() {
        let err = AsterError::from_response_parts(403, br#"{"detail":"nope"}"#);
        assert_eq!(err.fault().unwrap().message, "nope");
    }

    #[test]
    fn non_json_body_is_used_verbatim() {
        let err = AsterError::from_response_parts(500, b"stack trace here");
        assert_eq!(err.fault().unwrap().message, "stack trace here");
        assert_eq!(err.server_code(), None);
    }

    #[test]
    fn local_errors_have_no_status() {
        let err = AsterError::Transaction("not in a transaction".into());
        assert_eq!(err.status(), None);
        assert!(err.fault().is_none());
    }
}
