//! Synchronous HTTP transport
//!
//! One [`HttpClient`] per logical session: it owns the connection pool,
//! prefixes every path with the base URL (plus the database name for
//! data-path clients), injects basic-auth credentials, and maps non-2xx
//! responses to [`AsterError`](crate::AsterError) variants. Requests are
//! issued exactly once; nothing is retried.

use std::time::Duration;

use bytes::Bytes;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::Method;
use tracing::debug;

use crate::error::{AsterError, AsterResult};

/// Characters escaped when a resource name is interpolated into a URL path.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'#')
    .add(b'?')
    .add(b'{')
    .add(b'}')
    .add(b'%')
    .add(b'/')
    .add(b'\\');

/// Percent-encode a resource name for use as one URL path segment.
pub(crate) fn escape_path(segment: &str) -> String {
    utf8_percent_encode(segment, PATH_SEGMENT).to_string()
}

/// Configuration for one logical session against a server.
///
/// All values are fixed at session creation; the connection pool and the
/// per-request timeout cannot be changed per call.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Base URL of the server
    pub endpoint: String,
    /// Username for HTTP basic auth
    pub username: Option<String>,
    /// Password for HTTP basic auth
    pub password: Option<String>,
    /// Per-request timeout
    pub timeout: Duration,
    /// Maximum number of pooled connections to the server
    pub pool_size: usize,
}

impl ClientOptions {
    pub const DEFAULT_ENDPOINT: &'static str = "http://localhost:5830";
    pub const DEFAULT_USERNAME: &'static str = "admin";
    pub const DEFAULT_PASSWORD: &'static str = "admin";

    /// Options for the given endpoint with default credentials.
    pub fn new(endpoint: impl Into<String>) -> ClientOptions {
        ClientOptions {
            endpoint: endpoint.into(),
            ..ClientOptions::default()
        }
    }

    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> ClientOptions {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> ClientOptions {
        self.timeout = timeout;
        self
    }

    pub fn with_pool_size(mut self, pool_size: usize) -> ClientOptions {
        self.pool_size = pool_size;
        self
    }
}

impl Default for ClientOptions {
    fn default() -> ClientOptions {
        ClientOptions {
            endpoint: Self::DEFAULT_ENDPOINT.to_string(),
            username: Some(Self::DEFAULT_USERNAME.to_string()),
            password: Some(Self::DEFAULT_PASSWORD.to_string()),
            timeout: Duration::from_secs(30),
            pool_size: 10,
        }
    }
}

/// Blocking HTTP client bound to one server (and optionally one database).
#[derive(Debug, Clone)]
pub struct HttpClient {
    base: String,
    http: Client,
    username: Option<String>,
    password: Option<String>,
}

impl HttpClient {
    /// Build a client for the data path of `database`, or for the server
    /// root when `database` is `None` (admin operations).
    pub fn new(database: Option<&str>, options: &ClientOptions) -> AsterResult<HttpClient> {
        let http = Client::builder()
            .timeout(options.timeout)
            .pool_max_idle_per_host(options.pool_size)
            .build()?;
        let mut base = options.endpoint.trim_end_matches('/').to_string();
        if let Some(db) = database {
            base.push('/');
            base.push_str(&escape_path(db));
        }
        Ok(HttpClient {
            base,
            http,
            username: options.username.clone(),
            password: options.password.clone(),
        })
    }

    /// The username configured for this session, if any.
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base, path);
        let builder = self.http.request(method, url);
        match &self.username {
            Some(user) => builder.basic_auth(user, self.password.as_deref()),
            None => builder,
        }
    }

    pub fn get(&self, path: &str) -> RequestBuilder {
        self.request(Method::GET, path)
    }

    pub fn post(&self, path: &str) -> RequestBuilder {
        self.request(Method::POST, path)
    }

    pub fn put(&self, path: &str) -> RequestBuilder {
        self.request(Method::PUT, path)
    }

    pub fn delete(&self, path: &str) -> RequestBuilder {
        self.request(Method::DELETE, path)
    }

    /// Issue the request once and map the outcome.
    ///
    /// A 2xx response is returned untouched. Any other status consumes the
    /// body and becomes the typed error bound to that status code.
    pub fn send(&self, builder: RequestBuilder) -> AsterResult<Response> {
        let response = builder.send()?;
        let status = response.status();
        debug!("request to {} returned {}", response.url(), status);
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.bytes().unwrap_or_default();
            Err(AsterError::from_response_parts(status.as_u16(), &body))
        }
    }
}

/// Decode the parts of a multipart response body.
///
/// Returns the content of each part (headers stripped), in order. Used by
/// endpoints that reply with several independent payloads, e.g. constraint
/// violation explanations.
pub(crate) fn multipart_parts(content_type: &str, body: &[u8]) -> AsterResult<Vec<Bytes>> {
    let boundary = content_type
        .split(';')
        .filter_map(|p| p.trim().strip_prefix("boundary="))
        .next()
        .map(|b| b.trim_matches('"'))
        .filter(|b| !b.is_empty())
        .ok_or_else(|| {
            AsterError::InvalidHeader(format!("no multipart boundary in `{content_type}`"))
        })?;
    let delim = format!("--{boundary}").into_bytes();

    let mut parts = Vec::new();
    let mut pos = match find(body, &delim, 0) {
        Some(p) => p + delim.len(),
        None => {
            return Err(AsterError::InvalidHeader(
                "multipart body without boundary delimiter".into(),
            ))
        }
    };
    loop {
        if body[pos..].starts_with(b"--") {
            // closing delimiter
            break;
        }
        if body[pos..].starts_with(b"\r\n") {
            pos += 2;
        } else if body[pos..].starts_with(b"\n") {
            pos += 1;
        }
        let end = find(body, &delim, pos).ok_or_else(|| {
            AsterError::InvalidHeader("unterminated multipart part".into())
        })?;
        let chunk = &body[pos..end];
        // part content starts after the blank line terminating the headers
        let content = match find(chunk, b"\r\n\r\n", 0) {
            Some(h) => &chunk[h + 4..],
            None => match find(chunk, b"\n\n", 0) {
                Some(h) => &chunk[h + 2..],
                None => chunk,
            },
        };
        let content = content
            .strip_suffix(b"\r\n")
            .or_else(|| content.strip_suffix(b"\n"))
            .unwrap_or(content);
        parts.push(Bytes::copy_from_slice(content));
        pos = end + delim.len();
    }
    Ok(parts)
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if from > haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|p| p + from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_awkward_resource_names() {
        assert_eq!(escape_path("plain-name"), "plain-name");
        assert_eq!(escape_path("with space"), "with%20space");
        assert_eq!(escape_path("a/b"), "a%2Fb");
        assert_eq!(escape_path("50%"), "50%25");
    }

    #[test]
    fn options_builder_chains() {
        let options = ClientOptions::new("http://db.example.com:5830")
            .with_credentials("alice", "secret")
            .with_timeout(Duration::from_secs(5))
            .with_pool_size(2);
        assert_eq!(options.endpoint, "http://db.example.com:5830");
        assert_eq!(options.username.as_deref(), Some("alice"));
        assert_eq!(options.timeout, Duration::from_secs(5));
        assert_eq!(options.pool_size, 2);
    }

    #[test]
    fn base_url_includes_escaped_database() {
        let options = ClientOptions::default();
        let client = HttpClient::new(Some("my db"), &options).unwrap();
        assert_eq!(client.base, "http://localhost:5830/my%20db");

        let admin = HttpClient::new(None, &options).unwrap();
        assert_eq!(admin.base, "http://localhost:5830");
    }

    #[test]
    fn trailing_slash_in_endpoint_is_dropped() {
        let options = ClientOptions::new("http://localhost:5830/");
        let client = HttpClient::new(Some("db"), &options).unwrap();
        assert_eq!(client.base, "http://localhost:5830/db");
    }

    const MULTIPART: &[u8] = b"preamble\r\n\
        --xyz\r\n\
        Content-Type: text/turtle\r\n\
        \r\n\
        :a :b :c .\r\n\
        --xyz\r\n\
        Content-Type: text/plain\r\n\
        \r\n\
        second part\r\n\
        --xyz--\r\n";

    #[test]
    fn splits_multipart_parts() {
        let parts = multipart_parts("multipart/mixed; boundary=xyz", MULTIPART).unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(&parts[0][..], b":a :b :c .");
        assert_eq!(&parts[1][..], b"second part");
    }

    #[test]
    fn accepts_quoted_boundary() {
        let parts = multipart_parts("multipart/mixed; boundary=\"xyz\"", MULTIPART).unwrap();
        assert_eq!(parts.len(), 2);
    }

    #[test]
    fn rejects_missing_boundary_parameter() {
        assert!(matches!(
            multipart_parts("multipart/mixed", MULTIPART),
            Err(AsterError::InvalidHeader(_))
        ));
    }

    #[test]
    fn rejects_body_without_delimiter() {
        assert!(matches!(
            multipart_parts("multipart/mixed; boundary=xyz", b"no delimiters here"),
            Err(AsterError::InvalidHeader(_))
        ));
    }

    #[test]
    fn empty_multipart_body_has_no_parts() {
        let body = b"--xyz--\r\n";
        let parts = multipart_parts("multipart/mixed; boundary=xyz", body).unwrap();
        assert!(parts.is_empty());
    }
}
