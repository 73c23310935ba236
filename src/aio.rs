//! Asynchronous HTTP transport
//!
//! [`AsyncHttpClient`] is the async twin of
//! [`HttpClient`](crate::client::HttpClient): same configuration, same
//! single-attempt policy, same error mapping. The only difference is that
//! [`send`](AsyncHttpClient::send) awaits the response instead of blocking.

use reqwest::{Client, Method, RequestBuilder, Response};
use tracing::debug;

use crate::client::{escape_path, ClientOptions};
use crate::error::{AsterError, AsterResult};

/// Async HTTP client bound to one server (and optionally one database).
#[derive(Debug, Clone)]
pub struct AsyncHttpClient {
    base: String,
    http: Client,
    username: Option<String>,
    password: Option<String>,
}

impl AsyncHttpClient {
    /// Build a client for the data path of `database`, or for the server
    /// root when `database` is `None`.
    pub fn new(database: Option<&str>, options: &ClientOptions) -> AsterResult<AsyncHttpClient> {
        let http = Client::builder()
            .timeout(options.timeout)
            .pool_max_idle_per_host(options.pool_size)
            .build()?;
        let mut base = options.endpoint.trim_end_matches('/').to_string();
        if let Some(db) = database {
            base.push('/');
            base.push_str(&escape_path(db));
        }
        Ok(AsyncHttpClient {
            base,
            http,
            username: options.username.clone(),
            password: options.password.clone(),
        })
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

    /// Issue the request once and map the outcome, as the sync transport
    /// does.
    pub async fn send(&self, builder: RequestBuilder) -> AsterResult<Response> {
        let response = builder.send().await?;
        let status = response.status();
        debug!("request to {} returned {}", response.url(), status);
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.bytes().await.unwrap_or_default();
            Err(AsterError::from_response_parts(status.as_u16(), &body))
        }
    }
}
