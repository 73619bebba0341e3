//! HTTP transport implementation.
//!
//! This module maps the reader calls onto the DataReader HTTP endpoints.
//! The actual HTTP client is abstracted via a trait to allow different
//! implementations (reqwest, hyper, etc.).

use crate::error::{ReaderError, ReaderResult};
use crate::transport::ReaderTransport;
use nosqlreader_protocol::GreetingResponse;
use parking_lot::RwLock;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Header carrying the session id.
const SESSION_HEADER: &str = "session";

/// A POST request to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// Absolute URL without query string.
    pub url: String,
    /// Query parameters, unencoded.
    pub query: Vec<(&'static str, String)>,
    /// Request headers.
    pub headers: Vec<(&'static str, String)>,
}

impl HttpRequest {
    /// Creates a request with no query parameters or headers.
    pub fn post(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            query: Vec::new(),
            headers: Vec::new(),
        }
    }

    /// Adds a query parameter.
    pub fn query(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.query.push((name, value.into()));
        self
    }

    /// Adds a header.
    pub fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }
}

/// HTTP client abstraction.
///
/// Implement this trait to provide the actual HTTP transport. Non-success
/// status codes must be reported as errors.
pub trait HttpClient: Send + Sync + 'static {
    /// Sends a POST request with an empty body and returns the response body.
    fn post(&self, request: HttpRequest) -> impl Future<Output = Result<Vec<u8>, String>> + Send;
}

/// Resolves the server base URL for each request.
pub type HostProvider = Arc<dyn Fn() -> String + Send + Sync>;

/// HTTP-based reader transport.
pub struct HttpTransport<C: HttpClient> {
    host: HostProvider,
    client: C,
    last_error: RwLock<Option<String>>,
}

impl<C: HttpClient> HttpTransport<C> {
    /// Creates a transport for a fixed base URL (e.g. `http://nosql:5123`).
    pub fn new(base_url: impl Into<String>, client: C) -> Self {
        let base_url = base_url.into();
        Self::with_host_provider(move || base_url.clone(), client)
    }

    /// Creates a transport that resolves the base URL before every request.
    pub fn with_host_provider<F>(host: F, client: C) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        Self {
            host: Arc::new(host),
            client,
            last_error: RwLock::new(None),
        }
    }

    /// Returns the base URL the next request would use.
    pub fn base_url(&self) -> String {
        (self.host)()
    }

    /// Returns the underlying client.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Returns the last error message.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.read().clone()
    }

    fn endpoint(&self, action: &str) -> String {
        format!(
            "{}/DataReader/{}",
            self.base_url().trim_end_matches('/'),
            action
        )
    }

    async fn send(&self, request: HttpRequest) -> ReaderResult<Vec<u8>> {
        match self.client.post(request).await {
            Ok(body) => {
                *self.last_error.write() = None;
                Ok(body)
            }
            Err(e) => {
                *self.last_error.write() = Some(e.clone());
                Err(ReaderError::Transport(e))
            }
        }
    }
}

impl<C: HttpClient> ReaderTransport for HttpTransport<C> {
    async fn greeting(&self, app_name: &str, app_version: &str) -> ReaderResult<String> {
        let request = HttpRequest::post(self.endpoint("Greeting"))
            .query("name", app_name)
            .query("version", app_version);
        let body = self.send(request).await?;
        let response = GreetingResponse::from_json(&body)?;
        Ok(response.session_id()?.to_string())
    }

    async fn subscribe(&self, session_id: &str, table_name: &str) -> ReaderResult<()> {
        let request = HttpRequest::post(self.endpoint("Subscribe"))
            .header(SESSION_HEADER, session_id)
            .query("tableName", table_name);
        self.send(request).await?;
        Ok(())
    }

    async fn get_changes(&self, session_id: &str) -> ReaderResult<Vec<u8>> {
        let request =
            HttpRequest::post(self.endpoint("GetChanges")).header(SESSION_HEADER, session_id);
        self.send(request).await
    }
}

impl<C: HttpClient> fmt::Debug for HttpTransport<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url())
            .field("last_error", &self.last_error())
            .finish()
    }
}
