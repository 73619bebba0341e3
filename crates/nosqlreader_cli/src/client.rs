//! reqwest-backed HTTP client for the reader transport.

use nosqlreader_engine::{HttpClient, HttpRequest};
use std::time::Duration;

/// An [`HttpClient`] on top of `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    /// Builds a client whose requests time out after `timeout`.
    ///
    /// The timeout must exceed the server's long-poll window for
    /// `GetChanges`.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

impl HttpClient for ReqwestClient {
    async fn post(&self, request: HttpRequest) -> Result<Vec<u8>, String> {
        let mut builder = self.client.post(&request.url).query(&request.query);
        for (name, value) in &request.headers {
            builder = builder.header(*name, value.as_str());
        }

        let resp = builder.send().await.map_err(|e| e.to_string())?;
        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(format!("{} failed: {status} {text}", request.url));
        }

        resp.bytes()
            .await
            .map(|body| body.to_vec())
            .map_err(|e| e.to_string())
    }
}
