//! HTTP transport shared by the upstream clients.

use crate::error::{ClientError, ClientResult};
use reqwest::{header, Client, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Single-attempt JSON transport bound to one upstream base URL.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: Url,
}

impl HttpTransport {
    /// Create a transport that sends `headers` on every request and abandons
    /// requests after `timeout` unless a call overrides it.
    pub fn new(base_url: Url, headers: header::HeaderMap, timeout: Duration) -> ClientResult<Self> {
        let client = Client::builder()
            .user_agent(concat!("composio-gateway/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self { client, base_url })
    }

    /// Append `segments` to the base path. Each entry stays exactly one
    /// segment: `/`, `?`, `#` and `%` are percent-encoded and dot segments
    /// are refused.
    fn build_url(&self, segments: &[&str]) -> ClientResult<Url> {
        if let Some(bad) = segments
            .iter()
            .find(|segment| matches!(**segment, "" | "." | ".."))
        {
            return Err(ClientError::InvalidPath(bad.to_string()));
        }

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidPath(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Send once; non-2xx becomes `ClientError::Api` with the upstream body.
    async fn execute(&self, request_builder: RequestBuilder) -> ClientResult<Response> {
        let response = request_builder.send().await.map_err(|e| {
            if e.is_timeout() {
                ClientError::Timeout
            } else {
                ClientError::Http(e)
            }
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        warn!(status = status.as_u16(), body = %body, "Upstream returned an error status");
        Err(ClientError::from_response(status.as_u16(), body))
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Ok(serde_json::from_value(serde_json::Value::Null)?);
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Execute a GET request.
    pub async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> ClientResult<T> {
        let url = self.build_url(segments)?;
        debug!(url = %url, "GET request");

        let response = self.execute(self.client.get(url)).await?;
        Self::decode(response).await
    }

    /// Execute a GET request with query parameters.
    pub async fn get_with_query<T: DeserializeOwned, Q: Serialize + ?Sized>(
        &self,
        segments: &[&str],
        query: &Q,
    ) -> ClientResult<T> {
        let url = self.build_url(segments)?;
        debug!(url = %url, "GET request with query");

        let response = self.execute(self.client.get(url).query(query)).await?;
        Self::decode(response).await
    }

    /// Execute a POST request.
    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> ClientResult<T> {
        let url = self.build_url(segments)?;
        debug!(url = %url, "POST request");

        let response = self.execute(self.client.post(url).json(body)).await?;
        Self::decode(response).await
    }

    /// Execute a POST request with its own ceiling instead of the transport default.
    pub async fn post_with_timeout<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        segments: &[&str],
        body: &B,
        timeout: Duration,
    ) -> ClientResult<T> {
        let url = self.build_url(segments)?;
        debug!(url = %url, timeout_secs = timeout.as_secs(), "POST request");

        let response = self
            .execute(self.client.post(url).json(body).timeout(timeout))
            .await?;
        Self::decode(response).await
    }

    /// Execute a PATCH request.
    pub async fn patch<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> ClientResult<T> {
        let url = self.build_url(segments)?;
        debug!(url = %url, "PATCH request");

        let response = self.execute(self.client.patch(url).json(body)).await?;
        Self::decode(response).await
    }
}
