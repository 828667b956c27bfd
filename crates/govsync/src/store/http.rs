//! HTTP object store.
//!
//! Entities live at `{base_url}/{collection}/{id}`. Updates are sent as
//! RFC 6902 documents with `Content-Type: application/json-patch+json`.
//! Every request and response body is logged at `debug` under this module's
//! target, which is the first place to look when the service rejects a
//! patch without a structured error.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method, StatusCode, Url};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use govsync_document::EntityKind;
use govsync_patch::{to_json_patch, PatchOperation};

use super::{ApiErrorPayload, RemoteError, RemoteObjectStore, RemoteResult};
use crate::config::{ConfigError, StoreConfig};

const JSON_PATCH: &str = "application/json-patch+json";

pub struct HttpStore {
    client: Client,
    base_url: Url,
    token: Option<String>,
    cancel: CancellationToken,
}

impl std::fmt::Debug for HttpStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpStore")
            .field("base_url", &self.base_url.as_str())
            .field("token", &self.token.as_ref().map(|_| "***"))
            .finish()
    }
}

impl HttpStore {
    pub fn new(config: &StoreConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let base_url = Url::parse(&config.base_url).map_err(|e| ConfigError::Invalid {
            field: "store.base_url",
            message: e.to_string(),
        })?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(ConfigError::Client)?;
        Ok(Self {
            client,
            base_url,
            token: config.token.clone(),
            cancel: CancellationToken::new(),
        })
    }

    /// Requests in flight, and any issued later, end with
    /// [`RemoteError::Cancelled`] once `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    fn url(&self, kind: EntityKind, id: Option<&str>) -> RemoteResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| RemoteError::transport(format!("{} cannot be a base URL", self.base_url)))?
            .pop_if_empty()
            .extend(kind.collection().split('/'))
            .extend(id);
        Ok(url)
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<(&'static str, String)>,
    ) -> RemoteResult<(StatusCode, String)> {
        debug!(method = %method, url = %url, body = ?body.as_ref().map(|(_, b)| b), "request");
        let mut request = self
            .client
            .request(method.clone(), url.clone())
            .header(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        if let Some((content_type, body)) = body {
            request = request.header(CONTENT_TYPE, content_type).body(body);
        }

        let response = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(RemoteError::Cancelled),
            result = request.send() => result.map_err(|e| {
                RemoteError::transport_with_source(format!("{method} {url} failed: {e}"), e)
            })?,
        };
        let status = response.status();
        let text = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(RemoteError::Cancelled),
            result = response.text() => result.map_err(|e| {
                RemoteError::transport_with_source(format!("reading {method} {url} response failed: {e}"), e)
            })?,
        };
        debug!(method = %method, url = %url, status = %status, body = %text, "response");
        Ok((status, text))
    }

    fn handle_response_error(
        &self,
        kind: EntityKind,
        id: Option<&str>,
        status: StatusCode,
        body: &str,
    ) -> RemoteError {
        if status == StatusCode::NOT_FOUND {
            return RemoteError::NotFound {
                kind,
                id: id.unwrap_or_default().to_string(),
            };
        }
        match ApiErrorPayload::parse(body) {
            Some(payload) => {
                warn!(status = %status, message = %payload.message, "request rejected");
                RemoteError::api(status.as_u16(), payload)
            }
            None => RemoteError::transport(format!("HTTP {status}: {body}")),
        }
    }

    fn parse_body(body: &str) -> RemoteResult<Value> {
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(body)
            .map_err(|e| RemoteError::transport_with_source(format!("malformed response body: {e}"), e))
    }
}

#[async_trait]
impl RemoteObjectStore for HttpStore {
    #[instrument(skip(self))]
    async fn get(&self, kind: EntityKind, id: &str) -> RemoteResult<Value> {
        let url = self.url(kind, Some(id))?;
        let (status, body) = self.send(Method::GET, url, None).await?;
        if !status.is_success() {
            return Err(self.handle_response_error(kind, Some(id), status, &body));
        }
        Self::parse_body(&body)
    }

    #[instrument(skip(self, document))]
    async fn create(&self, kind: EntityKind, document: &Value) -> RemoteResult<Value> {
        let url = self.url(kind, None)?;
        let payload = ("application/json", document.to_string());
        let (status, body) = self.send(Method::POST, url, Some(payload)).await?;
        if !status.is_success() {
            return Err(self.handle_response_error(kind, None, status, &body));
        }
        let created = Self::parse_body(&body)?;
        let id = created.get("id").and_then(Value::as_str).unwrap_or_default();
        info!(kind = %kind, id = %id, "object created");
        Ok(created)
    }

    #[instrument(skip(self, operations), fields(operations = operations.len()))]
    async fn patch(
        &self,
        kind: EntityKind,
        id: &str,
        operations: &[PatchOperation],
    ) -> RemoteResult<Value> {
        let url = self.url(kind, Some(id))?;
        let payload = (JSON_PATCH, to_json_patch(operations).to_string());
        let (status, body) = self.send(Method::PATCH, url, Some(payload)).await?;
        if !status.is_success() {
            return Err(self.handle_response_error(kind, Some(id), status, &body));
        }
        info!(kind = %kind, id = %id, "object patched");
        Self::parse_body(&body)
    }

    #[instrument(skip(self))]
    async fn delete(&self, kind: EntityKind, id: &str) -> RemoteResult<()> {
        let url = self.url(kind, Some(id))?;
        let (status, body) = self.send(Method::DELETE, url, None).await?;
        if !status.is_success() {
            return Err(self.handle_response_error(kind, Some(id), status, &body));
        }
        info!(kind = %kind, id = %id, "object deleted");
        Ok(())
    }
}
