//! Authenticated request pipeline.
//!
//! # Design
//! Each call is split the same way: `build_*` produces an `HttpRequest`
//! carrying the auth headers, the [`Transport`] executes it, and
//! [`parse_response`] turns the `HttpResponse` into a typed value or a
//! classified [`ApiError`]. Building and parsing are pure, so both halves are
//! testable without a network.
//!
//! Dispatch races the transport against the caller's `CancellationToken`;
//! a fired token wins and yields `PlategaError::Cancelled`.

use std::fmt;
use std::sync::Arc;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug_span, Instrument};

use crate::config::Credentials;
use crate::error::{ApiError, PlategaError, Result};
use crate::http::{
    HttpMethod, HttpRequest, HttpResponse, Transport, HEADER_ACCEPT, HEADER_CONTENT_TYPE,
    HEADER_MERCHANT_ID, HEADER_SECRET, MIME_JSON, MIME_JSON_UTF8,
};
use crate::json;

/// Everything outside the RFC 3986 unreserved set is percent-encoded, so a
/// space becomes `%20` and `+` becomes `%2B`.
const QUERY_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Shared request machinery behind [`crate::PlategaClient`].
#[derive(Clone)]
pub struct Pipeline {
    base_url: String,
    credentials: Credentials,
    transport: Arc<dyn Transport>,
}

impl Pipeline {
    pub fn new(base_url: &str, credentials: Credentials, transport: Arc<dyn Transport>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
            transport,
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET base/path?query`. An empty `query` adds no `?`.
    pub fn build_get(&self, path: &str, query: &[(&str, String)]) -> HttpRequest {
        let mut url = self.url(path);
        if !query.is_empty() {
            let encoded: Vec<String> = query
                .iter()
                .map(|(key, value)| {
                    format!(
                        "{}={}",
                        utf8_percent_encode(key, QUERY_COMPONENT),
                        utf8_percent_encode(value, QUERY_COMPONENT)
                    )
                })
                .collect();
            url.push('?');
            url.push_str(&encoded.join("&"));
        }
        HttpRequest {
            method: HttpMethod::Get,
            url,
            headers: self.auth_headers(),
            body: None,
        }
    }

    /// `POST base/path` with `body` as JSON.
    pub fn build_post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<HttpRequest> {
        let body = json::to_string(body).map_err(|e| {
            PlategaError::invalid_argument("body", format!("failed to serialize request body: {e}"))
        })?;
        let mut headers = self.auth_headers();
        headers.push((HEADER_CONTENT_TYPE.to_string(), MIME_JSON_UTF8.to_string()));
        Ok(HttpRequest {
            method: HttpMethod::Post,
            url: self.url(path),
            headers,
            body: Some(body),
        })
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        cancel: &CancellationToken,
    ) -> Result<T> {
        let request = self.build_get(path, query);
        self.execute(request, path, cancel).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B, cancel: &CancellationToken) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.build_post(path, body)?;
        self.execute(request, path, cancel).await
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        request: HttpRequest,
        path: &str,
        cancel: &CancellationToken,
    ) -> Result<T> {
        let span = debug_span!("platega_request", method = request.method.as_str(), path = %path);

        async move {
            tracing::debug!("dispatching request");

            let sent = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::debug!("request cancelled by caller");
                    return Err(PlategaError::Cancelled);
                }
                sent = self.transport.send(request) => sent,
            };

            let response = sent.map_err(|e| {
                tracing::warn!(error = %e, "transport failure");
                ApiError::transport(e)
            })?;

            tracing::debug!(status = response.status, "received response");
            parse_response(response)
        }
        .instrument(span)
        .await
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn auth_headers(&self) -> Vec<(String, String)> {
        vec![
            (
                HEADER_MERCHANT_ID.to_string(),
                self.credentials.merchant_id().to_string(),
            ),
            (HEADER_SECRET.to_string(), self.credentials.secret().to_string()),
            (HEADER_ACCEPT.to_string(), MIME_JSON.to_string()),
        ]
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("base_url", &self.base_url)
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}

/// Classify `response` and deserialize its body on success.
///
/// Non-2xx statuses map to their [`crate::ApiErrorKind`]. A 2xx body that is
/// `null` or does not fit `T` is a `Generic` error carrying the status and
/// raw text.
pub fn parse_response<T: DeserializeOwned>(response: HttpResponse) -> Result<T> {
    let success = response.is_success();
    let HttpResponse { status, body, .. } = response;

    if !success {
        let err = ApiError::from_status(status, body);
        tracing::warn!(status, kind = ?err.kind(), "API returned an error status");
        return Err(err.into());
    }

    match json::from_str::<T>(&body) {
        Ok(Some(value)) => Ok(value),
        Ok(None) => {
            tracing::warn!(status, "API returned a null body");
            Err(ApiError::unparsable(
                Some(status),
                body,
                "failed to deserialize API response: result is null",
            )
            .into())
        }
        Err(e) => {
            tracing::warn!(status, error = %e, "failed to deserialize API response");
            Err(ApiError::unparsable(
                Some(status),
                body,
                format!("failed to deserialize API response: {e}"),
            )
            .into())
        }
    }
}
