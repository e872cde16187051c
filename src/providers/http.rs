//! Request helpers shared by the adapters
//!
//! Non-2xx statuses and empty or sentinel bodies mean "nothing here"; only
//! transport failures become errors.

use crate::error::LyricsError;
use crate::token::{TokenCache, TokenKind};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

pub fn build_client(user_agent: &str, timeout: Duration) -> anyhow::Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_str(user_agent)?);
    let client = reqwest::Client::builder()
        .default_headers(headers)
        .timeout(timeout)
        .build()?;
    Ok(client)
}

pub(crate) async fn send(request: RequestBuilder) -> Result<Response, LyricsError> {
    request.send().await.map_err(LyricsError::from_transport)
}

/// Read a successful body. `Ok(None)` for non-2xx or sentinel bodies.
pub(crate) async fn read_body(response: Response) -> Result<Option<String>, LyricsError> {
    let status = response.status();
    if !status.is_success() {
        tracing::debug!("{} returned {status}", response.url());
        return Ok(None);
    }
    let body = response.text().await.map_err(LyricsError::from_transport)?;
    if is_sentinel(&body) {
        return Ok(None);
    }
    Ok(Some(body))
}

pub(crate) async fn get_text(request: RequestBuilder) -> Result<Option<String>, LyricsError> {
    read_body(send(request).await?).await
}

pub(crate) async fn get_json<T: DeserializeOwned>(
    request: RequestBuilder,
) -> Result<Option<T>, LyricsError> {
    match get_text(request).await? {
        Some(body) => decode(&body).map(Some),
        None => Ok(None),
    }
}

/// GET with a cached bearer credential. A 401 drops the credential and the
/// request is repeated once with a fresh one.
pub(crate) async fn get_json_authorized<T, F>(
    tokens: &TokenCache,
    kind: TokenKind,
    build: F,
) -> Result<Option<T>, LyricsError>
where
    T: DeserializeOwned,
    F: Fn(&str) -> RequestBuilder + Send + Sync,
{
    let token = tokens.token(kind).await?;
    let mut response = send(build(&token)).await?;
    if is_unauthorized(&response) {
        tracing::warn!("{kind:?} token rejected, fetching a new one");
        tokens.invalidate(kind).await;
        let token = tokens.token(kind).await?;
        response = send(build(&token)).await?;
    }
    match read_body(response).await? {
        Some(body) => decode(&body).map(Some),
        None => Ok(None),
    }
}

pub(crate) fn decode<T: DeserializeOwned>(body: &str) -> Result<T, LyricsError> {
    serde_json::from_str(body)
        .map_err(|e| LyricsError::internal(format!("unexpected response shape: {e}")))
}

pub(crate) fn is_unauthorized(response: &Response) -> bool {
    response.status() == StatusCode::UNAUTHORIZED
}

pub(crate) fn is_sentinel(body: &str) -> bool {
    matches!(body.trim(), "" | "[]" | "{}" | "null")
}

pub(crate) fn enc(s: &str) -> std::borrow::Cow<'_, str> {
    urlencoding::encode(s)
}
