use super::TokenSource;
use crate::error::LyricsError;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

static BUNDLE_PATH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/assets/index[-~][\w-]+\.js").expect("static regex"));

static JWT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"eyJh[\w-]+\.[\w-]+\.[\w-]+").expect("static regex"));

#[derive(Debug, Deserialize)]
struct SessionTokenResponse {
    #[serde(rename = "accessToken")]
    access_token: Option<String>,
}

/// Anonymous web-player session token, fetched with one unauthenticated GET.
#[derive(Debug, Clone)]
pub struct SessionTokenSource {
    http: reqwest::Client,
    url: String,
}

impl SessionTokenSource {
    pub fn new(http: reqwest::Client, url: impl Into<String>) -> Self {
        Self { http, url: url.into() }
    }
}

#[async_trait]
impl TokenSource for SessionTokenSource {
    async fn fetch(&self) -> Result<String, LyricsError> {
        tracing::debug!("fetching session token");
        let response = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(LyricsError::from_transport)?;

        if !response.status().is_success() {
            return Err(LyricsError::TokenUnavailable(format!(
                "session token endpoint returned {}",
                response.status()
            )));
        }

        let body: SessionTokenResponse = response
            .json()
            .await
            .map_err(|e| LyricsError::TokenUnavailable(format!("session token body: {e}")))?;

        body.access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                LyricsError::TokenUnavailable("session token missing accessToken".into())
            })
    }
}

/// Bearer token embedded in the web player's script bundle.
///
/// The bootstrap page references the bundle by path; the bundle contains the
/// token as a JWT literal. Neither step has a documented contract.
#[derive(Debug, Clone)]
pub struct ScrapedTokenSource {
    http: reqwest::Client,
    page_url: String,
}

impl ScrapedTokenSource {
    pub fn new(http: reqwest::Client, page_url: impl Into<String>) -> Self {
        Self {
            http,
            page_url: page_url.into(),
        }
    }

    async fn get_text(&self, url: &str) -> Result<String, LyricsError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(LyricsError::from_transport)?;
        if !response.status().is_success() {
            return Err(LyricsError::TokenUnavailable(format!(
                "{url} returned {}",
                response.status()
            )));
        }
        response.text().await.map_err(LyricsError::from_transport)
    }
}

#[async_trait]
impl TokenSource for ScrapedTokenSource {
    async fn fetch(&self) -> Result<String, LyricsError> {
        tracing::debug!("scraping bearer token from {}", self.page_url);
        let html = self.get_text(&self.page_url).await?;
        let bundle_path = extract_bundle_path(&html)
            .ok_or_else(|| LyricsError::TokenUnavailable("script bundle path not found".into()))?;

        let bundle_url = format!("{}{}", origin(&self.page_url), bundle_path);
        let script = self.get_text(&bundle_url).await?;
        extract_token(&script)
            .map(str::to_string)
            .ok_or_else(|| {
                LyricsError::TokenUnavailable("token literal not found in bundle".into())
            })
    }
}

fn extract_bundle_path(html: &str) -> Option<&str> {
    BUNDLE_PATH_RE.find(html).map(|m| m.as_str())
}

fn extract_token(script: &str) -> Option<&str> {
    JWT_RE.find(script).map(|m| m.as_str())
}

/// `https://host/some/page` -> `https://host`
fn origin(url: &str) -> &str {
    let after_scheme = url.find("://").map(|i| i + 3).unwrap_or(0);
    match url[after_scheme..].find('/') {
        Some(slash) => &url[..after_scheme + slash],
        None => url,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PAGE: &str = concat!(
        r#"<html><script type="module" crossorigin src="/assets/index~a1B2-c3.js">"#,
        "</script></html>"
    );
    const BUNDLE: &str = r#"var x="abc";const t="eyJhbGciOi.eyJpc3MiOi.sIg_n-ature";"#;

    #[test]
    fn test_extract_patterns() {
        assert_eq!(extract_bundle_path(PAGE), Some("/assets/index~a1B2-c3.js"));
        assert_eq!(extract_token(BUNDLE), Some("eyJhbGciOi.eyJpc3MiOi.sIg_n-ature"));
        assert_eq!(extract_bundle_path("<html></html>"), None);
        assert_eq!(extract_token("no token here"), None);
    }

    #[test]
    fn test_origin() {
        assert_eq!(origin("https://beta.music.apple.com"), "https://beta.music.apple.com");
        assert_eq!(origin("http://127.0.0.1:8080/browse"), "http://127.0.0.1:8080");
    }

    #[tokio::test]
    async fn test_scraped_source_follows_bundle() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/assets/index~a1B2-c3.js"))
            .respond_with(ResponseTemplate::new(200).set_body_string(BUNDLE))
            .expect(1)
            .mount(&server)
            .await;

        let source = ScrapedTokenSource::new(reqwest::Client::new(), format!("{}/", server.uri()));
        assert_eq!(source.fetch().await.unwrap(), "eyJhbGciOi.eyJpc3MiOi.sIg_n-ature");
    }

    #[tokio::test]
    async fn test_scraped_source_without_bundle_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .mount(&server)
            .await;

        let source = ScrapedTokenSource::new(reqwest::Client::new(), server.uri());
        assert!(matches!(source.fetch().await, Err(LyricsError::TokenUnavailable(_))));
    }

    #[tokio::test]
    async fn test_session_source_reads_access_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/get_access_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "accessToken": "BQD-session",
                "isAnonymous": true
            })))
            .mount(&server)
            .await;

        let source = SessionTokenSource::new(
            reqwest::Client::new(),
            format!("{}/get_access_token", server.uri()),
        );
        assert_eq!(source.fetch().await.unwrap(), "BQD-session");
    }

    #[tokio::test]
    async fn test_session_source_missing_field() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let source = SessionTokenSource::new(reqwest::Client::new(), server.uri());
        assert!(matches!(source.fetch().await, Err(LyricsError::TokenUnavailable(_))));
    }
}
