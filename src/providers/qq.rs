use super::http::{self, enc};
use super::{wrong_continuation, LyricsProvider, ProviderId};
use crate::error::LyricsError;
use crate::lyrics::{syllable, LyricsOptions, ProviderContinuation, SearchHit, SongQuery, TrackInfo};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};

/// Artist field as either a joined string or a list of names.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
enum Artists {
    One(String),
    Many(Vec<String>),
}

impl Artists {
    fn joined(&self) -> String {
        match self {
            Artists::One(name) => name.clone(),
            Artists::Many(names) => names.join(", "),
        }
    }
}

impl Default for Artists {
    fn default() -> Self {
        Artists::One(String::new())
    }
}

/// One search result. Serialized back verbatim as the lyrics request body.
#[derive(Debug, Clone, Deserialize, Serialize)]
struct QqSong {
    id: serde_json::Value,
    #[serde(default)]
    title: String,
    #[serde(default)]
    artist: Artists,
    #[serde(default)]
    album: String,
    #[serde(default)]
    cover: String,
    #[serde(default)]
    url: String,
}

/// QQ Music through the lyrics proxy. The lyrics call needs the whole song
/// record, so it rides along in the continuation.
#[derive(Debug, Clone)]
pub struct QqProvider {
    client: reqwest::Client,
    proxy_url: String,
}

impl QqProvider {
    pub fn new(client: reqwest::Client, proxy_url: &str) -> Self {
        Self {
            client,
            proxy_url: proxy_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl LyricsProvider for QqProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Qq
    }

    async fn search(&self, query: &SongQuery, offset: u32) -> Result<SearchHit, LyricsError> {
        let text = query.search_text()?;
        let url = format!("{}/qq/search?q={}", self.proxy_url, enc(&text));
        tracing::debug!("qq search: {url}");

        let songs: Vec<QqSong> = http::get_json(self.client.get(&url))
            .await?
            .ok_or(LyricsError::NoTrackFound)?;
        let song = songs.into_iter().nth(offset as usize).ok_or(LyricsError::NoTrackFound)?;

        let payload = serde_json::to_string(&song).map_err(LyricsError::internal)?;
        Ok(SearchHit {
            track: TrackInfo {
                artist_name: song.artist.joined(),
                song_name: song.title,
                song_link: song.url,
                album_cover_link: song.cover,
            },
            continuation: ProviderContinuation::Qq(payload),
        })
    }

    async fn fetch_lyrics(
        &self,
        continuation: &ProviderContinuation,
        options: &LyricsOptions,
    ) -> Result<Option<String>, LyricsError> {
        let ProviderContinuation::Qq(payload) = continuation else {
            return Err(wrong_continuation(self.id(), continuation));
        };

        let url = format!("{}/qq/lyrics", self.proxy_url);
        let request = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .body(payload.clone());
        match http::get_text(request).await? {
            Some(body) => syllable::convert(&body, options),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer) -> QqProvider {
        QqProvider::new(reqwest::Client::new(), &server.uri())
    }

    #[tokio::test]
    async fn test_search_picks_result_at_offset() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/qq/search"))
            .and(query_param("q", "晴天 周杰伦"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {
                    "id": 1, "title": "晴天", "artist": "周杰伦",
                    "album": "叶惠美", "cover": "c1", "url": "u1"
                },
                {
                    "id": 2, "title": "晴天 (Live)", "artist": ["周杰伦", "Guest"],
                    "album": "", "cover": "c2", "url": "u2"
                }
            ])))
            .mount(&server)
            .await;

        let p = provider(&server);
        let first = p.search(&SongQuery::new("晴天", "周杰伦"), 0).await.unwrap();
        assert_eq!(first.track.song_name, "晴天");
        assert_eq!(first.track.album_cover_link, "c1");

        let second = p.search(&SongQuery::new("晴天", "周杰伦"), 1).await.unwrap();
        assert_eq!(second.track.artist_name, "周杰伦, Guest");
        let ProviderContinuation::Qq(payload) = &second.continuation else {
            panic!("expected qq continuation");
        };
        let record: serde_json::Value = serde_json::from_str(payload).unwrap();
        assert_eq!(record["id"], 2);

        assert_eq!(
            p.search(&SongQuery::new("晴天", "周杰伦"), 2).await,
            Err(LyricsError::NoTrackFound)
        );
    }

    #[tokio::test]
    async fn test_fetch_lyrics_posts_song_record() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/qq/lyrics"))
            .and(body_partial_json(json!({"id": 5, "title": "Song"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "type": "Line",
                "content": [{"text": [{"text": "line one"}], "timestamp": 2500}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let payload = json!({"id": 5, "title": "Song", "artist": "A"}).to_string();
        let lrc = provider(&server)
            .fetch_lyrics(&ProviderContinuation::Qq(payload), &LyricsOptions::default())
            .await
            .unwrap();
        assert_eq!(lrc.as_deref(), Some("[00:02.50]line one"));
    }

    #[tokio::test]
    async fn test_fetch_lyrics_garbage_is_internal() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let result = provider(&server)
            .fetch_lyrics(&ProviderContinuation::Qq("{}".into()), &LyricsOptions::default())
            .await;
        assert!(matches!(result, Err(LyricsError::Internal(_))));
    }
}
