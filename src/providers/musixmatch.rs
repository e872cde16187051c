use super::http::{self, enc};
use super::{wrong_continuation, LyricsProvider, ProviderId};
use crate::error::LyricsError;
use crate::lyrics::{syllable, LyricsOptions, ProviderContinuation, SearchHit, SongQuery, TrackInfo};
use async_trait::async_trait;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct MxmTrack {
    id: i64,
    #[serde(alias = "title", default)]
    track: String,
    #[serde(default)]
    artist: String,
    #[serde(alias = "cover", default)]
    art: String,
    #[serde(default)]
    url: String,
}

/// Musixmatch through the lyrics proxy. Word-synced lyrics first, line-synced
/// as a fallback.
#[derive(Debug, Clone)]
pub struct MusixmatchProvider {
    client: reqwest::Client,
    proxy_url: String,
}

impl MusixmatchProvider {
    pub fn new(client: reqwest::Client, proxy_url: &str) -> Self {
        Self {
            client,
            proxy_url: proxy_url.trim_end_matches('/').to_string(),
        }
    }

    async fn lyrics_of_type(
        &self,
        id: i64,
        kind: &str,
        options: &LyricsOptions,
    ) -> Result<Option<String>, LyricsError> {
        let url = format!("{}/musixmatch/lyrics?id={}&type={}", self.proxy_url, id, kind);
        match http::get_text(self.client.get(&url)).await? {
            Some(body) => syllable::convert(&body, options),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl LyricsProvider for MusixmatchProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Musixmatch
    }

    async fn search(&self, query: &SongQuery, offset: u32) -> Result<SearchHit, LyricsError> {
        let text = query.search_text()?;
        let url = format!("{}/musixmatch/search?q={}", self.proxy_url, enc(&text));
        tracing::debug!("musixmatch search: {url}");

        let tracks: Vec<MxmTrack> = http::get_json(self.client.get(&url))
            .await?
            .ok_or(LyricsError::NoTrackFound)?;
        let track = tracks.into_iter().nth(offset as usize).ok_or(LyricsError::NoTrackFound)?;

        Ok(SearchHit {
            track: TrackInfo {
                song_name: track.track,
                artist_name: track.artist,
                song_link: track.url,
                album_cover_link: track.art,
            },
            continuation: ProviderContinuation::Musixmatch(track.id),
        })
    }

    async fn fetch_lyrics(
        &self,
        continuation: &ProviderContinuation,
        options: &LyricsOptions,
    ) -> Result<Option<String>, LyricsError> {
        let ProviderContinuation::Musixmatch(id) = continuation else {
            return Err(wrong_continuation(self.id(), continuation));
        };

        match self.lyrics_of_type(*id, "word", options).await {
            Ok(Some(lrc)) => return Ok(Some(lrc)),
            Ok(None) => {}
            Err(LyricsError::Internal(e)) => {
                tracing::debug!("musixmatch word lyrics unusable for {id}: {e}");
            }
            Err(e) => return Err(e),
        }
        self.lyrics_of_type(*id, "default", options).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer) -> MusixmatchProvider {
        MusixmatchProvider::new(reqwest::Client::new(), &server.uri())
    }

    #[tokio::test]
    async fn test_search_maps_fields() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/musixmatch/search"))
            .and(query_param("q", "Yellow Coldplay"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 31, "track": "Yellow", "artist": "Coldplay", "art": "https://img/y.jpg",
                 "url": "https://www.musixmatch.com/lyrics/Coldplay/Yellow"}
            ])))
            .mount(&server)
            .await;

        let hit = provider(&server).search(&SongQuery::new("Yellow", "Coldplay"), 0).await.unwrap();
        assert_eq!(hit.continuation, ProviderContinuation::Musixmatch(31));
        assert_eq!(hit.track.song_name, "Yellow");
        assert_eq!(hit.track.album_cover_link, "https://img/y.jpg");
    }

    #[tokio::test]
    async fn test_word_lyrics_preferred() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/musixmatch/lyrics"))
            .and(query_param("type", "word"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "type": "Syllable",
                "content": [{
                    "text": [{"text": "Look", "part": false, "timestamp": 0, "endtime": 400}],
                    "timestamp": 0,
                    "endtime": 400
                }]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(query_param("type", "default"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let lrc = provider(&server)
            .fetch_lyrics(
                &ProviderContinuation::Musixmatch(31),
                &LyricsOptions { multi_person_word_by_word: false },
            )
            .await
            .unwrap();
        assert_eq!(lrc.as_deref(), Some("[00:00.00]<00:00.00>Look<00:00.40>"));
    }

    #[tokio::test]
    async fn test_falls_back_to_line_lyrics() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("type", "word"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(query_param("type", "default"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "type": "Line",
                "content": [{"text": [{"text": "Look at the stars"}], "timestamp": 1000}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let lrc = provider(&server)
            .fetch_lyrics(&ProviderContinuation::Musixmatch(31), &LyricsOptions::default())
            .await
            .unwrap();
        assert_eq!(lrc.as_deref(), Some("[00:01.00]Look at the stars"));
    }

    #[tokio::test]
    async fn test_no_lyrics_of_either_type() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .expect(2)
            .mount(&server)
            .await;

        let lrc = provider(&server)
            .fetch_lyrics(&ProviderContinuation::Musixmatch(31), &LyricsOptions::default())
            .await;
        assert_eq!(lrc, Ok(None));
    }
}
