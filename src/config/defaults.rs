use super::Config;

pub const USER_AGENT: &str = "lrcsync/0.1.0";

pub const SPOTIFY_TOKEN_URL: &str =
    "https://open.spotify.com/get_access_token?reason=transport&productType=web_player";
pub const SPOTIFY_API_URL: &str = "https://api.spotify.com/v1";
pub const SPOTIFY_LYRICS_URL: &str = "https://spotify-lyrics-api-pi.vercel.app";
pub const LRCLIB_URL: &str = "https://lrclib.net/api";
pub const NETEASE_URL: &str = "https://music.xianqiao.wang/neteaseapiv2";
pub const APPLE_PAGE_URL: &str = "https://beta.music.apple.com";
pub const APPLE_API_URL: &str = "https://amp-api.music.apple.com";
pub const PROXY_URL: &str = "https://lyrics.paxsenix.org";

pub fn defaults() -> Config {
    Config::default()
}
