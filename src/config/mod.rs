use anyhow::Context;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub mod defaults;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub http: HttpConfig,
    pub providers: ProvidersConfig,
    pub output: OutputConfig,
    pub batch: BatchConfig,
    pub paths: PathsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
}

/// Provider selection and endpoint base URLs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    /// Provider id used when none is given on the command line.
    pub default: String,
    pub spotify_token_url: String,
    pub spotify_api_url: String,
    pub spotify_lyrics_url: String,
    pub lrclib_url: String,
    pub netease_url: String,
    /// Bootstrap page the Apple Music bearer token is scraped from.
    pub apple_page_url: String,
    pub apple_api_url: String,
    pub apple_storefront: String,
    /// Word-level lyrics proxy (Apple Music lyrics, QQ Music, Musixmatch).
    pub proxy_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Written into the `[by:]` header line.
    pub generator: String,
    /// Embed into the audio tag instead of writing a sidecar `.lrc`.
    pub embed: bool,
    pub multi_person_word_by_word: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Consecutive "not found" results treated as throttling.
    pub not_found_threshold: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub data_dir: PathBuf,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            user_agent: defaults::USER_AGENT.to_string(),
        }
    }
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            default: "lrclib".to_string(),
            spotify_token_url: defaults::SPOTIFY_TOKEN_URL.to_string(),
            spotify_api_url: defaults::SPOTIFY_API_URL.to_string(),
            spotify_lyrics_url: defaults::SPOTIFY_LYRICS_URL.to_string(),
            lrclib_url: defaults::LRCLIB_URL.to_string(),
            netease_url: defaults::NETEASE_URL.to_string(),
            apple_page_url: defaults::APPLE_PAGE_URL.to_string(),
            apple_api_url: defaults::APPLE_API_URL.to_string(),
            apple_storefront: "us".to_string(),
            proxy_url: defaults::PROXY_URL.to_string(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            generator: "lrcsync".to_string(),
            embed: false,
            multi_person_word_by_word: true,
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { not_found_threshold: 5 }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        let proj = ProjectDirs::from("dev", "lrcsync", "lrcsync");
        let data_dir = proj
            .as_ref()
            .map(|p| p.data_dir().to_path_buf())
            .unwrap_or_else(|| std::env::temp_dir().join("lrcsync"));
        Self { data_dir }
    }
}

impl Config {
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.http.timeout_secs.max(1))
    }
}

pub fn save(cfg: &Config, override_path: Option<&Path>) -> anyhow::Result<()> {
    let path = match override_path {
        Some(p) => p.to_path_buf(),
        None => default_config_path()?,
    };
    write_config(cfg, &path)
}

pub fn default_config_path() -> anyhow::Result<PathBuf> {
    let proj = ProjectDirs::from("dev", "lrcsync", "lrcsync").context("ProjectDirs unavailable")?;
    Ok(proj.config_dir().join("config.toml"))
}

pub fn load(override_path: Option<&Path>) -> anyhow::Result<Config> {
    let path = match override_path {
        Some(p) => p.to_path_buf(),
        None => default_config_path()?,
    };

    if !path.exists() {
        let cfg = defaults::defaults();
        write_config(&cfg, &path)?;
        return Ok(cfg);
    }

    let raw = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
    let cfg = toml::from_str::<Config>(&raw).with_context(|| format!("parse {}", path.display()))?;
    Ok(cfg)
}

fn write_config(cfg: &Config, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create dir {}", parent.display()))?;
    }
    let raw = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(path, raw).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let cfg = load(Some(&path)).unwrap();
        assert!(path.exists());
        assert_eq!(cfg.providers.default, "lrclib");
        assert_eq!(cfg.batch.not_found_threshold, 5);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[providers]\ndefault = \"apple\"\n\n[output]\nembed = true\n").unwrap();

        let cfg = load(Some(&path)).unwrap();
        assert_eq!(cfg.providers.default, "apple");
        assert_eq!(cfg.providers.lrclib_url, defaults::LRCLIB_URL);
        assert!(cfg.output.embed);
        assert!(cfg.output.multi_person_word_by_word);
        assert_eq!(cfg.http.timeout_secs, 10);
    }

    #[test]
    fn test_save_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut cfg = defaults::defaults();
        cfg.output.generator = "me".into();
        cfg.providers.default = "netease".into();
        save(&cfg, Some(&path)).unwrap();

        let back = load(Some(&path)).unwrap();
        assert_eq!(back.output.generator, "me");
        assert_eq!(back.providers.default, "netease");
    }
}
