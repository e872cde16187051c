use anyhow::Context;
use clap::{Parser, Subcommand};
use lrcsync::batch::{BatchDownloader, BatchEvent, BatchItem, BatchStatus, SongOutcome};
use lrcsync::config::{self, Config};
use lrcsync::lyrics::{LyricsOptions, SongMatch, SongQuery};
use lrcsync::output::{self, FileSink};
use lrcsync::providers::{ProviderId, ProviderRegistry};
use lrcsync::resolver::{CancelFlag, Resolver};
use lrcsync::storage::{self, Storage};
use lrcsync::LyricsError;
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing::Level;

#[derive(Debug, Parser)]
#[command(name = "lrcsync", version, about = "Fetch synced lyrics (LRC) from several providers")]
struct Cli {
    /// Override config file path.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Debug logging on stderr.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Find a track and print the match.
    Search {
        title: String,
        #[arg(long, default_value = "")]
        artist: String,
        #[arg(long)]
        provider: Option<ProviderId>,
        /// Rank of the match to take (0 is the best).
        #[arg(long, default_value_t = 0)]
        offset: u32,
    },
    /// Find a track and print its LRC file.
    Get {
        title: String,
        #[arg(long, default_value = "")]
        artist: String,
        #[arg(long)]
        provider: Option<ProviderId>,
        #[arg(long, default_value_t = 0)]
        offset: u32,
        /// Skip the local lyrics cache.
        #[arg(long)]
        no_cache: bool,
        /// No v1:/v2: speaker prefixes or background lines.
        #[arg(long)]
        single_speaker: bool,
    },
    /// Download lyrics for audio files, tagged or named by title.
    Batch {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[arg(long)]
        provider: Option<ProviderId>,
        /// Write into the audio file's tag instead of a .lrc file.
        #[arg(long)]
        embed: bool,
    },
    /// List provider ids.
    Providers {
        /// Save this provider as the default in the config file.
        #[arg(long)]
        set_default: Option<ProviderId>,
    },
    /// Drop every cached lyrics body.
    ClearCache,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .init();

    let cfg = config::load(cli.config.as_deref()).context("load config")?;

    match cli.command {
        Command::Search {
            title,
            artist,
            provider,
            offset,
        } => {
            let provider = pick_provider(&cfg, provider)?;
            let mut resolver = Resolver::new(ProviderRegistry::from_config(&cfg)?);
            let query = SongQuery::new(title, artist);
            let found = search(&mut resolver, &query, offset, provider).await?;
            print_match(&found);
        }
        Command::Get {
            title,
            artist,
            provider,
            offset,
            no_cache,
            single_speaker,
        } => {
            let provider = pick_provider(&cfg, provider)?;
            let options = LyricsOptions {
                multi_person_word_by_word: cfg.output.multi_person_word_by_word && !single_speaker,
            };
            let mut resolver = Resolver::new(ProviderRegistry::from_config(&cfg)?);
            let query = SongQuery::new(title, artist);
            let found = search(&mut resolver, &query, offset, provider).await?;

            let store = if no_cache {
                None
            } else {
                Some(Storage::open(&cfg.paths.data_dir.join(storage::DB_FILE))?)
            };
            let key = cache_key(&found, &options);

            let cached = match &store {
                Some(s) => s.get_lyrics(provider.as_str(), &key)?,
                None => None,
            };
            let body = match cached {
                Some(hit) => {
                    tracing::debug!("lyrics cache hit for {key}");
                    hit.lrc_content
                }
                None => {
                    let body = resolver
                        .resolve_lyrics(&found.continuation, provider, &options)
                        .await
                        .with_context(|| {
                            format!("no synced lyrics for `{}` on {provider}", found.song_name)
                        })?;
                    if let Some(s) = &store {
                        s.cache_lyrics(provider.as_str(), &key, &body, storage::now_unix())?;
                    }
                    body
                }
            };
            println!(
                "{}",
                output::render(&found.song_name, &found.artist_name, &cfg.output.generator, &body)
            );
        }
        Command::Batch { files, provider, embed } => {
            let provider = pick_provider(&cfg, provider)?;
            run_batch(&cfg, files, provider, embed || cfg.output.embed).await?;
        }
        Command::Providers { set_default } => {
            let mut cfg = cfg;
            if let Some(id) = set_default {
                cfg.providers.default = id.to_string();
                config::save(&cfg, cli.config.as_deref()).context("save config")?;
            }
            for id in ProviderRegistry::from_config(&cfg)?.ids() {
                let marker = if id.as_str() == cfg.providers.default {
                    " (default)"
                } else {
                    ""
                };
                println!("{id}{marker}");
            }
        }
        Command::ClearCache => {
            let store = Storage::open(&cfg.paths.data_dir.join(storage::DB_FILE))?;
            let removed = store.clear_lyrics()?;
            println!("Removed {removed} cached lyrics.");
        }
    }

    Ok(())
}

fn pick_provider(cfg: &Config, flag: Option<ProviderId>) -> anyhow::Result<ProviderId> {
    match flag {
        Some(id) => Ok(id),
        None => cfg
            .providers
            .default
            .parse()
            .map_err(|e: String| anyhow::anyhow!("config providers.default: {e}")),
    }
}

/// Search with user-facing messages for the expected failures.
async fn search(
    resolver: &mut Resolver,
    query: &SongQuery,
    offset: u32,
    provider: ProviderId,
) -> anyhow::Result<SongMatch> {
    let result = resolver.resolve_song(query, offset, provider).await;
    tracing::debug!("{provider}: resolution {}", resolver.state().label());
    result.map_err(|e| match e {
        LyricsError::EmptyQuery => anyhow::anyhow!("enter a song title or an artist"),
        LyricsError::NoTrackFound => {
            anyhow::anyhow!("no track found on {provider}, try another offset or provider")
        }
        LyricsError::NoConnection(_) => {
            anyhow::anyhow!("could not reach {provider}, check your connection")
        }
        other => {
            tracing::error!("{provider}: {other}");
            anyhow::anyhow!("something went wrong while searching {provider}")
        }
    })
}

fn cache_key(found: &SongMatch, options: &LyricsOptions) -> String {
    let mode = if options.multi_person_word_by_word { "multi" } else { "single" };
    format!("{}#{mode}", found.continuation.cache_key())
}

fn print_match(found: &SongMatch) {
    println!("{} - {}", found.song_name, found.artist_name);
    if !found.song_link.is_empty() {
        println!("  link:  {}", found.song_link);
    }
    if !found.album_cover_link.is_empty() {
        println!("  cover: {}", found.album_cover_link);
    }
    println!("  id:    {}", found.continuation.cache_key());
}

async fn run_batch(
    cfg: &Config,
    files: Vec<PathBuf>,
    provider: ProviderId,
    embed: bool,
) -> anyhow::Result<()> {
    let items: Vec<BatchItem> = files
        .into_iter()
        .map(|path| BatchItem::new(output::query_from_audio(&path), Some(path)))
        .collect();
    let total = items.len();

    let cancel = CancelFlag::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("cancelling after the current song");
                cancel.cancel();
            }
        }
    });

    let (tx, mut rx) = mpsc::channel::<BatchEvent>(64);
    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            if let BatchEvent::SongFinished { index, outcome, counts } = event {
                let label = match &outcome {
                    SongOutcome::Success => "saved".to_string(),
                    SongOutcome::NoLyrics => "no lyrics".to_string(),
                    SongOutcome::Failed(reason) => format!("failed: {reason}"),
                };
                println!(
                    "[{}/{total}] {label}  (ok {}, no lyrics {}, failed {})",
                    index + 1,
                    counts.success,
                    counts.no_lyrics,
                    counts.failed
                );
            }
        }
    });

    let options = LyricsOptions {
        multi_person_word_by_word: cfg.output.multi_person_word_by_word,
    };
    let resolver = Resolver::new(ProviderRegistry::from_config(cfg)?);
    let mut downloader = BatchDownloader::new(resolver, provider, options)
        .with_threshold(cfg.batch.not_found_threshold as usize)
        .with_events(tx);
    let sink = FileSink::new(cfg.output.generator.clone(), embed);

    let summary = downloader.run(&items, &sink, &cancel).await;
    drop(downloader);
    let _ = printer.await;

    let processed = summary.counts.total();
    match summary.status {
        BatchStatus::Completed => println!("done: {processed} of {total} songs processed"),
        BatchStatus::Cancelled => println!("cancelled: {processed} of {total} songs processed"),
        BatchStatus::RateLimited => {}
    }
    if let Some(err) = summary.error() {
        anyhow::bail!("{provider}: {err}; stopped after {processed} of {total} songs");
    }
    Ok(())
}
