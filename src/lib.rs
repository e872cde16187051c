pub mod batch;
pub mod config;
pub mod error;
pub mod lyrics;
pub mod output;
pub mod providers;
pub mod resolver;
pub mod storage;
pub mod token;

pub use error::LyricsError;
