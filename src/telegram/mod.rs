//! Telegram channel fetching.
//!
//! A thin collaborator around the public `t.me/s/<channel>` web preview:
//! no API credentials, just HTTP and HTML parsing. Produces normalized
//! messages in chronological (oldest-first) order for the pipeline.

mod channel;
mod fetcher;

pub use channel::{ChannelConfig, TelegramMessage};
pub use fetcher::{ChannelFetcher, FetchError};
