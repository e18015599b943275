//! Channel post fetching via the public web preview.
//!
//! Telegram serves the latest posts of a public channel at
//! `https://t.me/s/<username>` as plain HTML, paginated backwards with
//! `?before=<message_id>`. Each page lists roughly twenty posts in
//! oldest-first order.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Client;
use scraper::{Html, Selector};
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

use super::channel::{message_link, ChannelConfig, TelegramMessage};

const USER_AGENT: &str = concat!("infocus/", env!("CARGO_PKG_VERSION"));

/// Errors that can occur while fetching channel posts.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Failed to reach t.me
    #[error("Connection error: {0}")]
    Connection(String),
    /// Preview endpoint returned an error status
    #[error("HTTP {0} fetching {1}")]
    Http(reqwest::StatusCode, String),
    /// Response body did not look like a channel preview page
    #[error("Unexpected preview markup: {0}")]
    Parse(String),
}

/// Fetcher for public channel posts.
pub struct ChannelFetcher {
    client: Client,
}

impl Default for ChannelFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelFetcher {
    pub fn new() -> Self {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .gzip(true)
            .brotli(true)
            .build()
            .expect("Failed to create HTTP client");

        Self { client }
    }

    /// Fetch up to `limit` most recent posts from a channel, returned in
    /// chronological (oldest-first) order. Media-only posts without text
    /// are skipped.
    pub async fn fetch_channel_messages(
        &self,
        channel: &ChannelConfig,
    ) -> Result<Vec<TelegramMessage>, FetchError> {
        let mut collected: Vec<TelegramMessage> = Vec::new();
        let mut before: Option<i64> = None;

        loop {
            let mut url = Url::parse("https://t.me/")
                .expect("static URL")
                .join(&format!("s/{}", channel.username()))
                .map_err(|e| FetchError::Parse(e.to_string()))?;
            if let Some(id) = before {
                url.query_pairs_mut().append_pair("before", &id.to_string());
            }
            debug!("Fetching channel preview: {}", url);

            let resp = self
                .client
                .get(url.clone())
                .send()
                .await
                .map_err(|e| FetchError::Connection(e.to_string()))?;
            if !resp.status().is_success() {
                return Err(FetchError::Http(resp.status(), url.to_string()));
            }
            let body = resp
                .text()
                .await
                .map_err(|e| FetchError::Connection(e.to_string()))?;

            let page = parse_preview(&body, channel.username())?;
            if page.is_empty() {
                break;
            }

            // Each page is older than everything collected so far
            let next_before = page.first().map(|m| m.message_id);
            let mut merged = page;
            merged.append(&mut collected);
            collected = merged;

            if collected.len() >= channel.limit() {
                break;
            }
            if next_before == before {
                warn!("Pagination made no progress at {:?}, stopping", before);
                break;
            }
            before = next_before;
        }

        keep_latest(&mut collected, channel.limit());
        info!(
            "Fetched {} posts from @{}",
            collected.len(),
            channel.username()
        );
        Ok(collected)
    }

    /// Fetch several channels sequentially, concatenating results.
    pub async fn fetch_many(
        &self,
        channels: &[ChannelConfig],
    ) -> Result<Vec<TelegramMessage>, FetchError> {
        let mut items = Vec::new();
        for channel in channels {
            items.extend(self.fetch_channel_messages(channel).await?);
        }
        Ok(items)
    }
}

/// Parse one preview page into messages, in document (oldest-first) order.
///
/// Posts without a text body (photos, polls, service messages) are
/// skipped; a missing timestamp falls back to the current time.
fn parse_preview(html: &str, username: &str) -> Result<Vec<TelegramMessage>, FetchError> {
    let document = Html::parse_document(html);
    let message_sel = Selector::parse("div.tgme_widget_message").unwrap();
    let text_sel = Selector::parse("div.tgme_widget_message_text").unwrap();
    let time_sel = Selector::parse("time[datetime]").unwrap();
    let info_sel = Selector::parse("div.tgme_channel_info").unwrap();

    let mut messages = Vec::new();
    for element in document.select(&message_sel) {
        // data-post carries "<username>/<id>"
        let Some(id) = element
            .value()
            .attr("data-post")
            .and_then(|post| post.rsplit('/').next())
            .and_then(|raw| raw.parse::<i64>().ok())
        else {
            continue;
        };

        let text: String = element
            .select(&text_sel)
            .next()
            .map(|node| node.text().collect())
            .unwrap_or_default();
        let text = text.trim().to_string();
        if text.is_empty() {
            continue;
        }

        let posted_at = element
            .select(&time_sel)
            .next()
            .and_then(|t| t.value().attr("datetime"))
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(Utc::now);

        messages.push(TelegramMessage {
            message_id: id,
            channel: username.to_string(),
            text,
            posted_at,
            link: Some(message_link(username, id)),
        });
    }

    if messages.is_empty() && document.select(&info_sel).next().is_none() {
        return Err(FetchError::Parse(format!(
            "no channel preview found for @{}",
            username
        )));
    }

    Ok(messages)
}

/// Trim to the `limit` most recent messages, preserving order.
fn keep_latest(messages: &mut Vec<TelegramMessage>, limit: usize) {
    if messages.len() > limit {
        let excess = messages.len() - limit;
        messages.drain(..excess);
    }
}
