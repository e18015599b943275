//! Data types for Telegram channel fetching.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::ConfigError;

/// Configuration for a Telegram channel to fetch posts from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelConfig {
    username: String,
    limit: usize,
}

impl ChannelConfig {
    /// Create a channel config; the fetch limit must be positive.
    pub fn new(username: impl Into<String>, limit: usize) -> Result<Self, ConfigError> {
        if limit == 0 {
            return Err(ConfigError::InvalidChannelLimit);
        }
        let username = username.into().trim_start_matches('@').to_string();
        Ok(Self { username, limit })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}

/// Normalized Telegram message representation for downstream processing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelegramMessage {
    pub message_id: i64,
    pub channel: String,
    pub text: String,
    pub posted_at: DateTime<Utc>,
    pub link: Option<String>,
}

pub(crate) fn message_link(username: &str, message_id: i64) -> String {
    format!("https://t.me/{}/{}", username, message_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_config_rejects_zero_limit() {
        let result = ChannelConfig::new("durov", 0);
        assert!(matches!(result, Err(ConfigError::InvalidChannelLimit)));
    }

    #[test]
    fn test_channel_config_strips_at_sign() {
        let channel = ChannelConfig::new("@durov", 50).unwrap();
        assert_eq!(channel.username(), "durov");
        assert_eq!(channel.limit(), 50);
    }

    #[test]
    fn test_message_link() {
        assert_eq!(message_link("durov", 42), "https://t.me/durov/42");
    }
}
