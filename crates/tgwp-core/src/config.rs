use std::{
    env, fmt, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{errors::Error, Result};

const DEFAULT_CATEGORY_ID: u64 = 10;
const DEFAULT_CURSOR_FILE: &str = "last_message_id.json";
const DEFAULT_LOG_FILE: &str = "telegram_bot.log";

/// Typed configuration, built once at startup and shared by reference.
#[derive(Clone)]
pub struct Config {
    // Telegram
    pub telegram_bot_token: String,
    /// Channel username without the leading `@`.
    pub telegram_channel: String,
    pub telegram_update_limit: u8,
    pub telegram_poll_timeout: Duration,

    // WordPress
    pub wp_url: String,
    pub wp_username: String,
    pub wp_password: String,
    pub wp_category_id: u64,
    pub http_timeout: Duration,

    // Local state
    pub cursor_file: PathBuf,
    pub log_file: Option<PathBuf>,
}

impl Config {
    /// Load from the process environment, seeding it from `./.env` first.
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the environment in production).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| -> Result<String> {
            lookup(key)
                .and_then(non_empty)
                .ok_or_else(|| Error::Config(format!("{key} environment variable is required")))
        };

        let telegram_bot_token = required("TELEGRAM_BOT_TOKEN")?.trim().to_string();
        let telegram_channel = required("TELEGRAM_CHANNEL_USERNAME")?
            .trim()
            .trim_start_matches('@')
            .to_string();
        let wp_url = required("WP_URL")?.trim().trim_end_matches('/').to_string();
        let wp_username = required("WP_USERNAME")?;
        let wp_password = required("WP_PASSWORD")?;

        let wp_category_id = match lookup("WP_CATEGORY_ID").and_then(non_empty) {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                Error::Config(format!("WP_CATEGORY_ID must be a positive integer, got {raw:?}"))
            })?,
            None => DEFAULT_CATEGORY_ID,
        };

        let telegram_update_limit = parse_num::<u8>(&lookup, "TELEGRAM_UPDATE_LIMIT")
            .unwrap_or(20)
            .clamp(1, 100);
        let telegram_poll_timeout =
            Duration::from_secs(parse_num(&lookup, "TELEGRAM_POLL_TIMEOUT_SECS").unwrap_or(10));
        let http_timeout =
            Duration::from_secs(parse_num(&lookup, "HTTP_TIMEOUT_SECS").unwrap_or(30));

        let cursor_file = PathBuf::from(
            lookup("CURSOR_FILE")
                .and_then(non_empty)
                .unwrap_or_else(|| DEFAULT_CURSOR_FILE.to_string()),
        );
        // An explicitly empty LOG_FILE turns file logging off.
        let log_file = match lookup("LOG_FILE") {
            Some(v) => non_empty(v).map(PathBuf::from),
            None => Some(PathBuf::from(DEFAULT_LOG_FILE)),
        };

        Ok(Self {
            telegram_bot_token,
            telegram_channel,
            telegram_update_limit,
            telegram_poll_timeout,
            wp_url,
            wp_username,
            wp_password,
            wp_category_id,
            http_timeout,
            cursor_file,
            log_file,
        })
    }

    /// Short token prefix, safe to put in logs.
    pub fn token_hint(&self) -> String {
        let head: String = self.telegram_bot_token.chars().take(10).collect();
        format!("{head}...")
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("telegram_bot_token", &self.token_hint())
            .field("telegram_channel", &self.telegram_channel)
            .field("telegram_update_limit", &self.telegram_update_limit)
            .field("telegram_poll_timeout", &self.telegram_poll_timeout)
            .field("wp_url", &self.wp_url)
            .field("wp_username", &self.wp_username)
            .field("wp_password", &"<redacted>")
            .field("wp_category_id", &self.wp_category_id)
            .field("http_timeout", &self.http_timeout)
            .field("cursor_file", &self.cursor_file)
            .field("log_file", &self.log_file)
            .finish()
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() || env::var_os(key).is_some() {
            continue;
        }

        env::set_var(key, unquote(v.trim()));
    }
}

fn unquote(val: &str) -> &str {
    let quoted = val.len() >= 2
        && ((val.starts_with('"') && val.ends_with('"'))
            || (val.starts_with('\'') && val.ends_with('\'')));
    if quoted {
        &val[1..val.len() - 1]
    } else {
        val
    }
}

fn parse_num<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|s| s.trim().parse::<T>().ok())
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
