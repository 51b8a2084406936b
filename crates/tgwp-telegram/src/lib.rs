//! Telegram adapter (teloxide).
//!
//! Implements the `tgwp-core` MessageSource port by polling `getUpdates` and
//! keeping the channel posts of the configured channel.

use std::time::Duration;

use async_trait::async_trait;
use teloxide::{
    payloads::GetUpdatesSetters,
    prelude::*,
    types::{MessageEntity, MessageEntityKind, PhotoSize, Recipient, UpdateKind},
};
use tracing::{debug, info, warn};

use tgwp_core::{
    config::Config,
    domain::{ChannelPost, ChatId, FormattingSpan, MessageId, SpanKind},
    errors::Error,
    ports::MessageSource,
    Result,
};

#[derive(Clone)]
pub struct TelegramSource {
    bot: Bot,
    channel: String,
    limit: u8,
    poll_timeout: Duration,
}

impl TelegramSource {
    pub fn new(cfg: &Config) -> Result<Self> {
        // Long polling holds the request open for the poll timeout.
        let client = teloxide::net::default_reqwest_settings()
            .timeout(cfg.http_timeout + cfg.telegram_poll_timeout)
            .build()
            .map_err(|e| Error::External(format!("telegram client build error: {e}")))?;

        Ok(Self {
            bot: Bot::with_client(cfg.telegram_bot_token.clone(), client),
            channel: cfg.telegram_channel.clone(),
            limit: cfg.telegram_update_limit,
            poll_timeout: cfg.telegram_poll_timeout,
        })
    }

    async fn channel_id(&self) -> Result<ChatId> {
        let chat = self
            .bot
            .get_chat(Recipient::ChannelUsername(format!("@{}", self.channel)))
            .await
            .map_err(|e| Error::Source(format!("cannot resolve channel @{}: {e}", self.channel)))?;
        info!(channel = %self.channel, id = chat.id.0, "resolved channel");
        Ok(ChatId(chat.id.0))
    }

    async fn channel_messages(&self, channel: ChatId) -> Result<Vec<Message>> {
        let updates = self
            .bot
            .get_updates()
            .offset(newest_updates_offset(self.limit))
            .limit(self.limit)
            .timeout(poll_timeout_secs(self.poll_timeout))
            .await
            .map_err(|e| Error::Source(format!("getUpdates failed: {e}")))?;
        debug!(count = updates.len(), "received updates");

        Ok(updates
            .into_iter()
            .filter_map(|update| match update.kind {
                UpdateKind::ChannelPost(msg) if msg.chat.id.0 == channel.0 => Some(msg),
                _ => None,
            })
            .collect())
    }

    async fn resolve_media(&self, msg: &Message) -> Vec<String> {
        let Some(photos) = msg.photo() else {
            return Vec::new();
        };
        match resolve_photo(&self.bot, photos).await {
            Ok(path) => {
                info!(id = msg.id.0, file_path = %path, "resolved photo");
                vec![path]
            }
            Err(e) => {
                warn!(id = msg.id.0, error = %e, "failed to resolve photo");
                Vec::new()
            }
        }
    }
}

/// A negative `getUpdates` offset selects the newest `limit` updates and marks
/// every older update as confirmed, so a backlog can never pin the window.
fn newest_updates_offset(limit: u8) -> i32 {
    -i32::from(limit.max(1))
}

fn poll_timeout_secs(timeout: Duration) -> u32 {
    u32::try_from(timeout.as_secs()).unwrap_or(u32::MAX)
}

/// Look up the largest size of a photo and return its server-side file path.
async fn resolve_photo(bot: &Bot, photos: &[PhotoSize]) -> anyhow::Result<String> {
    let best = photos
        .iter()
        .max_by_key(|p| u64::from(p.width) * u64::from(p.height))
        .ok_or_else(|| anyhow::anyhow!("no photo sizes"))?;
    let file = bot.get_file(best.file.id.clone()).await?;
    Ok(file.path)
}

#[async_trait]
impl MessageSource for TelegramSource {
    async fn fetch_posts(&self, after: Option<MessageId>) -> Result<Vec<ChannelPost>> {
        let channel = self.channel_id().await?;
        let messages = self.channel_messages(channel).await?;

        let mut posts = Vec::with_capacity(messages.len());
        for msg in &messages {
            let mut post = channel_post(msg);
            // Media is only worth a round trip for posts that will be processed.
            if after.map_or(true, |last| post.id > last) {
                post.media = self.resolve_media(msg).await;
            }
            posts.push(post);
        }
        posts.sort_by_key(|p| p.id);
        Ok(posts)
    }
}

/// Text (or caption) and formatting of a channel message. Media is left empty.
pub fn channel_post(msg: &Message) -> ChannelPost {
    let (text, entities) = match msg.text() {
        Some(text) => (text, msg.entities()),
        None => (msg.caption().unwrap_or_default(), msg.caption_entities()),
    };
    ChannelPost {
        id: MessageId(msg.id.0),
        text: text.to_string(),
        spans: entities
            .unwrap_or_default()
            .iter()
            .map(|e| to_span(text, e))
            .collect(),
        media: Vec::new(),
    }
}

fn to_span(text: &str, entity: &MessageEntity) -> FormattingSpan {
    let start = utf16_to_char_index(text, entity.offset);
    let end = utf16_to_char_index(text, entity.offset.saturating_add(entity.length));
    FormattingSpan::new(span_kind(&entity.kind), start, end.saturating_sub(start))
}

/// Telegram counts entity offsets in UTF-16 code units; spans use code points.
///
/// A position inside a surrogate pair rounds up to the next code point. Positions
/// past the end stay past the end by the same number of units.
pub fn utf16_to_char_index(text: &str, units: usize) -> usize {
    let mut seen = 0;
    let mut count = 0;
    for (i, c) in text.chars().enumerate() {
        if seen >= units {
            return i;
        }
        seen += c.len_utf16();
        count = i + 1;
    }
    count + units.saturating_sub(seen)
}

pub fn span_kind(kind: &MessageEntityKind) -> SpanKind {
    match kind {
        MessageEntityKind::Bold => SpanKind::Bold,
        MessageEntityKind::Italic => SpanKind::Italic,
        MessageEntityKind::Underline => SpanKind::Underline,
        MessageEntityKind::Strikethrough => SpanKind::Strikethrough,
        MessageEntityKind::Code => SpanKind::Code,
        MessageEntityKind::Pre { language } => SpanKind::Pre {
            language: language.clone(),
        },
        other => {
            let name = format!("{other:?}");
            let name = name
                .split(|c: char| !c.is_alphanumeric())
                .next()
                .unwrap_or_default()
                .to_string();
            SpanKind::Unsupported(name)
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn channel_message(body: serde_json::Value) -> Message {
        let mut msg = json!({
            "message_id": 42,
            "date": 1_700_000_000,
            "chat": {"id": -1001234567890_i64, "title": "News", "type": "channel", "username": "news"},
            "sender_chat": {"id": -1001234567890_i64, "title": "News", "type": "channel", "username": "news"}
        });
        if let (Some(msg), Some(body)) = (msg.as_object_mut(), body.as_object()) {
            msg.extend(body.clone());
        }
        serde_json::from_value(msg).expect("valid channel post")
    }

    #[test]
    fn updates_window_is_the_newest_batch() {
        assert_eq!(newest_updates_offset(20), -20);
        assert_eq!(newest_updates_offset(100), -100);
        assert_eq!(newest_updates_offset(0), -1);
    }

    #[test]
    fn poll_timeout_saturates() {
        assert_eq!(poll_timeout_secs(Duration::from_secs(10)), 10);
        assert_eq!(poll_timeout_secs(Duration::from_secs(u64::MAX)), u32::MAX);
    }

    #[test]
    fn text_post_uses_text_entities() {
        let msg = channel_message(json!({
            "text": "👋 Hello world",
            "entities": [{"type": "bold", "offset": 3, "length": 5}]
        }));
        let post = channel_post(&msg);
        assert_eq!(post.id, MessageId(42));
        assert_eq!(post.text, "👋 Hello world");
        assert_eq!(post.spans, vec![FormattingSpan::new(SpanKind::Bold, 2, 5)]);
        assert!(post.media.is_empty());
    }

    #[test]
    fn photo_post_falls_back_to_caption() {
        let msg = channel_message(json!({
            "photo": [
                {"file_id": "small", "file_unique_id": "s", "width": 90, "height": 60, "file_size": 1000},
                {"file_id": "large", "file_unique_id": "l", "width": 1280, "height": 853, "file_size": 90000}
            ],
            "caption": "🎉🎉 Launch day",
            "caption_entities": [{"type": "italic", "offset": 5, "length": 6}]
        }));
        let post = channel_post(&msg);
        assert_eq!(post.text, "🎉🎉 Launch day");
        assert_eq!(post.spans, vec![FormattingSpan::new(SpanKind::Italic, 3, 6)]);
        assert!(post.media.is_empty());
    }

    #[test]
    fn ascii_offsets_are_unchanged() {
        assert_eq!(utf16_to_char_index("hello", 0), 0);
        assert_eq!(utf16_to_char_index("hello", 3), 3);
        assert_eq!(utf16_to_char_index("hello", 5), 5);
    }

    #[test]
    fn astral_characters_take_two_units() {
        // "👋" is a surrogate pair.
        let text = "👋 Hi";
        assert_eq!(utf16_to_char_index(text, 2), 1);
        assert_eq!(utf16_to_char_index(text, 3), 2);
        assert_eq!(utf16_to_char_index(text, 5), 4);
        // Inside the pair.
        assert_eq!(utf16_to_char_index(text, 1), 1);
    }

    #[test]
    fn out_of_range_offsets_stay_out_of_range() {
        assert_eq!(utf16_to_char_index("ab", 4), 4);
        assert_eq!(utf16_to_char_index("👋", 3), 2);
    }

    #[test]
    fn entity_is_converted_to_code_point_span() {
        let text = "👋 Hello world";
        let entity = MessageEntity {
            kind: MessageEntityKind::Bold,
            offset: 3,
            length: 5,
        };
        assert_eq!(
            to_span(text, &entity),
            FormattingSpan::new(SpanKind::Bold, 2, 5)
        );
    }

    #[test]
    fn supported_kinds_map_directly() {
        assert_eq!(span_kind(&MessageEntityKind::Bold), SpanKind::Bold);
        assert_eq!(span_kind(&MessageEntityKind::Italic), SpanKind::Italic);
        assert_eq!(span_kind(&MessageEntityKind::Underline), SpanKind::Underline);
        assert_eq!(
            span_kind(&MessageEntityKind::Strikethrough),
            SpanKind::Strikethrough
        );
        assert_eq!(span_kind(&MessageEntityKind::Code), SpanKind::Code);
        assert_eq!(
            span_kind(&MessageEntityKind::Pre {
                language: Some("rust".to_string())
            }),
            SpanKind::Pre {
                language: Some("rust".to_string())
            }
        );
    }

    #[test]
    fn other_kinds_are_unsupported() {
        assert_eq!(
            span_kind(&MessageEntityKind::Hashtag),
            SpanKind::Unsupported("Hashtag".to_string())
        );
        assert_eq!(
            span_kind(&MessageEntityKind::Mention),
            SpanKind::Unsupported("Mention".to_string())
        );
    }
}
