use serde::{Deserialize, Serialize};

/// Telegram chat id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

/// Telegram message id (numeric, monotonic per channel).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub i32);

/// WordPress tag id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagId(pub u64);

/// Inline formatting carried alongside the raw post text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SpanKind {
    Bold,
    Italic,
    Underline,
    Strikethrough,
    Code,
    Pre { language: Option<String> },
    /// Anything the formatter does not render (links, mentions, ...).
    Unsupported(String),
}

/// A `(kind, offset, length)` annotation over a post's text.
///
/// Offsets and lengths are counted in Unicode code points.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormattingSpan {
    pub kind: SpanKind,
    pub offset: usize,
    pub length: usize,
}

impl FormattingSpan {
    pub fn new(kind: SpanKind, offset: usize, length: usize) -> Self {
        Self {
            kind,
            offset,
            length,
        }
    }

    pub fn end(&self) -> usize {
        self.offset.saturating_add(self.length)
    }
}

/// A channel post as read from the message source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChannelPost {
    pub id: MessageId,
    /// Message text, or the caption for media posts.
    pub text: String,
    pub spans: Vec<FormattingSpan>,
    /// Resolved locations of attached photos (largest size only).
    pub media: Vec<String>,
}

impl ChannelPost {
    pub fn text(id: i32, text: impl Into<String>) -> Self {
        Self {
            id: MessageId(id),
            text: text.into(),
            spans: Vec::new(),
            media: Vec::new(),
        }
    }
}

/// A tag as known by the content platform.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct RemoteTag {
    pub id: TagId,
    pub name: String,
}

/// Body of a post-creation request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PostDraft {
    pub title: String,
    pub content: String,
    pub status: &'static str,
    pub format: &'static str,
    pub categories: Vec<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<TagId>,
}

/// What the platform hands back for a created post.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct CreatedPost {
    pub id: u64,
    #[serde(default)]
    pub link: Option<String>,
}
