use async_trait::async_trait;

use crate::{
    domain::{ChannelPost, CreatedPost, MessageId, PostDraft, RemoteTag},
    Result,
};

/// Where channel posts come from (Telegram today).
#[async_trait]
pub trait MessageSource: Send + Sync {
    /// Fetch pending channel posts in arrival order.
    ///
    /// `after` is the last processed id; adapters may use it to skip work for
    /// posts that will be filtered out anyway, but callers still re-check it.
    /// Any error here means the source is unreachable for this run.
    async fn fetch_posts(&self, after: Option<MessageId>) -> Result<Vec<ChannelPost>>;
}

/// Hexagonal port for the content platform (WordPress REST API).
#[async_trait]
pub trait ContentPlatform: Send + Sync {
    async fn search_tags(&self, query: &str) -> Result<Vec<RemoteTag>>;
    async fn create_tag(&self, name: &str) -> Result<RemoteTag>;
    async fn create_post(&self, draft: &PostDraft) -> Result<CreatedPost>;
}
