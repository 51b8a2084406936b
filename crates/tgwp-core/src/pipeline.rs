//! One poll-and-publish pass over the channel.

use std::sync::Arc;

use tracing::{error, info};

use crate::{
    config::Config,
    cursor::CursorStore,
    domain::{ChannelPost, MessageId},
    formatting::format_post,
    ports::{ContentPlatform, MessageSource},
    publisher::Publisher,
    tags::TagResolver,
    Result,
};

/// What happened to each fetched post during a run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunReport {
    pub fetched: usize,
    /// Already at or below the cursor.
    pub skipped: usize,
    pub published: usize,
    pub failed: usize,
    /// Nothing left to publish after formatting.
    pub empty: usize,
    pub cursor: Option<MessageId>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Outcome {
    Published,
    Failed,
    Empty,
}

/// Wires the source, formatter, tag resolver, publisher and cursor together.
pub struct Republisher {
    source: Arc<dyn MessageSource>,
    resolver: TagResolver,
    publisher: Publisher,
    cursor: CursorStore,
}

impl Republisher {
    pub fn new(
        cfg: &Config,
        source: Arc<dyn MessageSource>,
        platform: Arc<dyn ContentPlatform>,
    ) -> Self {
        Self {
            source,
            resolver: TagResolver::new(platform.clone()),
            publisher: Publisher::new(platform, cfg.wp_category_id),
            cursor: CursorStore::new(&cfg.cursor_file),
        }
    }

    /// Run a single pass.
    ///
    /// The cursor is advanced as soon as a post is selected, before it is
    /// published, so a failed publish is never retried on the next run.
    /// Errors mean the pass was aborted: the source was unreachable or the
    /// cursor could not be read or written.
    pub async fn run_once(&self) -> Result<RunReport> {
        let mut last = self.cursor.load()?;
        info!(last_message_id = ?last.map(|m| m.0), "loaded cursor");

        let posts = self.source.fetch_posts(last).await?;
        let mut report = RunReport {
            fetched: posts.len(),
            ..RunReport::default()
        };
        info!(count = posts.len(), "fetched channel posts");

        for post in &posts {
            if last.is_some_and(|l| post.id <= l) {
                info!(id = post.id.0, "skipping already processed message");
                report.skipped += 1;
                continue;
            }

            self.cursor.save(post.id)?;
            last = Some(post.id);
            info!(id = post.id.0, "processing new message");

            match self.process(post).await {
                Outcome::Published => report.published += 1,
                Outcome::Failed => report.failed += 1,
                Outcome::Empty => report.empty += 1,
            }
        }

        report.cursor = last;
        Ok(report)
    }

    async fn process(&self, post: &ChannelPost) -> Outcome {
        for location in &post.media {
            info!(id = post.id.0, location = %location, "photo attached");
        }

        let formatted = format_post(&post.text, Some(post.spans.as_slice()));
        if formatted.is_empty() {
            info!(id = post.id.0, "nothing to publish after formatting");
            return Outcome::Empty;
        }
        info!(id = post.id.0, title = %formatted.title, "formatted post");

        let tag_ids = self.resolver.resolve_all(&formatted.tags).await;
        if self
            .publisher
            .publish(&formatted.title, &formatted.body, &tag_ids)
            .await
        {
            Outcome::Published
        } else {
            error!(id = post.id.0, "message handled but not published");
            Outcome::Failed
        }
    }
}
