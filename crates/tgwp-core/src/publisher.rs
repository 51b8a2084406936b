use std::sync::Arc;

use tracing::{error, info};

use crate::{
    domain::{PostDraft, TagId},
    ports::ContentPlatform,
};

/// Submits formatted posts to the platform under a fixed category.
#[derive(Clone)]
pub struct Publisher {
    platform: Arc<dyn ContentPlatform>,
    category_id: u64,
}

impl Publisher {
    pub fn new(platform: Arc<dyn ContentPlatform>, category_id: u64) -> Self {
        Self {
            platform,
            category_id,
        }
    }

    pub fn draft(&self, title: &str, body: &str, tag_ids: &[TagId]) -> PostDraft {
        PostDraft {
            title: title.to_string(),
            content: body.to_string(),
            status: "publish",
            format: "standard",
            categories: vec![self.category_id],
            tags: tag_ids.to_vec(),
        }
    }

    /// Create the post. Returns whether the platform accepted it; never retries.
    pub async fn publish(&self, title: &str, body: &str, tag_ids: &[TagId]) -> bool {
        let draft = self.draft(title, body, tag_ids);
        info!(
            title,
            category = self.category_id,
            tags = ?tag_ids.iter().map(|t| t.0).collect::<Vec<_>>(),
            "publishing post"
        );

        match self.platform.create_post(&draft).await {
            Ok(created) => {
                info!(
                    title,
                    id = created.id,
                    link = created.link.as_deref().unwrap_or(""),
                    "published post"
                );
                true
            }
            Err(e) => {
                error!(title, error = %e, "failed to publish post");
                false
            }
        }
    }
}
