use std::sync::{Arc, OnceLock};

use regex::Regex;
use tracing::{info, warn};

use crate::{domain::TagId, ports::ContentPlatform};

fn unsafe_tag_chars_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\w\s-]").expect("valid regex"))
}

/// Keep word characters, whitespace and `-`, trimmed.
pub fn clean_tag_name(name: &str) -> String {
    unsafe_tag_chars_re()
        .replace_all(name, "")
        .trim()
        .to_string()
}

/// Maps hashtag labels to platform tag ids, creating missing tags.
///
/// Failures never propagate: an unresolved tag is logged and left off the post.
#[derive(Clone)]
pub struct TagResolver {
    platform: Arc<dyn ContentPlatform>,
}

impl TagResolver {
    pub fn new(platform: Arc<dyn ContentPlatform>) -> Self {
        Self { platform }
    }

    pub async fn resolve(&self, name: &str) -> Option<TagId> {
        let clean = clean_tag_name(name);
        if clean.is_empty() {
            warn!(tag = name, "tag name is empty after cleaning, skipping");
            return None;
        }

        let found = match self.platform.search_tags(&clean).await {
            Ok(found) => found,
            Err(e) => {
                warn!(tag = %clean, error = %e, "tag search failed");
                return None;
            }
        };

        let wanted = clean.to_lowercase();
        if let Some(tag) = found.iter().find(|t| t.name.to_lowercase() == wanted) {
            info!(tag = %clean, id = tag.id.0, "found existing tag");
            return Some(tag.id);
        }

        match self.platform.create_tag(&clean).await {
            Ok(tag) => {
                info!(tag = %clean, id = tag.id.0, "created new tag");
                Some(tag.id)
            }
            Err(e) => {
                warn!(tag = %clean, error = %e, "failed to create tag");
                None
            }
        }
    }

    /// Resolve labels in order, dropping failures and duplicate ids.
    pub async fn resolve_all(&self, names: &[String]) -> Vec<TagId> {
        let mut ids = Vec::with_capacity(names.len());
        for name in names {
            if let Some(id) = self.resolve(name).await {
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
        }
        ids
    }
}
