//! In-memory fakes for the ports.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::{
    domain::{ChannelPost, CreatedPost, MessageId, PostDraft, RemoteTag, TagId},
    errors::Error,
    ports::{ContentPlatform, MessageSource},
    Result,
};

#[derive(Default)]
pub(crate) struct FakePlatform {
    pub tags: Mutex<Vec<RemoteTag>>,
    pub posts: Mutex<Vec<PostDraft>>,
    pub fail_search: bool,
    pub fail_create_tag: bool,
    pub fail_post: bool,
}

impl FakePlatform {
    pub fn with_tags(tags: &[(u64, &str)]) -> Self {
        Self {
            tags: Mutex::new(
                tags.iter()
                    .map(|(id, name)| RemoteTag {
                        id: TagId(*id),
                        name: name.to_string(),
                    })
                    .collect(),
            ),
            ..Self::default()
        }
    }

    pub fn posts(&self) -> Vec<PostDraft> {
        self.posts.lock().unwrap().clone()
    }

    pub fn tag_names(&self) -> Vec<String> {
        self.tags
            .lock()
            .unwrap()
            .iter()
            .map(|t| t.name.clone())
            .collect()
    }
}

#[async_trait]
impl ContentPlatform for FakePlatform {
    async fn search_tags(&self, query: &str) -> Result<Vec<RemoteTag>> {
        if self.fail_search {
            return Err(Error::Platform("search unavailable".to_string()));
        }
        // WordPress search is a fuzzy "contains" match.
        let q = query.to_lowercase();
        Ok(self
            .tags
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.name.to_lowercase().contains(&q))
            .cloned()
            .collect())
    }

    async fn create_tag(&self, name: &str) -> Result<RemoteTag> {
        if self.fail_create_tag {
            return Err(Error::Platform("tag create rejected".to_string()));
        }
        let mut tags = self.tags.lock().unwrap();
        let tag = RemoteTag {
            id: TagId(100 + tags.len() as u64),
            name: name.to_string(),
        };
        tags.push(tag.clone());
        Ok(tag)
    }

    async fn create_post(&self, draft: &PostDraft) -> Result<CreatedPost> {
        self.posts.lock().unwrap().push(draft.clone());
        if self.fail_post {
            return Err(Error::Platform("500 Internal Server Error".to_string()));
        }
        Ok(CreatedPost {
            id: self.posts.lock().unwrap().len() as u64,
            link: None,
        })
    }
}

/// Serves a fixed batch of posts; `None` simulates an unreachable source.
pub(crate) struct FakeSource {
    pub posts: Option<Vec<ChannelPost>>,
    pub calls: Mutex<Vec<Option<MessageId>>>,
}

impl FakeSource {
    pub fn new(posts: Vec<ChannelPost>) -> Self {
        Self {
            posts: Some(posts),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn unreachable() -> Self {
        Self {
            posts: None,
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl MessageSource for FakeSource {
    async fn fetch_posts(&self, after: Option<MessageId>) -> Result<Vec<ChannelPost>> {
        self.calls.lock().unwrap().push(after);
        self.posts
            .clone()
            .ok_or_else(|| Error::Source("chat not found".to_string()))
    }
}
