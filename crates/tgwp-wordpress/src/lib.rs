//! WordPress adapter (REST API v2).
//!
//! Implements the `tgwp-core` ContentPlatform port over `wp-json/wp/v2` with
//! HTTP Basic authentication (application passwords).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use tracing::{debug, warn};

use tgwp_core::{
    config::Config,
    domain::{CreatedPost, PostDraft, RemoteTag},
    errors::Error,
    ports::ContentPlatform,
    Result,
};

/// Strip the quote characters an `.env` file may have left around a credential.
pub fn clean_password(raw: &str) -> String {
    raw.trim_matches('\'').trim_matches('"').to_string()
}

#[derive(Clone, Debug)]
pub struct WordPressClient {
    base_url: String,
    username: String,
    password: String,
    http: reqwest::Client,
}

impl WordPressClient {
    pub fn new(cfg: &Config) -> Result<Self> {
        Self::with_credentials(
            &cfg.wp_url,
            &cfg.wp_username,
            &cfg.wp_password,
            cfg.http_timeout,
        )
    }

    pub fn with_credentials(
        base_url: &str,
        username: &str,
        password: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::External(format!("http client build error: {e}")))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            username: username.to_string(),
            password: clean_password(password),
            http,
        })
    }

    fn endpoint(&self, resource: &str) -> String {
        format!("{}/wp-json/wp/v2/{resource}", self.base_url)
    }

    fn authed(&self, req: RequestBuilder) -> RequestBuilder {
        req.basic_auth(&self.username, Some(&self.password))
    }

    async fn send(&self, req: RequestBuilder, what: &str) -> Result<Response> {
        self.authed(req)
            .send()
            .await
            .map_err(|e| Error::Platform(format!("wordpress {what} request error: {e}")))
    }
}

async fn unexpected(resp: Response, what: &str) -> Error {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    Error::Platform(format!(
        "wordpress {what} failed: {status} {}",
        body.chars().take(200).collect::<String>()
    ))
}

async fn json<T: serde::de::DeserializeOwned>(resp: Response, what: &str) -> Result<T> {
    resp.json()
        .await
        .map_err(|e| Error::Platform(format!("wordpress {what} json error: {e}")))
}

#[async_trait]
impl ContentPlatform for WordPressClient {
    async fn search_tags(&self, query: &str) -> Result<Vec<RemoteTag>> {
        let req = self
            .http
            .get(self.endpoint("tags"))
            .query(&[("search", query)]);
        let resp = self.send(req, "tag search").await?;
        if resp.status() != StatusCode::OK {
            return Err(unexpected(resp, "tag search").await);
        }
        let tags: Vec<RemoteTag> = json(resp, "tag search").await?;
        debug!(query, found = tags.len(), "tag search");
        Ok(tags)
    }

    async fn create_tag(&self, name: &str) -> Result<RemoteTag> {
        let req = self
            .http
            .post(self.endpoint("tags"))
            .json(&serde_json::json!({ "name": name }));
        let resp = self.send(req, "tag create").await?;
        if resp.status() != StatusCode::CREATED {
            return Err(unexpected(resp, "tag create").await);
        }
        json(resp, "tag create").await
    }

    async fn create_post(&self, draft: &PostDraft) -> Result<CreatedPost> {
        let req = self.http.post(self.endpoint("posts")).json(draft);
        let resp = self.send(req, "post create").await?;
        if resp.status() != StatusCode::CREATED {
            return Err(unexpected(resp, "post create").await);
        }
        // 201 means the post exists; an odd response body does not undo that.
        match json(resp, "post create").await {
            Ok(created) => Ok(created),
            Err(e) => {
                warn!(error = %e, "post created but response could not be decoded");
                Ok(CreatedPost { id: 0, link: None })
            }
        }
    }
}
