// SPDX-FileCopyrightText: 2026 Polycast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reddit collaborator for script apps.
//!
//! `do_initialize` exchanges the account's username and password for a bearer
//! token (the password grant), so credentials are verified up front. Posts and
//! comments are addressed by fullname (`t3_...`, `t1_...`).

use std::sync::Arc;

use async_trait::async_trait;
use polycast_config::AdapterConfig;
use polycast_core::{
    ActionResult, CapabilityDescriptor, ContentItem, ContentMetrics, ContentType, EventSink,
    PlatformHooks, PlatformType, PolycastError, SearchOptions, UserProfile,
};
use reqwest::Method;
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::http::{Auth, Body, RestClient, str_field, u64_field};
use crate::poll::{Inbound, Poller, poll_interval};
use crate::{
    Identity, content_types, credential, is_reply, malformed, metadata_str, require_credentials,
};

pub const BASE_URL: &str = "https://oauth.reddit.com";

const AUTH_BASE_URL: &str = "https://www.reddit.com";
const MAX_LENGTH: usize = 40_000;
const MAX_TITLE: usize = 300;

pub fn capabilities() -> CapabilityDescriptor {
    CapabilityDescriptor {
        can_post: true,
        can_comment: true,
        can_share: false,
        can_delete: true,
        can_edit: true,
        can_like: true,
        can_follow: false,
        can_message: false,
        can_mention: true,
        supports_webhooks: false,
        supports_analytics: true,
        supports_scheduling: false,
        supports_polls: true,
        content_types: content_types(&[
            ContentType::Text,
            ContentType::Link,
            ContentType::Image,
            ContentType::Video,
        ]),
        max_content_length: MAX_LENGTH,
        max_media_size: Some(20 * 1024 * 1024),
    }
}

/// Prefix a bare id with `t3_`; fullnames pass through.
fn fullname(post_id: &str) -> String {
    if post_id.len() > 3 && post_id.as_bytes()[0] == b't' && post_id.as_bytes()[2] == b'_' {
        post_id.to_string()
    } else {
        format!("t3_{post_id}")
    }
}

/// Reddit's JSON API reports failures inside `json.errors` with HTTP 200.
fn api_errors(response: &Value) -> Option<String> {
    let errors = response.pointer("/json/errors")?.as_array()?;
    let first = errors.first()?.as_array()?;
    Some(
        first
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(": "),
    )
}

fn thing_to_item(thing: &Value) -> ContentItem {
    let data = &thing["data"];
    let body = data["selftext"]
        .as_str()
        .or_else(|| data["body"].as_str())
        .unwrap_or_default();
    let mut item = ContentItem::text(body);
    item.id = str_field(data, "/name");
    item.author = str_field(data, "/author");
    item.url = str_field(data, "/permalink").map(|p| format!("https://www.reddit.com{p}"));
    item.created_at = data["created_utc"]
        .as_f64()
        .and_then(|secs| chrono::DateTime::from_timestamp(secs as i64, 0));
    if let Some(title) = data["title"].as_str() {
        item.metadata.insert("title".to_string(), json!(title));
    }
    if let Some(subreddit) = data["subreddit"].as_str() {
        item.metadata.insert("subreddit".to_string(), json!(subreddit));
    }
    item.metrics = Some(ContentMetrics {
        likes: u64_field(data, "/ups"),
        comments: u64_field(data, "/num_comments"),
        ..ContentMetrics::default()
    });
    item
}

pub struct RedditHooks {
    config: AdapterConfig,
    client: Arc<RestClient>,
    username: Identity,
    poller: Poller,
}

impl RedditHooks {
    pub fn new(config: &AdapterConfig) -> Result<Self, PolycastError> {
        let user_agent = config
            .setting_str("user_agent")
            .map(str::to_string)
            .unwrap_or_else(|| format!("polycast:{}:v{}", config.name, env!("CARGO_PKG_VERSION")));
        let client = RestClient::new(
            PlatformType::Reddit,
            BASE_URL,
            config,
            Auth::None,
            &[("user-agent", user_agent.as_str())],
        )?;
        Ok(Self {
            config: config.clone(),
            client: Arc::new(client),
            username: Identity::default(),
            poller: Poller::new(),
        })
    }

    fn token_url(&self) -> String {
        let base = self
            .config
            .setting_str("auth_base_url")
            .unwrap_or(AUTH_BASE_URL)
            .trim_end_matches('/');
        format!("{base}/api/v1/access_token")
    }

    /// Exchange the account password for a bearer token.
    async fn fetch_token(&self) -> Result<String, PolycastError> {
        self.client.set_auth(Auth::Basic {
            username: credential(&self.config, "client_id"),
            password: credential(&self.config, "client_secret"),
        });
        let form = [
            ("grant_type", "password".to_string()),
            ("username", credential(&self.config, "username")),
            ("password", credential(&self.config, "password")),
        ];
        let result = self
            .client
            .send(Method::POST, &self.token_url(), &[], Body::Form(&form))
            .await;
        self.client.set_auth(Auth::None);
        let response = result?;
        if let Some(error) = response.body["error"].as_str() {
            return Err(PolycastError::Platform {
                message: format!("reddit token exchange failed: {error}"),
                transient: false,
                source: None,
            });
        }
        str_field(&response.body, "/access_token")
            .ok_or_else(|| malformed(PlatformType::Reddit, "access_token"))
    }

    fn subreddit<'a>(&'a self, content: &'a ContentItem) -> Option<&'a str> {
        metadata_str(content, "subreddit")
            .or_else(|| self.config.setting_str("subreddit"))
            .map(|s| s.trim_start_matches("r/"))
    }

    /// POST a form; the inner `Err` carries Reddit's `json.errors`.
    async fn submit(
        &self,
        path: &str,
        form: &[(&str, String)],
    ) -> Result<Result<Value, String>, PolycastError> {
        let response = self.client.post_form(path, form).await?;
        Ok(match api_errors(&response) {
            Some(error) => Err(error),
            None => Ok(response),
        })
    }

    async fn vote(&self, post_id: &str, dir: &str) -> Result<ActionResult, PolycastError> {
        let id = fullname(post_id);
        self.client
            .post_form("/api/vote", &[("id", id.clone()), ("dir", dir.to_string())])
            .await?;
        Ok(ActionResult::success(json!({ "id": id })))
    }
}

#[async_trait]
impl PlatformHooks for RedditHooks {
    fn platform(&self) -> PlatformType {
        PlatformType::Reddit
    }

    fn capabilities(&self) -> CapabilityDescriptor {
        capabilities()
    }

    async fn do_initialize(&self) -> Result<(), PolycastError> {
        require_credentials(PlatformType::Reddit, &self.config)?;
        let token = self.fetch_token().await?;
        self.client.set_auth(Auth::Bearer(token));
        info!(adapter = %self.config.name, "reddit token acquired");
        Ok(())
    }

    async fn do_authenticate(&self) -> Result<bool, PolycastError> {
        match self.client.get("/api/v1/me", &[]).await {
            Ok(me) => {
                if let Some(name) = str_field(&me, "/name") {
                    self.username.set(name);
                }
                Ok(true)
            }
            Err(err) if !err.is_transient() => {
                debug!(error = %err, "reddit rejected token");
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }

    async fn do_disconnect(&self) -> Result<(), PolycastError> {
        self.poller.stop().await;
        self.username.clear();
        self.client.set_auth(Auth::None);
        Ok(())
    }

    /// Self posts by default; link posts when the content carries a link.
    async fn do_post(&self, content: &ContentItem) -> Result<ActionResult, PolycastError> {
        let subreddit = self.subreddit(content).ok_or_else(|| {
            PolycastError::Validation("reddit posts need a subreddit".to_string())
        })?;
        let title = metadata_str(content, "title").unwrap_or_default();
        let link = content
            .media
            .iter()
            .find(|m| m.media_type == ContentType::Link)
            .map(|m| m.url.clone())
            .or_else(|| metadata_str(content, "url").map(str::to_string));

        let mut form = vec![
            ("api_type", "json".to_string()),
            ("sr", subreddit.to_string()),
            ("title", title.to_string()),
        ];
        match link {
            Some(url) => {
                form.push(("kind", "link".to_string()));
                form.push(("url", url));
            }
            None => {
                form.push(("kind", "self".to_string()));
                form.push(("text", content.body.clone()));
            }
        }
        if let Some(flair) = metadata_str(content, "flair_id") {
            form.push(("flair_id", flair.to_string()));
        }

        match self.submit("/api/submit", &form).await? {
            Ok(response) => {
                let data = &response["json"]["data"];
                Ok(ActionResult::success(json!({
                    "id": data["name"],
                    "url": data["url"],
                })))
            }
            Err(error) => Ok(ActionResult::failure(format!("reddit rejected the post: {error}"))),
        }
    }

    async fn do_comment(&self, post_id: &str, text: &str) -> Result<ActionResult, PolycastError> {
        let form = [
            ("api_type", "json".to_string()),
            ("thing_id", fullname(post_id)),
            ("text", text.to_string()),
        ];
        match self.submit("/api/comment", &form).await? {
            Ok(response) => Ok(ActionResult::success(json!({
                "id": response.pointer("/json/data/things/0/data/name"),
            }))),
            Err(error) => Ok(ActionResult::failure(format!(
                "reddit rejected the comment: {error}"
            ))),
        }
    }

    async fn do_delete(&self, post_id: &str) -> Result<ActionResult, PolycastError> {
        let id = fullname(post_id);
        self.client.post_form("/api/del", &[("id", id.clone())]).await?;
        Ok(ActionResult::success(json!({ "id": id })))
    }

    async fn do_like(&self, post_id: &str) -> Result<ActionResult, PolycastError> {
        self.vote(post_id, "1").await
    }

    async fn do_unlike(&self, post_id: &str) -> Result<ActionResult, PolycastError> {
        self.vote(post_id, "0").await
    }

    async fn get_profile(&self, user_id: Option<&str>) -> Result<UserProfile, PolycastError> {
        let user = match user_id {
            Some(name) => {
                let mut about = self.client.get(&format!("/user/{name}/about"), &[]).await?;
                about.get_mut("data").map(Value::take).unwrap_or_default()
            }
            None => self.client.get("/api/v1/me", &[]).await?,
        };
        let name = str_field(&user, "/name").ok_or_else(|| malformed(PlatformType::Reddit, "name"))?;
        Ok(UserProfile {
            id: str_field(&user, "/id").unwrap_or_else(|| name.clone()),
            url: Some(format!("https://www.reddit.com/user/{name}")),
            bio: str_field(&user, "/subreddit/public_description").filter(|b| !b.is_empty()),
            avatar_url: str_field(&user, "/icon_img"),
            followers: u64_field(&user, "/subreddit/subscribers"),
            verified: user["verified"].as_bool().unwrap_or(false),
            username: name,
            ..UserProfile::default()
        })
    }

    async fn get_content(&self, post_id: &str) -> Result<ContentItem, PolycastError> {
        let id = fullname(post_id);
        let listing = self.client.get("/api/info", &[("id", id.clone())]).await?;
        listing
            .pointer("/data/children/0")
            .map(thing_to_item)
            .ok_or_else(|| PolycastError::platform(format!("reddit post {id} not found")))
    }

    async fn search(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<Vec<ContentItem>, PolycastError> {
        let mut params = vec![("q", query.to_string()), ("type", "link".to_string())];
        if let Some(limit) = options.limit {
            params.push(("limit", limit.min(100).to_string()));
        }
        if let Some(sort) = &options.sort {
            params.push(("sort", sort.clone()));
        }
        let path = match self.config.setting_str("subreddit") {
            Some(sr) => {
                params.push(("restrict_sr", "on".to_string()));
                format!("/r/{}/search", sr.trim_start_matches("r/"))
            }
            None => "/search".to_string(),
        };
        let listing = self.client.get(&path, &params).await?;
        Ok(listing
            .pointer("/data/children")
            .and_then(Value::as_array)
            .map(|children| children.iter().map(thing_to_item).collect())
            .unwrap_or_default())
    }

    async fn get_analytics(&self, post_id: &str) -> Result<ContentMetrics, PolycastError> {
        let item = self.get_content(post_id).await?;
        Ok(item.metrics.unwrap_or_default())
    }

    /// Polls the inbox; `username_mention` items are mentions.
    async fn do_start_monitoring(&self, sink: EventSink) -> Result<(), PolycastError> {
        let client = Arc::clone(&self.client);
        self.poller.start(poll_interval(&self.config), sink, move || {
            let client = Arc::clone(&client);
            async move {
                let listing = client.get("/message/unread", &[]).await?;
                Ok(listing
                    .pointer("/data/children")
                    .and_then(Value::as_array)
                    .map(|children| {
                        children
                            .iter()
                            .map(|child| {
                                let item = thing_to_item(child);
                                if child["data"]["type"] == "username_mention" {
                                    Inbound::Mention(item)
                                } else {
                                    Inbound::Message(item)
                                }
                            })
                            .collect()
                    })
                    .unwrap_or_default())
            }
        });
        Ok(())
    }

    async fn do_stop_monitoring(&self) -> Result<(), PolycastError> {
        self.poller.stop().await;
        Ok(())
    }

    /// Submissions need a title and a subreddit; replies only a body.
    async fn do_validate_content(&self, content: &ContentItem) -> Result<bool, PolycastError> {
        if content.body_len() > MAX_LENGTH {
            return Ok(false);
        }
        if is_reply(content) {
            return Ok(true);
        }
        let title_ok = metadata_str(content, "title")
            .is_some_and(|t| !t.trim().is_empty() && t.chars().count() <= MAX_TITLE);
        Ok(title_ok && self.subreddit(content).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polycast_config::AuthKind;
    use wiremock::matchers::{body_string_contains, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(server: &MockServer) -> AdapterConfig {
        AdapterConfig::new(PlatformType::Reddit, "rd", AuthKind::Oauth2)
            .with_credential("client_id", "id")
            .with_credential("client_secret", "secret")
            .with_credential("username", "poly")
            .with_credential("password", "hunter2")
            .with_setting("subreddit", json!("rust"))
            .with_setting("base_url", json!(server.uri()))
            .with_setting("auth_base_url", json!(server.uri()))
    }

    async fn mount_token(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/api/v1/access_token"))
            .and(header("authorization", "Basic aWQ6c2VjcmV0"))
            .and(body_string_contains("grant_type=password"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"access_token": "tok", "token_type": "bearer"})),
            )
            .mount(server)
            .await;
    }

    #[test]
    fn fullnames_are_prefixed() {
        assert_eq!(fullname("abc123"), "t3_abc123");
        assert_eq!(fullname("t1_xyz"), "t1_xyz");
    }

    #[tokio::test]
    async fn initialize_exchanges_password_for_bearer() {
        let server = MockServer::start().await;
        mount_token(&server).await;
        Mock::given(method("GET"))
            .and(path("/api/v1/me"))
            .and(header("authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "poly"})))
            .mount(&server)
            .await;

        let hooks = RedditHooks::new(&config(&server)).unwrap();
        hooks.do_initialize().await.unwrap();
        assert!(hooks.do_authenticate().await.unwrap());
        assert_eq!(hooks.username.get().as_deref(), Some("poly"));
    }

    #[tokio::test]
    async fn failed_token_exchange_fails_initialize() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/access_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"error": "invalid_grant"})))
            .mount(&server)
            .await;

        let hooks = RedditHooks::new(&config(&server)).unwrap();
        let err = hooks.do_initialize().await.unwrap_err();
        assert!(err.to_string().contains("invalid_grant"));
    }

    #[tokio::test]
    async fn submit_errors_become_failed_results() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/submit"))
            .and(body_string_contains("kind=self"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "json": {"errors": [["SUBREDDIT_NOEXIST", "that subreddit doesn't exist", "sr"]]}
            })))
            .mount(&server)
            .await;

        let hooks = RedditHooks::new(&config(&server)).unwrap();
        let item = ContentItem::text("body").with_metadata("title", json!("Hello"));
        let result = hooks.do_post(&item).await.unwrap();
        assert!(!result.is_success());
        assert!(result.error().unwrap().contains("SUBREDDIT_NOEXIST"));
    }

    #[tokio::test]
    async fn submit_returns_fullname() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/submit"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "json": {"errors": [], "data": {"name": "t3_new", "url": "https://www.reddit.com/r/rust/comments/new/"}}
            })))
            .mount(&server)
            .await;

        let hooks = RedditHooks::new(&config(&server)).unwrap();
        let item = ContentItem::text("body").with_metadata("title", json!("Hello"));
        let result = hooks.do_post(&item).await.unwrap();
        assert_eq!(result.data().unwrap()["id"], "t3_new");
    }

    #[tokio::test]
    async fn submissions_need_a_title() {
        let server = MockServer::start().await;
        let hooks = RedditHooks::new(&config(&server)).unwrap();

        assert!(!hooks.do_validate_content(&ContentItem::text("no title")).await.unwrap());
        let titled = ContentItem::text("body").with_metadata("title", json!("A title"));
        assert!(hooks.do_validate_content(&titled).await.unwrap());
        let long = ContentItem::text("body").with_metadata("title", json!("x".repeat(301)));
        assert!(!hooks.do_validate_content(&long).await.unwrap());
        let reply = ContentItem::text("reply").with_metadata("reply_to", json!("t3_a"));
        assert!(hooks.do_validate_content(&reply).await.unwrap());
    }

    #[tokio::test]
    async fn analytics_read_score_and_comments() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/info"))
            .and(query_param("id", "t3_abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"children": [{"kind": "t3", "data": {
                    "name": "t3_abc", "title": "t", "selftext": "s", "ups": 42, "num_comments": 7
                }}]}
            })))
            .mount(&server)
            .await;

        let hooks = RedditHooks::new(&config(&server)).unwrap();
        let metrics = hooks.get_analytics("abc").await.unwrap();
        assert_eq!(metrics.likes, Some(42));
        assert_eq!(metrics.comments, Some(7));
    }
}
