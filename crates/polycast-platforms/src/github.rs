// SPDX-FileCopyrightText: 2026 Polycast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! GitHub collaborator: issues, pull requests and releases as content.
//!
//! Post ids have the form `owner/repo#number`. Posts go to the repository in
//! the `repository` setting unless the content's `repository` metadata names
//! another. The content's `type` metadata selects what gets created:
//! `issue` (default), `pull_request` (needs `head` and `title`) or `release`
//! (needs `tag` and `title`).

use std::sync::Arc;

use async_trait::async_trait;
use polycast_config::AdapterConfig;
use polycast_core::{
    ActionResult, CapabilityDescriptor, ContentItem, ContentMetrics, ContentType, EventSink,
    PlatformHooks, PlatformType, PolycastError, SearchOptions, UserProfile,
};
use reqwest::Method;
use serde_json::{Value, json};
use tracing::debug;

use crate::http::{Auth, Body, RestClient, str_field, u64_field};
use crate::poll::{Inbound, Poller, poll_interval};
use crate::{Identity, content_types, credential, malformed, metadata_str, require_credentials};

pub const BASE_URL: &str = "https://api.github.com";

const TITLE_LENGTH: usize = 80;

pub fn capabilities() -> CapabilityDescriptor {
    CapabilityDescriptor {
        can_post: true,
        can_comment: true,
        can_share: false,
        can_delete: true,
        can_edit: true,
        can_like: true,
        can_follow: true,
        can_message: false,
        can_mention: true,
        supports_webhooks: true,
        supports_analytics: true,
        supports_scheduling: false,
        supports_polls: false,
        content_types: content_types(&[ContentType::Text, ContentType::Document]),
        max_content_length: 65_536,
        max_media_size: None,
    }
}

pub struct GithubHooks {
    config: AdapterConfig,
    client: Arc<RestClient>,
    login: Identity,
    poller: Poller,
}

/// `owner/repo#123`, `owner/repo/issues/123` or `owner/repo/pull/123`.
fn parse_post_id(post_id: &str) -> Result<(&str, &str), PolycastError> {
    let split = post_id
        .rsplit_once('#')
        .or_else(|| post_id.rsplit_once("/issues/"))
        .or_else(|| post_id.rsplit_once("/pull/"));
    match split {
        Some((repo, number))
            if repo.contains('/') && !number.is_empty() && number.bytes().all(|b| b.is_ascii_digit()) =>
        {
            Ok((repo, number))
        }
        _ => Err(PolycastError::Validation(format!(
            "invalid GitHub post id `{post_id}`, expected owner/repo#number"
        ))),
    }
}

/// First line of the body, shortened to a title.
fn derive_title(body: &str) -> String {
    let line = body.lines().next().unwrap_or_default().trim();
    if line.chars().count() <= TITLE_LENGTH {
        line.to_string()
    } else {
        let cut: String = line.chars().take(TITLE_LENGTH - 3).collect();
        format!("{cut}...")
    }
}

fn issue_to_item(issue: &Value) -> ContentItem {
    let mut item = ContentItem::text(issue["body"].as_str().unwrap_or_default());
    item.id = repo_of(issue)
        .zip(str_field(issue, "/number"))
        .map(|(repo, number)| format!("{repo}#{number}"));
    item.url = str_field(issue, "/html_url");
    item.author = str_field(issue, "/user/login");
    item.created_at = issue["created_at"].as_str().and_then(|s| s.parse().ok());
    if let Some(title) = issue["title"].as_str() {
        item.metadata.insert("title".to_string(), json!(title));
    }
    item.tags = issue["labels"]
        .as_array()
        .map(|labels| {
            labels
                .iter()
                .filter_map(|l| l["name"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();
    item.metrics = Some(issue_metrics(issue));
    item
}

/// `owner/repo` from an issue's `repository_url`.
fn repo_of(issue: &Value) -> Option<String> {
    let url = issue["repository_url"].as_str()?;
    let mut parts = url.rsplit('/');
    let repo = parts.next()?;
    let owner = parts.next()?;
    Some(format!("{owner}/{repo}"))
}

fn issue_metrics(issue: &Value) -> ContentMetrics {
    ContentMetrics {
        likes: u64_field(issue, "/reactions/+1"),
        comments: u64_field(issue, "/comments"),
        shares: None,
        views: None,
        clicks: None,
        impressions: u64_field(issue, "/reactions/total_count"),
    }
}

impl GithubHooks {
    pub fn new(config: &AdapterConfig) -> Result<Self, PolycastError> {
        let client = RestClient::new(
            PlatformType::Github,
            BASE_URL,
            config,
            Auth::Bearer(credential(config, "token")),
            &[
                ("accept", "application/vnd.github+json"),
                ("x-github-api-version", "2022-11-28"),
            ],
        )?;
        Ok(Self {
            config: config.clone(),
            client: Arc::new(client),
            login: Identity::default(),
            poller: Poller::new(),
        })
    }

    async fn login(&self) -> Result<String, PolycastError> {
        if let Some(login) = self.login.get() {
            return Ok(login);
        }
        let user = self.client.get("/user", &[]).await?;
        let login =
            str_field(&user, "/login").ok_or_else(|| malformed(PlatformType::Github, "login"))?;
        self.login.set(login.clone());
        Ok(login)
    }

    fn repository<'a>(&'a self, content: &'a ContentItem) -> Result<&'a str, PolycastError> {
        metadata_str(content, "repository")
            .or_else(|| self.config.setting_str("repository"))
            .ok_or_else(|| {
                PolycastError::Validation(
                    "no target repository: set the `repository` setting or metadata".to_string(),
                )
            })
    }

    fn created(response: &Value, repo: &str) -> Result<ActionResult, PolycastError> {
        let url = str_field(response, "/html_url");
        let id = match str_field(response, "/number") {
            Some(number) => format!("{repo}#{number}"),
            None => str_field(response, "/id").ok_or_else(|| malformed(PlatformType::Github, "id"))?,
        };
        Ok(ActionResult::success(json!({ "id": id, "url": url })))
    }
}

#[async_trait]
impl PlatformHooks for GithubHooks {
    fn platform(&self) -> PlatformType {
        PlatformType::Github
    }

    fn capabilities(&self) -> CapabilityDescriptor {
        capabilities()
    }

    async fn do_initialize(&self) -> Result<(), PolycastError> {
        require_credentials(PlatformType::Github, &self.config)
    }

    async fn do_authenticate(&self) -> Result<bool, PolycastError> {
        match self.login().await {
            Ok(login) => {
                debug!(%login, "github token accepted");
                Ok(true)
            }
            Err(err) if !err.is_transient() => Ok(false),
            Err(err) => Err(err),
        }
    }

    async fn do_disconnect(&self) -> Result<(), PolycastError> {
        self.poller.stop().await;
        self.login.clear();
        Ok(())
    }

    async fn do_post(&self, content: &ContentItem) -> Result<ActionResult, PolycastError> {
        let repo = self.repository(content)?;
        let title = metadata_str(content, "title")
            .map(str::to_string)
            .unwrap_or_else(|| derive_title(&content.body));

        let response = match metadata_str(content, "type").unwrap_or("issue") {
            "pull_request" => {
                let body = json!({
                    "title": title,
                    "head": metadata_str(content, "head").unwrap_or_default(),
                    "base": metadata_str(content, "base").unwrap_or("main"),
                    "body": content.body,
                });
                self.client.post_json(&format!("/repos/{repo}/pulls"), &body).await?
            }
            "release" => {
                let body = json!({
                    "tag_name": metadata_str(content, "tag").unwrap_or_default(),
                    "name": title,
                    "body": content.body,
                });
                let response = self
                    .client
                    .post_json(&format!("/repos/{repo}/releases"), &body)
                    .await?;
                return Ok(ActionResult::success(json!({
                    "id": str_field(&response, "/id"),
                    "url": str_field(&response, "/html_url"),
                })));
            }
            _ => {
                let body = json!({
                    "title": title,
                    "body": content.body,
                    "labels": content.tags,
                });
                self.client.post_json(&format!("/repos/{repo}/issues"), &body).await?
            }
        };
        Self::created(&response, repo)
    }

    async fn do_comment(&self, post_id: &str, text: &str) -> Result<ActionResult, PolycastError> {
        let (repo, number) = parse_post_id(post_id)?;
        let response = self
            .client
            .post_json(
                &format!("/repos/{repo}/issues/{number}/comments"),
                &json!({ "body": text }),
            )
            .await?;
        Ok(ActionResult::success(json!({
            "id": str_field(&response, "/id"),
            "url": str_field(&response, "/html_url"),
        })))
    }

    /// Issues cannot be deleted over the API; closing is the closest action.
    async fn do_delete(&self, post_id: &str) -> Result<ActionResult, PolycastError> {
        let (repo, number) = parse_post_id(post_id)?;
        self.client
            .send(
                Method::PATCH,
                &format!("/repos/{repo}/issues/{number}"),
                &[],
                Body::Json(&json!({ "state": "closed" })),
            )
            .await?;
        Ok(ActionResult::success(json!({ "id": post_id, "state": "closed" })))
    }

    async fn do_like(&self, post_id: &str) -> Result<ActionResult, PolycastError> {
        let (repo, number) = parse_post_id(post_id)?;
        let response = self
            .client
            .post_json(
                &format!("/repos/{repo}/issues/{number}/reactions"),
                &json!({ "content": "+1" }),
            )
            .await?;
        Ok(ActionResult::success(json!({
            "id": post_id,
            "reaction_id": str_field(&response, "/id"),
        })))
    }

    async fn do_unlike(&self, post_id: &str) -> Result<ActionResult, PolycastError> {
        let (repo, number) = parse_post_id(post_id)?;
        let login = self.login().await?;
        let reactions = self
            .client
            .get(
                &format!("/repos/{repo}/issues/{number}/reactions"),
                &[("content", "+1".to_string())],
            )
            .await?;
        let own = reactions.as_array().and_then(|list| {
            list.iter()
                .find(|r| r["user"]["login"].as_str() == Some(login.as_str()))
                .and_then(|r| str_field(r, "/id"))
        });
        let Some(reaction_id) = own else {
            return Ok(ActionResult::failure(format!("no reaction of {login} on {post_id}")));
        };
        self.client
            .delete(&format!("/repos/{repo}/issues/{number}/reactions/{reaction_id}"))
            .await?;
        Ok(ActionResult::success(json!({ "id": post_id })))
    }

    async fn do_follow(&self, user_id: &str) -> Result<ActionResult, PolycastError> {
        self.client
            .send(Method::PUT, &format!("/user/following/{user_id}"), &[], Body::Empty)
            .await?;
        Ok(ActionResult::success(json!({ "id": user_id })))
    }

    async fn do_unfollow(&self, user_id: &str) -> Result<ActionResult, PolycastError> {
        self.client.delete(&format!("/user/following/{user_id}")).await?;
        Ok(ActionResult::success(json!({ "id": user_id })))
    }

    async fn get_profile(&self, user_id: Option<&str>) -> Result<UserProfile, PolycastError> {
        let path = match user_id {
            Some(login) => format!("/users/{login}"),
            None => "/user".to_string(),
        };
        let user = self.client.get(&path, &[]).await?;
        Ok(UserProfile {
            id: str_field(&user, "/id").ok_or_else(|| malformed(PlatformType::Github, "id"))?,
            username: str_field(&user, "/login").unwrap_or_default(),
            display_name: str_field(&user, "/name"),
            bio: str_field(&user, "/bio"),
            avatar_url: str_field(&user, "/avatar_url"),
            url: str_field(&user, "/html_url"),
            followers: u64_field(&user, "/followers"),
            following: u64_field(&user, "/following"),
            verified: false,
        })
    }

    async fn get_content(&self, post_id: &str) -> Result<ContentItem, PolycastError> {
        let (repo, number) = parse_post_id(post_id)?;
        let issue = self
            .client
            .get(&format!("/repos/{repo}/issues/{number}"), &[])
            .await?;
        Ok(issue_to_item(&issue))
    }

    async fn search(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<Vec<ContentItem>, PolycastError> {
        let mut params = vec![("q", query.to_string())];
        if let Some(limit) = options.limit {
            params.push(("per_page", limit.min(100).to_string()));
        }
        if let Some(sort) = &options.sort {
            params.push(("sort", sort.clone()));
        }
        let response = self.client.get("/search/issues", &params).await?;
        Ok(response["items"]
            .as_array()
            .map(|items| items.iter().map(issue_to_item).collect())
            .unwrap_or_default())
    }

    async fn get_analytics(&self, post_id: &str) -> Result<ContentMetrics, PolycastError> {
        let (repo, number) = parse_post_id(post_id)?;
        let issue = self
            .client
            .get(&format!("/repos/{repo}/issues/{number}"), &[])
            .await?;
        Ok(issue_metrics(&issue))
    }

    async fn setup_webhook(&self, url: &str, events: &[String]) -> Result<bool, PolycastError> {
        let repo = self.config.setting_str("repository").ok_or_else(|| {
            PolycastError::Validation("webhooks need the `repository` setting".to_string())
        })?;
        let events: Vec<&str> = if events.is_empty() {
            vec!["push", "issues", "issue_comment", "pull_request"]
        } else {
            events.iter().map(String::as_str).collect()
        };
        let response = self
            .client
            .post_json(
                &format!("/repos/{repo}/hooks"),
                &json!({
                    "name": "web",
                    "active": true,
                    "events": events,
                    "config": { "url": url, "content_type": "json" },
                }),
            )
            .await?;
        Ok(response["active"].as_bool().unwrap_or(true))
    }

    async fn remove_webhook(&self, webhook_id: &str) -> Result<bool, PolycastError> {
        let repo = self.config.setting_str("repository").ok_or_else(|| {
            PolycastError::Validation("webhooks need the `repository` setting".to_string())
        })?;
        self.client
            .delete(&format!("/repos/{repo}/hooks/{webhook_id}"))
            .await?;
        Ok(true)
    }

    /// Polls notifications; `mention` reasons are reported as mentions.
    async fn do_start_monitoring(&self, sink: EventSink) -> Result<(), PolycastError> {
        let client = Arc::clone(&self.client);
        self.poller.start(poll_interval(&self.config), sink, move || {
            let client = Arc::clone(&client);
            async move {
                let response = client.get("/notifications", &[]).await?;
                Ok(response
                    .as_array()
                    .map(|threads| threads.iter().filter_map(notification_to_inbound).collect())
                    .unwrap_or_default())
            }
        });
        Ok(())
    }

    async fn do_stop_monitoring(&self) -> Result<(), PolycastError> {
        self.poller.stop().await;
        Ok(())
    }

    async fn do_validate_content(&self, content: &ContentItem) -> Result<bool, PolycastError> {
        let has = |key| metadata_str(content, key).is_some_and(|v| !v.trim().is_empty());
        Ok(match metadata_str(content, "type") {
            Some("pull_request") => has("head") && has("title"),
            Some("release") => has("tag") && has("title"),
            _ => true,
        })
    }
}

fn notification_to_inbound(thread: &Value) -> Option<Inbound> {
    let mut item = ContentItem::text(thread["subject"]["title"].as_str().unwrap_or_default());
    item.id = Some(str_field(thread, "/id")?);
    item.url = str_field(thread, "/subject/url");
    item.author = str_field(thread, "/repository/full_name");
    item.created_at = thread["updated_at"].as_str().and_then(|s| s.parse().ok());
    match thread["reason"].as_str() {
        Some("mention" | "team_mention") => Some(Inbound::Mention(item)),
        Some(_) => Some(Inbound::Message(item)),
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polycast_config::AuthKind;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn hooks(server: &MockServer) -> GithubHooks {
        let config = AdapterConfig::new(PlatformType::Github, "gh", AuthKind::Bearer)
            .with_credential("token", "ghp_test")
            .with_setting("repository", json!("octo/demo"))
            .with_setting("base_url", json!(server.uri()));
        GithubHooks::new(&config).unwrap()
    }

    #[test]
    fn parses_post_id_forms() {
        assert_eq!(parse_post_id("octo/demo#12").unwrap(), ("octo/demo", "12"));
        assert_eq!(parse_post_id("octo/demo/issues/3").unwrap(), ("octo/demo", "3"));
        assert_eq!(parse_post_id("octo/demo/pull/9").unwrap(), ("octo/demo", "9"));
        assert!(parse_post_id("demo#1").is_err());
        assert!(parse_post_id("octo/demo#x").is_err());
    }

    #[test]
    fn title_is_first_line_shortened() {
        assert_eq!(derive_title("Bug report\nmore text"), "Bug report");
        let long = "a".repeat(100);
        assert_eq!(derive_title(&long).chars().count(), TITLE_LENGTH);
    }

    #[tokio::test]
    async fn post_creates_issue_with_labels() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/repos/octo/demo/issues"))
            .and(header("authorization", "Bearer ghp_test"))
            .and(body_json(json!({
                "title": "Crash on start",
                "body": "Crash on start\nstack trace",
                "labels": ["bug"],
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "number": 17,
                "html_url": "https://github.com/octo/demo/issues/17"
            })))
            .mount(&server)
            .await;

        let item = ContentItem::text("Crash on start\nstack trace").with_tags(["bug"]);
        let result = hooks(&server).do_post(&item).await.unwrap();
        assert_eq!(result.data().unwrap()["id"], "octo/demo#17");
    }

    #[tokio::test]
    async fn pull_request_needs_head_and_title() {
        let server = MockServer::start().await;
        let hooks = hooks(&server);
        let incomplete = ContentItem::text("adds a thing")
            .with_metadata("type", json!("pull_request"))
            .with_metadata("title", json!("Add thing"));
        assert!(!hooks.do_validate_content(&incomplete).await.unwrap());

        let complete = incomplete.with_metadata("head", json!("feature/thing"));
        assert!(hooks.do_validate_content(&complete).await.unwrap());
    }

    #[tokio::test]
    async fn comment_targets_issue() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/repos/octo/demo/issues/5/comments"))
            .and(body_json(json!({"body": "+1 from me"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 99})))
            .mount(&server)
            .await;

        let result = hooks(&server).do_comment("octo/demo#5", "+1 from me").await.unwrap();
        assert_eq!(result.data().unwrap()["id"], "99");
    }

    #[tokio::test]
    async fn unlike_removes_own_reaction() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/user"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1, "login": "me"})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/octo/demo/issues/5/reactions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 10, "user": {"login": "other"}},
                {"id": 11, "user": {"login": "me"}}
            ])))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/repos/octo/demo/issues/5/reactions/11"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        assert!(hooks(&server).do_unlike("octo/demo#5").await.unwrap().is_success());
    }

    #[tokio::test]
    async fn analytics_reads_reactions_and_comments() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/octo/demo/issues/5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "number": 5,
                "comments": 4,
                "reactions": {"total_count": 7, "+1": 5}
            })))
            .mount(&server)
            .await;

        let metrics = hooks(&server).get_analytics("octo/demo#5").await.unwrap();
        assert_eq!(metrics.likes, Some(5));
        assert_eq!(metrics.comments, Some(4));
        assert_eq!(metrics.impressions, Some(7));
    }

    #[test]
    fn notifications_map_by_reason() {
        let mention = json!({"id": "1", "reason": "mention", "subject": {"title": "ping"}});
        assert!(matches!(notification_to_inbound(&mention), Some(Inbound::Mention(_))));
        let other = json!({"id": "2", "reason": "subscribed", "subject": {"title": "x"}});
        assert!(matches!(notification_to_inbound(&other), Some(Inbound::Message(_))));
    }
}
