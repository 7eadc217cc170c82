// SPDX-FileCopyrightText: 2026 Polycast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Slack collaborator over the Web API.
//!
//! Slack answers most failures with HTTP 200 and `"ok": false`; [`check`]
//! maps those onto errors. Messages are addressed as `channel:ts`.

use std::sync::Arc;

use async_trait::async_trait;
use polycast_config::AdapterConfig;
use polycast_core::{
    ActionResult, CapabilityDescriptor, ContentItem, ContentMetrics, ContentType, EventSink,
    PlatformHooks, PlatformType, PolycastError, SearchOptions, UserProfile,
};
use serde_json::{Value, json};
use tracing::debug;

use crate::http::{Auth, RestClient, str_field};
use crate::poll::{Inbound, Poller, poll_interval};
use crate::{Identity, content_types, credential, metadata_str, require_credentials};

pub const BASE_URL: &str = "https://slack.com/api";

const MAX_LENGTH: usize = 4000;
const DEFAULT_REACTION: &str = "thumbsup";

/// Slack error codes caused by the request itself; these become failed
/// results rather than errors.
const SOFT_ERRORS: &[&str] = &[
    "message_not_found",
    "channel_not_found",
    "already_reacted",
    "no_reaction",
    "cant_delete_message",
    "msg_too_long",
    "not_in_channel",
    "is_archived",
];

/// Slack error codes that mean the token is unusable.
const AUTH_ERRORS: &[&str] = &["invalid_auth", "not_authed", "account_inactive", "token_revoked"];

pub fn capabilities() -> CapabilityDescriptor {
    CapabilityDescriptor {
        can_post: true,
        can_comment: true,
        can_share: true,
        can_delete: true,
        can_edit: true,
        can_like: true,
        can_follow: false,
        can_message: true,
        can_mention: true,
        supports_webhooks: true,
        supports_analytics: true,
        supports_scheduling: true,
        supports_polls: false,
        content_types: content_types(&[
            ContentType::Text,
            ContentType::Image,
            ContentType::Video,
            ContentType::Document,
        ]),
        max_content_length: MAX_LENGTH,
        max_media_size: Some(1024 * 1024 * 1024),
    }
}

/// `#name`, `@name`, or a conversation id such as `C0123ABCD`.
fn is_channel(channel: &str) -> bool {
    if let Some(name) = channel.strip_prefix('#').or_else(|| channel.strip_prefix('@')) {
        return !name.is_empty() && !name.contains(char::is_whitespace);
    }
    let mut chars = channel.chars();
    matches!(chars.next(), Some('C' | 'D' | 'G'))
        && channel.len() >= 9
        && chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}

fn parse_message_id(post_id: &str) -> Result<(&str, &str), PolycastError> {
    post_id
        .split_once(':')
        .filter(|(channel, ts)| !channel.is_empty() && !ts.is_empty())
        .ok_or_else(|| {
            PolycastError::Validation(format!(
                "invalid Slack message id `{post_id}`, expected channel:ts"
            ))
        })
}

/// Outcome of an `ok: false` reply.
enum Rejection {
    /// The request was understood but refused; report a failed result.
    Soft(String),
    Hard(PolycastError),
}

fn check(response: Value) -> Result<Value, Rejection> {
    if response["ok"].as_bool() == Some(true) {
        return Ok(response);
    }
    let code = response["error"].as_str().unwrap_or("unknown_error").to_string();
    if SOFT_ERRORS.contains(&code.as_str()) {
        return Err(Rejection::Soft(format!("slack rejected the request: {code}")));
    }
    let transient = code == "ratelimited" || code == "internal_error" || code == "service_unavailable";
    Err(Rejection::Hard(PolycastError::Platform {
        message: format!("slack API error: {code}"),
        transient,
        source: None,
    }))
}

fn message_to_item(channel: &str, message: &Value) -> ContentItem {
    let mut item = ContentItem::text(message["text"].as_str().unwrap_or_default());
    item.id = str_field(message, "/ts").map(|ts| format!("{channel}:{ts}"));
    item.author = str_field(message, "/user").or_else(|| str_field(message, "/username"));
    item.url = str_field(message, "/permalink");
    item.created_at = message["ts"]
        .as_str()
        .and_then(|ts| ts.split('.').next())
        .and_then(|secs| secs.parse::<i64>().ok())
        .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0));
    let reactions: u64 = message["reactions"]
        .as_array()
        .map(|list| list.iter().filter_map(|r| r["count"].as_u64()).sum())
        .unwrap_or(0);
    let replies = message["reply_count"].as_u64();
    if reactions > 0 || replies.is_some() {
        item.metrics = Some(ContentMetrics {
            likes: Some(reactions),
            comments: replies,
            ..ContentMetrics::default()
        });
    }
    item
}

pub struct SlackHooks {
    config: AdapterConfig,
    client: Arc<RestClient>,
    user_id: Identity,
    poller: Poller,
}

impl SlackHooks {
    pub fn new(config: &AdapterConfig) -> Result<Self, PolycastError> {
        let client = RestClient::new(
            PlatformType::Slack,
            BASE_URL,
            config,
            Auth::Bearer(credential(config, "token")),
            &[],
        )?;
        Ok(Self {
            config: config.clone(),
            client: Arc::new(client),
            user_id: Identity::default(),
            poller: Poller::new(),
        })
    }

    fn channel<'a>(&'a self, content: Option<&'a ContentItem>) -> Result<&'a str, PolycastError> {
        content
            .and_then(|c| metadata_str(c, "channel"))
            .or_else(|| self.config.setting_str("channel"))
            .ok_or_else(|| {
                PolycastError::Validation(
                    "no target channel: set the `channel` setting or metadata".to_string(),
                )
            })
    }

    fn reaction(&self) -> &str {
        self.config.setting_str("reaction").unwrap_or(DEFAULT_REACTION)
    }

    /// Call a Web API method and unwrap `ok: false` into an error.
    async fn call(&self, method: &str, body: &Value) -> Result<Value, PolycastError> {
        match check(self.client.post_json(&format!("/{method}"), body).await?) {
            Ok(value) => Ok(value),
            Err(Rejection::Soft(message)) => Err(PolycastError::platform(message)),
            Err(Rejection::Hard(err)) => Err(err),
        }
    }

    /// Like [`call`](Self::call) but reports soft rejections as failed
    /// results.
    async fn act(
        &self,
        method: &str,
        body: &Value,
        on_success: impl FnOnce(&Value) -> Value,
    ) -> Result<ActionResult, PolycastError> {
        match check(self.client.post_json(&format!("/{method}"), body).await?) {
            Ok(value) => Ok(ActionResult::success(on_success(&value))),
            Err(Rejection::Soft(message)) => Ok(ActionResult::failure(message)),
            Err(Rejection::Hard(err)) => Err(err),
        }
    }

    async fn query(&self, method: &str, params: &[(&str, String)]) -> Result<Value, PolycastError> {
        match check(self.client.get(&format!("/{method}"), params).await?) {
            Ok(value) => Ok(value),
            Err(Rejection::Soft(message)) => Err(PolycastError::platform(message)),
            Err(Rejection::Hard(err)) => Err(err),
        }
    }
}

fn message_ref(value: &Value) -> Value {
    let channel = value["channel"].as_str().unwrap_or_default();
    let ts = value["ts"].as_str().unwrap_or_default();
    json!({ "id": format!("{channel}:{ts}") })
}

#[async_trait]
impl PlatformHooks for SlackHooks {
    fn platform(&self) -> PlatformType {
        PlatformType::Slack
    }

    fn capabilities(&self) -> CapabilityDescriptor {
        capabilities()
    }

    async fn do_initialize(&self) -> Result<(), PolycastError> {
        require_credentials(PlatformType::Slack, &self.config)
    }

    async fn do_authenticate(&self) -> Result<bool, PolycastError> {
        let response = self.client.post_json("/auth.test", &json!({})).await?;
        if response["ok"].as_bool() == Some(true) {
            if let Some(user) = str_field(&response, "/user_id") {
                self.user_id.set(user);
            }
            return Ok(true);
        }
        let code = response["error"].as_str().unwrap_or_default();
        if AUTH_ERRORS.contains(&code) {
            debug!(code, "slack rejected token");
            return Ok(false);
        }
        match check(response) {
            Err(Rejection::Hard(err)) => Err(err),
            _ => Ok(false),
        }
    }

    async fn do_disconnect(&self) -> Result<(), PolycastError> {
        self.poller.stop().await;
        self.user_id.clear();
        Ok(())
    }

    /// `post_at` metadata (unix seconds) schedules the message instead.
    async fn do_post(&self, content: &ContentItem) -> Result<ActionResult, PolycastError> {
        let channel = self.channel(Some(content))?;
        let mut body = json!({ "channel": channel, "text": content.body });
        if let Some(blocks) = content.metadata.get("blocks") {
            body["blocks"] = blocks.clone();
        }
        if let Some(post_at) = content.metadata.get("post_at").and_then(Value::as_i64) {
            body["post_at"] = json!(post_at);
            return self
                .act("chat.scheduleMessage", &body, |v| {
                    json!({ "scheduled_message_id": v["scheduled_message_id"], "post_at": post_at })
                })
                .await;
        }
        self.act("chat.postMessage", &body, message_ref).await
    }

    async fn do_comment(&self, post_id: &str, text: &str) -> Result<ActionResult, PolycastError> {
        let (channel, ts) = parse_message_id(post_id)?;
        self.act(
            "chat.postMessage",
            &json!({ "channel": channel, "text": text, "thread_ts": ts }),
            message_ref,
        )
        .await
    }

    /// Reposts a permalink to the configured channel.
    async fn do_share(
        &self,
        post_id: &str,
        comment: Option<&str>,
    ) -> Result<ActionResult, PolycastError> {
        let (source, ts) = parse_message_id(post_id)?;
        let link = self
            .query(
                "chat.getPermalink",
                &[("channel", source.to_string()), ("message_ts", ts.to_string())],
            )
            .await?;
        let permalink = link["permalink"].as_str().unwrap_or_default();
        let text = match comment {
            Some(comment) => format!("{comment}\n{permalink}"),
            None => permalink.to_string(),
        };
        let channel = self.channel(None)?;
        self.act(
            "chat.postMessage",
            &json!({ "channel": channel, "text": text, "unfurl_links": true }),
            message_ref,
        )
        .await
    }

    async fn do_delete(&self, post_id: &str) -> Result<ActionResult, PolycastError> {
        let (channel, ts) = parse_message_id(post_id)?;
        self.act("chat.delete", &json!({ "channel": channel, "ts": ts }), |_| {
            json!({ "id": post_id })
        })
        .await
    }

    async fn do_like(&self, post_id: &str) -> Result<ActionResult, PolycastError> {
        let (channel, ts) = parse_message_id(post_id)?;
        self.act(
            "reactions.add",
            &json!({ "channel": channel, "timestamp": ts, "name": self.reaction() }),
            |_| json!({ "id": post_id }),
        )
        .await
    }

    async fn do_unlike(&self, post_id: &str) -> Result<ActionResult, PolycastError> {
        let (channel, ts) = parse_message_id(post_id)?;
        self.act(
            "reactions.remove",
            &json!({ "channel": channel, "timestamp": ts, "name": self.reaction() }),
            |_| json!({ "id": post_id }),
        )
        .await
    }

    async fn get_profile(&self, user_id: Option<&str>) -> Result<UserProfile, PolycastError> {
        let user = match user_id.map(str::to_string).or_else(|| self.user_id.get()) {
            Some(user) => user,
            None => {
                let who = self.call("auth.test", &json!({})).await?;
                str_field(&who, "/user_id").unwrap_or_default()
            }
        };
        let info = self.query("users.info", &[("user", user)]).await?;
        let user = &info["user"];
        Ok(UserProfile {
            id: str_field(user, "/id").unwrap_or_default(),
            username: str_field(user, "/name").unwrap_or_default(),
            display_name: str_field(user, "/profile/display_name")
                .filter(|name| !name.is_empty())
                .or_else(|| str_field(user, "/real_name")),
            bio: str_field(user, "/profile/title").filter(|t| !t.is_empty()),
            avatar_url: str_field(user, "/profile/image_192"),
            ..UserProfile::default()
        })
    }

    async fn get_content(&self, post_id: &str) -> Result<ContentItem, PolycastError> {
        let (channel, ts) = parse_message_id(post_id)?;
        let history = self
            .query(
                "conversations.history",
                &[
                    ("channel", channel.to_string()),
                    ("latest", ts.to_string()),
                    ("inclusive", "true".to_string()),
                    ("limit", "1".to_string()),
                ],
            )
            .await?;
        history["messages"]
            .get(0)
            .map(|m| message_to_item(channel, m))
            .ok_or_else(|| PolycastError::platform(format!("slack message {post_id} not found")))
    }

    async fn search(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<Vec<ContentItem>, PolycastError> {
        let mut params = vec![("query", query.to_string())];
        if let Some(limit) = options.limit {
            params.push(("count", limit.min(100).to_string()));
        }
        if let Some(sort) = &options.sort {
            params.push(("sort", sort.clone()));
        }
        let response = self.query("search.messages", &params).await?;
        Ok(response["messages"]["matches"]
            .as_array()
            .map(|matches| {
                matches
                    .iter()
                    .map(|m| message_to_item(m["channel"]["id"].as_str().unwrap_or_default(), m))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn get_analytics(&self, post_id: &str) -> Result<ContentMetrics, PolycastError> {
        let (channel, ts) = parse_message_id(post_id)?;
        let response = self
            .query(
                "reactions.get",
                &[("channel", channel.to_string()), ("timestamp", ts.to_string())],
            )
            .await?;
        Ok(message_to_item(channel, &response["message"])
            .metrics
            .unwrap_or_default())
    }

    /// Polls the configured channel's history. Messages that mention the
    /// authenticated user are reported as mentions.
    async fn do_start_monitoring(&self, sink: EventSink) -> Result<(), PolycastError> {
        let channel = self.channel(None)?.to_string();
        let mention = self.user_id.get().map(|id| format!("<@{id}>"));
        let client = Arc::clone(&self.client);
        self.poller.start(poll_interval(&self.config), sink, move || {
            let client = Arc::clone(&client);
            let channel = channel.clone();
            let mention = mention.clone();
            async move {
                let response = client
                    .get(
                        "/conversations.history",
                        &[("channel", channel.clone()), ("limit", "50".to_string())],
                    )
                    .await?;
                let history = match check(response) {
                    Ok(history) => history,
                    Err(Rejection::Soft(message)) => return Err(PolycastError::platform(message)),
                    Err(Rejection::Hard(err)) => return Err(err),
                };
                Ok(history["messages"]
                    .as_array()
                    .map(|messages| {
                        messages
                            .iter()
                            .map(|m| {
                                let item = message_to_item(&channel, m);
                                match &mention {
                                    Some(tag) if item.body.contains(tag.as_str()) => {
                                        Inbound::Mention(item)
                                    }
                                    _ => Inbound::Message(item),
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

    async fn do_validate_content(&self, content: &ContentItem) -> Result<bool, PolycastError> {
        if content.body_len() > MAX_LENGTH {
            return Ok(false);
        }
        Ok(metadata_str(content, "channel").is_none_or(is_channel))
    }
}
