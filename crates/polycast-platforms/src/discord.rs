// SPDX-FileCopyrightText: 2026 Polycast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Discord collaborator using a bot token against the v10 REST API.
//!
//! Messages are addressed as `channel_id/message_id`. New posts go to the
//! channel named by the content's `channel_id` metadata or the adapter's
//! `channel_id` setting.

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

use crate::http::{Auth, Body, RestClient, str_field};
use crate::oauth1::encode;
use crate::poll::{Inbound, Poller, poll_interval};
use crate::{Identity, content_types, credential, malformed, metadata_str, require_credentials};

pub const BASE_URL: &str = "https://discord.com/api/v10";

const MAX_LENGTH: usize = 2000;
const DEFAULT_REACTION: &str = "\u{1F44D}";

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
        supports_scheduling: false,
        supports_polls: true,
        content_types: content_types(&[
            ContentType::Text,
            ContentType::Image,
            ContentType::Video,
            ContentType::Document,
            ContentType::Audio,
        ]),
        max_content_length: MAX_LENGTH,
        max_media_size: Some(8 * 1024 * 1024),
    }
}

/// Discord snowflakes in practice are 17 to 19 digits.
fn is_snowflake(id: &str) -> bool {
    (17..=19).contains(&id.len()) && id.bytes().all(|b| b.is_ascii_digit())
}

fn parse_message_id(post_id: &str) -> Result<(&str, &str), PolycastError> {
    post_id
        .split_once('/')
        .filter(|(channel, message)| !channel.is_empty() && !message.is_empty())
        .ok_or_else(|| {
            PolycastError::Validation(format!(
                "invalid Discord message id `{post_id}`, expected channel_id/message_id"
            ))
        })
}

fn message_to_item(message: &Value) -> ContentItem {
    let mut item = ContentItem::text(message["content"].as_str().unwrap_or_default());
    item.id = str_field(message, "/channel_id")
        .zip(str_field(message, "/id"))
        .map(|(channel, id)| format!("{channel}/{id}"));
    item.author = str_field(message, "/author/username");
    item.created_at = message["timestamp"].as_str().and_then(|s| s.parse().ok());
    item.mentions = message["mentions"]
        .as_array()
        .map(|users| {
            users
                .iter()
                .filter_map(|u| u["username"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();
    let reactions = reaction_total(message);
    if reactions > 0 {
        item.metrics = Some(ContentMetrics {
            likes: Some(reactions),
            ..ContentMetrics::default()
        });
    }
    item
}

fn reaction_total(message: &Value) -> u64 {
    message["reactions"]
        .as_array()
        .map(|reactions| reactions.iter().filter_map(|r| r["count"].as_u64()).sum())
        .unwrap_or(0)
}

pub struct DiscordHooks {
    config: AdapterConfig,
    client: Arc<RestClient>,
    bot_id: Identity,
    poller: Poller,
}

impl DiscordHooks {
    pub fn new(config: &AdapterConfig) -> Result<Self, PolycastError> {
        let client = RestClient::new(
            PlatformType::Discord,
            BASE_URL,
            config,
            Auth::Bot(credential(config, "token")),
            &[],
        )?;
        Ok(Self {
            config: config.clone(),
            client: Arc::new(client),
            bot_id: Identity::default(),
            poller: Poller::new(),
        })
    }

    fn channel<'a>(&'a self, content: Option<&'a ContentItem>) -> Result<&'a str, PolycastError> {
        content
            .and_then(|c| metadata_str(c, "channel_id"))
            .or_else(|| self.config.setting_str("channel_id"))
            .ok_or_else(|| {
                PolycastError::Validation(
                    "no target channel: set the `channel_id` setting or metadata".to_string(),
                )
            })
    }

    fn reaction_path(&self, post_id: &str) -> Result<String, PolycastError> {
        let (channel, message) = parse_message_id(post_id)?;
        let emoji = self.config.setting_str("reaction").unwrap_or(DEFAULT_REACTION);
        Ok(format!(
            "/channels/{channel}/messages/{message}/reactions/{}/@me",
            encode(emoji)
        ))
    }

    async fn send_message(&self, channel: &str, body: Value) -> Result<ActionResult, PolycastError> {
        let message = self
            .client
            .post_json(&format!("/channels/{channel}/messages"), &body)
            .await?;
        let id = str_field(&message, "/id").ok_or_else(|| malformed(PlatformType::Discord, "id"))?;
        Ok(ActionResult::success(json!({ "id": format!("{channel}/{id}") })))
    }
}

#[async_trait]
impl PlatformHooks for DiscordHooks {
    fn platform(&self) -> PlatformType {
        PlatformType::Discord
    }

    fn capabilities(&self) -> CapabilityDescriptor {
        capabilities()
    }

    async fn do_initialize(&self) -> Result<(), PolycastError> {
        require_credentials(PlatformType::Discord, &self.config)
    }

    async fn do_authenticate(&self) -> Result<bool, PolycastError> {
        match self.client.get("/users/@me", &[]).await {
            Ok(me) => {
                if let Some(id) = str_field(&me, "/id") {
                    self.bot_id.set(id);
                }
                Ok(true)
            }
            Err(err) if !err.is_transient() => {
                debug!(error = %err, "discord rejected bot token");
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }

    async fn do_disconnect(&self) -> Result<(), PolycastError> {
        self.poller.stop().await;
        self.bot_id.clear();
        Ok(())
    }

    async fn do_post(&self, content: &ContentItem) -> Result<ActionResult, PolycastError> {
        let channel = self.channel(Some(content))?;
        let mut body = json!({ "content": content.body });
        if let Some(embeds) = content.metadata.get("embeds") {
            body["embeds"] = embeds.clone();
        }
        self.send_message(channel, body).await
    }

    async fn do_comment(&self, post_id: &str, text: &str) -> Result<ActionResult, PolycastError> {
        let (channel, message) = parse_message_id(post_id)?;
        self.send_message(
            channel,
            json!({
                "content": text,
                "message_reference": { "message_id": message, "channel_id": channel },
            }),
        )
        .await
    }

    /// Announcement channels crosspost; a comment is sent as a reply instead.
    async fn do_share(
        &self,
        post_id: &str,
        comment: Option<&str>,
    ) -> Result<ActionResult, PolycastError> {
        if let Some(text) = comment {
            return self.do_comment(post_id, text).await;
        }
        let (channel, message) = parse_message_id(post_id)?;
        self.client
            .send(
                Method::POST,
                &format!("/channels/{channel}/messages/{message}/crosspost"),
                &[],
                Body::Empty,
            )
            .await?;
        Ok(ActionResult::success(json!({ "id": post_id })))
    }

    async fn do_delete(&self, post_id: &str) -> Result<ActionResult, PolycastError> {
        let (channel, message) = parse_message_id(post_id)?;
        self.client
            .delete(&format!("/channels/{channel}/messages/{message}"))
            .await?;
        Ok(ActionResult::success(json!({ "id": post_id })))
    }

    async fn do_like(&self, post_id: &str) -> Result<ActionResult, PolycastError> {
        let path = self.reaction_path(post_id)?;
        self.client.send(Method::PUT, &path, &[], Body::Empty).await?;
        Ok(ActionResult::success(json!({ "id": post_id })))
    }

    async fn do_unlike(&self, post_id: &str) -> Result<ActionResult, PolycastError> {
        let path = self.reaction_path(post_id)?;
        self.client.delete(&path).await?;
        Ok(ActionResult::success(json!({ "id": post_id })))
    }

    async fn get_profile(&self, user_id: Option<&str>) -> Result<UserProfile, PolycastError> {
        let path = format!("/users/{}", user_id.unwrap_or("@me"));
        let user = self.client.get(&path, &[]).await?;
        let id = str_field(&user, "/id").ok_or_else(|| malformed(PlatformType::Discord, "id"))?;
        let avatar_url = str_field(&user, "/avatar")
            .map(|hash| format!("https://cdn.discordapp.com/avatars/{id}/{hash}.png"));
        Ok(UserProfile {
            username: str_field(&user, "/username").unwrap_or_default(),
            display_name: str_field(&user, "/global_name"),
            avatar_url,
            verified: user["verified"].as_bool().unwrap_or(false),
            id,
            ..UserProfile::default()
        })
    }

    async fn get_content(&self, post_id: &str) -> Result<ContentItem, PolycastError> {
        let (channel, message) = parse_message_id(post_id)?;
        let message = self
            .client
            .get(&format!("/channels/{channel}/messages/{message}"), &[])
            .await?;
        Ok(message_to_item(&message))
    }

    /// Bots cannot use guild search; this filters recent channel history.
    async fn search(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<Vec<ContentItem>, PolycastError> {
        let channel = self.channel(None)?;
        let messages = self
            .client
            .get(
                &format!("/channels/{channel}/messages"),
                &[("limit", "100".to_string())],
            )
            .await?;
        let needle = query.to_lowercase();
        let limit = options.limit.map_or(usize::MAX, |l| l as usize);
        Ok(messages
            .as_array()
            .map(|list| {
                list.iter()
                    .filter(|m| {
                        m["content"]
                            .as_str()
                            .is_some_and(|c| c.to_lowercase().contains(&needle))
                    })
                    .map(message_to_item)
                    .take(limit)
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn get_analytics(&self, post_id: &str) -> Result<ContentMetrics, PolycastError> {
        let (channel, message) = parse_message_id(post_id)?;
        let message = self
            .client
            .get(&format!("/channels/{channel}/messages/{message}"), &[])
            .await?;
        Ok(ContentMetrics {
            likes: Some(reaction_total(&message)),
            ..ContentMetrics::default()
        })
    }

    async fn setup_webhook(&self, url: &str, _events: &[String]) -> Result<bool, PolycastError> {
        let channel = self.channel(None)?;
        let name = self.config.setting_str("webhook_name").unwrap_or("polycast");
        let webhook = self
            .client
            .post_json(
                &format!("/channels/{channel}/webhooks"),
                &json!({ "name": name }),
            )
            .await?;
        debug!(webhook = ?str_field(&webhook, "/id"), target = url, "discord webhook created");
        Ok(webhook.get("id").is_some())
    }

    async fn remove_webhook(&self, webhook_id: &str) -> Result<bool, PolycastError> {
        self.client.delete(&format!("/webhooks/{webhook_id}")).await?;
        Ok(true)
    }

    /// Polls the configured channel; messages mentioning the bot are
    /// reported as mentions.
    async fn do_start_monitoring(&self, sink: EventSink) -> Result<(), PolycastError> {
        let channel = self.channel(None)?.to_string();
        let bot_id = self.bot_id.get();
        let client = Arc::clone(&self.client);
        self.poller.start(poll_interval(&self.config), sink, move || {
            let client = Arc::clone(&client);
            let path = format!("/channels/{channel}/messages");
            let bot_id = bot_id.clone();
            async move {
                let messages = client.get(&path, &[("limit", "50".to_string())]).await?;
                Ok(messages
                    .as_array()
                    .map(|list| {
                        list.iter()
                            .map(|m| {
                                let mentions_bot = bot_id.as_deref().is_some_and(|id| {
                                    m["mentions"]
                                        .as_array()
                                        .is_some_and(|users| users.iter().any(|u| u["id"] == id))
                                });
                                let item = message_to_item(m);
                                if mentions_bot {
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

    async fn do_validate_content(&self, content: &ContentItem) -> Result<bool, PolycastError> {
        if content.body_len() > MAX_LENGTH {
            return Ok(false);
        }
        Ok(metadata_str(content, "channel_id").is_none_or(is_snowflake))
    }
}
