// SPDX-FileCopyrightText: 2026 Polycast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Twitter (X) collaborator over the v2 API with OAuth 1.0a user context.

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
use crate::oauth1::OAuth1Credentials;
use crate::poll::{Inbound, Poller, poll_interval};
use crate::{Identity, content_types, credential, malformed, metadata_str, require_credentials};

pub const BASE_URL: &str = "https://api.twitter.com";

const MAX_LENGTH: usize = 280;
const MAX_MENTIONS: usize = 10;
const TWEET_FIELDS: &str = "created_at,author_id,public_metrics";
const USER_FIELDS: &str = "description,profile_image_url,public_metrics,verified";

pub fn capabilities() -> CapabilityDescriptor {
    CapabilityDescriptor {
        can_post: true,
        can_comment: true,
        can_share: true,
        can_delete: true,
        can_edit: false,
        can_like: true,
        can_follow: true,
        can_message: true,
        can_mention: true,
        supports_webhooks: true,
        supports_analytics: true,
        supports_scheduling: false,
        supports_polls: true,
        content_types: content_types(&[ContentType::Text, ContentType::Image, ContentType::Video]),
        max_content_length: MAX_LENGTH,
        max_media_size: Some(5 * 1024 * 1024),
    }
}

pub struct TwitterHooks {
    config: AdapterConfig,
    client: Arc<RestClient>,
    user_id: Identity,
    poller: Poller,
}

impl TwitterHooks {
    pub fn new(config: &AdapterConfig) -> Result<Self, PolycastError> {
        let credentials = OAuth1Credentials {
            consumer_key: credential(config, "api_key"),
            consumer_secret: credential(config, "api_secret"),
            token: credential(config, "access_token"),
            token_secret: credential(config, "access_token_secret"),
        };
        let client = RestClient::new(
            PlatformType::Twitter,
            BASE_URL,
            config,
            Auth::OAuth1(credentials),
            &[],
        )?;
        Ok(Self {
            config: config.clone(),
            client: Arc::new(client),
            user_id: Identity::default(),
            poller: Poller::new(),
        })
    }

    /// Id of the authenticated account, fetched once.
    async fn user_id(&self) -> Result<String, PolycastError> {
        if let Some(id) = self.user_id.get() {
            return Ok(id);
        }
        let me = self.client.get("/2/users/me", &[]).await?;
        let id = str_field(&me, "/data/id").ok_or_else(|| malformed(PlatformType::Twitter, "data.id"))?;
        self.user_id.set(id.clone());
        Ok(id)
    }

    async fn tweet(&self, body: Value) -> Result<ActionResult, PolycastError> {
        let response = self.client.post_json("/2/tweets", &body).await?;
        let id = str_field(&response, "/data/id")
            .ok_or_else(|| malformed(PlatformType::Twitter, "data.id"))?;
        debug!(tweet = %id, "tweet created");
        Ok(ActionResult::success(json!({
            "id": id,
            "url": tweet_url(&id),
        })))
    }

    fn webhook_env(&self) -> &str {
        self.config.setting_str("webhook_env").unwrap_or("prod")
    }
}

fn tweet_url(id: &str) -> String {
    format!("https://twitter.com/i/web/status/{id}")
}

fn mention_count(text: &str) -> usize {
    text.split_whitespace()
        .filter(|word| word.len() > 1 && word.starts_with('@'))
        .count()
}

fn tweet_to_item(tweet: &Value) -> ContentItem {
    let mut item = ContentItem::text(tweet["text"].as_str().unwrap_or_default());
    item.id = str_field(tweet, "/id");
    item.url = item.id.as_deref().map(tweet_url);
    item.author = str_field(tweet, "/author_id");
    item.created_at = tweet["created_at"]
        .as_str()
        .and_then(|s| s.parse().ok());
    let metrics = metrics_from(tweet);
    if !metrics.is_empty() {
        item.metrics = Some(metrics);
    }
    item
}

fn metrics_from(tweet: &Value) -> ContentMetrics {
    ContentMetrics {
        views: u64_field(tweet, "/public_metrics/impression_count"),
        likes: u64_field(tweet, "/public_metrics/like_count"),
        shares: u64_field(tweet, "/public_metrics/retweet_count"),
        comments: u64_field(tweet, "/public_metrics/reply_count"),
        clicks: None,
        impressions: u64_field(tweet, "/public_metrics/impression_count"),
    }
}

/// Success when the state flag at `pointer` reads `expected` (or is absent).
fn confirmed(response: &Value, pointer: &str, expected: bool, id: &str) -> ActionResult {
    match response.pointer(pointer).and_then(Value::as_bool) {
        Some(state) if state != expected => {
            ActionResult::failure(format!("twitter did not apply the change to {id}"))
        }
        _ => ActionResult::success(json!({ "id": id })),
    }
}

#[async_trait]
impl PlatformHooks for TwitterHooks {
    fn platform(&self) -> PlatformType {
        PlatformType::Twitter
    }

    fn capabilities(&self) -> CapabilityDescriptor {
        capabilities()
    }

    async fn do_initialize(&self) -> Result<(), PolycastError> {
        require_credentials(PlatformType::Twitter, &self.config)
    }

    async fn do_authenticate(&self) -> Result<bool, PolycastError> {
        match self.user_id().await {
            Ok(_) => Ok(true),
            Err(err) if !err.is_transient() => {
                debug!(error = %err, "twitter rejected credentials");
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }

    async fn do_disconnect(&self) -> Result<(), PolycastError> {
        self.poller.stop().await;
        self.user_id.clear();
        Ok(())
    }

    async fn do_post(&self, content: &ContentItem) -> Result<ActionResult, PolycastError> {
        let mut body = json!({ "text": content.body });
        if let Some(ids) = content.metadata.get("media_ids") {
            body["media"] = json!({ "media_ids": ids });
        }
        self.tweet(body).await
    }

    async fn do_comment(&self, post_id: &str, text: &str) -> Result<ActionResult, PolycastError> {
        self.tweet(json!({
            "text": text,
            "reply": { "in_reply_to_tweet_id": post_id },
        }))
        .await
    }

    async fn do_share(
        &self,
        post_id: &str,
        comment: Option<&str>,
    ) -> Result<ActionResult, PolycastError> {
        if let Some(text) = comment {
            return self
                .tweet(json!({ "text": text, "quote_tweet_id": post_id }))
                .await;
        }
        let user = self.user_id().await?;
        let response = self
            .client
            .post_json(&format!("/2/users/{user}/retweets"), &json!({ "tweet_id": post_id }))
            .await?;
        Ok(confirmed(&response, "/data/retweeted", true, post_id))
    }

    async fn do_delete(&self, post_id: &str) -> Result<ActionResult, PolycastError> {
        let response = self.client.delete(&format!("/2/tweets/{post_id}")).await?;
        Ok(confirmed(&response, "/data/deleted", true, post_id))
    }

    async fn do_like(&self, post_id: &str) -> Result<ActionResult, PolycastError> {
        let user = self.user_id().await?;
        let response = self
            .client
            .post_json(&format!("/2/users/{user}/likes"), &json!({ "tweet_id": post_id }))
            .await?;
        Ok(confirmed(&response, "/data/liked", true, post_id))
    }

    async fn do_unlike(&self, post_id: &str) -> Result<ActionResult, PolycastError> {
        let user = self.user_id().await?;
        let response = self
            .client
            .delete(&format!("/2/users/{user}/likes/{post_id}"))
            .await?;
        Ok(confirmed(&response, "/data/liked", false, post_id))
    }

    async fn do_follow(&self, user_id: &str) -> Result<ActionResult, PolycastError> {
        let user = self.user_id().await?;
        let response = self
            .client
            .post_json(
                &format!("/2/users/{user}/following"),
                &json!({ "target_user_id": user_id }),
            )
            .await?;
        Ok(confirmed(&response, "/data/following", true, user_id))
    }

    async fn do_unfollow(&self, user_id: &str) -> Result<ActionResult, PolycastError> {
        let user = self.user_id().await?;
        let response = self
            .client
            .delete(&format!("/2/users/{user}/following/{user_id}"))
            .await?;
        Ok(confirmed(&response, "/data/following", false, user_id))
    }

    async fn get_profile(&self, user_id: Option<&str>) -> Result<UserProfile, PolycastError> {
        let path = match user_id {
            Some(id) => format!("/2/users/{id}"),
            None => "/2/users/me".to_string(),
        };
        let response = self
            .client
            .get(&path, &[("user.fields", USER_FIELDS.to_string())])
            .await?;
        let user = &response["data"];
        let username = str_field(user, "/username").unwrap_or_default();
        Ok(UserProfile {
            id: str_field(user, "/id").ok_or_else(|| malformed(PlatformType::Twitter, "data.id"))?,
            display_name: str_field(user, "/name"),
            bio: str_field(user, "/description"),
            avatar_url: str_field(user, "/profile_image_url"),
            url: Some(format!("https://twitter.com/{username}")),
            followers: u64_field(user, "/public_metrics/followers_count"),
            following: u64_field(user, "/public_metrics/following_count"),
            verified: user["verified"].as_bool().unwrap_or(false),
            username,
        })
    }

    async fn get_content(&self, post_id: &str) -> Result<ContentItem, PolycastError> {
        let response = self
            .client
            .get(
                &format!("/2/tweets/{post_id}"),
                &[("tweet.fields", TWEET_FIELDS.to_string())],
            )
            .await?;
        Ok(tweet_to_item(&response["data"]))
    }

    async fn search(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<Vec<ContentItem>, PolycastError> {
        // The recent-search endpoint accepts 10..=100 results per page.
        let limit = options.limit.unwrap_or(10).clamp(10, 100);
        let mut params = vec![
            ("query", query.to_string()),
            ("max_results", limit.to_string()),
            ("tweet.fields", TWEET_FIELDS.to_string()),
        ];
        if let Some(since) = options.since {
            params.push(("start_time", since.to_rfc3339()));
        }
        if let Some(until) = options.until {
            params.push(("end_time", until.to_rfc3339()));
        }
        let response = self.client.get("/2/tweets/search/recent", &params).await?;
        let mut items: Vec<ContentItem> = response["data"]
            .as_array()
            .map(|tweets| tweets.iter().map(tweet_to_item).collect())
            .unwrap_or_default();
        if let Some(requested) = options.limit {
            items.truncate(requested as usize);
        }
        Ok(items)
    }

    async fn get_analytics(&self, post_id: &str) -> Result<ContentMetrics, PolycastError> {
        let response = self
            .client
            .get(
                &format!("/2/tweets/{post_id}"),
                &[("tweet.fields", "public_metrics".to_string())],
            )
            .await?;
        Ok(metrics_from(&response["data"]))
    }

    async fn setup_webhook(&self, url: &str, _events: &[String]) -> Result<bool, PolycastError> {
        let path = format!("/1.1/account_activity/all/{}/webhooks.json", self.webhook_env());
        let response = self
            .client
            .send(Method::POST, &path, &[("url", url.to_string())], Body::Empty)
            .await?;
        Ok(response.body["valid"].as_bool().unwrap_or(true))
    }

    async fn remove_webhook(&self, webhook_id: &str) -> Result<bool, PolycastError> {
        let path = format!(
            "/1.1/account_activity/all/{}/webhooks/{webhook_id}.json",
            self.webhook_env()
        );
        self.client.delete(&path).await?;
        Ok(true)
    }

    async fn do_start_monitoring(&self, sink: EventSink) -> Result<(), PolycastError> {
        let user = self.user_id().await?;
        let client = Arc::clone(&self.client);
        self.poller.start(poll_interval(&self.config), sink, move || {
            let client = Arc::clone(&client);
            let path = format!("/2/users/{user}/mentions");
            async move {
                let response = client
                    .get(&path, &[("tweet.fields", TWEET_FIELDS.to_string())])
                    .await?;
                Ok(response["data"]
                    .as_array()
                    .map(|tweets| {
                        tweets
                            .iter()
                            .map(|t| Inbound::Mention(tweet_to_item(t)))
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
        if mention_count(&content.body) > MAX_MENTIONS {
            debug!("tweet mentions too many accounts");
            return Ok(false);
        }
        Ok(metadata_str(content, "reply_settings")
            .is_none_or(|s| matches!(s, "everyone" | "mentionedUsers" | "following")))
    }
}
