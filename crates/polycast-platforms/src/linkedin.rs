// SPDX-FileCopyrightText: 2026 Polycast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! LinkedIn collaborator over the versioned REST and v2 social-action APIs.
//!
//! Posts are addressed by URN (`urn:li:share:...` or `urn:li:ugcPost:...`).

use std::sync::Arc;

use async_trait::async_trait;
use polycast_config::AdapterConfig;
use polycast_core::{
    ActionResult, CapabilityDescriptor, ContentItem, ContentMetrics, ContentType, PlatformHooks,
    PlatformType, PolycastError, UserProfile,
};
use reqwest::Method;
use serde_json::{Value, json};
use tracing::debug;

use crate::http::{Auth, Body, RestClient, str_field, u64_field};
use crate::oauth1::encode;
use crate::{Identity, content_types, credential, malformed, require_credentials};

pub const BASE_URL: &str = "https://api.linkedin.com";

const API_VERSION: &str = "202401";
const MAX_LENGTH: usize = 3000;

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
        supports_webhooks: false,
        supports_analytics: true,
        supports_scheduling: false,
        supports_polls: true,
        content_types: content_types(&[
            ContentType::Text,
            ContentType::Image,
            ContentType::Video,
            ContentType::Document,
            ContentType::Link,
        ]),
        max_content_length: MAX_LENGTH,
        max_media_size: Some(100 * 1024 * 1024),
    }
}

pub struct LinkedinHooks {
    config: AdapterConfig,
    client: Arc<RestClient>,
    person: Identity,
}

impl LinkedinHooks {
    pub fn new(config: &AdapterConfig) -> Result<Self, PolycastError> {
        let client = RestClient::new(
            PlatformType::Linkedin,
            BASE_URL,
            config,
            Auth::Bearer(credential(config, "access_token")),
            &[
                ("linkedin-version", API_VERSION),
                ("x-restli-protocol-version", "2.0.0"),
            ],
        )?;
        Ok(Self {
            config: config.clone(),
            client: Arc::new(client),
            person: Identity::default(),
        })
    }

    /// `urn:li:person:<sub>` of the token's member.
    async fn person_urn(&self) -> Result<String, PolycastError> {
        if let Some(urn) = self.person.get() {
            return Ok(urn);
        }
        let info = self.client.get("/v2/userinfo", &[]).await?;
        let sub = str_field(&info, "/sub").ok_or_else(|| malformed(PlatformType::Linkedin, "sub"))?;
        let urn = format!("urn:li:person:{sub}");
        self.person.set(urn.clone());
        Ok(urn)
    }

    /// Create a post; LinkedIn returns its URN in `x-restli-id`.
    async fn create_post(&self, body: Value) -> Result<ActionResult, PolycastError> {
        let response = self
            .client
            .send(Method::POST, "/rest/posts", &[], Body::Json(&body))
            .await?;
        let urn = response
            .header("x-restli-id")
            .map(str::to_string)
            .or_else(|| str_field(&response.body, "/id"))
            .ok_or_else(|| malformed(PlatformType::Linkedin, "x-restli-id"))?;
        debug!(post = %urn, "linkedin post created");
        Ok(ActionResult::success(json!({
            "id": urn,
            "url": format!("https://www.linkedin.com/feed/update/{urn}/"),
        })))
    }

    fn post_body(author: &str, commentary: &str) -> Value {
        json!({
            "author": author,
            "commentary": commentary,
            "visibility": "PUBLIC",
            "distribution": {
                "feedDistribution": "MAIN_FEED",
                "targetEntities": [],
                "thirdPartyDistributionChannels": [],
            },
            "lifecycleState": "PUBLISHED",
            "isReshareDisabledByAuthor": false,
        })
    }
}

#[async_trait]
impl PlatformHooks for LinkedinHooks {
    fn platform(&self) -> PlatformType {
        PlatformType::Linkedin
    }

    fn capabilities(&self) -> CapabilityDescriptor {
        capabilities()
    }

    async fn do_initialize(&self) -> Result<(), PolycastError> {
        require_credentials(PlatformType::Linkedin, &self.config)
    }

    async fn do_authenticate(&self) -> Result<bool, PolycastError> {
        match self.person_urn().await {
            Ok(_) => Ok(true),
            Err(err) if !err.is_transient() => {
                debug!(error = %err, "linkedin rejected token");
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }

    async fn do_disconnect(&self) -> Result<(), PolycastError> {
        self.person.clear();
        Ok(())
    }

    async fn do_post(&self, content: &ContentItem) -> Result<ActionResult, PolycastError> {
        let author = self.person_urn().await?;
        let mut body = Self::post_body(&author, &content.body);
        if let Some(link) = content.media.iter().find(|m| m.media_type == ContentType::Link) {
            body["content"] = json!({ "article": { "source": link.url, "title": content.body.lines().next().unwrap_or_default() } });
        }
        self.create_post(body).await
    }

    async fn do_comment(&self, post_id: &str, text: &str) -> Result<ActionResult, PolycastError> {
        let actor = self.person_urn().await?;
        let response = self
            .client
            .post_json(
                &format!("/v2/socialActions/{}/comments", encode(post_id)),
                &json!({ "actor": actor, "message": { "text": text } }),
            )
            .await?;
        Ok(ActionResult::success(json!({
            "id": str_field(&response, "/id"),
            "post_id": post_id,
        })))
    }

    async fn do_share(
        &self,
        post_id: &str,
        comment: Option<&str>,
    ) -> Result<ActionResult, PolycastError> {
        let author = self.person_urn().await?;
        let mut body = Self::post_body(&author, comment.unwrap_or_default());
        body["reshareContext"] = json!({ "parent": post_id });
        self.create_post(body).await
    }

    async fn do_delete(&self, post_id: &str) -> Result<ActionResult, PolycastError> {
        self.client
            .delete(&format!("/rest/posts/{}", encode(post_id)))
            .await?;
        Ok(ActionResult::success(json!({ "id": post_id })))
    }

    async fn do_like(&self, post_id: &str) -> Result<ActionResult, PolycastError> {
        let actor = self.person_urn().await?;
        self.client
            .post_json(
                &format!("/v2/socialActions/{}/likes", encode(post_id)),
                &json!({ "actor": actor, "object": post_id }),
            )
            .await?;
        Ok(ActionResult::success(json!({ "id": post_id })))
    }

    async fn do_unlike(&self, post_id: &str) -> Result<ActionResult, PolycastError> {
        let actor = self.person_urn().await?;
        self.client
            .send(
                Method::DELETE,
                &format!("/v2/socialActions/{}/likes/{}", encode(post_id), encode(&actor)),
                &[("actor", actor.clone())],
                Body::Empty,
            )
            .await?;
        Ok(ActionResult::success(json!({ "id": post_id })))
    }

    /// Only the authenticated member's profile is readable with member tokens.
    async fn get_profile(&self, user_id: Option<&str>) -> Result<UserProfile, PolycastError> {
        if user_id.is_some() {
            return Err(PolycastError::unsupported(
                PlatformType::Linkedin,
                "get_profile for other members",
            ));
        }
        let info = self.client.get("/v2/userinfo", &[]).await?;
        Ok(UserProfile {
            id: str_field(&info, "/sub").ok_or_else(|| malformed(PlatformType::Linkedin, "sub"))?,
            username: str_field(&info, "/email").unwrap_or_default(),
            display_name: str_field(&info, "/name"),
            avatar_url: str_field(&info, "/picture"),
            verified: info["email_verified"].as_bool().unwrap_or(false),
            ..UserProfile::default()
        })
    }

    async fn get_content(&self, post_id: &str) -> Result<ContentItem, PolycastError> {
        let post = self
            .client
            .get(&format!("/rest/posts/{}", encode(post_id)), &[])
            .await?;
        let mut item = ContentItem::text(post["commentary"].as_str().unwrap_or_default());
        item.id = Some(post_id.to_string());
        item.author = str_field(&post, "/author");
        item.url = Some(format!("https://www.linkedin.com/feed/update/{post_id}/"));
        item.created_at = post["publishedAt"]
            .as_i64()
            .and_then(chrono::DateTime::from_timestamp_millis);
        Ok(item)
    }

    async fn get_analytics(&self, post_id: &str) -> Result<ContentMetrics, PolycastError> {
        let summary = self
            .client
            .get(&format!("/v2/socialActions/{}", encode(post_id)), &[])
            .await?;
        Ok(ContentMetrics {
            likes: u64_field(&summary, "/likesSummary/totalLikes"),
            comments: u64_field(&summary, "/commentsSummary/aggregatedTotalComments"),
            ..ContentMetrics::default()
        })
    }

    async fn do_validate_content(&self, content: &ContentItem) -> Result<bool, PolycastError> {
        Ok(content.body_len() <= MAX_LENGTH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polycast_config::AuthKind;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const POST: &str = "urn:li:share:7100";

    fn hooks(server: &MockServer) -> LinkedinHooks {
        let config = AdapterConfig::new(PlatformType::Linkedin, "li", AuthKind::Oauth2)
            .with_credential("client_id", "id")
            .with_credential("client_secret", "secret")
            .with_credential("access_token", "li-token")
            .with_setting("base_url", json!(server.uri()));
        LinkedinHooks::new(&config).unwrap()
    }

    async fn mount_userinfo(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/v2/userinfo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "sub": "abc123",
                "name": "Ada Lovelace",
                "email": "ada@example.com",
                "email_verified": true
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn authenticate_resolves_member() {
        let server = MockServer::start().await;
        mount_userinfo(&server).await;
        let hooks = hooks(&server);

        assert!(hooks.do_authenticate().await.unwrap());
        assert_eq!(hooks.person.get().as_deref(), Some("urn:li:person:abc123"));
    }

    #[tokio::test]
    async fn rejected_token_is_not_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/userinfo"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "expired"})))
            .mount(&server)
            .await;

        assert!(!hooks(&server).do_authenticate().await.unwrap());
    }

    #[tokio::test]
    async fn post_reads_urn_from_header() {
        let server = MockServer::start().await;
        mount_userinfo(&server).await;
        Mock::given(method("POST"))
            .and(path("/rest/posts"))
            .and(header("linkedin-version", API_VERSION))
            .and(header("authorization", "Bearer li-token"))
            .respond_with(ResponseTemplate::new(201).insert_header("x-restli-id", POST))
            .mount(&server)
            .await;

        let result = hooks(&server)
            .do_post(&ContentItem::text("Shipping today"))
            .await
            .unwrap();
        assert_eq!(result.data().unwrap()["id"], POST);
    }

    #[tokio::test]
    async fn analytics_reads_social_summary() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/v2/socialActions/{}", encode(POST))))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "likesSummary": {"totalLikes": 12},
                "commentsSummary": {"aggregatedTotalComments": 3}
            })))
            .mount(&server)
            .await;

        let metrics = hooks(&server).get_analytics(POST).await.unwrap();
        assert_eq!(metrics.likes, Some(12));
        assert_eq!(metrics.comments, Some(3));
    }

    #[tokio::test]
    async fn other_members_profiles_are_unsupported() {
        let server = MockServer::start().await;
        let err = hooks(&server).get_profile(Some("someone")).await.unwrap_err();
        assert!(matches!(err, PolycastError::Unsupported { .. }));
    }
}
