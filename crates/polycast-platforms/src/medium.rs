// SPDX-FileCopyrightText: 2026 Polycast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Medium collaborator. Medium's API is publish-only: posts can be created
//! but not read back, edited or engaged with.

use std::sync::Arc;

use async_trait::async_trait;
use polycast_config::AdapterConfig;
use polycast_core::{
    ActionResult, CapabilityDescriptor, ContentItem, ContentType, PlatformHooks, PlatformType,
    PolycastError, UserProfile,
};
use serde_json::json;
use tracing::debug;

use crate::http::{Auth, RestClient, str_field};
use crate::{Identity, content_types, credential, malformed, metadata_str, require_credentials};

pub const BASE_URL: &str = "https://api.medium.com/v1";

const MAX_LENGTH: usize = 100_000;
const MAX_TITLE: usize = 100;
const MAX_TAGS: usize = 5;

pub fn capabilities() -> CapabilityDescriptor {
    CapabilityDescriptor {
        can_post: true,
        can_comment: false,
        can_share: false,
        can_delete: false,
        can_edit: true,
        can_like: false,
        can_follow: false,
        can_message: false,
        can_mention: false,
        supports_webhooks: false,
        supports_analytics: true,
        supports_scheduling: false,
        supports_polls: false,
        content_types: content_types(&[ContentType::Text, ContentType::Image]),
        max_content_length: MAX_LENGTH,
        max_media_size: Some(25 * 1024 * 1024),
    }
}

pub struct MediumHooks {
    config: AdapterConfig,
    client: RestClient,
    user_id: Identity,
}

impl MediumHooks {
    pub fn new(config: &AdapterConfig) -> Result<Self, PolycastError> {
        let client = RestClient::new(
            PlatformType::Medium,
            BASE_URL,
            config,
            Auth::Bearer(credential(config, "token")),
            &[],
        )?;
        Ok(Self {
            config: config.clone(),
            client,
            user_id: Identity::default(),
        })
    }

    async fn user_id(&self) -> Result<String, PolycastError> {
        if let Some(id) = self.user_id.get() {
            return Ok(id);
        }
        let me = self.client.get("/me", &[]).await?;
        let id = str_field(&me, "/data/id").ok_or_else(|| malformed(PlatformType::Medium, "data.id"))?;
        self.user_id.set(id.clone());
        Ok(id)
    }
}

#[async_trait]
impl PlatformHooks for MediumHooks {
    fn platform(&self) -> PlatformType {
        PlatformType::Medium
    }

    fn capabilities(&self) -> CapabilityDescriptor {
        capabilities()
    }

    async fn do_initialize(&self) -> Result<(), PolycastError> {
        require_credentials(PlatformType::Medium, &self.config)
    }

    async fn do_authenticate(&self) -> Result<bool, PolycastError> {
        match self.user_id().await {
            Ok(_) => Ok(true),
            Err(err) if !err.is_transient() => {
                debug!(error = %err, "medium rejected token");
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }

    async fn do_disconnect(&self) -> Result<(), PolycastError> {
        self.user_id.clear();
        Ok(())
    }

    /// Publishes under the `publication_id` setting when present, otherwise
    /// on the author's own profile.
    async fn do_post(&self, content: &ContentItem) -> Result<ActionResult, PolycastError> {
        let path = match self.config.setting_str("publication_id") {
            Some(publication) => format!("/publications/{publication}/posts"),
            None => format!("/users/{}/posts", self.user_id().await?),
        };
        let mut body = json!({
            "title": metadata_str(content, "title").unwrap_or_default(),
            "contentFormat": metadata_str(content, "format").unwrap_or("markdown"),
            "content": content.body,
            "tags": content.tags,
            "publishStatus": self.config.setting_str("publish_status").unwrap_or("public"),
        });
        if let Some(canonical) = metadata_str(content, "canonical_url") {
            body["canonicalUrl"] = json!(canonical);
        }
        let response = self.client.post_json(&path, &body).await?;
        let data = &response["data"];
        Ok(ActionResult::success(json!({
            "id": str_field(data, "/id").ok_or_else(|| malformed(PlatformType::Medium, "data.id"))?,
            "url": data["url"],
            "publish_status": data["publishStatus"],
        })))
    }

    /// Only the authenticated author can be looked up.
    async fn get_profile(&self, user_id: Option<&str>) -> Result<UserProfile, PolycastError> {
        if user_id.is_some() {
            return Err(PolycastError::unsupported(
                PlatformType::Medium,
                "get_profile for other users",
            ));
        }
        let me = self.client.get("/me", &[]).await?;
        let data = &me["data"];
        Ok(UserProfile {
            id: str_field(data, "/id").ok_or_else(|| malformed(PlatformType::Medium, "data.id"))?,
            username: str_field(data, "/username").unwrap_or_default(),
            display_name: str_field(data, "/name"),
            avatar_url: str_field(data, "/imageUrl"),
            url: str_field(data, "/url"),
            ..UserProfile::default()
        })
    }

    /// Posts need a title; replies never reach Medium.
    async fn do_validate_content(&self, content: &ContentItem) -> Result<bool, PolycastError> {
        if content.body_len() > MAX_LENGTH || content.tags.len() > MAX_TAGS {
            return Ok(false);
        }
        Ok(metadata_str(content, "title")
            .is_some_and(|t| !t.trim().is_empty() && t.chars().count() <= MAX_TITLE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polycast_config::AuthKind;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(server: &MockServer) -> AdapterConfig {
        AdapterConfig::new(PlatformType::Medium, "md", AuthKind::Bearer)
            .with_credential("token", "md-token")
            .with_setting("base_url", json!(server.uri()))
    }

    async fn mount_me(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/me"))
            .and(header("authorization", "Bearer md-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"id": "u1", "username": "poly", "name": "Poly Cast", "url": "https://medium.com/@poly"}
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn post_to_own_profile() {
        let server = MockServer::start().await;
        mount_me(&server).await;
        Mock::given(method("POST"))
            .and(path("/users/u1/posts"))
            .and(body_partial_json(json!({
                "title": "Release notes",
                "contentFormat": "markdown",
                "publishStatus": "public",
                "tags": ["rust"]
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "data": {"id": "p9", "url": "https://medium.com/@poly/p9", "publishStatus": "public"}
            })))
            .mount(&server)
            .await;

        let hooks = MediumHooks::new(&config(&server)).unwrap();
        let item = ContentItem::text("# Notes")
            .with_metadata("title", json!("Release notes"))
            .with_tags(["rust"]);
        let result = hooks.do_post(&item).await.unwrap();
        assert_eq!(result.data().unwrap()["id"], "p9");
    }

    #[tokio::test]
    async fn publication_setting_changes_target() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/publications/pub1/posts"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"data": {"id": "p10"}})))
            .expect(1)
            .mount(&server)
            .await;

        let config = config(&server)
            .with_setting("publication_id", json!("pub1"))
            .with_setting("publish_status", json!("draft"));
        let hooks = MediumHooks::new(&config).unwrap();
        let item = ContentItem::text("body").with_metadata("title", json!("T"));
        assert!(hooks.do_post(&item).await.unwrap().is_success());
    }

    #[tokio::test]
    async fn profile_of_authenticated_author() {
        let server = MockServer::start().await;
        mount_me(&server).await;
        let profile = MediumHooks::new(&config(&server))
            .unwrap()
            .get_profile(None)
            .await
            .unwrap();
        assert_eq!(profile.username, "poly");
        assert_eq!(profile.display_name.as_deref(), Some("Poly Cast"));
    }

    #[tokio::test]
    async fn validation_limits_title_and_tags() {
        let server = MockServer::start().await;
        let hooks = MediumHooks::new(&config(&server)).unwrap();

        assert!(!hooks.do_validate_content(&ContentItem::text("untitled")).await.unwrap());
        let too_many = ContentItem::text("b")
            .with_metadata("title", json!("T"))
            .with_tags(["a", "b", "c", "d", "e", "f"]);
        assert!(!hooks.do_validate_content(&too_many).await.unwrap());
        let fine = ContentItem::text("b").with_metadata("title", json!("T"));
        assert!(hooks.do_validate_content(&fine).await.unwrap());
    }
}
