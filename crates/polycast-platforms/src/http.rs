// SPDX-FileCopyrightText: 2026 Polycast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared REST client for platform collaborators.
//!
//! Handles authentication headers, URL and body encoding, and the mapping of
//! HTTP failures onto [`PolycastError::Platform`]. Throttling (429) and server
//! errors (5xx) are marked transient so the adapter's retry policy can act on
//! them; everything else is permanent.

use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use polycast_config::AdapterConfig;
use polycast_core::{PlatformType, PolycastError};
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode, Url};
use serde_json::Value;
use tracing::debug;

use crate::oauth1::{OAuth1Credentials, encode};

const USER_AGENT: &str = concat!("polycast/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// How requests are authenticated.
#[derive(Debug, Clone)]
pub enum Auth {
    None,
    Bearer(String),
    /// `Authorization: Bot <token>`.
    Bot(String),
    Basic { username: String, password: String },
    OAuth1(OAuth1Credentials),
}

/// Request payload.
pub enum Body<'a> {
    Empty,
    Json(&'a Value),
    Form(&'a [(&'a str, String)]),
}

/// A decoded response.
#[derive(Debug)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// `Value::Null` for an empty body.
    pub body: Value,
}

impl ApiResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Returns true for HTTP status codes worth retrying.
pub fn is_transient_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Thin `reqwest` wrapper bound to one service and one credential set.
pub struct RestClient {
    http: reqwest::Client,
    platform: PlatformType,
    base_url: String,
    auth: RwLock<Auth>,
}

impl RestClient {
    /// Build a client for `platform`.
    ///
    /// The `base_url` setting in `config` overrides `default_base_url`.
    pub fn new(
        platform: PlatformType,
        default_base_url: &str,
        config: &AdapterConfig,
        auth: Auth,
        extra_headers: &[(&'static str, &str)],
    ) -> Result<Self, PolycastError> {
        let mut headers = HeaderMap::new();
        headers.insert(header::USER_AGENT, HeaderValue::from_static(USER_AGENT));
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        for (name, value) in extra_headers {
            let value = HeaderValue::from_str(value).map_err(|e| {
                PolycastError::Config(format!("invalid {platform} header {name}: {e}"))
            })?;
            headers.insert(HeaderName::from_static(name), value);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| PolycastError::Platform {
                message: format!("failed to build HTTP client: {e}"),
                transient: false,
                source: Some(Box::new(e)),
            })?;

        let base_url = config
            .setting_str("base_url")
            .unwrap_or(default_base_url)
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            http,
            platform,
            base_url,
            auth: RwLock::new(auth),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Swap credentials, e.g. after a token exchange.
    pub fn set_auth(&self, auth: Auth) {
        *self.auth.write().unwrap_or_else(PoisonError::into_inner) = auth;
    }

    pub async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Value, PolycastError> {
        Ok(self.send(Method::GET, path, query, Body::Empty).await?.body)
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> Result<Value, PolycastError> {
        Ok(self.send(Method::POST, path, &[], Body::Json(body)).await?.body)
    }

    pub async fn post_form(
        &self,
        path: &str,
        form: &[(&str, String)],
    ) -> Result<Value, PolycastError> {
        Ok(self.send(Method::POST, path, &[], Body::Form(form)).await?.body)
    }

    pub async fn delete(&self, path: &str) -> Result<Value, PolycastError> {
        Ok(self.send(Method::DELETE, path, &[], Body::Empty).await?.body)
    }

    /// Send one request against `base_url + path`.
    ///
    /// `path` may also be an absolute URL, for services that split auth and
    /// API hosts.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Body<'_>,
    ) -> Result<ApiResponse, PolycastError> {
        let endpoint = if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}{path}", self.base_url)
        };
        let mut url = Url::parse(&endpoint)
            .map_err(|e| PolycastError::Config(format!("invalid URL {endpoint}: {e}")))?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }

        let mut request = self.http.request(method.clone(), url.clone());
        let authorization = self.authorization(&method, &endpoint, query, &body);
        if let Some(value) = authorization {
            request = request.header(header::AUTHORIZATION, value);
        }
        request = match body {
            Body::Empty => request,
            Body::Json(value) => request.json(value),
            Body::Form(form) => request
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(encode_form(form)),
        };

        let response = request.send().await.map_err(|e| PolycastError::Platform {
            message: format!("{} request failed: {e}", self.platform),
            transient: e.is_timeout() || e.is_connect(),
            source: Some(Box::new(e)),
        })?;

        let status = response.status();
        let headers = response.headers().clone();
        debug!(platform = %self.platform, %method, path = url.path(), %status, "response received");

        let text = response.text().await.map_err(|e| PolycastError::Platform {
            message: format!("failed to read {} response body: {e}", self.platform),
            transient: true,
            source: Some(Box::new(e)),
        })?;

        if !status.is_success() {
            return Err(PolycastError::Platform {
                message: format!("{} returned {status}: {}", self.platform, error_detail(&text)),
                transient: is_transient_status(status),
                source: None,
            });
        }

        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).map_err(|e| PolycastError::Platform {
                message: format!("failed to parse {} response: {e}", self.platform),
                transient: false,
                source: Some(Box::new(e)),
            })?
        };

        Ok(ApiResponse {
            status,
            headers,
            body,
        })
    }

    fn authorization(
        &self,
        method: &Method,
        endpoint: &str,
        query: &[(&str, String)],
        body: &Body<'_>,
    ) -> Option<String> {
        let auth = self.auth.read().unwrap_or_else(PoisonError::into_inner);
        match &*auth {
            Auth::None => None,
            Auth::Bearer(token) => Some(format!("Bearer {token}")),
            Auth::Bot(token) => Some(format!("Bot {token}")),
            Auth::Basic { username, password } => Some(format!(
                "Basic {}",
                STANDARD.encode(format!("{username}:{password}"))
            )),
            Auth::OAuth1(credentials) => {
                let mut params: Vec<(String, String)> = query
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.clone()))
                    .collect();
                if let Body::Form(form) = body {
                    params.extend(form.iter().map(|(k, v)| (k.to_string(), v.clone())));
                }
                Some(credentials.authorize(method.as_str(), endpoint, &params))
            }
        }
    }
}

fn encode_form(form: &[(&str, String)]) -> String {
    form.iter()
        .map(|(k, v)| format!("{}={}", encode(k), encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Pull a human-readable message out of an error body.
fn error_detail(text: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(text) else {
        return text.chars().take(200).collect();
    };
    for key in ["message", "error_description", "detail", "error"] {
        if let Some(message) = value.get(key).and_then(Value::as_str) {
            return message.to_string();
        }
    }
    if let Some(message) = value
        .pointer("/errors/0/message")
        .and_then(Value::as_str)
    {
        return message.to_string();
    }
    text.chars().take(200).collect()
}

/// Read a string field, accepting numbers as well (IDs are often numeric).
pub(crate) fn str_field(value: &Value, pointer: &str) -> Option<String> {
    match value.pointer(pointer)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub(crate) fn u64_field(value: &Value, pointer: &str) -> Option<u64> {
    value.pointer(pointer).and_then(Value::as_u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use polycast_config::AuthKind;
    use serde_json::json;
    use wiremock::matchers::{body_string, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer, auth: Auth) -> RestClient {
        let config = AdapterConfig::new(PlatformType::Github, "gh", AuthKind::Bearer)
            .with_setting("base_url", json!(server.uri()));
        RestClient::new(PlatformType::Github, "https://unused.invalid", &config, auth, &[]).unwrap()
    }

    #[tokio::test]
    async fn bearer_get_with_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", "rust lang"))
            .and(header("authorization", "Bearer t0k"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"total": 1})))
            .mount(&server)
            .await;

        let body = client(&server, Auth::Bearer("t0k".into()))
            .get("/search", &[("q", "rust lang".into())])
            .await
            .unwrap();
        assert_eq!(body["total"], 1);
    }

    #[tokio::test]
    async fn form_body_is_url_encoded() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(header("authorization", "Basic aWQ6c2VjcmV0"))
            .and(body_string("grant_type=password&username=a%20b"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "x"})))
            .mount(&server)
            .await;

        let auth = Auth::Basic {
            username: "id".into(),
            password: "secret".into(),
        };
        let body = client(&server, auth)
            .post_form(
                "/token",
                &[("grant_type", "password".into()), ("username", "a b".into())],
            )
            .await
            .unwrap();
        assert_eq!(body["access_token"], "x");
    }

    #[tokio::test]
    async fn server_errors_are_transient() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_json(json!({"message": "overloaded"})))
            .mount(&server)
            .await;

        let err = client(&server, Auth::None).get("/x", &[]).await.unwrap_err();
        assert!(err.is_transient());
        assert!(err.to_string().contains("overloaded"), "got {err}");
    }

    #[tokio::test]
    async fn client_errors_are_permanent() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(404).set_body_string("gone"))
            .mount(&server)
            .await;

        let err = client(&server, Auth::None).delete("/x").await.unwrap_err();
        assert!(!err.is_transient());
        assert!(err.to_string().contains("404"), "got {err}");
    }

    #[tokio::test]
    async fn empty_body_is_null() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let body = client(&server, Auth::Bot("b".into())).delete("/x").await.unwrap();
        assert!(body.is_null());
    }

    #[test]
    fn error_detail_prefers_message_fields() {
        assert_eq!(error_detail(r#"{"message":"Bad credentials"}"#), "Bad credentials");
        assert_eq!(
            error_detail(r#"{"errors":[{"message":"nope"}]}"#),
            "nope"
        );
        assert_eq!(error_detail("plain"), "plain");
    }
}
