use super::types::{
    AgentStatus, FeedEnvelope, PostReceipt, ProfileEnvelope, RegistrationReceipt,
};
use crate::error::PlatformError;
use crate::http::build_client;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

/// Client for the platform's agent API. Everything is outbound: the agent
/// never accepts inbound requests.
pub struct PlatformClient {
    base_url: String,
    api_key: Option<String>,
    client: Client,
}

impl PlatformClient {
    pub fn new(base_url: &str, api_key: Option<&str>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.map(ToString::to_string),
            client: build_client(),
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    // ── Read endpoints ──────────────────────────────────────────────────

    pub async fn agent_status(&self) -> Result<AgentStatus, PlatformError> {
        self.get_json("agents/status", &[]).await
    }

    /// Personalized feed (subscriptions + follows).
    pub async fn feed(&self, limit: u32) -> Result<FeedEnvelope, PlatformError> {
        self.get_json("feed", &[("sort", "new".into()), ("limit", limit.to_string())])
            .await
    }

    /// Global posts feed; fallback when the personalized feed is denied.
    pub async fn posts(&self, sort: &str, limit: u32) -> Result<FeedEnvelope, PlatformError> {
        self.get_json(
            "posts",
            &[("sort", sort.to_string()), ("limit", limit.to_string())],
        )
        .await
    }

    pub async fn search(
        &self,
        query: &str,
        kind: &str,
        limit: u32,
    ) -> Result<FeedEnvelope, PlatformError> {
        self.get_json(
            "search",
            &[
                ("q", query.to_string()),
                ("type", kind.to_string()),
                ("limit", limit.to_string()),
            ],
        )
        .await
    }

    pub async fn profile(&self) -> Result<ProfileEnvelope, PlatformError> {
        self.get_json("agents/me", &[]).await
    }

    // ── Side-effecting endpoints ────────────────────────────────────────

    pub async fn create_post(
        &self,
        submolt: &str,
        title: &str,
        content: &str,
    ) -> Result<PostReceipt, PlatformError> {
        let body = serde_json::json!({
            "submolt": submolt,
            "title": title,
            "content": content,
        });
        let response = self.send(self.post_builder("posts").json(&body)).await?;
        decode(response).await
    }

    pub async fn create_comment(
        &self,
        post_id: &str,
        content: &str,
    ) -> Result<(), PlatformError> {
        let body = serde_json::json!({ "content": content });
        self.send(
            self.post_builder(&format!("posts/{post_id}/comments"))
                .json(&body),
        )
        .await?;
        Ok(())
    }

    pub async fn upvote(&self, post_id: &str) -> Result<(), PlatformError> {
        self.send(self.post_builder(&format!("posts/{post_id}/upvote")))
            .await?;
        Ok(())
    }

    /// Submit the answer to a verification challenge.
    pub async fn verify_post(&self, code: &str, answer: &str) -> Result<(), PlatformError> {
        let body = serde_json::json!({
            "verification_code": code,
            "answer": answer,
        });
        self.send(self.post_builder("verify").json(&body)).await?;
        Ok(())
    }

    /// Register a new agent. The only endpoint that needs no API key.
    pub async fn register(
        &self,
        name: &str,
        description: &str,
    ) -> Result<RegistrationReceipt, PlatformError> {
        let body = serde_json::json!({ "name": name, "description": description });
        let response = self
            .send(self.post_builder("agents/register").json(&body))
            .await?;
        decode(response).await
    }

    // ── Request plumbing ────────────────────────────────────────────────

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    fn post_builder(&self, path: &str) -> RequestBuilder {
        self.authed(self.client.post(self.url(path)))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, PlatformError> {
        let mut builder = self.authed(self.client.get(self.url(path)));
        if !query.is_empty() {
            builder = builder.query(query);
        }
        let response = self.send(builder).await?;
        decode(response).await
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, PlatformError> {
        let response = builder.send().await?;
        check_status(response).await
    }
}

/// Classify non-success responses so callers can branch on error class.
async fn check_status(response: Response) -> Result<Response, PlatformError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|e| format!("<failed to read response body: {e}>"));

    Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => PlatformError::Auth(body),
        StatusCode::TOO_MANY_REQUESTS => PlatformError::RateLimited { body },
        // Some deployments attach retry hints to 400-class errors.
        _ if body.contains("retry_after") => PlatformError::RateLimited { body },
        _ => PlatformError::Api {
            status: status.as_u16(),
            body,
        },
    })
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, PlatformError> {
    response
        .json()
        .await
        .map_err(|e| PlatformError::Decode(e.to_string()))
}
