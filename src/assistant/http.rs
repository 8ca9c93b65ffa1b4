//! HTTP implementation of the Assistants API contract
//!
//! Thin wrapper over `reqwest` that issues one authenticated request per
//! operation. Every request carries the bearer credential and the protocol
//! version header the Assistants v2 API requires. The client holds no
//! mutable state; sequencing lives in the orchestrator.

use super::{AssistantApi, AssistantError, Result, RunSnapshot};
use crate::secrets::SecretString;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

/// Fixed protocol version header required by the Assistants v2 API
const BETA_HEADER_NAME: &str = "OpenAI-Beta";
const BETA_HEADER_VALUE: &str = "assistants=v2";

/// Authenticated client for the remote Assistants API
pub struct AssistantClient {
    base_url: String,
    assistant_id: String,
    api_key: SecretString,
    client: reqwest::Client,
}

impl AssistantClient {
    /// Create a client for the given API endpoint and assistant.
    pub fn new(
        base_url: impl Into<String>,
        assistant_id: impl Into<String>,
        api_key: SecretString,
    ) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            assistant_id: assistant_id.into(),
            api_key,
            client: reqwest::Client::new(),
        }
    }

    /// Send one request and parse the 2xx body into `T`.
    ///
    /// Non-2xx responses become [`AssistantError::Api`] carrying the remote
    /// `error.message` when the body has one, else the HTTP status text.
    async fn send<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: reqwest::RequestBuilder,
    ) -> Result<T> {
        let response = request
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.unsecure()),
            )
            .header(BETA_HEADER_NAME, BETA_HEADER_VALUE)
            .send()
            .await
            .map_err(|e| AssistantError::Network {
                operation,
                detail: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ApiErrorBody>()
                .await
                .ok()
                .and_then(|body| body.error)
                .and_then(|detail| detail.message)
                .unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("unknown error")
                        .to_string()
                });
            return Err(AssistantError::Api {
                operation,
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| AssistantError::Malformed {
                operation,
                detail: e.to_string(),
            })
    }
}

#[async_trait]
impl AssistantApi for AssistantClient {
    async fn create_thread(&self) -> Result<String> {
        let url = format!("{}/threads", self.base_url);
        let thread: ThreadObject = self
            .send("create-thread", self.client.post(&url).json(&json!({})))
            .await?;
        Ok(thread.id)
    }

    async fn post_user_message(&self, thread_id: &str, text: &str) -> Result<()> {
        let url = format!("{}/threads/{}/messages", self.base_url, thread_id);
        let payload = json!({ "role": "user", "content": text });
        // The created message object is not needed for subsequent steps.
        let _: serde_json::Value = self
            .send("post-message", self.client.post(&url).json(&payload))
            .await?;
        Ok(())
    }

    async fn create_run(&self, thread_id: &str) -> Result<RunSnapshot> {
        let url = format!("{}/threads/{}/runs", self.base_url, thread_id);
        let payload = json!({ "assistant_id": self.assistant_id });
        self.send("create-run", self.client.post(&url).json(&payload))
            .await
    }

    async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<RunSnapshot> {
        let url = format!("{}/threads/{}/runs/{}", self.base_url, thread_id, run_id);
        self.send("get-run-status", self.client.get(&url)).await
    }

    async fn latest_assistant_text(&self, thread_id: &str) -> Result<String> {
        let url = format!(
            "{}/threads/{}/messages?order=desc&limit=1",
            self.base_url, thread_id
        );
        let list: MessageList = self
            .send("list-latest-message", self.client.get(&url))
            .await?;
        extract_first_text(list)
    }
}

/// Pull the first text segment out of a "newest first, limit one" listing.
fn extract_first_text(list: MessageList) -> Result<String> {
    let operation = "list-latest-message";
    let message = list
        .data
        .into_iter()
        .next()
        .ok_or(AssistantError::Malformed {
            operation,
            detail: "empty message list".to_string(),
        })?;
    let part = message
        .content
        .into_iter()
        .next()
        .ok_or(AssistantError::Malformed {
            operation,
            detail: "message has no content parts".to_string(),
        })?;
    let segment = part.text.ok_or(AssistantError::Malformed {
        operation,
        detail: "first content part has no text segment".to_string(),
    })?;
    Ok(segment.value)
}

#[derive(Deserialize)]
struct ThreadObject {
    id: String,
}

#[derive(Deserialize)]
struct MessageList {
    #[serde(default)]
    data: Vec<ThreadMessage>,
}

#[derive(Deserialize)]
struct ThreadMessage {
    #[serde(default)]
    content: Vec<ContentPart>,
}

#[derive(Deserialize)]
struct ContentPart {
    #[serde(default)]
    text: Option<TextSegment>,
}

#[derive(Deserialize)]
struct TextSegment {
    value: String,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: Option<ApiErrorDetail>,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: Option<String>,
}
