use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    error::{ProcureError, Result},
    models::{
        AnalysisRequest, ChatMessage, ConversationSummary, CreateConversationRequest,
        CreatedConversation, ErrorBody, HealthStatus, LoginRequest, LoginResponse,
        PostMessageRequest, ProcurementReport, RegisterRequest, Sender, UserIdentity,
        Vendor, VendorSearchRequest, VendorSearchResponse,
    },
};

/// Header carrying a per-request id the backend can log against
pub const CORRELATION_HEADER: &str = "x-correlation-id";

/// Every backend endpoint the session depends on
#[async_trait]
pub trait ProcurementBackend: Send + Sync {
    async fn analyze(&self, query: &str) -> Result<ProcurementReport>;
    async fn search_vendors(&self, material: &str, location: Option<&str>) -> Result<Vec<Vendor>>;
    async fn health(&self) -> Result<HealthStatus>;
    async fn login(&self, email: &str, password: &str) -> Result<UserIdentity>;
    async fn register(&self, request: &RegisterRequest) -> Result<()>;
    async fn list_conversations(&self, user_id: &str) -> Result<Vec<ConversationSummary>>;
    async fn create_conversation(&self, user_id: &str, title: &str)
    -> Result<CreatedConversation>;
    async fn list_messages(&self, conversation_id: &str) -> Result<Vec<ChatMessage>>;
    async fn post_message(&self, conversation_id: &str, sender: Sender, text: &str) -> Result<()>;
}

/// `ProcurementBackend` over HTTP/JSON
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProcureError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let correlation_id = Uuid::new_v4().to_string();
        let response = request
            .header(CORRELATION_HEADER, &correlation_id)
            .send()
            .await?;

        let status = response.status();
        debug!(%correlation_id, status = status.as_u16(), url = %response.url(), "Backend responded");

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ErrorBody>(&body) {
            Ok(parsed) => parsed.error,
            Err(_) => match status.canonical_reason() {
                Some(reason) => format!("Request failed with status {} {}", status.as_u16(), reason),
                None => format!("Request failed with status {}", status.as_u16()),
            },
        };
        warn!(%correlation_id, status = status.as_u16(), %message, "Backend request failed");

        Err(ProcureError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = self.send(request).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes)
            .map_err(|e| ProcureError::Decode(format!("unexpected response body: {e}")))
    }
}

#[async_trait]
impl ProcurementBackend for HttpBackend {
    async fn analyze(&self, query: &str) -> Result<ProcurementReport> {
        let body = AnalysisRequest {
            query: query.to_string(),
        };
        self.send_json(self.client.post(self.url("/procurement")).json(&body))
            .await
    }

    async fn search_vendors(&self, material: &str, location: Option<&str>) -> Result<Vec<Vendor>> {
        let body = VendorSearchRequest {
            material: material.to_string(),
            location: location.map(str::to_string),
        };
        let response: VendorSearchResponse = self
            .send_json(self.client.post(self.url("/search_vendors")).json(&body))
            .await?;
        Ok(response.vendors)
    }

    async fn health(&self) -> Result<HealthStatus> {
        self.send_json(self.client.get(self.url("/health"))).await
    }

    async fn login(&self, email: &str, password: &str) -> Result<UserIdentity> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response: LoginResponse = self
            .send_json(self.client.post(self.url("/login")).json(&body))
            .await?;
        Ok(response.user)
    }

    async fn register(&self, request: &RegisterRequest) -> Result<()> {
        self.send(self.client.post(self.url("/register")).json(request))
            .await?;
        Ok(())
    }

    async fn list_conversations(&self, user_id: &str) -> Result<Vec<ConversationSummary>> {
        self.send_json(
            self.client
                .get(self.url("/conversations"))
                .query(&[("user_id", user_id)]),
        )
        .await
    }

    async fn create_conversation(
        &self,
        user_id: &str,
        title: &str,
    ) -> Result<CreatedConversation> {
        let body = CreateConversationRequest {
            user_id: user_id.to_string(),
            title: title.to_string(),
        };
        self.send_json(self.client.post(self.url("/conversations")).json(&body))
            .await
    }

    async fn list_messages(&self, conversation_id: &str) -> Result<Vec<ChatMessage>> {
        let path = format!("/conversations/{conversation_id}/messages");
        self.send_json(self.client.get(self.url(&path))).await
    }

    async fn post_message(&self, conversation_id: &str, sender: Sender, text: &str) -> Result<()> {
        let path = format!("/conversations/{conversation_id}/messages");
        let body = PostMessageRequest {
            sender,
            text: text.to_string(),
        };
        self.send(self.client.post(self.url(&path)).json(&body))
            .await?;
        Ok(())
    }
}
