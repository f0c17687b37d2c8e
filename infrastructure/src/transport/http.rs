//! reqwest adapter for [`NodeTransport`]

use super::wire::{ChatBody, ChatResponseBody, NodeHealthBody, OllamaTagsBody};
use super::{ChatReply, ChatRequest, Endpoint, NodeTransport, ProbeReport, TransportError};
use async_trait::async_trait;
use council_domain::NodeApi;
use council_domain::core::string::preview;
use tracing::debug;

/// Header carrying the node-server credential
const API_KEY_HEADER: &str = "X-API-Key";

/// Longest error body kept in a [`TransportError::Status`]
const ERROR_BODY_PREVIEW: usize = 200;

/// HTTP transport speaking the node-server and Ollama dialects
///
/// Timeouts are enforced by callers per attempt; the client itself only
/// bounds connection setup.
#[derive(Debug, Clone)]
pub struct HttpNodeTransport {
    client: reqwest::Client,
}

impl HttpNodeTransport {
    pub fn new() -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("llm-council/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(std::time::Duration::from_secs(10))
            .build()?;
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    fn authorize(
        &self,
        builder: reqwest::RequestBuilder,
        endpoint: &Endpoint,
    ) -> reqwest::RequestBuilder {
        match (&endpoint.api_key, endpoint.api) {
            (Some(key), NodeApi::Node) => builder.header(API_KEY_HEADER, key),
            (Some(key), NodeApi::Ollama) => builder.bearer_auth(key),
            (None, _) => builder,
        }
    }

    async fn checked(response: reqwest::Response) -> Result<reqwest::Response, TransportError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(TransportError::Status {
            status: status.as_u16(),
            body: preview(&body, ERROR_BODY_PREVIEW),
        })
    }
}

#[async_trait]
impl NodeTransport for HttpNodeTransport {
    async fn probe(&self, endpoint: &Endpoint) -> Result<ProbeReport, TransportError> {
        match endpoint.api {
            NodeApi::Node => {
                let url = format!("{}/health", endpoint.base_url);
                let response = self
                    .authorize(self.client.get(&url), endpoint)
                    .send()
                    .await?;
                let body: NodeHealthBody = Self::checked(response).await?.json().await?;
                debug!(node = %endpoint.name, status = %body.status, "Health probe answered");
                Ok(ProbeReport {
                    degraded: (body.status != "ok").then_some(body.status),
                    available_models: body.available_models,
                })
            }
            NodeApi::Ollama => {
                let url = format!("{}/api/tags", endpoint.base_url);
                let response = self
                    .authorize(self.client.get(&url), endpoint)
                    .send()
                    .await?;
                let body: OllamaTagsBody = Self::checked(response).await?.json().await?;
                Ok(ProbeReport {
                    degraded: None,
                    available_models: body.models.into_iter().map(|t| t.name).collect(),
                })
            }
        }
    }

    async fn chat(
        &self,
        endpoint: &Endpoint,
        request: &ChatRequest,
    ) -> Result<ChatReply, TransportError> {
        let (path, stream) = match endpoint.api {
            NodeApi::Node => ("chat", None),
            NodeApi::Ollama => ("api/chat", Some(false)),
        };
        let url = format!("{}/{}", endpoint.base_url, path);
        let body = ChatBody {
            model: &request.model,
            messages: &request.messages,
            options: &request.options,
            stream,
        };

        debug!(node = %endpoint.name, model = %request.model, "POST {}", url);
        let response = self
            .authorize(self.client.post(&url), endpoint)
            .json(&body)
            .send()
            .await?;
        let reply: ChatResponseBody = Self::checked(response).await?.json().await?;

        if let Some(model) = &reply.model
            && model != &request.model
        {
            debug!(
                requested = %request.model,
                answered = %model,
                "Node answered with a different model tag"
            );
        }

        Ok(ChatReply {
            content: reply.message.content,
            node: reply.node,
        })
    }
}
