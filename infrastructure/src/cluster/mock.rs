//! Scripted transport for cluster tests

use crate::transport::{
    ChatReply, ChatRequest, Endpoint, NodeTransport, ProbeReport, TransportError,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

type ChatScript =
    Box<dyn Fn(&Endpoint, &ChatRequest) -> Result<ChatReply, TransportError> + Send + Sync>;

pub(crate) struct MockTransport {
    probes: HashMap<String, Result<ProbeReport, TransportError>>,
    chat: ChatScript,
    delay: Option<Duration>,
    pub(crate) chat_calls: Mutex<Vec<(String, String)>>,
}

impl MockTransport {
    /// Every chat call answers `"<model> on <endpoint>"`
    pub(crate) fn echo() -> Self {
        Self::scripted(|endpoint: &Endpoint, request: &ChatRequest| {
            Ok(ChatReply {
                content: format!("{} on {}", request.model, endpoint.name),
                node: None,
            })
        })
    }

    pub(crate) fn scripted<F>(chat: F) -> Self
    where
        F: Fn(&Endpoint, &ChatRequest) -> Result<ChatReply, TransportError> + Send + Sync + 'static,
    {
        Self {
            probes: HashMap::new(),
            chat: Box::new(chat),
            delay: None,
            chat_calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn with_probe(
        mut self,
        node: &str,
        report: Result<ProbeReport, TransportError>,
    ) -> Self {
        self.probes.insert(node.to_string(), report);
        self
    }

    /// Every transport call sleeps this long first
    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn calls(&self) -> Vec<(String, String)> {
        self.chat_calls.lock().unwrap().clone()
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

pub(crate) fn up(models: &[&str]) -> Result<ProbeReport, TransportError> {
    Ok(ProbeReport {
        degraded: None,
        available_models: models.iter().map(|m| m.to_string()).collect(),
    })
}

#[async_trait]
impl NodeTransport for MockTransport {
    async fn probe(&self, endpoint: &Endpoint) -> Result<ProbeReport, TransportError> {
        self.pause().await;
        self.probes
            .get(&endpoint.name)
            .cloned()
            .unwrap_or_else(|| Err(TransportError::Connection("connection refused".into())))
    }

    async fn chat(
        &self,
        endpoint: &Endpoint,
        request: &ChatRequest,
    ) -> Result<ChatReply, TransportError> {
        self.chat_calls
            .lock()
            .unwrap()
            .push((endpoint.name.clone(), request.model.clone()));
        self.pause().await;
        (self.chat)(endpoint, request)
    }
}
