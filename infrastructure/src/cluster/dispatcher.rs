//! Query dispatch: routing, per-attempt timeouts and bounded retries
//!
//! [`QueryDispatcher`] is the distributed implementation of
//! [`CouncilGateway`]. Failures are logged and become `None`; nothing a
//! single node does can abort a fan-out.

use super::context::ClusterContext;
use super::router::HealthRouter;
use crate::transport::{ChatRequest, Endpoint, NodeTransport, TransportError};
use async_trait::async_trait;
use council_application::{
    CouncilGateway, DispatchConfig, FanOutResults, QueryRequest, QueryResult, Target,
};
use council_domain::core::string::preview;
use council_domain::{ArbiterRoute, ChatMessage, CouncilMember, ModelId};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Prompt used by the node connectivity check when none is given
pub const DEFAULT_TEST_PROMPT: &str = "Hello! Please respond with a brief greeting.";

/// Outcome of a successful connectivity check against one node
#[derive(Debug, Clone, Serialize)]
pub struct NodeTestReport {
    pub node: String,
    pub model: ModelId,
    pub prompt: String,
    pub response: String,
    pub elapsed_ms: u64,
}

#[derive(Clone)]
pub struct QueryDispatcher {
    context: Arc<ClusterContext>,
    transport: Arc<dyn NodeTransport>,
    router: Arc<HealthRouter>,
    config: DispatchConfig,
}

impl QueryDispatcher {
    pub fn new(
        context: Arc<ClusterContext>,
        transport: Arc<dyn NodeTransport>,
        config: DispatchConfig,
    ) -> Self {
        let router = Arc::new(HealthRouter::new(
            Arc::clone(&context),
            Arc::clone(&transport),
            config.probe_timeout,
        ));
        Self {
            context,
            transport,
            router,
            config,
        }
    }

    pub fn router(&self) -> &HealthRouter {
        &self.router
    }

    pub fn context(&self) -> &Arc<ClusterContext> {
        &self.context
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Resolve where a request goes and how long each attempt may take.
    ///
    /// Timeout precedence: request, then node, then dispatcher default.
    fn resolve(&self, request: &QueryRequest) -> Result<(Endpoint, Duration), TransportError> {
        match &request.target {
            Target::Routed => {
                let node = self
                    .router
                    .resolve_node_for_model(request.model.as_str())
                    .ok_or_else(|| TransportError::NoRoute(request.model.to_string()))?;
                let timeout = request.timeout.unwrap_or_else(|| node.timeout());
                Ok((Endpoint::for_node(&node), timeout))
            }
            Target::Node(name) => {
                let registry = self.context.registry();
                let node = registry
                    .get(name)
                    .ok_or_else(|| TransportError::UnknownNode(name.clone()))?;
                let timeout = request.timeout.unwrap_or_else(|| node.timeout());
                Ok((Endpoint::for_node(node), timeout))
            }
            Target::Endpoint(url) => Ok((
                Endpoint::raw(url.as_str()),
                request.timeout.unwrap_or(self.config.default_timeout),
            )),
        }
    }

    /// Like [`CouncilGateway::query_one`], but reports why the request failed
    pub async fn try_query(
        &self,
        request: &QueryRequest,
        messages: &[ChatMessage],
    ) -> Result<QueryResult, TransportError> {
        let (endpoint, timeout) = self.resolve(request)?;
        let chat = ChatRequest::new(request.model.as_str(), messages.to_vec());
        let attempts = self.config.attempts();
        let mut attempt = 1;

        loop {
            debug!(
                "Querying model {} on {} (attempt {}/{})",
                request.model, endpoint.name, attempt, attempts
            );

            let outcome = match tokio::time::timeout(timeout, self.transport.chat(&endpoint, &chat))
                .await
            {
                Ok(result) => result,
                Err(_) => Err(TransportError::Timeout),
            };

            let error = match outcome {
                Ok(reply) => {
                    debug!(
                        "Response from {} on {}: {}",
                        request.model,
                        endpoint.name,
                        preview(&reply.content, 100)
                    );
                    return Ok(QueryResult {
                        content: reply.content,
                        node: endpoint.name.clone(),
                        model: request.model.clone(),
                    });
                }
                Err(e) => e,
            };

            warn!(
                "Error querying {} on {}: {}",
                request.model, endpoint.name, error
            );
            if attempt >= attempts || !error.is_retryable() {
                return Err(error);
            }
            attempt += 1;
            tokio::time::sleep(self.config.retry_delay).await;
        }
    }

    /// Send a short prompt to a named node and time the answer
    pub async fn test_node(
        &self,
        name: &str,
        model: Option<&str>,
        prompt: Option<&str>,
    ) -> Result<NodeTestReport, TransportError> {
        let registry = self.context.registry();
        let node = registry
            .list_enabled()
            .find(|node| node.name == name)
            .ok_or_else(|| TransportError::UnknownNode(name.to_string()))?;
        let model = match model {
            Some(model) => ModelId::new(model),
            None => node
                .models
                .first()
                .cloned()
                .ok_or_else(|| {
                    TransportError::NoRoute(format!("no model configured on {}", name))
                })?,
        };
        let prompt = prompt.unwrap_or(DEFAULT_TEST_PROMPT).to_string();

        let request = QueryRequest::on_node(model.clone(), node.name.clone());
        let started = Instant::now();
        let result = self
            .try_query(&request, &[ChatMessage::user(prompt.as_str())])
            .await?;

        Ok(NodeTestReport {
            node: result.node,
            model,
            prompt,
            response: result.content,
            elapsed_ms: started.elapsed().as_millis() as u64,
        })
    }
}

#[async_trait]
impl CouncilGateway for QueryDispatcher {
    fn council(&self) -> Vec<CouncilMember> {
        self.context.registry().council_members()
    }

    fn arbiter(&self) -> Option<ArbiterRoute> {
        self.context.registry().resolve_arbiter()
    }

    async fn query_one(
        &self,
        request: &QueryRequest,
        messages: &[ChatMessage],
    ) -> Option<QueryResult> {
        match self.try_query(request, messages).await {
            Ok(result) => Some(result),
            Err(e) => {
                warn!("Giving up on model {}: {}", request.model, e);
                None
            }
        }
    }

    async fn query_many_parallel(
        &self,
        requests: Vec<QueryRequest>,
        messages: &[ChatMessage],
    ) -> FanOutResults {
        let models: Vec<ModelId> = requests.iter().map(|r| r.model.clone()).collect();
        let mut slots: Vec<Option<QueryResult>> = vec![None; requests.len()];
        let messages: Arc<[ChatMessage]> = Arc::from(messages);

        let mut join_set = JoinSet::new();
        for (index, request) in requests.into_iter().enumerate() {
            let dispatcher = self.clone();
            let messages = Arc::clone(&messages);
            join_set.spawn(async move {
                let result = dispatcher.query_one(&request, &messages).await;
                (index, result)
            });
        }

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, result)) => slots[index] = result,
                Err(e) => warn!("Task join error: {}", e),
            }
        }

        let answered = slots.iter().filter(|s| s.is_some()).count();
        info!("Fan-out complete: {}/{} answered", answered, slots.len());

        models.into_iter().zip(slots).collect()
    }

    async fn query_arbiter(&self, messages: &[ChatMessage]) -> Option<QueryResult> {
        let Some(route) = self.arbiter() else {
            warn!("No arbiter configured");
            return None;
        };
        let request = QueryRequest::on_node(route.model, route.node);
        self.query_one(&request, messages).await
    }
}
