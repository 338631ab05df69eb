//! A2A agent gateway over HTTP.
//!
//! Implements [`AgentGateway`] by POSTing a `message/stream` request and
//! folding the returned event stream into a single answer.

use crate::a2a::error::{A2aError, Result};
use crate::a2a::protocol::{JsonRpcRequest, JsonRpcResponse, MessageSendParams, STREAM_METHOD};
use crate::a2a::sse::{SseDecoder, SseFrame};
use async_trait::async_trait;
use futures::StreamExt;
use relay_application::{AgentCard, AgentGateway, ExchangeError, ExchangeReply, ExchangeRequest};
use relay_domain::{FoldStep, StreamFold, truncate};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Connection establishment limit; the overall exchange deadline is separate.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Deadline for fetching an agent card.
const DISCOVER_TIMEOUT: Duration = Duration::from_secs(15);

/// Service-token pair sent to an access proxy in front of the agents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessCredentials {
    pub client_id: String,
    pub client_secret: String,
}

/// Gateway that talks A2A JSON-RPC over HTTP.
pub struct A2aAgentGateway {
    client: reqwest::Client,
    access: Option<AccessCredentials>,
    user_agent: String,
}

impl A2aAgentGateway {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            access: None,
            user_agent: format!("cluster-relay/{}", env!("CARGO_PKG_VERSION")),
        })
    }

    /// Attach access-proxy credentials to every request.
    pub fn with_access(mut self, access: Option<AccessCredentials>) -> Self {
        self.access = access;
        self
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let builder = builder.header(reqwest::header::USER_AGENT, &self.user_agent);
        match &self.access {
            Some(access) => builder
                .header("CF-Access-Client-Id", &access.client_id)
                .header("CF-Access-Client-Secret", &access.client_secret),
            None => builder,
        }
    }

    async fn stream_exchange(&self, request: &ExchangeRequest) -> Result<ExchangeReply> {
        let body = JsonRpcRequest::new(
            STREAM_METHOD,
            MessageSendParams::user_text(&request.query, request.context_id.clone()),
        );
        debug!(
            "Sending {} request {} to {}",
            STREAM_METHOD, body.id, request.endpoint
        );

        let response = self
            .authorize(self.client.post(&request.endpoint))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(A2aError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let mut decoder = SseDecoder::new();
        let mut fold = StreamFold::new();
        let mut bytes = response.bytes_stream();

        'read: while let Some(chunk) = bytes.next().await {
            let chunk = chunk.map_err(|e| A2aError::Stream(e.to_string()))?;
            for frame in decoder.push(&chunk) {
                if apply_frame(&mut fold, &frame) == FoldStep::Done {
                    break 'read;
                }
            }
        }
        if !fold.is_done()
            && let Some(frame) = decoder.finish()
        {
            apply_frame(&mut fold, &frame);
        }

        let outcome = fold.finish()?;
        Ok(ExchangeReply {
            text: outcome.text,
            context_id: outcome.context_id,
            events_seen: outcome.events_seen,
            final_state: outcome.final_state,
        })
    }

    async fn fetch_card(&self, endpoint: &str) -> Result<AgentCard> {
        let url = agent_card_url(endpoint);
        let response = self
            .authorize(self.client.get(&url))
            .header(reqwest::header::ACCEPT, "application/json")
            .timeout(DISCOVER_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(A2aError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// Decode one frame into the fold. Undecodable payloads are counted and skipped.
fn apply_frame(fold: &mut StreamFold, frame: &SseFrame) -> FoldStep {
    let event = serde_json::from_str::<JsonRpcResponse>(&frame.data)
        .ok()
        .and_then(JsonRpcResponse::into_stream_event);
    match event {
        Some(event) => fold.push(event),
        None => {
            warn!(
                "Skipping malformed stream event: {}",
                truncate(&frame.data, 100)
            );
            fold.skip_malformed();
            FoldStep::Continue
        }
    }
}

/// Well-known agent card location for an endpoint.
pub fn agent_card_url(endpoint: &str) -> String {
    format!("{}/.well-known/agent.json", endpoint.trim_end_matches('/'))
}

#[async_trait]
impl AgentGateway for A2aAgentGateway {
    async fn exchange(
        &self,
        request: &ExchangeRequest,
        cancel: CancellationToken,
    ) -> std::result::Result<ExchangeReply, ExchangeError> {
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(A2aError::Cancelled),
            outcome = tokio::time::timeout(request.timeout, self.stream_exchange(request)) => {
                outcome.unwrap_or(Err(A2aError::Timeout(request.timeout)))
            }
        };

        match result {
            Ok(reply) => {
                info!(
                    "Exchange with {} finished after {} events",
                    request.endpoint, reply.events_seen
                );
                Ok(reply)
            }
            Err(e) => {
                warn!("Exchange with {} failed: {}", request.endpoint, e);
                Err(e.into())
            }
        }
    }

    async fn discover(&self, endpoint: &str) -> std::result::Result<AgentCard, ExchangeError> {
        self.fetch_card(endpoint).await.map_err(Into::into)
    }
}
