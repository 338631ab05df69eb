//! Planning oracle reached over HTTP.
//!
//! The oracle receives a [`PlanRequest`] as JSON and answers with
//! `{"subqueries": [{"cluster": ..., "query": ...}]}`. Answers wrapped in a
//! fenced ```json block (as language-model backed planners tend to produce)
//! are accepted too.

use crate::a2a::AccessCredentials;
use async_trait::async_trait;
use relay_application::{PlanRequest, PlanResponse, PlannerError, PlanningOracle};
use relay_domain::{parse_plan, truncate};
use std::time::Duration;
use tracing::debug;

pub struct HttpPlanningOracle {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
    access: Option<AccessCredentials>,
}

impl HttpPlanningOracle {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            timeout,
            access: None,
        }
    }

    pub fn with_access(mut self, access: Option<AccessCredentials>) -> Self {
        self.access = access;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn map_transport(&self, err: reqwest::Error) -> PlannerError {
        if err.is_timeout() {
            PlannerError::TimedOut(self.timeout)
        } else {
            PlannerError::Unavailable(err.to_string())
        }
    }
}

#[async_trait]
impl PlanningOracle for HttpPlanningOracle {
    async fn plan(&self, request: &PlanRequest) -> Result<PlanResponse, PlannerError> {
        debug!(
            "Requesting plan for {} of {} clusters from {}",
            request.candidates.len(),
            request.clusters.len(),
            self.url
        );

        let mut builder = self.client.post(&self.url).timeout(self.timeout).json(request);
        if let Some(access) = &self.access {
            builder = builder
                .header("CF-Access-Client-Id", &access.client_id)
                .header("CF-Access-Client-Secret", &access.client_secret);
        }

        let response = builder.send().await.map_err(|e| self.map_transport(e))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| self.map_transport(e))?;
        if !status.is_success() {
            return Err(PlannerError::Unavailable(format!(
                "HTTP {}: {}",
                status.as_u16(),
                truncate(&body, 200)
            )));
        }

        parse_plan(&body)
            .map(|subqueries| PlanResponse { subqueries })
            .ok_or_else(|| PlannerError::InvalidResponse(truncate(&body, 200)))
    }

    fn name(&self) -> &str {
        "http"
    }
}
