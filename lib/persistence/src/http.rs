//! REST client for the flow service.
//!
//! Endpoints, relative to the configured base URL:
//!
//! | Operation     | Request              | Response          |
//! |---------------|----------------------|-------------------|
//! | `load_flow`   | `GET /flows/{id}`    | wire document     |
//! | `create_flow` | `POST /flows`        | `{"id": "..."}`   |
//! | `update_flow` | `PUT /flows/{id}`    | ignored           |
//! | `delete_flow` | `DELETE /flows/{id}` | ignored           |

use crate::client::FlowPersistenceClient;
use crate::config::PersistenceConfig;
use crate::error::PersistenceError;
use async_trait::async_trait;
use callflow_core::FlowId;
use callflow_graph::WireFlow;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

/// Response body of `POST /flows`.
#[derive(Debug, Deserialize)]
struct CreatedFlow {
    #[serde(alias = "conversation_flow_id", alias = "flow_id")]
    id: String,
}

/// [`FlowPersistenceClient`] backed by the flow service's REST API.
#[derive(Debug, Clone)]
pub struct HttpFlowClient {
    client: Client,
    base_url: String,
    api_token: Option<String>,
}

impl HttpFlowClient {
    /// Creates a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the base URL is blank or the HTTP client
    /// can't be built.
    pub fn new(config: &PersistenceConfig) -> Result<Self, PersistenceError> {
        let base_url = config.base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(PersistenceError::InvalidConfig {
                reason: "base_url must not be empty".to_string(),
            });
        }

        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| PersistenceError::InvalidConfig {
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            base_url,
            api_token: config.api_token.clone().filter(|t| !t.is_empty()),
        })
    }

    fn collection_url(&self) -> String {
        format!("{}/flows", self.base_url)
    }

    fn flow_url(&self, flow_id: &FlowId) -> String {
        format!("{}/flows/{}", self.base_url, flow_id)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn load_request(&self, flow_id: &FlowId) -> RequestBuilder {
        self.authorize(self.client.get(self.flow_url(flow_id)))
    }

    fn create_request(&self, flow: &WireFlow) -> RequestBuilder {
        self.authorize(self.client.post(self.collection_url()).json(flow))
    }

    fn update_request(&self, flow_id: &FlowId, flow: &WireFlow) -> RequestBuilder {
        self.authorize(self.client.put(self.flow_url(flow_id)).json(flow))
    }

    fn delete_request(&self, flow_id: &FlowId) -> RequestBuilder {
        self.authorize(self.client.delete(self.flow_url(flow_id)))
    }

    /// Sends a request and checks its status.
    async fn send(
        &self,
        request: RequestBuilder,
        url: &str,
        flow_id: Option<&FlowId>,
    ) -> Result<Response, PersistenceError> {
        let response = request.send().await.map_err(|e| {
            warn!(error = %e, endpoint = %url, "flow service request failed");
            if e.is_timeout() {
                PersistenceError::Timeout {
                    endpoint: url.to_string(),
                }
            } else {
                PersistenceError::Transport {
                    reason: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            if let Some(flow_id) = flow_id {
                return Err(PersistenceError::NotFound {
                    flow_id: flow_id.clone(),
                });
            }
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                endpoint = %url,
                status = %status,
                body = %body,
                "flow service returned error"
            );
            return Err(PersistenceError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl FlowPersistenceClient for HttpFlowClient {
    #[instrument(skip_all, fields(flow_id = %flow_id))]
    async fn load_flow(&self, flow_id: &FlowId) -> Result<WireFlow, PersistenceError> {
        let url = self.flow_url(flow_id);
        let response = self
            .send(self.load_request(flow_id), &url, Some(flow_id))
            .await?;
        let flow: WireFlow = response.json().await.map_err(|e| {
            warn!(error = %e, endpoint = %url, "failed to decode flow document");
            PersistenceError::Decode {
                reason: e.to_string(),
            }
        })?;
        debug!(node_count = flow.nodes.len(), "loaded flow");
        Ok(flow)
    }

    #[instrument(skip_all, fields(name = %flow.name))]
    async fn create_flow(&self, flow: &WireFlow) -> Result<FlowId, PersistenceError> {
        let url = self.collection_url();
        let response = self.send(self.create_request(flow), &url, None).await?;
        let created: CreatedFlow = response.json().await.map_err(|e| {
            warn!(error = %e, endpoint = %url, "failed to decode create response");
            PersistenceError::Decode {
                reason: e.to_string(),
            }
        })?;
        let flow_id: FlowId = created.id.parse().map_err(|e: callflow_core::ParseIdError| {
            PersistenceError::Decode {
                reason: e.to_string(),
            }
        })?;
        info!(flow_id = %flow_id, "created flow");
        Ok(flow_id)
    }

    #[instrument(skip_all, fields(flow_id = %flow_id))]
    async fn update_flow(&self, flow_id: &FlowId, flow: &WireFlow) -> Result<(), PersistenceError> {
        let url = self.flow_url(flow_id);
        self.send(self.update_request(flow_id, flow), &url, Some(flow_id))
            .await?;
        info!("updated flow");
        Ok(())
    }

    #[instrument(skip_all, fields(flow_id = %flow_id))]
    async fn delete_flow(&self, flow_id: &FlowId) -> Result<(), PersistenceError> {
        let url = self.flow_url(flow_id);
        self.send(self.delete_request(flow_id), &url, Some(flow_id))
            .await?;
        info!("deleted flow");
        Ok(())
    }
}
