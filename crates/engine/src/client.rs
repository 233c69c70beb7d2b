//! Backend aggregation endpoint client
//!
//! Provides a trait seam over the two request shapes the aggregation
//! endpoint supports (single-seed POST, multi-seed path-style GET) so the
//! orchestrator can be exercised against a scripted mock in tests.
//!
//! The endpoint answers with one of two payload shapes: a direct
//! `{papers, nodes, edges, seedPaperIds}` body or a wrapped
//! `{success, data, error?}` envelope. Both are resolved into [`RawNetwork`]
//! here, at the boundary, so shape probing never leaks downstream.

use async_trait::async_trait;
use citegraph_common::errors::{EngineError, Result};
use citegraph_common::model::DataSource;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Raw node as returned by the aggregation endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawNode {
    pub id: String,

    /// Provider tag: "seed", "cited" or "citing"; absent for other nodes
    #[serde(default, alias = "type")]
    pub node_type: Option<String>,
}

/// Raw directed edge: `from` cites `to`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEdge {
    #[serde(alias = "source")]
    pub from: String,

    #[serde(alias = "target")]
    pub to: String,
}

/// Internal shape every response is normalized into
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawNetwork {
    /// Paper records, still in provider shape; normalized later
    #[serde(default)]
    pub papers: Vec<serde_json::Value>,

    #[serde(default)]
    pub nodes: Vec<RawNode>,

    #[serde(default)]
    pub edges: Vec<RawEdge>,

    /// Seed ids as reported by the endpoint; may be empty
    #[serde(default)]
    pub seed_paper_ids: Vec<String>,
}

/// The two payload shapes the endpoint may answer with.
///
/// Discriminated by the presence of `success`; the wrapped arm must come
/// first so an envelope is never mistaken for a direct body.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NetworkPayload {
    Wrapped {
        success: bool,
        #[serde(default)]
        data: Option<RawNetwork>,
        #[serde(default)]
        error: Option<String>,
    },
    Direct(RawNetwork),
}

impl NetworkPayload {
    /// Resolve the envelope; `success=false` is an aggregation failure,
    /// never an empty-but-valid graph.
    fn resolve(self) -> Result<RawNetwork> {
        match self {
            NetworkPayload::Wrapped { success: true, data, .. } => {
                Ok(data.unwrap_or_default())
            }
            NetworkPayload::Wrapped { success: false, error, .. } => {
                Err(EngineError::Aggregation {
                    message: error.unwrap_or_else(|| {
                        "The citation service reported a failure".to_string()
                    }),
                })
            }
            NetworkPayload::Direct(network) => Ok(network),
        }
    }
}

/// Error body some non-2xx responses carry
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Trait for building a raw citation network from the backend
#[async_trait]
pub trait NetworkClient: Send + Sync {
    /// Single-seed request with numeric depth caps
    async fn build_single(
        &self,
        seed_id: &str,
        max_references: u32,
        max_citations: u32,
        source: DataSource,
        token: &CancellationToken,
    ) -> Result<RawNetwork>;

    /// Multi-seed request with string depth tokens
    async fn build_multi(
        &self,
        seed_ids: &[String],
        cited: &str,
        citing: &str,
        source: DataSource,
        token: &CancellationToken,
    ) -> Result<RawNetwork>;
}

/// HTTP client against the backend aggregation endpoint
pub struct HttpNetworkClient {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SingleSeedRequest<'a> {
    seed_id: &'a str,
    max_references: u32,
    max_citations: u32,
    data_source: &'static str,
}

impl HttpNetworkClient {
    /// Create a client for the given endpoint base URL
    pub fn new(base_url: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(EngineError::Transport)?;

        Ok(Self { client, base_url })
    }

    /// Send the request, racing it against the cancellation token.
    ///
    /// A cancelled call resolves to [`EngineError::Aborted`] and never a
    /// transport error, so it stays silent at the coordinator boundary.
    async fn execute(
        &self,
        request: reqwest::RequestBuilder,
        token: &CancellationToken,
    ) -> Result<RawNetwork> {
        let fut = async {
            let response = request.send().await?;
            let status = response.status();

            if !status.is_success() {
                // Prefer the provider's own error text when the body carries one
                let body = response.text().await.unwrap_or_default();
                if let Ok(parsed) = serde_json::from_str::<ErrorBody>(&body) {
                    return Err(EngineError::Aggregation { message: parsed.error });
                }
                return Err(EngineError::UnexpectedStatus {
                    status: status.as_u16(),
                });
            }

            let payload: NetworkPayload = response.json().await?;
            payload.resolve()
        };

        tokio::select! {
            _ = token.cancelled() => Err(EngineError::Aborted),
            result = fut => result,
        }
    }
}

#[async_trait]
impl NetworkClient for HttpNetworkClient {
    async fn build_single(
        &self,
        seed_id: &str,
        max_references: u32,
        max_citations: u32,
        source: DataSource,
        token: &CancellationToken,
    ) -> Result<RawNetwork> {
        let url = format!("{}/single", self.base_url);
        let body = SingleSeedRequest {
            seed_id,
            max_references,
            max_citations,
            data_source: source.as_str(),
        };

        tracing::debug!(seed_id, source = source.as_str(), "Issuing single-seed request");

        self.execute(self.client.post(&url).json(&body), token).await
    }

    async fn build_multi(
        &self,
        seed_ids: &[String],
        cited: &str,
        citing: &str,
        source: DataSource,
        token: &CancellationToken,
    ) -> Result<RawNetwork> {
        // Path-style: {source}/{comma-joined ids}; each id is encoded,
        // the joining commas stay literal
        let joined = seed_ids
            .iter()
            .map(|id| urlencoding::encode(id).into_owned())
            .collect::<Vec<_>>()
            .join(",");
        let url = format!("{}/multi/{}/{}", self.base_url, source.as_str(), joined);

        tracing::debug!(
            seed_count = seed_ids.len(),
            source = source.as_str(),
            "Issuing multi-seed request"
        );

        let request = self
            .client
            .get(&url)
            .query(&[("cited", cited), ("citing", citing)]);

        self.execute(request, token).await
    }
}

/// Mock client for testing: replays scripted responses and records the
/// requests it saw
pub struct MockNetworkClient {
    responses: std::sync::Mutex<std::collections::VecDeque<Result<RawNetwork>>>,
    requests: std::sync::Mutex<Vec<RecordedRequest>>,
    /// Artificial latency before each response resolves
    pub delay: Duration,
}

/// One request observed by [`MockNetworkClient`]
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedRequest {
    Single {
        seed_id: String,
        max_references: u32,
        max_citations: u32,
        source: DataSource,
    },
    Multi {
        seed_ids: Vec<String>,
        cited: String,
        citing: String,
        source: DataSource,
    },
}

impl MockNetworkClient {
    pub fn new(responses: Vec<Result<RawNetwork>>) -> Self {
        Self {
            responses: std::sync::Mutex::new(responses.into_iter().collect()),
            requests: std::sync::Mutex::new(Vec::new()),
            delay: Duration::ZERO,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    async fn next_response(&self, token: &CancellationToken) -> Result<RawNetwork> {
        if !self.delay.is_zero() {
            tokio::select! {
                _ = token.cancelled() => return Err(EngineError::Aborted),
                _ = tokio::time::sleep(self.delay) => {}
            }
        }
        if token.is_cancelled() {
            return Err(EngineError::Aborted);
        }
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(RawNetwork::default()))
    }
}

#[async_trait]
impl NetworkClient for MockNetworkClient {
    async fn build_single(
        &self,
        seed_id: &str,
        max_references: u32,
        max_citations: u32,
        source: DataSource,
        token: &CancellationToken,
    ) -> Result<RawNetwork> {
        self.requests.lock().unwrap().push(RecordedRequest::Single {
            seed_id: seed_id.to_string(),
            max_references,
            max_citations,
            source,
        });
        self.next_response(token).await
    }

    async fn build_multi(
        &self,
        seed_ids: &[String],
        cited: &str,
        citing: &str,
        source: DataSource,
        token: &CancellationToken,
    ) -> Result<RawNetwork> {
        self.requests.lock().unwrap().push(RecordedRequest::Multi {
            seed_ids: seed_ids.to_vec(),
            cited: cited.to_string(),
            citing: citing.to_string(),
            source,
        });
        self.next_response(token).await
    }
}
