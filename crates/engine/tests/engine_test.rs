//! End-to-end engine tests over a scripted mock client:
//! input -> debounce -> fetch (+fallback) -> normalize -> build -> publish

use async_trait::async_trait;
use citegraph_common::config::{EngineConfig, FetchTuning};
use citegraph_common::model::{DataSource, Depth, FetchOptions};
use citegraph_engine::{
    GraphState, MockNetworkClient, NetworkClient, RawEdge, RawNetwork, RawNode,
    RecordedRequest, RequestCoordinator,
};
use citegraph_common::errors::{EngineError, Result as EngineResult};
use serde_json::json;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio_test::{assert_err, assert_ok};
use tokio_util::sync::CancellationToken;

fn test_config() -> EngineConfig {
    EngineConfig {
        fetch: FetchTuning {
            debounce_ms: 10,
            ..FetchTuning::default()
        },
        ..EngineConfig::default()
    }
}

fn options(source: DataSource) -> FetchOptions {
    FetchOptions {
        cited: Depth::Top,
        citing: Depth::Top,
        source,
    }
}

/// A small network around one seed
fn seed_network(seed: &str, cited: &str) -> RawNetwork {
    RawNetwork {
        papers: vec![
            json!({"id": seed, "title": format!("Seed {}", seed), "citationCount": 12,
                   "authors": [{"FN": "A", "LN": "B"}]}),
            json!({"paperId": cited, "title": format!("Cited {}", cited), "citedByCount": 3}),
        ],
        nodes: vec![
            RawNode { id: seed.to_string(), node_type: Some("seed".to_string()) },
            RawNode { id: cited.to_string(), node_type: Some("cited".to_string()) },
        ],
        edges: vec![RawEdge { from: seed.to_string(), to: cited.to_string() }],
        seed_paper_ids: vec![seed.to_string()],
    }
}

/// A client whose response cannot be interrupted once issued: it sleeps,
/// then resolves, ignoring the cancellation token. Models a response that
/// has already arrived by the time its request is superseded.
struct UninterruptibleClient {
    responses: Mutex<VecDeque<RawNetwork>>,
    delay: Duration,
}

impl UninterruptibleClient {
    fn new(responses: Vec<RawNetwork>, delay: Duration) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
            delay,
        }
    }

    async fn respond(&self) -> EngineResult<RawNetwork> {
        tokio::time::sleep(self.delay).await;
        Ok(self.responses.lock().unwrap().pop_front().unwrap_or_default())
    }
}

#[async_trait]
impl NetworkClient for UninterruptibleClient {
    async fn build_single(
        &self,
        _seed_id: &str,
        _max_references: u32,
        _max_citations: u32,
        _source: DataSource,
        _token: &CancellationToken,
    ) -> EngineResult<RawNetwork> {
        self.respond().await
    }

    async fn build_multi(
        &self,
        _seed_ids: &[String],
        _cited: &str,
        _citing: &str,
        _source: DataSource,
        _token: &CancellationToken,
    ) -> EngineResult<RawNetwork> {
        self.respond().await
    }
}

/// Wait until the published state satisfies `pred`
async fn wait_for<F>(rx: &mut watch::Receiver<GraphState>, mut pred: F) -> GraphState
where
    F: FnMut(&GraphState) -> bool,
{
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            {
                let state = rx.borrow_and_update();
                if pred(&state) {
                    return state.clone();
                }
            }
            rx.changed().await.expect("publisher dropped");
        }
    })
    .await
    .expect("timed out waiting for published state")
}

#[tokio::test]
async fn single_seed_secondary_falls_back_to_primary() {
    // First response has zero edges; the orchestrator must retry once
    // against the primary provider
    let client = Arc::new(MockNetworkClient::new(vec![
        Ok(RawNetwork::default()),
        Ok(seed_network("10.1/abc", "10.9/xyz")),
    ]));
    let coordinator = RequestCoordinator::new(client.clone(), &test_config());
    let mut rx = coordinator.subscribe();

    coordinator.submit("10.1/abc", options(DataSource::Secondary));

    let state = wait_for(&mut rx, |s| {
        s.network.as_ref().map(|n| !n.is_empty()).unwrap_or(false)
    })
    .await;

    let network = state.network.unwrap();
    assert_eq!(network.stats.total_papers, 2);
    assert_eq!(network.stats.total_connections, 1);

    let requests = client.requests();
    assert_eq!(
        requests,
        vec![
            RecordedRequest::Single {
                seed_id: "10.1/abc".to_string(),
                max_references: 50,
                max_citations: 50,
                source: DataSource::Secondary,
            },
            RecordedRequest::Single {
                seed_id: "10.1/abc".to_string(),
                max_references: 50,
                max_citations: 50,
                source: DataSource::Primary,
            },
        ]
    );
}

#[tokio::test]
async fn two_line_input_issues_multi_seed_request() {
    let client = Arc::new(MockNetworkClient::new(vec![Ok(seed_network(
        "10.1/abc",
        "10.2/def",
    ))]));
    let coordinator = RequestCoordinator::new(client.clone(), &test_config());
    let mut rx = coordinator.subscribe();

    coordinator.submit("10.1/abc\n10.2/def", options(DataSource::Secondary));

    wait_for(&mut rx, |s| s.network.is_some()).await;

    assert_eq!(
        client.requests(),
        vec![RecordedRequest::Multi {
            seed_ids: vec!["10.1/abc".to_string(), "10.2/def".to_string()],
            cited: "top".to_string(),
            citing: "top".to_string(),
            source: DataSource::Secondary,
        }]
    );
}

#[tokio::test]
async fn superseding_input_wins_even_when_first_response_is_late() {
    // Q1's response is held back by the mock delay; Q2 supersedes it
    // mid-flight. Only Q2's output may ever be published.
    let client = Arc::new(
        MockNetworkClient::new(vec![
            Ok(seed_network("Q2", "other")),
        ])
        .with_delay(Duration::from_millis(100)),
    );
    let coordinator = RequestCoordinator::new(client.clone(), &test_config());
    let mut rx = coordinator.subscribe();

    coordinator.submit("Q1", options(DataSource::Primary));
    // Let Q1 get past its debounce window and into the network call
    tokio::time::sleep(Duration::from_millis(40)).await;
    coordinator.submit("Q2", options(DataSource::Primary));

    let state = wait_for(&mut rx, |s| {
        s.network.as_ref().map(|n| !n.is_empty()).unwrap_or(false)
    })
    .await;

    let network = state.network.unwrap();
    assert_eq!(network.seed_ids, vec!["Q2"]);

    // Q1's fetch was issued, then aborted; it consumed no scripted response
    let requests = client.requests();
    assert_eq!(requests.len(), 2);
    assert!(matches!(&requests[0], RecordedRequest::Single { seed_id, .. } if seed_id == "Q1"));
    assert!(matches!(&requests[1], RecordedRequest::Single { seed_id, .. } if seed_id == "Q2"));
}

#[tokio::test]
async fn late_response_is_discarded_after_input_cleared() {
    // The response resolves after the input is cleared; clearing must
    // supersede it even though its request can no longer be interrupted
    let client = Arc::new(UninterruptibleClient::new(
        vec![seed_network("B", "x")],
        Duration::from_millis(60),
    ));
    let coordinator = RequestCoordinator::new(client, &test_config());
    let mut rx = coordinator.subscribe();

    coordinator.submit("B", options(DataSource::Primary));
    wait_for(&mut rx, |s| s.loading).await;
    coordinator.submit("", options(DataSource::Primary));

    // Wait out the stale response; it must never overwrite the cleared view
    tokio::time::sleep(Duration::from_millis(150)).await;
    let state = rx.borrow().clone();
    assert!(state.network.unwrap().is_empty());
    assert!(!state.loading);
}

#[tokio::test]
async fn late_response_is_discarded_after_resubmitting_previous_input() {
    // A settles; B goes in flight; the input returns to A before B's
    // response lands. The unchanged-input path must supersede B even
    // though it issues no fetch of its own.
    let client = Arc::new(UninterruptibleClient::new(
        vec![seed_network("A", "x"), seed_network("B", "y")],
        Duration::from_millis(60),
    ));
    let coordinator = RequestCoordinator::new(client, &test_config());
    let mut rx = coordinator.subscribe();

    coordinator.submit("A", options(DataSource::Primary));
    wait_for(&mut rx, |s| {
        s.network.as_ref().map(|n| !n.is_empty()).unwrap_or(false)
    })
    .await;

    coordinator.submit("B", options(DataSource::Primary));
    wait_for(&mut rx, |s| s.loading).await;
    coordinator.submit("A", options(DataSource::Primary));

    tokio::time::sleep(Duration::from_millis(150)).await;
    let state = rx.borrow().clone();
    assert_eq!(state.network.unwrap().seed_ids, vec!["A"]);
    assert!(!state.loading);
}

#[tokio::test]
async fn explicit_build_rejects_blank_input() {
    let client = Arc::new(MockNetworkClient::new(vec![]));
    let coordinator = RequestCoordinator::new(client.clone(), &test_config());

    tokio_test::assert_err!(coordinator.submit_now("  \n ", options(DataSource::Primary)));
    assert!(client.requests().is_empty());
}

#[tokio::test]
async fn explicit_build_skips_debounce() {
    let mut config = test_config();
    config.fetch.debounce_ms = 60_000;
    let client = Arc::new(MockNetworkClient::new(vec![Ok(seed_network("s", "a"))]));
    let coordinator = RequestCoordinator::new(client, &config);
    let mut rx = coordinator.subscribe();

    tokio_test::assert_ok!(coordinator.submit_now("s", options(DataSource::Primary)));

    // Publishes well inside the 2s wait despite the huge debounce window
    let state = wait_for(&mut rx, |s| s.network.is_some()).await;
    assert_eq!(state.network.unwrap().seed_ids, vec!["s"]);
}

#[tokio::test]
async fn rapid_edits_debounce_to_one_fetch() {
    let client = Arc::new(MockNetworkClient::new(vec![Ok(seed_network("final", "x"))]));
    let coordinator = RequestCoordinator::new(client.clone(), &test_config());
    let mut rx = coordinator.subscribe();

    // Three edits inside one debounce window; only the last survives
    coordinator.submit("draft1", options(DataSource::Primary));
    coordinator.submit("draft2", options(DataSource::Primary));
    coordinator.submit("final", options(DataSource::Primary));

    wait_for(&mut rx, |s| s.network.is_some()).await;

    let requests = client.requests();
    assert_eq!(requests.len(), 1);
    assert!(matches!(&requests[0], RecordedRequest::Single { seed_id, .. } if seed_id == "final"));
}

#[tokio::test]
async fn unchanged_input_skips_refetch() {
    let client = Arc::new(MockNetworkClient::new(vec![Ok(seed_network("10.1/abc", "x"))]));
    let coordinator = RequestCoordinator::new(client.clone(), &test_config());
    let mut rx = coordinator.subscribe();

    coordinator.submit("10.1/abc", options(DataSource::Primary));
    wait_for(&mut rx, |s| s.network.is_some()).await;

    coordinator.submit("10.1/abc", options(DataSource::Primary));
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(client.requests().len(), 1);
}

#[tokio::test]
async fn changed_options_refetch_same_seeds() {
    let client = Arc::new(MockNetworkClient::new(vec![
        Ok(seed_network("10.1/abc", "x")),
        Ok(seed_network("10.1/abc", "y")),
    ]));
    let coordinator = RequestCoordinator::new(client.clone(), &test_config());
    let mut rx = coordinator.subscribe();

    coordinator.submit("10.1/abc", options(DataSource::Primary));
    wait_for(&mut rx, |s| s.network.is_some()).await;

    let mut changed = options(DataSource::Primary);
    changed.citing = Depth::All;
    coordinator.submit("10.1/abc", changed);
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(client.requests().len(), 2);
}

#[tokio::test]
async fn empty_input_restores_previous_graph_without_fetching() {
    let client = Arc::new(MockNetworkClient::new(vec![Ok(seed_network("s", "a"))]));
    let coordinator = RequestCoordinator::new(client.clone(), &test_config());
    let mut rx = coordinator.subscribe();

    coordinator.submit("s", options(DataSource::Primary));
    wait_for(&mut rx, |s| s.network.is_some()).await;

    coordinator.submit("", options(DataSource::Primary));
    let state = wait_for(&mut rx, |s| !s.loading && s.network.is_some()).await;

    assert_eq!(state.network.unwrap().stats.total_papers, 2);
    assert_eq!(client.requests().len(), 1);
}

#[tokio::test]
async fn empty_input_clears_when_no_previous_graph() {
    let client = Arc::new(MockNetworkClient::new(vec![]));
    let coordinator = RequestCoordinator::new(client.clone(), &test_config());
    let mut rx = coordinator.subscribe();

    coordinator.submit("   \n  ", options(DataSource::Primary));

    let state = wait_for(&mut rx, |s| s.network.is_some()).await;
    assert!(state.network.unwrap().is_empty());
    assert!(client.requests().is_empty());
}

#[tokio::test]
async fn aggregation_error_surfaces_banner_and_keeps_graph() {
    let client = Arc::new(MockNetworkClient::new(vec![
        Ok(seed_network("s", "a")),
        Err(EngineError::Aggregation {
            message: "DOI not indexed".to_string(),
        }),
    ]));
    let coordinator = RequestCoordinator::new(client.clone(), &test_config());
    let mut rx = coordinator.subscribe();

    coordinator.submit("s", options(DataSource::Primary));
    wait_for(&mut rx, |s| s.network.is_some()).await;

    coordinator.submit("broken-id", options(DataSource::Primary));
    let state = wait_for(&mut rx, |s| s.error.is_some()).await;

    assert_eq!(state.error.as_deref(), Some("DOI not indexed"));
    assert!(!state.loading);
    // Previous graph stays published behind the banner
    assert_eq!(state.network.unwrap().stats.total_papers, 2);
}

#[tokio::test]
async fn normalization_flows_into_published_papers() {
    let client = Arc::new(MockNetworkClient::new(vec![Ok(seed_network("s", "a"))]));
    let coordinator = RequestCoordinator::new(client, &test_config());
    let mut rx = coordinator.subscribe();

    coordinator.submit("s", options(DataSource::Secondary));
    let state = wait_for(&mut rx, |s| s.network.is_some()).await;

    let network = state.network.unwrap();
    let seed = network.paper("s").unwrap();
    assert!(seed.is_seed);
    assert_eq!(seed.citation_count, 12);
    assert_eq!(seed.authors[0].full_name, "A B");

    let cited = network.paper("a").unwrap();
    assert!(!cited.is_seed);
    assert_eq!(cited.citation_count, 3);

    // Seed assignment recorded once for downstream persistence
    let assignment = coordinator.publisher().seed_assignment().unwrap();
    assert_eq!(assignment.id, "s");
}

#[tokio::test]
async fn shutdown_cancels_in_flight_work() {
    let client = Arc::new(
        MockNetworkClient::new(vec![Ok(seed_network("s", "a"))])
            .with_delay(Duration::from_millis(100)),
    );
    let coordinator = RequestCoordinator::new(client.clone(), &test_config());
    let rx = coordinator.subscribe();

    coordinator.submit("s", options(DataSource::Primary));
    tokio::time::sleep(Duration::from_millis(40)).await;
    coordinator.shutdown();

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(rx.borrow().network.is_none());
}
