//! Request coordination
//!
//! Sits between raw user input and the fetch pipeline. Debounces rapid
//! edits, cancels superseded work, skips refetches for unchanged input,
//! and guarantees that only the latest generation ever touches published
//! state: per query the machine runs
//! Idle -> Debouncing -> Fetching -> {Settled | Aborted}.

use citegraph_common::config::EngineConfig;
use citegraph_common::errors::Result;
use citegraph_common::model::FetchOptions;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::client::NetworkClient;
use crate::graph::GraphBuilder;
use crate::normalizer;
use crate::orchestrator::FetchOrchestrator;
use crate::parser;
use crate::publisher::{GraphState, GraphStatePublisher};

/// Coordinates debounced, cancellable network builds
pub struct RequestCoordinator {
    shared: Arc<Shared>,
}

struct Shared {
    orchestrator: FetchOrchestrator,
    builder: GraphBuilder,
    publisher: GraphStatePublisher,
    debounce: Duration,
    inner: Mutex<Inner>,
    root: CancellationToken,
}

struct Inner {
    /// Monotonic generation counter, advanced on every submit; only the
    /// newest generation may publish
    generation: u64,

    /// Cancellation token of the newest generation
    token: CancellationToken,

    /// Seeds+options of the last fetch that settled successfully
    last_issued: Option<(Vec<String>, FetchOptions)>,
}

impl RequestCoordinator {
    pub fn new(client: Arc<dyn NetworkClient>, config: &EngineConfig) -> Self {
        let root = CancellationToken::new();
        Self {
            shared: Arc::new(Shared {
                orchestrator: FetchOrchestrator::new(client, config.fetch.clone()),
                builder: GraphBuilder::new(config.graph.clone()),
                publisher: GraphStatePublisher::new(),
                debounce: config.debounce_window(),
                inner: Mutex::new(Inner {
                    generation: 0,
                    token: root.child_token(),
                    last_issued: None,
                }),
                root,
            }),
        }
    }

    /// Subscribe to published graph state
    pub fn subscribe(&self) -> watch::Receiver<GraphState> {
        self.shared.publisher.subscribe()
    }

    /// Direct access to the publisher (selection, seed assignment)
    pub fn publisher(&self) -> &GraphStatePublisher {
        &self.shared.publisher
    }

    /// Feed new raw input. Cancels any pending debounce or in-flight
    /// fetch for the previous input; after the debounce window elapses a
    /// single fetch runs for the newest input.
    pub fn submit(&self, raw_input: &str, options: FetchOptions) {
        let seeds = parser::parse_seed_ids(raw_input);
        let shared = self.shared.clone();

        let (generation, token) = {
            let mut inner = shared.inner.lock().unwrap();

            // Supersede: the previous generation resolves Aborted and
            // never touches published state. The counter advances even
            // when no new fetch is spawned, so a response that already
            // resolved fails the publish-time generation check.
            inner.token.cancel();
            inner.generation += 1;

            if seeds.is_empty() {
                inner.last_issued = None;
                drop(inner);
                tracing::debug!("Empty seed input, restoring previous graph or clearing");
                shared.publisher.restore_or_clear();
                return;
            }

            // Idempotence guard: identical input+options to the last
            // settled fetch needs no network round trip
            if inner.last_issued.as_ref() == Some(&(seeds.clone(), options)) {
                tracing::debug!(seed_count = seeds.len(), "Input unchanged, skipping refetch");
                drop(inner);
                // An in-flight fetch for other input was just aborted and
                // nothing supersedes it; resolve the loading flag here
                shared.publisher.set_idle();
                return;
            }

            let token = shared.root.child_token();
            inner.token = token.clone();
            (inner.generation, token)
        };

        let debounce = self.shared.debounce;
        tokio::spawn(async move {
            shared
                .run_generation(generation, token, seeds, options, debounce)
                .await;
        });
    }

    /// Feed input from an explicit build action.
    ///
    /// Blank input is surfaced to the caller as an error instead of
    /// clearing the view, the debounce window is skipped, and an
    /// unchanged query is refetched rather than deduplicated.
    pub fn submit_now(&self, raw_input: &str, options: FetchOptions) -> Result<()> {
        let seeds = parser::require_seed_ids(raw_input)?;
        let shared = self.shared.clone();

        let (generation, token) = {
            let mut inner = shared.inner.lock().unwrap();
            inner.token.cancel();
            inner.generation += 1;
            let token = shared.root.child_token();
            inner.token = token.clone();
            (inner.generation, token)
        };

        tokio::spawn(async move {
            shared
                .run_generation(generation, token, seeds, options, Duration::ZERO)
                .await;
        });
        Ok(())
    }

    /// Cancel every pending debounce timer and in-flight request.
    ///
    /// Call on teardown so late responses cannot write into a defunct
    /// view.
    pub fn shutdown(&self) {
        self.shared.root.cancel();
    }
}

impl Drop for RequestCoordinator {
    fn drop(&mut self) {
        self.shared.root.cancel();
    }
}

impl Shared {
    async fn run_generation(
        &self,
        generation: u64,
        token: CancellationToken,
        seeds: Vec<String>,
        options: FetchOptions,
        debounce: Duration,
    ) {
        // Debouncing: wait out the quiescence window
        tokio::select! {
            _ = token.cancelled() => return,
            _ = tokio::time::sleep(debounce) => {}
        }

        if !self.if_current(generation, |publisher| publisher.set_loading()) {
            return;
        }

        match self.orchestrator.fetch(&seeds, options, &token).await {
            Ok(Some(raw)) => {
                let papers = normalizer::normalize_papers(
                    &raw.papers,
                    &raw.seed_paper_ids,
                    options.source,
                );
                let network =
                    self.builder
                        .build(papers, &raw.nodes, &raw.edges, &raw.seed_paper_ids);

                let mut inner = self.inner.lock().unwrap();
                if inner.generation != generation {
                    return;
                }
                inner.last_issued = Some((seeds, options));
                self.publisher.publish(network);
            }
            // Unreachable for non-empty seeds; kept total for safety
            Ok(None) => {
                self.if_current(generation, |publisher| publisher.restore_or_clear());
            }
            Err(e) if e.is_abort() => {
                // Superseded: stay silent, the newer generation resolves
                // the loading flag
                tracing::debug!(generation, "Fetch aborted");
            }
            Err(e) => {
                tracing::warn!(generation, error = %e, "Network build failed");
                let message = e
                    .user_message()
                    .unwrap_or_else(|| "Something went wrong while building the network.".to_string());
                self.if_current(generation, |publisher| publisher.fail(message));
            }
        }
    }

    /// Run `f` against the publisher only if `generation` is still the
    /// newest; the lock is held across the call so a superseding submit
    /// cannot interleave.
    fn if_current<F: FnOnce(&GraphStatePublisher)>(&self, generation: u64, f: F) -> bool {
        let inner = self.inner.lock().unwrap();
        if inner.generation != generation {
            return false;
        }
        f(&self.publisher);
        true
    }
}
