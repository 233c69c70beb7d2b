//! CiteGraph Engine
//!
//! Turns seed paper identifiers into a deduplicated, annotated citation
//! network sourced from external bibliographic providers, and keeps that
//! network consistent with user input that may change faster than network
//! requests complete.
//!
//! Pipeline:
//! user input -> [`parser`] -> [`coordinator`] (debounce/cancel)
//! -> [`orchestrator`] (HTTP + provider fallback) -> [`normalizer`]
//! -> [`graph`] -> [`publisher`] -> rendering surface + sibling views

pub mod client;
pub mod coordinator;
pub mod graph;
pub mod normalizer;
pub mod orchestrator;
pub mod parser;
pub mod publisher;

pub use client::{
    HttpNetworkClient, MockNetworkClient, NetworkClient, RawEdge, RawNetwork, RawNode,
    RecordedRequest,
};
pub use coordinator::RequestCoordinator;
pub use graph::GraphBuilder;
pub use orchestrator::FetchOrchestrator;
pub use publisher::{GraphState, GraphStatePublisher, SeedAssignment};

/// Initialize structured logging for binaries embedding the engine.
///
/// Respects `RUST_LOG`; defaults to info level.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();
}
