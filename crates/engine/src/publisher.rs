//! Graph state publication
//!
//! The single writer for the shared graph state. Consumers (rendering
//! surface, paper list, detail view) hold a `watch::Receiver` and observe
//! whole-state swaps; nothing is ever patched in place, so a consumer can
//! never see a half-updated graph.

use citegraph_common::model::{CitationNetwork, Paper};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

/// Snapshot handed to consumers on every change
#[derive(Debug, Clone, Default)]
pub struct GraphState {
    /// The current network, if one has been published
    pub network: Option<Arc<CitationNetwork>>,

    /// True while a fetch is outstanding
    pub loading: bool,

    /// User-visible error banner text, if any
    pub error: Option<String>,

    /// Canonical paper behind the currently selected node
    pub selected: Option<Paper>,
}

/// Identity label for the wider application context: the representative
/// seed's id and title, assigned once
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedAssignment {
    pub id: String,
    pub title: String,
}

/// Single-writer publisher over the shared graph state
pub struct GraphStatePublisher {
    sender: watch::Sender<GraphState>,

    /// Last published network with content, for restore-on-empty-input
    last_nonempty: Mutex<Option<Arc<CitationNetwork>>>,

    /// Best-effort identity seed; first write wins
    seed_assignment: Mutex<Option<SeedAssignment>>,
}

impl GraphStatePublisher {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(GraphState::default());
        Self {
            sender,
            last_nonempty: Mutex::new(None),
            seed_assignment: Mutex::new(None),
        }
    }

    /// Subscribe to state changes
    pub fn subscribe(&self) -> watch::Receiver<GraphState> {
        self.sender.subscribe()
    }

    /// Current state snapshot
    pub fn current(&self) -> GraphState {
        self.sender.borrow().clone()
    }

    /// Mark a fetch as outstanding; the previous graph stays visible
    pub fn set_loading(&self) {
        self.sender.send_modify(|state| {
            state.loading = true;
        });
    }

    /// Swap in a freshly built network atomically.
    ///
    /// Clears the loading flag and any error; carries the selection over
    /// only when the selected paper still exists in the new network.
    pub fn publish(&self, network: CitationNetwork) {
        let network = Arc::new(network);

        if !network.is_empty() {
            *self.last_nonempty.lock().unwrap() = Some(network.clone());
        }
        self.assign_seed(&network);

        tracing::info!(
            papers = network.stats.total_papers,
            edges = network.stats.total_connections,
            "Publishing citation network"
        );

        self.sender.send_modify(|state| {
            state.selected = state
                .selected
                .as_ref()
                .and_then(|p| network.paper(&p.id))
                .cloned();
            state.network = Some(network.clone());
            state.loading = false;
            state.error = None;
        });
    }

    /// Clear the loading flag without touching the graph or error; used
    /// when a superseding input turns out to need no fetch at all
    pub fn set_idle(&self) {
        self.sender.send_modify(|state| {
            state.loading = false;
        });
    }

    /// Surface a fetch failure; the published graph is left untouched
    pub fn fail(&self, message: String) {
        self.sender.send_modify(|state| {
            state.loading = false;
            state.error = Some(message);
        });
    }

    /// Handle an empty seed list: restore the previous graph when one with
    /// content exists, otherwise clear to the explicit empty state.
    pub fn restore_or_clear(&self) {
        let restored = self.last_nonempty.lock().unwrap().clone();

        self.sender.send_modify(|state| {
            state.network = Some(match restored {
                Some(network) => network,
                None => Arc::new(CitationNetwork::empty()),
            });
            state.loading = false;
            state.error = None;
            state.selected = None;
        });
    }

    /// Resolve a node selection to its canonical paper and broadcast it
    pub fn select(&self, node_id: &str) -> Option<Paper> {
        let paper = self
            .sender
            .borrow()
            .network
            .as_ref()
            .and_then(|n| n.paper(node_id).cloned());

        self.sender.send_modify(|state| {
            state.selected = paper.clone();
        });

        paper
    }

    /// The identity seed assignment, if one has been made
    pub fn seed_assignment(&self) -> Option<SeedAssignment> {
        self.seed_assignment.lock().unwrap().clone()
    }

    /// Assign the representative seed's id/title once, never overwriting
    fn assign_seed(&self, network: &CitationNetwork) {
        let mut assignment = self.seed_assignment.lock().unwrap();
        if assignment.is_some() {
            return;
        }
        if let Some(seed) = network.stats.seed_paper.as_ref() {
            *assignment = Some(SeedAssignment {
                id: seed.id.clone(),
                title: seed.title.clone(),
            });
        }
    }
}

impl Default for GraphStatePublisher {
    fn default() -> Self {
        Self::new()
    }
}
