//! Graph construction
//!
//! Builds the final node/edge collections and aggregate statistics from
//! normalized papers plus the raw node/edge lists returned by the network
//! layer. Deduplication and role classification happen here and are
//! deterministic: identical input always yields an identical graph.

use citegraph_common::config::GraphTuning;
use citegraph_common::model::{
    CitationNetwork, EdgeRole, GraphEdge, GraphNode, NetworkStats, NodeRole, Paper, YearRange,
};
use std::collections::{HashMap, HashSet};

use crate::client::{RawEdge, RawNode};

/// Builds [`CitationNetwork`] values from fetch output
pub struct GraphBuilder {
    tuning: GraphTuning,
}

impl GraphBuilder {
    pub fn new(tuning: GraphTuning) -> Self {
        Self { tuning }
    }

    /// Build the graph.
    ///
    /// Nodes are deduplicated by id, first occurrence wins. Edges are
    /// deduplicated by the ordered `(from, to)` pair; the surviving edge's
    /// id derives from the pair alone. Empty node/edge arrays with papers
    /// present are a legitimate "no connections" result, not an error.
    pub fn build(
        &self,
        papers: Vec<Paper>,
        raw_nodes: &[RawNode],
        raw_edges: &[RawEdge],
        seed_ids: &[String],
    ) -> CitationNetwork {
        let by_id: HashMap<&str, &Paper> =
            papers.iter().map(|p| (p.id.as_str(), p)).collect();

        // Effective seed list: the endpoint's report, else whichever
        // papers the normalizer marked as seeds
        let seed_ids: Vec<String> = if seed_ids.is_empty() {
            papers.iter().filter(|p| p.is_seed).map(|p| p.id.clone()).collect()
        } else {
            seed_ids.to_vec()
        };
        let seed_set: HashSet<&str> = seed_ids.iter().map(String::as_str).collect();

        let mut seen_nodes = HashSet::new();
        let mut nodes = Vec::with_capacity(raw_nodes.len());

        for raw in raw_nodes {
            if !seen_nodes.insert(raw.id.as_str()) {
                continue;
            }

            let paper = by_id.get(raw.id.as_str()).copied();
            let role = self.classify_node(raw, &seed_set);
            let citation_count = paper.map(|p| p.citation_count).unwrap_or(0);
            let title = paper.map(|p| p.title.as_str()).unwrap_or(raw.id.as_str());

            nodes.push(GraphNode {
                id: raw.id.clone(),
                label: self.truncate_label(title),
                size: self.node_size(role == NodeRole::Seed, citation_count),
                color: role.color(),
                role,
            });
        }

        // All edges classify against one representative seed; with
        // multiple seeds this mis-labels edges touching the others
        // (kept for compatibility with the rendering contract)
        let representative = seed_ids.first().map(String::as_str);

        let mut seen_edges = HashSet::new();
        let mut edges = Vec::with_capacity(raw_edges.len());

        for raw in raw_edges {
            if !seen_edges.insert((raw.from.as_str(), raw.to.as_str())) {
                continue;
            }

            let role = match representative {
                Some(seed) if raw.from == seed => EdgeRole::ReferencesSeed,
                Some(seed) if raw.to == seed => EdgeRole::CitesSeed,
                _ => EdgeRole::Indirect,
            };

            edges.push(GraphEdge {
                id: format!("{}->{}", raw.from, raw.to),
                from: raw.from.clone(),
                to: raw.to.clone(),
                dashed: role.dashed(),
                role,
            });
        }

        let stats = self.compute_stats(&papers, edges.len(), representative);

        CitationNetwork {
            papers,
            nodes,
            edges,
            stats,
            seed_ids,
        }
    }

    fn classify_node(&self, raw: &RawNode, seed_set: &HashSet<&str>) -> NodeRole {
        if seed_set.contains(raw.id.as_str()) {
            return NodeRole::Seed;
        }
        match raw.node_type.as_deref() {
            Some("cited") => NodeRole::Cited,
            Some("citing") => NodeRole::Citing,
            _ => NodeRole::Other,
        }
    }

    /// Seeds render at a fixed prominent size; non-seed size grows
    /// sub-linearly with citation count and is capped.
    fn node_size(&self, is_seed: bool, citation_count: u32) -> f64 {
        if is_seed {
            return self.tuning.seed_size;
        }
        // Add in f64: `citation_count + 1` would overflow at u32::MAX
        let scaled = self.tuning.base_size
            + (citation_count as f64 + 1.0).sqrt() * self.tuning.scale_factor;
        scaled.clamp(self.tuning.base_size, self.tuning.max_size)
    }

    fn truncate_label(&self, title: &str) -> String {
        let mut chars = title.chars();
        let truncated: String = chars.by_ref().take(self.tuning.label_chars).collect();
        if chars.next().is_some() {
            format!("{}…", truncated)
        } else {
            truncated
        }
    }

    fn compute_stats(
        &self,
        papers: &[Paper],
        edge_count: usize,
        representative: Option<&str>,
    ) -> NetworkStats {
        let years: Vec<i32> = papers.iter().filter_map(|p| p.year).collect();
        let year_range = match (years.iter().min(), years.iter().max()) {
            (Some(&min), Some(&max)) => Some(YearRange { min, max }),
            _ => None,
        };

        NetworkStats {
            total_papers: papers.len(),
            total_connections: edge_count,
            year_range,
            seed_paper: representative
                .and_then(|seed| papers.iter().find(|p| p.id == seed))
                .cloned(),
        }
    }
}
