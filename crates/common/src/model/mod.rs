//! Canonical data model for the citation network engine
//!
//! Raw provider payloads are normalized into these types exactly once, at
//! the engine boundary. Everything downstream (graph builder, publisher,
//! rendering surface) consumes this model and nothing else.

use serde::{Deserialize, Serialize};

/// External bibliographic data provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    /// Deep-coverage provider with strong citation linkage
    Primary,
    /// Broad-coverage provider; may lack linkage for some papers
    Secondary,
}

impl DataSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataSource::Primary => "primary",
            DataSource::Secondary => "secondary",
        }
    }
}

/// Expansion depth for cited/citing neighborhoods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Depth {
    None,
    Top,
    All,
}

impl Depth {
    /// Token form used by the multi-seed endpoint
    pub fn token(&self) -> &'static str {
        match self {
            Depth::None => "none",
            Depth::Top => "top",
            Depth::All => "all",
        }
    }

    /// Numeric cap used by the single-seed endpoint
    pub fn max_count(&self, top_cap: u32, all_cap: u32) -> u32 {
        match self {
            Depth::None => 0,
            Depth::Top => top_cap,
            Depth::All => all_cap,
        }
    }
}

/// Retrieval options for one network build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchOptions {
    pub cited: Depth,
    pub citing: Depth,
    pub source: DataSource,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            cited: Depth::Top,
            citing: Depth::Top,
            source: DataSource::Secondary,
        }
    }
}

/// Paper author, normalized
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    /// Always non-empty; "Unknown Author" when no name field was present
    pub full_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orcid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affiliation: Option<String>,
}

impl Author {
    pub fn unknown() -> Self {
        Self {
            full_name: "Unknown Author".to_string(),
            first_name: None,
            last_name: None,
            orcid: None,
            affiliation: None,
        }
    }
}

/// Canonical paper record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paper {
    /// Stable, unique within a graph; same id means same entity
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub venue: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abstract_text: Option<String>,
    pub citation_count: u32,
    pub reference_count: u32,
    pub authors: Vec<Author>,
    pub is_seed: bool,
    pub source: DataSource,
}

/// Node role relative to the current seed set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeRole {
    Seed,
    Cited,
    Citing,
    Other,
}

impl NodeRole {
    /// Render color class for this role
    pub fn color(&self) -> &'static str {
        match self {
            NodeRole::Seed => "#e63946",
            NodeRole::Cited => "#457b9d",
            NodeRole::Citing => "#2a9d8f",
            NodeRole::Other => "#8d99ae",
        }
    }
}

/// Edge role relative to the representative seed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EdgeRole {
    /// The seed cites this paper
    ReferencesSeed,
    /// This paper cites the seed
    CitesSeed,
    /// Connects two non-seed papers
    Indirect,
}

impl EdgeRole {
    /// Indirect edges render dashed with reduced weight
    pub fn dashed(&self) -> bool {
        matches!(self, EdgeRole::Indirect)
    }

    pub fn weight(&self) -> f64 {
        match self {
            EdgeRole::ReferencesSeed | EdgeRole::CitesSeed => 1.0,
            EdgeRole::Indirect => 0.4,
        }
    }
}

/// View projection of a paper for the rendering surface
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    pub id: String,
    /// Title truncated to the configured character budget
    pub label: String,
    pub role: NodeRole,
    pub size: f64,
    pub color: &'static str,
}

/// Directed citation relationship: `from` cites `to`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphEdge {
    /// Deterministically derived from (from, to)
    pub id: String,
    pub from: String,
    pub to: String,
    pub role: EdgeRole,
    pub dashed: bool,
}

/// Min/max publication year among papers with a known year
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct YearRange {
    pub min: i32,
    pub max: i32,
}

/// Derived aggregate statistics; never authoritative
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkStats {
    pub total_papers: usize,
    pub total_connections: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year_range: Option<YearRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed_paper: Option<Paper>,
}

/// The immutable published unit: one fully built citation network.
///
/// Rebuilt in full on every successful fetch and swapped atomically;
/// never patched in place.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CitationNetwork {
    pub papers: Vec<Paper>,
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    pub stats: NetworkStats,
    pub seed_ids: Vec<String>,
}

impl CitationNetwork {
    /// Network with no nodes; the explicit "no graph" state
    pub fn empty() -> Self {
        Self {
            papers: Vec::new(),
            nodes: Vec::new(),
            edges: Vec::new(),
            stats: NetworkStats {
                total_papers: 0,
                total_connections: 0,
                year_range: None,
                seed_paper: None,
            },
            seed_ids: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Look up the canonical paper behind a node id
    pub fn paper(&self, id: &str) -> Option<&Paper> {
        self.papers.iter().find(|p| p.id == id)
    }

    /// Ids directly connected to `id`, in edge order
    pub fn neighbors(&self, id: &str) -> Vec<&str> {
        self.edges
            .iter()
            .filter_map(|e| {
                if e.from == id {
                    Some(e.to.as_str())
                } else if e.to == id {
                    Some(e.from.as_str())
                } else {
                    None
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_translation() {
        assert_eq!(Depth::None.max_count(50, 1000), 0);
        assert_eq!(Depth::Top.max_count(50, 1000), 50);
        assert_eq!(Depth::All.max_count(50, 1000), 1000);
        assert_eq!(Depth::Top.token(), "top");
    }

    #[test]
    fn test_edge_role_rendering() {
        assert!(EdgeRole::Indirect.dashed());
        assert!(!EdgeRole::CitesSeed.dashed());
        assert!(EdgeRole::Indirect.weight() < EdgeRole::ReferencesSeed.weight());
    }

    #[test]
    fn test_unknown_author_nonempty() {
        assert!(!Author::unknown().full_name.is_empty());
    }

    #[test]
    fn test_empty_network() {
        let net = CitationNetwork::empty();
        assert!(net.is_empty());
        assert_eq!(net.stats.total_papers, 0);
        assert!(net.paper("x").is_none());
    }
}
