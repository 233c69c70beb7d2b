//! Record normalization
//!
//! Converts raw paper records, in whatever shape the provider produced,
//! into the canonical [`Paper`]/[`Author`] model. Every shape decision is
//! made here, once; downstream code never probes fields.

use citegraph_common::model::{Author, DataSource, Paper};
use serde::Deserialize;
use serde_json::Value;

/// The closed set of author shapes providers are known to produce.
///
/// Untagged arms are tried in precedence order: a plain string, an object
/// with a `name` field, a legacy `FN`/`LN` object, anything else.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawAuthor {
    Plain(String),
    Named {
        name: String,
    },
    Legacy {
        #[serde(rename = "FN")]
        first_name: String,
        #[serde(rename = "LN")]
        last_name: String,
        #[serde(default)]
        orcid: Option<String>,
        #[serde(default)]
        affiliation: Option<String>,
    },
    Unknown(Value),
}

impl RawAuthor {
    fn into_author(self) -> Author {
        match self {
            RawAuthor::Plain(name) => Author {
                full_name: name,
                first_name: None,
                last_name: None,
                orcid: None,
                affiliation: None,
            },
            RawAuthor::Named { name } => {
                let tokens: Vec<&str> = name.split_whitespace().collect();
                let (first, last) = if tokens.len() >= 2 {
                    (Some(tokens[0].to_string()), Some(tokens[1..].join(" ")))
                } else {
                    (None, None)
                };
                Author {
                    full_name: name,
                    first_name: first,
                    last_name: last,
                    orcid: None,
                    affiliation: None,
                }
            }
            RawAuthor::Legacy {
                first_name,
                last_name,
                orcid,
                affiliation,
            } => Author {
                full_name: format!("{} {}", first_name, last_name).trim().to_string(),
                first_name: Some(first_name),
                last_name: Some(last_name),
                orcid,
                affiliation,
            },
            RawAuthor::Unknown(_) => Author::unknown(),
        }
    }
}

/// Normalize one raw author entry; always yields a non-empty full name.
pub fn normalize_author(raw: &Value) -> Author {
    let author = match serde_json::from_value::<RawAuthor>(raw.clone()) {
        Ok(parsed) => parsed.into_author(),
        Err(_) => Author::unknown(),
    };
    if author.full_name.trim().is_empty() {
        Author::unknown()
    } else {
        author
    }
}

/// Raw paper record with provider field-name variants folded in
#[derive(Debug, Deserialize)]
struct RawPaper {
    #[serde(default, alias = "paperId")]
    id: Option<String>,

    #[serde(default, alias = "DOI")]
    doi: Option<String>,

    #[serde(default)]
    title: Option<String>,

    #[serde(default)]
    year: Option<i32>,

    #[serde(default, alias = "journal")]
    venue: Option<String>,

    #[serde(default, rename = "abstract", alias = "abstractText")]
    abstract_text: Option<String>,

    #[serde(default, rename = "citationCount", alias = "citedByCount")]
    citation_count: Option<u32>,

    #[serde(default, rename = "referenceCount", alias = "numReferences")]
    reference_count: Option<u32>,

    #[serde(default)]
    authors: Vec<Value>,
}

/// Normalize all raw paper records from one response.
///
/// `is_seed` comes from membership in the reported seed id list; when the
/// endpoint reports no seed ids but papers exist, the first paper is
/// treated as the seed. Records without any usable identifier are dropped
/// with a warning.
pub fn normalize_papers(
    raw_papers: &[Value],
    seed_ids: &[String],
    source: DataSource,
) -> Vec<Paper> {
    let mut papers = Vec::with_capacity(raw_papers.len());

    for (index, raw) in raw_papers.iter().enumerate() {
        let parsed: RawPaper = match serde_json::from_value(raw.clone()) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(index, error = %e, "Dropping unparseable paper record");
                continue;
            }
        };

        let id = match parsed.id.or_else(|| parsed.doi.clone()) {
            Some(id) => id,
            None => {
                tracing::warn!(index, "Dropping paper record without an identifier");
                continue;
            }
        };

        let is_seed = if seed_ids.is_empty() {
            // Safe fallback: no seed ids reported, first paper is the seed
            papers.is_empty()
        } else {
            seed_ids.iter().any(|s| s == &id)
        };

        papers.push(Paper {
            is_seed,
            id,
            doi: parsed.doi,
            title: parsed.title.unwrap_or_else(|| "Untitled".to_string()),
            year: parsed.year,
            venue: parsed.venue,
            abstract_text: parsed.abstract_text,
            citation_count: parsed.citation_count.unwrap_or(0),
            reference_count: parsed.reference_count.unwrap_or(0),
            authors: parsed.authors.iter().map(normalize_author).collect(),
            source,
        });
    }

    papers
}
