//! Bounded-depth link-graph construction.
//!
//! The builder expands outbound links from a root topic up to a configured
//! depth, fetching each topic at most once per build call and folding sibling
//! branches into a single node collection. The upstream that resolves a topic
//! to its outbound links is abstracted behind [`LinkSource`].

pub mod builder;
pub mod source;

use serde::{Deserialize, Serialize};

pub use builder::GraphBuilder;
pub use source::LinkSource;

/// Article identifier. Case- and whitespace-sensitive; the builder applies no
/// normalization beyond the space→underscore rewrite done when recursing into
/// a child (see [`GraphBuilder`]).
pub type Topic = String;

/// A single article node in the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    /// Unique identifier, e.g. `"Albert_Einstein"`.
    pub id: Topic,
    /// Human-readable title, e.g. `"Albert Einstein"` (id with underscores
    /// replaced by spaces).
    pub title: String,
    /// Outbound link titles exactly as the upstream returned them, in
    /// upstream order. Recorded even for nodes at the depth frontier.
    pub links: Vec<Topic>,
}

/// The complete link graph for one build call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkGraph {
    /// The original query topic.
    pub root: Topic,
    /// All nodes discovered during traversal; at most one entry per id.
    /// Collection order is unspecified.
    pub nodes: Vec<GraphNode>,
}

/// A link fetch failed. Aborts the whole build — no partial graph is
/// returned.
#[derive(Debug, thiserror::Error)]
#[error("failed to fetch links for {topic}")]
pub struct FetchError {
    /// The topic whose fetch failed.
    pub topic: Topic,
    #[source]
    pub source: anyhow::Error,
}
