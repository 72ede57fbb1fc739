use anyhow::Result;
use async_trait::async_trait;

/// Upstream capability that resolves a topic to its outbound link titles.
#[async_trait]
pub trait LinkSource: Send + Sync {
    /// Returns the complete outbound link list for `topic` in one call, in
    /// upstream order. A topic with no links (or one that does not exist
    /// upstream) yields an empty list, not an error; errors mean the fetch
    /// itself failed.
    async fn fetch_links(&self, topic: &str) -> Result<Vec<String>>;
}
