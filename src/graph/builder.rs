//! Depth-limited recursive expansion with cycle guard and dedup-merge.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures_util::future::{try_join_all, BoxFuture};
use tokio::sync::{Mutex, Semaphore};
use tracing::debug;

use super::{FetchError, GraphNode, LinkGraph, LinkSource, Topic};

/// Builds bounded-depth link graphs from a [`LinkSource`].
///
/// Each build call keeps one visited set shared across all concurrent
/// branches; a topic is claimed there *before* its fetch is issued, so it is
/// fetched at most once per call no matter how many branches reference it.
/// That claim is also what breaks cycles: a branch that hits an
/// already-claimed topic contributes nothing and returns immediately.
pub struct GraphBuilder {
    source: Arc<dyn LinkSource>,
    fetch_limit: Option<Arc<Semaphore>>,
}

impl GraphBuilder {
    pub fn new(source: Arc<dyn LinkSource>) -> Self {
        Self {
            source,
            fetch_limit: None,
        }
    }

    /// Caps concurrent upstream fetches at `limit` (0 = unlimited). Output
    /// semantics are unchanged; only scheduling is affected.
    pub fn with_fetch_limit(mut self, limit: usize) -> Self {
        self.fetch_limit = match limit {
            0 => None,
            n => Some(Arc::new(Semaphore::new(n))),
        };
        self
    }

    /// Expands `root` up to `max_depth` levels and returns the merged graph.
    ///
    /// `max_depth = 0` records only the root node, with its full link list.
    /// Nodes at exactly `max_depth` are recorded the same way: their own
    /// links are always captured, only recursion into them is gated. Any
    /// fetch failure aborts the whole build; no partial graph is returned.
    pub async fn build(&self, root: &str, max_depth: u32) -> Result<LinkGraph, FetchError> {
        let visited = Mutex::new(HashSet::new());
        let nodes = self
            .expand(&visited, root.to_string(), 0, max_depth)
            .await?;
        debug!(root, max_depth, nodes = nodes.len(), "graph build complete");
        Ok(LinkGraph {
            root: root.to_string(),
            nodes: nodes.into_values().collect(),
        })
    }

    /// Expands one topic at recursion level `depth`, returning the node map
    /// contributed by this branch. Boxed because the future is recursive.
    fn expand<'a>(
        &'a self,
        visited: &'a Mutex<HashSet<Topic>>,
        topic: Topic,
        depth: u32,
        max_depth: u32,
    ) -> BoxFuture<'a, Result<HashMap<Topic, GraphNode>, FetchError>> {
        Box::pin(async move {
            // Claim before fetching. `insert` under the lock is the atomic
            // check-and-claim; whichever branch claims a topic first produces
            // its node, every later branch is a no-op.
            if !visited.lock().await.insert(topic.clone()) {
                return Ok(HashMap::new());
            }

            let links = self.fetch(&topic).await?;

            // Child ids get the space→underscore rewrite; the node's own id
            // and raw link list do not. Link lists are upstream output as-is,
            // self-references included.
            let children: Vec<Topic> = if depth < max_depth {
                links.iter().map(|link| link.replace(' ', "_")).collect()
            } else {
                Vec::new()
            };

            let mut nodes = HashMap::new();
            nodes.insert(
                topic.clone(),
                GraphNode {
                    title: topic.replace('_', " "),
                    id: topic,
                    links,
                },
            );

            if !children.is_empty() {
                let branches = try_join_all(
                    children
                        .into_iter()
                        .map(|child| self.expand(visited, child, depth + 1, max_depth)),
                )
                .await?;
                // Union merge. The visited claim guarantees no two branches
                // ever produce the same id, so entries are never overwritten.
                for branch in branches {
                    for (id, node) in branch {
                        nodes.entry(id).or_insert(node);
                    }
                }
            }

            Ok(nodes)
        })
    }

    async fn fetch(&self, topic: &str) -> Result<Vec<Topic>, FetchError> {
        // The semaphore is never closed, so acquire cannot fail here.
        let _permit = match &self.fetch_limit {
            Some(sem) => sem.acquire().await.ok(),
            None => None,
        };
        debug!(topic, "fetching outbound links");
        self.source
            .fetch_links(topic)
            .await
            .map_err(|source| FetchError {
                topic: topic.to_string(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fixed topic→links mapping; unknown topics resolve to no links, the
    /// way the real upstream reports missing pages.
    struct StaticSource {
        map: HashMap<String, Vec<String>>,
        fetches: AtomicUsize,
    }

    impl StaticSource {
        fn new(entries: &[(&str, &[&str])]) -> Self {
            let map = entries
                .iter()
                .map(|(topic, links)| {
                    (
                        topic.to_string(),
                        links.iter().map(|l| l.to_string()).collect(),
                    )
                })
                .collect();
            Self {
                map,
                fetches: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl LinkSource for StaticSource {
        async fn fetch_links(&self, topic: &str) -> Result<Vec<String>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(self.map.get(topic).cloned().unwrap_or_default())
        }
    }

    /// Fails every fetch for one topic, serves the rest from the mapping.
    struct FailingSource {
        inner: StaticSource,
        poison: String,
    }

    #[async_trait]
    impl LinkSource for FailingSource {
        async fn fetch_links(&self, topic: &str) -> Result<Vec<String>> {
            if topic == self.poison {
                return Err(anyhow!("upstream unavailable"));
            }
            self.inner.fetch_links(topic).await
        }
    }

    fn node<'a>(graph: &'a LinkGraph, id: &str) -> &'a GraphNode {
        graph
            .nodes
            .iter()
            .find(|n| n.id == id)
            .unwrap_or_else(|| panic!("node {id} missing"))
    }

    fn ids(graph: &LinkGraph) -> Vec<&str> {
        let mut ids: Vec<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
        ids.sort_unstable();
        ids
    }

    #[tokio::test]
    async fn depth_zero_records_only_root_with_full_links() {
        let source = Arc::new(StaticSource::new(&[("Root", &["Child1", "Child2"])]));
        let graph = GraphBuilder::new(source.clone())
            .build("Root", 0)
            .await
            .unwrap();

        assert_eq!(graph.root, "Root");
        assert_eq!(ids(&graph), ["Root"]);
        assert_eq!(node(&graph, "Root").links, ["Child1", "Child2"]);
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn title_is_id_with_underscores_replaced() {
        let source = Arc::new(StaticSource::new(&[("Albert_Einstein", &[])]));
        let graph = GraphBuilder::new(source)
            .build("Albert_Einstein", 0)
            .await
            .unwrap();

        assert_eq!(node(&graph, "Albert_Einstein").title, "Albert Einstein");
    }

    #[tokio::test]
    async fn child_recursion_rewrites_spaces_to_underscores() {
        // The upstream reports link titles with spaces, but takes underscore
        // ids; a node's own links stay verbatim.
        let source = Arc::new(StaticSource::new(&[
            ("Root", &["Albert Einstein"]),
            ("Albert_Einstein", &[]),
        ]));
        let graph = GraphBuilder::new(source).build("Root", 1).await.unwrap();

        assert_eq!(ids(&graph), ["Albert_Einstein", "Root"]);
        assert_eq!(node(&graph, "Root").links, ["Albert Einstein"]);
    }

    #[tokio::test]
    async fn frontier_node_keeps_links_but_is_not_expanded() {
        let source = Arc::new(StaticSource::new(&[
            ("Root", &["Child"]),
            ("Child", &["Grandchild1", "Grandchild2"]),
        ]));
        let graph = GraphBuilder::new(source).build("Root", 1).await.unwrap();

        assert_eq!(ids(&graph), ["Child", "Root"]);
        assert_eq!(node(&graph, "Child").links, ["Grandchild1", "Grandchild2"]);
    }

    #[tokio::test]
    async fn self_loop_yields_one_node_with_self_in_links() {
        let source = Arc::new(StaticSource::new(&[("A", &["A"])]));
        let graph = GraphBuilder::new(source.clone()).build("A", 1).await.unwrap();

        assert_eq!(ids(&graph), ["A"]);
        assert_eq!(node(&graph, "A").links, ["A"]);
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn topic_referenced_at_multiple_depths_is_fetched_once() {
        let source = Arc::new(StaticSource::new(&[
            ("A", &["B", "C"]),
            ("B", &["C"]),
            ("C", &["D"]),
            ("D", &[]),
        ]));
        let graph = GraphBuilder::new(source.clone()).build("A", 2).await.unwrap();

        assert_eq!(ids(&graph), ["A", "B", "C", "D"]);
        assert_eq!(node(&graph, "C").links, ["D"]);
        assert_eq!(node(&graph, "D").links, Vec::<String>::new());
        assert_eq!(source.fetches.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn fetch_failure_aborts_whole_build() {
        let source = Arc::new(FailingSource {
            inner: StaticSource::new(&[("A", &["B", "C"]), ("B", &[])]),
            poison: "C".to_string(),
        });
        let err = GraphBuilder::new(source).build("A", 1).await.unwrap_err();

        assert_eq!(err.topic, "C");
        assert!(err.source.to_string().contains("upstream unavailable"));
    }

    #[tokio::test]
    async fn root_fetch_failure_fails_the_build() {
        let source = Arc::new(FailingSource {
            inner: StaticSource::new(&[]),
            poison: "A".to_string(),
        });
        let err = GraphBuilder::new(source).build("A", 3).await.unwrap_err();
        assert_eq!(err.topic, "A");
    }

    #[tokio::test]
    async fn fetch_limit_does_not_change_output() {
        let source = Arc::new(StaticSource::new(&[
            ("A", &["B", "C", "D"]),
            ("B", &["C"]),
            ("C", &[]),
            ("D", &["B"]),
        ]));
        let graph = GraphBuilder::new(source)
            .with_fetch_limit(1)
            .build("A", 2)
            .await
            .unwrap();

        assert_eq!(ids(&graph), ["A", "B", "C", "D"]);
        assert_eq!(node(&graph, "D").links, ["B"]);
    }
}
