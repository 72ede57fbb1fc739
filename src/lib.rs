pub mod config;
pub mod graph;
pub mod rest;
pub mod wikipedia;

use std::sync::Arc;

use config::GraphdConfig;
use graph::{GraphBuilder, LinkSource};

/// Shared application state passed to every REST handler.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<GraphdConfig>,
    pub builder: Arc<GraphBuilder>,
    pub started_at: std::time::Instant,
}

impl AppContext {
    /// Wires a builder around the given link source, honoring the configured
    /// fan-out cap.
    pub fn new(config: Arc<GraphdConfig>, source: Arc<dyn LinkSource>) -> Self {
        let builder = GraphBuilder::new(source)
            .with_fetch_limit(config.limits.max_concurrent_fetches);
        Self {
            config,
            builder: Arc::new(builder),
            started_at: std::time::Instant::now(),
        }
    }
}
