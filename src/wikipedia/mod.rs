//! MediaWiki-backed link source.
//!
//! One GET per topic against the action API
//! (`action=query&prop=links&plnamespace=0&pllimit=500&format=json`).
//! A missing page, or a page without links, is reported as an empty list —
//! only transport failures and non-2xx responses are errors.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;

use crate::config::GraphdConfig;
use crate::graph::LinkSource;

pub struct WikipediaSource {
    client: reqwest::Client,
    api_url: String,
}

impl WikipediaSource {
    pub fn new(config: &GraphdConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.fetch_timeout_secs))
            .user_agent(concat!("wikigraphd/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            api_url: config.api_url.clone(),
        })
    }
}

// ─── API types (deserialize response) ────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct QueryResponse {
    query: Option<Query>,
}

#[derive(Debug, Deserialize)]
struct Query {
    pages: Option<HashMap<String, Page>>,
}

#[derive(Debug, Deserialize)]
struct Page {
    #[serde(default)]
    links: Vec<PageLink>,
}

#[derive(Debug, Deserialize)]
struct PageLink {
    title: String,
}

#[async_trait]
impl LinkSource for WikipediaSource {
    async fn fetch_links(&self, topic: &str) -> Result<Vec<String>> {
        let resp = self
            .client
            .get(&self.api_url)
            .query(&[
                ("action", "query"),
                ("titles", topic),
                ("prop", "links"),
                ("plnamespace", "0"),
                ("pllimit", "500"),
                ("format", "json"),
            ])
            .send()
            .await?
            .error_for_status()?;

        let body: QueryResponse = resp.json().await?;
        Ok(extract_links(body))
    }
}

/// The query keys pages by page id; a single-title query yields one entry
/// (page id "-1" for missing pages, with no links field). Anything absent
/// means "no links", never an error.
fn extract_links(body: QueryResponse) -> Vec<String> {
    let Some(pages) = body.query.and_then(|q| q.pages) else {
        return Vec::new();
    };
    pages
        .into_values()
        .next()
        .map(|page| page.links)
        .unwrap_or_default()
        .into_iter()
        .map(|link| link.title)
        .collect()
}
