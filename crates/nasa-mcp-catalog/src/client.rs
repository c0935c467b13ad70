use std::time::Duration;

use reqwest::Client;
use tracing::{debug, warn};

use nasa_mcp_core::CatalogImage;

use crate::error::CatalogError;
use crate::types::SearchResponse;

/// Production NASA Images API base URL.
pub const DEFAULT_BASE_URL: &str = "https://images-api.nasa.gov";

/// Fixed result page size. The server never paginates past the first page.
pub const PAGE_SIZE: usize = 20;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// One page of search results as returned by the upstream catalog.
#[derive(Debug)]
pub struct SearchPage {
    pub items: Vec<CatalogImage>,
    pub total_hits: u64,
}

/// Thin client for the NASA Images API `/search` endpoint.
///
/// Bounded to one `PAGE_SIZE` page of `media_type=image` results. Fails
/// closed: any transport error, non-success status, or unparsable body
/// surfaces as a [`CatalogError`] and nothing is returned.
#[derive(Clone)]
pub struct CatalogClient {
    http: Client,
    base_url: String,
}

impl CatalogClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, CatalogError> {
        let http = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    /// Search the catalog for `query`, returning at most one page.
    ///
    /// Zero matches is a success with an empty item list, not an error.
    pub async fn search(&self, query: &str) -> Result<SearchPage, CatalogError> {
        let url = format!("{}/search", self.base_url);
        let resp = self
            .http
            .get(&url)
            .query(&[
                ("q", query),
                ("media_type", "image"),
                ("page_size", &PAGE_SIZE.to_string()),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), query, "catalog search failed");
            return Err(CatalogError::Status {
                status: status.as_u16(),
            });
        }

        let body: SearchResponse = resp
            .json()
            .await
            .map_err(|e| CatalogError::Malformed(e.to_string()))?;

        let total_hits = body
            .collection
            .metadata
            .map(|m| m.total_hits)
            .unwrap_or(body.collection.items.len() as u64);

        let mut items = Vec::with_capacity(body.collection.items.len());
        for entry in body.collection.items {
            // Entries without metadata or a preview link are skipped, the
            // same filtering the upstream browse UI applies.
            let Some(data) = entry.data.into_iter().next() else {
                continue;
            };
            let Some(image_url) = entry.links.into_iter().find_map(|l| l.href) else {
                continue;
            };

            items.push(CatalogImage {
                nasa_id: data.nasa_id,
                title: data.title.unwrap_or_else(|| "Untitled".into()),
                description: data
                    .description
                    .unwrap_or_else(|| "No description available".into()),
                image_url,
                date_created: data.date_created.unwrap_or_default(),
                center: data.center.unwrap_or_else(|| "NASA".into()),
            });
        }

        debug!(query, count = items.len(), total_hits, "catalog search ok");
        Ok(SearchPage { items, total_hits })
    }
}
