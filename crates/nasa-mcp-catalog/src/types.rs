//! Wire types for the NASA Images API `/search` response.
//!
//! Only the fields we read are modeled; everything else in the payload is
//! ignored. See <https://images-api.nasa.gov> for the full schema.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    pub collection: Collection,
}

#[derive(Debug, Deserialize)]
pub struct Collection {
    #[serde(default)]
    pub items: Vec<CollectionItem>,
    #[serde(default)]
    pub metadata: Option<Metadata>,
}

#[derive(Debug, Deserialize)]
pub struct Metadata {
    #[serde(default)]
    pub total_hits: u64,
}

#[derive(Debug, Deserialize)]
pub struct CollectionItem {
    #[serde(default)]
    pub data: Vec<ItemData>,
    #[serde(default)]
    pub links: Vec<ItemLink>,
}

#[derive(Debug, Deserialize)]
pub struct ItemData {
    pub nasa_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub date_created: Option<String>,
    #[serde(default)]
    pub center: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ItemLink {
    #[serde(default)]
    pub href: Option<String>,
}
