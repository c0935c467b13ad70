pub mod client;
pub mod error;
pub mod types;

pub use client::{CatalogClient, SearchPage, DEFAULT_BASE_URL, PAGE_SIZE};
pub use error::CatalogError;
