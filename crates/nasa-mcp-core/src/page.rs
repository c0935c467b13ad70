use serde::{Deserialize, Serialize};

/// One item from the NASA image catalog. Immutable once constructed;
/// items are not deduplicated across searches.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogImage {
    pub nasa_id: String,
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub date_created: String,
    pub center: String,
}

/// The materialized result set for a session's current query, plus a
/// cursor into it.
///
/// Invariant: `cursor < items.len()` whenever `items` is non-empty.
/// Only `search` (full replacement, cursor back to 0) and `advance`
/// (cyclic step) mutate a page.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResultPage {
    query: String,
    items: Vec<CatalogImage>,
    cursor: usize,
    total_hits: u64,
}

impl ResultPage {
    /// Build a fresh page with the cursor at the first item.
    pub fn new(query: impl Into<String>, items: Vec<CatalogImage>, total_hits: u64) -> Self {
        Self {
            query: query.into(),
            items,
            cursor: 0,
            total_hits,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn total_hits(&self) -> u64 {
        self.total_hits
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// The item at the cursor, or `None` if the page is empty.
    pub fn current(&self) -> Option<&CatalogImage> {
        self.items.get(self.cursor)
    }

    /// Move the cursor forward one position, wrapping past the last item.
    /// Returns the item now under the cursor; `None` (and no state change)
    /// if the page is empty.
    pub fn advance(&mut self) -> Option<&CatalogImage> {
        if self.items.is_empty() {
            return None;
        }
        self.cursor = (self.cursor + 1) % self.items.len();
        self.items.get(self.cursor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(n: usize) -> CatalogImage {
        CatalogImage {
            nasa_id: format!("id-{n}"),
            title: format!("Image {n}"),
            description: "desc".into(),
            image_url: format!("https://images.example/{n}.jpg"),
            date_created: "2003-01-01T00:00:00Z".into(),
            center: "JSC".into(),
        }
    }

    fn page(n: usize) -> ResultPage {
        ResultPage::new("apollo", (0..n).map(image).collect(), n as u64)
    }

    #[test]
    fn new_page_starts_at_zero() {
        let p = page(5);
        assert_eq!(p.cursor(), 0);
        assert_eq!(p.current().unwrap().nasa_id, "id-0");
        assert_eq!(p.query(), "apollo");
        assert_eq!(p.total_hits(), 5);
    }

    #[test]
    fn advance_wraps_cyclically() {
        let mut p = page(3);
        assert_eq!(p.advance().unwrap().nasa_id, "id-1");
        assert_eq!(p.advance().unwrap().nasa_id, "id-2");
        assert_eq!(p.advance().unwrap().nasa_id, "id-0");
        assert_eq!(p.cursor(), 0);
    }

    #[test]
    fn n_advances_return_to_start() {
        let mut p = page(20);
        let start = p.current().unwrap().clone();
        for _ in 0..20 {
            let _ = p.advance();
        }
        assert_eq!(p.current().unwrap(), &start);
    }

    #[test]
    fn empty_page_has_no_current() {
        let p = page(0);
        assert!(p.is_empty());
        assert!(p.current().is_none());
    }

    #[test]
    fn advance_on_empty_page_does_not_mutate() {
        let mut p = page(0);
        assert!(p.advance().is_none());
        assert_eq!(p.cursor(), 0);
        assert!(p.is_empty());
    }

    #[test]
    fn single_item_advance_stays_put() {
        let mut p = page(1);
        assert_eq!(p.advance().unwrap().nasa_id, "id-0");
        assert_eq!(p.cursor(), 0);
    }

    #[test]
    fn serde_roundtrip() {
        let p = page(2);
        let json = serde_json::to_string(&p).unwrap();
        let back: ResultPage = serde_json::from_str(&json).unwrap();
        assert_eq!(back.len(), 2);
        assert_eq!(back.cursor(), 0);
        assert_eq!(back.query(), "apollo");
    }
}
