//! Search result pages

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::Result;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Hit {
    pub id: String,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
struct Hits {
    #[serde(default)]
    found: u64,
    #[serde(default)]
    start: u64,
    #[serde(default)]
    hit: Vec<Hit>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct SearchBody {
    #[serde(default)]
    hits: Hits,
}

/// One page of search results with pagination metadata
#[derive(Debug, Clone, PartialEq)]
pub struct SearchPage {
    hits: Vec<Hit>,
    found: u64,
    start: u64,
    page_size: u32,
}

impl SearchPage {
    /// Parse a search response body.
    ///
    /// `page_size` is the size the request asked for; the response does not
    /// echo it back.
    pub fn from_json(body: &str, page_size: u32) -> Result<Self> {
        let body: SearchBody = serde_json::from_str(body)?;
        Ok(Self {
            hits: body.hits.hit,
            found: body.hits.found,
            start: body.hits.start,
            page_size,
        })
    }

    /// A page with no hits, as returned in sandbox mode
    pub fn empty(page_size: u32) -> Self {
        Self {
            hits: Vec::new(),
            found: 0,
            start: 0,
            page_size,
        }
    }

    pub fn hits(&self) -> &[Hit] {
        &self.hits
    }

    /// Document ids in response order
    pub fn ids(&self) -> Vec<&str> {
        self.hits.iter().map(|hit| hit.id.as_str()).collect()
    }

    /// Id to returned fields, in response order
    pub fn documents(&self) -> Vec<(&str, &Map<String, Value>)> {
        self.hits
            .iter()
            .map(|hit| (hit.id.as_str(), &hit.fields))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn total_entries(&self) -> u64 {
        self.found
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn offset(&self) -> u64 {
        self.start
    }

    /// 1-based page number
    pub fn current_page(&self) -> u64 {
        if self.page_size == 0 {
            return 1;
        }
        self.start / u64::from(self.page_size) + 1
    }

    pub fn total_pages(&self) -> u64 {
        if self.page_size == 0 {
            return 1;
        }
        self.found.div_ceil(u64::from(self.page_size)).max(1)
    }

    /// JSON view used for printing: pagination plus hits
    pub fn to_json(&self) -> Value {
        let hits = self
            .hits
            .iter()
            .map(|hit| {
                serde_json::json!({
                    "id": hit.id,
                    "fields": hit.fields,
                })
            })
            .collect::<Vec<_>>();
        serde_json::json!({
            "total_entries": self.found,
            "current_page": self.current_page(),
            "total_pages": self.total_pages(),
            "page_size": self.page_size,
            "hits": hits,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    const BODY: &str = r#"{
        "status": {"rid": "abc", "time-ms": 3},
        "hits": {
            "found": 25,
            "start": 10,
            "hit": [
                {"id": "123", "fields": {"title": "Star Wars"}},
                {"id": "456"}
            ]
        }
    }"#;

    #[test]
    fn test_parse_page() {
        let page = SearchPage::from_json(BODY, 10).unwrap();
        assert_eq!(page.ids(), vec!["123", "456"]);
        assert_eq!(page.len(), 2);
        assert!(!page.is_empty());
        assert_eq!(page.total_entries(), 25);
        assert_eq!(page.offset(), 10);
        assert_eq!(page.current_page(), 2);
        assert_eq!(page.total_pages(), 3);
    }

    #[test]
    fn test_documents_carry_fields() {
        let page = SearchPage::from_json(BODY, 10).unwrap();
        let docs = page.documents();
        assert_eq!(docs[0].0, "123");
        assert_eq!(docs[0].1["title"], "Star Wars");
        assert!(docs[1].1.is_empty());
    }

    #[test]
    fn test_total_pages_at_least_one() {
        let page = SearchPage::from_json(r#"{"hits":{"found":0,"start":0,"hit":[]}}"#, 10).unwrap();
        assert_eq!(page.total_pages(), 1);
        assert_eq!(page.current_page(), 1);
        assert!(page.is_empty());
    }

    #[test]
    fn test_exact_multiple_of_page_size() {
        let page = SearchPage::from_json(r#"{"hits":{"found":20,"start":0,"hit":[]}}"#, 10).unwrap();
        assert_eq!(page.total_pages(), 2);
    }

    #[test]
    fn test_empty_page() {
        let page = SearchPage::empty(25);
        assert!(page.is_empty());
        assert_eq!(page.page_size(), 25);
        assert_eq!(page.total_entries(), 0);
        assert_eq!(page.total_pages(), 1);
    }

    #[test]
    fn test_missing_hits_is_empty() {
        let page = SearchPage::from_json("{}", 10).unwrap();
        assert!(page.is_empty());
    }

    #[test]
    fn test_malformed_body() {
        let err = SearchPage::from_json("not json", 10).unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[test]
    fn test_to_json() {
        let page = SearchPage::from_json(BODY, 10).unwrap();
        let value = page.to_json();
        assert_eq!(value["total_entries"], 25);
        assert_eq!(value["current_page"], 2);
        assert_eq!(value["hits"][0]["id"], "123");
    }
}
