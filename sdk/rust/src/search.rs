//! Search URL construction
//!
//! A [`SearchRequest`] is assembled from one of two entry points,
//! [`SearchRequest::by_term`] or [`SearchRequest::by_filter`], and compiled
//! against a [`SearchDomain`] into the full search URL.
//!
//! Fragment order is fixed: `q`, `fq`, facets, `size`, `return`, `start`,
//! `sort`.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::escape::form_escape;
use crate::facet::FacetSpec;
use crate::filter::{FilterExpression, compile_all};

pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_API_VERSION: &str = "2013-01-01";
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// A search domain: name, region and API version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchDomain {
    pub name: String,
    pub region: String,
    pub api_version: String,
}

impl SearchDomain {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            region: DEFAULT_REGION.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    fn endpoint(&self, kind: &str, path: &str) -> Result<String> {
        if self.name.is_empty() {
            return Err(Error::MissingSearchDomain);
        }
        Ok(format!(
            "http://{}-{}.{}.cloudsearch.amazonaws.com/{}/{}",
            kind, self.name, self.region, self.api_version, path
        ))
    }

    /// Search endpoint (without query string)
    pub fn search_url(&self) -> Result<String> {
        self.endpoint("search", "search")
    }

    /// Document batch endpoint
    pub fn document_url(&self) -> Result<String> {
        self.endpoint("doc", "documents/batch")
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Asc => write!(f, "asc"),
            SortDirection::Desc => write!(f, "desc"),
        }
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(format!(
                "Invalid sort direction '{}'. Valid options: asc, desc",
                s
            )),
        }
    }
}

/// Sort directive: field plus direction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }

    pub fn asc(field: impl Into<String>) -> Self {
        Self::new(field, SortDirection::Asc)
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self::new(field, SortDirection::Desc)
    }

    fn to_param(&self) -> String {
        format!("&sort={}%20{}", self.field, self.direction)
    }
}

/// Parses `field`, `field:asc` or `field:desc`
impl FromStr for SortSpec {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (field, direction) = match s.split_once(':') {
            Some((field, dir)) => (field, dir.parse()?),
            None => (s, SortDirection::default()),
        };
        if field.is_empty() {
            return Err("Sort field must not be empty".to_string());
        }
        Ok(Self::new(field, direction))
    }
}

/// 1-based page number and page size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSpec {
    pub page: u32,
    pub page_size: u32,
}

impl PageSpec {
    /// Zero-based result offset; page 0 is treated as page 1
    pub fn offset(&self) -> u64 {
        u64::from(self.page.max(1) - 1) * u64::from(self.page_size)
    }
}

/// Logical search request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchRequest {
    term: String,
    filters: Vec<FilterExpression>,
    facets: Option<FacetSpec>,
    sort: Option<SortSpec>,
    page: Option<u32>,
    page_size: Option<u32>,
    return_fields: Option<Vec<String>>,
}

impl SearchRequest {
    /// Full-text search for `term`
    pub fn by_term(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            ..Self::default()
        }
    }

    /// Filter-only search (empty term)
    pub fn by_filter(filter: FilterExpression) -> Self {
        Self::default().filter(filter)
    }

    /// Add a top-level filter expression
    pub fn filter(mut self, filter: FilterExpression) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn filters(mut self, filters: impl IntoIterator<Item = FilterExpression>) -> Self {
        self.filters.extend(filters);
        self
    }

    pub fn facets(mut self, facets: FacetSpec) -> Self {
        self.facets = Some(facets);
        self
    }

    pub fn sort(mut self, sort: SortSpec) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn return_fields<S: Into<String>>(mut self, fields: impl IntoIterator<Item = S>) -> Self {
        self.return_fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    pub fn effective_page_size(&self) -> u32 {
        self.page_size.unwrap_or(DEFAULT_PAGE_SIZE)
    }

    pub fn page_spec(&self) -> Option<PageSpec> {
        self.page.map(|page| PageSpec {
            page,
            page_size: self.effective_page_size(),
        })
    }

    /// Query string beginning with `?q=`
    pub fn query_string(&self) -> String {
        let mut query = format!("?q={}", form_escape(&self.term));

        let compiled = compile_all(&self.filters);
        if !compiled.is_empty() {
            query.push_str("&fq=");
            query.push_str(&compiled);
        }

        if let Some(facets) = &self.facets {
            query.push_str(&facets.compile());
        }

        query.push_str(&format!("&size={}", self.effective_page_size()));

        if let Some(fields) = &self.return_fields {
            query.push_str("&return=");
            query.push_str(&fields.join(","));
        }

        if let Some(page) = self.page_spec() {
            query.push_str(&format!("&start={}", page.offset()));
        }

        if let Some(sort) = &self.sort {
            query.push_str(&sort.to_param());
        }

        query
    }
}

/// Compile a request into the full search URL for `domain`
pub fn build_url(domain: &SearchDomain, request: &SearchRequest) -> Result<String> {
    Ok(format!("{}{}", domain.search_url()?, request.query_string()))
}
