//! # Stratus
//!
//! Client-side query compiler and SigV4-signed client for managed
//! CloudSearch domains.
//!
//! Structured filters, facets, sorting and pagination are compiled into the
//! search endpoint's URL grammar, and document batches are signed with AWS
//! Signature Version 4 before they are posted.
//!
//! ## Quick Start
//!
//! ```
//! use stratus::{FilterExpression, SearchDomain, SearchRequest, SortSpec, build_url};
//!
//! let domain = SearchDomain::new("movies").with_region("us-west-2");
//! let request = SearchRequest::by_term("star wars")
//!     .filter(FilterExpression::range("year", 1977, 1983))
//!     .sort(SortSpec::desc("year"));
//!
//! let url = build_url(&domain, &request).unwrap();
//! assert!(url.starts_with("http://search-movies.us-west-2.cloudsearch.amazonaws.com/"));
//! ```
//!
//! Talking to a live domain goes through [`SearchClient`], which takes a
//! [`Transport`] and a [`CredentialProvider`] so both can be swapped out in
//! tests.

pub mod client;
pub mod credentials;
pub mod document;
pub mod error;
pub mod escape;
pub mod facet;
pub mod filter;
pub mod response;
pub mod search;
pub mod signer;
pub mod transport;

pub use client::{Mode, SearchClient};
pub use credentials::{CredentialProvider, EnvCredentialProvider, StaticCredentialProvider};
pub use document::{DocumentBatch, DocumentOperation, FieldValue, Fields};
pub use error::{Error, Result};
pub use escape::{aws_canonical_query, form_escape};
pub use facet::{FacetOptions, FacetSpec, FacetValue, parse_facets};
pub use filter::{BoolOp, FilterExpression, Numeric, Scalar, compile_all, parse_filter};
pub use response::{Hit, SearchPage};
pub use search::{PageSpec, SearchDomain, SearchRequest, SortDirection, SortSpec, build_url};
pub use signer::{Clock, Credential, FixedClock, SignatureHeaders, SignedRequest, SystemClock, sign};
pub use transport::{HttpResponse, ReqwestTransport, Transport};
