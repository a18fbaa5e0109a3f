//! High-level client for a search domain

use std::sync::Arc;

use crate::credentials::CredentialProvider;
use crate::document::{DocumentBatch, DocumentOperation, Fields};
use crate::error::{Error, Result};
use crate::response::SearchPage;
use crate::search::{SearchDomain, SearchRequest, build_url};
use crate::signer::{Clock, SystemClock, sign};
use crate::transport::Transport;

pub const CONTENT_TYPE_HEADER: &str = "Content-Type";
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Whether calls reach the service
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Live,
    /// Every call succeeds locally without touching transport or credentials
    Sandbox,
}

#[derive(Debug, Clone)]
pub struct SearchClient {
    domain: SearchDomain,
    transport: Arc<dyn Transport>,
    credentials: Arc<dyn CredentialProvider>,
    clock: Arc<dyn Clock>,
    mode: Mode,
}

impl SearchClient {
    pub fn new(
        domain: SearchDomain,
        transport: Arc<dyn Transport>,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Self {
        Self {
            domain,
            transport,
            credentials,
            clock: Arc::new(SystemClock),
            mode: Mode::Live,
        }
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn domain(&self) -> &SearchDomain {
        &self.domain
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Run a search and parse the result page
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchPage> {
        let page_size = request.effective_page_size();
        if self.mode == Mode::Sandbox {
            return Ok(SearchPage::empty(page_size));
        }

        let url = build_url(&self.domain, request)?;
        tracing::debug!(url = %url, "Sending search request");

        let response = self.transport.get(&url, &[]).await?;
        tracing::debug!(status = response.status, "Search response");

        if !response.is_ok() {
            return Err(Error::SearchFailed {
                status: response.status,
                message: response.reason,
                url,
            });
        }
        SearchPage::from_json(&response.body, page_size)
    }

    /// Add or replace a document
    pub async fn add_item(&self, id: impl ToString, fields: Fields) -> Result<()> {
        self.send_document(DocumentOperation::add(id, fields)).await
    }

    /// Same wire call as [`add_item`](Self::add_item)
    pub async fn update_item(&self, id: impl ToString, fields: Fields) -> Result<()> {
        self.add_item(id, fields).await
    }

    /// Deleting an absent id still succeeds
    pub async fn remove_item(&self, id: impl ToString) -> Result<()> {
        self.send_document(DocumentOperation::delete(id)).await
    }

    async fn send_document(&self, operation: DocumentOperation) -> Result<()> {
        if self.mode == Mode::Sandbox {
            return Ok(());
        }

        let url = self.domain.document_url()?;
        let body = DocumentBatch::single(operation).to_json()?;
        let credential = self.credentials.credential().await?;
        let signature = sign(
            "POST",
            &url,
            body.as_bytes(),
            &credential,
            self.clock.as_ref(),
        )?;

        let mut headers = vec![(
            CONTENT_TYPE_HEADER.to_string(),
            CONTENT_TYPE_JSON.to_string(),
        )];
        headers.extend(
            signature
                .iter()
                .map(|(name, value)| (name.to_string(), value.to_string())),
        );

        tracing::debug!(
            url = %url,
            credentials = self.credentials.name(),
            bytes = body.len(),
            "Sending document batch"
        );
        let response = self
            .transport
            .post(&url, &headers, body.into_bytes())
            .await?;
        tracing::debug!(status = response.status, "Document batch response");

        if !response.is_ok() {
            return Err(Error::DocumentUpdateFailed {
                status: response.status,
                message: response.reason,
            });
        }
        Ok(())
    }
}
