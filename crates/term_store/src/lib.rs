use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header::ACCEPT, Client};
use shared::{
    domain::{Term, TermId},
    error::FetchError,
    protocol::TermCollection,
};
use thiserror::Error;
use tracing::debug;
use url::Url;

mod static_repository;
pub use static_repository::StaticTermRepository;

/// Source of the immediate children of a taxonomy node.
///
/// Implementations hold no selection state and never retry; an empty vector means the
/// parent is a leaf, which is not an error.
#[async_trait]
pub trait TermRepository: Send + Sync {
    async fn fetch_children(&self, parent: &TermId) -> Result<Vec<Term>, FetchError>;
}

#[derive(Debug, Error)]
pub enum EndpointError {
    #[error("invalid site url: {0}")]
    InvalidSiteUrl(#[from] url::ParseError),
    #[error("site url {0} cannot carry a path")]
    NotABase(String),
    #[error("missing {0}")]
    MissingIdentifier(&'static str),
}

/// Location of one term set inside a site's term store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermStoreEndpoint {
    site_url: Url,
    group_id: String,
    set_id: String,
}

impl TermStoreEndpoint {
    pub fn new(
        site_url: &str,
        group_id: impl Into<String>,
        set_id: impl Into<String>,
    ) -> Result<Self, EndpointError> {
        let site_url = Url::parse(site_url.trim())?;
        if site_url.cannot_be_a_base() {
            return Err(EndpointError::NotABase(site_url.to_string()));
        }
        let group_id = group_id.into();
        if group_id.trim().is_empty() {
            return Err(EndpointError::MissingIdentifier("term group id"));
        }
        let set_id = set_id.into();
        if set_id.trim().is_empty() {
            return Err(EndpointError::MissingIdentifier("term set id"));
        }
        Ok(Self {
            site_url,
            group_id,
            set_id,
        })
    }

    pub fn children_url(&self, parent: &TermId) -> Url {
        let mut url = self.site_url.clone();
        // `new` rejects cannot-be-a-base urls, so the segments are always available.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend([
                "_api",
                "v2.1",
                "termStore",
                "groups",
                self.group_id.as_str(),
                "sets",
                self.set_id.as_str(),
                "terms",
                parent.as_str(),
                "children",
            ]);
        }
        url.set_query(Some("select=*"));
        url
    }
}

pub struct HttpTermRepository {
    http: Client,
    endpoint: TermStoreEndpoint,
    access_token: Option<String>,
}

impl HttpTermRepository {
    pub fn new(endpoint: TermStoreEndpoint) -> Self {
        Self::with_client(Client::new(), endpoint)
    }

    pub fn with_timeout(
        endpoint: TermStoreEndpoint,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(http, endpoint))
    }

    pub fn with_client(http: Client, endpoint: TermStoreEndpoint) -> Self {
        Self {
            http,
            endpoint,
            access_token: None,
        }
    }

    /// Bearer token obtained by the host's session layer.
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn endpoint(&self) -> &TermStoreEndpoint {
        &self.endpoint
    }
}

#[async_trait]
impl TermRepository for HttpTermRepository {
    async fn fetch_children(&self, parent: &TermId) -> Result<Vec<Term>, FetchError> {
        let url = self.endpoint.children_url(parent);
        debug!(%parent, %url, "fetching term children");

        let mut request = self.http.get(url).header(ACCEPT, "application/json");
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|err| FetchError::transport(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::status(
                status.as_u16(),
                status.canonical_reason().unwrap_or("unexpected status"),
            ));
        }

        let body = response
            .bytes()
            .await
            .map_err(|err| FetchError::transport(err.to_string()))?;
        let collection: TermCollection =
            serde_json::from_slice(&body).map_err(|err| FetchError::malformed(err.to_string()))?;
        let terms = collection.into_terms()?;
        debug!(%parent, count = terms.len(), "term children loaded");
        Ok(terms)
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
