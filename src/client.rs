//! Search execution against a SCIM service.
//!
//! [`ScimSearch`] is the seam between query construction and transport: it
//! takes a built [`Query`] and returns one page of results. [`HttpSearchClient`]
//! implements it over `reqwest`; [`fetch_all`] walks every page of a query
//! through any implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::{
    config::ClientConfig,
    scim::{
        Query, QueryError, ResourceType, ScimErrorResponse, ScimErrorType, ScimListResponse,
    },
};

/// Media types accepted from the server.
const ACCEPT_SCIM: &str = "application/scim+json, application/json";

/// Errors raised while executing a search.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("Invalid SCIM endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to decode SCIM response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("SCIM server returned {status}: {detail}")]
    Server {
        status: u16,
        scim_type: Option<ScimErrorType>,
        detail: String,
    },

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("Stopped after {0} pages without reaching the last page")]
    PageLimitExceeded(u32),
}

/// Executes a query and returns one page of typed resources.
#[async_trait]
pub trait ScimSearch: Send + Sync {
    async fn search<T>(&self, query: &Query) -> Result<ScimListResponse<T>, SearchError>
    where
        T: DeserializeOwned + Send;
}

/// Follow `query` page by page and collect every resource.
///
/// Paging is driven by each returned page (see [`Query::next_page_after`]).
/// Fails with [`SearchError::PageLimitExceeded`] if more than `max_pages`
/// pages would be needed. The first page is always fetched, so a limit of
/// zero behaves like one.
pub async fn fetch_all<S, T>(search: &S, query: &Query, max_pages: u32) -> Result<Vec<T>, SearchError>
where
    S: ScimSearch,
    T: DeserializeOwned + Send,
{
    let max_pages = max_pages.max(1);
    let mut resources = Vec::new();
    let mut current = query.clone();

    for page in 1..=max_pages {
        let result: ScimListResponse<T> = search.search(&current).await?;
        let next = current.next_page_after(&result);

        debug!(
            resource = %current.resource(),
            page,
            start_index = result.start_index(),
            returned = result.resources().len(),
            total_results = result.total_results(),
            "Fetched SCIM page"
        );

        resources.extend(result.into_resources());
        match next {
            Some(next) => current = next,
            None => return Ok(resources),
        }
    }

    warn!(
        resource = %query.resource(),
        max_pages,
        collected = resources.len(),
        "SCIM paging stopped at page limit"
    );
    Err(SearchError::PageLimitExceeded(max_pages))
}

/// [`ScimSearch`] over HTTP.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct HttpSearchClient {
    client: reqwest::Client,
    endpoint: Url,
    access_token: Option<String>,
    max_pages: u32,
}

impl HttpSearchClient {
    /// Client for the SCIM base URL `endpoint` (e.g. `https://idp.example.com/scim/v2`).
    pub fn new(endpoint: &str, access_token: Option<String>) -> Result<Self, SearchError> {
        let endpoint =
            Url::parse(endpoint).map_err(|e| SearchError::InvalidEndpoint(e.to_string()))?;
        Ok(Self::with_client(reqwest::Client::new(), endpoint, access_token))
    }

    pub fn with_client(client: reqwest::Client, endpoint: Url, access_token: Option<String>) -> Self {
        Self {
            client,
            endpoint,
            access_token,
            max_pages: 1000,
        }
    }

    /// Build a client from validated configuration, applying its timeout and page limit.
    pub fn from_config(config: &ClientConfig) -> Result<Self, SearchError> {
        let endpoint = config
            .endpoint_url()
            .map_err(|e| SearchError::InvalidEndpoint(e.to_string()))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self::with_client(client, endpoint, config.access_token.clone())
            .with_max_pages(config.paging.max_pages))
    }

    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Search with a hand-written filter expression.
    pub async fn search_raw<T>(
        &self,
        resource: ResourceType,
        filter: &str,
    ) -> Result<ScimListResponse<T>, SearchError>
    where
        T: DeserializeOwned + Send,
    {
        let query = Query::builder(resource).with_raw_filter(filter).build()?;
        self.search(&query).await
    }

    /// Every resource matching `query`, bounded by the configured page limit.
    pub async fn fetch_all<T>(&self, query: &Query) -> Result<Vec<T>, SearchError>
    where
        T: DeserializeOwned + Send,
    {
        fetch_all(self, query, self.max_pages).await
    }

    fn search_url(&self, query: &Query) -> Result<Url, SearchError> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| SearchError::InvalidEndpoint(self.endpoint.to_string()))?
            .pop_if_empty()
            .push(query.resource().endpoint());

        let query_string = query.to_query_string();
        if !query_string.is_empty() {
            url.set_query(Some(&query_string));
        }
        Ok(url)
    }
}

#[async_trait]
impl ScimSearch for HttpSearchClient {
    async fn search<T>(&self, query: &Query) -> Result<ScimListResponse<T>, SearchError>
    where
        T: DeserializeOwned + Send,
    {
        let url = self.search_url(query)?;
        debug!(
            url = %url,
            filter = query.filter().unwrap_or(""),
            "Sending SCIM search"
        );

        let mut request = self.client.get(url).header(ACCEPT, ACCEPT_SCIM);
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let (scim_type, detail) = match serde_json::from_str::<ScimErrorResponse>(&body) {
                Ok(error) => (error.scim_type, error.detail),
                Err(_) => (None, body),
            };
            warn!(
                status = status.as_u16(),
                scim_type = ?scim_type,
                detail = %detail,
                "SCIM search failed"
            );
            return Err(SearchError::Server {
                status: status.as_u16(),
                scim_type,
                detail,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}
