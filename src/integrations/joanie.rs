//! Readers for the Joanie catalog API.
//!
//! Both readers share one `JoanieClient`, which owns the endpoint, the
//! optional bearer token and the page cache.

use crate::config::Config;
use crate::data::{CatalogItem, CourseListItem, CourseProductRelation, Page, Paginated};
use crate::error::FetchError;
use crate::integrations::page_cache::{AsyncTtlCache, Cached, MAX_TTL};
use crate::integrations::routes::{self, Collection};
use crate::integrations::{SourceReader, HTTP_CLIENT};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// How long a failed response stays cached when the server gave no hint
const ERROR_BACKOFF: Duration = Duration::from_secs(5);
const RATE_LIMIT_BACKOFF: Duration = Duration::from_secs(60);

#[derive(Debug)]
pub struct JoanieClient {
    endpoint: String,
    token: Option<String>,
    cache_ttl: Option<Duration>,
    cache: AsyncTtlCache<String, Cached<Arc<Value>>>,
}

impl JoanieClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            token: None,
            cache_ttl: None,
            cache: AsyncTtlCache::default(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let mut client = Self::new(config.api.endpoint.clone());
        client.token = config.api.token.clone().filter(|t| !t.is_empty());
        if config.cache.enabled {
            client.cache_ttl = Some(Duration::from_secs(config.cache.ttl_secs).min(MAX_TTL));
        }
        client
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Cache successful pages for `ttl`. Without this every call hits the API.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = Some(ttl);
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn clear_cache(&self) {
        self.cache.clear().await;
    }

    /// Fetch one page of `collection` and decode it.
    pub async fn fetch_page<T: DeserializeOwned>(
        &self,
        collection: Collection,
        organization_id: Option<&str>,
        page: u32,
        page_size: u32,
    ) -> Result<Paginated<T>, FetchError> {
        let url = routes::page_url(&self.endpoint, collection, organization_id, page, page_size);
        let body = self.get_json(&url).await?;

        Paginated::<T>::deserialize(&*body)
            .map_err(|e| FetchError::Decode(format!("{}: {}", url, e)))
    }

    async fn get_json(&self, url: &str) -> Result<Arc<Value>, FetchError> {
        let Some(ttl) = self.cache_ttl else {
            return self.get_json_uncached(url).await.map(Arc::new);
        };

        self.cache
            .get_or_init_with_ttl(url.to_string(), move || async move {
                let outcome = self.get_json_uncached(url).await.map(Arc::new);
                let ttl = match &outcome {
                    Ok(_) => ttl,
                    Err(FetchError::RateLimited { retry_after }) => *retry_after,
                    Err(_) => ERROR_BACKOFF,
                };
                (Cached::from(outcome), ttl)
            })
            .await
            .into_result()
    }

    async fn get_json_uncached(&self, url: &str) -> Result<Value, FetchError> {
        tracing::debug!("GET {}", url);

        let mut request = HTTP_CLIENT.get(url).header("Accept", "application/json");
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        let response = request.send().await?;

        if response.status().as_u16() == 429 {
            let retry_after = backoff_from_retry_after(&response).unwrap_or(RATE_LIMIT_BACKOFF);
            tracing::warn!("Joanie API rate limited on {}, retry after {:?}", url, retry_after);
            return Err(FetchError::RateLimited { retry_after });
        }

        if !response.status().is_success() {
            tracing::warn!("Joanie API error: {} on {}", response.status(), url);
            return Err(FetchError::Status {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response.json().await?)
    }
}

fn backoff_from_retry_after(response: &reqwest::Response) -> Option<Duration> {
    response
        .headers()
        .get("retry-after")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(|secs| Duration::from_secs(secs).min(MAX_TTL))
}

/// Source A: courses with listed course runs
#[derive(Debug, Clone)]
pub struct CoursesReader {
    client: Arc<JoanieClient>,
}

impl CoursesReader {
    pub fn new(client: Arc<JoanieClient>) -> Self {
        Self { client }
    }
}

impl SourceReader for CoursesReader {
    type Item = CatalogItem;

    fn name(&self) -> &str {
        Collection::Courses.name()
    }

    async fn get(
        &self,
        page: u32,
        page_size: u32,
        filter: Option<&str>,
    ) -> Result<Page<CatalogItem>, FetchError> {
        let paginated: Paginated<CourseListItem> = self
            .client
            .fetch_page(Collection::Courses, filter, page, page_size)
            .await?;
        Ok(paginated.into_page(page, page_size, CatalogItem::from))
    }
}

/// Source B: course product relations
#[derive(Debug, Clone)]
pub struct CourseProductRelationsReader {
    client: Arc<JoanieClient>,
}

impl CourseProductRelationsReader {
    pub fn new(client: Arc<JoanieClient>) -> Self {
        Self { client }
    }
}

impl SourceReader for CourseProductRelationsReader {
    type Item = CatalogItem;

    fn name(&self) -> &str {
        Collection::CourseProductRelations.name()
    }

    async fn get(
        &self,
        page: u32,
        page_size: u32,
        filter: Option<&str>,
    ) -> Result<Page<CatalogItem>, FetchError> {
        let paginated: Paginated<CourseProductRelation> = self
            .client
            .fetch_page(Collection::CourseProductRelations, filter, page, page_size)
            .await?;
        Ok(paginated.into_page(page, page_size, CatalogItem::from))
    }
}
