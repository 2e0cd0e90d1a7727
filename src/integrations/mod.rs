pub mod joanie;
pub mod page_cache;
pub mod routes;

use crate::data::{Page, SourceItem};
use crate::error::FetchError;
use once_cell::sync::Lazy;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

pub use joanie::{CourseProductRelationsReader, CoursesReader, JoanieClient};

/// Shared HTTP client for all API requests to enable connection pooling
pub static HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .pool_max_idle_per_host(5)
        .build()
        .expect("Failed to create HTTP client")
});

/// A paginated remote collection.
///
/// `get` returns one page of at most `page_size` items, scoped to `filter`
/// when one is given.
pub trait SourceReader: Send + Sync {
    type Item: SourceItem + Clone + Send + Sync;

    /// Name used in logs and errors
    fn name(&self) -> &str;

    fn get(
        &self,
        page: u32,
        page_size: u32,
        filter: Option<&str>,
    ) -> impl Future<Output = Result<Page<Self::Item>, FetchError>> + Send;
}

impl<R: SourceReader> SourceReader for Arc<R> {
    type Item = R::Item;

    fn name(&self) -> &str {
        (**self).name()
    }

    fn get(
        &self,
        page: u32,
        page_size: u32,
        filter: Option<&str>,
    ) -> impl Future<Output = Result<Page<Self::Item>, FetchError>> + Send {
        (**self).get(page, page_size, filter)
    }
}
