//! Test utilities and fixtures for course-union tests
#![allow(dead_code)]

use course_union::data::{
    CatalogItem, CourseListItem, CourseProductRelation, CourseRef, OrganizationRef, Page,
    ProductRef, UnionRequest,
};
use course_union::error::FetchError;
use course_union::integrations::SourceReader;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

pub const DUMMY_ORGANIZATION_ID: &str = "DUMMY_ORGANIZATION_ID";

pub fn course(n: usize) -> CatalogItem {
    CatalogItem::Course(CourseListItem {
        id: format!("course-{}", n),
        code: format!("C{:03}", n),
        title: format!("Course {}", n),
        organization_ids: vec![],
        product_ids: vec![],
        state: None,
    })
}

pub fn relation(n: usize) -> CatalogItem {
    CatalogItem::CourseProductRelation(CourseProductRelation {
        id: format!("relation-{}", n),
        course: CourseRef {
            id: format!("course-{}", n),
            code: format!("C{:03}", n),
            title: format!("Course {}", n),
        },
        product: ProductRef {
            id: format!("product-{}", n),
            title: format!("Product {}", n),
            kind: Some("credential".to_string()),
        },
        organizations: vec![OrganizationRef {
            id: DUMMY_ORGANIZATION_ID.to_string(),
            title: "Dummy organization".to_string(),
        }],
    })
}

pub fn courses(count: usize) -> Vec<CatalogItem> {
    (1..=count).map(course).collect()
}

pub fn relations(count: usize) -> Vec<CatalogItem> {
    (1..=count).map(relation).collect()
}

pub fn request(page_size: u32, organization_id: Option<&str>) -> UnionRequest {
    UnionRequest::new(page_size, organization_id.map(String::from)).expect("valid request")
}

pub fn ids(items: &[CatalogItem]) -> Vec<String> {
    use course_union::data::SourceItem;
    items.iter().map(|i| i.id().to_string()).collect()
}

/// One recorded `SourceReader::get` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub page: u32,
    pub page_size: u32,
    pub filter: Option<String>,
}

impl Call {
    pub fn new(page: u32, page_size: u32, filter: Option<&str>) -> Self {
        Self {
            page,
            page_size,
            filter: filter.map(String::from),
        }
    }
}

/// In-memory paged source that records every call.
///
/// Pages are slices of `items`; `has_next` is true while items remain past
/// the returned slice, like a paginated REST listing.
pub struct MemoryReader {
    name: String,
    items: Vec<CatalogItem>,
    calls: Mutex<Vec<Call>>,
    failure: Mutex<Option<FetchError>>,
    failing: AtomicBool,
    gate: Option<(String, Arc<Notify>)>,
}

impl MemoryReader {
    pub fn new(name: &str, items: Vec<CatalogItem>) -> Self {
        Self {
            name: name.to_string(),
            items,
            calls: Mutex::new(Vec::new()),
            failure: Mutex::new(None),
            failing: AtomicBool::new(false),
            gate: None,
        }
    }

    /// Fail every call with `error` until `set_failing(false)`
    pub fn failing_with(self, error: FetchError) -> Self {
        *self.failure.lock().unwrap() = Some(error);
        self.failing.store(true, Ordering::SeqCst);
        self
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Calls scoped to `filter` block until `gate` is notified
    pub fn gated_on(mut self, filter: &str, gate: Arc<Notify>) -> Self {
        self.gate = Some((filter.to_string(), gate));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn pages_requested(&self) -> Vec<u32> {
        self.calls().iter().map(|c| c.page).collect()
    }
}

impl SourceReader for MemoryReader {
    type Item = CatalogItem;

    fn name(&self) -> &str {
        &self.name
    }

    async fn get(
        &self,
        page: u32,
        page_size: u32,
        filter: Option<&str>,
    ) -> Result<Page<CatalogItem>, FetchError> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::new(page, page_size, filter));

        if let Some((gated_filter, gate)) = &self.gate {
            if filter == Some(gated_filter.as_str()) {
                gate.notified().await;
            }
        }

        // Let the other source make progress, as a network read would.
        tokio::task::yield_now().await;

        if self.failing.load(Ordering::SeqCst) {
            let error = self
                .failure
                .lock()
                .unwrap()
                .clone()
                .unwrap_or(FetchError::Transport("connection reset".to_string()));
            return Err(error);
        }

        let start = ((page - 1) * page_size) as usize;
        let end = (start + page_size as usize).min(self.items.len());
        let items = self.items.get(start..end).unwrap_or_default().to_vec();

        Ok(Page {
            has_next: end < self.items.len(),
            items,
            page_number: page,
            page_size,
        })
    }
}
