//! URL building for the catalog list endpoints.
//!
//! Organization-scoped listings live under `/organizations/{id}/`; the
//! organization id is percent-encoded as a single path segment.

const API_PREFIX: &str = "/api/v1.0";

/// Catalog collections the union reads from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Courses,
    CourseProductRelations,
}

impl Collection {
    fn path(self) -> &'static str {
        match self {
            Self::Courses => "courses",
            Self::CourseProductRelations => "course-product-relations",
        }
    }

    /// Query parameters sent before pagination
    fn fixed_params(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::Courses => &[("has_listed_course_runs", "true")],
            Self::CourseProductRelations => &[],
        }
    }

    pub fn name(self) -> &'static str {
        self.path()
    }
}

/// Listing URL without query string, e.g. `{endpoint}/api/v1.0/courses/`
pub fn collection_url(endpoint: &str, collection: Collection, organization_id: Option<&str>) -> String {
    let endpoint = endpoint.trim_end_matches('/');
    match organization_id {
        Some(org) => format!(
            "{}{}/organizations/{}/{}/",
            endpoint,
            API_PREFIX,
            urlencoding::encode(org),
            collection.path()
        ),
        None => format!("{}{}/{}/", endpoint, API_PREFIX, collection.path()),
    }
}

/// Full URL for one page of a collection
pub fn page_url(
    endpoint: &str,
    collection: Collection,
    organization_id: Option<&str>,
    page: u32,
    page_size: u32,
) -> String {
    let mut query: Vec<String> = collection
        .fixed_params()
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect();
    query.push(format!("page={}", page));
    query.push(format!("page_size={}", page_size));

    format!(
        "{}?{}",
        collection_url(endpoint, collection, organization_id),
        query.join("&")
    )
}
