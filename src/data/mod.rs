use crate::error::UnionError;
use serde::{Deserialize, Serialize};

/// Anything a source can emit into a union: needs a stable identity.
pub trait SourceItem {
    fn id(&self) -> &str;
}

/// A course as listed by the courses endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseListItem {
    pub id: String,
    pub code: String,
    pub title: String,
    #[serde(default)]
    pub organization_ids: Vec<String>,
    #[serde(default)]
    pub product_ids: Vec<String>,
    #[serde(default)]
    pub state: Option<CourseState>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseState {
    pub priority: u8,
    #[serde(default)]
    pub datetime: Option<String>,
    #[serde(default)]
    pub call_to_action: Option<String>,
    #[serde(default)]
    pub text: String,
}

/// Link between a course and a product sold on it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseProductRelation {
    pub id: String,
    pub course: CourseRef,
    pub product: ProductRef,
    #[serde(default)]
    pub organizations: Vec<OrganizationRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseRef {
    pub id: String,
    pub code: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRef {
    pub id: String,
    pub title: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationRef {
    pub id: String,
    pub title: String,
}

/// Item of the course / course product relation union
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CatalogItem {
    Course(CourseListItem),
    CourseProductRelation(CourseProductRelation),
}

impl CatalogItem {
    pub fn title(&self) -> &str {
        match self {
            Self::Course(c) => &c.title,
            Self::CourseProductRelation(r) => &r.product.title,
        }
    }

    /// Course code, for relations the code of the related course
    pub fn course_code(&self) -> &str {
        match self {
            Self::Course(c) => &c.code,
            Self::CourseProductRelation(r) => &r.course.code,
        }
    }

    pub fn kind_label(&self) -> &'static str {
        match self {
            Self::Course(_) => "course",
            Self::CourseProductRelation(_) => "product",
        }
    }
}

impl SourceItem for CatalogItem {
    fn id(&self) -> &str {
        match self {
            Self::Course(c) => &c.id,
            Self::CourseProductRelation(r) => &r.id,
        }
    }
}

impl From<CourseListItem> for CatalogItem {
    fn from(course: CourseListItem) -> Self {
        Self::Course(course)
    }
}

impl From<CourseProductRelation> for CatalogItem {
    fn from(relation: CourseProductRelation) -> Self {
        Self::CourseProductRelation(relation)
    }
}

/// Paginated envelope returned by list endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Paginated<T> {
    /// Convert into a `Page`, mapping each record with `f`
    pub fn into_page<U>(self, page_number: u32, page_size: u32, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            has_next: self.next.is_some(),
            items: self.results.into_iter().map(f).collect(),
            page_number,
            page_size,
        }
    }
}

/// One page of a single source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page_number: u32,
    pub page_size: u32,
    pub has_next: bool,
}

/// Parameters of a union query. Page size is fixed for the request's lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnionRequest {
    page_size: u32,
    filter: Option<String>,
}

impl UnionRequest {
    pub fn new(page_size: u32, filter: Option<String>) -> Result<Self, UnionError> {
        if page_size == 0 {
            return Err(UnionError::InvalidRequest(
                "page size must be at least 1".to_string(),
            ));
        }
        let filter = filter.filter(|f| !f.trim().is_empty());
        Ok(Self { page_size, filter })
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Scoping key applied to both sources (an organization id)
    pub fn filter(&self) -> Option<&str> {
        self.filter.as_deref()
    }
}

/// One page of the union
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnionResult<T> {
    pub items: Vec<T>,
    pub page_number: u32,
    pub is_loading: bool,
    pub has_next: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_page_size_is_rejected() {
        let err = UnionRequest::new(0, None).unwrap_err();
        assert!(matches!(err, UnionError::InvalidRequest(_)));
    }

    #[test]
    fn blank_filter_is_dropped() {
        let request = UnionRequest::new(3, Some("  ".to_string())).unwrap();
        assert_eq!(request.filter(), None);
    }

    #[test]
    fn paginated_next_drives_has_next() {
        let body = serde_json::json!({
            "count": 6,
            "next": "https://joanie.endpoint/api/v1.0/courses/?page=2",
            "previous": null,
            "results": [{ "id": "c1", "code": "C1", "title": "Course 1" }]
        });
        let paginated: Paginated<CourseListItem> = serde_json::from_value(body).unwrap();
        let page = paginated.into_page(1, 3, CatalogItem::from);

        assert!(page.has_next);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].id(), "c1");
        assert_eq!(page.items[0].kind_label(), "course");
    }
}
