//! course-union - one paginated list over the course and course product
//! relation catalogs of a Joanie backend
//!
//! This library crate exposes internal modules for integration testing.

pub mod config;
pub mod data;
pub mod error;
pub mod integrations;
pub mod union;

use crate::data::UnionRequest;
use crate::integrations::{CourseProductRelationsReader, CoursesReader, JoanieClient};
use crate::union::UnionQuery;
use std::sync::Arc;

/// Query over courses (source A) then course product relations (source B)
pub type CourseProductUnion = UnionQuery<CoursesReader, CourseProductRelationsReader>;

/// Build the course / course product relation union for `client`.
///
/// `organization_id` scopes both listings to one organization.
pub fn course_product_union(
    client: Arc<JoanieClient>,
    per_page: u32,
    organization_id: Option<String>,
) -> Result<CourseProductUnion, error::UnionError> {
    let request = UnionRequest::new(per_page, organization_id)?;
    Ok(UnionQuery::new(
        CoursesReader::new(Arc::clone(&client)),
        CourseProductRelationsReader::new(client),
        request,
    ))
}
