//! Union of two paginated sources
//!
//! Presents two independently paged collections as a single paged list:
//! all of source A first, then source B, deduplicated by item id.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        UnionQuery                            │
//! │   request + generation, loaded data, Idle/Loading/Ready/Failed│
//! │                           │                                  │
//! │                    UnionPaginator                            │
//! │   per-source cursors, page history, concurrent fetch+join    │
//! │           ┌───────────────┴───────────────┐                  │
//! │   SourceReader A                   SourceReader B            │
//! │           └───────────────┬───────────────┘                  │
//! │                  merger::drain_into (pure)                   │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod merger;
pub mod paginator;
pub mod query;

pub use merger::drain_into;
pub use paginator::UnionPaginator;
pub use query::{PageOutcome, QueryStatus, UnionQuery, UnionSnapshot};
