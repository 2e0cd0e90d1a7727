//! Page filling for the union.
//!
//! Pure functions: move items from a source buffer into the page being
//! built, in source order, skipping identities that were already emitted.

use crate::data::SourceItem;
use std::collections::{HashSet, VecDeque};

/// Move items from `source` into `page` until `page` holds `page_size` items
/// or `source` is empty.
///
/// Items whose id is already in `seen` are dropped. Returns the number of
/// items appended.
pub fn drain_into<T: SourceItem>(
    page: &mut Vec<T>,
    page_size: usize,
    source: &mut VecDeque<T>,
    seen: &mut HashSet<String>,
) -> usize {
    let mut appended = 0;

    while page.len() < page_size {
        let Some(item) = source.pop_front() else {
            break;
        };
        if seen.insert(item.id().to_string()) {
            page.push(item);
            appended += 1;
        } else {
            tracing::debug!("dropping duplicate union item {}", item.id());
        }
    }

    appended
}
