//! Union pagination over two paged sources.
//!
//! Source A is drained before source B. Each source keeps a buffer of
//! fetched-but-not-emitted items and the number of its next page, so a
//! source page is requested once per paginator no matter how the union
//! pages straddle it. Emitted pages are remembered: asking for the same page
//! number again returns the same items without touching the sources.

use super::merger::drain_into;
use crate::data::{Page, UnionRequest, UnionResult};
use crate::error::UnionError;
use crate::integrations::SourceReader;
use futures::future::try_join;
use std::collections::{HashSet, VecDeque};

#[derive(Debug, Clone)]
struct SourceState<T> {
    buffer: VecDeque<T>,
    next_page: u32,
    has_more: bool,
    fetched: bool,
}

impl<T> SourceState<T> {
    fn new() -> Self {
        Self {
            buffer: VecDeque::new(),
            next_page: 1,
            has_more: true,
            fetched: false,
        }
    }

    /// Nothing buffered and nothing left on the server
    fn drained(&self) -> bool {
        self.buffer.is_empty() && !self.has_more
    }

    fn needs_fetch(&self) -> bool {
        self.buffer.is_empty() && self.has_more
    }

    fn absorb(&mut self, page: Page<T>) {
        self.fetched = true;
        self.next_page += 1;
        // An empty page ends the source even if the server claims more.
        self.has_more = page.has_next && !page.items.is_empty();
        self.buffer.extend(page.items);
    }
}

#[derive(Debug, Clone)]
struct Cursor<T> {
    a: SourceState<T>,
    b: SourceState<T>,
    seen: HashSet<String>,
}

#[derive(Debug, Clone)]
struct EmittedPage<T> {
    items: Vec<T>,
    has_next: bool,
}

pub struct UnionPaginator<A, B>
where
    A: SourceReader,
    B: SourceReader<Item = A::Item>,
{
    source_a: A,
    source_b: B,
    request: UnionRequest,
    cursor: Cursor<A::Item>,
    pages: Vec<EmittedPage<A::Item>>,
}

impl<A, B> UnionPaginator<A, B>
where
    A: SourceReader,
    B: SourceReader<Item = A::Item>,
{
    pub fn new(source_a: A, source_b: B, request: UnionRequest) -> Self {
        Self {
            source_a,
            source_b,
            request,
            cursor: Cursor {
                a: SourceState::new(),
                b: SourceState::new(),
                seen: HashSet::new(),
            },
            pages: Vec::new(),
        }
    }

    pub fn request(&self) -> &UnionRequest {
        &self.request
    }

    /// Number of union pages computed so far
    pub fn pages_computed(&self) -> u32 {
        self.pages.len() as u32
    }

    /// Return union page `page_number` (1-based).
    ///
    /// Pages before it are computed first if needed. A page past the end of
    /// both sources is empty with `has_next == false`. If either source
    /// fails the call fails and the paginator is left as it was.
    pub async fn fetch_union_page(
        &mut self,
        page_number: u32,
    ) -> Result<UnionResult<A::Item>, UnionError> {
        if page_number == 0 {
            return Err(UnionError::InvalidRequest(
                "page numbers start at 1".to_string(),
            ));
        }

        while self.pages.len() < page_number as usize {
            if self.pages.last().is_some_and(|p| !p.has_next) {
                break;
            }
            let page = self.compute_next_page().await?;
            self.pages.push(page);
        }

        let result = match self.pages.get(page_number as usize - 1) {
            Some(page) => UnionResult {
                items: page.items.clone(),
                page_number,
                is_loading: false,
                has_next: page.has_next,
            },
            None => UnionResult {
                items: Vec::new(),
                page_number,
                is_loading: false,
                has_next: false,
            },
        };
        Ok(result)
    }

    async fn compute_next_page(&mut self) -> Result<EmittedPage<A::Item>, UnionError> {
        let page_size = self.request.page_size() as usize;
        let mut cursor = self.cursor.clone();
        let mut items = Vec::with_capacity(page_size);

        loop {
            drain_into(&mut items, page_size, &mut cursor.a.buffer, &mut cursor.seen);
            if cursor.a.drained() {
                drain_into(&mut items, page_size, &mut cursor.b.buffer, &mut cursor.seen);
            }
            if items.len() >= page_size {
                break;
            }

            // B is fetched alongside A's first page, afterwards only once A is drained.
            let fetch_a = cursor.a.needs_fetch();
            let fetch_b = cursor.b.needs_fetch() && (!fetch_a || !cursor.b.fetched);
            if !fetch_a && !fetch_b {
                break;
            }

            let (page_a, page_b) = self.fetch_round(&cursor, fetch_a, fetch_b).await?;
            if let Some(page) = page_a {
                cursor.a.absorb(page);
            }
            if let Some(page) = page_b {
                cursor.b.absorb(page);
            }
        }

        let has_next = !(cursor.a.drained() && cursor.b.drained());
        self.cursor = cursor;

        tracing::debug!(
            "union page {} ready: {} items, has_next={}",
            self.pages.len() + 1,
            items.len(),
            has_next
        );
        Ok(EmittedPage { items, has_next })
    }

    /// Fetch the next page of the selected sources concurrently; fails as
    /// soon as either source fails.
    async fn fetch_round(
        &self,
        cursor: &Cursor<A::Item>,
        fetch_a: bool,
        fetch_b: bool,
    ) -> Result<(Option<Page<A::Item>>, Option<Page<A::Item>>), UnionError> {
        let page_size = self.request.page_size();
        let filter = self.request.filter();

        let a = async {
            if !fetch_a {
                return Ok(None);
            }
            let page = cursor.a.next_page;
            tracing::debug!("fetching {} page {}", self.source_a.name(), page);
            self.source_a
                .get(page, page_size, filter)
                .await
                .map(Some)
                .map_err(|source| UnionError::SourceAFetch {
                    source_name: self.source_a.name().to_string(),
                    source,
                })
        };

        let b = async {
            if !fetch_b {
                return Ok(None);
            }
            let page = cursor.b.next_page;
            tracing::debug!("fetching {} page {}", self.source_b.name(), page);
            self.source_b
                .get(page, page_size, filter)
                .await
                .map(Some)
                .map_err(|source| UnionError::SourceBFetch {
                    source_name: self.source_b.name().to_string(),
                    source,
                })
        };

        try_join(a, b).await.inspect_err(|e| {
            tracing::warn!("union page failed: {}", e);
        })
    }
}
