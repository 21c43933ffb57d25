//! Response types for engine operations.

use dissolve_derive::Dissolve;

use crate::port::Page;

/// One page of a listing together with the total number of matches.
#[derive(Debug, Clone, PartialEq, Dissolve)]
pub struct Paginated<T> {
    /// The rows of the requested page, newest first.
    items: Vec<T>,

    /// Number of rows matching the filter across all pages.
    total: u64,

    /// The 1-based page number.
    page: u32,

    /// The requested page size.
    page_size: u32,
}

#[bon::bon]
impl<T> Paginated<T> {
    #[builder]
    pub(crate) fn new(items: Vec<T>, total: u64, page: Page) -> Self {
        Self { items, total, page: page.page(), page_size: page.page_size() }
    }
}

impl<T> Paginated<T> {
    /// Returns the rows of the page.
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Returns the total number of matches.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Returns the 1-based page number.
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Returns the page size.
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Returns the number of pages needed for every match.
    pub fn total_pages(&self) -> u64 {
        self.total.div_ceil(u64::from(self.page_size))
    }
}
