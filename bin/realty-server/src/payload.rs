pub mod request;
pub mod response;

use realty_engine::response::{Paginated, PaginatedDissolved};
use serde::Serialize;

/// Paging metadata shared by every listing response.
#[derive(Debug, Serialize)]
pub struct PagePayload {
    total: u64,
    page: u32,
    page_size: u32,
    total_pages: u64,
}

impl PagePayload {
    fn split<T>(paginated: Paginated<T>) -> (Vec<T>, Self) {
        let total_pages = paginated.total_pages();
        let PaginatedDissolved { items, total, page, page_size } = paginated.dissolve();

        (items, Self { total, page, page_size, total_pages })
    }
}
