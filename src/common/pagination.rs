// src/common/pagination.rs

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Parâmetros `?page=&pageSize=` comuns a todas as listagens paginadas.
#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PageParams {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl PageParams {
    /// Normaliza: página >= 1, tamanho entre 1 e 100 (padrão 10).
    pub fn resolve(self) -> (i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let size = self
            .page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        (page, size)
    }

    pub fn offset(self) -> i64 {
        let (page, size) = self.resolve();
        (page - 1) * size
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, params: PageParams) -> Self {
        let (page, page_size) = params.resolve();
        let total_pages = if total == 0 { 0 } else { (total + page_size - 1) / page_size };
        Self { items, total, page, page_size, total_pages }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_first_page_of_ten() {
        assert_eq!(PageParams::default().resolve(), (1, 10));
        assert_eq!(PageParams::default().offset(), 0);
    }

    #[test]
    fn clamps_out_of_range_values() {
        let params = PageParams { page: Some(-3), page_size: Some(500) };
        assert_eq!(params.resolve(), (1, 100));

        let params = PageParams { page: Some(3), page_size: Some(0) };
        assert_eq!(params.resolve(), (3, 1));
        assert_eq!(params.offset(), 2);
    }

    #[test]
    fn total_pages_rounds_up() {
        let params = PageParams { page: Some(2), page_size: Some(10) };
        let page: Page<u8> = Page::new(vec![], 21, params);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.page, 2);

        let empty: Page<u8> = Page::new(vec![], 0, params);
        assert_eq!(empty.total_pages, 0);
    }
}
