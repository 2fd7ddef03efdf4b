use serde::{Deserialize, Serialize};

use crate::config::get_config;

/// 页码上限，超出时按上限处理（结果为空页）
pub const MAX_PAGE: u64 = 1_000_000;

/// 分页参数（page 从 1 开始）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u64,
    pub page_size: u64,
}

impl PageRequest {
    /// 由客户端参数构造，缺省与越界值按配置修正
    pub fn new(page: Option<u64>, page_size: Option<u64>) -> Self {
        let config = get_config();
        Self::with_limits(
            page,
            page_size,
            config.pagination.default_page_size,
            config.pagination.max_page_size,
        )
    }

    pub fn with_limits(
        page: Option<u64>,
        page_size: Option<u64>,
        default_size: u64,
        max_size: u64,
    ) -> Self {
        Self {
            page: page.unwrap_or(1).clamp(1, MAX_PAGE),
            page_size: page_size.unwrap_or(default_size).clamp(1, max_size.max(1)),
        }
    }

    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.page_size)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub page_size: u64,
    pub total: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total: u64) -> Self {
        Self {
            items,
            page: request.page,
            page_size: request.page_size,
            total,
            total_pages: total.div_ceil(request.page_size),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_limits() {
        let req = PageRequest::with_limits(None, None, 16, 100);
        assert_eq!((req.page, req.page_size), (1, 16));

        let req = PageRequest::with_limits(Some(0), Some(1000), 16, 100);
        assert_eq!((req.page, req.page_size), (1, 100));

        let req = PageRequest::with_limits(Some(3), Some(10), 16, 100);
        assert_eq!(req.offset(), 20);
    }

    #[test]
    fn test_page_request_huge_page() {
        let req = PageRequest::with_limits(Some(u64::MAX), Some(50), 20, 100);
        assert_eq!(req.page, MAX_PAGE);
        assert_eq!(req.offset(), (MAX_PAGE - 1) * 50);

        let page = Page::new(Vec::<i32>::new(), req, 7);
        assert_eq!(page.total_pages, 1);
        assert!(page.items.is_empty());
    }
}
