use serde::Serialize;

use crate::{ensure_validation, error::Result};

/// 分页参数
#[derive(Debug, Clone, Copy)]
pub struct PaginationParams {
    /// 当前页码（>= 1）
    pub page: u64,
    /// 每页条数（>= 1）
    pub limit: u64,
}

impl PaginationParams {
    /// 根据可选参数创建分页配置，并应用默认值与上限。
    #[must_use]
    pub fn new(page: Option<u64>, limit: Option<u64>, default_limit: u64, max_limit: u64) -> Self {
        let page = page.unwrap_or(1).max(1);
        let limit = limit.unwrap_or(default_limit).clamp(1, max_limit);
        Self { page, limit }
    }

    #[must_use]
    pub const fn offset(&self) -> u64 {
        (self.page - 1) * self.limit
    }
}

/// 标准分页信息
#[derive(Debug, Clone, Serialize)]
pub struct PaginationInfo {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub pages: u64,
}

impl PaginationInfo {
    #[must_use]
    pub const fn new(page: u64, limit: u64, total: u64, pages: u64) -> Self {
        Self {
            page,
            limit,
            total,
            pages,
        }
    }
}

/// 根据总数和分页参数计算分页信息。
#[must_use]
pub const fn build_page(total: u64, params: PaginationParams) -> PaginationInfo {
    let pages = if total == 0 {
        0
    } else {
        total.div_ceil(params.limit)
    };
    PaginationInfo::new(params.page, params.limit, total, pages)
}

/// 验证名称格式
///
/// # 规则
/// - 不能为空
/// - 不能只包含空白字符
/// - 长度不能超过 200 个字符
pub fn validate_name_format(name: &str) -> Result<()> {
    let trimmed = name.trim();

    ensure_validation!(!trimmed.is_empty(), "名称不能为空");
    ensure_validation!(trimmed.len() <= 200, "名称长度不能超过 200 个字符");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_defaults() {
        let params = PaginationParams::new(None, None, 10, 100);
        assert_eq!(params.page, 1);
        assert_eq!(params.limit, 10);
        assert_eq!(params.offset(), 0);
    }

    #[test]
    fn test_pagination_clamping() {
        let params = PaginationParams::new(Some(0), Some(500), 10, 100);
        assert_eq!(params.page, 1);
        assert_eq!(params.limit, 100);

        let params = PaginationParams::new(Some(3), Some(20), 10, 100);
        assert_eq!(params.offset(), 40);
    }

    #[test]
    fn test_build_page() {
        let params = PaginationParams::new(Some(2), Some(10), 10, 100);
        let info = build_page(25, params);
        assert_eq!(info.pages, 3);

        let info = build_page(0, params);
        assert_eq!(info.pages, 0);
    }

    #[test]
    fn test_validate_name_format() {
        assert!(validate_name_format("Valid Name").is_ok());
        assert!(validate_name_format("").is_err());
        assert!(validate_name_format("   ").is_err());
        let long_name = "a".repeat(201);
        assert!(validate_name_format(&long_name).is_err());
    }
}
