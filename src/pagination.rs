pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

/// 1-based page window over a sorted result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

fn positive(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|value| value.trim().parse::<i64>().ok())
        .filter(|value| *value >= 1)
}

impl Pagination {
    /// Unparseable or non-positive values fall back to the defaults.
    pub fn from_params(page: Option<&str>, limit: Option<&str>, default_limit: i64) -> Self {
        Self {
            page: positive(page).unwrap_or(1),
            limit: positive(limit)
                .unwrap_or(default_limit)
                .min(MAX_PAGE_SIZE),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}
