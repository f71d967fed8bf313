use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct Pagination {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl Pagination {
    pub fn normalize(&self) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1) * per_page;
        (page, per_page, offset)
    }
}

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReservationFilter {
    Active,
    Canceled,
    All,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReservationListQuery {
    #[serde(flatten)]
    pub pagination: Pagination,
    pub filter: Option<ReservationFilter>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_clamps_page_and_size() {
        let p = Pagination {
            page: Some(0),
            per_page: Some(1000),
        };
        assert_eq!(p.normalize(), (1, 100, 0));

        let defaults = Pagination {
            page: None,
            per_page: None,
        };
        assert_eq!(defaults.normalize(), (1, 20, 0));
    }
}
