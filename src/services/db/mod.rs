//! Aggregate queries over visits
//!
//! Every function takes any `ConnectionTrait` so it can run on the pool or
//! inside a transaction. Date/year expressions are generated per backend.

pub mod ranking;
pub mod regions;
pub mod statistics;
pub mod visited_cities;

use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, Condition, DbBackend};

use migration::entities::city;

/// 城市范围：全部 / 某国家 / 某地区
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CityScope {
    All,
    Country(i32),
    Region(i32),
}

impl CityScope {
    pub fn from_country(country_id: Option<i32>) -> Self {
        country_id.map_or(CityScope::All, CityScope::Country)
    }

    /// 作用在 `city` 表上的条件
    pub fn condition(self) -> Condition {
        match self {
            CityScope::All => Condition::all(),
            CityScope::Country(id) => Condition::all().add(city::Column::CountryId.eq(id)),
            CityScope::Region(id) => Condition::all().add(city::Column::RegionId.eq(id)),
        }
    }
}

/// 从日期列提取年份（整数）
pub(crate) fn year_expr(backend: DbBackend, column: &str) -> Expr {
    match backend {
        DbBackend::Sqlite => Expr::cust(format!("CAST(strftime('%Y', {}) AS INTEGER)", column)),
        DbBackend::MySql => Expr::cust(format!("CAST(YEAR({}) AS SIGNED)", column)),
        DbBackend::Postgres | _ => {
            Expr::cust(format!("CAST(EXTRACT(YEAR FROM {}) AS BIGINT)", column))
        }
    }
}
