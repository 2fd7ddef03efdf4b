use std::collections::HashSet;

use chrono::NaiveDate;
use sea_orm::sea_query::{Expr, Order};
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, EntityTrait, ExprTrait, FromQueryResult, JoinType,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Select,
};

use super::{CityScope, year_expr};
use crate::errors::Result;
use migration::entities::{city, visited_city};

/// 每个城市的访问汇总行
#[derive(Debug, Clone, FromQueryResult)]
pub struct GroupedVisitedCity {
    pub city_id: i32,
    pub title: String,
    pub country_id: i32,
    pub region_id: Option<i32>,
    pub population: Option<i32>,
    pub date_of_foundation: Option<i32>,
    pub latitude: f64,
    pub longitude: f64,
    pub number_of_visits: i64,
    pub first_visit_date: Option<NaiveDate>,
    pub last_visit_date: Option<NaiveDate>,
    pub rating_sum: Option<i64>,
    pub magnet_count: Option<i64>,
}

impl GroupedVisitedCity {
    pub fn is_visited(&self) -> bool {
        self.number_of_visits > 0
    }

    pub fn has_magnet(&self) -> bool {
        self.magnet_count.unwrap_or(0) > 0
    }

    /// 平均评分，保留一位小数
    pub fn average_rating(&self) -> Option<f64> {
        match (self.rating_sum, self.number_of_visits) {
            (Some(sum), n) if n > 0 => Some((sum as f64 / n as f64 * 10.0).round() / 10.0),
            _ => None,
        }
    }
}

/// 分组查询：按城市汇总用户的访问记录
///
/// `include_unvisited` 为 true 时使用 LEFT JOIN，范围内未访问的城市也会返回
/// （number_of_visits = 0）。结果可以继续交给 filters 模块追加 HAVING / ORDER BY。
pub fn grouped_visited_cities(
    user_id: i32,
    scope: CityScope,
    include_unvisited: bool,
) -> Select<city::Entity> {
    let join_type = if include_unvisited {
        JoinType::LeftJoin
    } else {
        JoinType::InnerJoin
    };

    // 用户条件放进 ON，LEFT JOIN 时才能保留未访问城市
    let relation = city::Relation::VisitedCity
        .def()
        .on_condition(move |_left, right| {
            Condition::all().add(Expr::col((right, visited_city::Column::UserId)).eq(user_id))
        });

    city::Entity::find()
        .select_only()
        .column_as(city::Column::Id, "city_id")
        .column(city::Column::Title)
        .column(city::Column::CountryId)
        .column(city::Column::RegionId)
        .column(city::Column::Population)
        .column(city::Column::DateOfFoundation)
        .column(city::Column::Latitude)
        .column(city::Column::Longitude)
        .column_as(visited_city::Column::Id.count(), "number_of_visits")
        .column_as(visited_city::Column::DateOfVisit.min(), "first_visit_date")
        .column_as(visited_city::Column::DateOfVisit.max(), "last_visit_date")
        .column_as(visited_city::Column::Rating.sum(), "rating_sum")
        .column_as(
            Expr::case(visited_city::Column::HasMagnet.eq(true), 1)
                .finally(0)
                .sum(),
            "magnet_count",
        )
        .join(join_type, relation)
        .filter(scope.condition())
        .group_by(city::Column::Id)
        .group_by(city::Column::Title)
        .group_by(city::Column::CountryId)
        .group_by(city::Column::RegionId)
        .group_by(city::Column::Population)
        .group_by(city::Column::DateOfFoundation)
        .group_by(city::Column::Latitude)
        .group_by(city::Column::Longitude)
}

/// 重新计算某用户某城市的首次访问标记
///
/// 未填日期的访问优先，其次日期最早，再次 id 最小。必须在修改访问记录的同一事务中调用。
/// 返回被标记的访问 id（没有访问记录时为 None）。
pub async fn recalculate_first_visit<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    city_id: i32,
) -> Result<Option<i32>> {
    let visits = visited_city::Entity::find()
        .filter(visited_city::Column::UserId.eq(user_id))
        .filter(visited_city::Column::CityId.eq(city_id))
        .all(db)
        .await?;

    // Option 排序中 None 小于 Some，正好让未填日期的访问排在最前
    let first_id = visits
        .iter()
        .min_by_key(|v| (v.date_of_visit, v.id))
        .map(|v| v.id);

    visited_city::Entity::update_many()
        .col_expr(visited_city::Column::IsFirstVisit, Expr::value(false))
        .filter(visited_city::Column::UserId.eq(user_id))
        .filter(visited_city::Column::CityId.eq(city_id))
        .exec(db)
        .await?;

    if let Some(id) = first_id {
        visited_city::Entity::update_many()
            .col_expr(visited_city::Column::IsFirstVisit, Expr::value(true))
            .filter(visited_city::Column::Id.eq(id))
            .exec(db)
            .await?;
    }

    Ok(first_id)
}

/// 用户访问记录 JOIN city，可按国家过滤
fn user_visits(user_id: i32, country_id: Option<i32>) -> Select<visited_city::Entity> {
    let mut query = visited_city::Entity::find().filter(visited_city::Column::UserId.eq(user_id));
    if let Some(country_id) = country_id {
        query = query
            .join(JoinType::InnerJoin, visited_city::Relation::City.def())
            .filter(city::Column::CountryId.eq(country_id));
    }
    query
}

/// 访问过的不同城市数量
pub async fn count_unique_visited_cities<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    country_id: Option<i32>,
) -> Result<u64> {
    Ok(user_visits(user_id, country_id)
        .filter(visited_city::Column::IsFirstVisit.eq(true))
        .count(db)
        .await?)
}

/// 访问记录总数（同一城市多次访问分别计数）
pub async fn count_visits<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    country_id: Option<i32>,
) -> Result<u64> {
    Ok(user_visits(user_id, country_id).count(db).await?)
}

/// 某年访问过的不同城市数量
pub async fn count_visited_cities_in_year<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    year: i32,
    country_id: Option<i32>,
) -> Result<u64> {
    let (Some(start), Some(end)) = (
        NaiveDate::from_ymd_opt(year, 1, 1),
        NaiveDate::from_ymd_opt(year, 12, 31),
    ) else {
        return Ok(0);
    };

    Ok(user_visits(user_id, country_id)
        .select_only()
        .column(visited_city::Column::CityId)
        .distinct()
        .filter(visited_city::Column::DateOfVisit.between(start, end))
        .count(db)
        .await?)
}

#[derive(Debug, FromQueryResult)]
struct CityIdRow {
    city_id: i32,
}

/// 用户访问过的全部城市 id
pub async fn visited_city_ids<C: ConnectionTrait>(db: &C, user_id: i32) -> Result<HashSet<i32>> {
    let rows = visited_city::Entity::find()
        .select_only()
        .column(visited_city::Column::CityId)
        .filter(visited_city::Column::UserId.eq(user_id))
        .filter(visited_city::Column::IsFirstVisit.eq(true))
        .into_model::<CityIdRow>()
        .all(db)
        .await?;

    Ok(rows.into_iter().map(|r| r.city_id).collect())
}

#[derive(Debug, FromQueryResult)]
struct YearRow {
    visit_year: i64,
}

/// 有访问记录的年份（去重，降序）
pub async fn visit_years<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    country_id: Option<i32>,
) -> Result<Vec<i32>> {
    let year = year_expr(db.get_database_backend(), "visited_city.date_of_visit");

    let rows = user_visits(user_id, country_id)
        .select_only()
        .column_as(year.clone(), "visit_year")
        .filter(visited_city::Column::DateOfVisit.is_not_null())
        .group_by(year)
        .order_by(Expr::cust("visit_year"), Order::Desc)
        .into_model::<YearRow>()
        .all(db)
        .await?;

    Ok(rows.into_iter().map(|r| r.visit_year as i32).collect())
}

/// 某城市有访问记录的年份（降序）
pub async fn visit_years_of_city<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    city_id: i32,
) -> Result<Vec<i32>> {
    let year = year_expr(db.get_database_backend(), "visited_city.date_of_visit");

    let rows = visited_city::Entity::find()
        .select_only()
        .column_as(year.clone(), "visit_year")
        .filter(visited_city::Column::UserId.eq(user_id))
        .filter(visited_city::Column::CityId.eq(city_id))
        .filter(visited_city::Column::DateOfVisit.is_not_null())
        .group_by(year)
        .order_by(Expr::cust("visit_year"), Order::Desc)
        .into_model::<YearRow>()
        .all(db)
        .await?;

    Ok(rows.into_iter().map(|r| r.visit_year as i32).collect())
}

#[derive(Debug, FromQueryResult)]
struct VisitRange {
    first_visit: Option<NaiveDate>,
    last_visit: Option<NaiveDate>,
}

/// 某城市第一次与最后一次有日期的访问
pub async fn first_and_last_visit_date<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    city_id: i32,
) -> Result<(Option<NaiveDate>, Option<NaiveDate>)> {
    let range = visited_city::Entity::find()
        .select_only()
        .column_as(visited_city::Column::DateOfVisit.min(), "first_visit")
        .column_as(visited_city::Column::DateOfVisit.max(), "last_visit")
        .filter(visited_city::Column::UserId.eq(user_id))
        .filter(visited_city::Column::CityId.eq(city_id))
        .into_model::<VisitRange>()
        .one(db)
        .await?;

    Ok(range.map_or((None, None), |r| (r.first_visit, r.last_visit)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DbBackend, QueryTrait};

    #[test]
    fn test_grouped_query_shape() {
        let sql = grouped_visited_cities(3, CityScope::Country(1), true)
            .build(DbBackend::Sqlite)
            .to_string();
        assert!(sql.contains("LEFT JOIN \"visited_city\""));
        assert!(sql.contains("\"visited_city\".\"user_id\" = 3"));
        assert!(sql.contains("GROUP BY"));
        assert!(sql.contains("\"city\".\"country_id\" = 1"));

        let sql = grouped_visited_cities(3, CityScope::All, false)
            .build(DbBackend::Sqlite)
            .to_string();
        assert!(sql.contains("INNER JOIN \"visited_city\""));
    }

    #[test]
    fn test_average_rating() {
        let row = GroupedVisitedCity {
            city_id: 1,
            title: "Kazan".to_string(),
            country_id: 1,
            region_id: None,
            population: None,
            date_of_foundation: None,
            latitude: 0.0,
            longitude: 0.0,
            number_of_visits: 3,
            first_visit_date: None,
            last_visit_date: None,
            rating_sum: Some(13),
            magnet_count: Some(0),
        };
        assert_eq!(row.average_rating(), Some(4.3));
        assert!(!row.has_magnet());
        assert!(row.is_visited());
    }
}
