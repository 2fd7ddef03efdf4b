use std::collections::BTreeSet;

use sea_orm::sea_query::{Expr, Order};
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, FromQueryResult, JoinType, QueryFilter, QueryOrder,
    QuerySelect, RelationTrait,
};
use serde::Serialize;

use super::year_expr;
use crate::errors::Result;
use migration::entities::{city, visited_city};

/// 按年份统计的数量
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromQueryResult)]
pub struct YearCount {
    pub year: i64,
    pub count: i64,
}

async fn count_by_year<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    country_id: Option<i32>,
    only_first_visits: bool,
) -> Result<Vec<YearCount>> {
    let year = year_expr(db.get_database_backend(), "visited_city.date_of_visit");

    let mut query = visited_city::Entity::find()
        .select_only()
        .column_as(year.clone(), "year")
        .column_as(visited_city::Column::Id.count(), "count")
        .filter(visited_city::Column::UserId.eq(user_id))
        .filter(visited_city::Column::DateOfVisit.is_not_null());

    if only_first_visits {
        query = query.filter(visited_city::Column::IsFirstVisit.eq(true));
    }
    if let Some(country_id) = country_id {
        query = query
            .join(JoinType::InnerJoin, visited_city::Relation::City.def())
            .filter(city::Column::CountryId.eq(country_id));
    }

    Ok(query
        .group_by(year.clone())
        .order_by(year, Order::Asc)
        .into_model::<YearCount>()
        .all(db)
        .await?)
}

/// 每年新增（首次访问）的城市数
///
/// 首次访问未填日期的城市不计入任何年份。
pub async fn new_cities_by_year<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    country_id: Option<i32>,
) -> Result<Vec<YearCount>> {
    count_by_year(db, user_id, country_id, true).await
}

/// 每年的访问次数
pub async fn visits_by_year<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    country_id: Option<i32>,
) -> Result<Vec<YearCount>> {
    count_by_year(db, user_id, country_id, false).await
}

#[derive(Debug, FromQueryResult)]
struct UserCityCount {
    user_id: i32,
    cities: i64,
}

/// 用户按访问城市数量的排名（从 1 开始，并列时共享较好的名次）
///
/// 没有任何访问记录的用户返回 None。
pub async fn user_rank<C: ConnectionTrait>(db: &C, user_id: i32) -> Result<Option<u64>> {
    let rows = visited_city::Entity::find()
        .select_only()
        .column(visited_city::Column::UserId)
        .column_as(visited_city::Column::Id.count(), "cities")
        .filter(visited_city::Column::IsFirstVisit.eq(true))
        .group_by(visited_city::Column::UserId)
        .into_model::<UserCityCount>()
        .all(db)
        .await?;

    let Some(own) = rows.iter().find(|r| r.user_id == user_id).map(|r| r.cities) else {
        return Ok(None);
    };

    let better = rows.iter().filter(|r| r.cities > own).count() as u64;
    Ok(Some(better + 1))
}

#[derive(Debug, FromQueryResult)]
struct CountryIdRow {
    country_id: i32,
}

/// 根据访问过的城市推导出的国家 id（升序）
pub async fn visited_country_ids<C: ConnectionTrait>(db: &C, user_id: i32) -> Result<Vec<i32>> {
    let rows = visited_city::Entity::find()
        .select_only()
        .column(city::Column::CountryId)
        .distinct()
        .join(JoinType::InnerJoin, visited_city::Relation::City.def())
        .filter(visited_city::Column::UserId.eq(user_id))
        .into_model::<CountryIdRow>()
        .all(db)
        .await?;

    let ids: BTreeSet<i32> = rows.into_iter().map(|r| r.country_id).collect();
    Ok(ids.into_iter().collect())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromQueryResult)]
pub struct CountryCityCount {
    pub country_id: i32,
    pub cities: i64,
}

/// 每个国家中访问过的不同城市数量（降序）
pub async fn visited_cities_per_country<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
) -> Result<Vec<CountryCityCount>> {
    Ok(visited_city::Entity::find()
        .select_only()
        .column(city::Column::CountryId)
        .column_as(visited_city::Column::Id.count(), "cities")
        .join(JoinType::InnerJoin, visited_city::Relation::City.def())
        .filter(visited_city::Column::UserId.eq(user_id))
        .filter(visited_city::Column::IsFirstVisit.eq(true))
        .group_by(city::Column::CountryId)
        .order_by(Expr::cust("cities"), Order::Desc)
        .order_by(city::Column::CountryId, Order::Asc)
        .into_model::<CountryCityCount>()
        .all(db)
        .await?)
}
