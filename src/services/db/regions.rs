use std::collections::HashMap;

use sea_orm::sea_query::Order;
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, FromQueryResult, JoinType, QueryFilter, QueryOrder,
    QuerySelect, RelationTrait,
};
use serde::Serialize;

use crate::errors::Result;
use crate::services::filters::RegionProgress;
use migration::entities::{city, region, visited_city};

/// 地区及用户在该地区的访问进度
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionWithVisits {
    pub id: i32,
    pub title: String,
    pub full_name: String,
    pub region_type: String,
    pub iso3166: Option<String>,
    pub area_id: Option<i32>,
    pub total_cities: u64,
    pub visited_cities: u64,
    /// 整数百分比
    pub ratio: u64,
}

impl RegionProgress for RegionWithVisits {
    fn title(&self) -> &str {
        &self.title
    }
    fn id(&self) -> i32 {
        self.id
    }
    fn total_cities(&self) -> u64 {
        self.total_cities
    }
    fn visited_cities(&self) -> u64 {
        self.visited_cities
    }
}

#[derive(Debug, FromQueryResult)]
struct RegionTotalRow {
    id: i32,
    title: String,
    full_name: String,
    region_type: String,
    iso3166: Option<String>,
    area_id: Option<i32>,
    total: i64,
}

#[derive(Debug, FromQueryResult)]
struct RegionVisitedRow {
    region_id: Option<i32>,
    visited: i64,
}

/// 国家内每个地区的城市总数与用户访问过的城市数
pub async fn regions_with_visited_count<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    country_id: i32,
) -> Result<Vec<RegionWithVisits>> {
    let totals = region::Entity::find()
        .select_only()
        .column(region::Column::Id)
        .column(region::Column::Title)
        .column(region::Column::FullName)
        .column(region::Column::RegionType)
        .column(region::Column::Iso3166)
        .column(region::Column::AreaId)
        .column_as(city::Column::Id.count(), "total")
        .join(JoinType::LeftJoin, region::Relation::City.def())
        .filter(region::Column::CountryId.eq(country_id))
        .group_by(region::Column::Id)
        .group_by(region::Column::Title)
        .group_by(region::Column::FullName)
        .group_by(region::Column::RegionType)
        .group_by(region::Column::Iso3166)
        .group_by(region::Column::AreaId)
        .order_by(region::Column::Title, Order::Asc)
        .into_model::<RegionTotalRow>()
        .all(db)
        .await?;

    let visited: HashMap<i32, u64> = visited_city::Entity::find()
        .select_only()
        .column(city::Column::RegionId)
        .column_as(visited_city::Column::Id.count(), "visited")
        .join(JoinType::InnerJoin, visited_city::Relation::City.def())
        .filter(visited_city::Column::UserId.eq(user_id))
        .filter(visited_city::Column::IsFirstVisit.eq(true))
        .filter(city::Column::CountryId.eq(country_id))
        .filter(city::Column::RegionId.is_not_null())
        .group_by(city::Column::RegionId)
        .into_model::<RegionVisitedRow>()
        .all(db)
        .await?
        .into_iter()
        .filter_map(|row| row.region_id.map(|id| (id, row.visited as u64)))
        .collect();

    Ok(totals
        .into_iter()
        .map(|row| {
            let total_cities = row.total as u64;
            let visited_cities = visited.get(&row.id).copied().unwrap_or(0);
            let mut region = RegionWithVisits {
                id: row.id,
                title: row.title,
                full_name: row.full_name,
                region_type: row.region_type,
                iso3166: row.iso3166,
                area_id: row.area_id,
                total_cities,
                visited_cities,
                ratio: 0,
            };
            region.ratio = region.ratio();
            region
        })
        .collect())
}
