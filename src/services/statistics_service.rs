use std::sync::Arc;

use chrono::{Datelike, Utc};
use sea_orm::{EntityTrait, PaginatorTrait, QueryFilter};
use serde::Serialize;

use crate::errors::{Result, TravelbookError};
use crate::services::db::statistics::{self, YearCount};
use crate::services::db::{CityScope, regions, visited_cities};
use crate::services::filters::RegionFilter;
use crate::storage::SeaOrmStorage;
use migration::entities::{city, country};

/// 地区维度的统计（仅在按国家统计时提供）
#[derive(Debug, Clone, Serialize)]
pub struct RegionSummary {
    pub total: usize,
    pub visited: usize,
    pub finished: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatisticsSummary {
    pub country_id: Option<i32>,
    pub visited_cities: u64,
    pub total_cities: u64,
    /// 整数百分比
    pub ratio: u64,
    pub visits: u64,
    pub visited_cities_this_year: u64,
    pub visited_cities_last_year: u64,
    pub regions: Option<RegionSummary>,
    pub visited_countries: usize,
    pub user_rank: Option<u64>,
    pub new_cities_by_year: Vec<YearCount>,
    pub visits_by_year: Vec<YearCount>,
}

pub struct StatisticsService {
    storage: Arc<SeaOrmStorage>,
}

impl StatisticsService {
    pub fn new(storage: Arc<SeaOrmStorage>) -> Self {
        Self { storage }
    }

    pub async fn summary(&self, user_id: i32, country_id: Option<i32>) -> Result<StatisticsSummary> {
        let db = self.storage.get_db();
        if let Some(id) = country_id {
            country::Entity::find_by_id(id)
                .one(db)
                .await?
                .ok_or_else(|| TravelbookError::not_found(format!("Country {} not found", id)))?;
        }

        let year = Utc::now().year();
        let scope = CityScope::from_country(country_id);

        let visited = visited_cities::count_unique_visited_cities(db, user_id, country_id).await?;
        let total_key = format!("cities_total:{:?}", scope);
        let total_cities = self
            .storage
            .cached_count(total_key, || async move {
                Ok(city::Entity::find().filter(scope.condition()).count(db).await?)
            })
            .await?;

        let regions = match country_id {
            Some(id) => {
                let rows = regions::regions_with_visited_count(db, user_id, id).await?;
                Some(RegionSummary {
                    total: rows.len(),
                    visited: rows.iter().filter(|r| RegionFilter::Visited.matches(*r)).count(),
                    finished: rows.iter().filter(|r| RegionFilter::Finished.matches(*r)).count(),
                })
            }
            None => None,
        };

        Ok(StatisticsSummary {
            country_id,
            visited_cities: visited,
            total_cities,
            ratio: if total_cities == 0 { 0 } else { visited * 100 / total_cities },
            visits: visited_cities::count_visits(db, user_id, country_id).await?,
            visited_cities_this_year: visited_cities::count_visited_cities_in_year(
                db, user_id, year, country_id,
            )
            .await?,
            visited_cities_last_year: visited_cities::count_visited_cities_in_year(
                db,
                user_id,
                year - 1,
                country_id,
            )
            .await?,
            regions,
            visited_countries: statistics::visited_country_ids(db, user_id).await?.len(),
            user_rank: statistics::user_rank(db, user_id).await?,
            new_cities_by_year: statistics::new_cities_by_year(db, user_id, country_id).await?,
            visits_by_year: statistics::visits_by_year(db, user_id, country_id).await?,
        })
    }
}

