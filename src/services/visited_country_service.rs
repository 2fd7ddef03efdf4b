use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, QueryFilter, QueryOrder,
};
use serde::Serialize;
use tracing::info;

use crate::errors::{Result, TravelbookError};
use crate::services::db::statistics;
use crate::storage::SeaOrmStorage;
use migration::entities::{country, visited_country};

/// 用户手动标记的国家
#[derive(Debug, Clone, Serialize)]
pub struct VisitedCountryView {
    pub id: i32,
    pub country_id: i32,
    pub code: String,
    pub name: String,
    pub added_at: DateTime<Utc>,
}

/// 根据访问过的城市推导出的国家统计
#[derive(Debug, Clone, Serialize)]
pub struct CountrySummary {
    pub country_id: i32,
    pub code: String,
    pub name: String,
    pub visited_cities: i64,
    /// 是否也被用户手动标记
    pub marked: bool,
}

pub struct VisitedCountryService {
    storage: Arc<SeaOrmStorage>,
}

impl VisitedCountryService {
    pub fn new(storage: Arc<SeaOrmStorage>) -> Self {
        Self { storage }
    }

    async fn country_by_code(&self, code: &str) -> Result<country::Model> {
        let code = code.trim().to_uppercase();
        country::Entity::find()
            .filter(country::Column::Code.eq(code.as_str()))
            .one(self.storage.get_db())
            .await?
            .ok_or_else(|| TravelbookError::not_found(format!("Unknown country code: {}", code)))
    }

    pub async fn list(&self, user_id: i32) -> Result<Vec<VisitedCountryView>> {
        let rows = visited_country::Entity::find()
            .find_also_related(country::Entity)
            .filter(visited_country::Column::UserId.eq(user_id))
            .order_by_asc(visited_country::Column::AddedAt)
            .order_by_asc(visited_country::Column::Id)
            .all(self.storage.get_db())
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(visit, country)| {
                country.map(|c| VisitedCountryView {
                    id: visit.id,
                    country_id: c.id,
                    code: c.code,
                    name: c.name,
                    added_at: visit.added_at,
                })
            })
            .collect())
    }

    pub async fn add(&self, user_id: i32, code: &str) -> Result<VisitedCountryView> {
        let country = self.country_by_code(code).await?;
        let db = self.storage.get_db();

        let exists = visited_country::Entity::find()
            .filter(visited_country::Column::UserId.eq(user_id))
            .filter(visited_country::Column::CountryId.eq(country.id))
            .one(db)
            .await?
            .is_some();
        if exists {
            return Err(TravelbookError::conflict(format!(
                "Country {} is already marked as visited",
                country.code
            )));
        }

        let saved = visited_country::ActiveModel {
            user_id: Set(user_id),
            country_id: Set(country.id),
            added_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(db)
        .await
        .map_err(|e| {
            // 并发添加时由唯一索引兜底
            TravelbookError::conflict_on_unique(
                e,
                format!("Country {} is already marked as visited", country.code),
            )
        })?;

        info!("User {} marked country {} as visited", user_id, country.code);
        Ok(VisitedCountryView {
            id: saved.id,
            country_id: country.id,
            code: country.code,
            name: country.name,
            added_at: saved.added_at,
        })
    }

    pub async fn delete(&self, user_id: i32, code: &str) -> Result<()> {
        let country = self.country_by_code(code).await?;
        let result = visited_country::Entity::delete_many()
            .filter(visited_country::Column::UserId.eq(user_id))
            .filter(visited_country::Column::CountryId.eq(country.id))
            .exec(self.storage.get_db())
            .await?;

        if result.rows_affected == 0 {
            return Err(TravelbookError::not_found(format!(
                "Country {} is not marked as visited",
                country.code
            )));
        }
        Ok(())
    }

    /// 每个国家访问过的城市数，附带是否已手动标记
    pub async fn summary(&self, user_id: i32) -> Result<Vec<CountrySummary>> {
        let db = self.storage.get_db();
        let counts = statistics::visited_cities_per_country(db, user_id).await?;
        if counts.is_empty() {
            return Ok(Vec::new());
        }

        let countries: HashMap<i32, country::Model> = country::Entity::find()
            .filter(country::Column::Id.is_in(counts.iter().map(|c| c.country_id)))
            .all(db)
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();
        let marked: Vec<i32> = visited_country::Entity::find()
            .filter(visited_country::Column::UserId.eq(user_id))
            .all(db)
            .await?
            .into_iter()
            .map(|v| v.country_id)
            .collect();

        Ok(counts
            .into_iter()
            .filter_map(|count| {
                countries.get(&count.country_id).map(|c| CountrySummary {
                    country_id: c.id,
                    code: c.code.clone(),
                    name: c.name.clone(),
                    visited_cities: count.cities,
                    marked: marked.contains(&c.id),
                })
            })
            .collect())
    }
}
