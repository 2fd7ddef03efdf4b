//! Curated collections and the user's progress through them

use std::collections::HashMap;
use std::sync::Arc;

use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::Serialize;

use crate::errors::{Result, TravelbookError};
use crate::services::db::visited_cities;
use crate::services::filters::{CollectionFilter, CollectionSort, RegionProgress};
use crate::services::geography_service::CityInfo;
use crate::storage::SeaOrmStorage;
use migration::entities::{city, collection, collection_city};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionProgress {
    pub id: i32,
    pub title: String,
    pub total_cities: u64,
    pub visited_cities: u64,
    pub ratio: u64,
    pub finished: bool,
}

impl CollectionProgress {
    fn new(id: i32, title: String, total_cities: u64, visited_cities: u64) -> Self {
        let mut progress = Self {
            id,
            title,
            total_cities,
            visited_cities,
            ratio: 0,
            finished: total_cities > 0 && visited_cities == total_cities,
        };
        progress.ratio = RegionProgress::ratio(&progress);
        progress
    }
}

impl RegionProgress for CollectionProgress {
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

#[derive(Debug, Clone, Serialize)]
pub struct CollectionList {
    pub filter: Option<String>,
    pub sort: String,
    pub total_collections: usize,
    pub started_collections: usize,
    pub finished_collections: usize,
    pub collections: Vec<CollectionProgress>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CollectionCityView {
    #[serde(flatten)]
    pub city: CityInfo,
    pub is_visited: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CollectionDetail {
    #[serde(flatten)]
    pub progress: CollectionProgress,
    pub cities: Vec<CollectionCityView>,
}

pub struct CollectionService {
    storage: Arc<SeaOrmStorage>,
}

impl CollectionService {
    pub fn new(storage: Arc<SeaOrmStorage>) -> Self {
        Self { storage }
    }

    pub async fn list(
        &self,
        user_id: i32,
        filter: Option<&str>,
        sort: Option<&str>,
    ) -> Result<CollectionList> {
        let filter = filter
            .filter(|k| !k.trim().is_empty())
            .map(CollectionFilter::parse)
            .transpose()?;
        let sort = sort
            .filter(|k| !k.trim().is_empty())
            .map(CollectionSort::parse)
            .transpose()?
            .unwrap_or(CollectionSort::NameUp);

        let db = self.storage.get_db();
        let visited = visited_cities::visited_city_ids(db, user_id).await?;

        let mut members: HashMap<i32, Vec<i32>> = HashMap::new();
        for link in collection_city::Entity::find().all(db).await? {
            members.entry(link.collection_id).or_default().push(link.city_id);
        }

        let all: Vec<CollectionProgress> = collection::Entity::find()
            .all(db)
            .await?
            .into_iter()
            .map(|c| {
                let cities = members.remove(&c.id).unwrap_or_default();
                let done = cities.iter().filter(|id| visited.contains(id)).count();
                CollectionProgress::new(c.id, c.title, cities.len() as u64, done as u64)
            })
            .collect();

        let total_collections = all.len();
        let started_collections = all
            .iter()
            .filter(|c| CollectionFilter::Started.matches(*c))
            .count();
        let finished_collections = all.iter().filter(|c| c.finished).count();

        let filtered = match filter {
            Some(filter) => filter.apply(all),
            None => all,
        };

        Ok(CollectionList {
            filter: filter.map(|f| f.to_string()),
            sort: sort.to_string(),
            total_collections,
            started_collections,
            finished_collections,
            collections: sort.apply(filtered),
        })
    }

    pub async fn detail(&self, user_id: i32, collection_id: i32) -> Result<CollectionDetail> {
        let db = self.storage.get_db();
        let collection = collection::Entity::find_by_id(collection_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                TravelbookError::not_found(format!("Collection {} not found", collection_id))
            })?;

        let city_ids: Vec<i32> = collection_city::Entity::find()
            .filter(collection_city::Column::CollectionId.eq(collection_id))
            .all(db)
            .await?
            .into_iter()
            .map(|link| link.city_id)
            .collect();

        let cities = if city_ids.is_empty() {
            Vec::new()
        } else {
            city::Entity::find()
                .filter(city::Column::Id.is_in(city_ids))
                .order_by_asc(city::Column::Title)
                .order_by_asc(city::Column::Id)
                .all(db)
                .await?
        };
        let visited = visited_cities::visited_city_ids(db, user_id).await?;

        let cities: Vec<CollectionCityView> = cities
            .into_iter()
            .map(|c| CollectionCityView {
                is_visited: visited.contains(&c.id),
                city: c.into(),
            })
            .collect();
        let done = cities.iter().filter(|c| c.is_visited).count() as u64;

        Ok(CollectionDetail {
            progress: CollectionProgress::new(
                collection.id,
                collection.title,
                cities.len() as u64,
                done,
            ),
            cities,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress() {
        let p = CollectionProgress::new(1, "Golden Ring".to_string(), 8, 8);
        assert!(p.finished);
        assert_eq!(p.ratio, 100);

        let p = CollectionProgress::new(2, "Empty".to_string(), 0, 0);
        assert!(!p.finished);
        assert_eq!(p.ratio, 0);

        let p = CollectionProgress::new(3, "Half".to_string(), 3, 1);
        assert_eq!(p.ratio, 33);
    }
}
