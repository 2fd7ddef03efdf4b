//! Geography: countries, regions, cities and the fixture importer
//!
//! The geographic hierarchy is reference data loaded from a JSON fixture; the
//! read side feeds cascading selects and the per-user region views.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveValue::Set, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::{Result, TravelbookError};
use crate::services::db::CityScope;
use crate::services::db::regions::{self, RegionWithVisits};
use crate::services::db::visited_cities::{self, GroupedVisitedCity};
use crate::services::filters::{CityFilter, CitySort, RegionFilter, RegionSort};
use crate::services::visited_city_service::CityVisitSummary;
use crate::storage::SeaOrmStorage;
use migration::entities::{
    area, city, collection, collection_city, country, location, part_of_the_world, region,
};

// ============ Views ============

#[derive(Debug, Clone, Serialize)]
pub struct CountryInfo {
    pub id: i32,
    pub name: String,
    pub fullname: Option<String>,
    pub code: String,
    pub location: Option<String>,
    pub part_of_the_world: Option<String>,
}

impl From<country::Model> for CountryInfo {
    fn from(country: country::Model) -> Self {
        Self {
            id: country.id,
            name: country.name,
            fullname: country.fullname,
            code: country.code,
            location: None,
            part_of_the_world: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RegionInfo {
    pub id: i32,
    pub title: String,
    pub full_name: String,
    pub region_type: String,
    pub iso3166: Option<String>,
    pub country_id: i32,
    pub area_id: Option<i32>,
}

impl From<region::Model> for RegionInfo {
    fn from(region: region::Model) -> Self {
        Self {
            id: region.id,
            title: region.title,
            full_name: region.full_name,
            region_type: region.region_type,
            iso3166: region.iso3166,
            country_id: region.country_id,
            area_id: region.area_id,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CityInfo {
    pub id: i32,
    pub title: String,
    pub country_id: i32,
    pub region_id: Option<i32>,
    pub population: Option<i32>,
    pub date_of_foundation: Option<i32>,
    pub latitude: f64,
    pub longitude: f64,
    pub wiki: Option<String>,
}

impl From<city::Model> for CityInfo {
    fn from(city: city::Model) -> Self {
        Self {
            id: city.id,
            title: city.title,
            country_id: city.country_id,
            region_id: city.region_id,
            population: city.population,
            date_of_foundation: city.date_of_foundation,
            latitude: city.latitude,
            longitude: city.longitude,
            wiki: city.wiki,
        }
    }
}

/// 地区详情：地区内全部城市及用户访问情况
#[derive(Debug, Clone, Serialize)]
pub struct RegionDetail {
    pub region: RegionInfo,
    pub total_cities: u64,
    pub visited_cities: u64,
    pub ratio: u64,
    pub filter: Option<String>,
    pub sort: String,
    pub cities: Vec<CityVisitSummary>,
}

/// 国家内各地区的访问统计
#[derive(Debug, Clone, Serialize)]
pub struct RegionStats {
    pub country: CountryInfo,
    pub filter: Option<String>,
    pub sort: String,
    pub total_regions: usize,
    pub visited_regions: usize,
    pub finished_regions: usize,
    pub regions: Vec<RegionWithVisits>,
}

// ============ Fixture ============

#[derive(Debug, Clone, Deserialize)]
pub struct FixturePartOfTheWorld {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FixtureLocation {
    pub id: i32,
    pub name: String,
    pub part_of_the_world_id: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FixtureCountry {
    pub id: i32,
    pub name: String,
    #[serde(default)]
    pub fullname: Option<String>,
    pub code: String,
    #[serde(default)]
    pub location_id: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FixtureArea {
    pub id: i32,
    pub title: String,
    pub country_id: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FixtureRegion {
    pub id: i32,
    pub title: String,
    pub full_name: String,
    pub region_type: String,
    #[serde(default)]
    pub iso3166: Option<String>,
    pub country_id: i32,
    #[serde(default)]
    pub area_id: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FixtureCity {
    pub id: i32,
    pub title: String,
    pub country_id: i32,
    #[serde(default)]
    pub region_id: Option<i32>,
    #[serde(default)]
    pub population: Option<i32>,
    #[serde(default)]
    pub date_of_foundation: Option<i32>,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub wiki: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FixtureCollection {
    pub id: i32,
    pub title: String,
    #[serde(default)]
    pub city_ids: Vec<i32>,
}

/// 地理数据 JSON fixture，所有记录带显式 id
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GeographyFixture {
    #[serde(default)]
    pub parts_of_the_world: Vec<FixturePartOfTheWorld>,
    #[serde(default)]
    pub locations: Vec<FixtureLocation>,
    #[serde(default)]
    pub countries: Vec<FixtureCountry>,
    #[serde(default)]
    pub areas: Vec<FixtureArea>,
    #[serde(default)]
    pub regions: Vec<FixtureRegion>,
    #[serde(default)]
    pub cities: Vec<FixtureCity>,
    #[serde(default)]
    pub collections: Vec<FixtureCollection>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub parts_of_the_world: usize,
    pub locations: usize,
    pub countries: usize,
    pub areas: usize,
    pub regions: usize,
    pub cities: usize,
    pub collections: usize,
}

// 按 id upsert 一批记录
macro_rules! upsert_all {
    ($db:expr, $entity:ident, $models:expr, [$($col:ident),+ $(,)?]) => {{
        let models: Vec<$entity::ActiveModel> = $models;
        let count = models.len();
        if !models.is_empty() {
            $entity::Entity::insert_many(models)
                .on_conflict(
                    OnConflict::column($entity::Column::Id)
                        .update_columns([$($entity::Column::$col),+])
                        .to_owned(),
                )
                .exec_without_returning($db)
                .await?;
        }
        count
    }};
}

pub struct GeographyService {
    storage: Arc<SeaOrmStorage>,
}

impl GeographyService {
    pub fn new(storage: Arc<SeaOrmStorage>) -> Self {
        Self { storage }
    }

    /// 国家列表，附带所在地区与大洲名称
    pub async fn list_countries(&self) -> Result<Vec<CountryInfo>> {
        let db = self.storage.get_db();
        let parts: HashMap<i32, String> = part_of_the_world::Entity::find()
            .all(db)
            .await?
            .into_iter()
            .map(|p| (p.id, p.name))
            .collect();
        let locations: HashMap<i32, location::Model> = location::Entity::find()
            .all(db)
            .await?
            .into_iter()
            .map(|l| (l.id, l))
            .collect();

        let countries = country::Entity::find()
            .order_by_asc(country::Column::Name)
            .all(db)
            .await?;

        Ok(countries
            .into_iter()
            .map(|c| {
                let location = c.location_id.and_then(|id| locations.get(&id));
                let mut info = CountryInfo::from(c);
                info.location = location.map(|l| l.name.clone());
                info.part_of_the_world =
                    location.and_then(|l| parts.get(&l.part_of_the_world_id).cloned());
                info
            })
            .collect())
    }

    async fn find_country<C: ConnectionTrait>(db: &C, country_id: i32) -> Result<country::Model> {
        country::Entity::find_by_id(country_id)
            .one(db)
            .await?
            .ok_or_else(|| TravelbookError::not_found(format!("Country {} not found", country_id)))
    }

    async fn find_region<C: ConnectionTrait>(db: &C, region_id: i32) -> Result<region::Model> {
        region::Entity::find_by_id(region_id)
            .one(db)
            .await?
            .ok_or_else(|| TravelbookError::not_found(format!("Region {} not found", region_id)))
    }

    pub async fn regions_of_country(&self, country_id: i32) -> Result<Vec<RegionInfo>> {
        let db = self.storage.get_db();
        Self::find_country(db, country_id).await?;

        Ok(region::Entity::find()
            .filter(region::Column::CountryId.eq(country_id))
            .order_by_asc(region::Column::Title)
            .all(db)
            .await?
            .into_iter()
            .map(RegionInfo::from)
            .collect())
    }

    pub async fn cities_of_country(&self, country_id: i32) -> Result<Vec<CityInfo>> {
        let db = self.storage.get_db();
        Self::find_country(db, country_id).await?;
        self.cities_in(CityScope::Country(country_id)).await
    }

    pub async fn cities_of_region(&self, region_id: i32) -> Result<Vec<CityInfo>> {
        let db = self.storage.get_db();
        Self::find_region(db, region_id).await?;
        self.cities_in(CityScope::Region(region_id)).await
    }

    async fn cities_in(&self, scope: CityScope) -> Result<Vec<CityInfo>> {
        Ok(city::Entity::find()
            .filter(scope.condition())
            .order_by_asc(city::Column::Title)
            .order_by_asc(city::Column::Id)
            .all(self.storage.get_db())
            .await?
            .into_iter()
            .map(CityInfo::from)
            .collect())
    }

    /// 地区详情，城市列表使用城市筛选/排序流水线
    pub async fn region_detail(
        &self,
        user_id: i32,
        region_id: i32,
        filter: Option<&str>,
        sort: Option<&str>,
    ) -> Result<RegionDetail> {
        let db = self.storage.get_db();
        let region = Self::find_region(db, region_id).await?;

        let filter = filter
            .filter(|k| !k.trim().is_empty())
            .map(CityFilter::parse)
            .transpose()?;
        let sort = sort
            .filter(|k| !k.trim().is_empty())
            .map(CitySort::parse)
            .transpose()?
            .unwrap_or(CitySort::NameUp);

        // 进度按全部城市统计，不受筛选影响
        let all = visited_cities::grouped_visited_cities(user_id, CityScope::Region(region_id), true)
            .into_model::<GroupedVisitedCity>()
            .all(db)
            .await?;
        let total_cities = all.len() as u64;
        let visited = all.iter().filter(|c| c.is_visited()).count() as u64;

        let mut select =
            visited_cities::grouped_visited_cities(user_id, CityScope::Region(region_id), true);
        if let Some(filter) = filter {
            select = filter.apply(select, Utc::now().date_naive());
        }
        let cities = sort
            .apply(select)
            .into_model::<GroupedVisitedCity>()
            .all(db)
            .await?
            .into_iter()
            .map(CityVisitSummary::from)
            .collect();

        Ok(RegionDetail {
            region: region.into(),
            total_cities,
            visited_cities: visited,
            ratio: if total_cities == 0 { 0 } else { visited * 100 / total_cities },
            filter: filter.map(|f| f.to_string()),
            sort: sort.to_string(),
            cities,
        })
    }

    /// 国家内各地区统计，使用地区筛选/排序流水线
    pub async fn region_stats(
        &self,
        user_id: i32,
        country_id: i32,
        filter: Option<&str>,
        sort: Option<&str>,
    ) -> Result<RegionStats> {
        let db = self.storage.get_db();
        let country = Self::find_country(db, country_id).await?;

        let filter = filter
            .filter(|k| !k.trim().is_empty())
            .map(RegionFilter::parse)
            .transpose()?;
        let sort = sort
            .filter(|k| !k.trim().is_empty())
            .map(RegionSort::parse)
            .transpose()?
            .unwrap_or(RegionSort::NameUp);

        let all = regions::regions_with_visited_count(db, user_id, country_id).await?;
        let total_regions = all.len();
        let visited_regions = all
            .iter()
            .filter(|r| RegionFilter::Visited.matches(*r))
            .count();
        let finished_regions = all
            .iter()
            .filter(|r| RegionFilter::Finished.matches(*r))
            .count();

        let filtered = match filter {
            Some(filter) => filter.apply(all),
            None => all,
        };

        Ok(RegionStats {
            country: country.into(),
            filter: filter.map(|f| f.to_string()),
            sort: sort.to_string(),
            total_regions,
            visited_regions,
            finished_regions,
            regions: sort.apply(filtered),
        })
    }

    /// 从 JSON 文件导入地理数据
    pub async fn import_fixture_file<P: AsRef<Path>>(&self, path: P) -> Result<ImportSummary> {
        let content = tokio::fs::read_to_string(path.as_ref()).await?;
        let fixture: GeographyFixture = serde_json::from_str(&content)?;
        self.import_fixture(fixture).await
    }

    /// 导入地理数据（按 id upsert，可重复执行）
    pub async fn import_fixture(&self, fixture: GeographyFixture) -> Result<ImportSummary> {
        let txn = self.storage.get_db().begin().await?;

        let summary = ImportSummary {
            parts_of_the_world: upsert_all!(
                &txn,
                part_of_the_world,
                fixture
                    .parts_of_the_world
                    .iter()
                    .map(|p| part_of_the_world::ActiveModel {
                        id: Set(p.id),
                        name: Set(p.name.clone()),
                    })
                    .collect(),
                [Name]
            ),
            locations: upsert_all!(
                &txn,
                location,
                fixture
                    .locations
                    .iter()
                    .map(|l| location::ActiveModel {
                        id: Set(l.id),
                        name: Set(l.name.clone()),
                        part_of_the_world_id: Set(l.part_of_the_world_id),
                    })
                    .collect(),
                [Name, PartOfTheWorldId]
            ),
            countries: upsert_all!(
                &txn,
                country,
                fixture
                    .countries
                    .iter()
                    .map(|c| country::ActiveModel {
                        id: Set(c.id),
                        name: Set(c.name.clone()),
                        fullname: Set(c.fullname.clone()),
                        code: Set(c.code.to_uppercase()),
                        location_id: Set(c.location_id),
                    })
                    .collect(),
                [Name, Fullname, Code, LocationId]
            ),
            areas: upsert_all!(
                &txn,
                area,
                fixture
                    .areas
                    .iter()
                    .map(|a| area::ActiveModel {
                        id: Set(a.id),
                        title: Set(a.title.clone()),
                        country_id: Set(a.country_id),
                    })
                    .collect(),
                [Title, CountryId]
            ),
            regions: upsert_all!(
                &txn,
                region,
                fixture
                    .regions
                    .iter()
                    .map(|r| region::ActiveModel {
                        id: Set(r.id),
                        title: Set(r.title.clone()),
                        full_name: Set(r.full_name.clone()),
                        region_type: Set(r.region_type.clone()),
                        iso3166: Set(r.iso3166.clone()),
                        country_id: Set(r.country_id),
                        area_id: Set(r.area_id),
                    })
                    .collect(),
                [Title, FullName, RegionType, Iso3166, CountryId, AreaId]
            ),
            cities: upsert_all!(
                &txn,
                city,
                fixture
                    .cities
                    .iter()
                    .map(|c| city::ActiveModel {
                        id: Set(c.id),
                        title: Set(c.title.clone()),
                        country_id: Set(c.country_id),
                        region_id: Set(c.region_id),
                        population: Set(c.population),
                        date_of_foundation: Set(c.date_of_foundation),
                        latitude: Set(c.latitude),
                        longitude: Set(c.longitude),
                        wiki: Set(c.wiki.clone()),
                    })
                    .collect(),
                [
                    Title,
                    CountryId,
                    RegionId,
                    Population,
                    DateOfFoundation,
                    Latitude,
                    Longitude,
                    Wiki
                ]
            ),
            collections: upsert_all!(
                &txn,
                collection,
                fixture
                    .collections
                    .iter()
                    .map(|c| collection::ActiveModel {
                        id: Set(c.id),
                        title: Set(c.title.clone()),
                    })
                    .collect(),
                [Title]
            ),
        };

        // 集合的城市列表以 fixture 为准整体替换
        for item in &fixture.collections {
            collection_city::Entity::delete_many()
                .filter(collection_city::Column::CollectionId.eq(item.id))
                .exec(&txn)
                .await?;

            let mut city_ids = item.city_ids.clone();
            city_ids.sort_unstable();
            city_ids.dedup();
            if city_ids.is_empty() {
                continue;
            }
            collection_city::Entity::insert_many(city_ids.into_iter().map(|city_id| {
                collection_city::ActiveModel {
                    collection_id: Set(item.id),
                    city_id: Set(city_id),
                }
            }))
            .exec_without_returning(&txn)
            .await?;
        }

        txn.commit().await?;
        self.storage.invalidate_count_cache();

        info!(
            "Geography imported: {} countries, {} regions, {} cities, {} collections",
            summary.countries, summary.regions, summary.cities, summary.collections
        );
        Ok(summary)
    }
}
