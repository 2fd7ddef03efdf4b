//! Visited city management
//!
//! Every write runs in one transaction together with the first-visit
//! recomputation of the affected (user, city) pairs, so readers never see a
//! pair with zero or two flagged visits. The transaction starts by locking
//! the affected city rows, so concurrent writers on the same city queue up
//! instead of each flagging their own row. Busy/deadlocked transactions are
//! retried as a whole.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseBackend, DbErr,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::{debug, info};

use crate::config::get_config;
use crate::errors::{Result, TravelbookError};
use crate::services::db::ranking::{self, RankedCity, RankingKind};
use crate::services::db::visited_cities::{self, GroupedVisitedCity};
use crate::services::db::CityScope;
use crate::services::filters::{CityFilter, CitySort};
use crate::services::geography_service::{CityInfo, CountryInfo, RegionInfo};
use crate::services::pagination::{Page, PageRequest};
use crate::services::settings_service::saved_city_list_defaults;
use crate::storage::{SeaOrmStorage, retry};
use crate::utils::csv_handler;
use migration::entities::{city, country, region, visited_city};

/// 创建/编辑访问记录的表单
#[derive(Debug, Clone, Deserialize)]
pub struct VisitForm {
    pub city_id: i32,
    /// 级联选择中的国家，必须与城市一致
    #[serde(default)]
    pub country_id: Option<i32>,
    /// 级联选择中的地区，必须与城市一致
    #[serde(default)]
    pub region_id: Option<i32>,
    #[serde(default)]
    pub date_of_visit: Option<NaiveDate>,
    #[serde(default)]
    pub has_magnet: bool,
    #[serde(default)]
    pub impression: Option<String>,
    pub rating: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct VisitedCityView {
    pub id: i32,
    pub city_id: i32,
    pub city_title: String,
    pub country_id: i32,
    pub region_id: Option<i32>,
    pub date_of_visit: Option<NaiveDate>,
    pub has_magnet: bool,
    pub impression: Option<String>,
    pub rating: i32,
    pub is_first_visit: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VisitedCityView {
    fn new(visit: visited_city::Model, city: &city::Model) -> Self {
        Self {
            id: visit.id,
            city_id: visit.city_id,
            city_title: city.title.clone(),
            country_id: city.country_id,
            region_id: city.region_id,
            date_of_visit: visit.date_of_visit,
            has_magnet: visit.has_magnet,
            impression: visit.impression,
            rating: visit.rating,
            is_first_visit: visit.is_first_visit,
            created_at: visit.created_at,
            updated_at: visit.updated_at,
        }
    }
}

/// 城市列表中的一行（按城市汇总）
#[derive(Debug, Clone, Serialize)]
pub struct CityVisitSummary {
    pub city_id: i32,
    pub title: String,
    pub country_id: i32,
    pub region_id: Option<i32>,
    pub population: Option<i32>,
    pub date_of_foundation: Option<i32>,
    pub latitude: f64,
    pub longitude: f64,
    pub is_visited: bool,
    pub number_of_visits: i64,
    pub first_visit_date: Option<NaiveDate>,
    pub last_visit_date: Option<NaiveDate>,
    pub average_rating: Option<f64>,
    pub has_magnet: bool,
}

impl From<GroupedVisitedCity> for CityVisitSummary {
    fn from(row: GroupedVisitedCity) -> Self {
        Self {
            is_visited: row.is_visited(),
            average_rating: row.average_rating(),
            has_magnet: row.has_magnet(),
            city_id: row.city_id,
            title: row.title,
            country_id: row.country_id,
            region_id: row.region_id,
            population: row.population,
            date_of_foundation: row.date_of_foundation,
            latitude: row.latitude,
            longitude: row.longitude,
            number_of_visits: row.number_of_visits,
            first_visit_date: row.first_visit_date,
            last_visit_date: row.last_visit_date,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VisitListQuery {
    pub filter: Option<String>,
    pub sort: Option<String>,
    pub country_id: Option<i32>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

/// 列表结果，同时返回实际生效的筛选与排序 key
#[derive(Debug, Clone, Serialize)]
pub struct VisitedCityList {
    pub filter: Option<String>,
    pub sort: String,
    #[serde(flatten)]
    pub page: Page<CityVisitSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RankPosition {
    pub by_users: Option<u64>,
    pub by_visits: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CityDetail {
    pub city: CityInfo,
    pub country: Option<CountryInfo>,
    pub region: Option<RegionInfo>,
    /// 未填日期的访问在前，其余按日期升序
    pub visits: Vec<VisitedCityView>,
    pub number_of_visits: usize,
    pub first_visit_date: Option<NaiveDate>,
    pub last_visit_date: Option<NaiveDate>,
    pub average_rating: Option<f64>,
    pub has_magnet: bool,
    pub visit_years: Vec<i32>,
    pub rank_in_country: RankPosition,
    pub rank_in_region: Option<RankPosition>,
    /// 国家内按访问用户数排名的邻近城市
    pub neighbors_in_country: Vec<RankedCity>,
    pub neighbors_in_region: Vec<RankedCity>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumString, Display)]
#[strum(serialize_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl ExportFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv; charset=utf-8",
            ExportFormat::Json => "application/json; charset=utf-8",
        }
    }
}

fn map_unique_violation(err: DbErr) -> TravelbookError {
    TravelbookError::conflict_on_unique(err, "This visit already exists")
}

pub struct VisitedCityService {
    storage: Arc<SeaOrmStorage>,
}

impl VisitedCityService {
    pub fn new(storage: Arc<SeaOrmStorage>) -> Self {
        Self { storage }
    }

    /// 锁定涉及的城市行（按 id 升序），同一城市的并发写入排队执行
    ///
    /// SQLite 不支持行锁，由数据库级写锁和重试保证串行。
    async fn lock_cities<C: ConnectionTrait>(&self, db: &C, mut city_ids: Vec<i32>) -> Result<()> {
        if self.storage.db_backend() == DatabaseBackend::Sqlite {
            return Ok(());
        }
        city_ids.sort_unstable();
        city_ids.dedup();
        city::Entity::find()
            .filter(city::Column::Id.is_in(city_ids))
            .order_by_asc(city::Column::Id)
            .lock_exclusive()
            .all(db)
            .await?;
        Ok(())
    }

    /// 表单校验，返回目标城市
    async fn validate<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: i32,
        form: &VisitForm,
        exclude_id: Option<i32>,
        today: NaiveDate,
    ) -> Result<city::Model> {
        if !(1..=5).contains(&form.rating) {
            return Err(TravelbookError::validation("Rating must be between 1 and 5"));
        }

        let city = city::Entity::find_by_id(form.city_id)
            .one(db)
            .await?
            .ok_or_else(|| TravelbookError::validation(format!("City {} does not exist", form.city_id)))?;

        if form.country_id.is_some_and(|id| id != city.country_id) {
            return Err(TravelbookError::validation(
                "Selected city does not belong to the selected country",
            ));
        }
        if form.region_id.is_some() && form.region_id != city.region_id {
            return Err(TravelbookError::validation(
                "Selected city does not belong to the selected region",
            ));
        }
        if form.date_of_visit.is_some_and(|date| date > today) {
            return Err(TravelbookError::validation("Date of visit cannot be in the future"));
        }

        let mut duplicate = visited_city::Entity::find()
            .filter(visited_city::Column::UserId.eq(user_id))
            .filter(visited_city::Column::CityId.eq(form.city_id));
        duplicate = match form.date_of_visit {
            Some(date) => duplicate.filter(visited_city::Column::DateOfVisit.eq(date)),
            None => duplicate.filter(visited_city::Column::DateOfVisit.is_null()),
        };
        if let Some(id) = exclude_id {
            duplicate = duplicate.filter(visited_city::Column::Id.ne(id));
        }
        if duplicate.count(db).await? > 0 {
            return Err(TravelbookError::conflict(match form.date_of_visit {
                Some(date) => format!("{} has already been visited on {}", city.title, date),
                None => format!("{} already has a visit without a date", city.title),
            }));
        }

        Ok(city)
    }

    fn clean_impression(impression: Option<&str>) -> Option<String> {
        impression
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }

    pub async fn create(&self, user_id: i32, form: VisitForm) -> Result<VisitedCityView> {
        let (visit, city) = retry::with_retry(
            &format!("create_visit({}, {})", user_id, form.city_id),
            self.storage.retry_config(),
            || self.create_once(user_id, &form),
        )
        .await?;
        self.storage.invalidate_count_cache();

        info!(
            "User {} added visit {} to city {} ({})",
            user_id, visit.id, city.id, city.title
        );
        Ok(VisitedCityView::new(visit, &city))
    }

    async fn create_once(
        &self,
        user_id: i32,
        form: &VisitForm,
    ) -> Result<(visited_city::Model, city::Model)> {
        let today = Utc::now().date_naive();
        let txn = self.storage.get_db().begin().await?;

        self.lock_cities(&txn, vec![form.city_id]).await?;
        let city = self.validate(&txn, user_id, form, None, today).await?;
        let now = Utc::now();

        let inserted = visited_city::ActiveModel {
            user_id: Set(user_id),
            city_id: Set(city.id),
            date_of_visit: Set(form.date_of_visit),
            has_magnet: Set(form.has_magnet),
            impression: Set(Self::clean_impression(form.impression.as_deref())),
            rating: Set(form.rating),
            is_first_visit: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(map_unique_violation)?;

        visited_cities::recalculate_first_visit(&txn, user_id, city.id).await?;

        let visit = visited_city::Entity::find_by_id(inserted.id)
            .one(&txn)
            .await?
            .ok_or_else(|| TravelbookError::internal("Inserted visit disappeared"))?;
        txn.commit().await?;
        Ok((visit, city))
    }

    pub async fn update(&self, user_id: i32, id: i32, form: VisitForm) -> Result<VisitedCityView> {
        let (visit, city) = retry::with_retry(
            &format!("update_visit({})", id),
            self.storage.retry_config(),
            || self.update_once(user_id, id, &form),
        )
        .await?;
        self.storage.invalidate_count_cache();

        debug!("User {} updated visit {}", user_id, id);
        Ok(VisitedCityView::new(visit, &city))
    }

    async fn update_once(
        &self,
        user_id: i32,
        id: i32,
        form: &VisitForm,
    ) -> Result<(visited_city::Model, city::Model)> {
        let today = Utc::now().date_naive();
        let txn = self.storage.get_db().begin().await?;

        let current = Self::find_owned(&txn, user_id, id).await?;
        self.lock_cities(&txn, vec![current.city_id, form.city_id]).await?;
        // 加锁前读到的记录可能已被并发修改
        let existing = Self::find_owned(&txn, user_id, id).await?;
        let old_city_id = existing.city_id;
        let city = self.validate(&txn, user_id, form, Some(id), today).await?;

        let mut active: visited_city::ActiveModel = existing.into();
        active.city_id = Set(city.id);
        active.date_of_visit = Set(form.date_of_visit);
        active.has_magnet = Set(form.has_magnet);
        active.impression = Set(Self::clean_impression(form.impression.as_deref()));
        active.rating = Set(form.rating);
        active.updated_at = Set(Utc::now());
        active.update(&txn).await.map_err(map_unique_violation)?;

        visited_cities::recalculate_first_visit(&txn, user_id, city.id).await?;
        if old_city_id != city.id {
            visited_cities::recalculate_first_visit(&txn, user_id, old_city_id).await?;
        }

        let visit = Self::find_owned(&txn, user_id, id).await?;
        txn.commit().await?;
        Ok((visit, city))
    }

    pub async fn delete(&self, user_id: i32, id: i32) -> Result<()> {
        retry::with_retry(
            &format!("delete_visit({})", id),
            self.storage.retry_config(),
            || self.delete_once(user_id, id),
        )
        .await?;
        self.storage.invalidate_count_cache();

        info!("User {} deleted visit {}", user_id, id);
        Ok(())
    }

    async fn delete_once(&self, user_id: i32, id: i32) -> Result<()> {
        let txn = self.storage.get_db().begin().await?;

        let visit = Self::find_owned(&txn, user_id, id).await?;
        self.lock_cities(&txn, vec![visit.city_id]).await?;
        visited_city::Entity::delete_by_id(visit.id).exec(&txn).await?;
        visited_cities::recalculate_first_visit(&txn, user_id, visit.city_id).await?;

        txn.commit().await?;
        Ok(())
    }

    pub async fn get(&self, user_id: i32, id: i32) -> Result<VisitedCityView> {
        let db = self.storage.get_db();
        let found = retry::with_retry(
            &format!("get_visit({})", id),
            self.storage.retry_config(),
            || async move {
                visited_city::Entity::find_by_id(id)
                    .filter(visited_city::Column::UserId.eq(user_id))
                    .find_also_related(city::Entity)
                    .one(db)
                    .await
            },
        )
        .await?;

        match found {
            Some((visit, Some(city))) => Ok(VisitedCityView::new(visit, &city)),
            _ => Err(TravelbookError::not_found(format!("Visit {} not found", id))),
        }
    }

    /// 他人的记录与不存在的记录一样返回 NotFound
    async fn find_owned<C: ConnectionTrait>(
        db: &C,
        user_id: i32,
        id: i32,
    ) -> Result<visited_city::Model> {
        visited_city::Entity::find_by_id(id)
            .filter(visited_city::Column::UserId.eq(user_id))
            .one(db)
            .await?
            .ok_or_else(|| TravelbookError::not_found(format!("Visit {} not found", id)))
    }

    /// 解析生效的筛选/排序 key：请求参数优先，其次用户保存的默认值
    ///
    /// 显式传入空字符串表示不筛选（且不回退到默认值）。
    async fn resolve_keys(
        &self,
        user_id: i32,
        filter: Option<&str>,
        sort: Option<&str>,
    ) -> Result<(Option<CityFilter>, CitySort)> {
        let (saved_filter, saved_sort) = if filter.is_none() || sort.is_none() {
            saved_city_list_defaults(self.storage.get_db(), user_id).await?
        } else {
            (None, None)
        };

        let filter = match filter.or(saved_filter.as_deref()) {
            Some(key) if !key.trim().is_empty() => Some(CityFilter::parse(key)?),
            _ => None,
        };
        let sort = match sort.or(saved_sort.as_deref()) {
            Some(key) if !key.trim().is_empty() => CitySort::parse(key)?,
            _ => CitySort::Default,
        };
        Ok((filter, sort))
    }

    pub async fn list(&self, user_id: i32, query: VisitListQuery) -> Result<VisitedCityList> {
        let (filter, sort) = self
            .resolve_keys(user_id, query.filter.as_deref(), query.sort.as_deref())
            .await?;
        let request = PageRequest::new(query.page, query.page_size);
        let today = Utc::now().date_naive();
        let db = self.storage.get_db();

        let scope = CityScope::from_country(query.country_id);
        let mut select = visited_cities::grouped_visited_cities(user_id, scope, false);
        if let Some(filter) = filter {
            select = filter.apply(select, today);
        }

        let count_key = format!(
            "visited_cities:{}:{:?}:{}:{}",
            user_id,
            scope,
            filter.map(|f| f.to_string()).unwrap_or_default(),
            today
        );
        let total = self
            .storage
            .cached_count(count_key, || {
                let select = select.clone();
                async move { Ok(select.into_model::<GroupedVisitedCity>().count(db).await?) }
            })
            .await?;

        let rows = sort
            .apply(select)
            .offset(request.offset())
            .limit(request.page_size)
            .into_model::<GroupedVisitedCity>()
            .all(db)
            .await?;

        Ok(VisitedCityList {
            filter: filter.map(|f| f.to_string()),
            sort: sort.to_string(),
            page: Page::new(
                rows.into_iter().map(CityVisitSummary::from).collect(),
                request,
                total,
            ),
        })
    }

    pub async fn city_detail(&self, user_id: i32, city_id: i32) -> Result<CityDetail> {
        let db = self.storage.get_db();
        let city = city::Entity::find_by_id(city_id)
            .one(db)
            .await?
            .ok_or_else(|| TravelbookError::not_found(format!("City {} not found", city_id)))?;

        let country = country::Entity::find_by_id(city.country_id).one(db).await?;
        let region = match city.region_id {
            Some(region_id) => region::Entity::find_by_id(region_id).one(db).await?,
            None => None,
        };

        let mut visits = visited_city::Entity::find()
            .filter(visited_city::Column::UserId.eq(user_id))
            .filter(visited_city::Column::CityId.eq(city_id))
            .all(db)
            .await?;
        visits.sort_by_key(|v| (v.date_of_visit, v.id));

        let (first_visit_date, last_visit_date) =
            visited_cities::first_and_last_visit_date(db, user_id, city_id).await?;
        let visit_years = visited_cities::visit_years_of_city(db, user_id, city_id).await?;

        let number_of_visits = visits.len();
        let average_rating = (number_of_visits > 0).then(|| {
            let sum: i32 = visits.iter().map(|v| v.rating).sum();
            (sum as f64 / number_of_visits as f64 * 10.0).round() / 10.0
        });
        let has_magnet = visits.iter().any(|v| v.has_magnet);

        let neighbors = get_config().ranking.neighbors;

        let country_scope = CityScope::Country(city.country_id);
        let country_by_users = ranking::city_ranking(db, country_scope, RankingKind::Users).await?;
        let country_by_visits =
            ranking::city_ranking(db, country_scope, RankingKind::Visits).await?;
        let rank_in_country = RankPosition {
            by_users: ranking::rank_of(&country_by_users, city_id),
            by_visits: ranking::rank_of(&country_by_visits, city_id),
        };
        let neighbors_in_country = ranking::neighboring_cities(&country_by_users, city_id, neighbors);

        let (rank_in_region, neighbors_in_region) = match city.region_id {
            Some(region_id) => {
                let scope = CityScope::Region(region_id);
                let by_users = ranking::city_ranking(db, scope, RankingKind::Users).await?;
                let by_visits = ranking::city_ranking(db, scope, RankingKind::Visits).await?;
                (
                    Some(RankPosition {
                        by_users: ranking::rank_of(&by_users, city_id),
                        by_visits: ranking::rank_of(&by_visits, city_id),
                    }),
                    ranking::neighboring_cities(&by_users, city_id, neighbors),
                )
            }
            None => (None, Vec::new()),
        };

        let visits = visits
            .into_iter()
            .map(|v| VisitedCityView::new(v, &city))
            .collect();

        Ok(CityDetail {
            city: city.into(),
            country: country.map(CountryInfo::from),
            region: region.map(RegionInfo::from),
            visits,
            number_of_visits,
            first_visit_date,
            last_visit_date,
            average_rating,
            has_magnet,
            visit_years,
            rank_in_country,
            rank_in_region,
            neighbors_in_country,
            neighbors_in_region,
        })
    }

    pub async fn visit_years(&self, user_id: i32, country_id: Option<i32>) -> Result<Vec<i32>> {
        visited_cities::visit_years(self.storage.get_db(), user_id, country_id).await
    }

    pub async fn visit_years_of_city(&self, user_id: i32, city_id: i32) -> Result<Vec<i32>> {
        let db = self.storage.get_db();
        if city::Entity::find_by_id(city_id).one(db).await?.is_none() {
            return Err(TravelbookError::not_found(format!("City {} not found", city_id)));
        }
        visited_cities::visit_years_of_city(db, user_id, city_id).await
    }

    /// 导出用户访问过的全部城市（按默认排序）
    pub async fn export(&self, user_id: i32, format: ExportFormat) -> Result<String> {
        let rows: Vec<CityVisitSummary> = CitySort::Default
            .apply(visited_cities::grouped_visited_cities(
                user_id,
                CityScope::All,
                false,
            ))
            .into_model::<GroupedVisitedCity>()
            .all(self.storage.get_db())
            .await?
            .into_iter()
            .map(CityVisitSummary::from)
            .collect();

        info!("User {} exported {} cities as {}", user_id, rows.len(), format);
        match format {
            ExportFormat::Csv => csv_handler::visited_cities_to_csv(&rows),
            ExportFormat::Json => Ok(serde_json::to_string_pretty(&rows)?),
        }
    }
}
