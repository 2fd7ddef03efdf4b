//! Personal collections
//!
//! A personal collection is an owned list of cities. Only the owner may edit
//! it. Public collections are readable by everyone and can be copied by other
//! users; the copy is private and remembers its source.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::{Result, TravelbookError};
use crate::services::db::visited_cities;
use crate::services::geography_service::CityInfo;
use crate::storage::SeaOrmStorage;
use migration::entities::{city, personal_collection, personal_collection_city};

const TITLE_MAX_LEN: usize = 256;

#[derive(Debug, Clone, Deserialize)]
pub struct PersonalCollectionForm {
    pub title: String,
    pub city_ids: Vec<i32>,
    #[serde(default)]
    pub is_public: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PersonalCollectionSummary {
    pub id: i32,
    pub owner_id: i32,
    pub title: String,
    pub is_public: bool,
    pub is_copied: bool,
    pub copied_from_id: Option<i32>,
    pub city_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PersonalCollectionCityView {
    #[serde(flatten)]
    pub city: CityInfo,
    /// 当前查看者是否访问过
    pub is_visited: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PersonalCollectionDetail {
    #[serde(flatten)]
    pub summary: PersonalCollectionSummary,
    pub is_owner: bool,
    pub visited_cities: u64,
    pub cities: Vec<PersonalCollectionCityView>,
}

fn summary(model: personal_collection::Model, city_count: u64) -> PersonalCollectionSummary {
    PersonalCollectionSummary {
        id: model.id,
        owner_id: model.owner_id,
        title: model.title,
        is_public: model.is_public,
        is_copied: model.is_copied,
        copied_from_id: model.copied_from_id,
        city_count,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

fn validate_title(title: &str) -> Result<String> {
    let title = title.trim();
    let len = title.chars().count();
    if len == 0 || len > TITLE_MAX_LEN {
        return Err(TravelbookError::validation(format!(
            "Title must be between 1 and {} characters",
            TITLE_MAX_LEN
        )));
    }
    Ok(title.to_string())
}

/// 去重并确认城市全部存在
async fn validate_cities<C: ConnectionTrait>(db: &C, city_ids: &[i32]) -> Result<Vec<i32>> {
    let ids: Vec<i32> = city_ids.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();
    if ids.is_empty() {
        return Err(TravelbookError::validation("A collection needs at least one city"));
    }

    let found = city::Entity::find()
        .filter(city::Column::Id.is_in(ids.clone()))
        .count(db)
        .await?;
    if found != ids.len() as u64 {
        return Err(TravelbookError::validation("Some of the selected cities do not exist"));
    }
    Ok(ids)
}

async fn replace_cities<C: ConnectionTrait>(db: &C, collection_id: i32, ids: &[i32]) -> Result<()> {
    personal_collection_city::Entity::delete_many()
        .filter(personal_collection_city::Column::PersonalCollectionId.eq(collection_id))
        .exec(db)
        .await?;

    if !ids.is_empty() {
        personal_collection_city::Entity::insert_many(ids.iter().map(|&city_id| {
            personal_collection_city::ActiveModel {
                personal_collection_id: Set(collection_id),
                city_id: Set(city_id),
            }
        }))
        .exec_without_returning(db)
        .await?;
    }
    Ok(())
}

async fn city_ids_of<C: ConnectionTrait>(db: &C, collection_id: i32) -> Result<Vec<i32>> {
    Ok(personal_collection_city::Entity::find()
        .filter(personal_collection_city::Column::PersonalCollectionId.eq(collection_id))
        .order_by_asc(personal_collection_city::Column::CityId)
        .all(db)
        .await?
        .into_iter()
        .map(|link| link.city_id)
        .collect())
}

async fn city_count<C: ConnectionTrait>(db: &C, collection_id: i32) -> Result<u64> {
    Ok(personal_collection_city::Entity::find()
        .filter(personal_collection_city::Column::PersonalCollectionId.eq(collection_id))
        .count(db)
        .await?)
}

pub struct PersonalCollectionService {
    storage: Arc<SeaOrmStorage>,
}

impl PersonalCollectionService {
    pub fn new(storage: Arc<SeaOrmStorage>) -> Self {
        Self { storage }
    }

    async fn find<C: ConnectionTrait>(db: &C, id: i32) -> Result<personal_collection::Model> {
        personal_collection::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| TravelbookError::not_found(format!("Collection {} not found", id)))
    }

    /// 只有所有者可以修改
    async fn find_for_edit<C: ConnectionTrait>(
        db: &C,
        user_id: i32,
        id: i32,
    ) -> Result<personal_collection::Model> {
        let model = Self::find(db, id).await?;
        if model.owner_id != user_id {
            return Err(TravelbookError::forbidden(
                "Only the owner can modify this collection",
            ));
        }
        Ok(model)
    }

    async fn summaries(
        &self,
        models: Vec<personal_collection::Model>,
    ) -> Result<Vec<PersonalCollectionSummary>> {
        let db = self.storage.get_db();
        let mut result = Vec::with_capacity(models.len());
        for model in models {
            let count = city_count(db, model.id).await?;
            result.push(summary(model, count));
        }
        Ok(result)
    }

    pub async fn create(
        &self,
        user_id: i32,
        form: PersonalCollectionForm,
    ) -> Result<PersonalCollectionSummary> {
        let title = validate_title(&form.title)?;
        let txn = self.storage.get_db().begin().await?;
        let ids = validate_cities(&txn, &form.city_ids).await?;

        let now = Utc::now();
        let model = personal_collection::ActiveModel {
            owner_id: Set(user_id),
            title: Set(title),
            is_public: Set(form.is_public),
            is_copied: Set(false),
            copied_from_id: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        replace_cities(&txn, model.id, &ids).await?;
        txn.commit().await?;

        info!("User {} created personal collection {}", user_id, model.id);
        Ok(summary(model, ids.len() as u64))
    }

    pub async fn update(
        &self,
        user_id: i32,
        id: i32,
        form: PersonalCollectionForm,
    ) -> Result<PersonalCollectionSummary> {
        let title = validate_title(&form.title)?;
        let txn = self.storage.get_db().begin().await?;
        let existing = Self::find_for_edit(&txn, user_id, id).await?;
        let ids = validate_cities(&txn, &form.city_ids).await?;

        let mut active = existing.into_active_model();
        active.title = Set(title);
        active.is_public = Set(form.is_public);
        active.updated_at = Set(Utc::now());
        let model = active.update(&txn).await?;
        replace_cities(&txn, id, &ids).await?;
        txn.commit().await?;

        Ok(summary(model, ids.len() as u64))
    }

    pub async fn delete(&self, user_id: i32, id: i32) -> Result<()> {
        let db = self.storage.get_db();
        Self::find_for_edit(db, user_id, id).await?;

        // personal_collection_city 通过外键级联删除
        personal_collection::Entity::delete_by_id(id).exec(db).await?;
        info!("User {} deleted personal collection {}", user_id, id);
        Ok(())
    }

    pub async fn set_public(
        &self,
        user_id: i32,
        id: i32,
        is_public: bool,
    ) -> Result<PersonalCollectionSummary> {
        let db = self.storage.get_db();
        let existing = Self::find_for_edit(db, user_id, id).await?;

        let mut active = existing.into_active_model();
        active.is_public = Set(is_public);
        active.updated_at = Set(Utc::now());
        let model = active.update(db).await?;

        let count = city_count(db, id).await?;
        Ok(summary(model, count))
    }

    /// 所有者或公开集合可见，其他情况与不存在一样返回 NotFound
    pub async fn get(&self, user_id: i32, id: i32) -> Result<PersonalCollectionDetail> {
        let db = self.storage.get_db();
        let model = Self::find(db, id).await?;
        let is_owner = model.owner_id == user_id;
        if !is_owner && !model.is_public {
            return Err(TravelbookError::not_found(format!("Collection {} not found", id)));
        }

        let ids = city_ids_of(db, id).await?;
        let cities = if ids.is_empty() {
            Vec::new()
        } else {
            city::Entity::find()
                .filter(city::Column::Id.is_in(ids))
                .order_by_asc(city::Column::Title)
                .order_by_asc(city::Column::Id)
                .all(db)
                .await?
        };
        let visited = visited_cities::visited_city_ids(db, user_id).await?;

        let cities: Vec<PersonalCollectionCityView> = cities
            .into_iter()
            .map(|c| PersonalCollectionCityView {
                is_visited: visited.contains(&c.id),
                city: c.into(),
            })
            .collect();
        let visited_cities = cities.iter().filter(|c| c.is_visited).count() as u64;

        Ok(PersonalCollectionDetail {
            summary: summary(model, cities.len() as u64),
            is_owner,
            visited_cities,
            cities,
        })
    }

    pub async fn list_own(&self, user_id: i32) -> Result<Vec<PersonalCollectionSummary>> {
        let models = personal_collection::Entity::find()
            .filter(personal_collection::Column::OwnerId.eq(user_id))
            .order_by_desc(personal_collection::Column::CreatedAt)
            .order_by_desc(personal_collection::Column::Id)
            .all(self.storage.get_db())
            .await?;
        self.summaries(models).await
    }

    /// 其他用户的公开集合
    pub async fn list_public(&self, user_id: i32) -> Result<Vec<PersonalCollectionSummary>> {
        let models = personal_collection::Entity::find()
            .filter(personal_collection::Column::IsPublic.eq(true))
            .filter(personal_collection::Column::OwnerId.ne(user_id))
            .order_by_desc(personal_collection::Column::CreatedAt)
            .order_by_desc(personal_collection::Column::Id)
            .all(self.storage.get_db())
            .await?;
        self.summaries(models).await
    }

    /// 复制他人的公开集合，副本为私有
    pub async fn copy(&self, user_id: i32, id: i32) -> Result<PersonalCollectionSummary> {
        let txn = self.storage.get_db().begin().await?;
        let source = Self::find(&txn, id).await?;
        if source.owner_id == user_id {
            return Err(TravelbookError::validation("You cannot copy your own collection"));
        }
        if !source.is_public {
            return Err(TravelbookError::not_found(format!("Collection {} not found", id)));
        }

        let ids = city_ids_of(&txn, id).await?;
        let now = Utc::now();
        let model = personal_collection::ActiveModel {
            owner_id: Set(user_id),
            title: Set(source.title.clone()),
            is_public: Set(false),
            is_copied: Set(true),
            copied_from_id: Set(Some(source.id)),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        replace_cities(&txn, model.id, &ids).await?;
        txn.commit().await?;

        info!(
            "User {} copied personal collection {} as {}",
            user_id, source.id, model.id
        );
        Ok(summary(model, ids.len() as u64))
    }
}
