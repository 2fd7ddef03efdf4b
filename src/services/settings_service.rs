//! Per-user settings: default city list filter/sort and district map colors

use std::sync::Arc;

use sea_orm::sea_query::OnConflict;
use sea_orm::{ActiveValue::Set, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use tracing::info;

use crate::errors::{Result, TravelbookError};
use crate::services::filters::{CityFilter, CitySort};
use crate::storage::SeaOrmStorage;
use crate::utils::normalize_hex_color;
use migration::entities::{city_list_default_settings, district_map_color_settings};

pub const DEFAULT_COLOR_VISITED: &str = "#4fbf4f";
pub const DEFAULT_COLOR_NOT_VISITED: &str = "#bbbbbb";

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display, AsRefStr, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ParameterType {
    Filter,
    Sort,
}

impl ParameterType {
    pub fn parse(value: &str) -> Result<Self> {
        value.trim().parse().map_err(|_| {
            TravelbookError::unknown_parameter(format!("Unknown parameter type: {}", value))
        })
    }

    /// 校验 value 是否为该类型对应流水线的合法 key
    fn validate_value(self, value: &str) -> Result<()> {
        match self {
            ParameterType::Filter => CityFilter::parse(value).map(|_| ()),
            ParameterType::Sort => CitySort::parse(value).map(|_| ()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CityListSettingForm {
    pub parameter_type: ParameterType,
    pub parameter_value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CityListSetting {
    pub parameter_type: String,
    pub parameter_value: String,
}

impl From<city_list_default_settings::Model> for CityListSetting {
    fn from(model: city_list_default_settings::Model) -> Self {
        Self {
            parameter_type: model.parameter_type,
            parameter_value: model.parameter_value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistrictMapColors {
    pub color_visited: String,
    pub color_not_visited: String,
}

impl Default for DistrictMapColors {
    fn default() -> Self {
        Self {
            color_visited: DEFAULT_COLOR_VISITED.to_string(),
            color_not_visited: DEFAULT_COLOR_NOT_VISITED.to_string(),
        }
    }
}

/// 读取用户保存的城市列表默认 (filter, sort)
pub async fn saved_city_list_defaults<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
) -> Result<(Option<String>, Option<String>)> {
    let rows = city_list_default_settings::Entity::find()
        .filter(city_list_default_settings::Column::UserId.eq(user_id))
        .all(db)
        .await?;

    let mut filter = None;
    let mut sort = None;
    for row in rows {
        match ParameterType::parse(&row.parameter_type) {
            Ok(ParameterType::Filter) => filter = Some(row.parameter_value),
            Ok(ParameterType::Sort) => sort = Some(row.parameter_value),
            Err(_) => {}
        }
    }
    Ok((filter, sort))
}

pub struct SettingsService {
    storage: Arc<SeaOrmStorage>,
}

impl SettingsService {
    pub fn new(storage: Arc<SeaOrmStorage>) -> Self {
        Self { storage }
    }

    pub async fn list_city_list_defaults(&self, user_id: i32) -> Result<Vec<CityListSetting>> {
        Ok(city_list_default_settings::Entity::find()
            .filter(city_list_default_settings::Column::UserId.eq(user_id))
            .order_by_asc(city_list_default_settings::Column::ParameterType)
            .all(self.storage.get_db())
            .await?
            .into_iter()
            .map(CityListSetting::from)
            .collect())
    }

    /// 保存默认值，(user, parameter_type) 上 upsert
    pub async fn save_city_list_default(
        &self,
        user_id: i32,
        form: CityListSettingForm,
    ) -> Result<CityListSetting> {
        let value = form.parameter_value.trim().to_string();
        form.parameter_type.validate_value(&value)?;

        let model = city_list_default_settings::ActiveModel {
            user_id: Set(user_id),
            parameter_type: Set(form.parameter_type.to_string()),
            parameter_value: Set(value.clone()),
            ..Default::default()
        };

        city_list_default_settings::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([
                    city_list_default_settings::Column::UserId,
                    city_list_default_settings::Column::ParameterType,
                ])
                .update_column(city_list_default_settings::Column::ParameterValue)
                .to_owned(),
            )
            .exec_without_returning(self.storage.get_db())
            .await?;

        info!(
            "User {} saved default {} = {}",
            user_id, form.parameter_type, value
        );
        Ok(CityListSetting {
            parameter_type: form.parameter_type.to_string(),
            parameter_value: value,
        })
    }

    pub async fn delete_city_list_default(
        &self,
        user_id: i32,
        parameter_type: ParameterType,
    ) -> Result<()> {
        let result = city_list_default_settings::Entity::delete_many()
            .filter(city_list_default_settings::Column::UserId.eq(user_id))
            .filter(city_list_default_settings::Column::ParameterType.eq(parameter_type.to_string()))
            .exec(self.storage.get_db())
            .await?;

        if result.rows_affected == 0 {
            return Err(TravelbookError::not_found(format!(
                "No saved default {}",
                parameter_type
            )));
        }
        Ok(())
    }

    /// 地图颜色，未设置时返回默认值
    pub async fn district_map_colors(&self, user_id: i32) -> Result<DistrictMapColors> {
        let found = district_map_color_settings::Entity::find()
            .filter(district_map_color_settings::Column::UserId.eq(user_id))
            .one(self.storage.get_db())
            .await?;

        Ok(found.map_or_else(DistrictMapColors::default, |m| DistrictMapColors {
            color_visited: m.color_visited,
            color_not_visited: m.color_not_visited,
        }))
    }

    pub async fn save_district_map_colors(
        &self,
        user_id: i32,
        colors: DistrictMapColors,
    ) -> Result<DistrictMapColors> {
        let normalize = |value: &str, field: &str| {
            normalize_hex_color(value).ok_or_else(|| {
                TravelbookError::validation(format!("{} must be a #rrggbb color", field))
            })
        };
        let colors = DistrictMapColors {
            color_visited: normalize(&colors.color_visited, "color_visited")?,
            color_not_visited: normalize(&colors.color_not_visited, "color_not_visited")?,
        };

        let model = district_map_color_settings::ActiveModel {
            user_id: Set(user_id),
            color_visited: Set(colors.color_visited.clone()),
            color_not_visited: Set(colors.color_not_visited.clone()),
            ..Default::default()
        };

        district_map_color_settings::Entity::insert(model)
            .on_conflict(
                OnConflict::column(district_map_color_settings::Column::UserId)
                    .update_columns([
                        district_map_color_settings::Column::ColorVisited,
                        district_map_color_settings::Column::ColorNotVisited,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(self.storage.get_db())
            .await?;

        Ok(colors)
    }

    /// 删除后恢复默认颜色
    pub async fn reset_district_map_colors(&self, user_id: i32) -> Result<DistrictMapColors> {
        district_map_color_settings::Entity::delete_many()
            .filter(district_map_color_settings::Column::UserId.eq(user_id))
            .exec(self.storage.get_db())
            .await?;
        Ok(DistrictMapColors::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_type() {
        assert_eq!(ParameterType::parse("filter").unwrap(), ParameterType::Filter);
        assert_eq!(ParameterType::Sort.to_string(), "sort");
        assert!(matches!(
            ParameterType::parse("order"),
            Err(TravelbookError::UnknownParameter(_))
        ));
    }

    #[test]
    fn test_value_validation() {
        assert!(ParameterType::Filter.validate_value("magnet").is_ok());
        assert!(ParameterType::Filter.validate_value("name_up").is_err());
        assert!(ParameterType::Sort.validate_value("name_up").is_ok());
    }
}
