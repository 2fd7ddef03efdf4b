//! 用户设置端点

use actix_web::{Responder, Result as ActixResult, web};
use std::sync::Arc;

use crate::api::middleware::AuthUser;
use crate::services::SettingsService;
use crate::services::settings_service::{CityListSettingForm, DistrictMapColors, ParameterType};

use super::error_code::ApiDomain;
use super::helpers::{error_from_travelbook, scoped_result, success_response};
use super::types::MessageResponse;

pub async fn list_city_list_defaults(
    user: AuthUser,
    settings: web::Data<Arc<SettingsService>>,
) -> ActixResult<impl Responder> {
    Ok(scoped_result(
        ApiDomain::Settings,
        settings.list_city_list_defaults(user.id).await,
    ))
}

pub async fn save_city_list_default(
    user: AuthUser,
    form: web::Json<CityListSettingForm>,
    settings: web::Data<Arc<SettingsService>>,
) -> ActixResult<impl Responder> {
    Ok(scoped_result(
        ApiDomain::Settings,
        settings
            .save_city_list_default(user.id, form.into_inner())
            .await,
    ))
}

pub async fn delete_city_list_default(
    user: AuthUser,
    path: web::Path<String>,
    settings: web::Data<Arc<SettingsService>>,
) -> ActixResult<impl Responder> {
    let parameter_type = match ParameterType::parse(&path) {
        Ok(t) => t,
        Err(e) => return Ok(error_from_travelbook(&e, ApiDomain::Settings)),
    };

    match settings
        .delete_city_list_default(user.id, parameter_type)
        .await
    {
        Ok(()) => Ok(success_response(MessageResponse {
            message: format!("Default {} removed", parameter_type),
        })),
        Err(e) => Ok(error_from_travelbook(&e, ApiDomain::Settings)),
    }
}

pub async fn get_district_map_colors(
    user: AuthUser,
    settings: web::Data<Arc<SettingsService>>,
) -> ActixResult<impl Responder> {
    Ok(scoped_result(
        ApiDomain::Settings,
        settings.district_map_colors(user.id).await,
    ))
}

pub async fn save_district_map_colors(
    user: AuthUser,
    colors: web::Json<DistrictMapColors>,
    settings: web::Data<Arc<SettingsService>>,
) -> ActixResult<impl Responder> {
    Ok(scoped_result(
        ApiDomain::Settings,
        settings
            .save_district_map_colors(user.id, colors.into_inner())
            .await,
    ))
}

pub async fn reset_district_map_colors(
    user: AuthUser,
    settings: web::Data<Arc<SettingsService>>,
) -> ActixResult<impl Responder> {
    Ok(scoped_result(
        ApiDomain::Settings,
        settings.reset_district_map_colors(user.id).await,
    ))
}
