//! 手动标记的国家

use actix_web::{Responder, Result as ActixResult, web};
use std::sync::Arc;

use crate::api::middleware::AuthUser;
use crate::services::VisitedCountryService;

use super::error_code::ApiDomain;
use super::helpers::{created_response, error_from_travelbook, scoped_result, success_response};
use super::types::{AddCountryRequest, MessageResponse};

pub async fn list_visited_countries(
    user: AuthUser,
    countries: web::Data<Arc<VisitedCountryService>>,
) -> ActixResult<impl Responder> {
    Ok(scoped_result(ApiDomain::Countries, countries.list(user.id).await))
}

pub async fn add_visited_country(
    user: AuthUser,
    body: web::Json<AddCountryRequest>,
    countries: web::Data<Arc<VisitedCountryService>>,
) -> ActixResult<impl Responder> {
    match countries.add(user.id, &body.code).await {
        Ok(view) => Ok(created_response(view)),
        Err(e) => Ok(error_from_travelbook(&e, ApiDomain::Countries)),
    }
}

pub async fn delete_visited_country(
    user: AuthUser,
    path: web::Path<String>,
    countries: web::Data<Arc<VisitedCountryService>>,
) -> ActixResult<impl Responder> {
    let code = path.into_inner();
    match countries.delete(user.id, &code).await {
        Ok(()) => Ok(success_response(MessageResponse {
            message: format!("Country {} removed", code.to_uppercase()),
        })),
        Err(e) => Ok(error_from_travelbook(&e, ApiDomain::Countries)),
    }
}

/// 按访问城市推导出的国家
pub async fn visited_countries_summary(
    user: AuthUser,
    countries: web::Data<Arc<VisitedCountryService>>,
) -> ActixResult<impl Responder> {
    Ok(scoped_result(ApiDomain::Countries, countries.summary(user.id).await))
}
