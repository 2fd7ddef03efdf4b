//! 访问记录端点

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, Responder, Result as ActixResult, web};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use crate::api::middleware::AuthUser;
use crate::services::visited_city_service::{ExportFormat, VisitForm, VisitListQuery};
use crate::services::{CityVisitSummary, VisitedCityService};

use super::error_code::{ApiDomain, ErrorCode};
use super::helpers::{
    created_response, error_from_travelbook, error_response, paginated_response, scoped_result,
    success_response,
};
use super::types::{CountryQuery, ExportQuery, MessageResponse, PaginationInfo};

/// 列表数据，附带实际生效的 filter/sort
#[derive(Serialize)]
struct VisitedCitiesData {
    filter: Option<String>,
    sort: String,
    cities: Vec<CityVisitSummary>,
}

pub async fn list_visited_cities(
    user: AuthUser,
    query: web::Query<VisitListQuery>,
    visits: web::Data<Arc<VisitedCityService>>,
) -> ActixResult<impl Responder> {
    debug!("Listing visited cities for user {}: {:?}", user.id, query);
    match visits.list(user.id, query.into_inner()).await {
        Ok(list) => {
            let pagination = PaginationInfo::from(&list.page);
            Ok(paginated_response(
                VisitedCitiesData {
                    filter: list.filter,
                    sort: list.sort,
                    cities: list.page.items,
                },
                pagination,
            ))
        }
        Err(e) => Ok(error_from_travelbook(&e, ApiDomain::Visits)),
    }
}

pub async fn create_visit(
    user: AuthUser,
    form: web::Json<VisitForm>,
    visits: web::Data<Arc<VisitedCityService>>,
) -> ActixResult<impl Responder> {
    match visits.create(user.id, form.into_inner()).await {
        Ok(view) => Ok(created_response(view)),
        Err(e) => Ok(error_from_travelbook(&e, ApiDomain::Visits)),
    }
}

pub async fn get_visit(
    user: AuthUser,
    path: web::Path<i32>,
    visits: web::Data<Arc<VisitedCityService>>,
) -> ActixResult<impl Responder> {
    Ok(scoped_result(
        ApiDomain::Visits,
        visits.get(user.id, path.into_inner()).await,
    ))
}

pub async fn update_visit(
    user: AuthUser,
    path: web::Path<i32>,
    form: web::Json<VisitForm>,
    visits: web::Data<Arc<VisitedCityService>>,
) -> ActixResult<impl Responder> {
    Ok(scoped_result(
        ApiDomain::Visits,
        visits
            .update(user.id, path.into_inner(), form.into_inner())
            .await,
    ))
}

pub async fn delete_visit(
    user: AuthUser,
    path: web::Path<i32>,
    visits: web::Data<Arc<VisitedCityService>>,
) -> ActixResult<impl Responder> {
    let id = path.into_inner();
    match visits.delete(user.id, id).await {
        Ok(()) => Ok(success_response(MessageResponse {
            message: format!("Visit {} deleted", id),
        })),
        Err(e) => Ok(error_from_travelbook(&e, ApiDomain::Visits)),
    }
}

/// 有访问记录的年份
pub async fn visit_years(
    user: AuthUser,
    query: web::Query<CountryQuery>,
    visits: web::Data<Arc<VisitedCityService>>,
) -> ActixResult<impl Responder> {
    Ok(scoped_result(
        ApiDomain::Visits,
        visits.visit_years(user.id, query.country_id).await,
    ))
}

/// 导出为 CSV 或 JSON 附件
pub async fn export_visited_cities(
    user: AuthUser,
    query: web::Query<ExportQuery>,
    visits: web::Data<Arc<VisitedCityService>>,
) -> ActixResult<impl Responder> {
    let format = match query.format.as_deref() {
        None | Some("") => ExportFormat::default(),
        Some(value) => match value.parse::<ExportFormat>() {
            Ok(format) => format,
            Err(_) => {
                return Ok(error_response(
                    StatusCode::BAD_REQUEST,
                    ErrorCode::UnknownParameter,
                    &format!("Unknown export format: {}", value),
                ));
            }
        },
    };

    match visits.export(user.id, format).await {
        Ok(body) => Ok(HttpResponse::Ok()
            .content_type(format.content_type())
            .append_header((
                "Content-Disposition",
                format!("attachment; filename=\"visited_cities.{}\"", format),
            ))
            .body(body)),
        Err(e) => Ok(error_from_travelbook(&e, ApiDomain::Visits)),
    }
}
