use actix_web::{Responder, Result as ActixResult, web};
use std::sync::Arc;

use crate::api::middleware::AuthUser;
use crate::services::StatisticsService;

use super::helpers::api_result;
use super::types::CountryQuery;

/// 个人统计，可按国家切片
pub async fn get_stats(
    user: AuthUser,
    query: web::Query<CountryQuery>,
    stats: web::Data<Arc<StatisticsService>>,
) -> ActixResult<impl Responder> {
    Ok(api_result(stats.summary(user.id, query.country_id).await))
}
