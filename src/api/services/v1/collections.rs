use actix_web::{Responder, Result as ActixResult, web};
use std::sync::Arc;

use crate::api::middleware::AuthUser;
use crate::services::CollectionService;

use super::error_code::ApiDomain;
use super::helpers::scoped_result;
use super::types::FilterSortQuery;

pub async fn list_collections(
    user: AuthUser,
    query: web::Query<FilterSortQuery>,
    collections: web::Data<Arc<CollectionService>>,
) -> ActixResult<impl Responder> {
    Ok(scoped_result(
        ApiDomain::Collections,
        collections
            .list(user.id, query.filter.as_deref(), query.sort.as_deref())
            .await,
    ))
}

pub async fn get_collection(
    user: AuthUser,
    path: web::Path<i32>,
    collections: web::Data<Arc<CollectionService>>,
) -> ActixResult<impl Responder> {
    Ok(scoped_result(
        ApiDomain::Collections,
        collections.detail(user.id, path.into_inner()).await,
    ))
}
