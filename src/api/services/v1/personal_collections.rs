//! 个人集合端点

use actix_web::{Responder, Result as ActixResult, web};
use std::sync::Arc;
use tracing::info;

use crate::api::middleware::AuthUser;
use crate::services::PersonalCollectionService;
use crate::services::personal_collection_service::PersonalCollectionForm;

use super::error_code::ApiDomain;
use super::helpers::{created_response, error_from_travelbook, scoped_result, success_response};
use super::types::{MessageResponse, PublicFlagRequest};

pub async fn list_own_collections(
    user: AuthUser,
    collections: web::Data<Arc<PersonalCollectionService>>,
) -> ActixResult<impl Responder> {
    Ok(scoped_result(
        ApiDomain::Collections,
        collections.list_own(user.id).await,
    ))
}

pub async fn list_public_collections(
    user: AuthUser,
    collections: web::Data<Arc<PersonalCollectionService>>,
) -> ActixResult<impl Responder> {
    Ok(scoped_result(
        ApiDomain::Collections,
        collections.list_public(user.id).await,
    ))
}

pub async fn create_collection(
    user: AuthUser,
    form: web::Json<PersonalCollectionForm>,
    collections: web::Data<Arc<PersonalCollectionService>>,
) -> ActixResult<impl Responder> {
    match collections.create(user.id, form.into_inner()).await {
        Ok(summary) => Ok(created_response(summary)),
        Err(e) => Ok(error_from_travelbook(&e, ApiDomain::Collections)),
    }
}

pub async fn get_collection(
    user: AuthUser,
    path: web::Path<i32>,
    collections: web::Data<Arc<PersonalCollectionService>>,
) -> ActixResult<impl Responder> {
    Ok(scoped_result(
        ApiDomain::Collections,
        collections.get(user.id, path.into_inner()).await,
    ))
}

pub async fn update_collection(
    user: AuthUser,
    path: web::Path<i32>,
    form: web::Json<PersonalCollectionForm>,
    collections: web::Data<Arc<PersonalCollectionService>>,
) -> ActixResult<impl Responder> {
    Ok(scoped_result(
        ApiDomain::Collections,
        collections
            .update(user.id, path.into_inner(), form.into_inner())
            .await,
    ))
}

pub async fn delete_collection(
    user: AuthUser,
    path: web::Path<i32>,
    collections: web::Data<Arc<PersonalCollectionService>>,
) -> ActixResult<impl Responder> {
    let id = path.into_inner();
    match collections.delete(user.id, id).await {
        Ok(()) => Ok(success_response(MessageResponse {
            message: format!("Collection {} deleted", id),
        })),
        Err(e) => Ok(error_from_travelbook(&e, ApiDomain::Collections)),
    }
}

pub async fn set_collection_public(
    user: AuthUser,
    path: web::Path<i32>,
    body: web::Json<PublicFlagRequest>,
    collections: web::Data<Arc<PersonalCollectionService>>,
) -> ActixResult<impl Responder> {
    Ok(scoped_result(
        ApiDomain::Collections,
        collections
            .set_public(user.id, path.into_inner(), body.is_public)
            .await,
    ))
}

/// 复制他人的公开集合
pub async fn copy_collection(
    user: AuthUser,
    path: web::Path<i32>,
    collections: web::Data<Arc<PersonalCollectionService>>,
) -> ActixResult<impl Responder> {
    let source = path.into_inner();
    match collections.copy(user.id, source).await {
        Ok(copy) => {
            info!("Collection {} copied by user {}", source, user.id);
            Ok(created_response(copy))
        }
        Err(e) => Ok(error_from_travelbook(&e, ApiDomain::Collections)),
    }
}
