//! 用户注册与认证

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::{Result, TravelbookError};
use crate::storage::SeaOrmStorage;
use crate::utils::password::{hash_password, verify_password};
use migration::entities::users;

const USERNAME_MAX_LEN: usize = 150;
const PASSWORD_MIN_LEN: usize = 8;

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub is_staff: bool,
    pub date_joined: DateTime<Utc>,
}

impl From<users::Model> for UserProfile {
    fn from(user: users::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            is_staff: user.is_staff,
            date_joined: user.date_joined,
        }
    }
}

fn validate_username(username: &str) -> Result<()> {
    let len = username.chars().count();
    if !(3..=USERNAME_MAX_LEN).contains(&len) {
        return Err(TravelbookError::validation(format!(
            "Username must be 3 to {} characters long",
            USERNAME_MAX_LEN
        )));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '@' | '+' | '-'))
    {
        return Err(TravelbookError::validation(
            "Username may only contain letters, digits and _ . @ + -",
        ));
    }
    Ok(())
}

pub struct UserService {
    storage: Arc<SeaOrmStorage>,
}

impl UserService {
    pub fn new(storage: Arc<SeaOrmStorage>) -> Self {
        Self { storage }
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<UserProfile> {
        let username = request.username.trim().to_string();
        let email = request.email.trim().to_string();

        validate_username(&username)?;
        if !email.contains('@') {
            return Err(TravelbookError::validation("Invalid email address"));
        }
        if request.password.chars().count() < PASSWORD_MIN_LEN {
            return Err(TravelbookError::validation(format!(
                "Password must be at least {} characters long",
                PASSWORD_MIN_LEN
            )));
        }

        let db = self.storage.get_db();
        let exists = users::Entity::find()
            .filter(users::Column::Username.eq(username.as_str()))
            .one(db)
            .await?
            .is_some();
        if exists {
            return Err(TravelbookError::conflict(format!(
                "Username '{}' is already taken",
                username
            )));
        }

        let user = users::ActiveModel {
            username: Set(username.clone()),
            email: Set(email),
            password_hash: Set(hash_password(&request.password)?),
            is_staff: Set(false),
            date_joined: Set(Utc::now()),
            ..Default::default()
        }
        .insert(db)
        .await
        .map_err(|e| {
            TravelbookError::conflict_on_unique(
                e,
                format!("Username '{}' is already taken", username),
            )
        })?;

        info!("User registered: {} (id={})", user.username, user.id);
        Ok(user.into())
    }

    /// 校验用户名和密码
    ///
    /// 用户不存在与密码错误返回相同的错误，避免泄露用户名是否存在。
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<UserProfile> {
        let user = users::Entity::find()
            .filter(users::Column::Username.eq(username.trim()))
            .one(self.storage.get_db())
            .await?;

        match user {
            Some(user) if verify_password(password, &user.password_hash)? => Ok(user.into()),
            _ => Err(TravelbookError::unauthorized("Invalid username or password")),
        }
    }

    pub async fn get_profile(&self, user_id: i32) -> Result<UserProfile> {
        users::Entity::find_by_id(user_id)
            .one(self.storage.get_db())
            .await?
            .map(UserProfile::from)
            .ok_or_else(|| TravelbookError::not_found(format!("User {} not found", user_id)))
    }
}
