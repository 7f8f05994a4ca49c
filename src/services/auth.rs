use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    auth::{jwt::JwtService, password},
    error::{AppError, AppResult},
    models::{NewUser, User},
    store::{StoreError, SupportStore},
    utils::validation,
};

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(max = 255))]
    pub username: String,
    #[validate(email, length(max = 255))]
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub is_admin: bool,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Public view of a user; never includes the password hash.
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub is_admin: bool,
    pub created_at: NaiveDateTime,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            is_admin: user.is_admin,
            created_at: user.created_at,
        }
    }
}

const DUPLICATE_ACCOUNT: &str = "Username or email already registered";

pub async fn register(store: &dyn SupportStore, request: RegisterRequest) -> AppResult<UserProfile> {
    validation::request(&request)?;
    let username = validation::non_blank("username", &request.username)?;
    let email = request.email;
    if request.password.is_empty() {
        return Err(AppError::bad_request("password must not be empty"));
    }

    if store
        .find_user_by_username_or_email(&username, &email)
        .await?
        .is_some()
    {
        tracing::warn!(%username, "registration rejected: duplicate account");
        return Err(AppError::conflict(DUPLICATE_ACCOUNT));
    }

    let hashed_password = password::hash_password(&request.password)?;
    let new_user = NewUser {
        username,
        email,
        hashed_password,
        is_admin: request.is_admin,
        created_at: Utc::now().naive_utc(),
    };

    let user = match store.insert_user(new_user).await {
        Ok(user) => user,
        Err(StoreError::UniqueViolation(_)) => return Err(AppError::conflict(DUPLICATE_ACCOUNT)),
        Err(err) => return Err(err.into()),
    };

    tracing::info!(user_id = user.id, username = %user.username, "registered user");
    Ok(user.into())
}

pub async fn login(
    store: &dyn SupportStore,
    jwt: &JwtService,
    request: LoginRequest,
) -> AppResult<TokenResponse> {
    let username = request.username.trim();
    let user = store
        .find_user_by_username(username)
        .await?
        .ok_or_else(invalid_credentials)?;

    let valid = password::verify_password(&request.password, &user.hashed_password)
        .map_err(|_| invalid_credentials())?;
    if !valid {
        tracing::warn!(%username, "login rejected: wrong password");
        return Err(invalid_credentials());
    }

    let access_token = jwt.generate_token(user.id)?;
    Ok(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
        expires_in: jwt.expires_in_seconds(),
    })
}

/// Resolves a bearer token to the user it was issued for.
pub async fn current_user(
    store: &dyn SupportStore,
    jwt: &JwtService,
    token: Option<&str>,
) -> AppResult<User> {
    let token = token.ok_or_else(|| AppError::unauthorized("Not authenticated"))?;
    let claims = jwt
        .verify_token(token)
        .map_err(|_| invalid_token())?;
    let user_id = claims.user_id().map_err(|_| invalid_token())?;

    store.find_user(user_id).await?.ok_or_else(invalid_token)
}

/// Creates the bootstrap admin account unless a user with that name exists.
/// Returns whether a user was created.
pub async fn ensure_admin(
    store: &dyn SupportStore,
    username: &str,
    email: &str,
    password: &str,
) -> AppResult<bool> {
    if store.find_user_by_username(username).await?.is_some() {
        return Ok(false);
    }

    register(
        store,
        RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            is_admin: true,
        },
    )
    .await?;
    Ok(true)
}

fn invalid_credentials() -> AppError {
    AppError::unauthorized("Incorrect username or password")
}

fn invalid_token() -> AppError {
    AppError::unauthorized("Could not validate credentials")
}
