use crate::auth::AuthenticatedUser;
use crate::error::ApiError;
use crate::handlers::JsonBody;
use crate::schemas::AppState;
use axum::{extract::State, http::StatusCode, response::Json, Extension};
use model::entities::user;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};
use utoipa::ToSchema;
use validator::Validate;

/// Request body for registering a new user
#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct CreateUserRequest {
    /// Email address, stored lowercased (must be unique)
    #[serde(default)]
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,
    /// Password, at least 5 characters
    #[serde(default)]
    #[validate(length(min = 5, message = "Ensure this field has at least 5 characters."))]
    pub password: String,
    /// Display name
    #[serde(default)]
    #[validate(length(max = 255, message = "Ensure this field has no more than 255 characters."))]
    pub name: String,
}

/// Request body for updating the caller's profile
#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct UpdateUserRequest {
    #[validate(length(max = 255, message = "Ensure this field has no more than 255 characters."))]
    pub name: Option<String>,
    #[validate(length(min = 5, message = "Ensure this field has at least 5 characters."))]
    pub password: Option<String>,
}

/// Credentials exchanged for an access token
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct TokenRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Access token to send as `Authorization: Bearer <token>`
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct TokenResponse {
    pub token: String,
}

/// User response model, never includes the password
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: i32,
    pub email: String,
    pub name: String,
}

impl From<user::Model> for UserResponse {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            name: model.name,
        }
    }
}

/// Register a new user
#[utoipa::path(
    post,
    path = "/user/create",
    tag = "users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created successfully", body = UserResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn create_user(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    trace!("Entering create_user function");
    request.validate()?;
    debug!("Creating user with email: {}", request.email);

    let user = state
        .users
        .create_user_with_name(&state.db, Some(request.email.as_str()), &request.password, request.name.trim())
        .await?;

    info!("User created successfully with ID: {}, email: {}", user.id, user.email);
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// Exchange credentials for an access token
#[utoipa::path(
    post,
    path = "/user/token",
    tag = "users",
    request_body = TokenRequest,
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 400, description = "Invalid credentials", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn create_token(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<TokenRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    trace!("Entering create_token function");

    match state
        .users
        .authenticate(&state.db, &request.email, &request.password)
        .await?
    {
        Some(user) => {
            let token = state.tokens.issue(&user)?;
            info!("Issued token for user {}", user.id);
            Ok(Json(TokenResponse { token }))
        }
        None => {
            warn!("Token request rejected for email: {}", request.email);
            Err(ApiError::field(
                "non_field_errors",
                "Unable to authenticate with provided credentials.",
            ))
        }
    }
}

async fn load_caller(state: &AppState, caller: &AuthenticatedUser) -> Result<user::Model, ApiError> {
    user::Entity::find_by_id(caller.id)
        .one(&state.db)
        .await?
        .ok_or(ApiError::Unauthorized)
}

/// Get the caller's profile
#[utoipa::path(
    get,
    path = "/user/me",
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Profile retrieved", body = UserResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_me(
    Extension(caller): Extension<AuthenticatedUser>,
    State(state): State<AppState>,
) -> Result<Json<UserResponse>, ApiError> {
    let profile = load_caller(&state, &caller).await?;
    Ok(Json(UserResponse::from(profile)))
}

/// Update the caller's name and/or password
#[utoipa::path(
    patch,
    path = "/user/me",
    tag = "users",
    security(("bearer_auth" = [])),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Profile updated", body = UserResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn update_me(
    Extension(caller): Extension<AuthenticatedUser>,
    State(state): State<AppState>,
    JsonBody(request): JsonBody<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    request.validate()?;
    let mut profile = load_caller(&state, &caller).await?;

    if let Some(name) = request.name {
        debug!("Updating name of user {}", profile.id);
        let mut user_active: user::ActiveModel = profile.into();
        user_active.name = Set(name.trim().to_string());
        profile = user_active.update(&state.db).await?;
    }

    if let Some(password) = request.password {
        debug!("Updating password of user {}", profile.id);
        profile = state.users.set_password(&state.db, profile, &password).await?;
    }

    info!("User {} updated their profile", profile.id);
    Ok(Json(UserResponse::from(profile)))
}
