use std::collections::BTreeMap;

use model::users::UserManager;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi, ToSchema,
};

use crate::auth::TokenService;
use crate::handlers::{
    ingredients::{CreateIngredientRequest, IngredientResponse},
    recipes::{
        CreateRecipeRequest, RecipeDetailResponse, RecipeImageResponse, RecipeImageUpload,
        RecipeResponse, UpdateRecipeRequest,
    },
    tags::{CreateTagRequest, TagResponse},
    users::{CreateUserRequest, TokenRequest, TokenResponse, UpdateUserRequest, UserResponse},
};
use crate::storage::MediaStorage;

/// Application state shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    /// Database connection
    pub db: DatabaseConnection,
    /// Account creation and password checks
    pub users: UserManager,
    /// Access token issuing and verification
    pub tokens: TokenService,
    /// Uploaded media on disk
    pub media: MediaStorage,
}

/// Error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    pub code: String,
    /// Success status (always false for errors)
    pub success: bool,
    /// Per-field validation messages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<BTreeMap<String, Vec<String>>>,
}

/// Health check response
#[derive(Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Database connection status
    pub database: String,
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::users::create_user,
        crate::handlers::users::create_token,
        crate::handlers::users::get_me,
        crate::handlers::users::update_me,
        crate::handlers::tags::list_tags,
        crate::handlers::tags::create_tag,
        crate::handlers::ingredients::list_ingredients,
        crate::handlers::ingredients::create_ingredient,
        crate::handlers::recipes::list_recipes,
        crate::handlers::recipes::create_recipe,
        crate::handlers::recipes::get_recipe,
        crate::handlers::recipes::update_recipe,
        crate::handlers::recipes::partial_update_recipe,
        crate::handlers::recipes::delete_recipe,
        crate::handlers::recipes::upload_recipe_image,
    ),
    components(
        schemas(
            ErrorResponse,
            HealthResponse,
            CreateUserRequest,
            UpdateUserRequest,
            UserResponse,
            TokenRequest,
            TokenResponse,
            CreateTagRequest,
            TagResponse,
            CreateIngredientRequest,
            IngredientResponse,
            CreateRecipeRequest,
            UpdateRecipeRequest,
            RecipeResponse,
            RecipeDetailResponse,
            RecipeImageResponse,
            RecipeImageUpload,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "users", description = "Account registration, tokens and profile"),
        (name = "tags", description = "Recipe tags owned by the caller"),
        (name = "ingredients", description = "Ingredients owned by the caller"),
        (name = "recipes", description = "Recipes owned by the caller"),
    ),
    info(
        title = "Recipe API",
        description = "Recipe API - manage recipes with their tags, ingredients and images",
        version = "0.1.0",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
pub struct ApiDoc;
