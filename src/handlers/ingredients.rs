use crate::auth::AuthenticatedUser;
use crate::error::ApiError;
use crate::handlers::{AssignedOnlyQuery, JsonBody};
use crate::schemas::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
    Extension,
};
use model::entities::{ingredient, recipe_ingredient};
use sea_orm::{
    sea_query::Query as SqlQuery, ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use utoipa::ToSchema;
use validator::Validate;

/// Request structure for creating a new ingredient
#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct CreateIngredientRequest {
    /// The name of the ingredient
    #[serde(default)]
    #[validate(length(
        min = 1,
        max = 255,
        message = "This field may not be blank and may not exceed 255 characters."
    ))]
    pub name: String,
}

/// Response structure for ingredient operations
#[derive(Debug, Deserialize, Serialize, ToSchema, PartialEq, Eq)]
pub struct IngredientResponse {
    pub id: i32,
    pub name: String,
}

impl From<ingredient::Model> for IngredientResponse {
    fn from(model: ingredient::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
        }
    }
}

/// List the caller's ingredients, ordered by name descending
#[utoipa::path(
    get,
    path = "/recipe/ingredients",
    params(AssignedOnlyQuery),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Ingredients owned by the caller", body = Vec<IngredientResponse>),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "ingredients"
)]
#[instrument(skip(state))]
pub async fn list_ingredients(
    Extension(caller): Extension<AuthenticatedUser>,
    Query(query): Query<AssignedOnlyQuery>,
    State(state): State<AppState>,
) -> Result<Json<Vec<IngredientResponse>>, ApiError> {
    debug!("Fetching ingredients for user {}", caller.id);

    let mut select = ingredient::Entity::find()
        .filter(ingredient::Column::UserId.eq(caller.id))
        .order_by_desc(ingredient::Column::Name);

    if query.enabled() {
        select = select.filter(
            ingredient::Column::Id.in_subquery(
                SqlQuery::select()
                    .column(recipe_ingredient::Column::IngredientId)
                    .from(recipe_ingredient::Entity)
                    .to_owned(),
            ),
        );
    }

    let ingredients: Vec<IngredientResponse> = select
        .all(&state.db)
        .await?
        .into_iter()
        .map(IngredientResponse::from)
        .collect();

    info!("Successfully fetched {} ingredients for user {}", ingredients.len(), caller.id);
    Ok(Json(ingredients))
}

/// Create a new ingredient owned by the caller
#[utoipa::path(
    post,
    path = "/recipe/ingredients",
    request_body = CreateIngredientRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Ingredient created successfully", body = IngredientResponse),
        (status = 400, description = "Invalid request data", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "ingredients"
)]
#[instrument(skip(state))]
pub async fn create_ingredient(
    Extension(caller): Extension<AuthenticatedUser>,
    State(state): State<AppState>,
    JsonBody(mut request): JsonBody<CreateIngredientRequest>,
) -> Result<(StatusCode, Json<IngredientResponse>), ApiError> {
    request.name = request.name.trim().to_string();
    request.validate()?;
    debug!("Creating ingredient with name: {}", request.name);

    let new_ingredient = ingredient::ActiveModel {
        name: Set(request.name),
        user_id: Set(caller.id),
        ..Default::default()
    };

    let ingredient_model = new_ingredient.insert(&state.db).await?;
    info!("Successfully created ingredient with ID: {}", ingredient_model.id);
    Ok((StatusCode::CREATED, Json(IngredientResponse::from(ingredient_model))))
}
