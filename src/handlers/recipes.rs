use std::collections::{BTreeSet, HashMap};

use crate::auth::AuthenticatedUser;
use crate::error::ApiError;
use crate::handlers::{ingredients::IngredientResponse, tags::TagResponse, JsonBody};
use crate::schemas::AppState;
use crate::storage::MediaStorage;
use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::Json,
    Extension,
};
use model::entities::{ingredient, recipe, recipe_ingredient, recipe_tag, tag};
use model::entities::recipe::normalize_price;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Query as SqlQuery, ActiveModelTrait, ColumnTrait, ConnectionTrait,
    DatabaseConnection, EntityTrait, ModelTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, trace, warn};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Request structure for creating or replacing a recipe
#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct CreateRecipeRequest {
    #[serde(default)]
    #[validate(length(
        min = 1,
        max = 255,
        message = "This field may not be blank and may not exceed 255 characters."
    ))]
    pub title: String,
    /// Preparation time in minutes
    #[validate(range(min = 0, message = "Ensure this value is greater than or equal to 0."))]
    pub time_minutes: i32,
    /// Price with at most 5 digits, 2 of them after the decimal point
    pub price: Decimal,
    /// IDs of the caller's tags to attach
    #[serde(default)]
    pub tags: Vec<i32>,
    /// IDs of the caller's ingredients to attach
    #[serde(default)]
    pub ingredients: Vec<i32>,
}

/// Request structure for partially updating a recipe.
/// Supplied tag or ingredient lists replace the current associations.
#[derive(Debug, Default, Deserialize, Serialize, Validate, ToSchema)]
pub struct UpdateRecipeRequest {
    #[validate(length(
        min = 1,
        max = 255,
        message = "This field may not be blank and may not exceed 255 characters."
    ))]
    pub title: Option<String>,
    #[validate(range(min = 0, message = "Ensure this value is greater than or equal to 0."))]
    pub time_minutes: Option<i32>,
    pub price: Option<Decimal>,
    pub tags: Option<Vec<i32>>,
    pub ingredients: Option<Vec<i32>>,
}

/// Recipe as listed, with tags and ingredients as IDs
#[derive(Debug, Deserialize, Serialize, ToSchema, PartialEq)]
pub struct RecipeResponse {
    pub id: i32,
    pub title: String,
    pub time_minutes: i32,
    pub price: Decimal,
    pub tags: Vec<i32>,
    pub ingredients: Vec<i32>,
    /// URL of the uploaded image
    pub image: Option<String>,
}

/// Recipe detail with nested tag and ingredient objects
#[derive(Debug, Deserialize, Serialize, ToSchema, PartialEq)]
pub struct RecipeDetailResponse {
    pub id: i32,
    pub title: String,
    pub time_minutes: i32,
    pub price: Decimal,
    pub tags: Vec<TagResponse>,
    pub ingredients: Vec<IngredientResponse>,
    /// URL of the uploaded image
    pub image: Option<String>,
}

/// Result of an image upload
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct RecipeImageResponse {
    pub id: i32,
    pub image: Option<String>,
}

/// Multipart form accepted by the image upload endpoint
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct RecipeImageUpload {
    #[schema(value_type = String, format = Binary)]
    pub image: Vec<u8>,
}

/// Query parameters for the recipe listing
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct RecipeListQuery {
    /// Comma separated tag IDs; recipes carrying any of them match
    pub tags: Option<String>,
    /// Comma separated ingredient IDs; recipes using any of them match
    pub ingredients: Option<String>,
}

/// Parse a comma separated list of IDs such as `1,2,3`.
fn parse_id_list(raw: &str, field: &str) -> Result<Vec<i32>, ApiError> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<i32>()
                .map_err(|_| ApiError::field(field, format!("\"{part}\" is not a valid ID.")))
        })
        .collect()
}

/// Check the price against the column's precision and normalize its scale.
fn validate_price(price: Decimal) -> Result<Decimal, ApiError> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(ApiError::field(
            "price",
            "Ensure this value is greater than or equal to 0.",
        ));
    }
    if price.normalize().scale() > recipe::PRICE_SCALE {
        return Err(ApiError::field(
            "price",
            "Ensure that there are no more than 2 decimal places.",
        ));
    }
    if price >= Decimal::from(1000) {
        return Err(ApiError::field(
            "price",
            "Ensure that there are no more than 5 digits in total.",
        ));
    }
    Ok(normalize_price(price))
}

/// Deduplicate `ids` and make sure every one of them is a tag owned by `user_id`.
async fn owned_tag_ids<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    ids: &[i32],
) -> Result<Vec<i32>, ApiError> {
    let wanted: BTreeSet<i32> = ids.iter().copied().collect();
    if wanted.is_empty() {
        return Ok(Vec::new());
    }

    let found: BTreeSet<i32> = tag::Entity::find()
        .filter(tag::Column::UserId.eq(user_id))
        .filter(tag::Column::Id.is_in(wanted.iter().copied()))
        .all(db)
        .await?
        .into_iter()
        .map(|t| t.id)
        .collect();

    if let Some(missing) = wanted.difference(&found).next() {
        warn!("Tag {} is not owned by user {}", missing, user_id);
        return Err(ApiError::field(
            "tags",
            format!("Invalid pk \"{missing}\" - object does not exist."),
        ));
    }
    Ok(wanted.into_iter().collect())
}

/// Deduplicate `ids` and make sure every one of them is an ingredient owned by `user_id`.
async fn owned_ingredient_ids<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    ids: &[i32],
) -> Result<Vec<i32>, ApiError> {
    let wanted: BTreeSet<i32> = ids.iter().copied().collect();
    if wanted.is_empty() {
        return Ok(Vec::new());
    }

    let found: BTreeSet<i32> = ingredient::Entity::find()
        .filter(ingredient::Column::UserId.eq(user_id))
        .filter(ingredient::Column::Id.is_in(wanted.iter().copied()))
        .all(db)
        .await?
        .into_iter()
        .map(|i| i.id)
        .collect();

    if let Some(missing) = wanted.difference(&found).next() {
        warn!("Ingredient {} is not owned by user {}", missing, user_id);
        return Err(ApiError::field(
            "ingredients",
            format!("Invalid pk \"{missing}\" - object does not exist."),
        ));
    }
    Ok(wanted.into_iter().collect())
}

async fn replace_tags<C: ConnectionTrait>(db: &C, recipe_id: i32, tag_ids: &[i32]) -> Result<(), ApiError> {
    recipe_tag::Entity::delete_many()
        .filter(recipe_tag::Column::RecipeId.eq(recipe_id))
        .exec(db)
        .await?;

    if !tag_ids.is_empty() {
        let links = tag_ids.iter().map(|&tag_id| recipe_tag::ActiveModel {
            recipe_id: Set(recipe_id),
            tag_id: Set(tag_id),
        });
        recipe_tag::Entity::insert_many(links)
            .exec_without_returning(db)
            .await?;
    }
    Ok(())
}

async fn replace_ingredients<C: ConnectionTrait>(
    db: &C,
    recipe_id: i32,
    ingredient_ids: &[i32],
) -> Result<(), ApiError> {
    recipe_ingredient::Entity::delete_many()
        .filter(recipe_ingredient::Column::RecipeId.eq(recipe_id))
        .exec(db)
        .await?;

    if !ingredient_ids.is_empty() {
        let links = ingredient_ids.iter().map(|&ingredient_id| recipe_ingredient::ActiveModel {
            recipe_id: Set(recipe_id),
            ingredient_id: Set(ingredient_id),
        });
        recipe_ingredient::Entity::insert_many(links)
            .exec_without_returning(db)
            .await?;
    }
    Ok(())
}

/// Fetch a recipe, treating recipes of other users as missing.
async fn find_owned_recipe(
    db: &DatabaseConnection,
    user_id: i32,
    recipe_id: i32,
) -> Result<recipe::Model, ApiError> {
    match recipe::Entity::find_by_id(recipe_id)
        .filter(recipe::Column::UserId.eq(user_id))
        .one(db)
        .await?
    {
        Some(recipe) => Ok(recipe),
        None => {
            warn!("Recipe {} not found for user {}", recipe_id, user_id);
            Err(ApiError::NotFound(format!("Recipe {} not found", recipe_id)))
        }
    }
}

/// Build list entries, loading association IDs with one query per join table.
async fn to_recipe_responses(
    db: &DatabaseConnection,
    media: &MediaStorage,
    recipes: Vec<recipe::Model>,
) -> Result<Vec<RecipeResponse>, ApiError> {
    let recipe_ids: Vec<i32> = recipes.iter().map(|r| r.id).collect();
    let mut tags_by_recipe: HashMap<i32, Vec<i32>> = HashMap::new();
    let mut ingredients_by_recipe: HashMap<i32, Vec<i32>> = HashMap::new();

    if !recipe_ids.is_empty() {
        for link in recipe_tag::Entity::find()
            .filter(recipe_tag::Column::RecipeId.is_in(recipe_ids.clone()))
            .order_by_asc(recipe_tag::Column::TagId)
            .all(db)
            .await?
        {
            tags_by_recipe.entry(link.recipe_id).or_default().push(link.tag_id);
        }

        for link in recipe_ingredient::Entity::find()
            .filter(recipe_ingredient::Column::RecipeId.is_in(recipe_ids))
            .order_by_asc(recipe_ingredient::Column::IngredientId)
            .all(db)
            .await?
        {
            ingredients_by_recipe
                .entry(link.recipe_id)
                .or_default()
                .push(link.ingredient_id);
        }
    }

    Ok(recipes
        .into_iter()
        .map(|recipe| RecipeResponse {
            id: recipe.id,
            price: recipe.normalized_price(),
            tags: tags_by_recipe.remove(&recipe.id).unwrap_or_default(),
            ingredients: ingredients_by_recipe.remove(&recipe.id).unwrap_or_default(),
            image: recipe.image.as_deref().map(|path| media.url_for(path)),
            title: recipe.title,
            time_minutes: recipe.time_minutes,
        })
        .collect())
}

async fn to_recipe_response(
    db: &DatabaseConnection,
    media: &MediaStorage,
    recipe: recipe::Model,
) -> Result<RecipeResponse, ApiError> {
    let mut responses = to_recipe_responses(db, media, vec![recipe]).await?;
    responses
        .pop()
        .ok_or_else(|| ApiError::Internal("Recipe response could not be built".to_string()))
}

async fn to_detail_response(
    db: &DatabaseConnection,
    media: &MediaStorage,
    recipe: recipe::Model,
) -> Result<RecipeDetailResponse, ApiError> {
    let tags = recipe
        .find_related(tag::Entity)
        .order_by_asc(tag::Column::Id)
        .all(db)
        .await?;
    let ingredients = recipe
        .find_related(ingredient::Entity)
        .order_by_asc(ingredient::Column::Id)
        .all(db)
        .await?;

    Ok(RecipeDetailResponse {
        id: recipe.id,
        price: recipe.normalized_price(),
        tags: tags.into_iter().map(TagResponse::from).collect(),
        ingredients: ingredients.into_iter().map(IngredientResponse::from).collect(),
        image: recipe.image.as_deref().map(|path| media.url_for(path)),
        title: recipe.title,
        time_minutes: recipe.time_minutes,
    })
}

/// List the caller's recipes, newest first
#[utoipa::path(
    get,
    path = "/recipe/recipes",
    params(RecipeListQuery),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Recipes owned by the caller", body = Vec<RecipeResponse>),
        (status = 400, description = "Malformed filter", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "recipes"
)]
#[instrument(skip(state))]
pub async fn list_recipes(
    Extension(caller): Extension<AuthenticatedUser>,
    Query(query): Query<RecipeListQuery>,
    State(state): State<AppState>,
) -> Result<Json<Vec<RecipeResponse>>, ApiError> {
    debug!("Fetching recipes for user {}", caller.id);

    let mut select = recipe::Entity::find()
        .filter(recipe::Column::UserId.eq(caller.id))
        .order_by_desc(recipe::Column::Id);

    let tag_ids = match query.tags.as_deref() {
        Some(raw) => parse_id_list(raw, "tags")?,
        None => Vec::new(),
    };
    if !tag_ids.is_empty() {
        trace!("Filtering recipes by tags {:?}", tag_ids);
        select = select.filter(
            recipe::Column::Id.in_subquery(
                SqlQuery::select()
                    .column(recipe_tag::Column::RecipeId)
                    .from(recipe_tag::Entity)
                    .and_where(recipe_tag::Column::TagId.is_in(tag_ids))
                    .to_owned(),
            ),
        );
    }

    let ingredient_ids = match query.ingredients.as_deref() {
        Some(raw) => parse_id_list(raw, "ingredients")?,
        None => Vec::new(),
    };
    if !ingredient_ids.is_empty() {
        trace!("Filtering recipes by ingredients {:?}", ingredient_ids);
        select = select.filter(
            recipe::Column::Id.in_subquery(
                SqlQuery::select()
                    .column(recipe_ingredient::Column::RecipeId)
                    .from(recipe_ingredient::Entity)
                    .and_where(recipe_ingredient::Column::IngredientId.is_in(ingredient_ids))
                    .to_owned(),
            ),
        );
    }

    let recipes = select.all(&state.db).await?;
    let responses = to_recipe_responses(&state.db, &state.media, recipes).await?;

    info!("Successfully fetched {} recipes for user {}", responses.len(), caller.id);
    Ok(Json(responses))
}

/// Get one of the caller's recipes with nested tags and ingredients
#[utoipa::path(
    get,
    path = "/recipe/recipes/{recipe_id}",
    params(
        ("recipe_id" = i32, Path, description = "Recipe ID")
    ),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Recipe details", body = RecipeDetailResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "recipes"
)]
#[instrument(skip(state))]
pub async fn get_recipe(
    Extension(caller): Extension<AuthenticatedUser>,
    Path(recipe_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<RecipeDetailResponse>, ApiError> {
    let recipe = find_owned_recipe(&state.db, caller.id, recipe_id).await?;
    let detail = to_detail_response(&state.db, &state.media, recipe).await?;

    info!("Successfully found recipe with ID: {}", recipe_id);
    Ok(Json(detail))
}

/// Create a recipe owned by the caller
#[utoipa::path(
    post,
    path = "/recipe/recipes",
    request_body = CreateRecipeRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Recipe created successfully", body = RecipeResponse),
        (status = 400, description = "Invalid request data", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "recipes"
)]
#[instrument(skip(state))]
pub async fn create_recipe(
    Extension(caller): Extension<AuthenticatedUser>,
    State(state): State<AppState>,
    JsonBody(mut request): JsonBody<CreateRecipeRequest>,
) -> Result<(StatusCode, Json<RecipeResponse>), ApiError> {
    request.title = request.title.trim().to_string();
    request.validate()?;
    let price = validate_price(request.price)?;
    debug!("Creating recipe with title: {}", request.title);

    let txn = state.db.begin().await?;

    let tag_ids = owned_tag_ids(&txn, caller.id, &request.tags).await?;
    let ingredient_ids = owned_ingredient_ids(&txn, caller.id, &request.ingredients).await?;

    let recipe_model = recipe::ActiveModel {
        title: Set(request.title),
        time_minutes: Set(request.time_minutes),
        price: Set(price),
        image: Set(None),
        user_id: Set(caller.id),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    replace_tags(&txn, recipe_model.id, &tag_ids).await?;
    replace_ingredients(&txn, recipe_model.id, &ingredient_ids).await?;
    txn.commit().await?;

    info!("Successfully created recipe with ID: {}", recipe_model.id);
    let response = to_recipe_response(&state.db, &state.media, recipe_model).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Replace one of the caller's recipes
#[utoipa::path(
    put,
    path = "/recipe/recipes/{recipe_id}",
    params(
        ("recipe_id" = i32, Path, description = "Recipe ID")
    ),
    request_body = CreateRecipeRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Recipe updated successfully", body = RecipeResponse),
        (status = 400, description = "Invalid request data", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "recipes"
)]
#[instrument(skip(state))]
pub async fn update_recipe(
    Extension(caller): Extension<AuthenticatedUser>,
    Path(recipe_id): Path<i32>,
    State(state): State<AppState>,
    JsonBody(request): JsonBody<CreateRecipeRequest>,
) -> Result<Json<RecipeResponse>, ApiError> {
    let patch = UpdateRecipeRequest {
        title: Some(request.title),
        time_minutes: Some(request.time_minutes),
        price: Some(request.price),
        tags: Some(request.tags),
        ingredients: Some(request.ingredients),
    };
    apply_recipe_update(&state, &caller, recipe_id, patch).await.map(Json)
}

/// Partially update one of the caller's recipes
#[utoipa::path(
    patch,
    path = "/recipe/recipes/{recipe_id}",
    params(
        ("recipe_id" = i32, Path, description = "Recipe ID")
    ),
    request_body = UpdateRecipeRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Recipe updated successfully", body = RecipeResponse),
        (status = 400, description = "Invalid request data", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "recipes"
)]
#[instrument(skip(state))]
pub async fn partial_update_recipe(
    Extension(caller): Extension<AuthenticatedUser>,
    Path(recipe_id): Path<i32>,
    State(state): State<AppState>,
    JsonBody(request): JsonBody<UpdateRecipeRequest>,
) -> Result<Json<RecipeResponse>, ApiError> {
    apply_recipe_update(&state, &caller, recipe_id, request).await.map(Json)
}

async fn apply_recipe_update(
    state: &AppState,
    caller: &AuthenticatedUser,
    recipe_id: i32,
    mut request: UpdateRecipeRequest,
) -> Result<RecipeResponse, ApiError> {
    debug!("Updating recipe with ID: {}", recipe_id);
    request.title = request.title.map(|title| title.trim().to_string());
    request.validate()?;
    let price = request.price.map(validate_price).transpose()?;

    let existing = find_owned_recipe(&state.db, caller.id, recipe_id).await?;

    let txn = state.db.begin().await?;

    let tag_ids = match &request.tags {
        Some(ids) => Some(owned_tag_ids(&txn, caller.id, ids).await?),
        None => None,
    };
    let ingredient_ids = match &request.ingredients {
        Some(ids) => Some(owned_ingredient_ids(&txn, caller.id, ids).await?),
        None => None,
    };

    let mut active_recipe: recipe::ActiveModel = existing.into();
    if let Some(title) = request.title {
        active_recipe.title = Set(title);
    }
    if let Some(time_minutes) = request.time_minutes {
        active_recipe.time_minutes = Set(time_minutes);
    }
    if let Some(price) = price {
        active_recipe.price = Set(price);
    }
    let updated = active_recipe.update(&txn).await?;

    if let Some(tag_ids) = tag_ids {
        replace_tags(&txn, recipe_id, &tag_ids).await?;
    }
    if let Some(ingredient_ids) = ingredient_ids {
        replace_ingredients(&txn, recipe_id, &ingredient_ids).await?;
    }
    txn.commit().await?;

    info!("Successfully updated recipe with ID: {}", recipe_id);
    to_recipe_response(&state.db, &state.media, updated).await
}

/// Delete one of the caller's recipes
#[utoipa::path(
    delete,
    path = "/recipe/recipes/{recipe_id}",
    params(
        ("recipe_id" = i32, Path, description = "Recipe ID")
    ),
    security(("bearer_auth" = [])),
    responses(
        (status = 204, description = "Recipe deleted successfully"),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "recipes"
)]
#[instrument(skip(state))]
pub async fn delete_recipe(
    Extension(caller): Extension<AuthenticatedUser>,
    Path(recipe_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let recipe = find_owned_recipe(&state.db, caller.id, recipe_id).await?;
    let image = recipe.image.clone();

    let delete_result = recipe.delete(&state.db).await?;
    debug!("Delete operation completed. Rows affected: {}", delete_result.rows_affected);

    if let Some(path) = image {
        state.media.remove(&path).await;
    }

    info!("Successfully deleted recipe with ID: {}", recipe_id);
    Ok(StatusCode::NO_CONTENT)
}

/// Upload an image for one of the caller's recipes
#[utoipa::path(
    post,
    path = "/recipe/recipes/{recipe_id}/upload-image",
    params(
        ("recipe_id" = i32, Path, description = "Recipe ID")
    ),
    request_body(content = RecipeImageUpload, content_type = "multipart/form-data"),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Image stored", body = RecipeImageResponse),
        (status = 400, description = "Missing or invalid image", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "recipes"
)]
#[instrument(skip(state, multipart))]
pub async fn upload_recipe_image(
    Extension(caller): Extension<AuthenticatedUser>,
    Path(recipe_id): Path<i32>,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<RecipeImageResponse>, ApiError> {
    let recipe = find_owned_recipe(&state.db, caller.id, recipe_id).await?;

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::field("image", format!("Malformed multipart body: {e}")))?
    {
        if field.name() != Some("image") {
            trace!("Ignoring multipart field {:?}", field.name());
            continue;
        }
        let filename = field.file_name().unwrap_or("image").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::field("image", format!("Failed to read upload: {e}")))?;
        upload = Some((filename, bytes));
    }

    let Some((filename, bytes)) = upload else {
        warn!("Image upload for recipe {} carried no image field", recipe_id);
        return Err(ApiError::field("image", "No file was submitted."));
    };

    let format = state.media.validate_image(&bytes)?;
    let stored = state.media.save_recipe_image(&filename, format, &bytes).await?;
    let previous = recipe.image.clone();

    let mut active_recipe: recipe::ActiveModel = recipe.into();
    active_recipe.image = Set(Some(stored.clone()));
    let updated = match active_recipe.update(&state.db).await {
        Ok(updated) => updated,
        Err(e) => {
            error!("Failed to record image for recipe {}: {}", recipe_id, e);
            state.media.remove(&stored).await;
            return Err(e.into());
        }
    };

    if let Some(previous) = previous.filter(|p| *p != stored) {
        state.media.remove(&previous).await;
    }

    info!("Stored image {} for recipe {}", stored, recipe_id);
    Ok(Json(RecipeImageResponse {
        id: updated.id,
        image: updated.image.as_deref().map(|path| state.media.url_for(path)),
    }))
}
