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
use model::entities::{recipe_tag, tag};
use sea_orm::{
    sea_query::Query as SqlQuery, ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use utoipa::ToSchema;
use validator::Validate;

/// Request structure for creating a new tag
#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct CreateTagRequest {
    /// The name of the tag
    #[serde(default)]
    #[validate(length(
        min = 1,
        max = 255,
        message = "This field may not be blank and may not exceed 255 characters."
    ))]
    pub name: String,
}

/// Response structure for tag operations
#[derive(Debug, Deserialize, Serialize, ToSchema, PartialEq, Eq)]
pub struct TagResponse {
    pub id: i32,
    pub name: String,
}

impl From<tag::Model> for TagResponse {
    fn from(model: tag::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
        }
    }
}

/// List the caller's tags, ordered by name descending
#[utoipa::path(
    get,
    path = "/recipe/tags",
    params(AssignedOnlyQuery),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Tags owned by the caller", body = Vec<TagResponse>),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "tags"
)]
#[instrument(skip(state))]
pub async fn list_tags(
    Extension(caller): Extension<AuthenticatedUser>,
    Query(query): Query<AssignedOnlyQuery>,
    State(state): State<AppState>,
) -> Result<Json<Vec<TagResponse>>, ApiError> {
    debug!("Fetching tags for user {}", caller.id);

    let mut select = tag::Entity::find()
        .filter(tag::Column::UserId.eq(caller.id))
        .order_by_desc(tag::Column::Name);

    if query.enabled() {
        select = select.filter(
            tag::Column::Id.in_subquery(
                SqlQuery::select()
                    .column(recipe_tag::Column::TagId)
                    .from(recipe_tag::Entity)
                    .to_owned(),
            ),
        );
    }

    let tags: Vec<TagResponse> = select
        .all(&state.db)
        .await?
        .into_iter()
        .map(TagResponse::from)
        .collect();

    info!("Successfully fetched {} tags for user {}", tags.len(), caller.id);
    Ok(Json(tags))
}

/// Create a new tag owned by the caller
#[utoipa::path(
    post,
    path = "/recipe/tags",
    request_body = CreateTagRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Tag created successfully", body = TagResponse),
        (status = 400, description = "Invalid request data", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "tags"
)]
#[instrument(skip(state))]
pub async fn create_tag(
    Extension(caller): Extension<AuthenticatedUser>,
    State(state): State<AppState>,
    JsonBody(mut request): JsonBody<CreateTagRequest>,
) -> Result<(StatusCode, Json<TagResponse>), ApiError> {
    request.name = request.name.trim().to_string();
    request.validate()?;
    debug!("Creating tag with name: {}", request.name);

    let new_tag = tag::ActiveModel {
        name: Set(request.name),
        user_id: Set(caller.id),
        ..Default::default()
    };

    let tag_model = new_tag.insert(&state.db).await?;
    info!("Successfully created tag with ID: {}", tag_model.id);
    Ok((StatusCode::CREATED, Json(TagResponse::from(tag_model))))
}
