use crate::auth::require_auth;
use crate::handlers::{
    health::health_check,
    ingredients::{create_ingredient, list_ingredients},
    recipes::{
        create_recipe, delete_recipe, get_recipe, list_recipes, partial_update_recipe,
        update_recipe, upload_recipe_image,
    },
    tags::{create_tag, list_tags},
    users::{create_token, create_user, get_me, update_me},
};
use crate::schemas::{ApiDoc, AppState};
use crate::storage::{MAX_IMAGE_UPLOAD_BYTES, MEDIA_URL};
use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, services::ServeDir, timeout::TimeoutLayer,
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    // Routes below require a valid bearer token
    let protected = Router::new()
        .route("/user/me", get(get_me).patch(update_me))
        .route("/recipe/tags", get(list_tags).post(create_tag))
        .route(
            "/recipe/ingredients",
            get(list_ingredients).post(create_ingredient),
        )
        .route("/recipe/recipes", get(list_recipes).post(create_recipe))
        .route(
            "/recipe/recipes/:recipe_id",
            get(get_recipe)
                .put(update_recipe)
                .patch(partial_update_recipe)
                .delete(delete_recipe),
        )
        .route(
            "/recipe/recipes/:recipe_id/upload-image",
            post(upload_recipe_image).layer(DefaultBodyLimit::max(MAX_IMAGE_UPLOAD_BYTES)),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Registration and token exchange
        .route("/user/create", post(create_user))
        .route("/user/token", post(create_token))
        .merge(protected)
        // Uploaded images
        .nest_service(MEDIA_URL, ServeDir::new(state.media.root()))
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(Duration::from_secs(30)))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
