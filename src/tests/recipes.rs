use super::{insert_ingredient, insert_recipe, insert_tag};
use crate::handlers::ingredients::IngredientResponse;
use crate::handlers::recipes::{RecipeDetailResponse, RecipeResponse};
use crate::handlers::tags::TagResponse;
use crate::schemas::ErrorResponse;
use crate::test_utils::TestContext;
use axum::http::StatusCode;
use model::entities::{recipe, recipe_ingredient, recipe_tag};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde_json::json;

fn recipe_url(recipe_id: i32) -> String {
    format!("/recipe/recipes/{}", recipe_id)
}

async fn link_tag(ctx: &TestContext, recipe_id: i32, tag_id: i32) {
    recipe_tag::ActiveModel {
        recipe_id: Set(recipe_id),
        tag_id: Set(tag_id),
    }
    .insert(&ctx.state.db)
    .await
    .unwrap();
}

async fn link_ingredient(ctx: &TestContext, recipe_id: i32, ingredient_id: i32) {
    recipe_ingredient::ActiveModel {
        recipe_id: Set(recipe_id),
        ingredient_id: Set(ingredient_id),
    }
    .insert(&ctx.state.db)
    .await
    .unwrap();
}

#[tokio::test]
async fn test_recipes_require_authentication() {
    let ctx = TestContext::new().await;

    let response = ctx.server.get("/recipe/recipes").await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_list_recipes_newest_first() {
    let ctx = TestContext::new().await;
    let user = ctx.create_user("test@example.com").await;
    let first = insert_recipe(&ctx.state.db, user.id, "First").await;
    let second = insert_recipe(&ctx.state.db, user.id, "Second").await;
    let (name, value) = ctx.auth_header(&user);

    let response = ctx.server.get("/recipe/recipes").add_header(name, value).await;

    response.assert_status(StatusCode::OK);
    let ids: Vec<i32> = response
        .json::<Vec<RecipeResponse>>()
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(ids, vec![second.id, first.id]);
}

#[tokio::test]
async fn test_list_recipes_limited_to_caller() {
    let ctx = TestContext::new().await;
    let user = ctx.create_user("test@example.com").await;
    let other = ctx.create_user("other@example.com").await;
    insert_recipe(&ctx.state.db, other.id, "Not mine").await;
    let own = insert_recipe(&ctx.state.db, user.id, "Mine").await;
    let (name, value) = ctx.auth_header(&user);

    let response = ctx.server.get("/recipe/recipes").add_header(name, value).await;

    response.assert_status(StatusCode::OK);
    let body: Vec<RecipeResponse> = response.json();
    assert_eq!(body.len(), 1);
    assert_eq!(body[0].id, own.id);
    assert_eq!(body[0].price, Decimal::new(525, 2));
}

#[tokio::test]
async fn test_view_recipe_detail() {
    let ctx = TestContext::new().await;
    let user = ctx.create_user("test@example.com").await;
    let recipe = insert_recipe(&ctx.state.db, user.id, "Sample recipe").await;
    let tag = insert_tag(&ctx.state.db, user.id, "Main course").await;
    let ingredient = insert_ingredient(&ctx.state.db, user.id, "Cinnamon").await;
    link_tag(&ctx, recipe.id, tag.id).await;
    link_ingredient(&ctx, recipe.id, ingredient.id).await;
    let (name, value) = ctx.auth_header(&user);

    let response = ctx.server.get(&recipe_url(recipe.id)).add_header(name, value).await;

    response.assert_status(StatusCode::OK);
    let body: RecipeDetailResponse = response.json();
    assert_eq!(body.title, "Sample recipe");
    assert_eq!(body.tags, vec![TagResponse { id: tag.id, name: tag.name }]);
    assert_eq!(
        body.ingredients,
        vec![IngredientResponse { id: ingredient.id, name: ingredient.name }]
    );
    assert_eq!(body.image, None);
}

#[tokio::test]
async fn test_view_other_users_recipe_is_not_found() {
    let ctx = TestContext::new().await;
    let user = ctx.create_user("test@example.com").await;
    let other = ctx.create_user("other@example.com").await;
    let recipe = insert_recipe(&ctx.state.db, other.id, "Private").await;
    let (name, value) = ctx.auth_header(&user);

    let response = ctx.server.get(&recipe_url(recipe.id)).add_header(name, value).await;

    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_basic_recipe() {
    let ctx = TestContext::new().await;
    let user = ctx.create_user("test@example.com").await;
    let (name, value) = ctx.auth_header(&user);

    let response = ctx
        .server
        .post("/recipe/recipes")
        .add_header(name, value)
        .json(&json!({"title": "Chocolate cheesecake", "time_minutes": 30, "price": "5.00"}))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: RecipeResponse = response.json();
    let stored = recipe::Entity::find_by_id(body.id)
        .one(&ctx.state.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.title, "Chocolate cheesecake");
    assert_eq!(stored.time_minutes, 30);
    assert_eq!(stored.normalized_price().to_string(), "5.00");
    assert_eq!(stored.user_id, user.id);
    assert_eq!(body.price.to_string(), "5.00");
}

#[tokio::test]
async fn test_create_recipe_with_tags_and_ingredients() {
    let ctx = TestContext::new().await;
    let user = ctx.create_user("test@example.com").await;
    let vegan = insert_tag(&ctx.state.db, user.id, "Vegan").await;
    let dessert = insert_tag(&ctx.state.db, user.id, "Dessert").await;
    let prawns = insert_ingredient(&ctx.state.db, user.id, "Prawns").await;
    let ginger = insert_ingredient(&ctx.state.db, user.id, "Ginger").await;
    let (name, value) = ctx.auth_header(&user);

    let response = ctx
        .server
        .post("/recipe/recipes")
        .add_header(name, value)
        .json(&json!({
            "title": "Thai prawn red curry",
            "time_minutes": 20,
            "price": "7.00",
            "tags": [vegan.id, dessert.id],
            "ingredients": [prawns.id, ginger.id, ginger.id]
        }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: RecipeResponse = response.json();
    assert_eq!(body.tags, vec![vegan.id, dessert.id]);
    assert_eq!(body.ingredients, vec![prawns.id, ginger.id]);

    let links = recipe_tag::Entity::find()
        .filter(recipe_tag::Column::RecipeId.eq(body.id))
        .all(&ctx.state.db)
        .await
        .unwrap();
    assert_eq!(links.len(), 2);
}

#[tokio::test]
async fn test_create_recipe_with_foreign_tag_fails() {
    let ctx = TestContext::new().await;
    let user = ctx.create_user("test@example.com").await;
    let other = ctx.create_user("other@example.com").await;
    let foreign = insert_tag(&ctx.state.db, other.id, "Theirs").await;
    let (name, value) = ctx.auth_header(&user);

    let response = ctx
        .server
        .post("/recipe/recipes")
        .add_header(name, value)
        .json(&json!({
            "title": "Sneaky",
            "time_minutes": 5,
            "price": "1.00",
            "tags": [foreign.id]
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: ErrorResponse = response.json();
    assert!(body.fields.unwrap().contains_key("tags"));
    assert!(recipe::Entity::find().all(&ctx.state.db).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_create_recipe_with_invalid_price_fails() {
    let ctx = TestContext::new().await;
    let user = ctx.create_user("test@example.com").await;
    let (name, value) = ctx.auth_header(&user);

    let response = ctx
        .server
        .post("/recipe/recipes")
        .add_header(name, value)
        .json(&json!({"title": "Gold leaf", "time_minutes": 5, "price": "1.234"}))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: ErrorResponse = response.json();
    assert!(body.fields.unwrap().contains_key("price"));
}

#[tokio::test]
async fn test_filter_recipes_by_tags() {
    let ctx = TestContext::new().await;
    let user = ctx.create_user("test@example.com").await;
    let curry = insert_recipe(&ctx.state.db, user.id, "Thai vegetable curry").await;
    let tahini = insert_recipe(&ctx.state.db, user.id, "Aubergine with tahini").await;
    insert_recipe(&ctx.state.db, user.id, "Fish and chips").await;
    let vegan = insert_tag(&ctx.state.db, user.id, "Vegan").await;
    let vegetarian = insert_tag(&ctx.state.db, user.id, "Vegetarian").await;
    link_tag(&ctx, curry.id, vegan.id).await;
    link_tag(&ctx, tahini.id, vegetarian.id).await;
    let (name, value) = ctx.auth_header(&user);

    let response = ctx
        .server
        .get("/recipe/recipes")
        .add_query_param("tags", format!("{},{}", vegan.id, vegetarian.id))
        .add_header(name, value)
        .await;

    response.assert_status(StatusCode::OK);
    let ids: Vec<i32> = response
        .json::<Vec<RecipeResponse>>()
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(ids, vec![tahini.id, curry.id]);
}

#[tokio::test]
async fn test_filter_recipes_by_ingredients() {
    let ctx = TestContext::new().await;
    let user = ctx.create_user("test@example.com").await;
    let beans = insert_recipe(&ctx.state.db, user.id, "Posh beans on toast").await;
    insert_recipe(&ctx.state.db, user.id, "Steak and mushrooms").await;
    let feta = insert_ingredient(&ctx.state.db, user.id, "Feta cheese").await;
    link_ingredient(&ctx, beans.id, feta.id).await;
    let (name, value) = ctx.auth_header(&user);

    let response = ctx
        .server
        .get("/recipe/recipes")
        .add_query_param("ingredients", feta.id)
        .add_header(name, value)
        .await;

    response.assert_status(StatusCode::OK);
    let body: Vec<RecipeResponse> = response.json();
    assert_eq!(body.len(), 1);
    assert_eq!(body[0].id, beans.id);
    assert_eq!(body[0].ingredients, vec![feta.id]);
}

#[tokio::test]
async fn test_filter_with_malformed_ids_fails() {
    let ctx = TestContext::new().await;
    let user = ctx.create_user("test@example.com").await;
    let (name, value) = ctx.auth_header(&user);

    let response = ctx
        .server
        .get("/recipe/recipes")
        .add_query_param("tags", "1,abc")
        .add_header(name, value)
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_partial_update_recipe() {
    let ctx = TestContext::new().await;
    let user = ctx.create_user("test@example.com").await;
    let recipe = insert_recipe(&ctx.state.db, user.id, "Chicken tikka").await;
    let old_tag = insert_tag(&ctx.state.db, user.id, "Spicy").await;
    link_tag(&ctx, recipe.id, old_tag.id).await;
    let new_tag = insert_tag(&ctx.state.db, user.id, "Curry").await;
    let (name, value) = ctx.auth_header(&user);

    let response = ctx
        .server
        .patch(&recipe_url(recipe.id))
        .add_header(name, value)
        .json(&json!({"title": "Chicken tikka masala", "tags": [new_tag.id]}))
        .await;

    response.assert_status(StatusCode::OK);
    let body: RecipeResponse = response.json();
    assert_eq!(body.title, "Chicken tikka masala");
    assert_eq!(body.time_minutes, recipe.time_minutes);
    assert_eq!(body.tags, vec![new_tag.id]);
}

#[tokio::test]
async fn test_full_update_recipe() {
    let ctx = TestContext::new().await;
    let user = ctx.create_user("test@example.com").await;
    let recipe = insert_recipe(&ctx.state.db, user.id, "Spaghetti carbonara").await;
    let tag = insert_tag(&ctx.state.db, user.id, "Pasta").await;
    link_tag(&ctx, recipe.id, tag.id).await;
    let (name, value) = ctx.auth_header(&user);

    let response = ctx
        .server
        .put(&recipe_url(recipe.id))
        .add_header(name, value)
        .json(&json!({"title": "Spaghetti bolognese", "time_minutes": 25, "price": "5.00"}))
        .await;

    response.assert_status(StatusCode::OK);
    let stored = recipe::Entity::find_by_id(recipe.id)
        .one(&ctx.state.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.title, "Spaghetti bolognese");
    assert_eq!(stored.time_minutes, 25);
    assert_eq!(stored.normalized_price(), Decimal::new(500, 2));
    let body: RecipeResponse = response.json();
    assert!(body.tags.is_empty());
}

#[tokio::test]
async fn test_update_other_users_recipe_is_not_found() {
    let ctx = TestContext::new().await;
    let user = ctx.create_user("test@example.com").await;
    let other = ctx.create_user("other@example.com").await;
    let recipe = insert_recipe(&ctx.state.db, other.id, "Theirs").await;
    let (name, value) = ctx.auth_header(&user);

    let response = ctx
        .server
        .patch(&recipe_url(recipe.id))
        .add_header(name, value)
        .json(&json!({"title": "Mine now"}))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
    let stored = recipe::Entity::find_by_id(recipe.id)
        .one(&ctx.state.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.title, "Theirs");
}

#[tokio::test]
async fn test_delete_recipe_removes_associations() {
    let ctx = TestContext::new().await;
    let user = ctx.create_user("test@example.com").await;
    let recipe = insert_recipe(&ctx.state.db, user.id, "Short lived").await;
    let tag = insert_tag(&ctx.state.db, user.id, "Gone").await;
    link_tag(&ctx, recipe.id, tag.id).await;
    let (name, value) = ctx.auth_header(&user);

    let response = ctx.server.delete(&recipe_url(recipe.id)).add_header(name, value).await;

    response.assert_status(StatusCode::NO_CONTENT);
    assert!(recipe::Entity::find_by_id(recipe.id)
        .one(&ctx.state.db)
        .await
        .unwrap()
        .is_none());
    assert!(recipe_tag::Entity::find().all(&ctx.state.db).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_other_users_recipe_is_not_found() {
    let ctx = TestContext::new().await;
    let user = ctx.create_user("test@example.com").await;
    let other = ctx.create_user("other@example.com").await;
    let recipe = insert_recipe(&ctx.state.db, other.id, "Theirs").await;
    let (name, value) = ctx.auth_header(&user);

    let response = ctx.server.delete(&recipe_url(recipe.id)).add_header(name, value).await;

    response.assert_status(StatusCode::NOT_FOUND);
    assert!(recipe::Entity::find_by_id(recipe.id)
        .one(&ctx.state.db)
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn test_create_recipe_missing_required_field_fails() {
    let ctx = TestContext::new().await;
    let user = ctx.create_user("test@example.com").await;
    let (name, value) = ctx.auth_header(&user);

    let response = ctx
        .server
        .post("/recipe/recipes")
        .add_header(name, value)
        .json(&json!({"title": "Soup"}))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: ErrorResponse = response.json();
    assert_eq!(body.code, "VALIDATION_ERROR");
    assert!(body.fields.unwrap().contains_key("time_minutes"));
    assert!(recipe::Entity::find().all(&ctx.state.db).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_empty_filter_is_ignored() {
    let ctx = TestContext::new().await;
    let user = ctx.create_user("test@example.com").await;
    let recipe = insert_recipe(&ctx.state.db, user.id, "Unfiltered").await;
    let (name, value) = ctx.auth_header(&user);

    let response = ctx
        .server
        .get("/recipe/recipes")
        .add_query_param("tags", "")
        .add_query_param("ingredients", "")
        .add_header(name, value)
        .await;

    response.assert_status(StatusCode::OK);
    let body: Vec<RecipeResponse> = response.json();
    assert_eq!(body.len(), 1);
    assert_eq!(body[0].id, recipe.id);
}
