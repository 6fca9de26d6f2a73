use model::entities::{ingredient, recipe, tag};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};

mod health;
mod recipes;

async fn insert_tag(db: &DatabaseConnection, user_id: i32, name: &str) -> tag::Model {
    tag::ActiveModel {
        name: Set(name.to_string()),
        user_id: Set(user_id),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

async fn insert_ingredient(db: &DatabaseConnection, user_id: i32, name: &str) -> ingredient::Model {
    ingredient::ActiveModel {
        name: Set(name.to_string()),
        user_id: Set(user_id),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

/// Recipe with default values, 10 minutes and 5.25
async fn insert_recipe(db: &DatabaseConnection, user_id: i32, title: &str) -> recipe::Model {
    recipe::ActiveModel {
        title: Set(title.to_string()),
        time_minutes: Set(10),
        price: Set(Decimal::new(525, 2)),
        image: Set(None),
        user_id: Set(user_id),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}
