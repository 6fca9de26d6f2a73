use std::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use sea_orm::entity::prelude::*;

use super::{ingredient, tag};

/// Number of decimal places a recipe price carries.
pub const PRICE_SCALE: u32 = 2;

/// A recipe owned by a single user.
/// Tags and ingredients hang off it through the `recipes_tags` and
/// `recipes_ingredients` join tables.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "recipes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    pub time_minutes: i32,
    #[sea_orm(column_type = "Decimal(Some((5, 2)))")]
    pub price: Decimal,
    /// Path of the uploaded image relative to the media root,
    /// e.g. `uploads/recipe/<uuid>.jpg`.
    pub image: Option<String>,
    pub user_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
    #[sea_orm(has_many = "super::recipe_tag::Entity")]
    RecipeTag,
    #[sea_orm(has_many = "super::recipe_ingredient::Entity")]
    RecipeIngredient,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<tag::Entity> for Entity {
    fn to() -> RelationDef {
        super::recipe_tag::Relation::Tag.def()
    }
    fn via() -> Option<RelationDef> {
        Some(super::recipe_tag::Relation::Recipe.def().rev())
    }
}

impl Related<ingredient::Entity> for Entity {
    fn to() -> RelationDef {
        super::recipe_ingredient::Relation::Ingredient.def()
    }
    fn via() -> Option<RelationDef> {
        Some(super::recipe_ingredient::Relation::Recipe.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// The price with exactly [`PRICE_SCALE`] decimal places.
    /// Some backends hand decimals back with a different scale (SQLite
    /// round-trips through REAL), so callers render prices through this.
    pub fn normalized_price(&self) -> Decimal {
        normalize_price(self.price)
    }
}

/// Rescale a price to [`PRICE_SCALE`] decimal places.
pub fn normalize_price(price: Decimal) -> Decimal {
    let mut price = price.round_dp_with_strategy(PRICE_SCALE, RoundingStrategy::MidpointAwayFromZero);
    price.rescale(PRICE_SCALE);
    price
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}
