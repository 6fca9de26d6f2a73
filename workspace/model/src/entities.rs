//! Root for all SeaORM entity modules of the recipe service.
//! Every tag, ingredient and recipe is owned by exactly one user; recipes
//! reference tags and ingredients through the two join tables.

pub mod ingredient;
pub mod recipe;
pub mod recipe_ingredient;
pub mod recipe_tag;
pub mod tag;
pub mod user;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::ingredient::Entity as Ingredient;
    pub use super::recipe::Entity as Recipe;
    pub use super::recipe_ingredient::Entity as RecipeIngredient;
    pub use super::recipe_tag::Entity as RecipeTag;
    pub use super::tag::Entity as Tag;
    pub use super::user::Entity as User;
}
