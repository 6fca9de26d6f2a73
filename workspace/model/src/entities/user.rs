use sea_orm::entity::prelude::*;

/// An account of the recipe service, identified by its normalized email.
/// Rows are created through [`crate::users::UserManager`], which takes care
/// of email normalization and password hashing.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub email: String,
    pub name: String,
    /// bcrypt hash of the password, never the plaintext.
    pub password_hash: String,
    #[sea_orm(default_value = "true")]
    pub is_active: bool,
    #[sea_orm(default_value = "false")]
    pub is_staff: bool,
    #[sea_orm(default_value = "false")]
    pub is_superuser: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::tag::Entity")]
    Tag,
    #[sea_orm(has_many = "super::ingredient::Entity")]
    Ingredient,
    #[sea_orm(has_many = "super::recipe::Entity")]
    Recipe,
}

impl Related<super::tag::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tag.def()
    }
}

impl Related<super::ingredient::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Ingredient.def()
    }
}

impl Related<super::recipe::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Recipe.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Verify a plaintext password against the stored hash.
    /// A malformed hash counts as a mismatch.
    pub fn check_password(&self, password: &str) -> bool {
        bcrypt::verify(password, &self.password_hash).unwrap_or(false)
    }
}
