use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create users table
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(pk_auto(Users::Id))
                    .col(string(Users::Email).unique_key())
                    .col(string(Users::Name).default(""))
                    .col(string(Users::PasswordHash))
                    .col(boolean(Users::IsActive).default(true))
                    .col(boolean(Users::IsStaff).default(false))
                    .col(boolean(Users::IsSuperuser).default(false))
                    .to_owned(),
            )
            .await?;

        // Create tags table
        manager
            .create_table(
                Table::create()
                    .table(Tags::Table)
                    .if_not_exists()
                    .col(pk_auto(Tags::Id))
                    .col(string(Tags::Name))
                    .col(integer(Tags::UserId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tag_user")
                            .from(Tags::Table, Tags::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create ingredients table
        manager
            .create_table(
                Table::create()
                    .table(Ingredients::Table)
                    .if_not_exists()
                    .col(pk_auto(Ingredients::Id))
                    .col(string(Ingredients::Name))
                    .col(integer(Ingredients::UserId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ingredient_user")
                            .from(Ingredients::Table, Ingredients::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create recipes table
        manager
            .create_table(
                Table::create()
                    .table(Recipes::Table)
                    .if_not_exists()
                    .col(pk_auto(Recipes::Id))
                    .col(string(Recipes::Title))
                    .col(integer(Recipes::TimeMinutes))
                    .col(decimal(Recipes::Price).decimal_len(5, 2))
                    .col(string_null(Recipes::Image))
                    .col(integer(Recipes::UserId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_recipe_user")
                            .from(Recipes::Table, Recipes::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create recipes_tags table (join table)
        manager
            .create_table(
                Table::create()
                    .table(RecipesTags::Table)
                    .if_not_exists()
                    .col(integer(RecipesTags::RecipeId))
                    .col(integer(RecipesTags::TagId))
                    .primary_key(
                        Index::create()
                            .name("pk_recipes_tags")
                            .col(RecipesTags::RecipeId)
                            .col(RecipesTags::TagId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_recipes_tags_recipe")
                            .from(RecipesTags::Table, RecipesTags::RecipeId)
                            .to(Recipes::Table, Recipes::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_recipes_tags_tag")
                            .from(RecipesTags::Table, RecipesTags::TagId)
                            .to(Tags::Table, Tags::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create recipes_ingredients table (join table)
        manager
            .create_table(
                Table::create()
                    .table(RecipesIngredients::Table)
                    .if_not_exists()
                    .col(integer(RecipesIngredients::RecipeId))
                    .col(integer(RecipesIngredients::IngredientId))
                    .primary_key(
                        Index::create()
                            .name("pk_recipes_ingredients")
                            .col(RecipesIngredients::RecipeId)
                            .col(RecipesIngredients::IngredientId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_recipes_ingredients_recipe")
                            .from(RecipesIngredients::Table, RecipesIngredients::RecipeId)
                            .to(Recipes::Table, Recipes::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_recipes_ingredients_ingredient")
                            .from(RecipesIngredients::Table, RecipesIngredients::IngredientId)
                            .to(Ingredients::Table, Ingredients::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Join tables go first so the foreign keys never dangle
        manager
            .drop_table(Table::drop().table(RecipesIngredients::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(RecipesTags::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Recipes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Ingredients::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Tags::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Email,
    Name,
    PasswordHash,
    IsActive,
    IsStaff,
    IsSuperuser,
}

#[derive(DeriveIden)]
enum Tags {
    Table,
    Id,
    Name,
    UserId,
}

#[derive(DeriveIden)]
enum Ingredients {
    Table,
    Id,
    Name,
    UserId,
}

#[derive(DeriveIden)]
enum Recipes {
    Table,
    Id,
    Title,
    TimeMinutes,
    Price,
    Image,
    UserId,
}

#[derive(DeriveIden)]
enum RecipesTags {
    Table,
    RecipeId,
    TagId,
}

#[derive(DeriveIden)]
enum RecipesIngredients {
    Table,
    RecipeId,
    IngredientId,
}
