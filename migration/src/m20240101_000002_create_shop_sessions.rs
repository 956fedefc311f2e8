use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ShopSessions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ShopSessions::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(string(ShopSessions::Shop))
                    .col(string(ShopSessions::AccessToken))
                    .col(string_null(ShopSessions::Scope))
                    .col(big_integer(ShopSessions::CreatedAt))
                    .to_owned(),
            )
            .await?;

        // One offline session per shop
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_shop_sessions_shop")
                    .table(ShopSessions::Table)
                    .col(ShopSessions::Shop)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ShopSessions::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ShopSessions {
    Table,
    Id,
    Shop,
    AccessToken,
    Scope,
    CreatedAt,
}
