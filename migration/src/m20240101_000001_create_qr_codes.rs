use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(QrCodes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(QrCodes::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(string(QrCodes::Title))
                    .col(string(QrCodes::Shop))
                    .col(string(QrCodes::ProductId))
                    .col(string(QrCodes::ProductHandle))
                    .col(string(QrCodes::ProductVariantId))
                    .col(string(QrCodes::Destination))
                    .col(
                        ColumnDef::new(QrCodes::Scans)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(big_integer(QrCodes::CreatedAt))
                    .to_owned(),
            )
            .await?;

        // List view filters by shop
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_qr_codes_shop")
                    .table(QrCodes::Table)
                    .col(QrCodes::Shop)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(QrCodes::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum QrCodes {
    Table,
    Id,
    Title,
    Shop,
    ProductId,
    ProductHandle,
    ProductVariantId,
    Destination,
    Scans,
    CreatedAt,
}
