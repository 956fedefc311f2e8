pub use sea_orm_migration::prelude::*;

mod m20240101_000001_create_qr_codes;
mod m20240101_000002_create_shop_sessions;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_qr_codes::Migration),
            Box::new(m20240101_000002_create_shop_sessions::Migration),
        ]
    }
}
