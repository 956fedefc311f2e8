use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "qr_codes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = true)]
    pub id: i32,
    pub title: String,
    pub shop: String,
    pub product_id: String,
    pub product_handle: String,
    pub product_variant_id: String,
    pub destination: Destination,
    pub scans: i32,
    pub created_at: i64,
}

/// Where a scan sends the customer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum Destination {
    #[sea_orm(string_value = "product")]
    Product,
    #[sea_orm(string_value = "cart")]
    Cart,
}

impl Destination {
    pub fn as_str(&self) -> &'static str {
        match self {
            Destination::Product => "product",
            Destination::Cart => "cart",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "product" => Some(Destination::Product),
            "cart" => Some(Destination::Cart),
            _ => None,
        }
    }
}

impl std::fmt::Display for Destination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
