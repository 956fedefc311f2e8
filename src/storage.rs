use crate::entities;
use crate::entities::qr_code::Destination;
use crate::errors::AppError;
use crate::settings::Database as DbCfg;
use base64ct::Encoding;
use chrono::Utc;
use rand::RngCore;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Database, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QrCode {
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

/// Writable fields of a QR code. `shop`, `scans` and `created_at` are owned
/// by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewQrCode {
    pub title: String,
    pub product_id: String,
    pub product_handle: String,
    pub product_variant_id: String,
    pub destination: Destination,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopSession {
    pub id: String,
    pub shop: String,
    pub access_token: String,
    pub scope: Option<String>,
    pub created_at: i64,
}

impl From<entities::qr_code::Model> for QrCode {
    fn from(model: entities::qr_code::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            shop: model.shop,
            product_id: model.product_id,
            product_handle: model.product_handle,
            product_variant_id: model.product_variant_id,
            destination: model.destination,
            scans: model.scans,
            created_at: model.created_at,
        }
    }
}

impl From<entities::shop_session::Model> for ShopSession {
    fn from(model: entities::shop_session::Model) -> Self {
        Self {
            id: model.id,
            shop: model.shop,
            access_token: model.access_token,
            scope: model.scope,
            created_at: model.created_at,
        }
    }
}

pub async fn init(cfg: &DbCfg) -> Result<DatabaseConnection, AppError> {
    let db = Database::connect(&cfg.url).await?;
    Ok(db)
}

// QR code records

pub async fn get_qr_code(db: &DatabaseConnection, id: i32) -> Result<Option<QrCode>, AppError> {
    use entities::qr_code::Entity;

    Ok(Entity::find_by_id(id).one(db).await?.map(QrCode::from))
}

pub async fn list_qr_codes(db: &DatabaseConnection, shop: &str) -> Result<Vec<QrCode>, AppError> {
    use entities::qr_code::{Column, Entity};

    let models = Entity::find()
        .filter(Column::Shop.eq(shop))
        .order_by_desc(Column::Id)
        .all(db)
        .await?;

    Ok(models.into_iter().map(QrCode::from).collect())
}

pub async fn create_qr_code(
    db: &DatabaseConnection,
    shop: &str,
    input: NewQrCode,
) -> Result<QrCode, AppError> {
    let qr_code = entities::qr_code::ActiveModel {
        title: Set(input.title),
        shop: Set(shop.to_string()),
        product_id: Set(input.product_id),
        product_handle: Set(input.product_handle),
        product_variant_id: Set(input.product_variant_id),
        destination: Set(input.destination),
        scans: Set(0),
        created_at: Set(Utc::now().timestamp()),
        ..Default::default()
    };

    let model = qr_code.insert(db).await?;
    tracing::debug!(id = model.id, shop, "Created QR code");

    Ok(model.into())
}

/// Overwrites the writable fields of an existing record. A missing id is a
/// store error, not an absence.
pub async fn update_qr_code(
    db: &DatabaseConnection,
    id: i32,
    input: NewQrCode,
) -> Result<QrCode, AppError> {
    let qr_code = entities::qr_code::ActiveModel {
        id: Set(id),
        title: Set(input.title),
        product_id: Set(input.product_id),
        product_handle: Set(input.product_handle),
        product_variant_id: Set(input.product_variant_id),
        destination: Set(input.destination),
        ..Default::default()
    };

    let model = qr_code.update(db).await?;
    Ok(model.into())
}

pub async fn delete_qr_code(db: &DatabaseConnection, id: i32) -> Result<(), AppError> {
    use entities::qr_code::Entity;

    let result = Entity::delete_by_id(id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(DbErr::RecordNotFound(format!("qr_codes.id = {}", id)).into());
    }

    Ok(())
}

/// Counts a scan. Returns the updated record, or `None` when the id is unknown.
pub async fn increment_scans(
    db: &DatabaseConnection,
    id: i32,
) -> Result<Option<QrCode>, AppError> {
    use entities::qr_code::{Column, Entity};

    let result = Entity::update_many()
        .col_expr(Column::Scans, Expr::col(Column::Scans).add(1))
        .filter(Column::Id.eq(id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Ok(None);
    }

    get_qr_code(db, id).await
}

// Shop sessions

fn random_id() -> String {
    let mut bytes = [0u8; 24];
    rand::thread_rng().fill_bytes(&mut bytes);
    base64ct::Base64UrlUnpadded::encode_string(&bytes)
}

pub async fn create_shop_session(
    db: &DatabaseConnection,
    shop: &str,
    access_token: &str,
    scope: Option<String>,
) -> Result<ShopSession, AppError> {
    let id = random_id();
    let created_at = Utc::now().timestamp();

    let session = entities::shop_session::ActiveModel {
        id: Set(id.clone()),
        shop: Set(shop.to_string()),
        access_token: Set(access_token.to_string()),
        scope: Set(scope.clone()),
        created_at: Set(created_at),
    };

    session.insert(db).await?;

    Ok(ShopSession {
        id,
        shop: shop.to_string(),
        access_token: access_token.to_string(),
        scope,
        created_at,
    })
}

pub async fn get_shop_session(
    db: &DatabaseConnection,
    id: &str,
) -> Result<Option<ShopSession>, AppError> {
    use entities::shop_session::Entity;

    Ok(Entity::find_by_id(id.to_string())
        .one(db)
        .await?
        .map(ShopSession::from))
}

pub async fn get_shop_session_by_shop(
    db: &DatabaseConnection,
    shop: &str,
) -> Result<Option<ShopSession>, AppError> {
    use entities::shop_session::{Column, Entity};

    Ok(Entity::find()
        .filter(Column::Shop.eq(shop))
        .one(db)
        .await?
        .map(ShopSession::from))
}

/// Replace the access token and scope of a shop's session.
pub async fn update_shop_session(
    db: &DatabaseConnection,
    id: &str,
    access_token: &str,
    scope: Option<String>,
) -> Result<(), AppError> {
    let session = entities::shop_session::ActiveModel {
        id: Set(id.to_string()),
        access_token: Set(access_token.to_string()),
        scope: Set(scope),
        ..Default::default()
    };

    session.update(db).await?;
    Ok(())
}

pub async fn delete_shop_session(db: &DatabaseConnection, id: &str) -> Result<(), AppError> {
    use entities::shop_session::{Column, Entity};

    Entity::delete_many()
        .filter(Column::Id.eq(id))
        .exec(db)
        .await?;

    Ok(())
}
