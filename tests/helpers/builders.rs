use qrcodes::entities::qr_code::Destination;
use qrcodes::storage::{self, NewQrCode, QrCode, ShopSession};
use sea_orm::DatabaseConnection;

/// Builder for creating test QR codes
pub struct QrCodeBuilder {
    shop: String,
    title: String,
    product_id: String,
    product_handle: String,
    product_variant_id: String,
    destination: Destination,
}

impl QrCodeBuilder {
    pub fn new(shop: &str) -> Self {
        Self {
            shop: shop.to_string(),
            title: "Test QR code".to_string(),
            product_id: "gid://shopify/Product/1".to_string(),
            product_handle: "snowboard".to_string(),
            product_variant_id: "gid://shopify/ProductVariant/11".to_string(),
            destination: Destination::Product,
        }
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    pub fn with_product(mut self, product_id: &str, variant_id: &str, handle: &str) -> Self {
        self.product_id = product_id.to_string();
        self.product_variant_id = variant_id.to_string();
        self.product_handle = handle.to_string();
        self
    }

    pub fn to_cart(mut self) -> Self {
        self.destination = Destination::Cart;
        self
    }

    pub async fn create(self, db: &DatabaseConnection) -> QrCode {
        storage::create_qr_code(
            db,
            &self.shop,
            NewQrCode {
                title: self.title,
                product_id: self.product_id,
                product_handle: self.product_handle,
                product_variant_id: self.product_variant_id,
                destination: self.destination,
            },
        )
        .await
        .expect("Failed to create test QR code")
    }
}

/// Builder for creating test shop sessions
pub struct SessionBuilder {
    shop: String,
    access_token: String,
    scope: Option<String>,
}

impl SessionBuilder {
    pub fn new(shop: &str) -> Self {
        Self {
            shop: shop.to_string(),
            access_token: "shpat_test".to_string(),
            scope: Some("read_products".to_string()),
        }
    }

    pub fn with_access_token(mut self, token: &str) -> Self {
        self.access_token = token.to_string();
        self
    }

    pub async fn create(self, db: &DatabaseConnection) -> ShopSession {
        storage::create_shop_session(db, &self.shop, &self.access_token, self.scope)
            .await
            .expect("Failed to create test shop session")
    }
}
