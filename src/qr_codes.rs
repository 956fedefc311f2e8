//! QR code model: destination resolution, image generation and decoration
//! of stored records with live product data.
use crate::catalog::{self, AdminGraphql};
use crate::entities::qr_code::Destination;
use crate::errors::AppError;
use crate::storage::{self, QrCode};
use base64ct::{Base64, Encoding};
use futures::future::try_join_all;
use image::{ImageFormat, Luma};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::io::Cursor;

const VARIANT_GID_MARKER: &str = "/ProductVariant/";

/// A stored QR code plus the product data and derived URLs shown in the UI.
#[derive(Debug, Clone, Serialize)]
pub struct SupplementedQrCode {
    #[serde(flatten)]
    pub qr_code: QrCode,
    pub product_deleted: bool,
    pub product_title: Option<String>,
    pub product_image: Option<String>,
    pub product_alt: Option<String>,
    pub destination_url: String,
    pub image: String,
}

/// Where a scan of this record should land.
pub fn destination_url(qr_code: &QrCode) -> String {
    match qr_code.destination {
        Destination::Product => format!(
            "https://{}/products/{}",
            qr_code.shop, qr_code.product_handle
        ),
        Destination::Cart => {
            let variant = variant_numeric_id(&qr_code.product_variant_id).unwrap_or_else(|| {
                tracing::warn!(
                    id = qr_code.id,
                    variant = %qr_code.product_variant_id,
                    "product variant id is not a ProductVariant gid, using it verbatim"
                );
                &qr_code.product_variant_id
            });
            format!("https://{}/cart/{}:1", qr_code.shop, variant)
        }
    }
}

/// `gid://<namespace>/ProductVariant/<digits>` -> `<digits>`
fn variant_numeric_id(gid: &str) -> Option<&str> {
    let rest = gid.strip_prefix("gid://")?;
    let (namespace, digits) = rest.split_once(VARIANT_GID_MARKER)?;
    if namespace.is_empty() || namespace.contains('/') {
        return None;
    }
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(digits)
}

/// The URL encoded into a record's QR image.
pub fn scan_url(app_url: &str, id: i32) -> String {
    format!("{}/qrcodes/{}/scan", app_url.trim_end_matches('/'), id)
}

/// Encode the scan URL of `id` as a PNG data URI.
pub fn qr_code_image(app_url: &str, id: i32) -> Result<String, AppError> {
    let code = qrcode::QrCode::new(scan_url(app_url, id).as_bytes())?;
    let bitmap = code.render::<Luma<u8>>().build();

    let mut png = Cursor::new(Vec::new());
    bitmap.write_to(&mut png, ImageFormat::Png)?;

    Ok(format!(
        "data:image/png;base64,{}",
        Base64::encode_string(png.get_ref())
    ))
}

/// Decorate one record with its product's title and image.
pub async fn supplement_qr_code(
    qr_code: QrCode,
    graphql: &dyn AdminGraphql,
    app_url: &str,
) -> Result<SupplementedQrCode, AppError> {
    let product = catalog::product_summary(graphql, &qr_code.product_id)
        .await?
        .unwrap_or_default();
    let first_image = product.first_image().cloned().unwrap_or_default();

    Ok(SupplementedQrCode {
        product_deleted: product.title.as_deref().map_or(true, str::is_empty),
        product_title: product.title,
        product_image: first_image.url,
        product_alt: first_image.alt_text,
        destination_url: destination_url(&qr_code),
        image: qr_code_image(app_url, qr_code.id)?,
        qr_code,
    })
}

/// Fetch and decorate a single record. The lookup is by id only; callers
/// serving a shop must check `qr_code.shop` themselves.
pub async fn get_qr_code(
    db: &DatabaseConnection,
    graphql: &dyn AdminGraphql,
    app_url: &str,
    id: i32,
) -> Result<Option<SupplementedQrCode>, AppError> {
    let Some(qr_code) = storage::get_qr_code(db, id).await? else {
        return Ok(None);
    };

    Ok(Some(supplement_qr_code(qr_code, graphql, app_url).await?))
}

/// Fetch and decorate every record of `shop`, newest first. Product lookups
/// run concurrently; the first failure fails the whole listing.
pub async fn get_qr_codes(
    db: &DatabaseConnection,
    graphql: &dyn AdminGraphql,
    app_url: &str,
    shop: &str,
) -> Result<Vec<SupplementedQrCode>, AppError> {
    let qr_codes = storage::list_qr_codes(db, shop).await?;
    if qr_codes.is_empty() {
        return Ok(Vec::new());
    }

    tracing::debug!(shop, count = qr_codes.len(), "Supplementing QR codes");
    try_join_all(
        qr_codes
            .into_iter()
            .map(|qr_code| supplement_qr_code(qr_code, graphql, app_url)),
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn record(destination: Destination, variant: &str) -> QrCode {
        QrCode {
            id: 7,
            title: "Winter".to_string(),
            shop: "demo.myshopify.com".to_string(),
            product_id: "gid://shopify/Product/1".to_string(),
            product_handle: "snowboard".to_string(),
            product_variant_id: variant.to_string(),
            destination,
            scans: 0,
            created_at: 0,
        }
    }

    struct CountingGraphql {
        data: Value,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl AdminGraphql for CountingGraphql {
        async fn query(&self, _query: &str, _variables: Value) -> Result<Value, AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.data.clone())
        }
    }

    #[test]
    fn test_product_destination() {
        let qr = record(Destination::Product, "gid://shopify/ProductVariant/123");
        assert_eq!(
            destination_url(&qr),
            "https://demo.myshopify.com/products/snowboard"
        );
    }

    #[test]
    fn test_cart_destination_strips_gid() {
        let qr = record(Destination::Cart, "gid://shopify/ProductVariant/123");
        assert_eq!(destination_url(&qr), "https://demo.myshopify.com/cart/123:1");
    }

    #[test]
    fn test_cart_destination_other_namespace() {
        let qr = record(Destination::Cart, "gid://acme/ProductVariant/42");
        assert_eq!(destination_url(&qr), "https://demo.myshopify.com/cart/42:1");
    }

    #[test]
    fn test_cart_destination_malformed_variant_passes_through() {
        let qr = record(Destination::Cart, "variant-abc");
        assert_eq!(
            destination_url(&qr),
            "https://demo.myshopify.com/cart/variant-abc:1"
        );

        let qr = record(Destination::Cart, "gid://shopify/ProductVariant/12x");
        assert_eq!(
            destination_url(&qr),
            "https://demo.myshopify.com/cart/gid://shopify/ProductVariant/12x:1"
        );
    }

    #[test]
    fn test_scan_url() {
        assert_eq!(
            scan_url("https://qr.example.com/", 5),
            "https://qr.example.com/qrcodes/5/scan"
        );
        assert_eq!(
            scan_url("http://localhost:8080", 12),
            "http://localhost:8080/qrcodes/12/scan"
        );
    }

    #[test]
    fn test_qr_code_image_is_deterministic_png() {
        let first = qr_code_image("https://qr.example.com", 1).unwrap();
        let again = qr_code_image("https://qr.example.com", 1).unwrap();
        let other = qr_code_image("https://qr.example.com", 2).unwrap();

        assert!(first.starts_with("data:image/png;base64,"));
        assert_eq!(first, again);
        assert_ne!(first, other);

        let payload = first.trim_start_matches("data:image/png;base64,");
        let bytes = Base64::decode_vec(payload).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[tokio::test]
    async fn test_supplement_with_live_product() {
        let graphql = CountingGraphql {
            data: json!({
                "product": {
                    "title": "Snowboard",
                    "images": { "nodes": [{ "altText": "Board", "url": "https://cdn/b.png" }] }
                }
            }),
            calls: AtomicUsize::new(0),
        };

        let qr = record(Destination::Product, "gid://shopify/ProductVariant/123");
        let supplemented = supplement_qr_code(qr.clone(), &graphql, "https://qr.example.com")
            .await
            .unwrap();

        assert!(!supplemented.product_deleted);
        assert_eq!(supplemented.product_title.as_deref(), Some("Snowboard"));
        assert_eq!(supplemented.product_image.as_deref(), Some("https://cdn/b.png"));
        assert_eq!(supplemented.product_alt.as_deref(), Some("Board"));
        assert_eq!(
            supplemented.destination_url,
            "https://demo.myshopify.com/products/snowboard"
        );
        assert_eq!(
            supplemented.image,
            qr_code_image("https://qr.example.com", qr.id).unwrap()
        );
        assert_eq!(supplemented.qr_code, qr);
    }

    #[tokio::test]
    async fn test_supplement_with_deleted_product() {
        for data in [json!({ "product": { "images": { "nodes": [] } } }), json!({ "product": null })] {
            let graphql = CountingGraphql {
                data,
                calls: AtomicUsize::new(0),
            };
            let qr = record(Destination::Product, "gid://shopify/ProductVariant/123");
            let supplemented = supplement_qr_code(qr, &graphql, "https://qr.example.com")
                .await
                .unwrap();

            assert!(supplemented.product_deleted);
            assert!(supplemented.product_title.is_none());
            assert!(supplemented.product_image.is_none());
        }
    }

    #[test]
    fn test_supplemented_serializes_flat() {
        let supplemented = SupplementedQrCode {
            qr_code: record(Destination::Cart, "gid://shopify/ProductVariant/1"),
            product_deleted: false,
            product_title: Some("Snowboard".to_string()),
            product_image: None,
            product_alt: None,
            destination_url: "https://demo.myshopify.com/cart/1:1".to_string(),
            image: "data:image/png;base64,".to_string(),
        };

        let value = serde_json::to_value(&supplemented).unwrap();
        assert_eq!(value["title"], "Winter");
        assert_eq!(value["destination"], "cart");
        assert_eq!(value["product_title"], "Snowboard");
    }
}
