//! Access to the platform's Admin GraphQL API: the product lookups used to
//! decorate QR codes and the product picker used by the form view.
use crate::errors::AppError;
use crate::settings::Catalog as CatalogCfg;
use crate::storage::ShopSession;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Capability to run a GraphQL query against a shop's Admin API.
#[async_trait]
pub trait AdminGraphql: Send + Sync {
    /// Runs `query` and returns the `data` object of the response.
    async fn query(&self, query: &str, variables: Value) -> Result<Value, AppError>;
}

pub const SUPPLEMENT_QUERY: &str = r#"
query supplementQRCode($id: ID!) {
  product(id: $id) {
    title
    images(first: 1) {
      nodes {
        altText
        url
      }
    }
  }
}
"#;

pub const PICKER_QUERY: &str = r#"
query pickerProducts($first: Int!) {
  products(first: $first) {
    nodes {
      id
      title
      handle
      images(first: 1) {
        nodes {
          altText
          url
        }
      }
      variants(first: 1) {
        nodes {
          id
        }
      }
    }
  }
}
"#;

pub const FIND_PRODUCT_QUERY: &str = r#"
query pickerProduct($id: ID!) {
  product(id: $id) {
    id
    title
    handle
    images(first: 1) {
      nodes {
        altText
        url
      }
    }
    variants(first: 1) {
      nodes {
        id
      }
    }
  }
}
"#;

/// HTTP client for `https://{shop}/admin/api/{version}/graphql.json`.
#[derive(Clone)]
pub struct AdminApiClient {
    http: reqwest::Client,
    endpoint: String,
    access_token: String,
}

impl AdminApiClient {
    pub fn new(http: reqwest::Client, endpoint: String, access_token: String) -> Self {
        Self {
            http,
            endpoint,
            access_token,
        }
    }

    pub fn for_session(http: reqwest::Client, cfg: &CatalogCfg, session: &ShopSession) -> Self {
        let endpoint = cfg.endpoint.clone().unwrap_or_else(|| {
            format!(
                "https://{}/admin/api/{}/graphql.json",
                session.shop, cfg.api_version
            )
        });
        Self::new(http, endpoint, session.access_token.clone())
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[derive(Debug, Deserialize)]
struct GraphqlResponse {
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    message: String,
}

#[async_trait]
impl AdminGraphql for AdminApiClient {
    async fn query(&self, query: &str, variables: Value) -> Result<Value, AppError> {
        let response = self
            .http
            .post(&self.endpoint)
            .header("X-Shopify-Access-Token", &self.access_token)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Catalog(format!(
                "{} answered {}",
                self.endpoint, status
            )));
        }

        let body: GraphqlResponse = response.json().await?;
        if !body.errors.is_empty() {
            let messages: Vec<String> = body.errors.into_iter().map(|e| e.message).collect();
            return Err(AppError::Catalog(messages.join("; ")));
        }

        body.data
            .ok_or_else(|| AppError::Catalog("response carried no data".to_string()))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductImage {
    pub alt_text: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Connection<T> {
    #[serde(default = "Vec::new")]
    pub nodes: Vec<T>,
}

/// Product fields needed to decorate a QR code.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductSummary {
    pub title: Option<String>,
    #[serde(default)]
    pub images: Option<Connection<ProductImage>>,
}

impl ProductSummary {
    pub fn first_image(&self) -> Option<&ProductImage> {
        self.images.as_ref().and_then(|c| c.nodes.first())
    }
}

#[derive(Debug, Deserialize)]
struct ProductData<T> {
    product: Option<T>,
}

/// Fetch title and first image of a product. `None` when the API no longer
/// knows the product.
pub async fn product_summary(
    graphql: &dyn AdminGraphql,
    product_id: &str,
) -> Result<Option<ProductSummary>, AppError> {
    let data = graphql
        .query(SUPPLEMENT_QUERY, json!({ "id": product_id }))
        .await?;
    let data: ProductData<ProductSummary> = serde_json::from_value(data)?;
    Ok(data.product)
}

#[derive(Debug, Deserialize)]
struct VariantNode {
    id: String,
}

#[derive(Debug, Deserialize)]
struct PickerNode {
    id: String,
    title: String,
    handle: String,
    #[serde(default)]
    images: Option<Connection<ProductImage>>,
    #[serde(default)]
    variants: Option<Connection<VariantNode>>,
}

#[derive(Debug, Deserialize)]
struct ProductsData {
    products: Connection<PickerNode>,
}

/// A product as chosen in the picker, with everything a QR code record
/// stores about it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickedProduct {
    pub id: String,
    pub variant_id: String,
    pub handle: String,
    pub title: String,
    pub image: Option<String>,
    pub alt: Option<String>,
}

impl PickerNode {
    fn into_picked(self) -> Option<PickedProduct> {
        // Products without variants cannot be added to a cart
        let variant_id = self.variants?.nodes.into_iter().next()?.id;
        let image = self.images.and_then(|c| c.nodes.into_iter().next());
        Some(PickedProduct {
            id: self.id,
            variant_id,
            handle: self.handle,
            title: self.title,
            image: image.as_ref().and_then(|i| i.url.clone()),
            alt: image.and_then(|i| i.alt_text),
        })
    }
}

pub async fn list_products(
    graphql: &dyn AdminGraphql,
    first: u32,
) -> Result<Vec<PickedProduct>, AppError> {
    let data = graphql
        .query(PICKER_QUERY, json!({ "first": first }))
        .await?;
    let data: ProductsData = serde_json::from_value(data)?;

    Ok(data
        .products
        .nodes
        .into_iter()
        .filter_map(PickerNode::into_picked)
        .collect())
}

pub async fn find_product(
    graphql: &dyn AdminGraphql,
    product_id: &str,
) -> Result<Option<PickedProduct>, AppError> {
    let data = graphql
        .query(FIND_PRODUCT_QUERY, json!({ "id": product_id }))
        .await?;
    let data: ProductData<PickerNode> = serde_json::from_value(data)?;
    Ok(data.product.and_then(PickerNode::into_picked))
}
