//! In-process stand-in for a shop's Admin GraphQL API.
use async_graphql::{Context, EmptyMutation, EmptySubscription, Object, Schema, SimpleObject, ID};
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::post;
use axum::Router;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// A product the mock catalog knows about.
#[derive(Clone, Debug)]
pub struct MockProduct {
    pub id: String,
    pub title: String,
    pub handle: String,
    pub image_url: Option<String>,
    pub image_alt: Option<String>,
    pub variant_id: Option<String>,
}

impl MockProduct {
    pub fn new(numeric_id: u32, title: &str, handle: &str) -> Self {
        Self {
            id: format!("gid://shopify/Product/{numeric_id}"),
            title: title.to_string(),
            handle: handle.to_string(),
            image_url: Some(format!("https://cdn.example.com/{handle}.png")),
            image_alt: Some(format!("{title} photo")),
            variant_id: Some(format!("gid://shopify/ProductVariant/{numeric_id}1")),
        }
    }

    pub fn without_image(mut self) -> Self {
        self.image_url = None;
        self.image_alt = None;
        self
    }
}

#[derive(Default)]
struct CatalogState {
    products: Mutex<Vec<MockProduct>>,
    product_lookups: AtomicUsize,
    fail: AtomicBool,
    tokens: Mutex<Vec<String>>,
}

#[derive(SimpleObject)]
struct Image {
    alt_text: Option<String>,
    url: String,
}

#[derive(SimpleObject)]
struct ImageConnection {
    nodes: Vec<Image>,
}

#[derive(SimpleObject)]
struct Variant {
    id: ID,
}

#[derive(SimpleObject)]
struct VariantConnection {
    nodes: Vec<Variant>,
}

struct Product(MockProduct);

#[Object]
impl Product {
    async fn id(&self) -> ID {
        ID(self.0.id.clone())
    }

    async fn title(&self) -> String {
        self.0.title.clone()
    }

    async fn handle(&self) -> String {
        self.0.handle.clone()
    }

    async fn images(&self, first: i32) -> ImageConnection {
        let nodes = self
            .0
            .image_url
            .iter()
            .take(first.max(0) as usize)
            .map(|url| Image {
                alt_text: self.0.image_alt.clone(),
                url: url.clone(),
            })
            .collect();
        ImageConnection { nodes }
    }

    async fn variants(&self, first: i32) -> VariantConnection {
        let nodes = self
            .0
            .variant_id
            .iter()
            .take(first.max(0) as usize)
            .map(|id| Variant { id: ID(id.clone()) })
            .collect();
        VariantConnection { nodes }
    }
}

#[derive(SimpleObject)]
struct ProductConnection {
    nodes: Vec<Product>,
}

struct QueryRoot;

#[Object]
impl QueryRoot {
    async fn product(&self, ctx: &Context<'_>, id: ID) -> async_graphql::Result<Option<Product>> {
        let state = ctx.data_unchecked::<Arc<CatalogState>>();
        state.product_lookups.fetch_add(1, Ordering::SeqCst);
        if state.fail.load(Ordering::SeqCst) {
            return Err("Throttled".into());
        }

        let products = state.products.lock().unwrap();
        Ok(products
            .iter()
            .find(|p| p.id == id.as_str())
            .cloned()
            .map(Product))
    }

    async fn products(&self, ctx: &Context<'_>, first: i32) -> async_graphql::Result<ProductConnection> {
        let state = ctx.data_unchecked::<Arc<CatalogState>>();
        if state.fail.load(Ordering::SeqCst) {
            return Err("Throttled".into());
        }

        let products = state.products.lock().unwrap();
        let nodes = products
            .iter()
            .take(first.max(0) as usize)
            .cloned()
            .map(Product)
            .collect();
        Ok(ProductConnection { nodes })
    }
}

type CatalogSchema = Schema<QueryRoot, EmptyMutation, EmptySubscription>;

#[derive(Clone)]
struct ServerState {
    schema: CatalogSchema,
    catalog: Arc<CatalogState>,
}

async fn graphql_handler(
    State(state): State<ServerState>,
    headers: HeaderMap,
    req: GraphQLRequest,
) -> GraphQLResponse {
    if let Some(token) = headers
        .get("X-Shopify-Access-Token")
        .and_then(|h| h.to_str().ok())
    {
        state.catalog.tokens.lock().unwrap().push(token.to_string());
    }
    state.schema.execute(req.into_inner()).await.into()
}

/// Running mock catalog. The server lives as long as the test runtime.
pub struct MockCatalog {
    endpoint: String,
    state: Arc<CatalogState>,
}

impl MockCatalog {
    pub async fn start(products: Vec<MockProduct>) -> Self {
        let state = Arc::new(CatalogState {
            products: Mutex::new(products),
            ..CatalogState::default()
        });

        let schema = Schema::build(QueryRoot, EmptyMutation, EmptySubscription)
            .data(state.clone())
            .finish();

        let app = Router::new()
            .route("/graphql", post(graphql_handler))
            .with_state(ServerState {
                schema,
                catalog: state.clone(),
            });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock catalog");
        let addr = listener.local_addr().expect("mock catalog addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("mock catalog server");
        });

        Self {
            endpoint: format!("http://{addr}/graphql"),
            state,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Number of `product(id:)` resolutions served so far.
    pub fn product_lookups(&self) -> usize {
        self.state.product_lookups.load(Ordering::SeqCst)
    }

    /// Access tokens seen on incoming requests.
    pub fn tokens(&self) -> Vec<String> {
        self.state.tokens.lock().unwrap().clone()
    }

    /// Remove a product, as if the merchant deleted it.
    pub fn remove_product(&self, id: &str) {
        self.state.products.lock().unwrap().retain(|p| p.id != id);
    }

    /// Make every subsequent query answer with a GraphQL error.
    pub fn fail_queries(&self) {
        self.state.fail.store(true, Ordering::SeqCst);
    }
}
