use super::db::TestDb;
use super::mock_catalog::{MockCatalog, MockProduct};
use qrcodes::settings::Settings;
use qrcodes::storage::ShopSession;
use qrcodes::web::{self, AppState};
use sea_orm::DatabaseConnection;

pub const APP_URL: &str = "https://qr.example.com";
pub const SHOP: &str = "demo.myshopify.com";

/// The full app served on an ephemeral port, backed by a temporary database
/// and a mock catalog. `client` is signed in as [`SHOP`].
pub struct TestApp {
    pub base_url: String,
    pub db: TestDb,
    pub catalog: MockCatalog,
    pub session: ShopSession,
    pub client: reqwest::Client,
}

impl TestApp {
    pub async fn spawn(products: Vec<MockProduct>) -> Self {
        let db = TestDb::new().await;
        let catalog = MockCatalog::start(products).await;

        let mut settings = Settings::default();
        settings.server.public_base_url = Some(APP_URL.to_string());
        settings.catalog.endpoint = Some(catalog.endpoint().to_string());

        let session = super::db::seed_shop_session(db.connection(), SHOP).await;
        let state = AppState::new(settings, db.connection().clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind app");
        let addr = listener.local_addr().expect("app addr");
        tokio::spawn(async move {
            axum::serve(listener, web::router(state))
                .await
                .expect("app server");
        });

        let client = Self::client_for(&session.id);

        Self {
            base_url: format!("http://{addr}"),
            db,
            catalog,
            session,
            client,
        }
    }

    /// Client that does not follow redirects and authenticates with `token`.
    pub fn client_for(token: &str) -> reqwest::Client {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::AUTHORIZATION,
            format!("Bearer {token}").parse().expect("header value"),
        );
        reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .default_headers(headers)
            .build()
            .expect("client")
    }

    /// Client without credentials.
    pub fn anonymous_client() -> reqwest::Client {
        reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("client")
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn conn(&self) -> &DatabaseConnection {
        self.db.connection()
    }
}
