//! HTTP endpoints: the embedded admin pages under `/app`, the public QR page
//! and the scan redirect encoded into every QR image.
use crate::catalog::{self, AdminApiClient, PickedProduct};
use crate::errors::AppError;
use crate::form::{self, FormIntent, QrCodeForm, ValidationErrors};
use crate::qr_codes;
use crate::session::{AuthenticatedShop, SessionCookie};
use crate::settings::Settings;
use crate::storage::{self, QrCode, ShopSession};
use crate::views::{self, FormView};
use axum::body::Body;
use axum::extract::{Form, Path, State};
use axum::http::{HeaderName, HeaderValue, Request, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::Router;
use miette::IntoDiagnostic;
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub db: DatabaseConnection,
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(settings: Settings, db: DatabaseConnection) -> Self {
        Self {
            settings: Arc::new(settings),
            db,
            http: reqwest::Client::new(),
        }
    }

    fn admin_graphql(&self, session: &ShopSession) -> AdminApiClient {
        AdminApiClient::for_session(self.http.clone(), &self.settings.catalog, session)
    }
}

// Security headers middleware
async fn security_headers(request: Request<Body>, next: Next) -> impl IntoResponse {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(
        HeaderName::from_static("x-content-type-options"),
        HeaderValue::from_static("nosniff"),
    );

    // The admin pages render inside the merchant dashboard, so framing is
    // limited to the dashboard origins instead of denied outright.
    headers.insert(
        HeaderName::from_static("content-security-policy"),
        HeaderValue::from_static("default-src 'self'; style-src 'self' 'unsafe-inline'; img-src 'self' data: https:; form-action 'self'; frame-ancestors 'self' https://admin.shopify.com https://*.myshopify.com"),
    );

    headers.insert(
        HeaderName::from_static("referrer-policy"),
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );

    response
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health))
        .route("/auth/login", get(login_page).post(login_submit))
        .route("/auth/logout", get(logout))
        .route("/app", get(list_qr_codes))
        .route(
            "/app/qrcodes/{id}",
            get(qr_code_form).post(qr_code_submit).delete(qr_code_delete),
        )
        .route("/qrcodes/{id}", get(public_qr_code))
        .route("/qrcodes/{id}/scan", get(scan_qr_code))
        .layer(middleware::from_fn(security_headers))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(settings: Settings, db: DatabaseConnection) -> miette::Result<()> {
    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port)
        .parse()
        .map_err(|e| miette::miette!("bad listen addr: {e}"))?;

    let state = AppState::new(settings, db);
    tracing::info!(app_url = %state.settings.app_url(), "Scan URLs use this base");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .into_diagnostic()?;
    tracing::info!(%addr, "QR code app listening");
    axum::serve(listener, router(state))
        .await
        .into_diagnostic()?;
    Ok(())
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

// ============================================================================
// Sign-in
// ============================================================================

#[derive(Debug, Deserialize)]
struct LoginForm {
    session: String,
}

async fn login_page() -> impl IntoResponse {
    Html(views::login_page(None))
}

async fn login_submit(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let token = form.session.trim();
    let Some(session) = storage::get_shop_session(&state.db, token).await? else {
        return Ok((
            StatusCode::UNAUTHORIZED,
            Html(views::login_page(Some("Unknown session token"))),
        )
            .into_response());
    };

    tracing::info!(shop = %session.shop, "Shop signed in");
    let cookie = SessionCookie::new(session.id);

    Ok(Response::builder()
        .status(StatusCode::SEE_OTHER)
        .header(
            axum::http::header::SET_COOKIE,
            cookie.to_cookie_header(&state.settings),
        )
        .header(axum::http::header::LOCATION, "/app")
        .body(Body::empty())
        .map_err(|e| AppError::Other(e.to_string()))?)
}

async fn logout() -> Result<Response, AppError> {
    Response::builder()
        .status(StatusCode::SEE_OTHER)
        .header(
            axum::http::header::SET_COOKIE,
            SessionCookie::delete_cookie_header(),
        )
        .header(axum::http::header::LOCATION, "/auth/login")
        .body(Body::empty())
        .map_err(|e| AppError::Other(e.to_string()))
}

// ============================================================================
// Admin pages
// ============================================================================

/// GET /app
async fn list_qr_codes(
    State(state): State<AppState>,
    AuthenticatedShop(session): AuthenticatedShop,
) -> Result<Html<String>, AppError> {
    let graphql = state.admin_graphql(&session);
    let qr_codes = qr_codes::get_qr_codes(
        &state.db,
        &graphql,
        &state.settings.app_url(),
        &session.shop,
    )
    .await?;

    Ok(Html(views::list_page(&qr_codes)))
}

/// `new` or a numeric record id.
#[derive(Clone, Copy)]
enum Target {
    New,
    Existing(i32),
}

impl Target {
    fn parse(raw: &str) -> Result<Self, AppError> {
        if raw == "new" {
            return Ok(Target::New);
        }
        raw.parse().map(Target::Existing).map_err(|_| AppError::NotFound)
    }

    fn path(&self) -> String {
        match self {
            Target::New => "/app/qrcodes/new".to_string(),
            Target::Existing(id) => format!("/app/qrcodes/{id}"),
        }
    }
}

/// Load a record for `shop`. Records of other shops look absent.
async fn owned_qr_code(
    db: &DatabaseConnection,
    shop: &str,
    id: i32,
) -> Result<QrCode, AppError> {
    match storage::get_qr_code(db, id).await? {
        Some(qr_code) if qr_code.shop == shop => Ok(qr_code),
        Some(_) => {
            tracing::warn!(id, shop, "Refused access to another shop's QR code");
            Err(AppError::NotFound)
        }
        None => Err(AppError::NotFound),
    }
}

/// GET /app/qrcodes/{id}
async fn qr_code_form(
    State(state): State<AppState>,
    AuthenticatedShop(session): AuthenticatedShop,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    let graphql = state.admin_graphql(&session);
    let products = catalog::list_products(&graphql, state.settings.catalog.picker_page_size).await?;

    let view = match Target::parse(&id)? {
        Target::New => FormView::new_qr_code(products),
        Target::Existing(id) => {
            let qr_code =
                qr_codes::get_qr_code(&state.db, &graphql, &state.settings.app_url(), id)
                    .await?
                    .ok_or(AppError::NotFound)?;
            if qr_code.qr_code.shop != session.shop {
                tracing::warn!(id, shop = %session.shop, "Refused access to another shop's QR code");
                return Err(AppError::NotFound);
            }
            FormView::existing(&qr_code, products)
        }
    };

    Ok(Html(views::form_page(&view)))
}

/// POST /app/qrcodes/{id}
async fn qr_code_submit(
    State(state): State<AppState>,
    AuthenticatedShop(session): AuthenticatedShop,
    Path(id): Path<String>,
    Form(mut form): Form<QrCodeForm>,
) -> Result<Response, AppError> {
    let target = Target::parse(&id)?;

    if form.intent == FormIntent::Delete {
        let Target::Existing(id) = target else {
            return Err(AppError::BadRequest("nothing to delete".to_string()));
        };
        return delete_owned(&state, &session, id).await;
    }

    let existing = match target {
        Target::New => None,
        Target::Existing(id) => Some(owned_qr_code(&state.db, &session.shop, id).await?),
    };

    // A new record always goes through validation
    if let Some(qr_code) = &existing {
        if form.state().is_some_and(|s| !s.is_dirty()) {
            tracing::debug!(id = qr_code.id, "Save without changes, nothing to write");
            return Ok(Redirect::to(&target.path()).into_response());
        }
        form.carry_product_details(qr_code);
    }

    let graphql = state.admin_graphql(&session);
    let mut errors = form::validate(&form).err().unwrap_or_default();
    let mut picked = None;

    if errors.is_empty() && form.needs_product_details() {
        let product_id = form.product_id.clone().unwrap_or_default();
        match catalog::find_product(&graphql, &product_id).await? {
            Some(product) => {
                form.apply_product(&product);
                picked = Some(product);
            }
            None => errors.insert("productId", "Product not found"),
        }
    }

    let result = if errors.is_empty() {
        form.clone().into_new_qr_code()
    } else {
        Err(errors)
    };

    let new_qr_code = match result {
        Ok(new_qr_code) => new_qr_code,
        Err(errors) => {
            tracing::debug!(errors = errors.len(), "QR code form rejected");
            let view = rejected_form_view(&state, &graphql, existing, &form, picked, errors).await?;
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, Html(views::form_page(&view))).into_response());
        }
    };

    let saved = match existing {
        None => storage::create_qr_code(&state.db, &session.shop, new_qr_code).await?,
        Some(qr_code) => storage::update_qr_code(&state.db, qr_code.id, new_qr_code).await?,
    };
    tracing::info!(id = saved.id, shop = %session.shop, "Saved QR code");

    Ok(Redirect::to(&format!("/app/qrcodes/{}", saved.id)).into_response())
}

/// Editor state for a submission that failed validation: the entered values,
/// the inline errors, and the preview of the stored record if there is one.
async fn rejected_form_view(
    state: &AppState,
    graphql: &AdminApiClient,
    existing: Option<QrCode>,
    form: &QrCodeForm,
    picked: Option<PickedProduct>,
    errors: ValidationErrors,
) -> Result<FormView, AppError> {
    let products = catalog::list_products(graphql, state.settings.catalog.picker_page_size).await?;

    let mut view = match existing {
        Some(qr_code) => {
            let supplemented =
                qr_codes::supplement_qr_code(qr_code, graphql, &state.settings.app_url()).await?;
            FormView::existing(&supplemented, products)
        }
        None => FormView::new_qr_code(products),
    };

    if let Some(edit) = form.state() {
        view.clean = edit.clean().clone();
    }
    view.current = form.current();

    let chosen = picked.or_else(|| {
        view.products
            .iter()
            .find(|p| p.id == view.current.product_id)
            .cloned()
    });
    if let Some(product) = chosen {
        view.product_title = Some(product.title);
        view.product_image = product.image;
        view.product_alt = product.alt;
    } else if view.current.product_id != view.clean.product_id {
        view.product_title = None;
        view.product_image = None;
        view.product_alt = None;
    }

    view.errors = errors;
    Ok(view)
}

/// DELETE /app/qrcodes/{id}
async fn qr_code_delete(
    State(state): State<AppState>,
    AuthenticatedShop(session): AuthenticatedShop,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    match Target::parse(&id)? {
        Target::New => Err(AppError::BadRequest("nothing to delete".to_string())),
        Target::Existing(id) => delete_owned(&state, &session, id).await,
    }
}

async fn delete_owned(
    state: &AppState,
    session: &ShopSession,
    id: i32,
) -> Result<Response, AppError> {
    owned_qr_code(&state.db, &session.shop, id).await?;
    storage::delete_qr_code(&state.db, id).await?;
    tracing::info!(id, shop = %session.shop, "Deleted QR code");

    Ok(Redirect::to("/app").into_response())
}

// ============================================================================
// Public endpoints
// ============================================================================

/// GET /qrcodes/{id}
async fn public_qr_code(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Html<String>, AppError> {
    let qr_code = storage::get_qr_code(&state.db, id)
        .await?
        .ok_or(AppError::NotFound)?;
    let image = qr_codes::qr_code_image(&state.settings.app_url(), qr_code.id)?;

    Ok(Html(views::public_page(&qr_code.title, &image)))
}

/// GET /qrcodes/{id}/scan
async fn scan_qr_code(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Redirect, AppError> {
    let qr_code = storage::increment_scans(&state.db, id)
        .await?
        .ok_or(AppError::NotFound)?;
    tracing::debug!(id, scans = qr_code.scans, "QR code scanned");

    Ok(Redirect::temporary(&qr_codes::destination_url(&qr_code)))
}
