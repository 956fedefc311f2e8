use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum AppError {
    #[error("I/O error: {0}")]
    #[diagnostic(code(qrcodes::io))]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    #[diagnostic(code(qrcodes::config))]
    Config(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(qrcodes::serde))]
    Serde(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    #[diagnostic(code(qrcodes::db))]
    Db(#[from] sea_orm::DbErr),

    #[error("Product catalog error: {0}")]
    #[diagnostic(
        code(qrcodes::catalog),
        help("Check the shop's access token and the catalog.api_version setting")
    )]
    Catalog(String),

    #[error("QR image error: {0}")]
    #[diagnostic(code(qrcodes::image))]
    Image(String),

    #[error("Unauthorized")]
    #[diagnostic(code(qrcodes::unauthorized))]
    Unauthorized,

    #[error("Not found")]
    #[diagnostic(code(qrcodes::not_found))]
    NotFound,

    #[error("Bad request: {0}")]
    #[diagnostic(code(qrcodes::bad_request))]
    BadRequest(String),

    #[error("{0}")]
    #[diagnostic(code(qrcodes::other))]
    Other(String),
}

impl From<reqwest::Error> for AppError {
    fn from(value: reqwest::Error) -> Self {
        AppError::Catalog(value.to_string())
    }
}

impl From<qrcode::types::QrError> for AppError {
    fn from(value: qrcode::types::QrError) -> Self {
        AppError::Image(value.to_string())
    }
}

impl From<image::ImageError> for AppError {
    fn from(value: image::ImageError) -> Self {
        AppError::Image(value.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized"),
            AppError::NotFound => (StatusCode::NOT_FOUND, "Not found"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "Bad request"),
            _ => {
                tracing::error!(error = %self, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong")
            }
        };
        (status, Html(crate::views::error_page(status, message))).into_response()
    }
}
