use crate::errors::AppError;
use crate::settings::Settings;
use crate::storage::{self, ShopSession};
use crate::web::AppState;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;

pub const SESSION_COOKIE_NAME: &str = "qrcodes_session";

#[derive(Clone, Debug)]
pub struct SessionCookie {
    pub session_id: String,
}

impl SessionCookie {
    pub fn new(session_id: String) -> Self {
        Self { session_id }
    }

    /// Reads the session id from our cookie, falling back to a bearer token
    /// as sent by embedded admin frames.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        if let Some(cookie_header) = headers
            .get(axum::http::header::COOKIE)
            .and_then(|h| h.to_str().ok())
        {
            for cookie in cookie_header.split(';') {
                let cookie = cookie.trim();
                if let Some(value) = cookie
                    .strip_prefix(SESSION_COOKIE_NAME)
                    .and_then(|s| s.strip_prefix('='))
                {
                    return Some(Self::new(value.to_string()));
                }
            }
        }

        headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.strip_prefix("Bearer "))
            .map(|token| Self::new(token.trim().to_string()))
    }

    pub fn to_cookie_header(&self, settings: &Settings) -> String {
        let secure = settings.app_url().starts_with("https://");
        let max_age = 60 * 60 * 24 * 30;

        format!(
            "{}={}; HttpOnly; {}SameSite=Lax; Path=/; Max-Age={}",
            SESSION_COOKIE_NAME,
            self.session_id,
            if secure { "Secure; " } else { "" },
            max_age
        )
    }

    pub fn delete_cookie_header() -> String {
        format!(
            "{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0",
            SESSION_COOKIE_NAME
        )
    }
}

/// The shop on whose behalf an admin request runs.
#[derive(Clone, Debug)]
pub struct AuthenticatedShop(pub ShopSession);

impl FromRequestParts<AppState> for AuthenticatedShop {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let cookie = SessionCookie::from_headers(&parts.headers).ok_or(AppError::Unauthorized)?;

        match storage::get_shop_session(&state.db, &cookie.session_id).await? {
            Some(session) => Ok(Self(session)),
            None => {
                tracing::debug!("Rejected unknown shop session");
                Err(AppError::Unauthorized)
            }
        }
    }
}
