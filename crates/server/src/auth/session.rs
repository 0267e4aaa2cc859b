use std::sync::Arc;

use axum::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum_extra::extract::cookie::{Cookie, Key, SameSite, SignedCookieJar};
use chrono::Utc;
use tracing::debug;

use crate::auth::error::SessionError;
use crate::config::SessionConfig;
use crate::models::session::SessionPayload;
use crate::models::user::UserId;
use crate::server::state::AppState;

pub const SESSION_COOKIE: &str = "__session";

/// Signing key for [`SignedCookieJar`], taken from the app state.
#[derive(Clone)]
pub struct SessionKey(pub Key);

impl FromRef<Arc<AppState>> for SessionKey {
    fn from_ref(state: &Arc<AppState>) -> Self {
        Self(state.session_key.clone())
    }
}

impl From<SessionKey> for Key {
    fn from(key: SessionKey) -> Self {
        key.0
    }
}

pub type SessionJar = SignedCookieJar<SessionKey>;

/// The signed-in user. Rejects requests without a valid session cookie.
#[derive(Clone, Debug, Copy, PartialEq, Eq)]
pub struct CurrentUser {
    pub user_id: UserId,
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = SessionError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let jar = SessionJar::from_request_parts(parts, state)
            .await
            .map_err(|never| match never {})?;
        let cookie = jar.get(SESSION_COOKIE).ok_or(SessionError::TokenNotFound)?;
        let payload = SessionPayload::decode(cookie.value()).ok_or_else(|| {
            debug!("malformed session cookie: payload does not decode");
            SessionError::BadToken
        })?;
        if payload.is_expired(Utc::now()) {
            return Err(SessionError::TokenExpired);
        }
        Ok(CurrentUser {
            user_id: payload.user_id,
        })
    }
}

pub fn start_session<K>(
    jar: SignedCookieJar<K>,
    user_id: UserId,
    config: &SessionConfig,
) -> SignedCookieJar<K> {
    let payload = SessionPayload::new(
        user_id,
        Utc::now(),
        chrono::Duration::days(config.max_age_days),
    );
    let cookie = Cookie::build((SESSION_COOKIE, payload.encode()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.secure)
        .max_age(time::Duration::days(config.max_age_days));
    jar.add(cookie)
}

pub fn end_session<K>(jar: SignedCookieJar<K>) -> SignedCookieJar<K> {
    jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
}

#[cfg(test)]
mod tests {
    use axum::response::IntoResponse;
    use axum::http::header::SET_COOKIE;

    use super::*;
    use crate::auth::utils::derive_cookie_key;

    fn jar() -> SignedCookieJar {
        SignedCookieJar::new(derive_cookie_key("0123456789abcdef0123456789abcdef"))
    }

    #[test]
    fn session_cookie_attributes() {
        let jar = start_session(jar(), 5, &SessionConfig::default());
        let cookie = jar.get(SESSION_COOKIE).unwrap();
        let payload = SessionPayload::decode(cookie.value()).unwrap();
        assert_eq!(payload.user_id, 5);

        let response = jar.into_response();
        let header = response.headers().get(SET_COOKIE).unwrap().to_str().unwrap();
        assert!(header.starts_with("__session="));
        assert!(header.contains("HttpOnly"));
        assert!(header.contains("SameSite=Lax"));
        assert!(header.contains("Path=/"));
        assert!(header.contains(&format!("Max-Age={}", 30 * 24 * 60 * 60)));
        assert!(!header.contains("Secure"));
    }

    #[test]
    fn ending_a_session_clears_the_cookie() {
        let jar = end_session(start_session(jar(), 5, &SessionConfig::default()));
        assert!(jar.get(SESSION_COOKIE).is_none());
    }
}
