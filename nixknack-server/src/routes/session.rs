//! Session cookie helpers and the session endpoint

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use tower_cookies::{Cookie, Cookies};

use crate::error::AppError;
use crate::state::AppState;
use crate::store::{Session, SessionId, SessionStore, Store, User};

pub const SESSION_COOKIE: &str = "nixknack_session";

#[derive(Serialize)]
pub struct SessionUser {
    pub id: u64,
    pub username: String,
}

impl From<User> for SessionUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id.0,
            username: user.username,
        }
    }
}

/// GET /session
pub async fn get_session<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    cookies: Cookies,
) -> Result<Json<SessionUser>, AppError> {
    let user = get_session_user(&cookies, &state.store)?;
    Ok(Json(user.into()))
}

/// Helper to get current session from cookies
pub fn get_session_from_cookies<S: Store>(
    cookies: &Cookies,
    store: &S,
) -> Result<Option<Session>, AppError> {
    let cookie = cookies.get(SESSION_COOKIE);
    find_session(store, cookie.as_ref().map(|c| c.value()))
}

/// A missing cookie or an unknown id is `None`; store failures propagate
fn find_session<S: SessionStore + ?Sized>(
    store: &S,
    session_id: Option<&str>,
) -> Result<Option<Session>, AppError> {
    match session_id {
        Some(id) => store.get_session(&SessionId(id.to_string())),
        None => Ok(None),
    }
}

/// The logged-in session; fails with `NotAuthenticated` otherwise
pub fn require_session<S: Store>(cookies: &Cookies, store: &S) -> Result<Session, AppError> {
    get_session_from_cookies(cookies, store)?.ok_or(AppError::NotAuthenticated)
}

/// The logged-in user; a session whose user is gone counts as logged out
pub fn get_session_user<S: Store>(cookies: &Cookies, store: &S) -> Result<User, AppError> {
    let session = require_session(cookies, store)?;
    store
        .get_user(session.user_id)?
        .ok_or(AppError::NotAuthenticated)
}

/// Fails with `NotAllowed` when a live session is present
pub fn require_logged_out<S: Store>(cookies: &Cookies, store: &S) -> Result<(), AppError> {
    if get_session_from_cookies(cookies, store)?.is_some() {
        return Err(AppError::NotAllowed("You are already logged in!".to_string()));
    }
    Ok(())
}

/// Helper to set session cookie
pub fn set_session_cookie(cookies: &Cookies, session_id: &str) {
    let cookie = Cookie::build((SESSION_COOKIE, session_id.to_string()))
        .path("/")
        .http_only(true)
        .build();
    cookies.add(cookie);
}

/// Helper to clear session cookie
pub fn clear_session_cookie(cookies: &Cookies) {
    let cookie = Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .max_age(tower_cookies::cookie::time::Duration::ZERO)
        .build();
    cookies.add(cookie);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InMemoryStore, StoreResult, UserId, UserStore};

    struct UnreachableSessions;

    impl SessionStore for UnreachableSessions {
        fn create_session(&self, _user_id: UserId) -> StoreResult<Session> {
            Err(AppError::Internal("session table unavailable".into()))
        }

        fn get_session(&self, _session_id: &SessionId) -> StoreResult<Option<Session>> {
            Err(AppError::Internal("session table unavailable".into()))
        }

        fn delete_session(&self, _session_id: &SessionId) -> StoreResult<()> {
            Err(AppError::Internal("session table unavailable".into()))
        }

        fn delete_sessions_for_user(&self, _user_id: UserId) -> StoreResult<u64> {
            Err(AppError::Internal("session table unavailable".into()))
        }
    }

    #[test]
    fn test_find_session_missing_or_unknown() {
        let store = InMemoryStore::new();
        let user = store.create_user("alice", "hash").unwrap();
        let session = store.create_session(user).unwrap();

        assert!(find_session(&store, None).unwrap().is_none());
        assert!(find_session(&store, Some("nope")).unwrap().is_none());
        let found = find_session(&store, Some(&session.id.0)).unwrap().unwrap();
        assert_eq!(found.user_id, user);
    }

    #[test]
    fn test_find_session_store_failure_propagates() {
        let store = UnreachableSessions;

        assert!(find_session(&store, None).unwrap().is_none());
        assert!(matches!(
            find_session(&store, Some("abc")),
            Err(AppError::Internal(_))
        ));
    }
}
