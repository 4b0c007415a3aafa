//! Bearer-token sessions.
//!
//! Tokens are opaque UUIDs held in memory; restarting the server logs
//! everyone out. Handlers take an [`Authenticated`] argument to require a
//! session, or `Option<Authenticated>` to accept anonymous callers too.

use std::collections::HashMap;
use std::future::{Ready, ready};
use std::sync::{Mutex, PoisonError};

use actix_web::dev::Payload;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{FromRequest, HttpRequest, web};
use chrono::{DateTime, Duration, Utc};
use relief_map_user_models::Caller;

use crate::AppState;
use crate::error::ApiError;

#[derive(Debug, Clone)]
struct Session {
    caller: Caller,
    expires_at: DateTime<Utc>,
}

/// Issued session tokens.
#[derive(Debug)]
pub struct SessionStore {
    ttl: Duration,
    sessions: Mutex<HashMap<String, Session>>,
}

impl SessionStore {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Starts a session for `caller`, returning the token and its expiry.
    pub fn issue(&self, caller: Caller, now: DateTime<Utc>) -> (String, DateTime<Utc>) {
        let token = uuid::Uuid::new_v4().to_string();
        let expires_at = now + self.ttl;
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        sessions.retain(|_, s| s.expires_at > now);
        sessions.insert(token.clone(), Session { caller, expires_at });
        (token, expires_at)
    }

    /// The caller holding `token`, if the session is still valid at `now`.
    ///
    /// Expired sessions are removed.
    pub fn resolve(&self, token: &str, now: DateTime<Utc>) -> Option<Caller> {
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        let caller = sessions
            .get(token)
            .filter(|s| s.expires_at > now)
            .map(|s| s.caller.clone());
        if caller.is_none() {
            sessions.remove(token);
        }
        caller
    }

    /// Ends the session for `token`. Returns whether it existed.
    pub fn revoke(&self, token: &str) -> bool {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(token)
            .is_some()
    }
}

/// The caller behind a valid `Authorization: Bearer` token.
#[derive(Debug, Clone)]
pub struct Authenticated {
    pub caller: Caller,
    pub token: String,
}

fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn authenticate(req: &HttpRequest) -> Result<Authenticated, ApiError> {
    let token = bearer_token(req).ok_or(ApiError::Unauthenticated)?;
    let state = req.app_data::<web::Data<AppState>>().ok_or_else(|| {
        log::error!("AppState missing from request");
        ApiError::Internal
    })?;
    let caller = state
        .sessions
        .resolve(token, Utc::now())
        .ok_or(ApiError::Unauthenticated)?;
    Ok(Authenticated {
        caller,
        token: token.to_string(),
    })
}

impl FromRequest for Authenticated {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

/// An optional session that is still strict about the token it is given.
///
/// No `Authorization` header means an anonymous caller. A header with a
/// missing, expired, or unknown token is rejected with 401 rather than
/// treated as anonymous.
#[derive(Debug, Clone)]
pub struct OptionalSession(pub Option<Authenticated>);

impl FromRequest for OptionalSession {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        if req.headers().contains_key(AUTHORIZATION) {
            ready(authenticate(req).map(|session| Self(Some(session))))
        } else {
            ready(Ok(Self(None)))
        }
    }
}
