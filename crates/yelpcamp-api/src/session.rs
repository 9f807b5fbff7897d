use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use yelpcamp_db::Database;
use yelpcamp_types::models::UserSummary;

use crate::error::AppError;
use crate::flash::{self, PendingNotices};
use crate::state::{AppState, blocking};

pub const SESSION_COOKIE: &str = "yelpcamp_session";

/// Claims carried by the session cookie. The cookie only names the session;
/// everything else lives in the sessions table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sid: Uuid,
    pub exp: usize,
}

/// The authenticated user acting on a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: Uuid,
    pub username: String,
}

impl Principal {
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            username: self.username.clone(),
        }
    }
}

/// Per-request view of the session, inserted into request extensions by
/// [`load_session`].
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub id: Uuid,
    pub principal: Option<Principal>,
}

pub fn issue_token(secret: &str, sid: Uuid, ttl_hours: u64) -> anyhow::Result<String> {
    let claims = SessionClaims {
        sid,
        exp: (chrono::Utc::now() + chrono::Duration::hours(ttl_hours as i64)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

/// Session id from a cookie value, if the token is genuine and unexpired.
pub fn decode_token(secret: &str, token: &str) -> Option<Uuid> {
    decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims.sid)
    .ok()
}

pub fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

/// Resolve (or start) the session for every request, and persist whatever
/// notices the handler attached to its response.
pub async fn load_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let presented = jar
        .get(SESSION_COOKIE)
        .and_then(|c| decode_token(&state.session_secret, c.value()));
    let ttl = state.session_ttl_hours;

    let (session, fresh) = blocking(&state, move |db| resolve(db, presented, ttl)).await?;
    req.extensions_mut().insert(session.clone());

    let mut response = next.run(req).await;

    if let Some(PendingNotices(notices)) = response.extensions_mut().remove::<PendingNotices>() {
        if let Err(e) = flash::persist(&state, &session, notices).await {
            warn!("Failed to queue notices for session {}: {}", session.id, e);
        }
    }

    if fresh {
        let token = issue_token(&state.session_secret, session.id, ttl)?;
        return Ok((jar.add(session_cookie(token)), response).into_response());
    }

    Ok(response)
}

fn resolve(db: &Database, presented: Option<Uuid>, ttl_hours: u64) -> anyhow::Result<(SessionContext, bool)> {
    if let Some(sid) = presented {
        if let Some(row) = db.get_session(&sid.to_string())? {
            let principal = match (row.user_id, row.username) {
                (Some(uid), Some(username)) => match uid.parse() {
                    Ok(id) => Some(Principal { id, username }),
                    Err(e) => {
                        warn!("Corrupt user id '{}' on session '{}': {}", uid, row.id, e);
                        None
                    }
                },
                _ => None,
            };
            return Ok((SessionContext { id: sid, principal }, false));
        }
    }

    let sid = Uuid::new_v4();
    db.create_session(&sid.to_string(), ttl_hours)?;
    debug!("Started session {}", sid);
    Ok((
        SessionContext {
            id: sid,
            principal: None,
        },
        true,
    ))
}
