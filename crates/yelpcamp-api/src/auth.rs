use anyhow::anyhow;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::{SaltString, rand_core::OsRng}};
use axum::{
    Extension, Form, Json,
    extract::{State, rejection::FormRejection},
    response::Response,
};
use tracing::{info, warn};
use uuid::Uuid;

use yelpcamp_db::Database;
use yelpcamp_types::api::{LoginRequest, Notice, Page, RegisterRequest, View, ViewData};

use crate::error::AppError;
use crate::flash;
use crate::pages::{render, view};
use crate::session::{Principal, SessionContext};
use crate::state::{AppState, blocking};

const USERNAME_TAKEN: &str = "A user with the given username is already registered";
const EMAIL_TAKEN: &str = "A user with the given email is already registered";
const BAD_CREDENTIALS: &str = "Password or username is incorrect";

pub async fn register_form(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
) -> Result<Json<Page<ViewData>>, AppError> {
    render(&state, &session, view(View::Register)).await
}

pub async fn register(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    form: Result<Form<RegisterRequest>, FormRejection>,
) -> Result<Response, AppError> {
    let Form(req) = form.map_err(|e| AppError::BadRequest(e.body_text()))?;

    if let Err(message) = check_registration(&req) {
        return Ok(flash::redirect_with("/register", Notice::error(message)));
    }

    let sid = session.id.to_string();
    let username = req.username.clone();
    let created = blocking(&state, move |db| {
        if let Some(taken) = already_registered(db, &req)? {
            return Ok(Err(taken));
        }

        let password_hash = hash_password(&req.password)?;
        let user_id = Uuid::new_v4().to_string();
        if let Err(taken) = create_account(db, &req, &user_id, &password_hash)? {
            return Ok(Err(taken));
        }
        db.set_session_user(&sid, Some(&user_id))?;
        Ok(Ok(()))
    })
    .await?;

    if let Err(message) = created {
        return Ok(flash::redirect_with("/register", Notice::error(message)));
    }

    info!("Registered user {}", username);
    Ok(flash::redirect_with("/campgrounds", Notice::success("Welcome to Yelp Camp!")))
}

pub async fn login_form(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
) -> Result<Json<Page<ViewData>>, AppError> {
    render(&state, &session, view(View::Login)).await
}

pub async fn login(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    form: Result<Form<LoginRequest>, FormRejection>,
) -> Result<Response, AppError> {
    let Form(req) = form.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let sid = session.id.to_string();
    let username = req.username.clone();
    let outcome = blocking(&state, move |db| {
        let Some(principal) = verify_credentials(db, &req)? else {
            return Ok(None);
        };
        db.set_session_user(&sid, Some(&principal.id.to_string()))?;
        let return_to = db.take_return_to(&sid)?;
        Ok(Some(return_to))
    })
    .await?;

    match outcome {
        Some(return_to) => {
            info!("User {} logged in", username);
            let to = return_to.unwrap_or_else(|| "/campgrounds".to_string());
            Ok(flash::redirect_with(&to, Notice::success("Welcome back!")))
        }
        None => {
            warn!("Failed login for {}", username);
            Ok(flash::redirect_with("/login", Notice::error(BAD_CREDENTIALS)))
        }
    }
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    Extension(principal): Extension<Principal>,
) -> Result<Response, AppError> {
    let sid = session.id.to_string();
    blocking(&state, move |db| db.set_session_user(&sid, None)).await?;

    info!("User {} logged out", principal.username);
    Ok(flash::redirect_with("/campgrounds", Notice::success("Successfully logged out")))
}

fn check_registration(req: &RegisterRequest) -> Result<(), &'static str> {
    let username_len = req.username.chars().count();
    if !(3..=32).contains(&username_len) {
        return Err("Username must be between 3 and 32 characters");
    }
    if req.password.chars().count() < 8 {
        return Err("Password must be at least 8 characters");
    }
    if !req.email.contains('@') {
        return Err("Email address is invalid");
    }
    Ok(())
}

fn already_registered(db: &Database, req: &RegisterRequest) -> anyhow::Result<Option<&'static str>> {
    if db.get_user_by_username(&req.username)?.is_some() {
        return Ok(Some(USERNAME_TAKEN));
    }
    if db.get_user_by_email(&req.email)?.is_some() {
        return Ok(Some(EMAIL_TAKEN));
    }
    Ok(None)
}

/// Insert the user. A concurrent registration can claim the username or email
/// between the lookup and the insert; that surfaces as the same notice.
fn create_account(
    db: &Database,
    req: &RegisterRequest,
    user_id: &str,
    password_hash: &str,
) -> anyhow::Result<Result<(), &'static str>> {
    match db.create_user(user_id, &req.username, &req.email, password_hash) {
        Ok(()) => Ok(Ok(())),
        Err(e) if yelpcamp_db::is_constraint_violation(&e) => {
            warn!("Registration for {} lost a race: {}", req.username, e);
            Ok(Err(already_registered(db, req)?.unwrap_or(USERNAME_TAKEN)))
        }
        Err(e) => Err(e),
    }
}

fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| anyhow!("Failed to hash password: {}", e))
}

fn verify_credentials(db: &Database, req: &LoginRequest) -> anyhow::Result<Option<Principal>> {
    let Some(user) = db.get_user_by_username(&req.username)? else {
        return Ok(None);
    };

    let parsed_hash =
        PasswordHash::new(&user.password).map_err(|e| anyhow!("Stored hash for {} is corrupt: {}", user.username, e))?;
    if Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Ok(None);
    }

    Ok(Some(Principal {
        id: user.id.parse()?,
        username: user.username,
    }))
}
