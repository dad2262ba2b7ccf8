use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Json, extract::State, http::header, response::IntoResponse};
use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header, encode};
use uuid::Uuid;

use taprush_db::Database;
use taprush_types::api::{Claims, LoginRequest, LoginResponse, UserSummary};
use taprush_types::models::Role;

use crate::error::ApiError;
use crate::run_blocking;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    pub cooldown_secs: i64,
    pub round_secs: i64,
    pub secure_cookies: bool,
}

pub const TOKEN_COOKIE: &str = "token";
const TOKEN_TTL_DAYS: i64 = 7;
const MIN_PASSWORD_CHARS: usize = 5;

/// Login-or-register: an unseen username is registered on the spot with a
/// role derived from the username itself; a known username must present the
/// matching password.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.username.trim().is_empty() {
        return Err(ApiError::BadRequest("username must not be empty"));
    }
    if req.password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(ApiError::BadRequest(
            "password must be at least 5 characters",
        ));
    }

    let lookup = state.clone();
    let lookup_name = req.username.clone();
    let existing = run_blocking(move || lookup.db.get_user_by_username(&lookup_name)).await?;

    let (user_id, username, role) = match existing {
        Some(user) => {
            let parsed_hash = PasswordHash::new(&user.password).map_err(|e| {
                anyhow::anyhow!("corrupt password hash for '{}': {}", user.username, e)
            })?;

            Argon2::default()
                .verify_password(req.password.as_bytes(), &parsed_hash)
                .map_err(|_| ApiError::Unauthorized)?;

            let id: Uuid = user
                .id
                .parse()
                .map_err(|e| anyhow::anyhow!("corrupt user id '{}': {}", user.id, e))?;
            (id, user.username, user.role)
        }
        None => {
            // First login with this username: register.
            let salt = SaltString::generate(&mut OsRng);
            let password_hash = Argon2::default()
                .hash_password(req.password.as_bytes(), &salt)
                .map_err(|e| anyhow::anyhow!("password hashing failed: {}", e))?
                .to_string();

            let role = role_for_username(&req.username);
            let user_id = Uuid::new_v4();

            let db = state.clone();
            let username = req.username.clone();
            run_blocking(move || {
                db.db
                    .create_user(&user_id.to_string(), &username, &password_hash, role, Utc::now())
            })
            .await?;

            (user_id, req.username, role)
        }
    };

    let token = create_token(&state.jwt_secret, user_id, &username, role)?;
    let cookie = session_cookie(&token, state.secure_cookies);

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(LoginResponse {
            user: UserSummary {
                id: user_id,
                username,
                role,
            },
            token,
        }),
    ))
}

/// Registration-time role policy, keyed off the username. The exempt name is
/// accepted in both Latin and Cyrillic scripts, any casing.
fn role_for_username(username: &str) -> Role {
    match username.to_lowercase().as_str() {
        "admin" => Role::Admin,
        "nikita" | "никита" => Role::Nikita,
        _ => Role::Survivor,
    }
}

fn create_token(secret: &str, user_id: Uuid, username: &str, role: Role) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        role,
        exp: (chrono::Utc::now() + chrono::Duration::days(TOKEN_TTL_DAYS)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

fn session_cookie(token: &str, secure: bool) -> String {
    let max_age = TOKEN_TTL_DAYS * 24 * 60 * 60;
    let mut cookie = format!("{TOKEN_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}
