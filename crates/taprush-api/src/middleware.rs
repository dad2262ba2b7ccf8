use axum::{
    extract::{Request, State},
    http::{StatusCode, header},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{DecodingKey, Validation, decode};

use taprush_types::api::Claims;

use crate::auth::{AppState, TOKEN_COOKIE};

/// Extract and validate the JWT: the Authorization header wins, the login
/// cookie is the fallback (browser clients authenticate via the cookie).
pub async fn require_auth(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let bearer = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_owned);

    let token = match bearer {
        Some(token) => token,
        None => jar
            .get(TOKEN_COOKIE)
            .map(|c| c.value().to_owned())
            .ok_or(StatusCode::UNAUTHORIZED)?,
    };

    let token_data = decode::<Claims>(
        &token,
        &DecodingKey::from_secret(state.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| StatusCode::UNAUTHORIZED)?;

    req.extensions_mut().insert(token_data.claims);
    Ok(next.run(req).await)
}
