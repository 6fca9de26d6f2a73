use std::{fmt, sync::Arc};

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use model::entities::user;
use sea_orm::EntityTrait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::schemas::AppState;

/// JWT claims carried by access tokens.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Email of the user the token was issued to.
    pub sub: String,
    pub user_id: i32,
    /// Expiration time (timestamp)
    pub exp: usize,
}

/// The caller resolved by [`require_auth`], passed to handlers as a request
/// extension.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: i32,
}

/// Issues and verifies HS256 access tokens.
#[derive(Clone)]
pub struct TokenService {
    secret: Arc<str>,
    ttl: Duration,
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("secret", &"<redacted>")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl TokenService {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self {
            secret: Arc::from(secret),
            ttl: Duration::hours(ttl_hours),
        }
    }

    pub fn issue(&self, user: &user::Model) -> Result<String, ApiError> {
        let expiration = (Utc::now() + self.ttl).timestamp() as usize;
        let claims = Claims {
            sub: user.email.clone(),
            user_id: user.id,
            exp: expiration,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| ApiError::Internal(format!("Token creation failed: {e}")))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, ApiError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|e| {
            warn!(error = ?e, "JWT decoding error during auth middleware.");
            ApiError::Unauthorized
        })
    }
}

/// Middleware rejecting requests without a valid bearer token.
///
/// The token must decode and its user must still exist and be active; every
/// failure is reported as the same 401.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .ok_or(ApiError::Unauthorized)?;

    let claims = state.tokens.verify(token)?;

    let user = match user::Entity::find_by_id(claims.user_id).one(&state.db).await? {
        Some(user) if user.is_active => user,
        Some(_) => {
            warn!("Token presented for inactive user {}", claims.user_id);
            return Err(ApiError::Unauthorized);
        }
        None => {
            warn!("Token presented for unknown user {}", claims.user_id);
            return Err(ApiError::Unauthorized);
        }
    };

    debug!("Authenticated request for user {}", user.id);
    req.extensions_mut().insert(AuthenticatedUser { id: user.id });
    Ok(next.run(req).await)
}
