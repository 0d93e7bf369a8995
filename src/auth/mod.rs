//! JWT bearer-token authentication.
//!
//! Tokens are HS256-signed and carry the user's id, email and role. The
//! middleware validates them, reloads the account so role changes apply
//! immediately, and attaches an [`AuthUser`] to the request.

mod password;

pub use password::{hash_password, verify_password};

use axum::{
    extract::{FromRequestParts, Request},
    http::{header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::db::Repository;
use crate::errors::AppError;
use crate::models::{
    normalize_email, normalize_name, validate_password, AuthResponse, Role, SignupRequest, User,
};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// JWT claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub email: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

/// Signing and verification keys plus token lifetime.
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl JwtKeys {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::hours(ttl_hours),
        }
    }

    pub fn issue(&self, user: &User) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.clone(),
            email: user.email.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(|e| {
            tracing::error!("Failed to sign token: {}", e);
            AppError::Internal("Failed to sign token".to_string())
        })
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        let validation = Validation::new(Algorithm::HS256);
        Ok(decode::<Claims>(token, &self.decoding, &validation)?.claims)
    }
}

/// The authenticated caller, as currently stored.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
    pub role: Role,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden("Administrator role required".to_string()))
        }
    }
}

impl From<User> for AuthUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            role: user.role,
        }
    }
}

impl<S: Send + Sync> FromRequestParts<S> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))
    }
}

/// JWT authentication layer function that takes the verification keys and
/// user store as parameters.
pub async fn jwt_auth_layer(
    keys: Arc<JwtKeys>,
    repo: Arc<Repository>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|s| s.trim().to_string());

    let Some(token) = token.filter(|t| !t.is_empty()) else {
        return AppError::Unauthorized("Missing bearer token".to_string()).into_response();
    };

    let claims = match keys.verify(&token) {
        Ok(claims) => claims,
        Err(e) => return e.into_response(),
    };

    match repo.get_user(&claims.sub).await {
        Ok(Some(user)) => {
            request.extensions_mut().insert(AuthUser::from(user));
            next.run(request).await
        }
        Ok(None) => AppError::Unauthorized("Account no longer exists".to_string()).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Check credentials and issue a token.
///
/// Unknown emails and wrong passwords are indistinguishable to the caller.
pub async fn login(
    repo: &Repository,
    keys: &JwtKeys,
    email: &str,
    password: &str,
) -> Result<AuthResponse, AppError> {
    let invalid = || AppError::Unauthorized(INVALID_CREDENTIALS.to_string());

    let email = normalize_email(email).map_err(|_| invalid())?;
    let user = repo.find_user_by_email(&email).await?.ok_or_else(invalid)?;

    if !verify_password(password, &user.password_hash).await? {
        tracing::info!(user_id = %user.id, "Rejected login");
        return Err(invalid());
    }

    let token = keys.issue(&user)?;
    Ok(AuthResponse { token, user })
}

/// Validate, hash and store a new account, then issue a token.
pub async fn signup(
    repo: &Repository,
    keys: &JwtKeys,
    bcrypt_cost: u32,
    request: &SignupRequest,
) -> Result<AuthResponse, AppError> {
    let email = normalize_email(&request.email)?;
    let name = normalize_name(&request.name)?;
    validate_password(&request.password)?;

    if repo.find_user_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict(
            "An account with this email already exists".to_string(),
        ));
    }

    let hash = hash_password(&request.password, bcrypt_cost).await?;
    let user = repo.register_user(&email, &name, &hash).await?;
    let token = keys.issue(&user)?;
    Ok(AuthResponse { token, user })
}
