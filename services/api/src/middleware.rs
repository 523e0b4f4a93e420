//! Authentication middleware for JWT token validation

use axum::{extract::State, http::Request, middleware::Next, response::Response};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use common::config::AuthConfig;
use jsonwebtoken::{DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{error::ApiError, state::AppState};

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: Uuid,
    /// User roles
    #[serde(default)]
    pub roles: Vec<String>,
    /// User permissions
    #[serde(default)]
    pub permissions: Vec<String>,
    /// Issued at time
    pub iat: u64,
    /// Expiration time
    pub exp: u64,
    /// Token type (access or refresh)
    pub token_type: TokenType,
}

/// Token type enum
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub enum TokenType {
    /// Access token
    Access,
    /// Refresh token
    Refresh,
}

/// Authenticated user information
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub roles: Vec<String>,
    pub permissions: Vec<String>,
}

/// Failure to set up token verification at startup
#[derive(Error, Debug)]
pub enum AuthConfigError {
    #[error("auth.jwt_public_key is not set")]
    MissingKey,

    #[error("failed to read public key file {}: {source}", path.display())]
    ReadKey {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid RSA public key: {0}")]
    InvalidKey(#[from] jsonwebtoken::errors::Error),
}

/// Verifies RS256 bearer tokens against a fixed public key
#[derive(Clone)]
pub struct JwtVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn from_rsa_pem(pem: &[u8]) -> Result<Self, AuthConfigError> {
        let decoding_key = DecodingKey::from_rsa_pem(pem)?;
        let mut validation = Validation::new(jsonwebtoken::Algorithm::RS256);
        validation.validate_exp = true;

        Ok(Self {
            decoding_key,
            validation,
        })
    }

    /// Build from `auth.jwt_public_key`, which holds either the PEM itself or a path to it
    pub fn from_config(config: &AuthConfig) -> Result<Self, AuthConfigError> {
        let public_key = config
            .jwt_public_key
            .as_deref()
            .ok_or(AuthConfigError::MissingKey)?;

        if public_key.starts_with("-----BEGIN") {
            return Self::from_rsa_pem(public_key.as_bytes());
        }

        let path = PathBuf::from(public_key);
        let pem = std::fs::read_to_string(&path)
            .map_err(|source| AuthConfigError::ReadKey { path: path.clone(), source })?;

        info!(path = %path.display(), "Loaded JWT public key");
        Self::from_rsa_pem(pem.trim().as_bytes())
    }

    /// Decode and validate `token`, returning its claims
    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
    }
}

/// Authentication middleware
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let bearer = req
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .ok_or(ApiError::Unauthorized)?;

    let claims = state.jwt.verify(bearer.token()).map_err(|e| {
        debug!("Failed to validate token: {}", e);
        ApiError::Unauthorized
    })?;

    // Refresh tokens only buy new access tokens
    if claims.token_type != TokenType::Access {
        return Err(ApiError::Unauthorized);
    }

    let user = AuthUser {
        id: claims.sub,
        roles: claims.roles,
        permissions: claims.permissions,
    };

    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}
