use std::convert::Infallible;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::{AppConfig, Env},
    models::{ADMIN_ROLE, User},
    repository::RepositoryState,
};

/// Claims
///
/// The JWT payload issued by the session provider.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the reader's id in the `profiles` table.
    pub sub: Uuid,
    pub exp: usize,
    pub iat: usize,
}

/// AuthUser
///
/// The resolved identity of a signed-in reader, loaded fresh from the store on
/// every request so role and access level changes apply immediately.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: String,
    pub access_level: i32,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == ADMIN_ROLE
    }
}

impl From<User> for AuthUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            role: user.role,
            access_level: user.access_level,
        }
    }
}

/// CurrentUser
///
/// The session context attached to a request: `Some` when the request carries
/// a valid identity, `None` otherwise. Extraction never rejects; the gate
/// decides what an anonymous request may do.
#[derive(Debug, Clone, Default)]
pub struct CurrentUser(pub Option<AuthUser>);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);

        let Some(user_id) = identify(parts, &config) else {
            return Ok(CurrentUser(None));
        };

        // The token may outlive the reader; an unknown id is treated as signed out.
        match repo.get_user(user_id).await {
            Ok(user) => Ok(CurrentUser(Some(user.into()))),
            Err(e) => {
                tracing::debug!(%user_id, error = %e, "session user could not be loaded");
                Ok(CurrentUser(None))
            }
        }
    }
}

/// identify
///
/// Finds the claimed reader id: the local `x-user-id` bypass first (only in
/// `Env::Local`), then a `Bearer` JWT validated against the configured secret.
fn identify(parts: &Parts, config: &AppConfig) -> Option<Uuid> {
    if config.env == Env::Local {
        let bypass = parts
            .headers
            .get("x-user-id")
            .and_then(|value| value.to_str().ok())
            .and_then(|id| Uuid::parse_str(id).ok());
        if bypass.is_some() {
            return bypass;
        }
    }

    let token = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))?;

    let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());
    let mut validation = Validation::default();
    validation.validate_exp = true;

    match decode::<Claims>(token, &decoding_key, &validation) {
        Ok(data) => Some(data.claims.sub),
        Err(e) => {
            tracing::debug!(error = %e, "rejected bearer token");
            None
        }
    }
}
