use axum::{
    extract::{FromRef, FromRequestParts, RawPathParams},
    http::{HeaderMap, header, request::Parts},
};
use std::{collections::HashMap, marker::PhantomData};

use crate::{
    errors::AuthError,
    models::{BlogEntry, User},
};

pub mod guards;
pub mod operations;
pub mod password;
pub mod pipeline;
pub mod token;

pub use pipeline::{AccessRequest, AuthPipeline, Decision, Grant, OwnershipCheck, Requirements};
pub use token::{Claims, TokenService, VerifiedToken};

/// Operation
///
/// Attaches a static authorization declaration to a marker type. See `operations`.
pub trait Operation: Send + Sync + 'static {
    const NAME: &'static str;
    const REQUIREMENTS: Requirements;
}

/// Authorized
///
/// The result of running the authorization pipeline for operation `O`. Using it as a
/// handler argument means the handler body only runs once every declared check passed.
///
/// Rejection: the `AuthError` reason, rendered as 401/403/404 with only the category in
/// the body.
pub struct Authorized<O> {
    pub identity: Option<User>,
    /// Set when `O` declares an `AuthoredEntry` check: the entry that check loaded.
    pub entry: Option<BlogEntry>,
    _operation: PhantomData<fn() -> O>,
}

impl<O> Authorized<O> {
    /// The acting identity. Always present for operations that require authentication.
    pub fn user(&self) -> Result<&User, AuthError> {
        self.identity.as_ref().ok_or(AuthError::Unauthenticated)
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

impl<S, O> FromRequestParts<S> for Authorized<O>
where
    S: Send + Sync,
    // The pipeline is assembled from the shared repository, token keys and environment.
    AuthPipeline: FromRef<S>,
    O: Operation,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let pipeline = AuthPipeline::from_ref(state);

        // Routes without path parameters simply yield an empty map.
        let params: HashMap<String, String> =
            match RawPathParams::from_request_parts(parts, state).await {
                Ok(raw) => raw
                    .iter()
                    .map(|(name, value)| (name.to_string(), value.to_string()))
                    .collect(),
                Err(_) => HashMap::new(),
            };

        let request = AccessRequest {
            operation: O::NAME,
            token: bearer_token(&parts.headers),
            params: &params,
        };

        match pipeline.authorize(&O::REQUIREMENTS, &request).await {
            Decision::Allow(grant) => Ok(Authorized {
                identity: grant.identity,
                entry: grant.entry,
                _operation: PhantomData,
            }),
            Decision::Deny(reason) => Err(reason),
        }
    }
}
