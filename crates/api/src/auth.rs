//! Bearer-token authentication mapping tokens to supplier identities.

use std::collections::HashMap;

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use common::SupplierId;

use crate::error::ApiError;

/// Maps a presented credential to the supplier it authenticates.
pub trait AuthVerifier: Send + Sync {
    /// Returns the supplier behind `token`, or `None` for unknown tokens.
    fn verify(&self, token: &str) -> Option<SupplierId>;
}

/// Static token registry for tests and the demo server.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenVerifier {
    tokens: HashMap<String, SupplierId>,
}

impl StaticTokenVerifier {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `token` as a credential for `supplier_id`.
    pub fn register(&mut self, token: impl Into<String>, supplier_id: SupplierId) {
        self.tokens.insert(token.into(), supplier_id);
    }
}

impl AuthVerifier for StaticTokenVerifier {
    fn verify(&self, token: &str) -> Option<SupplierId> {
        self.tokens.get(token).copied()
    }
}

/// Extracts the authenticated supplier from the request headers.
///
/// Expects `Authorization: Bearer <token>`; anything else is a 401.
pub fn authenticate(verifier: &dyn AuthVerifier, headers: &HeaderMap) -> Result<SupplierId, ApiError> {
    let header = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| ApiError::Unauthenticated("missing Authorization header".to_string()))?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::Unauthenticated("expected a Bearer token".to_string()))?;

    verifier
        .verify(token)
        .ok_or_else(|| ApiError::Unauthenticated("unknown token".to_string()))
}
