//! Tenant extraction.
//!
//! Every business route is scoped to one tenant. The tenant travels in the
//! `X-Tenant-Id` header, set by the auth proxy in front of this service
//! from the session's claims (session management lives there, the
//! isolation lives here). Handlers take [`TenantId`] as an extractor and
//! pass it to every repository call; there is no code path that touches
//! business data without it.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::ApiError;
use kirana_core::validation;

/// Header carrying the tenant UUID.
pub const TENANT_HEADER: &str = "x-tenant-id";

/// The authenticated tenant for this request.
#[derive(Debug, Clone)]
pub struct TenantId(pub String);

impl TenantId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<S> FromRequestParts<S> for TenantId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(TENANT_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::validation("Missing X-Tenant-Id header"))?;

        validation::validate_uuid(raw)
            .map_err(|_| ApiError::validation("X-Tenant-Id must be a valid UUID"))?;

        Ok(TenantId(raw.to_string()))
    }
}
