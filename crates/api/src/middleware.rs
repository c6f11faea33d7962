use std::sync::Arc;

use axum::{extract::State, http::HeaderMap, middleware::Next, response::Response};
use chrono::Utc;

use neurocore_auth::{JwtValidator, Session};

use crate::app::errors::ApiError;
use crate::context::{PrincipalContext, TenantContext};

#[derive(Clone)]
pub struct AuthState {
    pub jwt: Arc<dyn JwtValidator>,
}

/// Verify the bearer token, establish a per-request [`Session`] and attach the
/// derived tenant/principal contexts.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::extract::Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer(req.headers())?;
    let now = Utc::now();

    let claims = state.jwt.validate(token, now).map_err(|e| {
        tracing::debug!(error = %e, "bearer token rejected");
        ApiError::Unauthenticated("invalid or expired token".into())
    })?;
    let session = Session::establish(claims, now).map_err(|e| ApiError::Unauthenticated(e.to_string()))?;

    req.extensions_mut().insert(TenantContext::new(session.tenant_id()));
    req.extensions_mut()
        .insert(PrincipalContext::new(session.user_id(), session.roles().to_vec()));

    Ok(next.run(req).await)
}

fn extract_bearer(headers: &HeaderMap) -> Result<&str, ApiError> {
    let missing = || ApiError::Unauthenticated("missing bearer token".into());

    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(missing)?;
    let header = header.to_str().map_err(|_| missing())?;
    let token = header.strip_prefix("Bearer ").ok_or_else(missing)?.trim();
    if token.is_empty() {
        return Err(missing());
    }

    Ok(token)
}
