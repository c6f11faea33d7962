//! Explicit session context.
//!
//! A `Session` is created from verified claims, refreshed when the identity
//! provider re-issues a token for the same principal, and torn down on
//! sign-out. Callers pass it by reference; nothing here is global.

use chrono::{DateTime, Utc};
use thiserror::Error;

use neurocore_core::{TenantId, UserId};

use crate::claims::{JwtClaims, TokenValidationError, validate_claims};
use crate::{Principal, Role, TenantMembership};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SessionState {
    Active,
    SignedOut,
}

/// Auth-state change notifications delivered to an existing session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    TokenRefreshed(JwtClaims),
    SignedOut,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error(transparent)]
    Token(#[from] TokenValidationError),

    #[error("refreshed token belongs to a different principal or tenant")]
    PrincipalChanged,

    #[error("session has been signed out")]
    SignedOut,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    claims: JwtClaims,
    state: SessionState,
}

impl Session {
    /// Create a session from claims whose signature has already been verified.
    pub fn establish(claims: JwtClaims, now: DateTime<Utc>) -> Result<Self, SessionError> {
        validate_claims(&claims, now)?;
        Ok(Self {
            claims,
            state: SessionState::Active,
        })
    }

    pub fn apply(&mut self, event: SessionEvent, now: DateTime<Utc>) -> Result<(), SessionError> {
        if self.state == SessionState::SignedOut {
            return Err(SessionError::SignedOut);
        }
        match event {
            SessionEvent::TokenRefreshed(claims) => {
                if claims.sub != self.claims.sub || claims.tenant_id != self.claims.tenant_id {
                    return Err(SessionError::PrincipalChanged);
                }
                validate_claims(&claims, now)?;
                self.claims = claims;
            }
            SessionEvent::SignedOut => {
                self.state = SessionState::SignedOut;
            }
        }
        Ok(())
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.state == SessionState::Active && now < self.claims.expires_at
    }

    pub fn user_id(&self) -> UserId {
        self.claims.sub
    }

    pub fn tenant_id(&self) -> TenantId {
        self.claims.tenant_id
    }

    pub fn roles(&self) -> &[Role] {
        &self.claims.roles
    }

    pub fn is_privileged(&self) -> bool {
        crate::roles::any_privileged(&self.claims.roles)
    }

    pub fn principal(&self) -> Principal {
        Principal {
            user_id: self.claims.sub,
            active_tenant_id: self.claims.tenant_id,
            membership: TenantMembership::from_roles(self.claims.tenant_id, self.claims.roles.clone()),
        }
    }
}
