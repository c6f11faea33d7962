use thiserror::Error;

use neurocore_core::DomainError;

use crate::store::StoreError;

/// Failure of an infra service call: either the input was rejected by the
/// domain rules or the backing store failed.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Store(#[from] StoreError),
}
