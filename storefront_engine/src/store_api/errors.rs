use thiserror::Error;

use crate::traits::StoreError;

#[derive(Debug, Clone, Error)]
pub enum ReconciliationError {
    #[error("Payment callback did not quote a provider order id")]
    MissingProviderOrderId,
    #[error("{0}")]
    StoreError(#[from] StoreError),
}
