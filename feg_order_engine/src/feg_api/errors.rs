use thiserror::Error;

use crate::{checkout::PayloadError, traits::ReconciliationDbError};

/// Failures that must be reported to the payment provider so that it retries the delivery.
///
/// Anything that goes wrong after the order row exists (items, stock, notifications) is logged instead and never
/// shows up here.
#[derive(Debug, Clone, Error)]
pub enum ReconcileError {
    #[error("Error creating order record. {0}")]
    OrderCreationFailed(ReconciliationDbError),
    #[error("Error updating checkout session. {0}")]
    SessionUpdateFailed(ReconciliationDbError),
    #[error("{0}")]
    MalformedPayload(#[from] PayloadError),
}
