use std::future::Future;

use thiserror::Error;

use crate::{
    checkout::FailedPayment,
    db_types::{Order, OrderItem},
    traits::CustomerInfo,
};

#[derive(Debug, Clone, Error)]
pub enum NotificationError {
    #[error("No recipient address is available for the {0}")]
    MissingRecipient(&'static str),
    #[error("The mail transport rejected the message: {0}")]
    TransportError(String),
}

/// Outbound order notifications. Each call is independent; callers log failures and carry on.
///
/// Notifications are sent from spawned event handler tasks, so the returned futures must be `Send`. Implementations
/// can still use `async fn`.
pub trait NotificationDispatcher {
    fn send_customer_confirmation(
        &self,
        order: &Order,
        items: &[OrderItem],
        email: &str,
    ) -> impl Future<Output = Result<(), NotificationError>> + Send;

    fn send_admin_alert(
        &self,
        order: &Order,
        items: &[OrderItem],
        customer: &CustomerInfo,
    ) -> impl Future<Output = Result<(), NotificationError>> + Send;

    fn send_payment_failure_alert(
        &self,
        payment: &FailedPayment,
    ) -> impl Future<Output = Result<(), NotificationError>> + Send;
}
