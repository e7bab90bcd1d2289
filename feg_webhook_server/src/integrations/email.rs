//! Sends order notifications through the mail transport.
use feg_mailer::{Email, MailApi, MailerError};
use feg_order_engine::{
    checkout::FailedPayment,
    db_types::{Order, OrderItem},
    traits::{CustomerInfo, NotificationDispatcher, NotificationError},
};
use log::*;

use crate::{
    config::NotificationConfig,
    integrations::email_templates::{admin_order_alert, order_confirmation, payment_failure_alert},
};

#[derive(Clone)]
pub struct EmailNotifier {
    mailer: MailApi,
    admin_email: String,
    support_email: String,
}

impl EmailNotifier {
    pub fn new(mailer: MailApi, config: &NotificationConfig) -> Self {
        Self { mailer, admin_email: config.admin_email.clone(), support_email: config.support_email.clone() }
    }

    async fn send(&self, email: Email) -> Result<(), NotificationError> {
        let id = self.mailer.send_email(&email).await.map_err(|e| match e {
            MailerError::InvalidEmail(_) => NotificationError::MissingRecipient("email"),
            e => NotificationError::TransportError(e.to_string()),
        })?;
        trace!("📧️ '{}' sent to {} ({id})", email.subject, email.to);
        Ok(())
    }
}

impl NotificationDispatcher for EmailNotifier {
    async fn send_customer_confirmation(
        &self,
        order: &Order,
        items: &[OrderItem],
        email: &str,
    ) -> Result<(), NotificationError> {
        if email.trim().is_empty() {
            return Err(NotificationError::MissingRecipient("order confirmation"));
        }
        self.send(order_confirmation(order, items, email, &self.support_email)).await
    }

    async fn send_admin_alert(
        &self,
        order: &Order,
        items: &[OrderItem],
        customer: &CustomerInfo,
    ) -> Result<(), NotificationError> {
        if self.admin_email.trim().is_empty() {
            return Err(NotificationError::MissingRecipient("admin alert"));
        }
        self.send(admin_order_alert(order, items, customer, &self.admin_email)).await
    }

    async fn send_payment_failure_alert(&self, payment: &FailedPayment) -> Result<(), NotificationError> {
        if self.admin_email.trim().is_empty() {
            return Err(NotificationError::MissingRecipient("payment failure alert"));
        }
        self.send(payment_failure_alert(payment, &self.admin_email)).await
    }
}

#[cfg(test)]
mod test {
    use feg_mailer::MailerConfig;

    use super::*;
    use crate::endpoint_tests::helpers::{sample_items, sample_order};

    fn notifier() -> EmailNotifier {
        let mailer = MailApi::new(MailerConfig::default()).unwrap();
        EmailNotifier::new(mailer, &NotificationConfig::default())
    }

    #[tokio::test]
    async fn confirmation_needs_an_address() {
        let notifier = notifier();
        let order = sample_order();
        let err = notifier.send_customer_confirmation(&order, &sample_items(), "").await.unwrap_err();
        assert!(matches!(err, NotificationError::MissingRecipient("order confirmation")));
        notifier.send_customer_confirmation(&order, &sample_items(), "a@b.com").await.unwrap();
    }

    #[tokio::test]
    async fn admin_alerts_go_to_the_admin() {
        let notifier = notifier();
        let order = sample_order();
        let customer = CustomerInfo { name: "Alice".into(), email: "a@b.com".into(), ..Default::default() };
        notifier.send_admin_alert(&order, &[], &customer).await.unwrap();
        let mut config = NotificationConfig::default();
        config.admin_email = String::new();
        let silent = EmailNotifier::new(MailApi::new(MailerConfig::default()).unwrap(), &config);
        let err = silent.send_admin_alert(&order, &[], &customer).await.unwrap_err();
        assert!(matches!(err, NotificationError::MissingRecipient("admin alert")));
    }
}
