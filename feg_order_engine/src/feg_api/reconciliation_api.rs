use std::fmt::Debug;

use log::*;

use crate::{
    checkout::{
        event::{CheckoutSessionObject, PaymentIntentObject},
        normalize_checkout,
        normalize_payment_failure,
        NormalizedCheckout,
        PayloadError,
        WebhookEvent,
    },
    db_types::{NewCustomer, OrderItem, SessionId, SessionStatus},
    events::{EventProducers, OrderCreatedEvent, PaymentFailedEvent},
    feg_api::{
        errors::ReconcileError,
        order_objects::{OrderDetails, ReconcileOutcome},
    },
    traits::{CustomerInfo, InsertOrderResult, InventoryManagement, OrderReconciliation},
};

/// `ReconciliationApi` turns verified payment provider events into orders.
///
/// The API holds no state of its own between calls. The one piece of coordination that matters, making sure a
/// session produces at most one order, is delegated to the backend's idempotent [`OrderReconciliation::insert_order`].
/// Everything downstream of a freshly inserted order is best-effort:
/// * line items are stored in one batch; if that fails, the order is kept with no items,
/// * stock is decremented once per distinct product; failures are logged,
/// * notifications are published to the event hooks and sent in the background.
///
/// Replays of an already reconciled session do none of these things.
pub struct ReconciliationApi<B, I> {
    db: B,
    inventory: I,
    producers: EventProducers,
}

impl<B, I> Debug for ReconciliationApi<B, I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ReconciliationApi")
    }
}

impl<B, I> ReconciliationApi<B, I> {
    pub fn new(db: B, inventory: I, producers: EventProducers) -> Self {
        Self { db, inventory, producers }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn inventory(&self) -> &I {
        &self.inventory
    }
}

impl<B, I> ReconciliationApi<B, I>
where
    B: OrderReconciliation,
    I: InventoryManagement,
{
    pub async fn reconcile(&self, event: WebhookEvent) -> Result<ReconcileOutcome, ReconcileError> {
        match event {
            WebhookEvent::SessionCompleted(session) => {
                let checkout = normalize_checkout(&session)?;
                self.process_completed_checkout(checkout).await
            },
            WebhookEvent::SessionExpired(session) => self.process_expired_session(&session).await,
            WebhookEvent::PaymentFailed(intent) => self.process_failed_payment(&intent).await,
            WebhookEvent::Ignored { event_type } => {
                debug!("🔄️ Ignoring {event_type} event");
                Ok(ReconcileOutcome::Ignored { event_type })
            },
        }
    }

    /// Records the order for a completed checkout, exactly once per session.
    pub async fn process_completed_checkout(
        &self,
        checkout: NormalizedCheckout,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        let session_id = checkout.session_id.clone();
        let customer_id = self.link_customer(&checkout).await;
        if let Err(e) = self.db.upsert_checkout_session(checkout.session_update(SessionStatus::Complete)).await {
            warn!("🔄️ Could not update the checkout session row for {session_id}. Continuing regardless. {e}");
        }
        let new_order = checkout.new_order(customer_id);
        let order = match self.db.insert_order(new_order).await {
            Ok(InsertOrderResult::Inserted(order)) => order,
            Ok(InsertOrderResult::AlreadyExists(order)) => {
                info!("🔄️ Session {session_id} was already reconciled as order {}. Nothing to do.", order.order_number);
                return Ok(ReconcileOutcome::AlreadyProcessed(order));
            },
            Err(e) => {
                error!("🔄️ Could not create the order for session {session_id}. {e}");
                return Err(ReconcileError::OrderCreationFailed(e));
            },
        };
        let number = &order.order_number;
        info!("🔄️📦️ Order {number} created for session {session_id} ({} {})", order.total, order.currency);
        let items = self.record_items(order.id, &checkout).await;
        if !items.is_empty() {
            self.adjust_inventory(&checkout).await;
        }
        let customer = CustomerInfo {
            name: checkout.customer_name.clone(),
            email: checkout.customer_email.clone(),
            phone: checkout.customer_phone.clone(),
            shipping_address: checkout.shipping_address.clone(),
        };
        self.call_order_created_hook(OrderCreatedEvent::new(order.clone(), items.clone(), customer)).await;
        Ok(ReconcileOutcome::OrderCreated(OrderDetails::new(order, items)))
    }

    async fn process_expired_session(&self, session: &CheckoutSessionObject) -> Result<ReconcileOutcome, ReconcileError> {
        let session_id = session.id.trim();
        if session_id.is_empty() {
            return Err(PayloadError::MissingSessionId.into());
        }
        let session_id = SessionId::from(session_id);
        let updated =
            self.db.expire_checkout_session(&session_id).await.map_err(ReconcileError::SessionUpdateFailed)?;
        if updated {
            info!("🔄️⏰️ Checkout session {session_id} has expired");
        } else {
            debug!("🔄️⏰️ No open checkout session {session_id} to expire");
        }
        Ok(ReconcileOutcome::SessionExpired { updated })
    }

    async fn process_failed_payment(&self, intent: &PaymentIntentObject) -> Result<ReconcileOutcome, ReconcileError> {
        let payment = normalize_payment_failure(intent)?;
        let session = self
            .db
            .fail_checkout_session(&payment.payment_intent, &payment.failure_reason)
            .await
            .map_err(ReconcileError::SessionUpdateFailed)?;
        let intent_id = &payment.payment_intent;
        match &session {
            Some(s) => info!("🔄️❌️ Payment {intent_id} for session {} failed: {}", s.session_id, payment.failure_reason),
            None => info!("🔄️❌️ Payment {intent_id} failed, but no checkout session refers to it"),
        }
        let updated = session.is_some();
        self.call_payment_failed_hook(PaymentFailedEvent::new(payment, session)).await;
        Ok(ReconcileOutcome::PaymentFailed { updated })
    }

    /// Best-effort. The order is created without a customer reference if this fails.
    async fn link_customer(&self, checkout: &NormalizedCheckout) -> Option<i64> {
        let email = &checkout.customer_email;
        if email.is_empty() {
            debug!("🔄️ Session {} has no customer email. The order is not linked to a customer.", checkout.session_id);
            return None;
        }
        let customer = NewCustomer::from_display_name(email, &checkout.customer_name, checkout.customer_phone.clone());
        match self.db.fetch_or_create_customer(customer).await {
            Ok(c) => Some(c.id),
            Err(e) => {
                warn!("🔄️ Could not link session {} to a customer record. {e}", checkout.session_id);
                None
            },
        }
    }

    async fn record_items(&self, order_id: i64, checkout: &NormalizedCheckout) -> Vec<OrderItem> {
        if checkout.items.is_empty() {
            warn!("🔄️ Order #{order_id} (session {}) has no items. It needs manual review.", checkout.session_id);
            return Vec::new();
        }
        match self.db.insert_order_items(order_id, &checkout.order_items()).await {
            Ok(items) => items,
            Err(e) => {
                error!(
                    "🔄️ Could not store the {} items of order #{order_id}. The order is kept without items and needs \
                     manual review. {e}",
                    checkout.items.len()
                );
                Vec::new()
            },
        }
    }

    async fn adjust_inventory(&self, checkout: &NormalizedCheckout) {
        for adjustment in checkout.stock_adjustments() {
            match self.inventory.decrement_stock(&adjustment).await {
                Ok(true) => trace!("🔄️📉️ Stock decremented: {adjustment}"),
                Ok(false) => warn!("🔄️📉️ Stock could only be partially decremented for {adjustment}"),
                Err(e) => error!("🔄️📉️ Could not decrement stock for {adjustment}. {e}"),
            }
        }
    }

    async fn call_order_created_hook(&self, event: OrderCreatedEvent) {
        for emitter in &self.producers.order_created_producer {
            debug!("🔄️📦️ Notifying order created hook subscribers");
            emitter.publish_event(event.clone()).await;
        }
    }

    async fn call_payment_failed_hook(&self, event: PaymentFailedEvent) {
        for emitter in &self.producers.payment_failed_producer {
            debug!("🔄️❌️ Notifying payment failed hook subscribers");
            emitter.publish_event(event.clone()).await;
        }
    }
}
