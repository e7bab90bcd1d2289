use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use feg_order_engine::{
    checkout::FailedPayment,
    db_types::{Order, OrderItem, StockAdjustment},
    traits::{CustomerInfo, InventoryError, InventoryManagement, NotificationDispatcher, NotificationError},
    SqliteDatabase,
};

/// Records every stock adjustment and passes it on to the SQLite inventory ledger
#[derive(Clone)]
pub struct RecordingInventory {
    pub db: SqliteDatabase,
    pub calls: Arc<Mutex<Vec<StockAdjustment>>>,
}

impl RecordingInventory {
    pub fn new(db: SqliteDatabase) -> Self {
        Self { db, calls: Arc::new(Mutex::new(Vec::new())) }
    }

    pub fn calls(&self) -> Vec<StockAdjustment> {
        self.calls.lock().unwrap().clone()
    }
}

impl InventoryManagement for RecordingInventory {
    async fn decrement_stock(&self, adjustment: &StockAdjustment) -> Result<bool, InventoryError> {
        self.calls.lock().unwrap().push(adjustment.clone());
        self.db.decrement_stock(adjustment).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Confirmation { order_number: String, email: String, items: usize },
    AdminAlert { order_number: String, customer: String },
    PaymentFailure { payment_intent: String, reason: String },
}

/// Records every notification. When `fail` is set, each call is recorded and then reported as a transport failure.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    pub sent: Arc<Mutex<Vec<Sent>>>,
    pub fail: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self { fail: true, ..Default::default() }
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    /// Notifications are sent from background tasks, so give them a moment to arrive.
    pub async fn wait_for(&self, count: usize) -> Vec<Sent> {
        for _ in 0..100 {
            if self.sent.lock().unwrap().len() >= count {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        self.sent()
    }

    fn record(&self, sent: Sent) -> Result<(), NotificationError> {
        self.sent.lock().unwrap().push(sent);
        if self.fail {
            Err(NotificationError::TransportError("smtp relay is down".into()))
        } else {
            Ok(())
        }
    }
}

impl NotificationDispatcher for RecordingNotifier {
    async fn send_customer_confirmation(
        &self,
        order: &Order,
        items: &[OrderItem],
        email: &str,
    ) -> Result<(), NotificationError> {
        self.record(Sent::Confirmation {
            order_number: order.order_number.to_string(),
            email: email.to_string(),
            items: items.len(),
        })
    }

    async fn send_admin_alert(
        &self,
        order: &Order,
        _items: &[OrderItem],
        customer: &CustomerInfo,
    ) -> Result<(), NotificationError> {
        self.record(Sent::AdminAlert { order_number: order.order_number.to_string(), customer: customer.name.clone() })
    }

    async fn send_payment_failure_alert(&self, payment: &FailedPayment) -> Result<(), NotificationError> {
        self.record(Sent::PaymentFailure {
            payment_intent: payment.payment_intent.clone(),
            reason: payment.failure_reason.clone(),
        })
    }
}
