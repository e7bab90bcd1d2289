//! # Backend contracts
//!
//! The reconciliation flow talks to its collaborators exclusively through these traits, so that the storage engine,
//! the stock ledger and the mail transport can be swapped out (or mocked) independently.
//!
//! * [`OrderReconciliation`] is the write side of the order store. Its `insert_order` is the idempotency boundary of
//!   the whole system.
//! * [`OrderManagement`] provides read-only queries over orders and checkout sessions.
//! * [`SecretStore`] exposes the key/value `secrets` table.
//! * [`InventoryManagement`] adjusts stock levels after an order is recorded.
//! * [`NotificationDispatcher`] sends customer confirmations and admin alerts.
mod data_objects;
mod inventory;
mod notifications;
mod order_management;
mod order_reconciliation;
mod secret_store;

pub use data_objects::{CustomerInfo, InsertOrderResult};
pub use inventory::{InventoryError, InventoryManagement};
pub use notifications::{NotificationDispatcher, NotificationError};
pub use order_management::OrderManagement;
pub use order_reconciliation::{OrderReconciliation, ReconciliationDbError};
pub use secret_store::SecretStore;
