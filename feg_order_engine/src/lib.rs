//! Fibre Elite Glow Order Engine
//!
//! The order engine turns payment provider checkout webhooks into durable storefront orders, exactly once per
//! checkout session, no matter how often (or in which order) the provider delivers its events.
//!
//! The library is divided into these sections:
//! 1. Webhook intake ([`mod@checkout`]). Signature verification against a secret resolved from an ordered chain of
//!    sources, a typed model of the provider events, and the normalizer that validates the loosely-typed checkout
//!    payload.
//! 2. The reconciliation API ([`ReconciliationApi`]). This is the state machine that decides whether an order has to
//!    be created, and which side effects follow from it. [`OrderQueryApi`] provides read access to the results.
//! 3. Backend contracts ([`mod@traits`]) and the SQLite implementation of them ([`SqliteDatabase`]). You should never
//!    need to access the database directly. The data types used in the database are defined in [`mod@db_types`].
//!
//! The engine also emits events when orders are created or payments fail. Hooks registered via
//! [`events::EventHooks`] run in the background, which is how order notifications are sent without holding up the
//! webhook response.
pub mod checkout;
pub mod db_types;
pub mod events;
pub mod helpers;
pub mod traits;

mod feg_api;
#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use feg_api::{
    errors::ReconcileError,
    order_objects::{OrderDetails, ReconcileOutcome},
    order_query_api::OrderQueryApi,
    reconciliation_api::ReconciliationApi,
};
#[cfg(feature = "sqlite")]
pub use sqlite::{db as sqlite_db, SqliteDatabase};
