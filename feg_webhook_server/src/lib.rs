//! # Fibre Elite Glow webhook server
//!
//! This crate hosts the HTTP face of the order engine. It is responsible for:
//! * Receiving webhook deliveries from the payment provider, authenticating them and handing them to the
//!   reconciliation API.
//! * Answering order lookups from the storefront UI.
//! * Wiring order events to the mail transport.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! * `/health`: A health check route that returns a 200 OK response.
//! * `POST /webhooks/stripe`: The payment provider webhook.
//! * `GET /api/orders/session/{session_id}`: The order (and its items) recorded for a checkout session.
//! * `GET /api/orders/{order_number}`: The order (and its items) with the given order number.
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod helpers;
pub mod integrations;
pub mod routes;
pub mod server;
pub mod webhook_routes;

#[cfg(test)]
mod endpoint_tests;
