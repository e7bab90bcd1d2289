pub mod errors;
pub mod order_objects;
pub mod order_query_api;
pub mod reconciliation_api;
