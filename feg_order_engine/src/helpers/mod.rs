mod order_number;
mod sanitize;

pub use order_number::{generate_order_number, is_valid_order_number, ORDER_NUMBER_PREFIX};
pub use sanitize::{is_valid_email, normalize_email, sanitize_name, MAX_NAME_LENGTH};
