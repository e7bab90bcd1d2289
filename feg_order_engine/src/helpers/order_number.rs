use std::sync::{
    atomic::{AtomicI64, Ordering},
    OnceLock,
};

use chrono::Utc;
use rand::Rng;
use regex::Regex;

use crate::db_types::OrderNumber;

pub const ORDER_NUMBER_PREFIX: &str = "FEG";
const SUFFIX_LENGTH: usize = 6;
const BASE36: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

static LAST_TIMESTAMP: AtomicI64 = AtomicI64::new(0);

/// Generates a new order number of the form `FEG-<unix millis>-<6 upper-case base36 chars>`.
///
/// The timestamp component is strictly increasing within a process: when two numbers are requested in the same
/// millisecond, the second one borrows the next millisecond. Combined with the random suffix, this keeps numbers
/// generated in a tight loop unique.
pub fn generate_order_number() -> OrderNumber {
    let now = Utc::now().timestamp_millis();
    let prev = LAST_TIMESTAMP
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| Some(now.max(last + 1)))
        .unwrap_or(now);
    let timestamp = now.max(prev + 1);
    let mut rng = rand::thread_rng();
    let suffix = (0..SUFFIX_LENGTH).map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char).collect::<String>();
    OrderNumber(format!("{ORDER_NUMBER_PREFIX}-{timestamp}-{suffix}"))
}

pub fn is_valid_order_number(s: &str) -> bool {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^FEG-\d{13,}-[0-9A-Z]{6}$").expect("order number pattern is a valid regex"))
        .is_match(s)
}
