use serde::{Deserialize, Serialize};

use crate::db_types::{Order, ShippingAddress};

/// The outcome of an idempotent order insert. The duplicate case is a normal result, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertOrderResult {
    Inserted(Order),
    AlreadyExists(Order),
}

impl InsertOrderResult {
    pub fn order(&self) -> &Order {
        match self {
            Self::Inserted(o) | Self::AlreadyExists(o) => o,
        }
    }

    pub fn into_order(self) -> Order {
        match self {
            Self::Inserted(o) | Self::AlreadyExists(o) => o,
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, Self::Inserted(_))
    }
}

/// Customer contact details as captured at checkout
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub shipping_address: ShippingAddress,
}
