//! Payment-service order data.

use serde::{Deserialize, Serialize};

use crate::ParseEnumError;

/// Server-side status of an SKU order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentOrderStatus {
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "paid")]
    Paid,
    #[serde(rename = "fulfilled")]
    Fulfilled,
    #[serde(rename = "canceled")]
    Canceled,
}

impl PaymentOrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentOrderStatus::Pending => "pending",
            PaymentOrderStatus::Paid => "paid",
            PaymentOrderStatus::Fulfilled => "fulfilled",
            PaymentOrderStatus::Canceled => "canceled",
        }
    }
}

impl std::str::FromStr for PaymentOrderStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentOrderStatus::Pending),
            "paid" => Ok(PaymentOrderStatus::Paid),
            "fulfilled" => Ok(PaymentOrderStatus::Fulfilled),
            "canceled" => Ok(PaymentOrderStatus::Canceled),
            other => Err(ParseEnumError::new("payment order status", other)),
        }
    }
}

/// One line item of an SKU order.
#[derive(Clone, Debug, PartialEq)]
pub struct PaymentOrderItem {
    pub id: String,
    pub sku: String,
    pub quantity: i32,
    /// Per-unit price in BAT.
    pub price: f64,
}

/// An SKU order as reported by the payment service.
#[derive(Clone, Debug, PartialEq)]
pub struct PaymentOrder {
    pub id: String,
    pub status: Option<PaymentOrderStatus>,
    pub total_price: f64,
    pub items: Vec<PaymentOrderItem>,
}
