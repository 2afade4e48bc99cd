use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::OrderError;

// ============================================================================
// Order Value Objects
// ============================================================================

/// One `(item, quantity)` entry. An order holds at most one line per item.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub item_id: Uuid,
    pub quantity: u32,
}

/// Order lifecycle.
///
/// `None` is the open draft. The owner moves it to `Pending`; an admin then
/// moves a pending order to any of the remaining statuses, none of which has
/// a further transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    None,
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    Returned,
    Refunded,
    Failed,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 10] = [
        OrderStatus::None,
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
        OrderStatus::Returned,
        OrderStatus::Refunded,
        OrderStatus::Failed,
    ];

    /// Statuses an admin may set on a pending order
    pub fn is_admin_target(self) -> bool {
        !matches!(self, OrderStatus::None | OrderStatus::Pending)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::None => "NONE",
            OrderStatus::Pending => "PENDING",
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::Processing => "PROCESSING",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
            OrderStatus::Returned => "RETURNED",
            OrderStatus::Refunded => "REFUNDED",
            OrderStatus::Failed => "FAILED",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == raw)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Delivery destination. Free-form text, but never blank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostalAddress(String);

impl PostalAddress {
    pub fn parse(raw: &str) -> Result<Self, OrderError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(OrderError::MissingPostalAddress);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Validate a requested quantity coming off the wire.
pub fn positive_quantity(raw: i64) -> Result<u32, OrderError> {
    match u32::try_from(raw) {
        Ok(quantity) if quantity > 0 => Ok(quantity),
        _ => Err(OrderError::InvalidQuantity(raw)),
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
