use rust_decimal::Decimal;
use uuid::Uuid;

use super::value_objects::{OrderStatus, PostalAddress};

// ============================================================================
// Order Commands - transitions applied to an existing order document
// ============================================================================
//
// Prices are resolved by the engine before the command is built, so the
// document logic never talks to the catalog.
//
// ============================================================================

#[derive(Debug, Clone)]
pub enum OrderCommand {
    AddItem {
        item_id: Uuid,
        quantity: u32,
        unit_price: Decimal,
    },
    RemoveUnit {
        item_id: Uuid,
        unit_price: Decimal,
    },
    SetPostalAddress {
        postal_address: PostalAddress,
    },
    Confirm,
    Advance {
        target: OrderStatus,
    },
}

/// Raw input for adding an item to the caller's cart
#[derive(Debug, Clone)]
pub struct AddItemInput {
    /// Draft to merge into; a new draft is opened when absent or not open
    pub order_id: Option<Uuid>,
    pub item_id: Uuid,
    pub quantity: i64,
    /// Required when a new draft has to be opened
    pub postal_address: Option<String>,
}
