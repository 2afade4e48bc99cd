use uuid::Uuid;

use super::value_objects::OrderStatus;
use crate::domain::policy::AccessDenied;
use crate::domain::ErrorKind;
use crate::store::StoreError;
use crate::utils::IsTransient;

// ============================================================================
// Order Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("At least 1 item is required!")]
    InvalidQuantity(i64),

    #[error("Postal address is required")]
    MissingPostalAddress,

    #[error("Item not found")]
    UnknownItem(Uuid),

    #[error("Item is not available")]
    ItemUnavailable(Uuid),

    #[error("Quantity of item {0} exceeds the per-line limit")]
    QuantityTooLarge(Uuid),

    #[error("Order total exceeds the supported amount")]
    TotalTooLarge,

    #[error("Status {0} cannot be set by an admin")]
    InvalidTargetStatus(OrderStatus),

    #[error("You are not logged in!")]
    Unauthenticated,

    #[error("Operation not allowed")]
    Forbidden,

    #[error("Order not found")]
    OrderNotFound,

    #[error("Order is no longer editable (status {0})")]
    NotMutable(OrderStatus),

    #[error("Item not found in order")]
    LineNotFound(Uuid),

    #[error("Item not found")]
    CatalogItemMissing(Uuid),

    #[error("Order not found | Operation not allowed")]
    NotPending(OrderStatus),

    #[error("Order {0} was modified concurrently")]
    VersionConflict(Uuid),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl OrderError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            OrderError::InvalidQuantity(_)
            | OrderError::MissingPostalAddress
            | OrderError::UnknownItem(_)
            | OrderError::ItemUnavailable(_)
            | OrderError::QuantityTooLarge(_)
            | OrderError::TotalTooLarge
            | OrderError::InvalidTargetStatus(_) => ErrorKind::Validation,
            OrderError::Unauthenticated => ErrorKind::Authentication,
            OrderError::Forbidden => ErrorKind::Authorization,
            OrderError::OrderNotFound
            | OrderError::NotMutable(_)
            | OrderError::LineNotFound(_)
            | OrderError::CatalogItemMissing(_)
            | OrderError::NotPending(_) => ErrorKind::NotFound,
            OrderError::VersionConflict(_) => ErrorKind::Conflict,
            OrderError::Store(e) => e.kind(),
        }
    }

    /// Stable reason string for clients and metrics labels
    pub fn code(&self) -> &'static str {
        match self {
            OrderError::InvalidQuantity(_) => "INVALID_QUANTITY",
            OrderError::MissingPostalAddress => "POSTAL_ADDRESS_REQUIRED",
            OrderError::UnknownItem(_) => "UNKNOWN_ITEM",
            OrderError::ItemUnavailable(_) => "ITEM_NOT_AVAILABLE",
            OrderError::QuantityTooLarge(_) => "QUANTITY_TOO_LARGE",
            OrderError::TotalTooLarge => "TOTAL_TOO_LARGE",
            OrderError::InvalidTargetStatus(_) => "INVALID_TARGET_STATUS",
            OrderError::Unauthenticated => "UNAUTHENTICATED",
            OrderError::Forbidden => "FORBIDDEN",
            OrderError::OrderNotFound => "ORDER_NOT_FOUND",
            OrderError::NotMutable(_) => "ORDER_NOT_MUTABLE",
            OrderError::LineNotFound(_) => "ITEM_NOT_IN_ORDER",
            OrderError::CatalogItemMissing(_) => "ITEM_NOT_FOUND",
            OrderError::NotPending(_) => "ORDER_NOT_PENDING",
            OrderError::VersionConflict(_) => "VERSION_CONFLICT",
            OrderError::Store(e) => e.code(),
        }
    }
}

impl IsTransient for OrderError {
    fn is_transient(&self) -> bool {
        matches!(self, OrderError::VersionConflict(_))
    }
}

impl From<AccessDenied> for OrderError {
    fn from(denied: AccessDenied) -> Self {
        match denied {
            AccessDenied::Hidden => OrderError::OrderNotFound,
            AccessDenied::Forbidden => OrderError::Forbidden,
        }
    }
}
