use uuid::Uuid;

use crate::domain::policy::AccessDenied;
use crate::domain::ErrorKind;
use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Item not found")]
    ItemNotFound(Uuid),

    #[error("Item name is required")]
    BlankName,

    #[error("Description must be at most 150 characters, got {0}")]
    DescriptionTooLong(usize),

    #[error("Price must be non-negative")]
    NegativePrice,

    #[error("Operation not allowed")]
    Forbidden,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CatalogError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CatalogError::ItemNotFound(_) => ErrorKind::NotFound,
            CatalogError::BlankName
            | CatalogError::DescriptionTooLong(_)
            | CatalogError::NegativePrice => ErrorKind::Validation,
            CatalogError::Forbidden => ErrorKind::Authorization,
            CatalogError::Store(e) => e.kind(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            CatalogError::ItemNotFound(_) => "ITEM_NOT_FOUND",
            CatalogError::BlankName => "ITEM_NAME_REQUIRED",
            CatalogError::DescriptionTooLong(_) => "ITEM_DESCRIPTION_TOO_LONG",
            CatalogError::NegativePrice => "ITEM_PRICE_NEGATIVE",
            CatalogError::Forbidden => "FORBIDDEN",
            CatalogError::Store(e) => e.code(),
        }
    }
}

impl From<AccessDenied> for CatalogError {
    fn from(_: AccessDenied) -> Self {
        CatalogError::Forbidden
    }
}
