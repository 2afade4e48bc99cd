// ============================================================================
// Store Module - persistence seams for orders and the catalog
// ============================================================================
//
// Engine and catalog code depend only on the traits below. Two backends:
// - `memory`: process-local maps, used by tests and `STORAGE_BACKEND=memory`
// - `scylla`: ScyllaDB tables with lightweight transactions for CAS
//
// ============================================================================

mod memory;
pub mod schema;
mod scylla;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::catalog::Item;
use crate::domain::order::Order;
use crate::domain::ErrorKind;
use crate::health::HealthCheck;

pub use memory::{InMemoryCatalogStore, InMemoryOrderStore};
pub use scylla::{ScyllaCatalogStore, ScyllaOrderStore};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{store} store is unavailable")]
    Unavailable { store: &'static str },

    #[error("Document {0} already exists")]
    DuplicateId(Uuid),

    #[error("Stored document {id} is unreadable: {reason}")]
    Corrupt { id: Uuid, reason: String },

    #[error("Store operation failed: {0}")]
    Backend(#[from] anyhow::Error),
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::Unavailable { .. } => ErrorKind::Unavailable,
            StoreError::DuplicateId(_) => ErrorKind::Conflict,
            StoreError::Corrupt { .. } | StoreError::Backend(_) => ErrorKind::Internal,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            StoreError::Unavailable { .. } => "STORE_UNAVAILABLE",
            StoreError::DuplicateId(_) => "DUPLICATE_ID",
            StoreError::Corrupt { .. } | StoreError::Backend(_) => "STORE_ERROR",
        }
    }
}

/// Outcome of a conditional write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CasOutcome {
    Applied,
    /// The stored version did not match, or the document is gone
    Conflict,
}

/// Order documents keyed by id.
///
/// Every write after the initial insert is conditioned on the document's
/// `version`, so concurrent writers cannot silently overwrite each other.
#[async_trait]
pub trait OrderStore: HealthCheck {
    /// Create a document; fails with `DuplicateId` if the id is taken
    async fn insert(&self, order: &Order) -> Result<(), StoreError>;

    async fn get(&self, id: Uuid) -> Result<Option<Order>, StoreError>;

    /// Overwrite the document if its stored version is still `expected_version`
    async fn replace(&self, order: &Order, expected_version: u64) -> Result<CasOutcome, StoreError>;

    /// Remove the document if its stored version is still `expected_version`
    async fn delete_if(&self, id: Uuid, expected_version: u64) -> Result<CasOutcome, StoreError>;

    /// Remove unconditionally; `false` if nothing was there
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;

    async fn list(&self) -> Result<Vec<Order>, StoreError>;
}

/// Catalog records keyed by item id
#[async_trait]
pub trait CatalogStore: HealthCheck {
    async fn get(&self, id: Uuid) -> Result<Option<Item>, StoreError>;

    async fn list(&self) -> Result<Vec<Item>, StoreError>;

    /// Insert or overwrite
    async fn put(&self, item: &Item) -> Result<(), StoreError>;

    /// `false` if nothing was there
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;
}
