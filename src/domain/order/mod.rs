// ============================================================================
// Order Domain - draft accumulation and lifecycle
// ============================================================================
//
// - Value objects (OrderLine, OrderStatus, PostalAddress)
// - Commands (AddItem, RemoveUnit, SetPostalAddress, Confirm, Advance)
// - Errors (OrderError enum)
// - Order document with its pure transitions
// - Engine (OrderEngine) that prices, authorizes and persists transitions
//
// ============================================================================

pub mod aggregate;
pub mod commands;
pub mod engine;
pub mod errors;
pub mod value_objects;

// Re-export for convenience
pub use aggregate::*;
pub use commands::*;
pub use engine::*;
pub use errors::*;
pub use value_objects::*;
