// ============================================================================
// Catalog Domain
// ============================================================================
//
// Items have no workflow: they are priced records an admin maintains and the
// order engine reads when pricing a cart change.
//
// ============================================================================

pub mod errors;
pub mod item;
pub mod service;

pub use errors::*;
pub use item::*;
pub use service::*;
