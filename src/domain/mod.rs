// ============================================================================
// Domain Layer
// ============================================================================
//
// - catalog/ : priced items the order engine reads from
// - order/   : the order document, its state machine and the engine that
//              persists every transition with compare-and-swap
// - policy   : owner / admin access checks shared by both
//
// ============================================================================

pub mod catalog;
pub mod order;
pub mod policy;

/// Coarse classification every domain error maps onto. The HTTP layer turns
/// each kind into a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Authentication,
    Authorization,
    NotFound,
    Conflict,
    Unavailable,
    Internal,
}
