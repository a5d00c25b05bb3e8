//! Router modules, split by access level. Authentication is applied as a layer on
//! the authenticated router, so a handler there can never be reached anonymously.

/// Routes open to anonymous clients: registration, login and read-only access.
pub mod public;

/// Routes behind the bearer-token layer. Ownership checks happen in the services.
pub mod authenticated;
