//! Service layer for the catalog: credentials, user directory and catalog operations.
//! - Separates business logic from data access through repository traits.
//! - Reuses validation and entity definitions in `models` crate.
//! - Every repository has a SeaORM implementation and an in-memory `mock` one.

pub mod errors;
pub mod pagination;
pub mod access;
pub mod credentials;
pub mod users;
pub mod catalog;
#[cfg(test)]
pub mod test_support;
