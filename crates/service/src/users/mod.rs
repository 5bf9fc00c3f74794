//! User accounts: domain types, the persistence seam and the directory service.

pub mod domain;
pub mod repository;
pub mod repo;
pub mod service;

pub use service::UserDirectory;
