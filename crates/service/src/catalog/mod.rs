//! Catalog entries: domain types, the persistence seam and the catalog service.

pub mod domain;
pub mod repository;
pub mod repo;
pub mod service;

pub use service::CatalogService;
