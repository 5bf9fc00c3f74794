//! SeaORM entities for the catalog schema plus the field-level validation rules shared by
//! the service and gateway layers.

pub mod errors;
pub mod db;
pub mod user;
pub mod entry;
pub mod entry_type;
pub mod entry_ability;

#[cfg(test)]
mod tests;
