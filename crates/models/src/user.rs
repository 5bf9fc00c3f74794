//! `users` table: accounts that can log in and own catalog entries.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::entry;

/// Privilege level carried in session tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    #[default]
    #[sea_orm(string_value = "STANDARD")]
    Standard,
    #[sea_orm(string_value = "ADMIN")]
    Admin,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub username: String,
    #[sea_orm(unique)]
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Entries,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self { Relation::Entries => Entity::has_many(entry::Entity).into() }
    }
}

impl Related<entry::Entity> for Entity {
    fn to() -> RelationDef { Relation::Entries.def() }
}

impl ActiveModelBehavior for ActiveModel {}

pub fn validate_username(username: &str) -> Result<(), ModelError> {
    let trimmed = username.trim();
    if trimmed.is_empty() { return Err(ModelError::Validation("username required".into())); }
    if trimmed != username { return Err(ModelError::Validation("username must not have surrounding whitespace".into())); }
    if username.chars().count() > 64 { return Err(ModelError::Validation("username too long (<=64)".into())); }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), ModelError> {
    let Some((local, domain)) = email.split_once('@') else {
        return Err(ModelError::Validation("invalid email".into()));
    };
    if local.is_empty() || domain.is_empty() || email.chars().any(char::is_whitespace) {
        return Err(ModelError::Validation("invalid email".into()));
    }
    if email.len() > 255 { return Err(ModelError::Validation("email too long (<=255)".into())); }
    Ok(())
}

/// First/last names are optional, but when present they must not be blank.
pub fn validate_name(name: Option<&str>) -> Result<(), ModelError> {
    match name {
        Some(n) if n.trim().is_empty() => Err(ModelError::Validation("name must not be blank".into())),
        Some(n) if n.chars().count() > 128 => Err(ModelError::Validation("name too long (<=128)".into())),
        _ => Ok(()),
    }
}
