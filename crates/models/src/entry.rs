//! `entries` table: one catalog record per creature, uniquely numbered.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::{entry_ability, entry_type, user};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "entries")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub number: i32,
    pub name: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub height_m: Option<f64>,
    pub weight_kg: Option<f64>,
    pub base_experience: Option<i32>,
    pub hp: i32,
    pub attack: i32,
    pub defense: i32,
    pub special_attack: i32,
    pub special_defense: i32,
    pub speed: i32,
    pub image_url: Option<String>,
    pub sprite_url: Option<String>,
    pub owner_id: Option<i64>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { Owner, Types, Abilities }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Owner => Entity::belongs_to(user::Entity)
                .from(Column::OwnerId)
                .to(user::Column::Id)
                .into(),
            Relation::Types => Entity::has_many(entry_type::Entity).into(),
            Relation::Abilities => Entity::has_many(entry_ability::Entity).into(),
        }
    }
}

impl Related<user::Entity> for Entity {
    fn to() -> RelationDef { Relation::Owner.def() }
}

impl Related<entry_type::Entity> for Entity {
    fn to() -> RelationDef { Relation::Types.def() }
}

impl Related<entry_ability::Entity> for Entity {
    fn to() -> RelationDef { Relation::Abilities.def() }
}

impl ActiveModelBehavior for ActiveModel {}

pub fn validate_number(number: i32) -> Result<(), ModelError> {
    if number < 1 { return Err(ModelError::Validation("entry number must be positive".into())); }
    Ok(())
}

pub fn validate_name(name: &str) -> Result<(), ModelError> {
    if name.trim().is_empty() { return Err(ModelError::Validation("name required".into())); }
    if name.chars().count() > 128 { return Err(ModelError::Validation("name too long (<=128)".into())); }
    Ok(())
}

/// Height and weight are optional; a present value must be a positive finite number.
pub fn validate_measure(field: &str, value: Option<f64>) -> Result<(), ModelError> {
    match value {
        Some(v) if !v.is_finite() || v <= 0.0 => Err(ModelError::Validation(format!("{field} must be positive"))),
        _ => Ok(()),
    }
}

pub fn validate_stat(field: &str, value: i32) -> Result<(), ModelError> {
    if value < 0 { return Err(ModelError::Validation(format!("{field} must not be negative"))); }
    Ok(())
}

/// Type tags: at least one, none blank. Ability tags may be empty but none blank.
pub fn validate_tags<'a>(field: &str, tags: impl IntoIterator<Item = &'a String>, required: bool) -> Result<(), ModelError> {
    let mut count = 0usize;
    for tag in tags {
        if tag.trim().is_empty() { return Err(ModelError::Validation(format!("{field} must not contain blank values"))); }
        if tag.chars().count() > 64 { return Err(ModelError::Validation(format!("{field} values too long (<=64)"))); }
        count += 1;
    }
    if required && count == 0 { return Err(ModelError::Validation(format!("{field} must not be empty"))); }
    Ok(())
}
