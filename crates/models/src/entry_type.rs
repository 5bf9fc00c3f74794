//! Type tags ("Grass", "Poison", ...) attached to an entry.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::entry;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "entry_types")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub entry_id: i64,
    pub tag: String,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { Entry }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Entry => Entity::belongs_to(entry::Entity)
                .from(Column::EntryId)
                .to(entry::Column::Id)
                .into(),
        }
    }
}

impl Related<entry::Entity> for Entity {
    fn to() -> RelationDef { Relation::Entry.def() }
}

impl ActiveModelBehavior for ActiveModel {}
