use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use models::entry as entry_model;
use serde::{Deserialize, Serialize};

use crate::errors::ServiceError;

/// Every caller-settable field of an entry. Create and update both take a full draft;
/// there is no partial update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryDraft {
    pub number: i32,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub height_m: Option<f64>,
    #[serde(default)]
    pub weight_kg: Option<f64>,
    #[serde(default)]
    pub base_experience: Option<i32>,
    pub types: BTreeSet<String>,
    #[serde(default)]
    pub abilities: BTreeSet<String>,
    #[serde(default)]
    pub hp: i32,
    #[serde(default)]
    pub attack: i32,
    #[serde(default)]
    pub defense: i32,
    #[serde(default)]
    pub special_attack: i32,
    #[serde(default)]
    pub special_defense: i32,
    #[serde(default)]
    pub speed: i32,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub sprite_url: Option<String>,
}

impl EntryDraft {
    pub fn validate(&self) -> Result<(), ServiceError> {
        entry_model::validate_number(self.number)?;
        entry_model::validate_name(&self.name)?;
        entry_model::validate_measure("height_m", self.height_m)?;
        entry_model::validate_measure("weight_kg", self.weight_kg)?;
        if let Some(xp) = self.base_experience {
            entry_model::validate_stat("base_experience", xp)?;
        }
        for (field, value) in self.stats() {
            entry_model::validate_stat(field, value)?;
        }
        entry_model::validate_tags("types", &self.types, true)?;
        entry_model::validate_tags("abilities", &self.abilities, false)?;
        Ok(())
    }

    fn stats(&self) -> [(&'static str, i32); 6] {
        [
            ("hp", self.hp),
            ("attack", self.attack),
            ("defense", self.defense),
            ("special_attack", self.special_attack),
            ("special_defense", self.special_defense),
            ("speed", self.speed),
        ]
    }
}

/// Persisted entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: i64,
    pub number: i32,
    pub name: String,
    pub description: Option<String>,
    pub height_m: Option<f64>,
    pub weight_kg: Option<f64>,
    pub base_experience: Option<i32>,
    pub types: BTreeSet<String>,
    pub abilities: BTreeSet<String>,
    pub hp: i32,
    pub attack: i32,
    pub defense: i32,
    pub special_attack: i32,
    pub special_defense: i32,
    pub speed: i32,
    pub image_url: Option<String>,
    pub sprite_url: Option<String>,
    pub owner_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entry {
    pub fn from_draft(id: i64, draft: EntryDraft, owner_id: Option<i64>, created_at: DateTime<Utc>, updated_at: DateTime<Utc>) -> Self {
        Self {
            id,
            number: draft.number,
            name: draft.name,
            description: draft.description,
            height_m: draft.height_m,
            weight_kg: draft.weight_kg,
            base_experience: draft.base_experience,
            types: draft.types,
            abilities: draft.abilities,
            hp: draft.hp,
            attack: draft.attack,
            defense: draft.defense,
            special_attack: draft.special_attack,
            special_defense: draft.special_defense,
            speed: draft.speed,
            image_url: draft.image_url,
            sprite_url: draft.sprite_url,
            owner_id,
            created_at,
            updated_at,
        }
    }

    /// Assemble from a row plus its tag rows.
    pub fn from_model(m: entry_model::Model, types: BTreeSet<String>, abilities: BTreeSet<String>) -> Self {
        Self {
            id: m.id,
            number: m.number,
            name: m.name,
            description: m.description,
            height_m: m.height_m,
            weight_kg: m.weight_kg,
            base_experience: m.base_experience,
            types,
            abilities,
            hp: m.hp,
            attack: m.attack,
            defense: m.defense,
            special_attack: m.special_attack,
            special_defense: m.special_defense,
            speed: m.speed,
            image_url: m.image_url,
            sprite_url: m.sprite_url,
            owner_id: m.owner_id,
            created_at: m.created_at.with_timezone(&Utc),
            updated_at: m.updated_at.with_timezone(&Utc),
        }
    }

    /// The mutable part of this entry, as a draft.
    pub fn draft(&self) -> EntryDraft {
        EntryDraft {
            number: self.number,
            name: self.name.clone(),
            description: self.description.clone(),
            height_m: self.height_m,
            weight_kg: self.weight_kg,
            base_experience: self.base_experience,
            types: self.types.clone(),
            abilities: self.abilities.clone(),
            hp: self.hp,
            attack: self.attack,
            defense: self.defense,
            special_attack: self.special_attack,
            special_defense: self.special_defense,
            speed: self.speed,
            image_url: self.image_url.clone(),
            sprite_url: self.sprite_url.clone(),
        }
    }
}

/// Which entries a paged listing covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerFilter {
    Any,
    Owner(i64),
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn bulbasaur() -> EntryDraft {
        EntryDraft {
            number: 1,
            name: "Bulbasaur".into(),
            description: Some("A strange seed was planted on its back at birth.".into()),
            height_m: Some(0.7),
            weight_kg: Some(6.9),
            base_experience: Some(64),
            types: ["Grass", "Poison"].into_iter().map(String::from).collect(),
            abilities: ["Overgrow"].into_iter().map(String::from).collect(),
            hp: 45,
            attack: 49,
            defense: 49,
            special_attack: 65,
            special_defense: 65,
            speed: 45,
            image_url: None,
            sprite_url: None,
        }
    }

    #[test]
    fn valid_draft_passes() {
        assert!(bulbasaur().validate().is_ok());
    }

    #[test]
    fn rejects_bad_fields() {
        let cases: Vec<Box<dyn Fn(&mut EntryDraft)>> = vec![
            Box::new(|d| d.number = 0),
            Box::new(|d| d.name = "  ".into()),
            Box::new(|d| d.height_m = Some(-1.0)),
            Box::new(|d| d.speed = -3),
            Box::new(|d| d.base_experience = Some(-1)),
            Box::new(|d| d.types.clear()),
            Box::new(|d| { d.abilities.insert(String::new()); }),
        ];
        for mutate in cases {
            let mut d = bulbasaur();
            mutate(&mut d);
            assert!(matches!(d.validate(), Err(ServiceError::Validation(_))), "{d:?}");
        }
    }

    #[test]
    fn draft_round_trips_through_entry() {
        let now = Utc::now();
        let e = Entry::from_draft(3, bulbasaur(), Some(1), now, now);
        assert_eq!(e.draft(), bulbasaur());
    }

    #[test]
    fn tags_deserialize_as_sets() {
        let json = r#"{"number":4,"name":"Charmander","types":["Fire","Fire"]}"#;
        let d: EntryDraft = serde_json::from_str(json).unwrap();
        assert_eq!(d.types.len(), 1);
        assert!(d.abilities.is_empty());
        assert_eq!(d.hp, 0);
    }
}
