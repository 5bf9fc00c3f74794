use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::{Expr, Func, LikeExpr, Order};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set, TransactionTrait,
};

use models::{entry, entry_ability, entry_type};

use crate::catalog::domain::{Entry, EntryDraft, OwnerFilter};
use crate::catalog::repository::EntryRepository;
use crate::errors::ServiceError;
use crate::pagination::{Page, PageRequest, Sort, SortDirection, SortField};

pub struct SeaOrmEntryRepository {
    pub db: DatabaseConnection,
}

impl SeaOrmEntryRepository {
    pub fn new(db: DatabaseConnection) -> Self { Self { db } }

    /// Attach tag sets to a batch of rows, preserving row order.
    async fn hydrate<C: ConnectionTrait>(conn: &C, rows: Vec<entry::Model>) -> Result<Vec<Entry>, DbErr> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i64> = rows.iter().map(|m| m.id).collect();
        let mut types: BTreeMap<i64, BTreeSet<String>> = BTreeMap::new();
        for t in entry_type::Entity::find().filter(entry_type::Column::EntryId.is_in(ids.clone())).all(conn).await? {
            types.entry(t.entry_id).or_default().insert(t.tag);
        }
        let mut abilities: BTreeMap<i64, BTreeSet<String>> = BTreeMap::new();
        for a in entry_ability::Entity::find().filter(entry_ability::Column::EntryId.is_in(ids)).all(conn).await? {
            abilities.entry(a.entry_id).or_default().insert(a.tag);
        }
        Ok(rows
            .into_iter()
            .map(|m| {
                let t = types.remove(&m.id).unwrap_or_default();
                let a = abilities.remove(&m.id).unwrap_or_default();
                Entry::from_model(m, t, a)
            })
            .collect())
    }

    async fn hydrate_one<C: ConnectionTrait>(conn: &C, row: entry::Model) -> Result<Entry, DbErr> {
        let mut hydrated = Self::hydrate(conn, vec![row]).await?;
        hydrated.pop().ok_or_else(|| DbErr::RecordNotFound("entry vanished while loading tags".into()))
    }

    async fn insert_tags<C: ConnectionTrait>(conn: &C, entry_id: i64, draft: &EntryDraft) -> Result<(), DbErr> {
        if !draft.types.is_empty() {
            let rows = draft.types.iter().map(|tag| entry_type::ActiveModel {
                entry_id: Set(entry_id),
                tag: Set(tag.clone()),
                ..Default::default()
            });
            entry_type::Entity::insert_many(rows).exec(conn).await?;
        }
        if !draft.abilities.is_empty() {
            let rows = draft.abilities.iter().map(|tag| entry_ability::ActiveModel {
                entry_id: Set(entry_id),
                tag: Set(tag.clone()),
                ..Default::default()
            });
            entry_ability::Entity::insert_many(rows).exec(conn).await?;
        }
        Ok(())
    }

    async fn all_by_id(&self, query: Select<entry::Entity>) -> Result<Vec<Entry>, ServiceError> {
        let rows = query.order_by_asc(entry::Column::Id).all(&self.db).await?;
        Ok(Self::hydrate(&self.db, rows).await?)
    }
}

fn apply_fields(am: &mut entry::ActiveModel, draft: &EntryDraft) {
    am.number = Set(draft.number);
    am.name = Set(draft.name.clone());
    am.description = Set(draft.description.clone());
    am.height_m = Set(draft.height_m);
    am.weight_kg = Set(draft.weight_kg);
    am.base_experience = Set(draft.base_experience);
    am.hp = Set(draft.hp);
    am.attack = Set(draft.attack);
    am.defense = Set(draft.defense);
    am.special_attack = Set(draft.special_attack);
    am.special_defense = Set(draft.special_defense);
    am.speed = Set(draft.speed);
    am.image_url = Set(draft.image_url.clone());
    am.sprite_url = Set(draft.sprite_url.clone());
}

fn ordered(query: Select<entry::Entity>, sort: Sort) -> Select<entry::Entity> {
    let order = match sort.direction {
        SortDirection::Asc => Order::Asc,
        SortDirection::Desc => Order::Desc,
    };
    let query = match sort.field {
        SortField::Id => query,
        SortField::Number => query.order_by(entry::Column::Number, order.clone()),
        SortField::Name => query.order_by(entry::Column::Name, order.clone()),
    };
    query.order_by(entry::Column::Id, if sort.field == SortField::Id { order } else { Order::Asc })
}

/// Escape LIKE metacharacters so the fragment matches literally.
fn like_literal(fragment: &str) -> String {
    let mut out = String::with_capacity(fragment.len() + 2);
    out.push('%');
    for c in fragment.to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('%');
    out
}

#[async_trait]
impl EntryRepository for SeaOrmEntryRepository {
    async fn insert(&self, draft: EntryDraft, owner_id: i64) -> Result<Entry, ServiceError> {
        let now = Utc::now();
        let mut am = entry::ActiveModel {
            owner_id: Set(Some(owner_id)),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        };
        apply_fields(&mut am, &draft);

        let txn = self.db.begin().await?;
        let row = am.insert(&txn).await?;
        Self::insert_tags(&txn, row.id, &draft).await?;
        txn.commit().await?;

        Ok(Entry::from_model(row, draft.types, draft.abilities))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Entry>, ServiceError> {
        match entry::Entity::find_by_id(id).one(&self.db).await? {
            Some(row) => Ok(Some(Self::hydrate_one(&self.db, row).await?)),
            None => Ok(None),
        }
    }

    async fn find_by_number(&self, number: i32) -> Result<Option<Entry>, ServiceError> {
        match entry::Entity::find().filter(entry::Column::Number.eq(number)).one(&self.db).await? {
            Some(row) => Ok(Some(Self::hydrate_one(&self.db, row).await?)),
            None => Ok(None),
        }
    }

    async fn page(&self, filter: OwnerFilter, req: PageRequest) -> Result<Page<Entry>, ServiceError> {
        let query = match filter {
            OwnerFilter::Any => entry::Entity::find(),
            OwnerFilter::Owner(owner) => entry::Entity::find().filter(entry::Column::OwnerId.eq(owner)),
        };
        let paginator = ordered(query, req.sort).paginate(&self.db, req.size);
        let total = paginator.num_items().await?;
        // Pages past the end are empty; never hand an overflowing offset to the store.
        match req.offset() {
            Some(offset) if offset < total => {}
            _ => return Ok(Page::new(Vec::new(), total, req)),
        }
        let rows = paginator.fetch_page(req.page).await?;
        let content = Self::hydrate(&self.db, rows).await?;
        Ok(Page::new(content, total, req))
    }

    async fn find_by_type(&self, tag: &str) -> Result<Vec<Entry>, ServiceError> {
        let ids: Vec<i64> = entry_type::Entity::find()
            .select_only()
            .column(entry_type::Column::EntryId)
            .filter(entry_type::Column::Tag.eq(tag))
            .into_tuple()
            .all(&self.db)
            .await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.all_by_id(entry::Entity::find().filter(entry::Column::Id.is_in(ids))).await
    }

    async fn search_name(&self, fragment: &str) -> Result<Vec<Entry>, ServiceError> {
        let name_lower = Expr::expr(Func::lower(Expr::col((entry::Entity, entry::Column::Name))));
        let query = entry::Entity::find().filter(name_lower.like(LikeExpr::new(like_literal(fragment)).escape('\\')));
        self.all_by_id(query).await
    }

    async fn find_by_number_range(&self, start: i32, end: i32) -> Result<Vec<Entry>, ServiceError> {
        if start > end {
            return Ok(Vec::new());
        }
        self.all_by_id(entry::Entity::find().filter(entry::Column::Number.between(start, end))).await
    }

    async fn replace(&self, id: i64, draft: EntryDraft) -> Result<Option<Entry>, ServiceError> {
        let txn = self.db.begin().await?;
        let Some(current) = entry::Entity::find_by_id(id).one(&txn).await? else { return Ok(None) };
        let clash = entry::Entity::find()
            .filter(entry::Column::Number.eq(draft.number))
            .filter(entry::Column::Id.ne(id))
            .one(&txn)
            .await?;
        if let Some(other) = clash {
            return Err(ServiceError::conflict(format!("entry number {} already held by entry {}", draft.number, other.id)));
        }

        let mut am: entry::ActiveModel = current.into();
        apply_fields(&mut am, &draft);
        am.updated_at = Set(Utc::now().into());
        let row = am.update(&txn).await?;

        entry_type::Entity::delete_many().filter(entry_type::Column::EntryId.eq(id)).exec(&txn).await?;
        entry_ability::Entity::delete_many().filter(entry_ability::Column::EntryId.eq(id)).exec(&txn).await?;
        Self::insert_tags(&txn, id, &draft).await?;
        txn.commit().await?;

        Ok(Some(Entry::from_model(row, draft.types, draft.abilities)))
    }

    async fn delete(&self, id: i64) -> Result<bool, ServiceError> {
        let res = entry::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(res.rows_affected > 0)
    }

    async fn count_by_owner(&self, owner_id: i64) -> Result<u64, ServiceError> {
        Ok(entry::Entity::find().filter(entry::Column::OwnerId.eq(owner_id)).count(&self.db).await?)
    }

    async fn detach_owner(&self, owner_id: i64) -> Result<u64, ServiceError> {
        let now: sea_orm::prelude::DateTimeWithTimeZone = Utc::now().into();
        let res = entry::Entity::update_many()
            .col_expr(entry::Column::OwnerId, Expr::value(Option::<i64>::None))
            .col_expr(entry::Column::UpdatedAt, Expr::value(now))
            .filter(entry::Column::OwnerId.eq(owner_id))
            .exec(&self.db)
            .await?;
        Ok(res.rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::domain::tests::bulbasaur;
    use crate::test_support::{db_tests_disabled, get_db, unique_number, unique_suffix};
    use crate::users::{domain::NewUser, repo::seaorm::SeaOrmUserRepository, repository::UserRepository};
    use models::user::Role;

    #[test]
    fn like_fragment_is_escaped_and_lowered() {
        assert_eq!(like_literal("Bulb"), "%bulb%");
        assert_eq!(like_literal("50%_off"), "%50\\%\\_off%");
    }

    async fn owner(db: &DatabaseConnection) -> Result<i64, anyhow::Error> {
        let tag = unique_suffix();
        let users = SeaOrmUserRepository::new(db.clone());
        let u = users
            .insert(NewUser {
                username: format!("owner_{tag}"),
                email: format!("owner_{tag}@example.com"),
                first_name: None,
                last_name: None,
                password_hash: "digest".into(),
                role: Role::Standard,
            })
            .await?;
        Ok(u.id)
    }

    #[tokio::test]
    async fn insert_enforces_unique_number_and_owner() -> Result<(), anyhow::Error> {
        if db_tests_disabled() { return Ok(()); }
        let db = get_db().await?;
        let repo = SeaOrmEntryRepository::new(db.clone());
        let owner_id = owner(&db).await?;
        let number = unique_number();
        let draft = EntryDraft { number, ..bulbasaur() };

        let created = repo.insert(draft.clone(), owner_id).await?;
        assert_eq!(created.types, draft.types);
        let dup = repo.insert(EntryDraft { name: "Ivysaur".into(), ..draft.clone() }, owner_id).await;
        assert!(matches!(dup, Err(ServiceError::Conflict(_))));

        let ghost = repo.insert(EntryDraft { number: unique_number(), ..draft }, i64::MAX).await;
        assert!(matches!(ghost, Err(ServiceError::NotFound(_))));

        let found = repo.find_by_number(number).await?.expect("by number");
        assert_eq!(found.id, created.id);
        assert_eq!(found.abilities, created.abilities);

        assert!(repo.delete(created.id).await?);
        assert!(!repo.delete(created.id).await?);
        Ok(())
    }

    #[tokio::test]
    async fn replace_overwrites_tags_and_rechecks_number() -> Result<(), anyhow::Error> {
        if db_tests_disabled() { return Ok(()); }
        let db = get_db().await?;
        let repo = SeaOrmEntryRepository::new(db.clone());
        let owner_id = owner(&db).await?;
        let a = repo.insert(EntryDraft { number: unique_number(), ..bulbasaur() }, owner_id).await?;
        let b = repo.insert(EntryDraft { number: unique_number(), ..bulbasaur() }, owner_id).await?;

        let mut replacement = a.draft();
        replacement.name = "Ivysaur".into();
        replacement.types = ["Grass".to_string()].into_iter().collect();
        replacement.abilities.clear();
        let replaced = repo.replace(a.id, replacement.clone()).await?.expect("present");
        assert_eq!(replaced.draft(), replacement);
        assert_eq!(repo.find_by_id(a.id).await?.expect("present").draft(), replacement);

        let clash = repo.replace(a.id, EntryDraft { number: b.number, ..replacement }).await;
        assert!(matches!(clash, Err(ServiceError::Conflict(_))));

        repo.delete(a.id).await?;
        repo.delete(b.id).await?;
        Ok(())
    }

    #[tokio::test]
    async fn queries_and_owner_detach() -> Result<(), anyhow::Error> {
        if db_tests_disabled() { return Ok(()); }
        let db = get_db().await?;
        let repo = SeaOrmEntryRepository::new(db.clone());
        let owner_id = owner(&db).await?;
        let type_tag = format!("Type{}", unique_suffix());
        let start = unique_number();
        let mut ids = Vec::new();
        for (offset, name) in ["Zubat", "Golbat", "Crobat"].iter().enumerate() {
            let mut draft = EntryDraft { number: start + offset as i32, name: format!("{name}{type_tag}"), ..bulbasaur() };
            draft.types.insert(type_tag.clone());
            ids.push(repo.insert(draft, owner_id).await?.id);
        }

        let typed = repo.find_by_type(&type_tag).await?;
        assert_eq!(typed.iter().map(|e| e.id).collect::<Vec<_>>(), ids);
        assert!(repo.find_by_type(&type_tag.to_lowercase()).await?.is_empty());

        let found = repo.search_name(&format!("BAT{}", type_tag.to_uppercase())).await?;
        assert_eq!(found.len(), 3);

        let ranged = repo.find_by_number_range(start, start + 1).await?;
        assert_eq!(ranged.len(), 2);
        assert!(repo.find_by_number_range(start + 1, start).await?.is_empty());

        let page = repo.page(OwnerFilter::Owner(owner_id), PageRequest::new(0, 2)).await?;
        assert_eq!(page.total_elements, 3);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.content.len(), 2);

        let far = repo.page(OwnerFilter::Owner(owner_id), PageRequest::new(u64::MAX, 20)).await?;
        assert!(far.content.is_empty());
        assert_eq!(far.total_elements, 3);

        assert_eq!(repo.count_by_owner(owner_id).await?, 3);
        assert_eq!(repo.detach_owner(owner_id).await?, 3);
        assert_eq!(repo.count_by_owner(owner_id).await?, 0);

        for id in ids { repo.delete(id).await?; }
        SeaOrmUserRepository::new(db).delete(owner_id).await?;
        Ok(())
    }
}
