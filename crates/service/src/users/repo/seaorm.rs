use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};

use models::user;

use crate::errors::ServiceError;
use crate::users::domain::{NewUser, ProfileUpdate, StoredUser, User};
use crate::users::repository::UserRepository;

pub struct SeaOrmUserRepository {
    pub db: DatabaseConnection,
}

impl SeaOrmUserRepository {
    pub fn new(db: DatabaseConnection) -> Self { Self { db } }
}

#[async_trait]
impl UserRepository for SeaOrmUserRepository {
    async fn insert(&self, new_user: NewUser) -> Result<User, ServiceError> {
        let now = Utc::now();
        let am = user::ActiveModel {
            username: Set(new_user.username),
            email: Set(new_user.email),
            first_name: Set(new_user.first_name),
            last_name: Set(new_user.last_name),
            password_hash: Set(new_user.password_hash),
            role: Set(new_user.role),
            active: Set(true),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        };
        Ok(am.insert(&self.db).await?.into())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, ServiceError> {
        Ok(user::Entity::find_by_id(id).one(&self.db).await?.map(User::from))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, ServiceError> {
        Ok(self.find_stored_by_username(username).await?.map(|s| s.user))
    }

    async fn find_stored_by_username(&self, username: &str) -> Result<Option<StoredUser>, ServiceError> {
        let found = user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await?;
        Ok(found.map(|m| {
            let password_hash = m.password_hash.clone();
            StoredUser { user: m.into(), password_hash }
        }))
    }

    async fn list(&self) -> Result<Vec<User>, ServiceError> {
        let rows = user::Entity::find().order_by_asc(user::Column::Id).all(&self.db).await?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn update_profile(&self, id: i64, update: ProfileUpdate) -> Result<Option<User>, ServiceError> {
        let Some(found) = user::Entity::find_by_id(id).one(&self.db).await? else { return Ok(None) };
        let mut am: user::ActiveModel = found.into();
        am.first_name = Set(update.first_name);
        am.last_name = Set(update.last_name);
        am.email = Set(update.email);
        if let Some(hash) = update.password_hash { am.password_hash = Set(hash); }
        am.updated_at = Set(Utc::now().into());
        Ok(Some(am.update(&self.db).await?.into()))
    }

    async fn set_active(&self, id: i64, active: bool) -> Result<bool, ServiceError> {
        let Some(found) = user::Entity::find_by_id(id).one(&self.db).await? else { return Ok(false) };
        let mut am: user::ActiveModel = found.into();
        am.active = Set(active);
        am.updated_at = Set(Utc::now().into());
        am.update(&self.db).await?;
        Ok(true)
    }

    async fn delete(&self, id: i64) -> Result<bool, ServiceError> {
        let res = user::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(res.rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{db_tests_disabled, get_db, unique_suffix};
    use models::user::Role;

    fn new_user(tag: &str) -> NewUser {
        NewUser {
            username: format!("repo_{tag}"),
            email: format!("repo_{tag}@example.com"),
            first_name: None,
            last_name: None,
            password_hash: "digest".into(),
            role: Role::Standard,
        }
    }

    #[tokio::test]
    async fn unique_username_and_email_map_to_conflict() -> Result<(), anyhow::Error> {
        if db_tests_disabled() { return Ok(()); }
        let repo = SeaOrmUserRepository::new(get_db().await?);
        let tag = unique_suffix();
        let created = repo.insert(new_user(&tag)).await?;

        let same_name = NewUser { email: format!("other_{tag}@example.com"), ..new_user(&tag) };
        assert!(matches!(repo.insert(same_name).await, Err(ServiceError::Conflict(_))));

        let same_email = NewUser { username: format!("other_{tag}"), ..new_user(&tag) };
        assert!(matches!(repo.insert(same_email).await, Err(ServiceError::Conflict(_))));

        assert!(repo.delete(created.id).await?);
        assert!(!repo.delete(created.id).await?);
        Ok(())
    }

    #[tokio::test]
    async fn profile_update_and_deactivate() -> Result<(), anyhow::Error> {
        if db_tests_disabled() { return Ok(()); }
        let repo = SeaOrmUserRepository::new(get_db().await?);
        let tag = unique_suffix();
        let created = repo.insert(new_user(&tag)).await?;

        let update = ProfileUpdate {
            first_name: Some("Brock".into()),
            last_name: None,
            email: format!("changed_{tag}@example.com"),
            password_hash: Some("digest2".into()),
        };
        let updated = repo.update_profile(created.id, update).await?.expect("present");
        assert_eq!(updated.first_name.as_deref(), Some("Brock"));
        assert_eq!(updated.username, created.username);

        let stored = repo.find_stored_by_username(&created.username).await?.expect("present");
        assert_eq!(stored.password_hash, "digest2");

        assert!(repo.set_active(created.id, false).await?);
        assert!(!repo.find_by_id(created.id).await?.expect("present").active);

        repo.delete(created.id).await?;
        Ok(())
    }
}
