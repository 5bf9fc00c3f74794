use async_trait::async_trait;

use super::domain::{NewUser, ProfileUpdate, StoredUser, User};
use crate::errors::ServiceError;

/// Repository abstraction for user persistence.
///
/// Uniqueness of username and email is enforced atomically with the write: `insert` and
/// `update_profile` fail with `Conflict` on a collision.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn insert(&self, new_user: NewUser) -> Result<User, ServiceError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, ServiceError>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, ServiceError>;
    async fn find_stored_by_username(&self, username: &str) -> Result<Option<StoredUser>, ServiceError>;
    /// All users, id ascending.
    async fn list(&self) -> Result<Vec<User>, ServiceError>;
    async fn update_profile(&self, id: i64, update: ProfileUpdate) -> Result<Option<User>, ServiceError>;
    /// Returns false when the id is absent.
    async fn set_active(&self, id: i64, active: bool) -> Result<bool, ServiceError>;
    async fn delete(&self, id: i64) -> Result<bool, ServiceError>;
}

/// Simple in-memory mock repository for tests and doc examples
pub mod mock {
    use super::*;
    use chrono::Utc;
    use std::collections::BTreeMap;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct State {
        next_id: i64,
        rows: BTreeMap<i64, StoredUser>,
    }

    impl State {
        fn taken(&self, username: Option<&str>, email: &str, except: Option<i64>) -> Option<&'static str> {
            for (id, row) in &self.rows {
                if Some(*id) == except { continue; }
                if username == Some(row.user.username.as_str()) { return Some("username already exists"); }
                if row.user.email == email { return Some("email already exists"); }
            }
            None
        }
    }

    /// The lock is held across check and write, so uniqueness holds under concurrent callers.
    #[derive(Default)]
    pub struct MockUserRepository {
        state: Mutex<State>,
    }

    #[async_trait]
    impl UserRepository for MockUserRepository {
        async fn insert(&self, new_user: NewUser) -> Result<User, ServiceError> {
            let mut st = self.state.lock().await;
            if let Some(msg) = st.taken(Some(&new_user.username), &new_user.email, None) {
                return Err(ServiceError::conflict(msg));
            }
            st.next_id += 1;
            let now = Utc::now();
            let user = User {
                id: st.next_id,
                username: new_user.username,
                email: new_user.email,
                first_name: new_user.first_name,
                last_name: new_user.last_name,
                role: new_user.role,
                active: true,
                created_at: now,
                updated_at: now,
            };
            st.rows.insert(user.id, StoredUser { user: user.clone(), password_hash: new_user.password_hash });
            Ok(user)
        }

        async fn find_by_id(&self, id: i64) -> Result<Option<User>, ServiceError> {
            Ok(self.state.lock().await.rows.get(&id).map(|r| r.user.clone()))
        }

        async fn find_by_username(&self, username: &str) -> Result<Option<User>, ServiceError> {
            Ok(self.find_stored_by_username(username).await?.map(|r| r.user))
        }

        async fn find_stored_by_username(&self, username: &str) -> Result<Option<StoredUser>, ServiceError> {
            let st = self.state.lock().await;
            Ok(st.rows.values().find(|r| r.user.username == username).cloned())
        }

        async fn list(&self) -> Result<Vec<User>, ServiceError> {
            Ok(self.state.lock().await.rows.values().map(|r| r.user.clone()).collect())
        }

        async fn update_profile(&self, id: i64, update: ProfileUpdate) -> Result<Option<User>, ServiceError> {
            let mut st = self.state.lock().await;
            if !st.rows.contains_key(&id) { return Ok(None); }
            if let Some(msg) = st.taken(None, &update.email, Some(id)) {
                return Err(ServiceError::conflict(msg));
            }
            let Some(row) = st.rows.get_mut(&id) else { return Ok(None) };
            row.user.first_name = update.first_name;
            row.user.last_name = update.last_name;
            row.user.email = update.email;
            if let Some(hash) = update.password_hash { row.password_hash = hash; }
            row.user.updated_at = Utc::now();
            Ok(Some(row.user.clone()))
        }

        async fn set_active(&self, id: i64, active: bool) -> Result<bool, ServiceError> {
            let mut st = self.state.lock().await;
            match st.rows.get_mut(&id) {
                Some(row) => {
                    row.user.active = active;
                    row.user.updated_at = Utc::now();
                    Ok(true)
                }
                None => Ok(false),
            }
        }

        async fn delete(&self, id: i64) -> Result<bool, ServiceError> {
            Ok(self.state.lock().await.rows.remove(&id).is_some())
        }
    }
}
