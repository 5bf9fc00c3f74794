use std::sync::Arc;

use configs::AdminSeed;
use models::user::{self as user_model, Role};
use tracing::{debug, info, instrument, warn};

use super::domain::{AuthSession, NewUser, ProfileUpdate, RegisterInput, User, UserPatch};
use super::repository::UserRepository;
use crate::credentials::CredentialService;
use crate::errors::ServiceError;

/// User directory: registration, login and account maintenance.
///
/// Role checks live with the caller (`AuthContext`); this service trusts that the request
/// was already authorized.
pub struct UserDirectory {
    repo: Arc<dyn UserRepository>,
    credentials: Arc<CredentialService>,
}

impl UserDirectory {
    pub fn new(repo: Arc<dyn UserRepository>, credentials: Arc<CredentialService>) -> Self { Self { repo, credentials } }

    fn validate_profile(email: &str, first_name: Option<&str>, last_name: Option<&str>) -> Result<(), ServiceError> {
        user_model::validate_email(email)?;
        user_model::validate_name(first_name)?;
        user_model::validate_name(last_name)?;
        Ok(())
    }

    /// Register a new STANDARD user with a hashed password.
    ///
    /// # Examples
    /// ```
    /// use service::users::{UserDirectory, domain::RegisterInput, repository::mock::MockUserRepository};
    /// use service::credentials::CredentialService;
    /// use std::sync::Arc;
    /// let creds = Arc::new(CredentialService::new("secret", chrono::Duration::minutes(5)));
    /// let dir = UserDirectory::new(Arc::new(MockUserRepository::default()), creds);
    /// let input = RegisterInput { username: "ash".into(), email: "ash@example.com".into(), first_name: None, last_name: None, password: "pikachu".into() };
    /// let user = tokio_test::block_on(dir.register(input)).unwrap();
    /// assert_eq!(user.role, models::user::Role::Standard);
    /// assert!(user.active);
    /// ```
    #[instrument(skip(self, input), fields(username = %input.username))]
    pub async fn register(&self, input: RegisterInput) -> Result<User, ServiceError> {
        self.create(input, Role::Standard).await
    }

    async fn create(&self, input: RegisterInput, role: Role) -> Result<User, ServiceError> {
        user_model::validate_username(&input.username)?;
        Self::validate_profile(&input.email, input.first_name.as_deref(), input.last_name.as_deref())?;
        if input.password.is_empty() {
            return Err(ServiceError::Validation("password required".into()));
        }
        if let Some(existing) = self.repo.find_by_username(&input.username).await? {
            debug!(user_id = existing.id, "username taken");
            return Err(ServiceError::conflict("username already exists"));
        }

        let password_hash = self.credentials.hash(&input.password)?;
        let user = self
            .repo
            .insert(NewUser {
                username: input.username,
                email: input.email,
                first_name: input.first_name,
                last_name: input.last_name,
                password_hash,
                role,
            })
            .await?;
        info!(user_id = user.id, username = %user.username, role = ?user.role, "user_registered");
        Ok(user)
    }

    /// Verify credentials and issue a token bound to the user's id and role.
    ///
    /// Unknown usernames, inactive accounts and wrong passwords are indistinguishable to
    /// the caller.
    #[instrument(skip(self, password))]
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<AuthSession, ServiceError> {
        let rejected = || ServiceError::Unauthorized("invalid credentials".into());
        let Some(stored) = self.repo.find_stored_by_username(username).await? else {
            warn!("login for unknown username");
            return Err(rejected());
        };
        if !stored.user.active {
            warn!(user_id = stored.user.id, "login for inactive account");
            return Err(rejected());
        }
        if !self.credentials.verify(password, &stored.password_hash) {
            warn!(user_id = stored.user.id, "password mismatch");
            return Err(rejected());
        }
        let token = self.credentials.issue(stored.user.id, &stored.user.username, stored.user.role)?;
        info!(user_id = stored.user.id, "user_logged_in");
        Ok(AuthSession { user: stored.user, token })
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>, ServiceError> { self.repo.find_by_id(id).await }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>, ServiceError> {
        self.repo.find_by_username(username).await
    }

    pub async fn list_all(&self) -> Result<Vec<User>, ServiceError> { self.repo.list().await }

    /// Overwrite names and email; re-hash only when a non-empty password is supplied.
    #[instrument(skip(self, patch))]
    pub async fn update(&self, id: i64, patch: UserPatch) -> Result<Option<User>, ServiceError> {
        Self::validate_profile(&patch.email, patch.first_name.as_deref(), patch.last_name.as_deref())?;
        let password_hash = match patch.password.as_deref() {
            Some(p) if !p.is_empty() => Some(self.credentials.hash(p)?),
            _ => None,
        };
        let update = ProfileUpdate {
            first_name: patch.first_name,
            last_name: patch.last_name,
            email: patch.email,
            password_hash,
        };
        let updated = self.repo.update_profile(id, update).await?;
        if updated.is_some() {
            info!(user_id = id, "user_updated");
        }
        Ok(updated)
    }

    /// Idempotent; false only when the id is absent.
    #[instrument(skip(self))]
    pub async fn deactivate(&self, id: i64) -> Result<bool, ServiceError> {
        let done = self.repo.set_active(id, false).await?;
        if done {
            info!(user_id = id, "user_deactivated");
        }
        Ok(done)
    }

    /// Removes the account row only; entry ownership is handled by `CatalogService::remove_owner`.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<bool, ServiceError> {
        let removed = self.repo.delete(id).await?;
        if removed {
            info!(user_id = id, "user_deleted");
        }
        Ok(removed)
    }

    /// Create the configured ADMIN account when its username is still free.
    #[instrument(skip(self, seed), fields(username = %seed.username))]
    pub async fn ensure_admin(&self, seed: &AdminSeed) -> Result<User, ServiceError> {
        if let Some(existing) = self.repo.find_by_username(&seed.username).await? {
            if existing.role != Role::Admin {
                warn!(user_id = existing.id, "bootstrap admin username belongs to a standard account");
            }
            return Ok(existing);
        }
        let input = RegisterInput {
            username: seed.username.clone(),
            email: seed.email.clone(),
            first_name: None,
            last_name: None,
            password: seed.password.clone(),
        };
        self.create(input, Role::Admin).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::repository::mock::MockUserRepository;

    fn directory() -> UserDirectory {
        let creds = Arc::new(CredentialService::new("test-secret", chrono::Duration::minutes(10)));
        UserDirectory::new(Arc::new(MockUserRepository::default()), creds)
    }

    fn input(username: &str, email: &str, password: &str) -> RegisterInput {
        RegisterInput {
            username: username.into(),
            email: email.into(),
            first_name: Some("Ash".into()),
            last_name: Some("Ketchum".into()),
            password: password.into(),
        }
    }

    #[tokio::test]
    async fn register_then_authenticate_scenario() {
        let dir = directory();
        let ash = dir.register(input("ash", "ash@example.com", "pikachu")).await.unwrap();
        assert_eq!(ash.role, Role::Standard);
        assert!(ash.active);

        let dup = dir.register(input("ash", "other@example.com", "pikachu")).await;
        assert!(matches!(dup, Err(ServiceError::Conflict(_))));

        let wrong = dir.authenticate("ash", "wrongpassword").await;
        assert!(matches!(wrong, Err(ServiceError::Unauthorized(_))));

        let session = dir.authenticate("ash", "pikachu").await.unwrap();
        assert!(!session.token.is_empty());
        assert_eq!(session.user.id, ash.id);
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let dir = directory();
        dir.register(input("ash", "ash@example.com", "pw")).await.unwrap();
        let dup = dir.register(input("gary", "ash@example.com", "pw")).await;
        assert!(matches!(dup, Err(ServiceError::Conflict(_))));
    }

    #[tokio::test]
    async fn username_uniqueness_is_case_sensitive() {
        let dir = directory();
        dir.register(input("ash", "ash@example.com", "pw")).await.unwrap();
        assert!(dir.register(input("Ash", "ash2@example.com", "pw")).await.is_ok());
    }

    #[tokio::test]
    async fn collision_with_inactive_user_still_conflicts() {
        let dir = directory();
        let ash = dir.register(input("ash", "ash@example.com", "pw")).await.unwrap();
        assert!(dir.deactivate(ash.id).await.unwrap());
        let dup = dir.register(input("ash", "ash3@example.com", "pw")).await;
        assert!(matches!(dup, Err(ServiceError::Conflict(_))));
    }

    #[tokio::test]
    async fn inactive_user_cannot_authenticate() {
        let dir = directory();
        let ash = dir.register(input("ash", "ash@example.com", "pikachu")).await.unwrap();
        assert!(dir.deactivate(ash.id).await.unwrap());
        assert!(dir.deactivate(ash.id).await.unwrap());
        assert!(matches!(dir.authenticate("ash", "pikachu").await, Err(ServiceError::Unauthorized(_))));
        assert!(!dir.deactivate(999).await.unwrap());
    }

    #[tokio::test]
    async fn unknown_user_is_unauthorized() {
        let dir = directory();
        assert!(matches!(dir.authenticate("nobody", "x").await, Err(ServiceError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn register_validates_fields() {
        let dir = directory();
        assert!(matches!(dir.register(input("", "a@b.c", "pw")).await, Err(ServiceError::Validation(_))));
        assert!(matches!(dir.register(input("misty", "not-an-email", "pw")).await, Err(ServiceError::Validation(_))));
        assert!(matches!(dir.register(input("misty", "m@b.c", "")).await, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn update_overwrites_profile_and_optionally_password() {
        let dir = directory();
        let ash = dir.register(input("ash", "ash@example.com", "pikachu")).await.unwrap();

        let patch = UserPatch { first_name: None, last_name: Some("K".into()), email: "ash@kanto.org".into(), password: None };
        let updated = dir.update(ash.id, patch).await.unwrap().unwrap();
        assert_eq!(updated.first_name, None);
        assert_eq!(updated.last_name.as_deref(), Some("K"));
        assert_eq!(updated.email, "ash@kanto.org");
        assert_eq!(updated.username, "ash");
        assert_eq!(updated.role, Role::Standard);
        assert!(dir.authenticate("ash", "pikachu").await.is_ok());

        let patch = UserPatch { first_name: None, last_name: None, email: "ash@kanto.org".into(), password: Some("raichu".into()) };
        dir.update(ash.id, patch).await.unwrap();
        assert!(dir.authenticate("ash", "pikachu").await.is_err());
        assert!(dir.authenticate("ash", "raichu").await.is_ok());

        let patch = UserPatch { first_name: None, last_name: None, email: "x@y.z".into(), password: None };
        assert!(dir.update(999, patch).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_rejects_email_of_another_user() {
        let dir = directory();
        dir.register(input("ash", "ash@example.com", "pw")).await.unwrap();
        let misty = dir.register(input("misty", "misty@example.com", "pw")).await.unwrap();
        let patch = UserPatch { first_name: None, last_name: None, email: "ash@example.com".into(), password: None };
        assert!(matches!(dir.update(misty.id, patch).await, Err(ServiceError::Conflict(_))));
    }

    #[tokio::test]
    async fn list_is_ordered_and_delete_reports_absence() {
        let dir = directory();
        let a = dir.register(input("a", "a@example.com", "pw")).await.unwrap();
        let b = dir.register(input("b", "b@example.com", "pw")).await.unwrap();
        let ids: Vec<i64> = dir.list_all().await.unwrap().iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![a.id, b.id]);

        assert!(dir.delete(a.id).await.unwrap());
        assert!(!dir.delete(a.id).await.unwrap());
        assert!(dir.get_by_id(a.id).await.unwrap().is_none());
        assert_eq!(dir.get_by_username("b").await.unwrap().map(|u| u.id), Some(b.id));
    }

    #[tokio::test]
    async fn ensure_admin_is_idempotent() {
        let dir = directory();
        let seed = AdminSeed { username: "oak".into(), email: "oak@example.com".into(), password: "professor".into() };
        let first = dir.ensure_admin(&seed).await.unwrap();
        let second = dir.ensure_admin(&seed).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(first.role, Role::Admin);
        let session = dir.authenticate("oak", "professor").await.unwrap();
        assert_eq!(session.user.role, Role::Admin);
    }
}
