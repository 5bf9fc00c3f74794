use std::sync::Arc;

use configs::OwnerDeletePolicy;
use tracing::{debug, info, instrument};

use super::domain::{Entry, EntryDraft, OwnerFilter};
use super::repository::EntryRepository;
use crate::access::AuthContext;
use crate::errors::ServiceError;
use crate::pagination::{Page, PageRequest};
use crate::users::UserDirectory;

/// Catalog operations. Owner links are always resolved through the user directory.
pub struct CatalogService {
    repo: Arc<dyn EntryRepository>,
    users: Arc<UserDirectory>,
    max_page_size: u64,
}

impl CatalogService {
    pub fn new(repo: Arc<dyn EntryRepository>, users: Arc<UserDirectory>, max_page_size: u64) -> Self {
        Self { repo, users, max_page_size }
    }

    /// Create an entry owned by `owner_id`.
    ///
    /// # Examples
    /// ```
    /// use service::catalog::{CatalogService, domain::EntryDraft, repository::mock::MockEntryRepository};
    /// use service::users::{UserDirectory, domain::RegisterInput, repository::mock::MockUserRepository};
    /// use service::credentials::CredentialService;
    /// use std::sync::Arc;
    /// let creds = Arc::new(CredentialService::new("secret", chrono::Duration::minutes(5)));
    /// let users = Arc::new(UserDirectory::new(Arc::new(MockUserRepository::default()), creds));
    /// let catalog = CatalogService::new(Arc::new(MockEntryRepository::default()), users.clone(), 100);
    /// let ash = tokio_test::block_on(users.register(RegisterInput {
    ///     username: "ash".into(), email: "ash@example.com".into(), first_name: None, last_name: None, password: "pikachu".into(),
    /// })).unwrap();
    /// let draft: EntryDraft = serde_json::from_str(r#"{"number":25,"name":"Pikachu","types":["Electric"]}"#).unwrap();
    /// let entry = tokio_test::block_on(catalog.create(draft, ash.id)).unwrap();
    /// assert_eq!(entry.owner_id, Some(ash.id));
    /// ```
    #[instrument(skip(self, draft), fields(number = draft.number))]
    pub async fn create(&self, draft: EntryDraft, owner_id: i64) -> Result<Entry, ServiceError> {
        draft.validate()?;
        if self.users.get_by_id(owner_id).await?.is_none() {
            return Err(ServiceError::not_found("owner"));
        }
        if let Some(existing) = self.repo.find_by_number(draft.number).await? {
            debug!(entry_id = existing.id, "number taken");
            return Err(ServiceError::conflict(format!("entry number {} already exists", draft.number)));
        }
        let entry = self.repo.insert(draft, owner_id).await?;
        info!(entry_id = entry.id, number = entry.number, owner_id, "entry_created");
        Ok(entry)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<Entry>, ServiceError> { self.repo.find_by_id(id).await }

    pub async fn get_by_number(&self, number: i32) -> Result<Option<Entry>, ServiceError> {
        self.repo.find_by_number(number).await
    }

    pub async fn list_paged(&self, req: PageRequest) -> Result<Page<Entry>, ServiceError> {
        self.repo.page(OwnerFilter::Any, req.normalize(self.max_page_size)).await
    }

    pub async fn list_by_type(&self, type_tag: &str) -> Result<Vec<Entry>, ServiceError> {
        self.repo.find_by_type(type_tag).await
    }

    pub async fn search_by_name(&self, fragment: &str) -> Result<Vec<Entry>, ServiceError> {
        self.repo.search_name(fragment).await
    }

    /// Inclusive; an inverted range is empty rather than an error.
    pub async fn list_by_number_range(&self, start: i32, end: i32) -> Result<Vec<Entry>, ServiceError> {
        if start > end {
            return Ok(Vec::new());
        }
        self.repo.find_by_number_range(start, end).await
    }

    pub async fn list_by_owner(&self, owner_id: i64, req: PageRequest) -> Result<Page<Entry>, ServiceError> {
        self.repo.page(OwnerFilter::Owner(owner_id), req.normalize(self.max_page_size)).await
    }

    /// Unknown usernames yield an empty page.
    pub async fn list_by_owner_username(&self, username: &str, req: PageRequest) -> Result<Page<Entry>, ServiceError> {
        let req = req.normalize(self.max_page_size);
        match self.users.get_by_username(username).await? {
            Some(owner) => self.repo.page(OwnerFilter::Owner(owner.id), req).await,
            None => Ok(Page::empty(req)),
        }
    }

    /// Full replacement of every mutable field. A number held by another entry is a conflict.
    #[instrument(skip(self, draft), fields(number = draft.number))]
    pub async fn update(&self, id: i64, draft: EntryDraft) -> Result<Option<Entry>, ServiceError> {
        draft.validate()?;
        if self.repo.find_by_id(id).await?.is_none() {
            return Ok(None);
        }
        if let Some(existing) = self.repo.find_by_number(draft.number).await? {
            if existing.id != id {
                return Err(ServiceError::conflict(format!("entry number {} already exists", draft.number)));
            }
        }
        let updated = self.repo.replace(id, draft).await?;
        if let Some(e) = &updated {
            info!(entry_id = e.id, number = e.number, "entry_updated");
        }
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<bool, ServiceError> {
        let removed = self.repo.delete(id).await?;
        if removed {
            info!(entry_id = id, "entry_deleted");
        }
        Ok(removed)
    }

    /// `update` for a caller who must own the entry or be an admin.
    pub async fn update_as(&self, caller: &AuthContext, id: i64, draft: EntryDraft) -> Result<Option<Entry>, ServiceError> {
        let Some(current) = self.repo.find_by_id(id).await? else { return Ok(None) };
        caller.require_owner_or_admin(current.owner_id)?;
        self.update(id, draft).await
    }

    /// `delete` for a caller who must own the entry or be an admin.
    pub async fn delete_as(&self, caller: &AuthContext, id: i64) -> Result<bool, ServiceError> {
        let Some(current) = self.repo.find_by_id(id).await? else { return Ok(false) };
        caller.require_owner_or_admin(current.owner_id)?;
        self.delete(id).await
    }

    /// Delete a user account, applying `policy` to the entries it owns.
    ///
    /// `Reject` fails with `Conflict` while the user owns entries; `Detach` clears their
    /// owner first. Returns false when the user does not exist.
    #[instrument(skip(self))]
    pub async fn remove_owner(&self, user_id: i64, policy: OwnerDeletePolicy) -> Result<bool, ServiceError> {
        if self.users.get_by_id(user_id).await?.is_none() {
            return Ok(false);
        }
        match policy {
            OwnerDeletePolicy::Reject => {
                let owned = self.repo.count_by_owner(user_id).await?;
                if owned > 0 {
                    return Err(ServiceError::conflict(format!("user owns {owned} entries")));
                }
            }
            OwnerDeletePolicy::Detach => {
                let detached = self.repo.detach_owner(user_id).await?;
                info!(user_id, detached, "entries_detached");
            }
        }
        self.users.delete(user_id).await
    }
}
