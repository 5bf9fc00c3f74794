use async_trait::async_trait;

use super::domain::{Entry, EntryDraft, OwnerFilter};
use crate::errors::ServiceError;
use crate::pagination::{Page, PageRequest};

/// Repository abstraction for catalog entries.
///
/// The entry number is unique: `insert` and `replace` fail with `Conflict` when another
/// entry already holds it, atomically with the write. Plain listings are id ascending.
#[async_trait]
pub trait EntryRepository: Send + Sync {
    async fn insert(&self, draft: EntryDraft, owner_id: i64) -> Result<Entry, ServiceError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Entry>, ServiceError>;
    async fn find_by_number(&self, number: i32) -> Result<Option<Entry>, ServiceError>;
    async fn page(&self, filter: OwnerFilter, req: PageRequest) -> Result<Page<Entry>, ServiceError>;
    /// Exact, case-sensitive tag match.
    async fn find_by_type(&self, tag: &str) -> Result<Vec<Entry>, ServiceError>;
    /// Case-insensitive substring match on the name.
    async fn search_name(&self, fragment: &str) -> Result<Vec<Entry>, ServiceError>;
    /// Inclusive on both ends.
    async fn find_by_number_range(&self, start: i32, end: i32) -> Result<Vec<Entry>, ServiceError>;
    /// Overwrite every mutable field, tag sets included. Owner and creation time are kept.
    async fn replace(&self, id: i64, draft: EntryDraft) -> Result<Option<Entry>, ServiceError>;
    async fn delete(&self, id: i64) -> Result<bool, ServiceError>;
    async fn count_by_owner(&self, owner_id: i64) -> Result<u64, ServiceError>;
    /// Clear the owner of every entry owned by `owner_id`; returns how many changed.
    async fn detach_owner(&self, owner_id: i64) -> Result<u64, ServiceError>;
}

/// Simple in-memory mock repository for tests and doc examples
pub mod mock {
    use super::*;
    use crate::pagination::{SortDirection, SortField};
    use chrono::Utc;
    use std::cmp::Ordering;
    use std::collections::BTreeMap;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct State {
        next_id: i64,
        rows: BTreeMap<i64, Entry>,
    }

    impl State {
        fn number_taken(&self, number: i32, except: Option<i64>) -> bool {
            self.rows.values().any(|e| e.number == number && Some(e.id) != except)
        }

        fn matching(&self, pred: impl Fn(&Entry) -> bool) -> Vec<Entry> {
            self.rows.values().filter(|e| pred(e)).cloned().collect()
        }
    }

    /// The lock is held across check and write, so number uniqueness holds under concurrent callers.
    #[derive(Default)]
    pub struct MockEntryRepository {
        state: Mutex<State>,
    }

    impl MockEntryRepository {
        pub async fn len(&self) -> usize { self.state.lock().await.rows.len() }

        pub async fn is_empty(&self) -> bool { self.len().await == 0 }
    }

    fn compare(a: &Entry, b: &Entry, field: SortField) -> Ordering {
        let primary = match field {
            SortField::Id => Ordering::Equal,
            SortField::Number => a.number.cmp(&b.number),
            SortField::Name => a.name.cmp(&b.name),
        };
        primary.then(a.id.cmp(&b.id))
    }

    #[async_trait]
    impl EntryRepository for MockEntryRepository {
        async fn insert(&self, draft: EntryDraft, owner_id: i64) -> Result<Entry, ServiceError> {
            let mut st = self.state.lock().await;
            if st.number_taken(draft.number, None) {
                return Err(ServiceError::conflict(format!("entry number {} already exists", draft.number)));
            }
            st.next_id += 1;
            let now = Utc::now();
            let entry = Entry::from_draft(st.next_id, draft, Some(owner_id), now, now);
            st.rows.insert(entry.id, entry.clone());
            Ok(entry)
        }

        async fn find_by_id(&self, id: i64) -> Result<Option<Entry>, ServiceError> {
            Ok(self.state.lock().await.rows.get(&id).cloned())
        }

        async fn find_by_number(&self, number: i32) -> Result<Option<Entry>, ServiceError> {
            Ok(self.state.lock().await.rows.values().find(|e| e.number == number).cloned())
        }

        async fn page(&self, filter: OwnerFilter, req: PageRequest) -> Result<Page<Entry>, ServiceError> {
            let st = self.state.lock().await;
            let mut all = st.matching(|e| match filter {
                OwnerFilter::Any => true,
                OwnerFilter::Owner(owner) => e.owner_id == Some(owner),
            });
            all.sort_by(|a, b| {
                let ord = compare(a, b, req.sort.field);
                match req.sort.direction {
                    SortDirection::Asc => ord,
                    SortDirection::Desc => ord.reverse(),
                }
            });
            let total = all.len() as u64;
            let content = match req.offset() {
                Some(offset) => all.into_iter().skip(offset as usize).take(req.size as usize).collect(),
                None => Vec::new(),
            };
            Ok(Page::new(content, total, req))
        }

        async fn find_by_type(&self, tag: &str) -> Result<Vec<Entry>, ServiceError> {
            Ok(self.state.lock().await.matching(|e| e.types.contains(tag)))
        }

        async fn search_name(&self, fragment: &str) -> Result<Vec<Entry>, ServiceError> {
            let needle = fragment.to_lowercase();
            Ok(self.state.lock().await.matching(|e| e.name.to_lowercase().contains(&needle)))
        }

        async fn find_by_number_range(&self, start: i32, end: i32) -> Result<Vec<Entry>, ServiceError> {
            Ok(self.state.lock().await.matching(|e| start <= e.number && e.number <= end))
        }

        async fn replace(&self, id: i64, draft: EntryDraft) -> Result<Option<Entry>, ServiceError> {
            let mut st = self.state.lock().await;
            let Some(current) = st.rows.get(&id).cloned() else { return Ok(None) };
            if st.number_taken(draft.number, Some(id)) {
                return Err(ServiceError::conflict(format!("entry number {} already exists", draft.number)));
            }
            let replaced = Entry::from_draft(id, draft, current.owner_id, current.created_at, Utc::now());
            st.rows.insert(id, replaced.clone());
            Ok(Some(replaced))
        }

        async fn delete(&self, id: i64) -> Result<bool, ServiceError> {
            Ok(self.state.lock().await.rows.remove(&id).is_some())
        }

        async fn count_by_owner(&self, owner_id: i64) -> Result<u64, ServiceError> {
            let st = self.state.lock().await;
            Ok(st.rows.values().filter(|e| e.owner_id == Some(owner_id)).count() as u64)
        }

        async fn detach_owner(&self, owner_id: i64) -> Result<u64, ServiceError> {
            let mut st = self.state.lock().await;
            let now = Utc::now();
            let mut changed = 0;
            for e in st.rows.values_mut().filter(|e| e.owner_id == Some(owner_id)) {
                e.owner_id = None;
                e.updated_at = now;
                changed += 1;
            }
            Ok(changed)
        }
    }
}
