use super::domain::{ItemId, Sheet, UserId};
use crate::store::StoreError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::warn;

/// Collection holding one answer document per (user, sheet).
pub const ANSWERS_COLLECTION: &str = "skill_answers";

/// A user's self-assessment for one sheet. Items without an entry are not achieved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerSheet {
    answers: BTreeMap<ItemId, bool>,
}

impl AnswerSheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn achieved(&self, id: ItemId) -> bool {
        self.answers.get(&id).copied().unwrap_or(false)
    }

    pub fn set(&mut self, id: ItemId, achieved: bool) {
        self.answers.insert(id, achieved);
    }

    pub fn iter(&self) -> impl Iterator<Item = (ItemId, bool)> + '_ {
        self.answers.iter().map(|(id, achieved)| (*id, *achieved))
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }
}

impl FromIterator<(ItemId, bool)> for AnswerSheet {
    fn from_iter<T: IntoIterator<Item = (ItemId, bool)>>(iter: T) -> Self {
        Self {
            answers: iter.into_iter().collect(),
        }
    }
}

/// Persisted document shape: answers keyed by the item number as a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub user_id: UserId,
    pub sheet: Sheet,
    #[serde(default)]
    pub answers: BTreeMap<String, bool>,
    pub updated_at: DateTime<Utc>,
}

impl AnswerRecord {
    pub fn new(
        user_id: &UserId,
        sheet: Sheet,
        answers: &AnswerSheet,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id: user_id.clone(),
            sheet,
            answers: answers
                .iter()
                .map(|(id, achieved)| (id.to_string(), achieved))
                .collect(),
            updated_at,
        }
    }

    pub fn document_id(user_id: &UserId, sheet: Sheet) -> String {
        format!("{}_{}", user_id, sheet.file_stem())
    }

    /// Keys that are not item numbers are dropped rather than failing the load.
    pub fn to_sheet(&self) -> AnswerSheet {
        self.answers
            .iter()
            .filter_map(|(key, achieved)| match key.parse::<ItemId>() {
                Ok(id) => Some((id, *achieved)),
                Err(_) => {
                    warn!(
                        user = %self.user_id,
                        sheet = %self.sheet,
                        key = %key,
                        "ignoring stored answer with a non-numeric item key"
                    );
                    None
                }
            })
            .collect()
    }
}

/// Storage abstraction for answer documents.
pub trait AnswerStore: Send + Sync {
    /// Returns an empty sheet when nothing has been saved yet.
    fn get(&self, user_id: &UserId, sheet: Sheet) -> Result<AnswerSheet, StoreError>;
    /// Replaces the whole stored document for (user, sheet).
    fn put(
        &self,
        user_id: &UserId,
        sheet: Sheet,
        answers: &AnswerSheet,
    ) -> Result<AnswerRecord, StoreError>;
}

/// Per-process memo of answer sheets already fetched from the store.
#[derive(Debug, Default)]
pub struct AnswerCache {
    entries: HashMap<(UserId, Sheet), AnswerSheet>,
}

impl AnswerCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load<S>(
        &mut self,
        store: &S,
        user_id: &UserId,
        sheet: Sheet,
    ) -> Result<&AnswerSheet, StoreError>
    where
        S: AnswerStore + ?Sized,
    {
        let key = (user_id.clone(), sheet);
        if !self.entries.contains_key(&key) {
            let answers = store.get(user_id, sheet)?;
            self.entries.insert(key.clone(), answers);
        }
        Ok(&self.entries[&key])
    }

    pub fn invalidate(&mut self, user_id: &UserId, sheet: Sheet) {
        self.entries.remove(&(user_id.clone(), sheet));
    }

    pub fn is_cached(&self, user_id: &UserId, sheet: Sheet) -> bool {
        self.entries.contains_key(&(user_id.clone(), sheet))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::TimeZone;

    fn user() -> UserId {
        UserId::new("alice").expect("valid user")
    }

    #[test]
    fn absent_items_read_as_not_achieved() {
        let sheet: AnswerSheet = [(ItemId(1), true), (ItemId(2), false)].into_iter().collect();
        assert!(sheet.achieved(ItemId(1)));
        assert!(!sheet.achieved(ItemId(2)));
        assert!(!sheet.achieved(ItemId(99)));
    }

    #[test]
    fn record_skips_non_numeric_keys() {
        let mut record = AnswerRecord::new(
            &user(),
            Sheet::Business,
            &[(ItemId(7), true)].into_iter().collect(),
            Utc.with_ymd_and_hms(2025, 4, 1, 9, 0, 0).unwrap(),
        );
        record.answers.insert("legacy".to_string(), true);
        let sheet = record.to_sheet();
        assert_eq!(sheet.len(), 1);
        assert!(sheet.achieved(ItemId(7)));
        assert_eq!(AnswerRecord::document_id(&user(), Sheet::Business), "alice_business");
    }

    #[test]
    fn cache_serves_repeat_loads_until_invalidated() {
        let store = MemoryStore::default();
        let mut cache = AnswerCache::new();
        let first = cache
            .load(&store, &user(), Sheet::DataScience)
            .expect("load succeeds")
            .clone();
        assert!(first.is_empty());
        assert!(cache.is_cached(&user(), Sheet::DataScience));

        let saved: AnswerSheet = [(ItemId(3), true)].into_iter().collect();
        store
            .put(&user(), Sheet::DataScience, &saved)
            .expect("save succeeds");
        let stale = cache
            .load(&store, &user(), Sheet::DataScience)
            .expect("load succeeds");
        assert!(!stale.achieved(ItemId(3)), "cache hides writes until invalidated");

        cache.invalidate(&user(), Sheet::DataScience);
        let fresh = cache
            .load(&store, &user(), Sheet::DataScience)
            .expect("load succeeds");
        assert!(fresh.achieved(ItemId(3)));
    }
}
