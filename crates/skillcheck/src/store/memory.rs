use super::StoreError;
use crate::auth::{CredentialStore, SessionRecord, SessionStore, UserCredential};
use crate::checklist::answers::{AnswerRecord, AnswerSheet, AnswerStore};
use crate::checklist::domain::{Sheet, UserId};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Process-local store for tests and embedding; nothing survives a restart.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    answers: Arc<Mutex<HashMap<(UserId, Sheet), AnswerRecord>>>,
    users: Arc<Mutex<HashMap<UserId, UserCredential>>>,
    sessions: Arc<Mutex<HashMap<UserId, SessionRecord>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, StoreError> {
    mutex
        .lock()
        .map_err(|_| StoreError::Unavailable("memory store mutex poisoned".to_string()))
}

impl MemoryStore {
    pub fn record(&self, user_id: &UserId, sheet: Sheet) -> Option<AnswerRecord> {
        lock(&self.answers)
            .ok()?
            .get(&(user_id.clone(), sheet))
            .cloned()
    }
}

impl AnswerStore for MemoryStore {
    fn get(&self, user_id: &UserId, sheet: Sheet) -> Result<AnswerSheet, StoreError> {
        let guard = lock(&self.answers)?;
        Ok(guard
            .get(&(user_id.clone(), sheet))
            .map(AnswerRecord::to_sheet)
            .unwrap_or_default())
    }

    fn put(
        &self,
        user_id: &UserId,
        sheet: Sheet,
        answers: &AnswerSheet,
    ) -> Result<AnswerRecord, StoreError> {
        let record = AnswerRecord::new(user_id, sheet, answers, Utc::now());
        lock(&self.answers)?.insert((user_id.clone(), sheet), record.clone());
        Ok(record)
    }
}

impl CredentialStore for MemoryStore {
    fn credential(&self, user_id: &UserId) -> Result<Option<UserCredential>, StoreError> {
        Ok(lock(&self.users)?.get(user_id).cloned())
    }

    fn put_credential(&self, credential: UserCredential) -> Result<(), StoreError> {
        lock(&self.users)?.insert(credential.user_id.clone(), credential);
        Ok(())
    }
}

impl SessionStore for MemoryStore {
    fn put_session(&self, session: SessionRecord) -> Result<(), StoreError> {
        lock(&self.sessions)?.insert(session.user_id.clone(), session);
        Ok(())
    }

    fn session_by_token(&self, token: &str) -> Result<Option<SessionRecord>, StoreError> {
        Ok(lock(&self.sessions)?
            .values()
            .find(|session| session.token.as_str() == token)
            .cloned())
    }

    fn remove_session(&self, user_id: &UserId) -> Result<(), StoreError> {
        lock(&self.sessions)?.remove(user_id);
        Ok(())
    }
}
