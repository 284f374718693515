use super::StoreError;
use crate::auth::{
    CredentialStore, SessionRecord, SessionStore, UserCredential, SESSIONS_COLLECTION,
    USERS_COLLECTION,
};
use crate::checklist::answers::{AnswerRecord, AnswerSheet, AnswerStore, ANSWERS_COLLECTION};
use crate::checklist::domain::{Sheet, UserId};
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

/// Directory-backed document store: `<root>/<collection>/<escaped id>.json`.
#[derive(Debug)]
pub struct JsonDocumentStore {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonDocumentStore {
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).map_err(io_failure(&root))?;
        Ok(Self {
            root,
            write_lock: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn get_document<T: DeserializeOwned>(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<T>, StoreError> {
        let path = self.document_path(collection, id);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| StoreError::Malformed {
                collection: collection.to_string(),
                id: id.to_string(),
                source,
            })
    }

    /// Writes the whole document, replacing any previous version.
    pub fn put_document<T: Serialize>(
        &self,
        collection: &str,
        id: &str,
        document: &T,
    ) -> Result<(), StoreError> {
        let payload = serde_json::to_vec_pretty(document)?;
        let directory = self.root.join(collection);
        let path = self.document_path(collection, id);
        let staging = path.with_extension("json.tmp");

        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| StoreError::Unavailable("write lock poisoned".to_string()))?;
        fs::create_dir_all(&directory).map_err(io_failure(&directory))?;
        fs::write(&staging, payload).map_err(io_failure(&staging))?;
        fs::rename(&staging, &path).map_err(io_failure(&path))?;

        debug!(collection, id, "document written");
        Ok(())
    }

    pub fn delete_document(&self, collection: &str, id: &str) -> Result<bool, StoreError> {
        let path = self.document_path(collection, id);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }

    pub fn documents<T: DeserializeOwned>(&self, collection: &str) -> Result<Vec<T>, StoreError> {
        let directory = self.root.join(collection);
        let entries = match fs::read_dir(&directory) {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(StoreError::Io {
                    path: directory,
                    source,
                })
            }
        };

        let mut documents = Vec::new();
        for entry in entries {
            let path = entry.map_err(io_failure(&directory))?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let bytes = fs::read(&path).map_err(io_failure(&path))?;
            let document = serde_json::from_slice(&bytes).map_err(|source| {
                StoreError::Malformed {
                    collection: collection.to_string(),
                    id: path
                        .file_stem()
                        .map(|stem| stem.to_string_lossy().into_owned())
                        .unwrap_or_default(),
                    source,
                }
            })?;
            documents.push(document);
        }
        Ok(documents)
    }

    fn document_path(&self, collection: &str, id: &str) -> PathBuf {
        self.root
            .join(collection)
            .join(format!("{}.json", escape_document_id(id)))
    }
}

fn io_failure(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError {
    let path = path.to_path_buf();
    move |source| StoreError::Io { path, source }
}

/// Keeps ASCII alphanumerics, `-` and `_`; every other byte becomes `%XX`.
fn escape_document_id(id: &str) -> String {
    let mut escaped = String::with_capacity(id.len());
    for byte in id.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
            escaped.push(char::from(byte));
        } else {
            escaped.push_str(&format!("%{byte:02X}"));
        }
    }
    escaped
}

impl AnswerStore for JsonDocumentStore {
    fn get(&self, user_id: &UserId, sheet: Sheet) -> Result<AnswerSheet, StoreError> {
        let record: Option<AnswerRecord> =
            self.get_document(ANSWERS_COLLECTION, &AnswerRecord::document_id(user_id, sheet))?;
        Ok(record.map(|record| record.to_sheet()).unwrap_or_default())
    }

    fn put(
        &self,
        user_id: &UserId,
        sheet: Sheet,
        answers: &AnswerSheet,
    ) -> Result<AnswerRecord, StoreError> {
        let record = AnswerRecord::new(user_id, sheet, answers, Utc::now());
        self.put_document(
            ANSWERS_COLLECTION,
            &AnswerRecord::document_id(user_id, sheet),
            &record,
        )?;
        Ok(record)
    }
}

impl CredentialStore for JsonDocumentStore {
    fn credential(&self, user_id: &UserId) -> Result<Option<UserCredential>, StoreError> {
        self.get_document(USERS_COLLECTION, user_id.as_str())
    }

    fn put_credential(&self, credential: UserCredential) -> Result<(), StoreError> {
        self.put_document(USERS_COLLECTION, credential.user_id.as_str(), &credential)
    }
}

impl SessionStore for JsonDocumentStore {
    fn put_session(&self, session: SessionRecord) -> Result<(), StoreError> {
        self.put_document(SESSIONS_COLLECTION, session.user_id.as_str(), &session)
    }

    fn session_by_token(&self, token: &str) -> Result<Option<SessionRecord>, StoreError> {
        let sessions: Vec<SessionRecord> = self.documents(SESSIONS_COLLECTION)?;
        Ok(sessions
            .into_iter()
            .find(|session| session.token.as_str() == token))
    }

    fn remove_session(&self, user_id: &UserId) -> Result<(), StoreError> {
        self.delete_document(SESSIONS_COLLECTION, user_id.as_str())
            .map(|_| ())
    }
}
