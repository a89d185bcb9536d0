//! `localStorage`-backed profile store.

use web_sys::{window, Storage};

use crate::error::QuizError;
use crate::profile::ProfileStore;

/// Wraps `window.localStorage`. Private browsing or disabled storage leaves
/// `inner` empty and every call reports `StorageUnavailable`.
pub struct LocalStorage {
    inner: Option<Storage>,
}

impl LocalStorage {
    pub fn open() -> Self {
        let inner = window().and_then(|w| w.local_storage().ok().flatten());
        if inner.is_none() {
            log::warn!("localStorage unavailable; progress will not be saved");
        }
        Self { inner }
    }

    fn storage(&self) -> Result<&Storage, QuizError> {
        self.inner
            .as_ref()
            .ok_or_else(|| QuizError::StorageUnavailable("localStorage disabled".into()))
    }
}

impl ProfileStore for LocalStorage {
    fn read(&self, key: &str) -> Result<Option<String>, QuizError> {
        self.storage()?
            .get_item(key)
            .map_err(|e| QuizError::StorageUnavailable(format!("read {key}: {e:?}")))
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), QuizError> {
        self.storage()?
            .set_item(key, value)
            .map_err(|e| QuizError::StorageUnavailable(format!("write {key}: {e:?}")))
    }
}
