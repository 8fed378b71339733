// Session - one storage unit of work per request
//
// Handlers hold a Session for their whole body. Dropping it calls close() on
// the backend no matter how the handler exits, so unsaved work never leaks
// into the next request.

use crate::storage::Storage;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::warn;

/// Shared handle to the storage engine chosen at startup
#[derive(Clone)]
pub struct SharedStorage {
    inner: Arc<Mutex<Box<dyn Storage>>>,
}

impl SharedStorage {
    pub fn new(storage: Box<dyn Storage>) -> Self {
        SharedStorage {
            inner: Arc::new(Mutex::new(storage)),
        }
    }

    /// Start a unit of work. Blocks while another request holds one.
    pub fn session(&self) -> Session<'_> {
        let guard = self.inner.lock().unwrap_or_else(|poisoned| {
            warn!("storage mutex poisoned by a panicking request, recovering");
            PoisonError::into_inner(poisoned)
        });

        Session { storage: guard }
    }
}

pub struct Session<'a> {
    storage: MutexGuard<'a, Box<dyn Storage>>,
}

impl Deref for Session<'_> {
    type Target = dyn Storage;

    fn deref(&self) -> &Self::Target {
        &**self.storage
    }
}

impl DerefMut for Session<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut **self.storage
    }
}

impl Drop for Session<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.storage.close() {
            warn!(backend = self.storage.backend(), error = %e, "failed to close storage session");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EntityKind, State};
    use crate::storage::DbStorage;

    #[test]
    fn test_dropping_session_discards_unsaved_work() {
        let shared = SharedStorage::new(Box::new(DbStorage::open_in_memory().unwrap()));

        {
            let mut session = shared.session();
            session.new(State::new("Unsaved").into()).unwrap();
        }

        let session = shared.session();
        assert_eq!(session.count(Some(EntityKind::State)).unwrap(), 0);
    }

    #[test]
    fn test_saved_work_is_visible_to_next_session() {
        let shared = SharedStorage::new(Box::new(DbStorage::open_in_memory().unwrap()));

        {
            let mut session = shared.session();
            session.new(State::new("Saved").into()).unwrap();
            session.save().unwrap();
        }

        let session = shared.session();
        assert_eq!(session.count(Some(EntityKind::State)).unwrap(), 1);
    }
}
