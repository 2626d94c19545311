//! Shared handle to the record store.
//!
//! The store itself is synchronous. `UserCache` puts it behind a mutex so the
//! coordinator, the session and any reader can share it; every method takes
//! the lock for one read-modify-write and releases it before returning, so it
//! is never held across an `.await`.

use parking_lot::Mutex;
use roster_engine::error::Result;
use roster_engine::{RecordStore, StoreSnapshot, User, UserId};
use std::sync::Arc;

/// What a speculative write needs to be undone later.
#[derive(Debug, Clone)]
pub struct Speculation {
    /// The store as it was right before the write
    pub snapshot: StoreSnapshot,
    /// Store version produced by the write
    pub version: u64,
}

/// Cloneable handle to the one [`RecordStore`] of the application.
#[derive(Debug, Clone, Default)]
pub struct UserCache {
    inner: Arc<Mutex<RecordStore>>,
}

impl UserCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_store(store: RecordStore) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    /// Current collection, in order.
    pub fn get(&self) -> Vec<User> {
        self.inner.lock().get().to_vec()
    }

    pub fn find(&self, id: UserId) -> Option<User> {
        self.inner.lock().find(id).cloned()
    }

    pub fn version(&self) -> u64 {
        self.inner.lock().version()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Run `f` against the store under the lock.
    pub fn read<R>(&self, f: impl FnOnce(&RecordStore) -> R) -> R {
        f(&self.inner.lock())
    }

    /// Run `f` against the store under the lock, allowing writes.
    pub fn write<R>(&self, f: impl FnOnce(&mut RecordStore) -> R) -> R {
        f(&mut self.inner.lock())
    }

    pub fn replace<F>(&self, producer: F) -> Result<u64>
    where
        F: FnOnce(&[User]) -> Vec<User>,
    {
        self.inner.lock().replace(producer)
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        self.inner.lock().snapshot()
    }

    pub fn restore(&self, snapshot: StoreSnapshot) -> u64 {
        self.inner.lock().restore(snapshot)
    }

    /// Snapshot the store and apply `producer` in one step.
    pub fn speculate<F>(&self, producer: F) -> Result<Speculation>
    where
        F: FnOnce(&[User]) -> Vec<User>,
    {
        let mut store = self.inner.lock();
        let snapshot = store.snapshot();
        let version = store.replace(producer)?;
        Ok(Speculation { snapshot, version })
    }

    /// Like [`speculate`](Self::speculate), but only if record `id` exists.
    /// `producer` also receives that record, which is returned alongside.
    /// `commit` runs under the same lock once the write has gone through.
    pub fn speculate_on<F, C>(
        &self,
        id: UserId,
        producer: F,
        commit: C,
    ) -> Result<Option<(Speculation, User)>>
    where
        F: FnOnce(&[User], &User) -> Vec<User>,
        C: FnOnce(&User),
    {
        let mut store = self.inner.lock();
        let Some(existing) = store.find(id).cloned() else {
            return Ok(None);
        };
        let snapshot = store.snapshot();
        let version = store.replace(|users| producer(users, &existing))?;
        commit(&existing);
        Ok(Some((Speculation { snapshot, version }, existing)))
    }

    /// Undo a speculative write on record `id`.
    ///
    /// If nothing touched the store since the write, the whole snapshot is
    /// restored. Otherwise only record `id` goes back to its snapshot state,
    /// so later writes by other mutations survive.
    pub fn rollback(&self, speculation: Speculation, id: UserId) -> u64 {
        let mut store = self.inner.lock();
        if store.version() == speculation.version {
            store.restore(speculation.snapshot)
        } else {
            store.revert(&speculation.snapshot, id)
        }
    }
}
