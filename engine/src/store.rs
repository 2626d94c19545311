//! Store - the in-memory user collection.
//!
//! The store holds the ordered user collection and a version counter. It is
//! written only through [`RecordStore::replace`] and [`RecordStore::restore`],
//! and it refuses any write that would leave two records with the same id.

use crate::{error::Result, snapshot::StoreSnapshot, Error, User, UserId};
use std::collections::HashSet;

/// The versioned cache of the user collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordStore {
    users: Vec<User>,
    version: u64,
}

impl RecordStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `users`, e.g. the result of an initial fetch.
    pub fn with_users(users: Vec<User>) -> Result<Self> {
        let mut store = Self::new();
        store.replace(|_| users)?;
        Ok(store)
    }

    /// Current collection, in order.
    pub fn get(&self) -> &[User] {
        &self.users
    }

    /// Version counter, bumped by every successful write.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Get a record by id.
    pub fn find(&self, id: UserId) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    /// Position of a record in the collection.
    pub fn position(&self, id: UserId) -> Option<usize> {
        self.users.iter().position(|u| u.id == id)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Replace the collection with `producer(current)`.
    ///
    /// Fails with [`Error::DuplicateId`] if the produced collection holds two
    /// records with one id; the store is left untouched in that case.
    pub fn replace<F>(&mut self, producer: F) -> Result<u64>
    where
        F: FnOnce(&[User]) -> Vec<User>,
    {
        let next = producer(&self.users);
        ensure_unique(&next)?;
        self.users = next;
        self.version += 1;
        Ok(self.version)
    }

    /// Copy of the collection as it is right now.
    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot::new(self.version, self.users.clone())
    }

    /// Put the whole collection back the way `snapshot` captured it.
    pub fn restore(&mut self, snapshot: StoreSnapshot) -> u64 {
        self.users = snapshot.users;
        self.version += 1;
        self.version
    }

    /// Roll back a single record to its snapshot state, leaving every other
    /// record as it currently is.
    ///
    /// A record absent from the snapshot is removed. A record present in the
    /// snapshot replaces the current one in place, or is reinserted at its
    /// snapshot position (clamped to the current length) if it is gone.
    pub fn revert(&mut self, snapshot: &StoreSnapshot, id: UserId) -> u64 {
        match snapshot.get(id) {
            Some((index, before)) => match self.position(id) {
                Some(current) => self.users[current] = before.clone(),
                None => {
                    let index = index.min(self.users.len());
                    self.users.insert(index, before.clone());
                }
            },
            None => self.users.retain(|u| u.id != id),
        }
        self.version += 1;
        self.version
    }
}

fn ensure_unique(users: &[User]) -> Result<()> {
    let mut seen = HashSet::with_capacity(users.len());
    for user in users {
        if !seen.insert(user.id) {
            return Err(Error::DuplicateId(user.id));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: UserId, name: &str) -> User {
        User {
            id,
            name: name.to_string(),
            email: format!("{}@x.com", name.to_lowercase()),
            ..User::default()
        }
    }

    fn test_store() -> RecordStore {
        RecordStore::with_users(vec![user(1, "Alice"), user(2, "Bob"), user(3, "Carol")]).unwrap()
    }

    #[test]
    fn create_store() {
        let store = RecordStore::new();
        assert!(store.is_empty());
        assert_eq!(store.version(), 0);
    }

    #[test]
    fn with_users_keeps_fetch_order() {
        let store = test_store();
        let ids: Vec<_> = store.get().iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(store.version(), 1);
    }

    #[test]
    fn replace_bumps_version() {
        let mut store = test_store();
        let version = store
            .replace(|users| users.iter().filter(|u| u.id != 2).cloned().collect())
            .unwrap();
        assert_eq!(version, 2);
        assert_eq!(store.len(), 2);
        assert!(store.find(2).is_none());
    }

    #[test]
    fn replace_rejects_duplicate_ids() {
        let mut store = test_store();
        let before = store.clone();

        let result = store.replace(|users| {
            let mut next = users.to_vec();
            next.push(user(1, "Impostor"));
            next
        });

        assert!(matches!(result, Err(Error::DuplicateId(1))));
        assert_eq!(store, before);
    }

    #[test]
    fn get_is_idempotent() {
        let store = test_store();
        assert_eq!(store.get(), store.get());
    }

    #[test]
    fn restore_round_trip() {
        let mut store = test_store();
        let snapshot = store.snapshot();

        store.replace(|_| vec![user(9, "Zed")]).unwrap();
        assert_eq!(store.len(), 1);

        store.restore(snapshot.clone());
        assert_eq!(store.get(), snapshot.users());
        assert_eq!(store.version(), 3);
    }

    #[test]
    fn revert_reinserts_removed_record_at_position() {
        let mut store = test_store();
        let snapshot = store.snapshot();

        store
            .replace(|users| users.iter().filter(|u| u.id != 2).cloned().collect())
            .unwrap();
        store.revert(&snapshot, 2);

        let ids: Vec<_> = store.get().iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn revert_removes_record_absent_from_snapshot() {
        let mut store = test_store();
        let snapshot = store.snapshot();

        store
            .replace(|users| {
                let mut next = vec![user(-5, "Temp")];
                next.extend_from_slice(users);
                next
            })
            .unwrap();
        store.revert(&snapshot, -5);

        assert_eq!(store.get(), snapshot.users());
    }

    #[test]
    fn revert_leaves_other_records_alone() {
        let mut store = test_store();
        let snapshot = store.snapshot();

        // Two unrelated speculative edits after the snapshot
        store
            .replace(|users| {
                users
                    .iter()
                    .map(|u| {
                        let mut u = u.clone();
                        u.phone = "555".into();
                        u
                    })
                    .collect()
            })
            .unwrap();
        store.revert(&snapshot, 1);

        assert_eq!(store.find(1).unwrap().phone, "");
        assert_eq!(store.find(2).unwrap().phone, "555");
        assert_eq!(store.find(3).unwrap().phone, "555");
    }

    #[test]
    fn revert_clamps_position() {
        let mut store = test_store();
        let snapshot = store.snapshot();

        store.replace(|_| Vec::new()).unwrap();
        store.revert(&snapshot, 3);

        assert_eq!(store.len(), 1);
        assert_eq!(store.get()[0].id, 3);
    }
}
