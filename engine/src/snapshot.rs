//! Point-in-time copies of the record store, taken before a speculative
//! mutation and restored if the remote call fails.

use crate::{User, UserId};

/// An immutable copy of the store's collection at one instant.
///
/// Opaque on purpose: the only ways to get one are [`crate::RecordStore::snapshot`]
/// and the only ways to use one are [`crate::RecordStore::restore`] and
/// [`crate::RecordStore::revert`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSnapshot {
    pub(crate) version: u64,
    pub(crate) users: Vec<User>,
}

impl StoreSnapshot {
    pub(crate) fn new(version: u64, users: Vec<User>) -> Self {
        Self { version, users }
    }

    /// Store version at the time the snapshot was taken.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Records captured by the snapshot, in store order.
    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Captured state of one record and its position, if it existed.
    pub fn get(&self, id: UserId) -> Option<(usize, &User)> {
        self.users.iter().enumerate().find(|(_, u)| u.id == id)
    }
}
