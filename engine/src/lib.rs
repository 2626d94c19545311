//! # Roster Engine
//!
//! The IO-free core of the Roster user directory client.
//!
//! This crate holds the local copy of the user collection and the rules for
//! keeping it consistent with a remote record service while mutations are
//! applied optimistically: a record shows up (or changes, or disappears) the
//! moment it is submitted, and is reconciled or rolled back once the service
//! answers.
//!
//! ## Design Principles
//!
//! - **No IO**: no network, no files, no clock reads; timestamps are passed in
//! - **Pure policy**: every reconciliation step is a function from the current
//!   collection to the next one
//! - **Unique ids**: the store refuses any write that would duplicate an id
//!
//! ## Core Concepts
//!
//! ### Records
//!
//! A [`User`] carries an id, identity fields (`name`, `email`), form fields
//! (`phone`, `company.name`) and passthrough fields that are never validated
//! but must survive every merge.
//!
//! ### Speculative ids
//!
//! A record created locally gets a negative id from [`TempIdAllocator`] until
//! the service confirms it. [`IdPolicy`] tells the two kinds apart, and also
//! knows which confirmed ids the (mock) service will accept updates for.
//!
//! ### Store and snapshots
//!
//! [`RecordStore`] is written only through `replace(producer)`. A
//! [`StoreSnapshot`] taken before a speculative write is how a failed
//! mutation is undone, either wholesale or for a single record.
//!
//! ### Reconciliation
//!
//! The [`reconcile`] module decides how a confirmed record replaces its
//! speculative twin: which side wins each field, how temporary ids are matched
//! to confirmed ones, and how duplicates are avoided.
//!
//! ## Quick Start
//!
//! ```rust
//! use roster_engine::{reconcile, RecordStore, TempIdAllocator, User, UserPayload};
//!
//! let mut store = RecordStore::new();
//! let mut ids = TempIdAllocator::new();
//!
//! // 1. Speculatively insert a new user
//! let payload = UserPayload::new("Ada Lovelace", "ada@x.com", "5551234", "Engines Ltd");
//! let temp = reconcile::speculative_user(ids.next(1_706_745_600_000), &payload);
//! let snapshot = store.snapshot();
//! store.replace(|users| reconcile::prepend(users, &temp)).unwrap();
//!
//! // 2. The service answers with its own id
//! let confirmed = User { id: 11, name: payload.name.clone(), email: payload.email.clone(), ..User::default() };
//! let merged = reconcile::merge_create(&temp, &confirmed, &payload);
//! store.replace(|users| reconcile::swap_in(users, temp.id, &merged)).unwrap();
//!
//! assert_eq!(store.len(), 1);
//! assert_eq!(store.get()[0].id, 11);
//! assert_eq!(store.get()[0].company.name, "Engines Ltd");
//!
//! // 3. Had the call failed, the snapshot undoes it
//! store.restore(snapshot);
//! assert!(store.is_empty());
//! ```
//!
//! ## Collaborator helpers
//!
//! [`validate`], [`view`], [`ActivityLog`] and [`Preferences`] serve the UI
//! side: payload checks, list transforms, and the persisted preference
//! document.

pub mod activity;
pub mod error;
pub mod operation;
pub mod prefs;
pub mod reconcile;
pub mod snapshot;
pub mod store;
pub mod temp_id;
pub mod user;
pub mod validate;
pub mod view;

// Re-export main types at crate root
pub use activity::{ActivityEntry, ActivityKind, ActivityLog, ACTIVITY_LOG_CAPACITY};
pub use error::Error;
pub use operation::{Command, MutationKind};
pub use prefs::{Preferences, PREFS_FORMAT_VERSION, PREFS_STORAGE_NAME};
pub use snapshot::StoreSnapshot;
pub use store::RecordStore;
pub use temp_id::{IdPolicy, TempIdAllocator};
pub use user::{derive_username, Address, Company, Geo, User, UserPayload};
pub use validate::validate_payload;
pub use view::{ListQuery, Page, SortOrder, PAGE_SIZE};

/// Record id. Positive when issued by the service, non-positive when local.
pub type UserId = i64;
/// Milliseconds since the Unix epoch.
pub type Timestamp = u64;
