//! Scripted in-process gateway shared by the client integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use roster_client::{Gateway, GatewayError, MutationCoordinator, UserCache};
use roster_engine::{derive_username, Company, IdPolicy, RecordStore, User, UserId, UserPayload};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Behaves like the mock backend: echoes identity fields, mangles the phone
/// and company it was sent, and rejects updates above its seed range.
pub struct FakeGateway {
    users: Mutex<Vec<User>>,
    next_id: AtomicI64,
    fixed_id: Option<UserId>,
    seed_max: Option<UserId>,
    failing: Mutex<HashSet<&'static str>>,
    failing_once: Mutex<HashSet<&'static str>>,
    hold_creates: AtomicBool,
    release: Notify,
    held: Mutex<HashSet<&'static str>>,
    gate: Notify,
    calls: Mutex<Vec<String>>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self {
            users: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(11),
            fixed_id: None,
            seed_max: Some(10),
            failing: Mutex::new(HashSet::new()),
            failing_once: Mutex::new(HashSet::new()),
            hold_creates: AtomicBool::new(false),
            release: Notify::new(),
            held: Mutex::new(HashSet::new()),
            gate: Notify::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_users(self, users: Vec<User>) -> Self {
        *self.users.lock() = users;
        self
    }

    /// First id handed out by `create`.
    pub fn next_id(self, id: UserId) -> Self {
        self.next_id.store(id, Ordering::SeqCst);
        self
    }

    /// Hand out the same id from every `create`.
    pub fn fixed_id(mut self, id: UserId) -> Self {
        self.fixed_id = Some(id);
        self
    }

    pub fn seed_max(mut self, max: Option<UserId>) -> Self {
        self.seed_max = max;
        self
    }

    /// Make `op` ("fetch", "create", "update" or "remove") fail with a 500.
    pub fn failing(self, op: &'static str) -> Self {
        self.failing.lock().insert(op);
        self
    }

    /// Make only the next call of `op` fail with a 500.
    pub fn failing_once(self, op: &'static str) -> Self {
        self.failing_once.lock().insert(op);
        self
    }

    /// Park every `update` or `remove` (per `op`) after it is recorded, until
    /// [`release`](Self::release). Whether it fails is decided before it parks.
    pub fn holding(self, op: &'static str) -> Self {
        self.held.lock().insert(op);
        self
    }

    /// Let one parked `update` or `remove` through.
    pub fn release(&self) {
        self.gate.notify_one();
    }

    async fn hold(&self, op: &'static str) {
        if self.held.lock().contains(op) {
            self.gate.notified().await;
        }
    }

    /// Park every `create` until [`release_create`](Self::release_create).
    pub fn holding_creates(self) -> Self {
        self.hold_creates.store(true, Ordering::SeqCst);
        self
    }

    pub fn release_create(&self) {
        self.release.notify_one();
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    fn record(&self, call: String) -> Result<(), GatewayError> {
        let op = call.split(' ').next().unwrap_or_default();
        let failing = match op {
            "GET" => "fetch",
            "POST" => "create",
            "PUT" => "update",
            _ => "remove",
        };
        self.calls.lock().push(call.clone());

        if self.failing.lock().contains(failing) || self.failing_once.lock().remove(failing) {
            return Err(GatewayError::Service {
                status: 500,
                endpoint: call,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Gateway for FakeGateway {
    async fn fetch_all(&self) -> Result<Vec<User>, GatewayError> {
        self.record("GET /users".into())?;
        Ok(self.users.lock().clone())
    }

    async fn fetch_one(&self, id: UserId) -> Result<User, GatewayError> {
        let endpoint = format!("GET /users/{id}");
        self.record(endpoint.clone())?;
        self.users
            .lock()
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or(GatewayError::Service {
                status: 404,
                endpoint,
            })
    }

    async fn create(&self, payload: &UserPayload) -> Result<User, GatewayError> {
        if self.hold_creates.load(Ordering::SeqCst) {
            self.release.notified().await;
        }
        self.record("POST /users".into())?;

        let id = self
            .fixed_id
            .unwrap_or_else(|| self.next_id.fetch_add(1, Ordering::SeqCst));
        Ok(User {
            id,
            name: payload.name.clone(),
            email: payload.email.clone(),
            phone: "000-mangled".into(),
            company: Company {
                name: "Mangled Inc".into(),
                ..Company::default()
            },
            ..User::default()
        })
    }

    async fn update(&self, id: UserId, payload: &UserPayload) -> Result<User, GatewayError> {
        let endpoint = format!("PUT /users/{id}");
        let recorded = self.record(endpoint.clone());
        self.hold("update").await;
        recorded?;

        if self.seed_max.is_some_and(|max| id > max) {
            return Err(GatewayError::Service {
                status: 404,
                endpoint,
            });
        }
        Ok(User {
            id,
            name: payload.name.clone(),
            email: payload.email.clone(),
            phone: "stale".into(),
            company: Company {
                name: "Stale".into(),
                ..Company::default()
            },
            ..User::default()
        })
    }

    async fn remove(&self, id: UserId) -> Result<(), GatewayError> {
        let recorded = self.record(format!("DELETE /users/{id}"));
        self.hold("remove").await;
        recorded
    }
}

/// A seeded user the way the service lists them.
pub fn seeded(id: UserId, name: &str, email: &str) -> User {
    User {
        id,
        name: name.to_string(),
        username: derive_username(name),
        email: email.to_string(),
        phone: "000".into(),
        website: format!("{}.org", derive_username(name)),
        company: Company {
            name: "Romaguera".into(),
            catch_phrase: "Neural-net".into(),
            bs: "e-markets".into(),
        },
        ..User::default()
    }
}

pub fn coordinator(
    gateway: &Arc<FakeGateway>,
    users: Vec<User>,
) -> MutationCoordinator<Arc<FakeGateway>> {
    let store = RecordStore::with_users(users).unwrap();
    MutationCoordinator::new(
        Arc::clone(gateway),
        UserCache::from_store(store),
        IdPolicy::default(),
    )
}

/// Id of the first speculative record in the cache, once there is one.
pub async fn first_temp_id(cache: &UserCache) -> UserId {
    loop {
        if let Some(user) = cache.get().iter().find(|u| u.id < 0) {
            return user.id;
        }
        tokio::task::yield_now().await;
    }
}

/// Wait until `gateway` has seen `n` calls.
pub async fn calls_reach(gateway: &FakeGateway, n: usize) {
    while gateway.calls().len() < n {
        tokio::task::yield_now().await;
    }
}

pub fn ids(cache: &UserCache) -> Vec<UserId> {
    cache.get().iter().map(|u| u.id).collect()
}

pub fn assert_unique_ids(cache: &UserCache) {
    let ids = ids(cache);
    let unique: HashSet<_> = ids.iter().collect();
    assert_eq!(unique.len(), ids.len(), "duplicate ids in {ids:?}");
}
