//! Mutation coordinator - optimistic create, update and delete.
//!
//! Every mutation writes its speculative result to the cache first, then
//! calls the gateway, then either reconciles the service's answer into the
//! cache or rolls the speculative write back. All cache access is a
//! synchronous read-modify-write against the current collection.
//!
//! ## Fencing
//!
//! Each invocation claims the id it targets with a fresh generation, under
//! the cache lock and only once its speculative write has found the record.
//! A mutation that fails fast never holds a claim. When the remote call
//! returns, an update or delete whose claim has been taken over
//! by a later mutation on the same id neither merges nor rolls back: the
//! later mutation owns the record now.
//!
//! ## Pending creates
//!
//! A create publishes its settlement on a watch channel keyed by its
//! temporary id. An update or delete aimed at that temporary id waits for the
//! settlement and then talks to the service under the confirmed id. A delete
//! that lands while the create is still in flight stops the create from
//! putting its record back. The channel is unregistered as soon as the
//! create returns; waiters already holding it still see the settlement.

use crate::cache::{Speculation, UserCache};
use crate::error::{GatewayError, MutationCause, MutationError};
use crate::gateway::Gateway;
use dashmap::DashMap;
use parking_lot::Mutex;
use roster_engine::{
    reconcile, Command, IdPolicy, MutationKind, TempIdAllocator, Timestamp, User, UserId,
    UserPayload,
};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;

/// Where a single mutation is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Speculating,
    AwaitingRemote,
    Reconciling,
    RollingBack,
}

impl Phase {
    /// Whether `self -> next` is a legal step.
    pub fn can_advance_to(self, next: Phase) -> bool {
        use Phase::*;
        matches!(
            (self, next),
            (Idle, Speculating)
                // unknown record, or a change that stays local
                | (Speculating, Idle)
                | (Speculating, AwaitingRemote)
                | (AwaitingRemote, Reconciling)
                | (AwaitingRemote, RollingBack)
                // superseded by a later mutation on the same id
                | (AwaitingRemote, Idle)
                | (Reconciling, RollingBack)
                | (Reconciling, Idle)
                | (RollingBack, Idle)
        )
    }
}

/// How a create settled, as seen by mutations waiting on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateStatus {
    Pending,
    /// The merged record now in the cache under its confirmed id
    Confirmed(User),
    Failed,
}

/// What a successful [`Command`] produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Created(User),
    Updated(User),
    Deleted(UserId),
}

#[derive(Debug, Clone, Copy)]
struct Claim {
    generation: u64,
    op: MutationKind,
}

/// How a temporary id resolved once its create was given a chance to settle.
enum Resolution {
    /// The confirmed record the service knows
    Remote(User),
    /// The create failed and took its record with it
    Abandoned,
    /// Nothing confirmed matches; the change stays local
    LocalOnly,
}

/// One mutation invocation: its phase and the ids it holds claims on.
///
/// Claims are released when the flight is dropped, unless a later mutation
/// has taken them over.
struct Flight<'a> {
    op: MutationKind,
    id: UserId,
    generation: u64,
    phase: Phase,
    claims: &'a DashMap<UserId, Claim>,
    claimed: Vec<UserId>,
}

impl Flight<'_> {
    fn advance(&mut self, next: Phase) {
        debug_assert!(
            self.phase.can_advance_to(next),
            "illegal phase transition {:?} -> {:?}",
            self.phase,
            next
        );
        tracing::debug!(
            op = %self.op,
            id = self.id,
            generation = self.generation,
            from = ?self.phase,
            to = ?next,
            "mutation phase"
        );
        self.phase = next;
    }

    fn token(&self) -> Claim {
        Claim {
            generation: self.generation,
            op: self.op,
        }
    }

    /// Make `id` the flight's target. Does not claim it.
    fn retarget(&mut self, id: UserId) {
        self.id = id;
    }

    /// Claim the current target.
    fn claim(&mut self) {
        self.claims.insert(self.id, self.token());
        self.held(self.id);
    }

    /// Note that the flight holds a claim on `id`, to release it on drop.
    fn held(&mut self, id: UserId) {
        if !self.claimed.contains(&id) {
            self.claimed.push(id);
        }
    }

    /// True while no later mutation has claimed the current target.
    fn is_current(&self) -> bool {
        self.claims
            .get(&self.id)
            .is_some_and(|claim| claim.generation == self.generation)
    }

    fn fail(&mut self, cause: impl Into<MutationCause>) -> MutationError {
        if self.phase != Phase::Idle {
            self.advance(Phase::Idle);
        }
        MutationError::new(self.op, cause)
    }
}

impl Drop for Flight<'_> {
    fn drop(&mut self) {
        if self.phase != Phase::Idle {
            tracing::debug!(op = %self.op, id = self.id, phase = ?self.phase, "mutation abandoned");
        }
        for id in &self.claimed {
            self.claims
                .remove_if(id, |_, claim| claim.generation == self.generation);
        }
    }
}

/// A create's side of its watch channel. Unregisters the channel when the
/// create ends, however it ends.
struct Settlement<'a> {
    temp_id: UserId,
    sender: watch::Sender<CreateStatus>,
    creates: &'a DashMap<UserId, watch::Receiver<CreateStatus>>,
}

impl Settlement<'_> {
    fn publish(&self, status: CreateStatus) {
        self.sender.send_replace(status);
    }
}

impl Drop for Settlement<'_> {
    fn drop(&mut self) {
        self.creates.remove(&self.temp_id);
    }
}

/// Runs optimistic mutations against one cache and one gateway.
pub struct MutationCoordinator<G> {
    gateway: G,
    cache: UserCache,
    policy: IdPolicy,
    temp_ids: Mutex<TempIdAllocator>,
    generation: AtomicU64,
    claims: DashMap<UserId, Claim>,
    creates: DashMap<UserId, watch::Receiver<CreateStatus>>,
}

impl<G: Gateway> MutationCoordinator<G> {
    pub fn new(gateway: G, cache: UserCache, policy: IdPolicy) -> Self {
        Self {
            gateway,
            cache,
            policy,
            temp_ids: Mutex::new(TempIdAllocator::new()),
            generation: AtomicU64::new(0),
            claims: DashMap::new(),
            creates: DashMap::new(),
        }
    }

    pub fn cache(&self) -> &UserCache {
        &self.cache
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn policy(&self) -> IdPolicy {
        self.policy
    }

    /// Number of creates still waiting on the service.
    pub fn pending_creates(&self) -> usize {
        self.creates.len()
    }

    /// Fetch the whole collection and replace the cache with it.
    pub async fn load(&self) -> crate::error::Result<usize> {
        let users = self.gateway.fetch_all().await?;
        let count = users.len();
        self.cache.replace(|_| users)?;
        tracing::info!(count, "users loaded");
        Ok(count)
    }

    /// Run a command.
    pub async fn execute(&self, command: Command) -> Result<Outcome, MutationError> {
        tracing::debug!(
            op = %command.kind(),
            target = ?command.target(),
            email = ?command.payload().map(|p| p.email.as_str()),
            "executing command"
        );
        match command {
            Command::Create(payload) => self.create(payload).await.map(Outcome::Created),
            Command::Update { id, payload } => {
                self.update(id, payload).await.map(Outcome::Updated)
            }
            Command::Delete { id } => self.delete(id).await.map(|()| Outcome::Deleted(id)),
        }
    }

    /// Create a record.
    ///
    /// A speculative record with a temporary id is prepended right away and
    /// swapped for the merged confirmed record, in place, once the service
    /// answers.
    pub async fn create(&self, payload: UserPayload) -> Result<User, MutationError> {
        let temp_id = self.temp_ids.lock().next(now_millis());
        let mut flight = self.begin(MutationKind::Create, temp_id);
        flight.claim();

        let (sender, receiver) = watch::channel(CreateStatus::Pending);
        self.creates.insert(temp_id, receiver);
        let settled = Settlement {
            temp_id,
            sender,
            creates: &self.creates,
        };

        flight.advance(Phase::Speculating);
        let temp = reconcile::speculative_user(temp_id, &payload);
        let speculation = match self
            .cache
            .speculate(|users| reconcile::prepend(users, &temp))
        {
            Ok(speculation) => speculation,
            Err(e) => {
                settled.publish(CreateStatus::Failed);
                return Err(flight.fail(e));
            }
        };

        flight.advance(Phase::AwaitingRemote);
        let result = self.gateway.create(&payload).await;

        let confirmed = match result {
            Ok(confirmed) => confirmed,
            Err(e) => {
                flight.advance(Phase::RollingBack);
                self.cache.rollback(speculation, temp_id);
                settled.publish(CreateStatus::Failed);
                tracing::warn!(temp_id, error = %e, "create failed, rolled back");
                return Err(flight.fail(e));
            }
        };

        flight.advance(Phase::Reconciling);
        let reconciled = self.cache.write(|store| {
            let basis = store.find(temp_id).unwrap_or(&temp);
            let merged = reconcile::merge_create(basis, &confirmed, &payload);

            if self.deleted_while_pending(temp_id) {
                tracing::debug!(temp_id, id = merged.id, "record deleted while pending");
            } else {
                store.replace(|users| reconcile::swap_in(users, temp_id, &merged))?;
            }
            // Published under the lock so waiters never see the swap without it
            settled.publish(CreateStatus::Confirmed(merged.clone()));
            Ok::<_, roster_engine::Error>(merged)
        });

        match reconciled {
            Ok(merged) => {
                flight.advance(Phase::Idle);
                tracing::info!(temp_id, id = merged.id, "user created");
                Ok(merged)
            }
            Err(e) => {
                flight.advance(Phase::RollingBack);
                self.cache.rollback(speculation, temp_id);
                settled.publish(CreateStatus::Failed);
                Err(flight.fail(e))
            }
        }
    }

    /// Update a record.
    ///
    /// The payload is patched onto the record in place right away. If the
    /// record is still speculative, the update waits for its create and goes
    /// out under the confirmed id; with nothing confirmed to send it to, the
    /// patch is kept as the final local state.
    pub async fn update(&self, id: UserId, payload: UserPayload) -> Result<User, MutationError> {
        let mut flight = self.begin(MutationKind::Update, self.settled_id(id));
        let patch = |users: &[User], existing: &User| {
            reconcile::upsert(users, &reconcile::apply_patch(existing, &payload))
        };

        flight.advance(Phase::Speculating);
        let (mut speculation, existing) = match self.speculate_target(&mut flight, id, patch) {
            Ok(Some(found)) => found,
            Ok(None) => return Err(flight.fail(MutationCause::UnknownRecord(id))),
            Err(cause) => return Err(flight.fail(cause)),
        };
        let mut patched = reconcile::apply_patch(&existing, &payload);

        if self.policy.is_speculative(flight.id) {
            match self.resolve_pending(flight.id, &payload).await {
                Resolution::Remote(confirmed) => {
                    flight.retarget(confirmed.id);
                    match self.speculate_claimed(&mut flight, patch) {
                        Ok(Some((respeculation, existing))) => {
                            speculation = respeculation;
                            patched = reconcile::apply_patch(&existing, &payload);
                        }
                        Ok(None) => {
                            return Err(flight.fail(MutationCause::UnknownRecord(confirmed.id)))
                        }
                        Err(e) => return Err(flight.fail(e)),
                    }
                }
                Resolution::Abandoned => {
                    return Err(flight.fail(MutationCause::UnknownRecord(id)));
                }
                Resolution::LocalOnly => {
                    flight.advance(Phase::Idle);
                    tracing::debug!(id = flight.id, "no confirmed id, update kept locally");
                    return Ok(patched);
                }
            }
        }

        let remote_id = flight.id;
        flight.advance(Phase::AwaitingRemote);
        let result = self.gateway.update(remote_id, &payload).await;

        if !flight.is_current() {
            flight.advance(Phase::Idle);
            tracing::debug!(id = remote_id, "update superseded, result dropped");
            return result
                .map(|confirmed| reconcile::merge_update(&patched, &confirmed, &payload))
                .map_err(|e| MutationError::new(MutationKind::Update, e));
        }

        let confirmed = match result {
            Ok(confirmed) => confirmed,
            Err(e @ GatewayError::Service { .. }) if !self.policy.service_recognizes(remote_id) => {
                tracing::warn!(id = remote_id, error = %e, "service does not know this id, update kept locally");
                patched.clone()
            }
            Err(e) => {
                flight.advance(Phase::RollingBack);
                self.cache.rollback(speculation, remote_id);
                tracing::warn!(id = remote_id, error = %e, "update failed, rolled back");
                return Err(flight.fail(e));
            }
        };

        flight.advance(Phase::Reconciling);
        let reconciled = self.cache.write(|store| {
            let Some(existing) = store.find(remote_id) else {
                // Gone since the patch; nothing to merge into
                return Ok(reconcile::merge_update(&patched, &confirmed, &payload));
            };
            let merged = reconcile::merge_update(existing, &confirmed, &payload);
            store.replace(|users| reconcile::upsert(users, &merged))?;
            Ok::<_, roster_engine::Error>(merged)
        });

        match reconciled {
            Ok(merged) => {
                flight.advance(Phase::Idle);
                tracing::info!(id = merged.id, "user updated");
                Ok(merged)
            }
            Err(e) => {
                flight.advance(Phase::RollingBack);
                self.cache.rollback(speculation, remote_id);
                Err(flight.fail(e))
            }
        }
    }

    /// Delete a record.
    ///
    /// The record leaves the cache right away. A record that never got a
    /// confirmed id is only removed locally.
    pub async fn delete(&self, id: UserId) -> Result<(), MutationError> {
        let mut flight = self.begin(MutationKind::Delete, self.settled_id(id));
        let remove = |users: &[User], existing: &User| reconcile::without(users, existing.id);

        flight.advance(Phase::Speculating);
        let (mut speculation, removed) = match self.speculate_target(&mut flight, id, remove) {
            Ok(Some(found)) => found,
            Ok(None) => return Err(flight.fail(MutationCause::UnknownRecord(id))),
            Err(cause) => return Err(flight.fail(cause)),
        };
        let mut undo = Undo::Revert(removed.id);

        if self.policy.is_speculative(removed.id) {
            let payload = UserPayload::from(&removed);
            match self.resolve_pending(removed.id, &payload).await {
                Resolution::Remote(confirmed) => {
                    flight.retarget(confirmed.id);
                    match self.speculate_claimed(&mut flight, remove) {
                        // A confirmed twin is in the cache: take it out as well
                        Ok(Some((respeculation, _))) => {
                            speculation = respeculation;
                            undo = Undo::Revert(confirmed.id);
                        }
                        // The create saw this delete and never swapped in
                        Ok(None) => {
                            flight.claim();
                            undo = Undo::Reinstate {
                                temp_id: removed.id,
                                confirmed,
                            };
                        }
                        Err(e) => return Err(flight.fail(e)),
                    }
                }
                Resolution::Abandoned | Resolution::LocalOnly => {
                    flight.advance(Phase::Idle);
                    tracing::debug!(id = removed.id, "never confirmed, deleted locally");
                    return Ok(());
                }
            }
        }

        let remote_id = flight.id;
        flight.advance(Phase::AwaitingRemote);
        let result = self.gateway.remove(remote_id).await;

        match result {
            Ok(()) => {
                flight.advance(Phase::Reconciling);
                flight.advance(Phase::Idle);
                tracing::info!(id = remote_id, "user deleted");
                Ok(())
            }
            Err(e) if !flight.is_current() => {
                tracing::debug!(id = remote_id, "delete superseded, rollback skipped");
                Err(flight.fail(e))
            }
            Err(e) => {
                flight.advance(Phase::RollingBack);
                match undo {
                    Undo::Revert(id) => {
                        self.cache.rollback(speculation, id);
                    }
                    Undo::Reinstate { temp_id, confirmed } => {
                        self.reinstate(&speculation, temp_id, &confirmed);
                    }
                }
                tracing::warn!(id = remote_id, error = %e, "delete failed, rolled back");
                Err(flight.fail(e))
            }
        }
    }

    fn begin(&self, op: MutationKind, id: UserId) -> Flight<'_> {
        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        Flight {
            op,
            id,
            generation,
            phase: Phase::Idle,
            claims: &self.claims,
            claimed: Vec::with_capacity(2),
        }
    }

    /// Speculate on the flight's target and claim it in the same critical
    /// section. Nothing is claimed if the target is not in the cache.
    fn speculate_claimed<F>(
        &self,
        flight: &mut Flight<'_>,
        producer: F,
    ) -> roster_engine::error::Result<Option<(Speculation, User)>>
    where
        F: FnOnce(&[User], &User) -> Vec<User>,
    {
        let target = flight.id;
        let token = flight.token();
        let claims = flight.claims;
        let found = self.cache.speculate_on(target, producer, |_| {
            claims.insert(target, token);
        })?;
        if found.is_some() {
            flight.held(target);
        }
        Ok(found)
    }

    /// Speculate on the flight's target. If the target is gone because its
    /// create settled in the meantime, retarget to the confirmed id and try
    /// once more.
    fn speculate_target<F>(
        &self,
        flight: &mut Flight<'_>,
        id: UserId,
        producer: F,
    ) -> Result<Option<(Speculation, User)>, MutationCause>
    where
        F: Fn(&[User], &User) -> Vec<User>,
    {
        if let Some(found) = self.speculate_claimed(flight, &producer)? {
            return Ok(Some(found));
        }
        let settled = self.settled_id(id);
        if settled == flight.id {
            return Ok(None);
        }
        flight.retarget(settled);
        Ok(self.speculate_claimed(flight, &producer)?)
    }

    /// The confirmed id for `id` if it belongs to a create that has already
    /// been confirmed, `id` otherwise.
    fn settled_id(&self, id: UserId) -> UserId {
        if !self.policy.is_speculative(id) {
            return id;
        }
        self.creates
            .get(&id)
            .and_then(|receiver| match &*receiver.value().borrow() {
                CreateStatus::Confirmed(user) => Some(user.id),
                _ => None,
            })
            .unwrap_or(id)
    }

    /// Wait for the create behind `temp_id` to settle, falling back to a
    /// lookup by email or derived username among confirmed records.
    async fn resolve_pending(&self, temp_id: UserId, payload: &UserPayload) -> Resolution {
        let receiver = self.creates.get(&temp_id).map(|r| r.value().clone());

        if let Some(mut receiver) = receiver {
            let settled = receiver
                .wait_for(|status| *status != CreateStatus::Pending)
                .await
                .map(|status| (*status).clone());

            match settled {
                Ok(CreateStatus::Confirmed(user)) => return Resolution::Remote(user),
                Ok(_) => return Resolution::Abandoned,
                // The create was dropped before it settled
                Err(_) => {}
            }
        }

        self.cache
            .read(|store| {
                reconcile::resolve_temp_id(store.get(), payload, &self.policy)
                    .and_then(|id| store.find(id).cloned())
            })
            .map_or(Resolution::LocalOnly, Resolution::Remote)
    }

    fn deleted_while_pending(&self, temp_id: UserId) -> bool {
        self.claims
            .get(&temp_id)
            .is_some_and(|claim| claim.op == MutationKind::Delete)
    }

    /// Put a confirmed record back where its speculative record used to be.
    fn reinstate(&self, speculation: &Speculation, temp_id: UserId, confirmed: &User) {
        self.cache.write(|store| {
            store.revert(&speculation.snapshot, temp_id);
            if let Err(e) = store.replace(|users| reconcile::swap_in(users, temp_id, confirmed)) {
                tracing::warn!(temp_id, id = confirmed.id, error = %e, "could not reinstate record");
            }
        });
    }
}

/// How to undo a failed delete.
enum Undo {
    /// Roll record `id` back from the speculation's snapshot
    Revert(UserId),
    /// Bring the confirmed record back at its speculative record's position
    Reinstate { temp_id: UserId, confirmed: User },
}

/// Wall clock in milliseconds since the epoch.
pub(crate) fn now_millis() -> Timestamp {
    u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or_default()
}
