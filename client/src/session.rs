//! Session - what the list and detail screens do on top of the coordinator.
//!
//! Payloads are validated here, before the coordinator ever sees them. Each
//! confirmed mutation adds one activity log entry, and the preferences file
//! is rewritten after every change to them.

use crate::coordinator::{now_millis, MutationCoordinator};
use crate::error::{AppError, GatewayError, Result};
use crate::gateway::Gateway;
use crate::prefs_file::PrefsFile;
use roster_engine::{
    validate_payload, ActivityEntry, ActivityKind, MutationKind, Preferences, User, UserId,
    UserPayload,
};

pub struct Session<G> {
    coordinator: MutationCoordinator<G>,
    prefs: Preferences,
    prefs_file: PrefsFile,
}

impl<G: Gateway> Session<G> {
    /// Start a session, loading preferences from `prefs_file`.
    pub fn open(coordinator: MutationCoordinator<G>, prefs_file: PrefsFile) -> Result<Self> {
        let prefs = prefs_file.load()?;
        Ok(Self {
            coordinator,
            prefs,
            prefs_file,
        })
    }

    pub fn coordinator(&self) -> &MutationCoordinator<G> {
        &self.coordinator
    }

    pub fn prefs(&self) -> &Preferences {
        &self.prefs
    }

    /// Fetch the collection from the service.
    pub async fn refresh(&self) -> Result<usize> {
        self.coordinator.load().await
    }

    /// The cached collection.
    pub fn users(&self) -> Vec<User> {
        self.coordinator.cache().get()
    }

    pub async fn add(&mut self, payload: UserPayload) -> Result<User> {
        validate_payload(&payload)?;
        let user = self.coordinator.create(payload.clone()).await?;
        self.log(MutationKind::Create, &payload.name)?;
        Ok(user)
    }

    pub async fn edit(&mut self, id: UserId, payload: UserPayload) -> Result<User> {
        validate_payload(&payload)?;
        let user = self.coordinator.update(id, payload.clone()).await?;
        self.log(MutationKind::Update, &payload.name)?;
        Ok(user)
    }

    pub async fn remove(&mut self, id: UserId) -> Result<()> {
        let name = self
            .coordinator
            .cache()
            .find(id)
            .map(|u| u.name)
            .ok_or(AppError::NotFound(id))?;
        self.coordinator.delete(id).await?;
        self.log(MutationKind::Delete, &name)?;
        Ok(())
    }

    /// Open a user's detail view. The cache is consulted first, then the
    /// service; the user becomes the current user either way.
    pub async fn show(&mut self, id: UserId) -> Result<User> {
        let user = match self.coordinator.cache().find(id) {
            Some(user) => user,
            None => match self.coordinator.gateway().fetch_one(id).await {
                Ok(user) => user,
                Err(GatewayError::Service { status: 404, .. }) => {
                    return Err(AppError::NotFound(id))
                }
                Err(e) => return Err(e.into()),
            },
        };
        self.select(user.clone())?;
        Ok(user)
    }

    pub fn select(&mut self, user: User) -> Result<()> {
        self.prefs.set_current_user(user);
        self.prefs_file.save(&self.prefs)
    }

    /// Flip the theme flag and return the new value.
    pub fn toggle_theme(&mut self) -> Result<bool> {
        let dark = self.prefs.toggle_dark_mode();
        self.prefs_file.save(&self.prefs)?;
        Ok(dark)
    }

    /// Activity log, newest first.
    pub fn activity(&self) -> &[ActivityEntry] {
        self.prefs.activity_log.entries()
    }

    /// Record a confirmed mutation of user `name`.
    fn log(&mut self, op: MutationKind, name: &str) -> Result<()> {
        let kind = op.activity_kind();
        let verb = match kind {
            ActivityKind::Add => "Added",
            ActivityKind::Edit => "Edited",
            ActivityKind::Delete => "Deleted",
        };
        let message = format!("{verb} user {name}");
        tracing::debug!(%kind, %message, "activity");
        self.prefs.activity_log.push(kind, message, now_millis());
        self.prefs_file.save(&self.prefs)
    }
}
