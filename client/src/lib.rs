//! # Roster Client
//!
//! Talks to the remote user service and keeps the local user collection in
//! step with it while create, update and delete are applied optimistically.
//!
//! - [`gateway`]: HTTP calls to the service, behind the [`Gateway`] trait
//! - [`cache`]: the shared, lock-protected record store
//! - [`coordinator`]: the optimistic mutation state machine
//! - [`session`]: validation, activity log and preferences around it
//!
//! ```no_run
//! use roster_client::{Config, HttpGateway, MutationCoordinator, UserCache};
//! use roster_engine::UserPayload;
//!
//! # async fn run() -> roster_client::Result<()> {
//! let config = Config::from_env()?;
//! let gateway = HttpGateway::new(&config.api_url)?;
//! let coordinator = MutationCoordinator::new(gateway, UserCache::new(), config.id_policy());
//!
//! coordinator.load().await?;
//! let user = coordinator
//!     .create(UserPayload::new("Ada Lovelace", "ada@x.com", "5551234", "Engines Ltd"))
//!     .await?;
//! println!("created {} as {}", user.name, user.id);
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod gateway;
pub mod prefs_file;
pub mod session;

pub use cache::{Speculation, UserCache};
pub use config::{Config, ConfigError};
pub use coordinator::{CreateStatus, MutationCoordinator, Outcome, Phase};
pub use error::{AppError, GatewayError, MutationCause, MutationError, Result};
pub use gateway::{Gateway, HttpGateway};
pub use prefs_file::PrefsFile;
pub use session::Session;
