//! Client-side authentication session manager.
//!
//! This crate provides:
//! - A session state machine holding the access token, refresh token and user
//! - Storage mirroring through the [`SessionStorage`] port
//! - A single-flight refresh coordinator that replays requests rejected with 401
//! - An HTTP client bound to the session's authorization header
//! - A race-safe lazily constructed shared manager ([`AuthFactory`])
//!
//! Embedders implement [`AuthOperations`] for their backend and build an
//! [`AuthManager`] from an [`AuthConfig`].

mod client;
mod config;
mod coordinator;
mod error;
mod factory;
mod fsm;
mod manager;
mod operations;
mod session;
mod single_flight;
mod state;

pub use client::{AuthorizedClient, AuthorizedRequestBuilder};
pub use config::AuthConfig;
pub use error::{AuthError, AuthResult};
pub use factory::AuthFactory;
pub use fsm::session_machine;
pub use fsm::{SessionInput, SessionMachine, SessionMachineState, SessionStatus};
pub use manager::AuthManager;
pub use operations::AuthOperations;
pub use session::{SessionObserver, SubscriptionId};
pub use single_flight::SingleFlight;
pub use state::{AuthTokens, SessionState};

pub use session_storage::{
    FileStorage, MemoryStorage, SessionStorage, StorageError, StorageKeys, StorageResult,
};
