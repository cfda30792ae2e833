//! Session state machine using rust-fsm.
//!
//! ## State Diagram
//!
//! ```text
//!              SignIn / SignOut
//!                  ┌──────┐
//!                  ▼      │
//! ┌─────────────────┐     │
//! │    SignedOut    │─────┘ (initial)
//! └────────┬────────┘
//!          │ SignIn         ▲
//!          ▼                │ SignOut
//! ┌─────────────────┐       │
//! │    SignedIn     │───────┘
//! └────────┬────────┘
//!          │ SignIn / Refresh / UserLoaded
//!          └──────► SignedIn
//! ```
//!
//! `Refresh` and `UserLoaded` are only valid while signed in, which is how a
//! refresh racing a sign-out is rejected.

use rust_fsm::*;
use serde::{Deserialize, Serialize};

state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub session_machine(SignedOut)

    SignedOut => {
        SignIn => SignedIn,
        SignOut => SignedOut
    },
    SignedIn => {
        SignIn => SignedIn,
        Refresh => SignedIn,
        UserLoaded => SignedIn,
        SignOut => SignedOut
    }
}

pub use session_machine::Input as SessionInput;
pub use session_machine::State as SessionMachineState;
pub use session_machine::StateMachine as SessionMachine;

/// Serializable view of the FSM state for status reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    SignedOut,
    SignedIn,
}

impl SessionStatus {
    pub fn is_signed_in(&self) -> bool {
        matches!(self, SessionStatus::SignedIn)
    }
}

impl From<&SessionMachineState> for SessionStatus {
    fn from(state: &SessionMachineState) -> Self {
        match state {
            SessionMachineState::SignedOut => SessionStatus::SignedOut,
            SessionMachineState::SignedIn => SessionStatus::SignedIn,
        }
    }
}
