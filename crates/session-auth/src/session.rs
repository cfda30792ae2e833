//! Session state machine with storage mirroring and change notification.
//!
//! `Session` owns the current [`SessionState`] and is the only place it is
//! mutated. Every transition updates memory first (so synchronous readers see
//! it immediately), then mirrors the change to storage, then notifies
//! observers. Storage is a durability aid: write failures are logged and never
//! roll back the in-memory state.

use crate::fsm::{SessionInput, SessionMachine, SessionStatus};
use crate::state::{AuthTokens, SessionState};
use crate::{AuthError, AuthResult};
use parking_lot::{Mutex, RwLock};
use serde::de::DeserializeOwned;
use serde::Serialize;
use session_storage::{SessionStorage, StorageError, StorageKeys, StorageResult};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Observer invoked synchronously after each session transition.
pub type SessionObserver<U> = Arc<dyn Fn(&SessionState<U>) + Send + Sync>;

/// Handle returned by [`Session::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Which storage slots a transition rewrites.
#[derive(Debug, Clone, Copy)]
enum Persist {
    All,
    Tokens,
    User,
    Clear,
}

struct Current<U> {
    machine: SessionMachine,
    state: SessionState<U>,
    // Bumped on every sign-in and sign-out.
    generation: u64,
}

/// Session state machine.
pub struct Session<U> {
    current: RwLock<Current<U>>,
    // Taken before `current` and held until the storage write finishes, so
    // storage sees transitions in the same order memory did while readers
    // only ever wait on the in-memory update.
    persist_lock: Mutex<()>,
    storage: Arc<dyn SessionStorage>,
    keys: StorageKeys,
    observers: Mutex<Vec<(SubscriptionId, SessionObserver<U>)>>,
    next_subscription: AtomicU64,
}

impl<U> Session<U>
where
    U: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    /// Build a session seeded from `initial_state`, or from storage when no
    /// initial state is given.
    ///
    /// An explicit initial state is used as-is and storage is not touched.
    pub fn restore(
        storage: Arc<dyn SessionStorage>,
        keys: StorageKeys,
        initial_state: Option<SessionState<U>>,
    ) -> AuthResult<Self> {
        let state = match initial_state {
            Some(state) => {
                if !state.is_consistent() {
                    return Err(AuthError::InvalidInitialState(format!(
                        "is_signed_in is {} but the credential fields disagree",
                        state.is_signed_in
                    )));
                }
                debug!(signed_in = state.is_signed_in, "Seeding session from initial state");
                state
            }
            None => load_from_storage(storage.as_ref(), &keys),
        };

        let mut machine = SessionMachine::new();
        if state.is_signed_in {
            machine.consume(&SessionInput::SignIn).map_err(|_| {
                AuthError::InvalidStateTransition("Cannot seed a signed-in session".to_string())
            })?;
        }

        Ok(Self {
            current: RwLock::new(Current {
                machine,
                state,
                generation: 0,
            }),
            persist_lock: Mutex::new(()),
            storage,
            keys,
            observers: Mutex::new(Vec::new()),
            next_subscription: AtomicU64::new(1),
        })
    }

    /// Install a new session. Valid from any state; overwrites an existing one.
    pub fn apply_sign_in(&self, tokens: AuthTokens, user: U) -> AuthResult<()> {
        self.transition(
            SessionInput::SignIn,
            None,
            |state| *state = SessionState::signed_in(tokens, user),
            Persist::All,
        )
    }

    /// Replace the token pair, keeping the user.
    ///
    /// `generation` is the value of [`Session::generation`] when the refresh
    /// started. Fails while signed out, and fails if the session was signed
    /// out or replaced by another sign-in since then.
    pub fn apply_refresh(&self, generation: u64, tokens: AuthTokens) -> AuthResult<()> {
        self.transition(
            SessionInput::Refresh,
            Some(generation),
            |state| {
                state.access_token = Some(tokens.access_token);
                state.refresh_token = Some(tokens.refresh_token);
            },
            Persist::Tokens,
        )
    }

    /// Replace the user, keeping the tokens. Fails while signed out.
    pub fn apply_user(&self, user: U) -> AuthResult<()> {
        self.transition(
            SessionInput::UserLoaded,
            None,
            |state| state.user = Some(user),
            Persist::User,
        )
    }

    /// Clear the session and all three storage slots. Idempotent.
    pub fn apply_sign_out(&self) {
        if let Err(e) = self.transition(
            SessionInput::SignOut,
            None,
            |state| *state = SessionState::signed_out(),
            Persist::Clear,
        ) {
            warn!(error = %e, "Sign-out transition rejected");
        }
    }

    pub fn access_token(&self) -> Option<String> {
        self.current.read().state.access_token.clone()
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.current.read().state.refresh_token.clone()
    }

    pub fn user(&self) -> Option<U> {
        self.current.read().state.user.clone()
    }

    pub fn is_signed_in(&self) -> bool {
        self.current.read().state.is_signed_in
    }

    /// Identifies the current session; changes on every sign-in and sign-out.
    pub fn generation(&self) -> u64 {
        self.current.read().generation
    }

    /// Consistent copy of the whole state.
    pub fn snapshot(&self) -> SessionState<U> {
        self.current.read().state.clone()
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus::from(self.current.read().machine.state())
    }

    /// Register an observer for state changes.
    pub fn subscribe<F>(&self, observer: F) -> SubscriptionId
    where
        F: Fn(&SessionState<U>) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        self.observers.lock().push((id, Arc::new(observer)));
        id
    }

    /// Remove an observer. Returns false if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut observers = self.observers.lock();
        let before = observers.len();
        observers.retain(|(existing, _)| *existing != id);
        observers.len() != before
    }

    fn transition<F>(
        &self,
        input: SessionInput,
        expected_generation: Option<u64>,
        update: F,
        persist: Persist,
    ) -> AuthResult<()>
    where
        F: FnOnce(&mut SessionState<U>),
    {
        let persist_guard = self.persist_lock.lock();
        let mut current = self.current.write();
        let old_status = SessionStatus::from(current.machine.state());

        if let Some(expected) = expected_generation {
            if expected != current.generation {
                return Err(AuthError::InvalidStateTransition(format!(
                    "Cannot apply {:?}: session changed since it started",
                    input
                )));
            }
        }

        current.machine.consume(&input).map_err(|_| {
            AuthError::InvalidStateTransition(format!(
                "Cannot apply {:?} in state {:?}",
                input,
                current.machine.state()
            ))
        })?;
        update(&mut current.state);
        if matches!(input, SessionInput::SignIn | SessionInput::SignOut) {
            current.generation += 1;
        }

        let new_status = SessionStatus::from(current.machine.state());
        let snapshot = current.state.clone();
        drop(current);

        debug!(
            old_state = ?old_status,
            new_state = ?new_status,
            input = ?input,
            "Session state transition"
        );

        self.persist(&snapshot, persist);
        drop(persist_guard);

        // Signing out an already signed-out session changes nothing.
        let changed = !matches!(input, SessionInput::SignOut) || old_status.is_signed_in();
        if changed {
            self.notify(&snapshot);
        }
        Ok(())
    }

    fn notify(&self, state: &SessionState<U>) {
        let observers: Vec<SessionObserver<U>> = self
            .observers
            .lock()
            .iter()
            .map(|(_, observer)| Arc::clone(observer))
            .collect();
        for observer in observers {
            observer(state);
        }
    }

    fn persist(&self, state: &SessionState<U>, scope: Persist) {
        let result = match scope {
            Persist::All => self.write_tokens(state).and_then(|_| self.write_user(state)),
            Persist::Tokens => self.write_tokens(state),
            Persist::User => self.write_user(state),
            Persist::Clear => clear_slots(self.storage.as_ref(), &self.keys),
        };
        if let Err(e) = result {
            warn!(error = %e, "Failed to persist session, keeping in-memory state");
        }
    }

    fn write_tokens(&self, state: &SessionState<U>) -> StorageResult<()> {
        if let Some(access_token) = &state.access_token {
            self.storage.set(&self.keys.access_token, access_token)?;
        }
        if let Some(refresh_token) = &state.refresh_token {
            self.storage.set(&self.keys.refresh_token, refresh_token)?;
        }
        Ok(())
    }

    fn write_user(&self, state: &SessionState<U>) -> StorageResult<()> {
        if let Some(user) = &state.user {
            let raw = serde_json::to_string(user)?;
            self.storage.set(&self.keys.user, &raw)?;
        }
        Ok(())
    }
}

/// Remove all three slots, attempting each even if an earlier one fails.
fn clear_slots(storage: &dyn SessionStorage, keys: &StorageKeys) -> StorageResult<()> {
    let mut first_error: Option<StorageError> = None;
    for key in keys.all() {
        if let Err(e) = storage.remove(key) {
            first_error.get_or_insert(e);
        }
    }
    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn load_from_storage<U: DeserializeOwned>(
    storage: &dyn SessionStorage,
    keys: &StorageKeys,
) -> SessionState<U> {
    let slots = (
        storage.get(&keys.access_token),
        storage.get(&keys.refresh_token),
        storage.get(&keys.user),
    );

    let (access_token, refresh_token, raw_user) = match slots {
        (Ok(access), Ok(refresh), Ok(user)) => (access, refresh, user),
        (access, refresh, user) => {
            let error = [access.err(), refresh.err(), user.err()]
                .into_iter()
                .flatten()
                .next()
                .map(|e| e.to_string())
                .unwrap_or_default();
            warn!(error = %error, "Failed to read stored session, starting signed out");
            return SessionState::signed_out();
        }
    };

    match (access_token, refresh_token, raw_user) {
        (Some(access_token), Some(refresh_token), Some(raw_user)) => {
            match serde_json::from_str::<U>(&raw_user) {
                Ok(user) => {
                    info!("Restored session from storage");
                    SessionState::signed_in(AuthTokens::new(access_token, refresh_token), user)
                }
                Err(e) => {
                    warn!(error = %e, "Stored user is unreadable, clearing stored session");
                    discard_stored_session(storage, keys);
                    SessionState::signed_out()
                }
            }
        }
        (None, None, None) => {
            debug!("No stored session");
            SessionState::signed_out()
        }
        _ => {
            warn!("Stored session is incomplete, clearing stored session");
            discard_stored_session(storage, keys);
            SessionState::signed_out()
        }
    }
}

fn discard_stored_session(storage: &dyn SessionStorage, keys: &StorageKeys) {
    if let Err(e) = clear_slots(storage, keys) {
        warn!(error = %e, "Failed to clear stored session");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use session_storage::MemoryStorage;
    use std::sync::atomic::AtomicUsize;
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct TestUser {
        id: u64,
    }

    /// Storage whose writes always fail.
    struct BrokenStorage;

    impl SessionStorage for BrokenStorage {
        fn get(&self, _key: &str) -> StorageResult<Option<String>> {
            Err(StorageError::Backend("unavailable".to_string()))
        }

        fn set(&self, _key: &str, _value: &str) -> StorageResult<()> {
            Err(StorageError::Backend("unavailable".to_string()))
        }

        fn remove(&self, _key: &str) -> StorageResult<bool> {
            Err(StorageError::Backend("unavailable".to_string()))
        }
    }

    /// Storage whose first `set` signals `entered` and then waits for `release`.
    struct GatedStorage {
        inner: MemoryStorage,
        entered: Mutex<Option<mpsc::Sender<()>>>,
        release: Mutex<Option<mpsc::Receiver<()>>>,
    }

    impl SessionStorage for GatedStorage {
        fn get(&self, key: &str) -> StorageResult<Option<String>> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> StorageResult<()> {
            let entered = self.entered.lock().take();
            if let Some(entered) = entered {
                entered.send(()).unwrap();
                let release = self.release.lock().take();
                if let Some(release) = release {
                    release.recv().unwrap();
                }
            }
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> StorageResult<bool> {
            self.inner.remove(key)
        }
    }

    fn create_test_session() -> (Arc<MemoryStorage>, Session<TestUser>) {
        let storage = Arc::new(MemoryStorage::new());
        let session = Session::restore(storage.clone(), StorageKeys::default(), None).unwrap();
        (storage, session)
    }

    #[test]
    fn test_initial_state_is_signed_out() {
        let (_, session) = create_test_session();
        assert!(!session.is_signed_in());
        assert_eq!(session.status(), SessionStatus::SignedOut);
        assert_eq!(session.snapshot(), SessionState::signed_out());
    }

    #[test]
    fn test_sign_in_is_visible_and_persisted() {
        let (storage, session) = create_test_session();

        session
            .apply_sign_in(AuthTokens::new("A1", "R1"), TestUser { id: 1 })
            .unwrap();

        assert!(session.is_signed_in());
        assert_eq!(session.access_token().as_deref(), Some("A1"));
        assert_eq!(session.refresh_token().as_deref(), Some("R1"));
        assert_eq!(session.user(), Some(TestUser { id: 1 }));

        let keys = StorageKeys::default();
        assert_eq!(storage.get(&keys.access_token).unwrap().as_deref(), Some("A1"));
        assert_eq!(storage.get(&keys.refresh_token).unwrap().as_deref(), Some("R1"));
        assert_eq!(storage.get(&keys.user).unwrap().as_deref(), Some(r#"{"id":1}"#));
    }

    #[test]
    fn test_readers_do_not_wait_on_storage_writes() {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let storage = Arc::new(GatedStorage {
            inner: MemoryStorage::new(),
            entered: Mutex::new(Some(entered_tx)),
            release: Mutex::new(Some(release_rx)),
        });
        let session: Arc<Session<TestUser>> =
            Arc::new(Session::restore(storage.clone(), StorageKeys::default(), None).unwrap());

        let writer = {
            let session = session.clone();
            thread::spawn(move || {
                session
                    .apply_sign_in(AuthTokens::new("A1", "R1"), TestUser { id: 1 })
                    .unwrap()
            })
        };
        entered_rx.recv().unwrap();

        // First slot write is still pending; memory already has the new session.
        assert_eq!(session.access_token().as_deref(), Some("A1"));
        assert_eq!(session.user(), Some(TestUser { id: 1 }));
        assert!(storage.inner.is_empty());

        // A second transition queues behind the pending write.
        let queued = {
            let session = session.clone();
            thread::spawn(move || session.apply_sign_out())
        };
        thread::sleep(Duration::from_millis(50));

        let (read_tx, read_rx) = mpsc::channel();
        let reader = {
            let session = session.clone();
            thread::spawn(move || read_tx.send(session.access_token()).unwrap())
        };
        let read = read_rx.recv_timeout(Duration::from_secs(2));

        release_tx.send(()).unwrap();
        writer.join().unwrap();
        queued.join().unwrap();
        reader.join().unwrap();

        assert_eq!(read.unwrap().as_deref(), Some("A1"));
        assert!(!session.is_signed_in());
        assert!(storage.inner.is_empty());
    }

    #[test]
    fn test_refresh_replaces_tokens_keeps_user() {
        let (storage, session) = create_test_session();
        session
            .apply_sign_in(AuthTokens::new("A1", "R1"), TestUser { id: 1 })
            .unwrap();

        session.apply_refresh(session.generation(), AuthTokens::new("A2", "R2")).unwrap();

        assert_eq!(session.access_token().as_deref(), Some("A2"));
        assert_eq!(session.refresh_token().as_deref(), Some("R2"));
        assert_eq!(session.user(), Some(TestUser { id: 1 }));
        assert_eq!(
            storage.get(&StorageKeys::default().access_token).unwrap().as_deref(),
            Some("A2")
        );
    }

    #[test]
    fn test_refresh_while_signed_out_fails_without_changes() {
        let (storage, session) = create_test_session();

        let result = session.apply_refresh(session.generation(), AuthTokens::new("A2", "R2"));

        assert!(matches!(result, Err(AuthError::InvalidStateTransition(_))));
        assert!(!session.is_signed_in());
        assert!(session.access_token().is_none());
        assert!(storage.is_empty());
    }

    #[test]
    fn test_refresh_from_a_replaced_session_is_rejected() {
        let (storage, session) = create_test_session();
        session
            .apply_sign_in(AuthTokens::new("A1", "R1"), TestUser { id: 1 })
            .unwrap();
        let started = session.generation();

        session.apply_sign_out();
        session
            .apply_sign_in(AuthTokens::new("B1", "S1"), TestUser { id: 2 })
            .unwrap();
        let result = session.apply_refresh(started, AuthTokens::new("A2", "R2"));

        assert!(matches!(result, Err(AuthError::InvalidStateTransition(_))));
        assert_eq!(session.access_token().as_deref(), Some("B1"));
        assert_eq!(session.refresh_token().as_deref(), Some("S1"));
        assert_eq!(session.user(), Some(TestUser { id: 2 }));
        assert_eq!(
            storage.get(&StorageKeys::default().access_token).unwrap().as_deref(),
            Some("B1")
        );
    }

    #[test]
    fn test_generation_changes_on_sign_in_and_sign_out_only() {
        let (_, session) = create_test_session();
        let initial = session.generation();

        session
            .apply_sign_in(AuthTokens::new("A1", "R1"), TestUser { id: 1 })
            .unwrap();
        let signed_in = session.generation();
        assert_ne!(signed_in, initial);

        session.apply_refresh(signed_in, AuthTokens::new("A2", "R2")).unwrap();
        session.apply_user(TestUser { id: 2 }).unwrap();
        assert_eq!(session.generation(), signed_in);

        session.apply_sign_out();
        assert_ne!(session.generation(), signed_in);
    }

    #[test]
    fn test_sign_out_clears_memory_and_storage() {
        let (storage, session) = create_test_session();
        session
            .apply_sign_in(AuthTokens::new("A1", "R1"), TestUser { id: 1 })
            .unwrap();

        session.apply_sign_out();

        assert_eq!(session.snapshot(), SessionState::signed_out());
        assert!(storage.is_empty());
    }

    #[test]
    fn test_sign_out_is_idempotent() {
        let (storage, session) = create_test_session();
        session
            .apply_sign_in(AuthTokens::new("A1", "R1"), TestUser { id: 1 })
            .unwrap();

        session.apply_sign_out();
        let first = session.snapshot();
        session.apply_sign_out();

        assert_eq!(session.snapshot(), first);
        assert!(storage.is_empty());
    }

    #[test]
    fn test_apply_user_requires_signed_in() {
        let (_, session) = create_test_session();
        assert!(session.apply_user(TestUser { id: 2 }).is_err());

        session
            .apply_sign_in(AuthTokens::new("A1", "R1"), TestUser { id: 1 })
            .unwrap();
        session.apply_user(TestUser { id: 2 }).unwrap();
        assert_eq!(session.user(), Some(TestUser { id: 2 }));
        assert_eq!(session.access_token().as_deref(), Some("A1"));
    }

    #[test]
    fn test_restore_from_storage() {
        let storage = Arc::new(MemoryStorage::new());
        let keys = StorageKeys::default();
        storage.set(&keys.access_token, "A1").unwrap();
        storage.set(&keys.refresh_token, "R1").unwrap();
        storage.set(&keys.user, r#"{"id":9}"#).unwrap();

        let session: Session<TestUser> = Session::restore(storage, keys, None).unwrap();

        assert!(session.is_signed_in());
        assert_eq!(session.access_token().as_deref(), Some("A1"));
        assert_eq!(session.user(), Some(TestUser { id: 9 }));
    }

    #[test]
    fn test_restore_incomplete_storage_starts_signed_out_and_clears() {
        let storage = Arc::new(MemoryStorage::new());
        let keys = StorageKeys::default();
        storage.set(&keys.access_token, "A1").unwrap();

        let session: Session<TestUser> = Session::restore(storage.clone(), keys, None).unwrap();

        assert!(!session.is_signed_in());
        assert!(storage.is_empty());
    }

    #[test]
    fn test_restore_unreadable_user_starts_signed_out() {
        let storage = Arc::new(MemoryStorage::new());
        let keys = StorageKeys::default();
        storage.set(&keys.access_token, "A1").unwrap();
        storage.set(&keys.refresh_token, "R1").unwrap();
        storage.set(&keys.user, "not json").unwrap();

        let session: Session<TestUser> = Session::restore(storage.clone(), keys, None).unwrap();

        assert!(!session.is_signed_in());
        assert!(storage.is_empty());
    }

    #[test]
    fn test_initial_state_takes_priority_over_storage() {
        let storage = Arc::new(MemoryStorage::new());
        let keys = StorageKeys::default();
        storage.set(&keys.access_token, "STORED").unwrap();
        storage.set(&keys.refresh_token, "STORED").unwrap();
        storage.set(&keys.user, r#"{"id":9}"#).unwrap();

        let initial = SessionState::signed_in(AuthTokens::new("A1", "R1"), TestUser { id: 1 });
        let session = Session::restore(storage, keys, Some(initial.clone())).unwrap();

        assert_eq!(session.snapshot(), initial);
    }

    #[test]
    fn test_inconsistent_initial_state_is_rejected() {
        let initial = SessionState::<TestUser> {
            is_signed_in: true,
            access_token: Some("A1".to_string()),
            refresh_token: None,
            user: None,
        };
        let result = Session::restore(
            Arc::new(MemoryStorage::new()),
            StorageKeys::default(),
            Some(initial),
        );
        assert!(matches!(result, Err(AuthError::InvalidInitialState(_))));
    }

    #[test]
    fn test_storage_failures_do_not_block_transitions() {
        let session: Session<TestUser> =
            Session::restore(Arc::new(BrokenStorage), StorageKeys::default(), None).unwrap();
        assert!(!session.is_signed_in());

        session
            .apply_sign_in(AuthTokens::new("A1", "R1"), TestUser { id: 1 })
            .unwrap();
        assert!(session.is_signed_in());

        session.apply_refresh(session.generation(), AuthTokens::new("A2", "R2")).unwrap();
        assert_eq!(session.access_token().as_deref(), Some("A2"));

        session.apply_sign_out();
        assert!(!session.is_signed_in());
    }

    #[test]
    fn test_observers_see_complete_states() {
        let (_, session) = create_test_session();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();

        session.subscribe(move |state: &SessionState<TestUser>| {
            assert!(state.is_consistent());
            seen_clone.lock().push(state.clone());
        });

        session
            .apply_sign_in(AuthTokens::new("A1", "R1"), TestUser { id: 1 })
            .unwrap();
        session.apply_refresh(session.generation(), AuthTokens::new("A2", "R2")).unwrap();
        session.apply_sign_out();
        // Already signed out: no notification
        session.apply_sign_out();

        let seen = seen.lock();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[0].access_token.as_deref(), Some("A1"));
        assert_eq!(seen[1].access_token.as_deref(), Some("A2"));
        assert!(!seen[2].is_signed_in);
    }

    #[test]
    fn test_unsubscribe_stops_notifications() {
        let (_, session) = create_test_session();
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = count.clone();

        let id = session.subscribe(move |_| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });
        session
            .apply_sign_in(AuthTokens::new("A1", "R1"), TestUser { id: 1 })
            .unwrap();

        assert!(session.unsubscribe(id));
        assert!(!session.unsubscribe(id));
        session.apply_sign_out();

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_observer_can_read_session_during_notification() {
        let (_, session) = create_test_session();
        let session = Arc::new(session);
        let weak = Arc::downgrade(&session);
        let observed = Arc::new(Mutex::new(None));
        let observed_clone = observed.clone();

        session.subscribe(move |_| {
            if let Some(session) = weak.upgrade() {
                *observed_clone.lock() = session.access_token();
            }
        });
        session
            .apply_sign_in(AuthTokens::new("A1", "R1"), TestUser { id: 1 })
            .unwrap();

        assert_eq!(observed.lock().as_deref(), Some("A1"));
    }
}
