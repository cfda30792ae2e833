//! Single-flight execution: concurrent callers share one in-flight operation.
//!
//! The first caller starts the operation; everyone arriving before it settles
//! awaits the same shared future and observes the same outcome. The slot is
//! cleared as the operation settles, before any waiter resumes, so a caller
//! arriving afterwards starts a fresh attempt.

use futures_util::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::trace;

type SharedResult<T, E> = Shared<BoxFuture<'static, Result<T, E>>>;

struct InFlight<T, E> {
    id: u64,
    future: SharedResult<T, E>,
}

/// At most one in-flight operation at a time, shared by every caller.
pub struct SingleFlight<T, E> {
    slot: Arc<Mutex<Option<InFlight<T, E>>>>,
    next_id: AtomicU64,
}

impl<T, E> SingleFlight<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            slot: Arc::new(Mutex::new(None)),
            next_id: AtomicU64::new(1),
        }
    }

    /// Join the in-flight operation, or start one with `start`.
    ///
    /// `start` is only invoked when nothing is in flight. The operation is
    /// driven by whichever waiters are polling it; if every waiter is dropped
    /// it pauses and the next caller resumes it.
    pub async fn run<F, Fut>(&self, start: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let future = {
            let mut slot = self.slot.lock();
            match slot.as_ref() {
                Some(in_flight) => {
                    trace!(flight = in_flight.id, "Joining in-flight operation");
                    in_flight.future.clone()
                }
                None => {
                    let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                    let work = start();
                    let slot_ref = Arc::clone(&self.slot);
                    let future = async move {
                        let result = work.await;
                        let mut slot = slot_ref.lock();
                        if slot.as_ref().map(|in_flight| in_flight.id) == Some(id) {
                            *slot = None;
                        }
                        result
                    }
                    .boxed()
                    .shared();
                    trace!(flight = id, "Starting operation");
                    *slot = Some(InFlight {
                        id,
                        future: future.clone(),
                    });
                    future
                }
            }
        };
        future.await
    }

    /// Whether an operation is currently in flight.
    pub fn is_in_flight(&self) -> bool {
        self.slot.lock().is_some()
    }
}

impl<T, E> Default for SingleFlight<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
