//! Single-assignment deferred results
//!
//! A [`Deferred`] is the consumer half of a unit of work that completes
//! exactly once. The producer half is a [`Completer`]. Awaiting consumes the
//! deferred, so there is only ever one consumer.
//!
//! # Example
//!
//! ```ignore
//! let task = Deferred::spawn(|| std::fs::read("level.json"));
//! // ... do other work ...
//! let bytes = task.wait()?;
//! ```

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll, Waker};
use std::thread;

/// Failure of a deferred unit of work
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// The unit of work panicked; carries the panic message
    Panicked(String),
    /// The producer was dropped without completing
    Abandoned,
    /// The result was already taken by an earlier await
    AlreadyConsumed,
}

impl fmt::Display for TaskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Panicked(msg) => write!(f, "task panicked: {msg}"),
            Self::Abandoned => write!(f, "task abandoned before completion"),
            Self::AlreadyConsumed => write!(f, "task result already consumed"),
        }
    }
}

impl std::error::Error for TaskError {}

/// State shared by both halves
struct Slot<T> {
    result: Option<Result<T, TaskError>>,
    /// Continuation to resume on completion (at most one consumer)
    waker: Option<Waker>,
    consumed: bool,
}

type Shared<T> = Arc<Mutex<Slot<T>>>;

fn lock<T>(shared: &Shared<T>) -> MutexGuard<'_, Slot<T>> {
    // A panicking worker never holds the lock, but recover anyway.
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Producer half of a deferred result.
///
/// Completing consumes the completer. Dropping it without completing resolves
/// the consumer with [`TaskError::Abandoned`].
pub struct Completer<T> {
    shared: Shared<T>,
    done: bool,
}

impl<T> Completer<T> {
    /// Complete with a value
    pub fn complete(mut self, value: T) {
        self.finish(Ok(value));
    }

    /// Complete with a failure
    pub fn fail(mut self, error: TaskError) {
        self.finish(Err(error));
    }

    fn finish(&mut self, result: Result<T, TaskError>) {
        self.done = true;
        let waker = {
            let mut slot = lock(&self.shared);
            slot.result = Some(result);
            slot.waker.take()
        };
        if let Some(waker) = waker {
            waker.wake();
        }
    }
}

impl<T> Drop for Completer<T> {
    fn drop(&mut self) {
        if !self.done {
            self.finish(Err(TaskError::Abandoned));
        }
    }
}

/// Consumer half of a deferred result.
///
/// Implements [`Future`]; the output is the produced value or the failure
/// captured on the producer side.
pub struct Deferred<T> {
    shared: Shared<T>,
}

impl<T> Deferred<T> {
    /// Create a connected producer/consumer pair
    #[must_use]
    pub fn pair() -> (Completer<T>, Self) {
        let shared = Arc::new(Mutex::new(Slot {
            result: None,
            waker: None,
            consumed: false,
        }));
        (
            Completer {
                shared: Arc::clone(&shared),
                done: false,
            },
            Self { shared },
        )
    }

    /// A deferred that is already complete
    #[must_use]
    pub fn ready(value: T) -> Self {
        let (completer, deferred) = Self::pair();
        completer.complete(value);
        deferred
    }

    /// Whether the producer has finished (successfully or not)
    #[must_use]
    pub fn is_complete(&self) -> bool {
        lock(&self.shared).result.is_some()
    }

    /// Block the calling thread until the result is available
    pub fn wait(self) -> Result<T, TaskError> {
        pollster::block_on(self)
    }
}

impl<T: Send + 'static> Deferred<T> {
    /// Run `work` on its own worker thread.
    ///
    /// A panic inside `work` is captured and handed to the consumer as
    /// [`TaskError::Panicked`].
    pub fn spawn<F>(work: F) -> Self
    where
        F: FnOnce() -> T + Send + 'static,
    {
        let (completer, deferred) = Self::pair();

        let spawned = thread::Builder::new()
            .name("deferred-worker".to_string())
            .spawn(move || match panic::catch_unwind(AssertUnwindSafe(work)) {
                Ok(value) => completer.complete(value),
                Err(payload) => completer.fail(TaskError::Panicked(panic_message(&*payload))),
            });

        // On spawn failure the closure (and its completer) is dropped, which
        // resolves the deferred as abandoned.
        if let Err(e) = spawned {
            log::error!("Failed to spawn worker thread: {e}");
        }

        deferred
    }
}

impl<T> Future for Deferred<T> {
    type Output = Result<T, TaskError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut slot = lock(&self.shared);

        if let Some(result) = slot.result.take() {
            slot.consumed = true;
            return Poll::Ready(result);
        }
        if slot.consumed {
            return Poll::Ready(Err(TaskError::AlreadyConsumed));
        }

        slot.waker = Some(cx.waker().clone());
        Poll::Pending
    }
}

impl<T> fmt::Debug for Deferred<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred")
            .field("complete", &self.is_complete())
            .finish()
    }
}

/// Await every deferred, returning results in submission order.
///
/// All units already run concurrently, so awaiting them one after another
/// finishes when the slowest one does.
pub async fn join_all<T>(tasks: Vec<Deferred<T>>) -> Vec<Result<T, TaskError>> {
    let mut results = Vec::with_capacity(tasks.len());
    for task in tasks {
        results.push(task.await);
    }
    results
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
