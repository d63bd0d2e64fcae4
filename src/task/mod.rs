//! Asynchronous units of work
//!
//! Provides the deferred-result primitive used by the asset loader and the
//! scene machine to join parallel work back into the main loop.

mod deferred;

pub use deferred::{Completer, Deferred, TaskError, join_all};
