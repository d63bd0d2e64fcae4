//! Input handling module
//!
//! Provides the per-frame key state components read and the polling seam
//! platform backends implement.

mod state;

pub use state::{Input, InputSource, Key, NoInput, ScriptedInput};
