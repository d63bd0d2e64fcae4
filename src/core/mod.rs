//! Core runtime module
//!
//! Contains the frame loop, configuration and shared context

mod engine;
mod time;

pub use engine::{ConfigError, EngineConfig, EngineContext, Runtime};
pub use time::Time;
