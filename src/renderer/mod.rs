//! Rendering module
//!
//! Drawing loaded content is a backend concern; this module only defines the
//! surface scenes and components draw into.

mod surface;

pub use surface::{DrawCommand, RecordingSurface, RenderSurface};
