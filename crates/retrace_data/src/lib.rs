//! # Retrace Data
//!
//! Wire types shared by the recorder and the replayer.
//!
//! A session log is UTF-8 JSON Lines. Each line is self-tagged by `"type"`:
//! one `header`, then any mix of `input` and `keyframe` records in time order.

pub mod geometry;
/// Forgiving decoders used by the line types
pub mod lenient;
pub mod line;
pub mod snapshot;

pub use geometry::{Vec2, Viewport};
pub use line::{Header, InputEvent, Keyframe, LogLine};
pub use snapshot::{Appearance, EntitySnapshot, RenderKind, Rgba};

/// Version tag written into every header.
pub const FORMAT_VERSION: &str = "v1";

/// File extension of session logs.
pub const LOG_EXTENSION: &str = "jsonl";
