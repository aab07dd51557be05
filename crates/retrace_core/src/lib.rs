//! # Retrace Core
//!
//! Recording and deterministic replay of a running 2D scene.
//!
//! This crate contains:
//! - The session recorder (header, warm-up window, sampled keyframes, edge-triggered inputs)
//! - The timeline loader that rebuilds a session from its JSON Lines log
//! - The replay driver that interpolates between keyframes and reconciles entity populations
//! - Entity reconstruction from recorded render hints
//! - Configuration, clocks, session counters and structured logging
//!
//! ## Example
//!
//! ```
//! use retrace_core::{ManualClock, Recorder, RecordingConfig, Timeline};
//! use retrace_core::scene::{EntitySource, EntityView, NoInput};
//! use retrace_data::{Vec2, Viewport};
//! use retrace_io::MemoryLogStore;
//!
//! struct Solo;
//! impl EntitySource for Solo {
//!     fn active_entities(&self) -> Vec<EntityView<'_>> {
//!         vec![EntityView::new("Player", Vec2::new(10.0, 20.0))]
//!     }
//! }
//!
//! let store = MemoryLogStore::new();
//! let clock = ManualClock::new();
//! let mut recorder = Recorder::with_clock(store.clone(), RecordingConfig::default(), clock.clone());
//! assert!(recorder.start(Viewport::new(800, 600), "doc", "v1"));
//! clock.advance_ms(600);
//! recorder.on_frame(&Solo, &NoInput);
//! recorder.stop(&Solo);
//!
//! let timeline = Timeline::from_store(&store, "doc", Viewport::new(800, 600));
//! assert_eq!(timeline.len(), 2);
//! ```

/// Time sources for the recorder
pub mod clock;
/// Configuration management for recording and playback
pub mod config;
/// Keyframe interpolation and population reconciliation
pub mod driver;
/// Entity reconstruction from render hints
pub mod factory;
/// Session counters and logging setup
pub mod metrics;
/// Session recorder state machine
pub mod recorder;
/// Collaborator traits for live scenes and replay hosts
pub mod scene;
/// Parsed session logs
pub mod timeline;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AppConfig, DemoConfig, RecordingConfig, ReplayConfig};
pub use driver::{ReplayDriver, TickReport};
pub use factory::{ReconstructedEntity, Visual};
pub use metrics::{init_logging, SessionMetrics};
pub use recorder::{Recorder, RecorderState};
pub use timeline::{Bracket, Frame, Timeline};
