//! The demo arena simulation that feeds the recorder.

pub mod battle;
pub mod entity;
pub mod input;

pub use battle::Battle;
pub use entity::{Actor, ActorKind};
pub use input::ScriptedInput;
