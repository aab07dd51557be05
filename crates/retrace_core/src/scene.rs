//! Boundary with the hosting simulation.
//!
//! The recorder reads live state through [`EntitySource`] and
//! [`InputSource`]; the replay driver writes reconstructed state through
//! [`ReplayHost`]. Both run on the simulation thread.

use crate::factory::ReconstructedEntity;
use retrace_data::{Appearance, Vec2};

/// Read-only view of one live entity.
#[derive(Debug, Clone, Copy)]
pub struct EntityView<'a> {
    pub name: &'a str,
    pub position: Vec2,
    pub appearance: Option<&'a Appearance>,
    /// Stable per-entity ordinal, if the simulation keeps one.
    pub ordinal: Option<u64>,
}

impl<'a> EntityView<'a> {
    #[must_use]
    pub fn new(name: &'a str, position: Vec2) -> Self {
        Self {
            name,
            position,
            appearance: None,
            ordinal: None,
        }
    }

    #[must_use]
    pub fn with_appearance(mut self, appearance: &'a Appearance) -> Self {
        self.appearance = Some(appearance);
        self
    }

    #[must_use]
    pub fn with_ordinal(mut self, ordinal: u64) -> Self {
        self.ordinal = Some(ordinal);
        self
    }
}

pub trait EntitySource {
    /// Currently active entities, in a stable order.
    fn active_entities(&self) -> Vec<EntityView<'_>>;
}

pub trait InputSource {
    /// Whether `key` went down during the current tick.
    fn just_pressed(&self, key: u32) -> bool;
}

/// Input source for hosts without a keyboard.
pub struct NoInput;

impl InputSource for NoInput {
    fn just_pressed(&self, _key: u32) -> bool {
        false
    }
}

/// Replay-side scene the driver populates.
pub trait ReplayHost {
    type Handle: Copy;

    /// Adds an entity to the scene and returns a handle to it.
    fn spawn(&mut self, entity: ReconstructedEntity) -> Self::Handle;
    /// Hides the entity without removing it from the scene.
    fn deactivate(&mut self, handle: Self::Handle);
    fn set_position(&mut self, handle: Self::Handle, position: Vec2);
}
