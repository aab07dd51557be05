//! Turns recorded render hints back into drawable entities.

use retrace_data::{Appearance, RenderKind, Rgba, Vec2};

/// Edge length used when a recorded size is missing or not positive.
pub const DEFAULT_SIZE: f32 = 20.0;

/// Group whose members are drawn with the player visual.
pub const PLAYER_NAME: &str = "Player";

#[derive(Debug, Clone, PartialEq)]
pub enum Visual {
    /// The player's composite sprite; ignores recorded hints.
    Player,
    Shape {
        kind: RenderKind,
        size: Vec2,
        color: Rgba,
        image: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReconstructedEntity {
    pub name: String,
    pub position: Vec2,
    pub visual: Visual,
}

#[must_use]
pub fn is_player(name: &str) -> bool {
    name.eq_ignore_ascii_case(PLAYER_NAME)
}

/// Builds the entity the live simulation would have drawn for `name`.
///
/// Absent hints produce a 20×20 opaque white rectangle.
#[must_use]
pub fn create(name: &str, hints: Option<&Appearance>, position: Vec2) -> ReconstructedEntity {
    let visual = if is_player(name) {
        Visual::Player
    } else {
        let size = |v: f32| if v > 0.0 { v } else { DEFAULT_SIZE };
        match hints {
            Some(h) => Visual::Shape {
                kind: h.kind,
                size: Vec2::new(size(h.width), size(h.height)),
                color: h.color.unwrap_or(Rgba::WHITE),
                image: h.image.clone().filter(|p| !p.is_empty()),
            },
            None => Visual::Shape {
                kind: RenderKind::Rectangle,
                size: Vec2::new(DEFAULT_SIZE, DEFAULT_SIZE),
                color: Rgba::WHITE,
                image: None,
            },
        }
    };
    ReconstructedEntity {
        name: name.to_string(),
        position,
        visual,
    }
}
