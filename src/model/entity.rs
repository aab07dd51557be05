use retrace_data::{Appearance, RenderKind, Rgba, Vec2};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActorKind {
    Player,
    Enemy,
    Bullet,
    Decoration,
}

impl ActorKind {
    /// Group name written into keyframes.
    pub fn name(self) -> &'static str {
        match self {
            ActorKind::Player => "Player",
            ActorKind::Enemy => "Enemy",
            ActorKind::Bullet => "Bullet",
            ActorKind::Decoration => "Decoration",
        }
    }

    /// Render hints of every actor of this kind.
    pub fn appearance(self) -> Appearance {
        match self {
            ActorKind::Player => Appearance::new(RenderKind::Rectangle, 24.0, 24.0, Rgba::WHITE),
            ActorKind::Enemy => {
                Appearance::new(RenderKind::Rectangle, 40.0, 40.0, Rgba::new(1.0, 0.5, 0.0, 1.0))
            }
            ActorKind::Bullet => {
                Appearance::new(RenderKind::Circle, 6.0, 6.0, Rgba::new(0.6, 0.8, 1.0, 1.0))
            }
            ActorKind::Decoration => {
                Appearance::new(RenderKind::Circle, 5.0, 5.0, Rgba::new(0.5, 0.5, 1.0, 0.8))
            }
        }
    }

    /// Collision radius.
    pub fn radius(self) -> f32 {
        match self {
            ActorKind::Player => 12.0,
            ActorKind::Enemy => 20.0,
            ActorKind::Bullet => 3.0,
            ActorKind::Decoration => 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Actor {
    /// Unique for the lifetime of a world, never reused.
    pub ordinal: u64,
    pub kind: ActorKind,
    pub position: Vec2,
    pub velocity: Vec2,
    pub appearance: Appearance,
    pub alive: bool,
}

impl Actor {
    pub fn new(ordinal: u64, kind: ActorKind, position: Vec2) -> Self {
        Self {
            ordinal,
            kind,
            position,
            velocity: Vec2::ZERO,
            appearance: kind.appearance(),
            alive: true,
        }
    }

    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn distance_to(&self, other: &Actor) -> f32 {
        let dx = self.position.x - other.position.x;
        let dy = self.position.y - other.position.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn overlaps(&self, other: &Actor) -> bool {
        self.distance_to(other) < self.kind.radius() + other.kind.radius()
    }

    pub fn step(&mut self, dt: f32) {
        self.position.x += self.velocity.x * dt;
        self.position.y += self.velocity.y * dt;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_moves_by_velocity() {
        let mut a = Actor::new(1, ActorKind::Bullet, Vec2::new(0.0, 0.0))
            .with_velocity(Vec2::new(100.0, -50.0));
        a.step(0.5);
        assert_eq!(a.position, Vec2::new(50.0, -25.0));
    }

    #[test]
    fn test_overlap_uses_both_radii() {
        let enemy = Actor::new(1, ActorKind::Enemy, Vec2::new(0.0, 0.0));
        let near = Actor::new(2, ActorKind::Bullet, Vec2::new(22.0, 0.0));
        let far = Actor::new(3, ActorKind::Bullet, Vec2::new(24.0, 0.0));
        assert!(enemy.overlaps(&near));
        assert!(!enemy.overlaps(&far));
    }
}
