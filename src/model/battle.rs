//! A small deterministic arena battle used to produce sessions.
//!
//! The player drifts in the last direction chosen with WASD and fires at the
//! nearest enemy on SPACE. Enemies chase the player and respawn from the
//! arena edges on a timer. Everything random comes from a seeded ChaCha
//! generator, so a seed plus an input script always yields the same run.

use crate::model::entity::{Actor, ActorKind};
use crate::model::input::{KEY_A, KEY_D, KEY_S, KEY_SPACE, KEY_W};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use retrace_core::scene::{EntitySource, EntityView, InputSource};
use retrace_core::DemoConfig;
use retrace_data::{Vec2, Viewport};

pub struct Battle {
    config: DemoConfig,
    rng: ChaCha8Rng,
    actors: Vec<Actor>,
    next_ordinal: u64,
    heading: Vec2,
    elapsed_ms: f64,
    since_spawn_ms: f64,
    score: u32,
}

impl Battle {
    pub fn new(config: DemoConfig) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        let mut battle = Self {
            config,
            rng,
            actors: Vec::new(),
            next_ordinal: 0,
            heading: Vec2::new(1.0, 0.0),
            elapsed_ms: 0.0,
            since_spawn_ms: 0.0,
            score: 0,
        };

        let center = Vec2::new(
            battle.config.width as f32 / 2.0,
            battle.config.height as f32 / 2.0,
        );
        battle.add(ActorKind::Player, center, Vec2::ZERO);
        for _ in 0..battle.config.decorations {
            let position = battle.random_point();
            battle.add(ActorKind::Decoration, position, Vec2::ZERO);
        }
        for _ in 0..battle.config.initial_enemies {
            battle.spawn_enemy();
        }
        battle
    }

    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.config.width, self.config.height)
    }

    pub fn actors(&self) -> &[Actor] {
        &self.actors
    }

    pub fn count(&self, kind: ActorKind) -> usize {
        self.actors.iter().filter(|a| a.kind == kind).count()
    }

    pub fn player(&self) -> Option<&Actor> {
        self.actors.iter().find(|a| a.kind == ActorKind::Player)
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed_ms
    }

    /// Advances the battle by `dt` seconds.
    pub fn update<I>(&mut self, dt: f32, input: &I)
    where
        I: InputSource + ?Sized,
    {
        if !dt.is_finite() || dt <= 0.0 {
            return;
        }
        self.elapsed_ms += f64::from(dt) * 1000.0;
        self.since_spawn_ms += f64::from(dt) * 1000.0;

        self.steer(input);
        if input.just_pressed(KEY_SPACE) {
            self.fire();
        }

        let player_pos = self.player().map(|p| p.position);
        let (width, height) = (self.config.width as f32, self.config.height as f32);
        for actor in &mut self.actors {
            match actor.kind {
                ActorKind::Player => {
                    actor.velocity = Vec2::new(
                        self.heading.x * self.config.player_speed,
                        self.heading.y * self.config.player_speed,
                    );
                    actor.step(dt);
                    actor.position.x = actor.position.x.clamp(0.0, width);
                    actor.position.y = actor.position.y.clamp(0.0, height);
                }
                ActorKind::Enemy => {
                    if let Some(target) = player_pos {
                        actor.velocity = toward(actor.position, target, self.config.enemy_speed);
                    }
                    actor.step(dt);
                }
                ActorKind::Bullet => {
                    actor.step(dt);
                    let p = actor.position;
                    if p.x < 0.0 || p.y < 0.0 || p.x > width || p.y > height {
                        actor.alive = false;
                    }
                }
                ActorKind::Decoration => {}
            }
        }

        self.resolve_hits();
        self.actors.retain(|a| a.alive);

        let interval = self.config.spawn_interval_ms as f64;
        if interval > 0.0 && self.since_spawn_ms >= interval {
            self.since_spawn_ms -= interval;
            if self.count(ActorKind::Enemy) < self.config.max_enemies {
                self.spawn_enemy();
            }
        }
    }

    fn steer<I>(&mut self, input: &I)
    where
        I: InputSource + ?Sized,
    {
        let turns = [
            (KEY_W, Vec2::new(0.0, -1.0)),
            (KEY_S, Vec2::new(0.0, 1.0)),
            (KEY_A, Vec2::new(-1.0, 0.0)),
            (KEY_D, Vec2::new(1.0, 0.0)),
        ];
        if let Some((_, heading)) = turns.iter().find(|(key, _)| input.just_pressed(*key)) {
            self.heading = *heading;
        }
    }

    fn fire(&mut self) {
        let Some(origin) = self.player().map(|p| p.position) else {
            return;
        };
        let target = self
            .actors
            .iter()
            .filter(|a| a.kind == ActorKind::Enemy)
            .min_by(|a, b| {
                distance(origin, a.position).total_cmp(&distance(origin, b.position))
            })
            .map(|a| a.position);
        if let Some(target) = target {
            let velocity = toward(origin, target, self.config.bullet_speed);
            self.add(ActorKind::Bullet, origin, velocity);
        }
    }

    fn resolve_hits(&mut self) {
        let count = self.actors.len();
        for i in 0..count {
            if self.actors[i].kind != ActorKind::Bullet || !self.actors[i].alive {
                continue;
            }
            for j in 0..count {
                let hit = self.actors[j].kind == ActorKind::Enemy
                    && self.actors[j].alive
                    && self.actors[i].overlaps(&self.actors[j]);
                if hit {
                    self.actors[i].alive = false;
                    self.actors[j].alive = false;
                    self.score += 1;
                    break;
                }
            }
        }

        let player = self.player().cloned();
        if let Some(player) = player {
            for enemy in self
                .actors
                .iter_mut()
                .filter(|a| a.kind == ActorKind::Enemy && a.alive)
            {
                if enemy.overlaps(&player) {
                    enemy.alive = false;
                }
            }
        }
    }

    fn spawn_enemy(&mut self) {
        let (width, height) = (self.config.width as f32, self.config.height as f32);
        let along = self.rng.gen_range(0.0..1.0_f32);
        let position = match self.rng.gen_range(0..4) {
            0 => Vec2::new(along * width, 0.0),
            1 => Vec2::new(along * width, height),
            2 => Vec2::new(0.0, along * height),
            _ => Vec2::new(width, along * height),
        };
        self.add(ActorKind::Enemy, position, Vec2::ZERO);
    }

    fn random_point(&mut self) -> Vec2 {
        Vec2::new(
            self.rng.gen_range(0.0..self.config.width as f32),
            self.rng.gen_range(0.0..self.config.height as f32),
        )
    }

    fn add(&mut self, kind: ActorKind, position: Vec2, velocity: Vec2) {
        self.next_ordinal += 1;
        self.actors
            .push(Actor::new(self.next_ordinal, kind, position).with_velocity(velocity));
    }
}

impl EntitySource for Battle {
    fn active_entities(&self) -> Vec<EntityView<'_>> {
        self.actors
            .iter()
            .filter(|a| a.alive)
            .map(|a| {
                EntityView::new(a.kind.name(), a.position)
                    .with_appearance(&a.appearance)
                    .with_ordinal(a.ordinal)
            })
            .collect()
    }
}

fn distance(a: Vec2, b: Vec2) -> f32 {
    ((b.x - a.x).powi(2) + (b.y - a.y).powi(2)).sqrt()
}

fn toward(from: Vec2, to: Vec2, speed: f32) -> Vec2 {
    let d = distance(from, to);
    if d <= f32::EPSILON {
        return Vec2::ZERO;
    }
    Vec2::new((to.x - from.x) / d * speed, (to.y - from.y) / d * speed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::input::ScriptedInput;
    use retrace_core::scene::NoInput;

    fn config() -> DemoConfig {
        DemoConfig {
            seed: 7,
            initial_enemies: 3,
            decorations: 2,
            ..Default::default()
        }
    }

    #[test]
    fn test_initial_population() {
        let battle = Battle::new(config());
        assert_eq!(battle.count(ActorKind::Player), 1);
        assert_eq!(battle.count(ActorKind::Enemy), 3);
        assert_eq!(battle.count(ActorKind::Decoration), 2);
        assert_eq!(battle.active_entities().len(), 6);
    }

    #[test]
    fn test_same_seed_same_run() {
        let mut a = Battle::new(config());
        let mut b = Battle::new(config());
        let mut input_a = ScriptedInput::periodic(KEY_SPACE, 200, 3000);
        let mut input_b = input_a.clone();
        for tick in 1..=180u64 {
            input_a.advance_to(tick * 1000 / 60);
            input_b.advance_to(tick * 1000 / 60);
            a.update(1.0 / 60.0, &input_a);
            b.update(1.0 / 60.0, &input_b);
        }
        assert_eq!(a.actors(), b.actors());
        assert_eq!(a.score(), b.score());
    }

    #[test]
    fn test_space_fires_at_enemy() {
        let mut battle = Battle::new(config());
        let mut input = ScriptedInput::new(vec![(10, KEY_SPACE)]);
        input.advance_to(16);
        battle.update(0.016, &input);
        assert_eq!(battle.count(ActorKind::Bullet), 1);
    }

    #[test]
    fn test_enemies_respawn_up_to_cap() {
        let mut battle = Battle::new(DemoConfig {
            initial_enemies: 0,
            max_enemies: 2,
            spawn_interval_ms: 100,
            enemy_speed: 0.0,
            ..config()
        });
        for _ in 0..10 {
            battle.update(0.1, &NoInput);
        }
        assert_eq!(battle.count(ActorKind::Enemy), 2);
    }

    #[test]
    fn test_ordinals_are_unique() {
        let battle = Battle::new(config());
        let mut ordinals: Vec<u64> = battle.actors().iter().map(|a| a.ordinal).collect();
        ordinals.dedup();
        assert_eq!(ordinals.len(), battle.actors().len());
    }
}
