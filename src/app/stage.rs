//! Headless scene that replayed sessions are rebuilt into.

use retrace_core::scene::ReplayHost;
use retrace_core::ReconstructedEntity;
use retrace_data::Vec2;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub struct StageEntity {
    pub entity: ReconstructedEntity,
    pub active: bool,
}

/// Owns every entity the replay ever spawned. Deactivated entities stay in
/// place so handles remain valid.
#[derive(Debug, Default)]
pub struct ReplayStage {
    entities: Vec<StageEntity>,
}

impl ReplayStage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entities(&self) -> &[StageEntity] {
        &self.entities
    }

    pub fn get(&self, handle: usize) -> Option<&StageEntity> {
        self.entities.get(handle)
    }

    pub fn active(&self) -> impl Iterator<Item = &ReconstructedEntity> {
        self.entities.iter().filter(|e| e.active).map(|e| &e.entity)
    }

    pub fn active_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a ReconstructedEntity> {
        self.active().filter(move |e| e.name == name)
    }

    /// Active entity count per name.
    pub fn population(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for entity in self.active() {
            *counts.entry(entity.name.clone()).or_insert(0) += 1;
        }
        counts
    }
}

impl ReplayHost for ReplayStage {
    type Handle = usize;

    fn spawn(&mut self, entity: ReconstructedEntity) -> usize {
        self.entities.push(StageEntity {
            entity,
            active: true,
        });
        self.entities.len() - 1
    }

    fn deactivate(&mut self, handle: usize) {
        match self.entities.get_mut(handle) {
            Some(slot) => slot.active = false,
            None => tracing::debug!(handle, "Deactivate for unknown handle"),
        }
    }

    fn set_position(&mut self, handle: usize, position: Vec2) {
        if let Some(slot) = self.entities.get_mut(handle) {
            slot.entity.position = position;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use retrace_core::factory;

    #[test]
    fn test_population_ignores_inactive() {
        let mut stage = ReplayStage::new();
        let a = stage.spawn(factory::create("Enemy", None, Vec2::ZERO));
        stage.spawn(factory::create("Enemy", None, Vec2::ZERO));
        stage.spawn(factory::create("Player", None, Vec2::ZERO));
        stage.deactivate(a);

        let population = stage.population();
        assert_eq!(population.get("Enemy"), Some(&1));
        assert_eq!(population.get("Player"), Some(&1));
        assert_eq!(stage.entities().len(), 3);
    }

    #[test]
    fn test_unknown_handle_is_ignored() {
        let mut stage = ReplayStage::new();
        stage.deactivate(9);
        stage.set_position(9, Vec2::new(1.0, 1.0));
        assert!(stage.entities().is_empty());
    }

    #[test]
    fn test_set_position() {
        let mut stage = ReplayStage::new();
        let h = stage.spawn(factory::create("Bullet", None, Vec2::ZERO));
        stage.set_position(h, Vec2::new(4.0, 2.0));
        assert_eq!(stage.active_named("Bullet").next().map(|e| e.position), Some(Vec2::new(4.0, 2.0)));
    }
}
