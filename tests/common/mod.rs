#![allow(dead_code)]

use retrace_core::scene::{EntitySource, EntityView, InputSource};
use retrace_data::{Appearance, Vec2};
use std::collections::HashSet;

/// One scripted scene member.
#[derive(Debug, Clone)]
pub struct Member {
    pub name: String,
    pub position: Vec2,
    pub appearance: Option<Appearance>,
    pub ordinal: Option<u64>,
}

/// Hand-driven entity and input source for recorder tests.
#[derive(Debug, Clone, Default)]
pub struct ScriptedScene {
    pub members: Vec<Member>,
    pub pressed: HashSet<u32>,
}

impl EntitySource for ScriptedScene {
    fn active_entities(&self) -> Vec<EntityView<'_>> {
        self.members
            .iter()
            .map(|m| {
                let mut view = EntityView::new(&m.name, m.position);
                if let Some(look) = &m.appearance {
                    view = view.with_appearance(look);
                }
                if let Some(ordinal) = m.ordinal {
                    view = view.with_ordinal(ordinal);
                }
                view
            })
            .collect()
    }
}

impl InputSource for ScriptedScene {
    fn just_pressed(&self, key: u32) -> bool {
        self.pressed.contains(&key)
    }
}

impl ScriptedScene {
    pub fn move_all(&mut self, by: Vec2) {
        for m in &mut self.members {
            m.position = Vec2::new(m.position.x + by.x, m.position.y + by.y);
        }
    }

    pub fn remove_named(&mut self, name: &str, keep: usize) {
        let mut seen = 0;
        self.members.retain(|m| {
            if m.name != name {
                return true;
            }
            seen += 1;
            seen <= keep
        });
    }

    pub fn press(&mut self, keys: &[u32]) {
        self.pressed = keys.iter().copied().collect();
    }
}

pub struct SceneBuilder {
    scene: ScriptedScene,
    next_ordinal: u64,
}

impl SceneBuilder {
    pub fn new() -> Self {
        Self {
            scene: ScriptedScene::default(),
            next_ordinal: 1,
        }
    }

    pub fn with_entity(mut self, name: &str, x: f32, y: f32, appearance: Option<Appearance>) -> Self {
        self.scene.members.push(Member {
            name: name.to_string(),
            position: Vec2::new(x, y),
            appearance,
            ordinal: Some(self.next_ordinal),
        });
        self.next_ordinal += 1;
        self
    }

    pub fn with_group(mut self, name: &str, count: usize, appearance: Appearance) -> Self {
        for i in 0..count {
            self = self.with_entity(name, i as f32 * 10.0, 0.0, Some(appearance.clone()));
        }
        self
    }

    pub fn build(self) -> ScriptedScene {
        self.scene
    }
}

/// Builds session logs line by line.
#[derive(Default)]
pub struct LogBuilder {
    lines: Vec<String>,
}

impl LogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(mut self, width: u32, height: u32) -> Self {
        self.lines.push(format!(
            r#"{{"type":"header","t":0,"version":"v1","width":{width},"height":{height}}}"#
        ));
        self
    }

    pub fn input(mut self, t: u64, key: u32) -> Self {
        self.lines.push(format!(r#"{{"type":"input","t":{t},"key":{key}}}"#));
        self
    }

    /// `objects` is the raw JSON array body.
    pub fn keyframe(mut self, t: u64, objects: &str) -> Self {
        self.lines
            .push(format!(r#"{{"type":"keyframe","t":{t},"objects":[{objects}]}}"#));
        self
    }

    pub fn raw(mut self, line: &str) -> Self {
        self.lines.push(line.to_string());
        self
    }

    pub fn build(self) -> Vec<String> {
        self.lines
    }
}
