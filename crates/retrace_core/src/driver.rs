//! Playback of a [`Timeline`] onto a [`ReplayHost`].
//!
//! Recorded entities have no identity beyond their name, so the driver keeps
//! a pool of live handles per name and matches them to snapshots by position
//! within the group. Each tick the pool for every name in the current lower
//! keyframe is grown or shrunk to that keyframe's count; names missing from
//! it are retired entirely. Retired entities are deactivated in the host, not
//! removed.
//!
//! When two entities of the same name swap places in the snapshot order the
//! replay shows them jumping instead of each following its own path. Logs
//! written with stable ids avoid that between the two bracketing frames.

use crate::config::ReplayConfig;
use crate::factory;
use crate::scene::ReplayHost;
use crate::timeline::Timeline;
use retrace_data::{Appearance, EntitySnapshot, Vec2, Viewport};
use std::collections::{BTreeMap, HashMap};

/// What one call to [`ReplayDriver::advance`] did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Playback time after the tick, in milliseconds.
    pub t_ms: f64,
    /// Index of the lower bracketing keyframe.
    pub frame: Option<usize>,
    pub spawned: usize,
    pub retired: usize,
    /// Key codes recorded in the time span this tick covered.
    pub inputs: Vec<u32>,
}

pub struct ReplayDriver<H> {
    timeline: Timeline,
    elapsed_ms: f64,
    speed: f64,
    target: Option<Viewport>,
    appearance_cache: HashMap<String, Appearance>,
    pool: BTreeMap<String, Vec<H>>,
    last_input_t: Option<f64>,
}

impl<H: Copy> ReplayDriver<H> {
    pub fn new(timeline: Timeline) -> Self {
        Self {
            timeline,
            elapsed_ms: 0.0,
            speed: 1.0,
            target: None,
            appearance_cache: HashMap::new(),
            pool: BTreeMap::new(),
            last_input_t: None,
        }
    }

    pub fn with_config(timeline: Timeline, config: &ReplayConfig) -> Self {
        let mut driver = Self::new(timeline);
        driver.set_speed(config.speed);
        driver
    }

    /// Scales positions from the recorded viewport onto `target`.
    #[must_use]
    pub fn with_target_viewport(mut self, target: Viewport) -> Self {
        self.target = Some(target);
        self
    }

    /// Non-finite or non-positive rates are ignored.
    pub fn set_speed(&mut self, speed: f32) {
        if speed.is_finite() && speed > 0.0 {
            self.speed = f64::from(speed);
        } else {
            tracing::debug!(speed, "Ignoring invalid playback speed");
        }
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed_ms
    }

    pub fn is_finished(&self) -> bool {
        !self.timeline.is_empty() && self.elapsed_ms >= self.timeline.duration_ms() as f64
    }

    /// Live handles for `name`, oldest first.
    pub fn pool(&self, name: &str) -> &[H] {
        self.pool.get(name).map_or(&[], Vec::as_slice)
    }

    pub fn active_count(&self, name: &str) -> usize {
        self.pool(name).len()
    }

    pub fn active_total(&self) -> usize {
        self.pool.values().map(Vec::len).sum()
    }

    /// Moves the playhead; the scene catches up on the next `advance`.
    pub fn seek(&mut self, t_ms: f64) {
        let duration = self.timeline.duration_ms() as f64;
        self.elapsed_ms = if t_ms.is_finite() {
            t_ms.clamp(0.0, duration)
        } else {
            0.0
        };
        self.last_input_t = (self.elapsed_ms > 0.0).then_some(self.elapsed_ms);
    }

    /// Advances playback by `dt` seconds and brings the host in line with
    /// the recorded state at the new time.
    pub fn advance<R>(&mut self, dt: f32, host: &mut R) -> TickReport
    where
        R: ReplayHost<Handle = H>,
    {
        if self.timeline.is_empty() {
            return TickReport::default();
        }
        let duration = self.timeline.duration_ms() as f64;
        let step = if dt.is_finite() {
            f64::from(dt) * 1000.0 * self.speed
        } else {
            0.0
        };
        self.elapsed_ms = (self.elapsed_ms + step).clamp(0.0, duration);
        let t = self.elapsed_ms;

        let inputs = self
            .timeline
            .inputs_between(self.last_input_t, t)
            .iter()
            .map(|e| e.key)
            .collect();
        self.last_input_t = Some(t);

        let mut report = TickReport {
            t_ms: t,
            inputs,
            ..Default::default()
        };
        let Some(bracket) = self.timeline.bracket(t) else {
            return report;
        };
        report.frame = Some(bracket.lower);

        let scale = self
            .target
            .map_or(Vec2::new(1.0, 1.0), |target| {
                self.timeline.reference_viewport().scale_to(target)
            });
        let frames = self.timeline.frames();
        let a_groups = frames[bracket.lower].groups();
        let b_groups = frames[bracket.upper].groups();

        for (name, snaps) in &a_groups {
            if !self.appearance_cache.contains_key(*name) {
                let look = snaps
                    .iter()
                    .find_map(|s| s.appearance())
                    .or_else(|| self.timeline.appearance_for(name, bracket.lower).cloned());
                if let Some(look) = look {
                    self.appearance_cache.insert((*name).to_string(), look);
                }
            }

            let members = self.pool.entry((*name).to_string()).or_default();
            while members.len() < snaps.len() {
                let snap = snaps[members.len()];
                let entity = factory::create(
                    name,
                    self.appearance_cache.get(*name),
                    scaled(snap.position(), scale),
                );
                members.push(host.spawn(entity));
                report.spawned += 1;
            }
            while members.len() > snaps.len() {
                if let Some(handle) = members.pop() {
                    host.deactivate(handle);
                    report.retired += 1;
                }
            }

            let far = b_groups.get(name).map_or(&[][..], Vec::as_slice);
            for (index, (handle, &near)) in members.iter().zip(snaps.iter()).enumerate() {
                let other = counterpart(near, index, far).unwrap_or(near);
                let position = near.position().lerp(other.position(), bracket.weight);
                host.set_position(*handle, scaled(position, scale));
            }
        }

        let absent: Vec<String> = self
            .pool
            .keys()
            .filter(|name| !a_groups.contains_key(name.as_str()))
            .cloned()
            .collect();
        for name in absent {
            if let Some(members) = self.pool.remove(&name) {
                report.retired += members.len();
                for handle in members {
                    host.deactivate(handle);
                }
            }
        }

        if report.spawned > 0 || report.retired > 0 {
            tracing::trace!(
                t_ms = t,
                spawned = report.spawned,
                retired = report.retired,
                "Replay population changed"
            );
        }
        report
    }
}

/// Snapshot in the far frame that `near` moves towards: same stable id when
/// both carry one, otherwise the same index within the group.
fn counterpart<'a>(
    near: &EntitySnapshot,
    index: usize,
    far: &[&'a EntitySnapshot],
) -> Option<&'a EntitySnapshot> {
    if let Some(id) = near.id {
        if far.iter().any(|s| s.id.is_some()) {
            return far.iter().copied().find(|s| s.id == Some(id));
        }
    }
    far.get(index).copied()
}

fn scaled(position: Vec2, scale: Vec2) -> Vec2 {
    Vec2::new(position.x * scale.x, position.y * scale.y)
}
