//! Live capture of a simulation session into a log store.
//!
//! The recorder writes three kinds of lines: one `header` when the session
//! starts, an `input` line for every watched key that goes down, and a
//! `keyframe` every `interval_ms` once the warm-up window has passed.
//!
//! Appearance data for an entity name is written only in the first keyframe
//! that contains the name, on every snapshot there that has one. Later
//! keyframes carry just the name and position.
//!
//! Recording is best effort. Failures to open or write the store are logged
//! and turn the recorder inert; they never reach the simulation.

use crate::clock::{Clock, SystemClock};
use crate::config::RecordingConfig;
use crate::metrics::SessionMetrics;
use crate::scene::{EntitySource, InputSource};
use retrace_data::{EntitySnapshot, Header, InputEvent, Keyframe, LogLine, Viewport};
use retrace_io::{IoError, LogStore};
use std::collections::HashSet;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    Idle,
    Active,
    /// Terminal, either after `stop` or after a write failure.
    Stopped,
}

pub struct Recorder<S: LogStore, C: Clock = SystemClock> {
    store: S,
    clock: C,
    config: RecordingConfig,
    state: RecorderState,
    name: String,
    started_at: Duration,
    last_keyframe_at: Duration,
    /// Names whose appearance has already been written.
    known: HashSet<String>,
    metrics: SessionMetrics,
}

impl<S: LogStore> Recorder<S, SystemClock> {
    pub fn new(store: S, config: RecordingConfig) -> Self {
        Self::with_clock(store, config, SystemClock::new())
    }
}

impl<S: LogStore, C: Clock> Recorder<S, C> {
    pub fn with_clock(store: S, config: RecordingConfig, clock: C) -> Self {
        Self {
            store,
            clock,
            config,
            state: RecorderState::Idle,
            name: String::new(),
            started_at: Duration::ZERO,
            last_keyframe_at: Duration::ZERO,
            known: HashSet::new(),
            metrics: SessionMetrics::default(),
        }
    }

    pub fn state(&self) -> RecorderState {
        self.state
    }

    pub fn is_recording(&self) -> bool {
        self.state == RecorderState::Active
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn metrics(&self) -> SessionMetrics {
        self.metrics
    }

    pub fn config(&self) -> &RecordingConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Opens the log and writes the header.
    ///
    /// Returns whether recording began. On failure the recorder stays idle.
    pub fn start(&mut self, viewport: Viewport, name: &str, version: &str) -> bool {
        if self.state != RecorderState::Idle {
            tracing::warn!(state = ?self.state, "Recorder already used, ignoring start");
            return false;
        }
        if let Err(e) = self.store.open_for_write(name) {
            tracing::warn!(name = %name, error = %e, "Could not open recording, continuing without it");
            return false;
        }

        let now = self.clock.now();
        self.started_at = now;
        self.last_keyframe_at = now;
        self.name = name.to_string();
        self.known.clear();
        self.metrics = SessionMetrics::default();

        let header = LogLine::Header(Header {
            t: 0,
            version: version.to_string(),
            width: viewport.width,
            height: viewport.height,
        });
        if let Err(e) = self.write(&header, true) {
            tracing::warn!(name = %name, error = %e, "Could not write header, continuing without recording");
            let _ = self.store.close_write();
            return false;
        }
        self.metrics.headers += 1;
        self.state = RecorderState::Active;
        tracing::info!(
            name = %name,
            width = viewport.width,
            height = viewport.height,
            "Recording started"
        );
        true
    }

    /// Per-tick capture: logs fresh key presses, then a keyframe when one is due.
    pub fn on_frame<E, I>(&mut self, source: &E, input: &I)
    where
        E: EntitySource + ?Sized,
        I: InputSource + ?Sized,
    {
        if self.state != RecorderState::Active {
            return;
        }
        let now = self.clock.now();
        let elapsed = now.saturating_sub(self.started_at);
        let t = elapsed.as_millis() as u64;

        let pressed: Vec<u32> = self
            .config
            .keys
            .iter()
            .copied()
            .filter(|key| input.just_pressed(*key))
            .collect();
        for key in pressed {
            let line = LogLine::Input(InputEvent { t, key });
            if let Err(e) = self.write(&line, false) {
                self.fail(e);
                return;
            }
            self.metrics.inputs += 1;
        }

        if elapsed < Duration::from_millis(self.config.warmup_ms) {
            return;
        }
        if now.saturating_sub(self.last_keyframe_at) >= Duration::from_millis(self.config.interval_ms)
        {
            if let Err(e) = self.write_keyframe(source, t) {
                self.fail(e);
                return;
            }
            self.last_keyframe_at = now;
        }
    }

    /// Writes a closing keyframe and releases the store. No-op unless active.
    pub fn stop<E>(&mut self, source: &E)
    where
        E: EntitySource + ?Sized,
    {
        if self.state != RecorderState::Active {
            return;
        }
        let t = self.clock.now().saturating_sub(self.started_at).as_millis() as u64;
        if let Err(e) = self.write_keyframe(source, t) {
            self.fail(e);
            return;
        }
        if let Err(e) = self.store.close_write() {
            tracing::warn!(name = %self.name, error = %e, "Could not close recording");
        }
        self.state = RecorderState::Stopped;
        self.known.clear();
        tracing::info!(
            name = %self.name,
            duration_ms = t,
            keyframes = self.metrics.keyframes,
            inputs = self.metrics.inputs,
            "Recording stopped"
        );
    }

    fn write_keyframe<E>(&mut self, source: &E, t: u64) -> Result<(), IoError>
    where
        E: EntitySource + ?Sized,
    {
        let entities = source.active_entities();
        let mut objects = Vec::with_capacity(entities.len());
        let mut first_seen: HashSet<&str> = HashSet::new();
        for entity in entities {
            let mut snap = EntitySnapshot::new(entity.name, entity.position);
            if !self.known.contains(entity.name) {
                first_seen.insert(entity.name);
                if let Some(look) = entity.appearance {
                    snap = snap.with_appearance(look);
                }
            }
            if self.config.stable_ids {
                if let Some(id) = entity.ordinal {
                    snap = snap.with_id(id);
                }
            }
            objects.push(snap);
        }
        self.known.extend(first_seen.into_iter().map(str::to_string));
        let count = objects.len() as u64;
        self.write(&LogLine::Keyframe(Keyframe { t, objects }), true)?;
        self.metrics.keyframes += 1;
        self.metrics.snapshots += count;
        Ok(())
    }

    fn write(&mut self, line: &LogLine, flush: bool) -> Result<(), IoError> {
        let encoded = line.encode()?;
        self.store.append_line(&encoded)?;
        if flush {
            self.store.flush()?;
        }
        Ok(())
    }

    fn fail(&mut self, error: IoError) {
        self.metrics.write_failures += 1;
        tracing::warn!(name = %self.name, error = %error, "Recording write failed, recorder disabled");
        let _ = self.store.close_write();
        self.state = RecorderState::Stopped;
        self.known.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::scene::{EntityView, NoInput};
    use retrace_data::{Appearance, RenderKind, Rgba, Vec2};
    use retrace_io::MemoryLogStore;

    struct Crowd {
        look: Appearance,
        members: Vec<(&'static str, Vec2)>,
    }

    impl EntitySource for Crowd {
        fn active_entities(&self) -> Vec<EntityView<'_>> {
            self.members
                .iter()
                .map(|(name, pos)| EntityView::new(name, *pos).with_appearance(&self.look))
                .collect()
        }
    }

    struct Keys(Vec<u32>);

    impl InputSource for Keys {
        fn just_pressed(&self, key: u32) -> bool {
            self.0.contains(&key)
        }
    }

    fn crowd() -> Crowd {
        Crowd {
            look: Appearance::new(RenderKind::Rectangle, 20.0, 20.0, Rgba::new(1.0, 0.0, 0.0, 1.0)),
            members: vec![("Enemy", Vec2::new(1.0, 1.0)), ("Enemy", Vec2::new(2.0, 2.0))],
        }
    }

    fn recorder() -> (Recorder<MemoryLogStore, ManualClock>, MemoryLogStore, ManualClock) {
        let store = MemoryLogStore::new();
        let clock = ManualClock::new();
        let rec = Recorder::with_clock(store.clone(), RecordingConfig::default(), clock.clone());
        (rec, store, clock)
    }

    fn decoded(store: &MemoryLogStore, name: &str) -> Vec<LogLine> {
        store
            .read_all(name)
            .unwrap()
            .iter()
            .filter_map(|l| LogLine::decode(l).unwrap())
            .collect()
    }

    #[test]
    fn test_start_writes_flushed_header() {
        let (mut rec, store, _) = recorder();
        assert!(rec.start(Viewport::new(1600, 900), "s", "v1"));
        assert_eq!(rec.state(), RecorderState::Active);
        let lines = decoded(&store, "s");
        assert_eq!(lines.len(), 1);
        assert!(matches!(&lines[0], LogLine::Header(h) if h.width == 1600 && h.version == "v1"));
    }

    #[test]
    fn test_open_failure_stays_idle() {
        let (mut rec, store, _) = recorder();
        store.set_fail_open(true);
        assert!(!rec.start(Viewport::new(1, 1), "s", "v1"));
        assert_eq!(rec.state(), RecorderState::Idle);
        rec.on_frame(&crowd(), &NoInput);
        rec.stop(&crowd());
        assert!(store.list_recordings().unwrap().is_empty());
    }

    #[test]
    fn test_warmup_and_interval() {
        let (mut rec, store, clock) = recorder();
        rec.start(Viewport::new(800, 600), "s", "v1");
        let scene = crowd();
        for _ in 0..29 {
            clock.advance_ms(16);
            rec.on_frame(&scene, &NoInput);
        }
        // 464ms elapsed: still warming up
        assert_eq!(rec.metrics().keyframes, 0);
        clock.advance_ms(40);
        rec.on_frame(&scene, &NoInput);
        assert_eq!(rec.metrics().keyframes, 1);
        clock.advance_ms(99);
        rec.on_frame(&scene, &NoInput);
        assert_eq!(rec.metrics().keyframes, 1);
        clock.advance_ms(1);
        rec.on_frame(&scene, &NoInput);
        assert_eq!(rec.metrics().keyframes, 2);
        assert_eq!(decoded(&store, "s").len(), 3);
    }

    #[test]
    fn test_appearance_only_in_first_keyframe() {
        let (mut rec, store, clock) = recorder();
        rec.start(Viewport::new(800, 600), "s", "v1");
        let scene = crowd();
        for _ in 0..3 {
            clock.advance_ms(500);
            rec.on_frame(&scene, &NoInput);
        }
        rec.stop(&scene);
        let stamped: Vec<usize> = decoded(&store, "s")
            .iter()
            .filter_map(|l| match l {
                LogLine::Keyframe(k) => Some(k.objects.iter().filter(|o| o.has_appearance()).count()),
                _ => None,
            })
            .collect();
        assert_eq!(stamped, vec![2, 0, 0, 0]);
    }

    #[test]
    fn test_appearance_taken_from_later_sibling() {
        struct Mixed {
            look: Appearance,
        }
        impl EntitySource for Mixed {
            fn active_entities(&self) -> Vec<EntityView<'_>> {
                vec![
                    EntityView::new("Enemy", Vec2::new(1.0, 1.0)),
                    EntityView::new("Enemy", Vec2::new(2.0, 2.0)).with_appearance(&self.look),
                    EntityView::new("Enemy", Vec2::new(3.0, 3.0)).with_appearance(&self.look),
                ]
            }
        }
        let scene = Mixed {
            look: Appearance::new(RenderKind::Circle, 12.0, 12.0, Rgba::WHITE),
        };
        let (mut rec, store, clock) = recorder();
        rec.start(Viewport::new(800, 600), "s", "v1");
        clock.advance_ms(600);
        rec.on_frame(&scene, &NoInput);
        rec.stop(&scene);

        let frames: Vec<Keyframe> = decoded(&store, "s")
            .into_iter()
            .filter_map(|l| match l {
                LogLine::Keyframe(k) => Some(k),
                _ => None,
            })
            .collect();
        assert_eq!(frames.len(), 2);
        let first: Vec<bool> = frames[0].objects.iter().map(|o| o.has_appearance()).collect();
        assert_eq!(first, vec![false, true, true]);
        assert_eq!(
            frames[0].objects[1].appearance().map(|a| a.kind),
            Some(RenderKind::Circle)
        );
        assert!(frames[1].objects.iter().all(|o| !o.has_appearance()));
    }

    #[test]
    fn test_inputs_are_not_flushed_eagerly() {
        let (mut rec, store, clock) = recorder();
        rec.start(Viewport::new(800, 600), "s", "v1");
        clock.advance_ms(10);
        rec.on_frame(&crowd(), &Keys(vec![32, 999]));
        assert_eq!(rec.metrics().inputs, 1);
        assert_eq!(store.pending_len(), 1);
        clock.advance_ms(600);
        rec.on_frame(&crowd(), &NoInput);
        let lines = decoded(&store, "s");
        assert_eq!(lines[1], LogLine::Input(InputEvent { t: 10, key: 32 }));
        assert!(matches!(lines[2], LogLine::Keyframe(_)));
    }

    #[test]
    fn test_stop_twice_writes_one_final_keyframe() {
        let (mut rec, store, clock) = recorder();
        rec.start(Viewport::new(800, 600), "s", "v1");
        clock.advance_ms(50);
        rec.stop(&crowd());
        rec.stop(&crowd());
        assert_eq!(rec.state(), RecorderState::Stopped);
        assert!(!store.is_open());
        let lines = decoded(&store, "s");
        assert_eq!(lines.len(), 2);
        assert!(matches!(&lines[1], LogLine::Keyframe(k) if k.t == 50));
        assert!(!rec.start(Viewport::new(800, 600), "again", "v1"));
    }

    #[test]
    fn test_write_failure_disables_recorder() {
        let (mut rec, store, clock) = recorder();
        rec.start(Viewport::new(800, 600), "s", "v1");
        store.set_fail_append(true);
        clock.advance_ms(600);
        rec.on_frame(&crowd(), &NoInput);
        assert_eq!(rec.state(), RecorderState::Stopped);
        assert_eq!(rec.metrics().write_failures, 1);
        rec.on_frame(&crowd(), &NoInput);
        assert_eq!(rec.metrics().write_failures, 1);
    }

    #[test]
    fn test_stable_ids_opt_in() {
        struct Numbered;
        impl EntitySource for Numbered {
            fn active_entities(&self) -> Vec<EntityView<'_>> {
                vec![EntityView::new("Enemy", Vec2::ZERO).with_ordinal(7)]
            }
        }
        let (mut rec, store, _) = recorder();
        rec.start(Viewport::new(1, 1), "plain", "v1");
        rec.stop(&Numbered);
        assert!(matches!(&decoded(&store, "plain")[1], LogLine::Keyframe(k) if k.objects[0].id.is_none()));

        let config = RecordingConfig {
            stable_ids: true,
            ..Default::default()
        };
        let mut rec = Recorder::with_clock(store.clone(), config, ManualClock::new());
        rec.start(Viewport::new(1, 1), "ids", "v1");
        rec.stop(&Numbered);
        assert!(matches!(&decoded(&store, "ids")[1], LogLine::Keyframe(k) if k.objects[0].id == Some(7)));
    }
}
