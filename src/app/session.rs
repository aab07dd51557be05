//! Headless recording, playback and inspection of demo sessions.

use crate::app::stage::ReplayStage;
use crate::model::input::{ScriptedInput, KEY_A, KEY_D, KEY_S, KEY_SPACE, KEY_W};
use crate::model::Battle;
use anyhow::Result;
use retrace_core::{AppConfig, Clock, ManualClock, Recorder, ReplayDriver, SessionMetrics, Timeline};
use retrace_data::Viewport;
use retrace_io::{IoError, LogStore};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordSummary {
    pub name: String,
    pub duration_ms: u64,
    pub ticks: u64,
    pub metrics: SessionMetrics,
    pub final_population: usize,
    pub score: u32,
}

/// Fire every 250 ms and turn clockwise once a second.
pub fn default_script(duration_ms: u64) -> ScriptedInput {
    let turns = [KEY_D, KEY_S, KEY_A, KEY_W];
    let steering = (1..=duration_ms / 1000)
        .map(|second| (second * 1000, turns[(second as usize - 1) % turns.len()]))
        .collect();
    ScriptedInput::periodic(KEY_SPACE, 250, duration_ms).and(ScriptedInput::new(steering))
}

/// Runs the demo battle for `duration_ms` of simulated time at
/// `config.replay.fps` and records it into `store` under `name`.
///
/// Time comes from a manual clock, so the run is as fast as the machine
/// allows and fully reproducible.
pub fn record_demo<S: LogStore>(
    config: &AppConfig,
    store: S,
    name: &str,
    duration_ms: u64,
    mut input: ScriptedInput,
) -> Result<(RecordSummary, S)> {
    let clock = ManualClock::new();
    let mut recorder = Recorder::with_clock(store, config.recording.clone(), clock.clone());
    let mut battle = Battle::new(config.demo.clone());

    if !recorder.start(battle.viewport(), name, &config.recording.version) {
        anyhow::bail!("could not start recording {name}");
    }

    let fps = config.replay.fps.max(1);
    let frame = Duration::from_secs_f64(1.0 / f64::from(fps));
    let dt = frame.as_secs_f32();
    let mut ticks = 0u64;
    while elapsed_ms(&clock) < duration_ms {
        clock.advance(frame);
        input.advance_to(elapsed_ms(&clock));
        battle.update(dt, &input);
        recorder.on_frame(&battle, &input);
        ticks += 1;
    }
    recorder.stop(&battle);

    let metrics = recorder.metrics();
    if metrics.write_failures > 0 {
        tracing::warn!(name = %name, failures = metrics.write_failures, "Recording ended early");
    }
    let summary = RecordSummary {
        name: name.to_string(),
        duration_ms: elapsed_ms(&clock),
        ticks,
        metrics,
        final_population: battle.actors().len(),
        score: battle.score(),
    };
    tracing::info!(
        name = %name,
        ticks,
        keyframes = metrics.keyframes,
        "Demo session recorded"
    );
    Ok((summary, recorder.into_store()))
}

/// Active entity counts at one point of playback.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PopulationSample {
    pub t_ms: u64,
    pub population: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplaySummary {
    pub name: String,
    pub frames: usize,
    pub duration_ms: u64,
    pub ticks: u64,
    pub spawned: usize,
    pub retired: usize,
    pub inputs: Vec<u32>,
    /// One sample per whole second of playback, plus the final state.
    pub samples: Vec<PopulationSample>,
}

/// Plays `name` back headlessly at `config.replay.fps`.
pub fn replay_recording<S: LogStore + ?Sized>(
    config: &AppConfig,
    store: &S,
    name: &str,
    target: Option<Viewport>,
) -> Result<ReplaySummary> {
    config.validate()?;
    let fallback = Viewport::new(config.replay.default_width, config.replay.default_height);
    let timeline = load_timeline(store, name, fallback)?;
    let duration_ms = timeline.duration_ms();
    let frames = timeline.len();

    let mut driver = ReplayDriver::with_config(timeline, &config.replay);
    if let Some(target) = target {
        driver = driver.with_target_viewport(target);
    }
    let mut stage = ReplayStage::new();

    let fps = config.replay.fps.max(1);
    let dt = 1.0 / fps as f32;
    let step_ms = 1000.0 / f64::from(fps) * f64::from(config.replay.speed);
    let max_ticks = (duration_ms as f64 / step_ms).ceil() as u64 + 1;

    let mut summary = ReplaySummary {
        name: name.to_string(),
        frames,
        duration_ms,
        ticks: 0,
        spawned: 0,
        retired: 0,
        inputs: Vec::new(),
        samples: Vec::new(),
    };
    let mut next_sample = 1000u64;
    while summary.ticks <= max_ticks {
        let report = driver.advance(dt, &mut stage);
        summary.ticks += 1;
        summary.spawned += report.spawned;
        summary.retired += report.retired;
        summary.inputs.extend(report.inputs);

        let t = report.t_ms as u64;
        if t >= next_sample {
            summary.samples.push(PopulationSample {
                t_ms: t,
                population: stage.population(),
            });
            next_sample = (t / 1000 + 1) * 1000;
        }
        if driver.is_finished() || frames == 0 {
            break;
        }
    }
    if summary.samples.last().map(|s| s.t_ms) != Some(driver.elapsed_ms() as u64) {
        summary.samples.push(PopulationSample {
            t_ms: driver.elapsed_ms() as u64,
            population: stage.population(),
        });
    }
    tracing::info!(
        name = %name,
        ticks = summary.ticks,
        spawned = summary.spawned,
        retired = summary.retired,
        "Replay finished"
    );
    Ok(summary)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Inspection {
    pub name: String,
    pub version: Option<String>,
    pub width: u32,
    pub height: u32,
    pub frames: usize,
    pub inputs: usize,
    pub duration_ms: u64,
    pub skipped_lines: usize,
    /// Largest population of each name across all keyframes.
    pub peak_population: BTreeMap<String, usize>,
    pub fingerprint: String,
}

pub fn inspect_recording<S: LogStore + ?Sized>(
    config: &AppConfig,
    store: &S,
    name: &str,
) -> Result<Inspection> {
    let fallback = Viewport::new(config.replay.default_width, config.replay.default_height);
    let timeline = load_timeline(store, name, fallback)?;

    let mut peak_population = BTreeMap::new();
    for frame in timeline.frames() {
        for (group, members) in frame.groups() {
            let peak = peak_population.entry(group.to_string()).or_insert(0);
            *peak = members.len().max(*peak);
        }
    }
    let viewport = timeline.reference_viewport();
    Ok(Inspection {
        name: name.to_string(),
        version: timeline.version().map(str::to_string),
        width: viewport.width,
        height: viewport.height,
        frames: timeline.len(),
        inputs: timeline.inputs().len(),
        duration_ms: timeline.duration_ms(),
        skipped_lines: timeline.skipped_lines(),
        peak_population,
        fingerprint: timeline.fingerprint(),
    })
}

fn elapsed_ms<C: Clock>(clock: &C) -> u64 {
    clock.now().as_millis() as u64
}

fn load_timeline<S: LogStore + ?Sized>(store: &S, name: &str, fallback: Viewport) -> Result<Timeline> {
    let lines = store.read_all(name)?;
    if lines.is_empty() {
        return Err(IoError::not_found(name).into());
    }
    Ok(Timeline::load(lines, fallback))
}
