//! Parsed, time-ordered view of a stored session.
//!
//! Loading never fails. Lines that are not JSON are skipped with a warning,
//! unknown record kinds are skipped silently, and damaged fields inside a
//! known record read as zero or absent.

use retrace_data::{Appearance, EntitySnapshot, InputEvent, LogLine, Viewport, FORMAT_VERSION};
use retrace_io::LogStore;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};

/// One keyframe of the timeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    pub t: u64,
    pub objects: Vec<EntitySnapshot>,
}

impl Frame {
    /// Snapshots grouped by name, keeping their order within each group.
    pub fn groups(&self) -> BTreeMap<&str, Vec<&EntitySnapshot>> {
        let mut groups: BTreeMap<&str, Vec<&EntitySnapshot>> = BTreeMap::new();
        for snap in &self.objects {
            groups.entry(snap.name.as_str()).or_default().push(snap);
        }
        groups
    }
}

/// Lower and upper keyframe around a playback time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bracket {
    pub lower: usize,
    pub upper: usize,
    /// Interpolation weight in `[0, 1]`; zero when both frames share a timestamp.
    pub weight: f32,
}

#[derive(Debug, Clone, Default)]
pub struct Timeline {
    frames: Vec<Frame>,
    inputs: Vec<InputEvent>,
    viewport: Viewport,
    version: Option<String>,
    /// Earliest appearance of each name and the frame that carried it.
    first_appearance: HashMap<String, (usize, Appearance)>,
    skipped_lines: usize,
}

impl Timeline {
    /// Builds a timeline from raw log lines.
    ///
    /// `default_viewport` is used when the log has no header or the header's
    /// dimensions are unusable.
    pub fn load<I, L>(lines: I, default_viewport: Viewport) -> Self
    where
        I: IntoIterator<Item = L>,
        L: AsRef<str>,
    {
        let mut frames = Vec::new();
        let mut inputs = Vec::new();
        let mut header = None;
        let mut skipped_lines = 0;

        for (number, line) in lines.into_iter().enumerate() {
            let line = line.as_ref().trim();
            if line.is_empty() {
                continue;
            }
            match LogLine::decode(line) {
                Ok(Some(LogLine::Header(h))) => {
                    if header.is_none() {
                        header = Some(h);
                    }
                }
                Ok(Some(LogLine::Input(event))) => inputs.push(event),
                Ok(Some(LogLine::Keyframe(k))) => frames.push(Frame {
                    t: k.t,
                    objects: k.objects,
                }),
                Ok(None) => {
                    tracing::debug!(line = number + 1, "Skipping record of unknown kind");
                }
                Err(e) => {
                    skipped_lines += 1;
                    tracing::warn!(line = number + 1, error = %e, "Skipping unreadable log line");
                }
            }
        }

        if !frames.windows(2).all(|w| w[0].t <= w[1].t) {
            tracing::warn!("Keyframes out of order, sorting by timestamp");
            frames.sort_by_key(|f| f.t);
        }
        inputs.sort_by_key(|e| e.t);

        let viewport = match &header {
            Some(h) if !h.viewport().is_empty() => h.viewport(),
            _ => default_viewport,
        };
        let version = header.map(|h| h.version);
        if let Some(v) = &version {
            if v != FORMAT_VERSION {
                tracing::warn!(version = %v, expected = FORMAT_VERSION, "Unexpected log version");
            }
        }

        let mut first_appearance = HashMap::new();
        for (index, frame) in frames.iter().enumerate() {
            for snap in &frame.objects {
                if first_appearance.contains_key(&snap.name) {
                    continue;
                }
                if let Some(look) = snap.appearance() {
                    first_appearance.insert(snap.name.clone(), (index, look));
                }
            }
        }

        Self {
            frames,
            inputs,
            viewport,
            version,
            first_appearance,
            skipped_lines,
        }
    }

    /// Reads `name` from `store`; a read failure yields an empty timeline.
    pub fn from_store<S: LogStore + ?Sized>(store: &S, name: &str, default_viewport: Viewport) -> Self {
        match store.read_all(name) {
            Ok(lines) => Self::load(lines, default_viewport),
            Err(e) => {
                tracing::warn!(name = %name, error = %e, "Could not read recording");
                Self::load(Vec::<String>::new(), default_viewport)
            }
        }
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn inputs(&self) -> &[InputEvent] {
        &self.inputs
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Viewport the session was recorded against.
    pub fn reference_viewport(&self) -> Viewport {
        self.viewport
    }

    /// Header version tag, if the log had a header.
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Lines that were not JSON at all.
    pub fn skipped_lines(&self) -> usize {
        self.skipped_lines
    }

    /// Timestamp of the last keyframe, or zero.
    pub fn duration_ms(&self) -> u64 {
        self.frames.last().map_or(0, |f| f.t)
    }

    /// Index of the last frame with `t <= t_ms`, clamped to the first frame.
    pub fn find_bracket(&self, t_ms: f64) -> Option<usize> {
        if self.frames.is_empty() {
            return None;
        }
        let after = self.frames.partition_point(|f| f.t as f64 <= t_ms);
        Some(after.saturating_sub(1))
    }

    pub fn bracket(&self, t_ms: f64) -> Option<Bracket> {
        let lower = self.find_bracket(t_ms)?;
        let upper = (lower + 1).min(self.frames.len() - 1);
        let (a, b) = (self.frames[lower].t, self.frames[upper].t);
        let weight = if a == b {
            0.0
        } else {
            ((t_ms - a as f64) / (b - a) as f64).clamp(0.0, 1.0) as f32
        };
        Some(Bracket {
            lower,
            upper,
            weight,
        })
    }

    /// First recorded appearance of `name`, provided it was written at or
    /// before frame `upto`.
    pub fn appearance_for(&self, name: &str, upto: usize) -> Option<&Appearance> {
        match self.first_appearance.get(name) {
            Some((index, look)) if *index <= upto => Some(look),
            _ => None,
        }
    }

    /// Inputs with `after < t <= up_to`; `after = None` includes everything
    /// from the start.
    pub fn inputs_between(&self, after: Option<f64>, up_to: f64) -> &[InputEvent] {
        let start = match after {
            Some(after) => self.inputs.partition_point(|e| e.t as f64 <= after),
            None => 0,
        };
        let end = self.inputs.partition_point(|e| e.t as f64 <= up_to);
        if start >= end {
            &[]
        } else {
            &self.inputs[start..end]
        }
    }

    /// SHA-256 over the parsed frames and inputs, hex encoded.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for frame in &self.frames {
            match serde_json::to_vec(frame) {
                Ok(bytes) => hasher.update(&bytes),
                Err(e) => tracing::error!(error = %e, "Failed to serialize frame for fingerprint"),
            }
        }
        for event in &self.inputs {
            hasher.update(event.t.to_le_bytes());
            hasher.update(event.key.to_le_bytes());
        }
        hex::encode(hasher.finalize())
    }
}
