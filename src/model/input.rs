//! Scripted keyboard for headless runs.

use retrace_core::scene::InputSource;
use std::collections::HashSet;

pub const KEY_SPACE: u32 = 32;
pub const KEY_W: u32 = 87;
pub const KEY_A: u32 = 65;
pub const KEY_S: u32 = 83;
pub const KEY_D: u32 = 68;

/// Replays a fixed list of `(t_ms, key)` presses.
///
/// After `advance_to(t)` a key reports `just_pressed` when one of its presses
/// falls in `(previous t, t]`.
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    presses: Vec<(u64, u32)>,
    cursor: usize,
    down: HashSet<u32>,
}

impl ScriptedInput {
    pub fn new(mut presses: Vec<(u64, u32)>) -> Self {
        presses.sort_by_key(|(t, _)| *t);
        Self {
            presses,
            cursor: 0,
            down: HashSet::new(),
        }
    }

    /// `key` pressed every `every_ms` from `every_ms` up to `until_ms`.
    pub fn periodic(key: u32, every_ms: u64, until_ms: u64) -> Self {
        let presses = if every_ms == 0 {
            Vec::new()
        } else {
            (1..=until_ms / every_ms).map(|i| (i * every_ms, key)).collect()
        };
        Self::new(presses)
    }

    /// Merges two scripts.
    #[must_use]
    pub fn and(mut self, other: ScriptedInput) -> Self {
        self.presses.extend(other.presses);
        Self::new(self.presses)
    }

    pub fn advance_to(&mut self, t_ms: u64) {
        self.down.clear();
        while let Some(&(t, key)) = self.presses.get(self.cursor) {
            if t > t_ms {
                break;
            }
            self.down.insert(key);
            self.cursor += 1;
        }
    }

    pub fn presses(&self) -> &[(u64, u32)] {
        &self.presses
    }
}

impl InputSource for ScriptedInput {
    fn just_pressed(&self, key: u32) -> bool {
        self.down.contains(&key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_press_is_reported_once() {
        let mut input = ScriptedInput::new(vec![(100, KEY_SPACE), (50, KEY_W)]);
        input.advance_to(60);
        assert!(input.just_pressed(KEY_W));
        assert!(!input.just_pressed(KEY_SPACE));
        input.advance_to(100);
        assert!(input.just_pressed(KEY_SPACE));
        assert!(!input.just_pressed(KEY_W));
        input.advance_to(200);
        assert!(!input.just_pressed(KEY_SPACE));
    }

    #[test]
    fn test_periodic() {
        let input = ScriptedInput::periodic(KEY_SPACE, 250, 1000);
        assert_eq!(input.presses().len(), 4);
        assert_eq!(input.presses()[0], (250, KEY_SPACE));
        assert!(ScriptedInput::periodic(KEY_SPACE, 0, 1000).presses().is_empty());
    }

    #[test]
    fn test_and_keeps_order() {
        let input = ScriptedInput::periodic(KEY_SPACE, 300, 600).and(ScriptedInput::new(vec![(100, KEY_D)]));
        let times: Vec<u64> = input.presses().iter().map(|(t, _)| *t).collect();
        assert_eq!(times, vec![100, 300, 600]);
    }
}
