use std::collections::VecDeque;

/// Number of levels kept in the sliding window.
pub(crate) const WINDOW_LEN: usize = 20;

/// Baseline level shown for slots with no signal yet.
///
/// Matches the resting waveform: bars are never fully invisible.
pub(crate) const FLOOR_LEVEL: f32 = 0.1;

/// Metering floor in dBFS. Levels at or below this normalize to 0.
const DB_FLOOR: f32 = -60.0;

/// Fixed-length FIFO of normalized metering levels in `[0, 1]`.
///
/// Each push drops the oldest sample and appends one new sample, so the
/// window always holds exactly [`WINDOW_LEN`] elements. Raw decibel
/// readings from the device are normalized via
/// `clamp((dB + 60) / 60, 0, 1)` before insertion.
#[derive(Debug, Clone)]
pub struct MeteringWindow {
    levels: VecDeque<f32>,
}

impl MeteringWindow {
    /// Create a window filled with the resting baseline level.
    pub fn new() -> Self {
        Self {
            levels: VecDeque::from(vec![FLOOR_LEVEL; WINDOW_LEN]),
        }
    }

    /// Normalize a raw dBFS reading into `[0, 1]`.
    pub fn normalize_db(db: f32) -> f32 {
        ((db - DB_FLOOR) / -DB_FLOOR).clamp(0.0, 1.0)
    }

    /// Push a raw dBFS reading, dropping the oldest level.
    pub fn push_db(&mut self, db: f32) {
        self.push(Self::normalize_db(db));
    }

    /// Push an already-normalized level, dropping the oldest one.
    ///
    /// The value is clamped to `[0, 1]` so callers cannot corrupt the
    /// display range.
    pub fn push(&mut self, level: f32) {
        self.levels.pop_front();
        self.levels.push_back(level.clamp(0.0, 1.0));
    }

    /// Reset every slot back to the resting baseline.
    pub fn reset(&mut self) {
        for level in self.levels.iter_mut() {
            *level = FLOOR_LEVEL;
        }
    }

    /// Current levels, oldest first.
    pub fn levels(&self) -> impl Iterator<Item = f32> + '_ {
        self.levels.iter().copied()
    }

    /// Number of levels in the window. Always [`WINDOW_LEN`].
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// The window is never empty; provided for completeness.
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

impl Default for MeteringWindow {
    fn default() -> Self {
        Self::new()
    }
}
