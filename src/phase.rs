use crate::constants::PHASE_TABLE;
use crate::error::ConfigError;
use crate::types::PhaseMode;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhaseSegment {
    pub duration: f32,
    pub mode: PhaseMode,
}

/// The built-in scatter/chase timeline.
pub fn classic_table() -> Vec<PhaseSegment> {
    PHASE_TABLE
        .iter()
        .map(|&(duration, mode)| PhaseSegment { duration, mode })
        .collect()
}

/// Global scatter/chase timeline. The last segment never ends.
#[derive(Clone, Debug)]
pub struct PhaseScheduler {
    segments: Vec<PhaseSegment>,
    index: usize,
    remaining: f32,
}

impl PhaseScheduler {
    pub fn new(segments: Vec<PhaseSegment>) -> Result<Self, ConfigError> {
        let Some(first) = segments.first().copied() else {
            return Err(ConfigError::EmptyPhaseTable);
        };
        for (index, segment) in segments.iter().enumerate() {
            if !segment.duration.is_finite() || segment.duration <= 0.0 {
                return Err(ConfigError::InvalidPhaseDuration {
                    index,
                    duration: segment.duration,
                });
            }
        }
        Ok(Self {
            segments,
            index: 0,
            remaining: first.duration,
        })
    }

    /// Crosses at most one segment boundary per call.
    pub fn advance(&mut self, dt: f32) -> PhaseMode {
        self.remaining -= dt;
        if self.remaining <= 0.0 && !self.is_final() {
            self.index += 1;
            self.remaining = self.segments[self.index].duration;
        }
        self.current_mode()
    }

    pub fn current_mode(&self) -> PhaseMode {
        self.segments[self.index].mode
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn remaining(&self) -> f32 {
        self.remaining
    }

    pub fn is_final(&self) -> bool {
        self.index + 1 >= self.segments.len()
    }
}
