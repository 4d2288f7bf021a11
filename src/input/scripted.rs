//! Scripted source.
//!
//! Replays a fixed cycle of updates: the entry at
//! `floor(time / cadence) % len` is returned, stamped with the current time.
//! Drives headless matches and tests without devices.

use super::device::DeviceContext;
use super::{InputError, InputSource, InputUpdate};

/// Cyclic scripted input.
#[derive(Clone, Debug)]
pub struct ScriptedSource {
    cycle: Vec<InputUpdate>,
    cadence: f64,
    attached: bool,
}

impl ScriptedSource {
    /// Create a script advancing one entry every `cadence` ms.
    pub fn new(cycle: Vec<InputUpdate>, cadence: f64) -> Self {
        Self {
            cycle,
            cadence: cadence.max(f64::EPSILON),
            attached: false,
        }
    }

    /// Index of the entry active at `time`.
    pub fn index_at(&self, time: f64) -> Option<usize> {
        if self.cycle.is_empty() || time < 0.0 {
            return None;
        }
        let step = (time / self.cadence).floor() as usize;
        Some(step % self.cycle.len())
    }
}

impl InputSource for ScriptedSource {
    fn name(&self) -> &str {
        "scripted"
    }

    fn configure(&mut self, _devices: &mut DeviceContext) -> Result<(), InputError> {
        self.attached = true;
        Ok(())
    }

    fn remove_from(&mut self, _devices: &mut DeviceContext) {
        self.attached = false;
    }

    fn update(&mut self, _devices: &mut DeviceContext, time: f64, _delta: f64) -> Option<InputUpdate> {
        if !self.attached {
            return None;
        }
        let index = self.index_at(time)?;
        Some(self.cycle[index].at(time))
    }
}
