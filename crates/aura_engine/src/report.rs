//! Per-tick summary returned by the engine.

use aura_core::{PathKind, RayArrival};
use aura_trace::Occlusion;

/// What one tick produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub frame: u64,
    /// Arrivals collected from the buffer.
    pub arrivals: usize,
    pub direct: usize,
    pub specular: usize,
    pub diffuse: usize,
    /// Arrivals that did not fit in the buffer.
    pub dropped: usize,
    pub occlusion: Vec<Occlusion>,
    /// Slots whose response was uploaded.
    pub uploaded: Vec<usize>,
    /// Slots skipped because their response stayed silent.
    pub silent: Vec<usize>,
}

impl TickReport {
    /// Report of a tick that did no work.
    pub fn idle(frame: u64) -> Self {
        Self {
            frame,
            ..Default::default()
        }
    }

    /// Tally `arrivals` by path kind.
    pub fn count(&mut self, arrivals: &[RayArrival]) {
        self.arrivals = arrivals.len();
        for arrival in arrivals {
            match arrival.kind {
                PathKind::Direct => self.direct += 1,
                PathKind::Specular => self.specular += 1,
                PathKind::Diffuse => self.diffuse += 1,
            }
        }
    }

    /// Occluded probe count of `slot`, if occlusion ran for it.
    pub fn occluded(&self, slot: usize) -> Option<u32> {
        self.occlusion
            .iter()
            .find(|o| o.slot == slot)
            .map(|o| o.occluded)
    }
}
