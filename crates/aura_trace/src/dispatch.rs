//! Fire-and-wait parallel dispatch and the arrival buffer it fills.
//!
//! Kernels never synchronise with each other. Each arrival claims a unique
//! slot from a monotonically increasing counter; writes past the capacity are
//! dropped and counted. After the dispatch returns, readers only look at the
//! first `len()` slots.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;

use aura_core::RayArrival;
use rayon::prelude::*;

/// Where kernels execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Substrate {
    /// rayon's global thread pool.
    #[default]
    ThreadPool,
    /// The calling thread, in index order.
    Serial,
}

impl Substrate {
    /// Run `kernel(i)` for every `i` in `0..count` and wait for all of them.
    pub fn run<F>(self, count: usize, kernel: F)
    where
        F: Fn(usize) + Send + Sync,
    {
        match self {
            Substrate::ThreadPool => (0..count).into_par_iter().for_each(kernel),
            Substrate::Serial => (0..count).for_each(kernel),
        }
    }

    /// Run `kernel(i)` for every `i` in `0..count` and collect the results in order.
    pub fn map<T, F>(self, count: usize, kernel: F) -> Vec<T>
    where
        T: Send,
        F: Fn(usize) -> T + Send + Sync,
    {
        match self {
            Substrate::ThreadPool => (0..count).into_par_iter().map(kernel).collect(),
            Substrate::Serial => (0..count).map(kernel).collect(),
        }
    }
}

/// Fixed-capacity append-only arrival store shared by all kernels of a tick.
#[derive(Debug)]
pub struct ArrivalBuffer {
    slots: Box<[OnceLock<RayArrival>]>,
    next: AtomicUsize,
}

impl ArrivalBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: (0..capacity).map(|_| OnceLock::new()).collect(),
            next: AtomicUsize::new(0),
        }
    }

    /// Append from any thread. Returns false when the buffer is full.
    pub fn push(&self, arrival: RayArrival) -> bool {
        let slot = self.next.fetch_add(1, Ordering::Relaxed);
        match self.slots.get(slot) {
            Some(cell) => cell.set(arrival).is_ok(),
            None => false,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of valid entries.
    pub fn len(&self) -> usize {
        self.next.load(Ordering::Acquire).min(self.slots.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Writes that did not fit since the last reset.
    pub fn dropped(&self) -> usize {
        self.next
            .load(Ordering::Acquire)
            .saturating_sub(self.slots.len())
    }

    pub fn iter(&self) -> impl Iterator<Item = &RayArrival> {
        self.slots[..self.len()].iter().filter_map(OnceLock::get)
    }

    /// Clear the valid entries for the next tick.
    pub fn reset(&mut self) {
        let len = self.len();
        for cell in &mut self.slots[..len] {
            cell.take();
        }
        *self.next.get_mut() = 0;
    }

    /// Grow to at least `capacity` slots, clearing the contents.
    pub fn reserve(&mut self, capacity: usize) {
        if capacity > self.slots.len() {
            *self = Self::with_capacity(capacity);
        } else {
            self.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aura_core::{EnergyBand, PathKind};

    fn arrival(direction_id: u32) -> RayArrival {
        RayArrival {
            direction_id,
            source_id: 0,
            energy: EnergyBand::splat(1.0),
            distance: 1.0,
            kind: PathKind::Diffuse,
        }
    }

    #[test]
    fn test_parallel_pushes_land_in_unique_slots() {
        let buffer = ArrivalBuffer::with_capacity(1000);
        Substrate::ThreadPool.run(1000, |i| {
            assert!(buffer.push(arrival(i as u32)));
        });

        assert_eq!(buffer.len(), 1000);
        assert_eq!(buffer.dropped(), 0);
        let mut ids: Vec<u32> = buffer.iter().map(|a| a.direction_id).collect();
        ids.sort_unstable();
        assert_eq!(ids, (0..1000).collect::<Vec<_>>());
    }

    #[test]
    fn test_overflow_is_dropped_and_counted() {
        let buffer = ArrivalBuffer::with_capacity(10);
        Substrate::ThreadPool.run(25, |i| {
            buffer.push(arrival(i as u32));
        });

        assert_eq!(buffer.len(), 10);
        assert_eq!(buffer.dropped(), 15);
        assert_eq!(buffer.iter().count(), 10);
    }

    #[test]
    fn test_reset_and_reserve() {
        let mut buffer = ArrivalBuffer::with_capacity(4);
        for i in 0..6 {
            buffer.push(arrival(i));
        }
        buffer.reset();
        assert!(buffer.is_empty());
        assert_eq!(buffer.dropped(), 0);
        assert!(buffer.push(arrival(9)));
        assert_eq!(buffer.iter().next().map(|a| a.direction_id), Some(9));

        buffer.reserve(16);
        assert_eq!(buffer.capacity(), 16);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_serial_runs_in_order() {
        let buffer = ArrivalBuffer::with_capacity(8);
        Substrate::Serial.run(8, |i| {
            buffer.push(arrival(i as u32));
        });
        let ids: Vec<u32> = buffer.iter().map(|a| a.direction_id).collect();
        assert_eq!(ids, (0..8).collect::<Vec<_>>());
    }
}
