//! Live sources and the slots they occupy.

use aura_core::{CapacityError, SlotPool, Source, Triangle};
use aura_math::Vec3;
use aura_trace::TracedSource;

/// Opaque reference to a live source, valid until it is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceHandle {
    slot: usize,
}

impl SourceHandle {
    /// Output channel of the source.
    pub fn slot(&self) -> usize {
        self.slot
    }
}

/// Sources ordered by slot, each with its image-source table.
#[derive(Debug, Clone)]
pub struct SourceRegistry {
    pool: SlotPool,
    sources: Vec<TracedSource>,
    radius: f32,
}

impl SourceRegistry {
    pub fn new(capacity: usize, radius: f32) -> Self {
        Self {
            pool: SlotPool::new(capacity),
            sources: Vec::with_capacity(capacity),
            radius,
        }
    }

    /// Take the smallest free slot and compute the image sources against `triangles`.
    pub fn add(&mut self, position: Vec3, triangles: &[Triangle]) -> Result<SourceHandle, CapacityError> {
        let slot = self.pool.allocate()?;
        let traced = TracedSource::new(Source::new(position, self.radius, slot), triangles);
        let at = self.sources.partition_point(|s| s.source.slot < slot);
        self.sources.insert(at, traced);
        Ok(SourceHandle { slot })
    }

    /// Release the slot of `handle`. Returns false for a stale handle.
    pub fn remove(&mut self, handle: SourceHandle) -> bool {
        let Some(at) = self.find(handle) else {
            return false;
        };
        self.sources.remove(at);
        self.pool.release(handle.slot)
    }

    /// Move a source and rebuild its image sources. Returns false for a stale handle.
    pub fn relocate(&mut self, handle: SourceHandle, position: Vec3, triangles: &[Triangle]) -> bool {
        match self.find(handle) {
            Some(at) => {
                self.sources[at].relocate(position, triangles);
                true
            }
            None => false,
        }
    }

    /// Rebuild every image-source table, after the scene triangles changed.
    pub fn rebuild_images(&mut self, triangles: &[Triangle]) {
        for source in &mut self.sources {
            let position = source.position();
            source.relocate(position, triangles);
        }
    }

    pub fn get(&self, handle: SourceHandle) -> Option<&TracedSource> {
        self.find(handle).map(|at| &self.sources[at])
    }

    pub fn traced(&self) -> &[TracedSource] {
        &self.sources
    }

    pub fn handles(&self) -> impl Iterator<Item = SourceHandle> + '_ {
        self.sources.iter().map(|s| SourceHandle { slot: s.source.slot })
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.pool.capacity()
    }

    fn find(&self, handle: SourceHandle) -> Option<usize> {
        self.sources
            .binary_search_by_key(&handle.slot, |s| s.source.slot)
            .ok()
    }
}
