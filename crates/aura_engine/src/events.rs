//! Lifecycle notifications for whoever drives the engine.

use aura_math::Vec3;

/// Something that changed in the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EngineEvent {
    /// The scene index is built. `ready` is false in geometry-only mode.
    Initialized { triangles: usize, ready: bool },
    SourceAdded { slot: usize, position: Vec3 },
    SourceRemoved { slot: usize },
    ListenerMoved { position: Vec3 },
}

type Observer = Box<dyn FnMut(&EngineEvent) + Send>;

/// Observers called synchronously, in subscription order.
#[derive(Default)]
pub struct EventBus {
    observers: Vec<Observer>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, observer: F)
    where
        F: FnMut(&EngineEvent) + Send + 'static,
    {
        self.observers.push(Box::new(observer));
    }

    pub fn emit(&mut self, event: EngineEvent) {
        for observer in &mut self.observers {
            observer(&event);
        }
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("observers", &self.observers.len())
            .finish()
    }
}
