// src/pipeline/store.rs
//
// Latest-snapshot store. One slot per pipeline key, replaced whole on
// every publish. Rendering subscribes instead of reaching into
// pipeline state.

use crate::types::{Annotation, AnnotationKey, AnnotationSnapshot};
use std::sync::{Arc, RwLock};
use tracing::debug;

pub type UpdateCallback = Box<dyn Fn(AnnotationKey, &AnnotationSnapshot) + Send + Sync>;

pub struct AnnotationStore {
    face: RwLock<Arc<AnnotationSnapshot>>,
    clothing: RwLock<Arc<AnnotationSnapshot>>,
    subscribers: RwLock<Vec<UpdateCallback>>,
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self {
            face: RwLock::new(Arc::new(AnnotationSnapshot::empty())),
            clothing: RwLock::new(Arc::new(AnnotationSnapshot::empty())),
            subscribers: RwLock::new(Vec::new()),
        }
    }

    fn slot(&self, key: AnnotationKey) -> &RwLock<Arc<AnnotationSnapshot>> {
        match key {
            AnnotationKey::Face => &self.face,
            AnnotationKey::Clothing => &self.clothing,
        }
    }

    /// The only mutator. The slot's Arc is swapped whole, so a concurrent
    /// reader holds either the old or the new complete snapshot, never a
    /// mix. Full replacement each time, with no diff/patch semantics.
    pub fn replace(&self, key: AnnotationKey, items: Vec<Annotation>, timestamp_ms: f64) {
        let snapshot = Arc::new(AnnotationSnapshot {
            items,
            timestamp_ms,
        });

        *self.slot(key).write().expect("store lock poisoned") = Arc::clone(&snapshot);
        debug!("{:?} snapshot replaced ({} items)", key, snapshot.items.len());

        for subscriber in self
            .subscribers
            .read()
            .expect("subscriber lock poisoned")
            .iter()
        {
            subscriber(key, &snapshot);
        }
    }

    /// Last successfully published snapshot for the key. Stays valid across
    /// failed or skipped ticks: stale but consistent.
    pub fn latest(&self, key: AnnotationKey) -> Arc<AnnotationSnapshot> {
        Arc::clone(&self.slot(key).read().expect("store lock poisoned"))
    }

    pub fn subscribe(
        &self,
        callback: impl Fn(AnnotationKey, &AnnotationSnapshot) + Send + Sync + 'static,
    ) {
        self.subscribers
            .write()
            .expect("subscriber lock poisoned")
            .push(Box::new(callback));
    }
}

impl Default for AnnotationStore {
    fn default() -> Self {
        Self::new()
    }
}
