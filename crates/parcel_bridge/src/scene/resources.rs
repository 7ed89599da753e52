//! Backing render resources
//!
//! Every mirrored entity owns one render-side resource. Releases are
//! deferred: a released handle stays alive until the next [`RenderResourcePool::reap`],
//! which the host runs once per tick. After that the handle is invalid for
//! good, since slotmap keys carry a generation.

use parking_lot::Mutex;
use slotmap::SlotMap;
use std::collections::HashSet;
use std::sync::Arc;

slotmap::new_key_type! {
    /// Generation-checked handle to a render resource
    pub struct ResourceHandle;
}

/// Pool shared between scenes and the host
pub type SharedResourcePool = Arc<Mutex<RenderResourcePool>>;

#[derive(Debug, Clone)]
struct RenderResource {
    scene_id: String,
    entity_id: String,
}

/// Allocator for render resource handles
#[derive(Debug, Default)]
pub struct RenderResourcePool {
    live: SlotMap<ResourceHandle, RenderResource>,
    pending_release: HashSet<ResourceHandle>,
}

impl RenderResourcePool {
    /// Empty pool
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty pool behind a shared handle
    pub fn shared() -> SharedResourcePool {
        Arc::new(Mutex::new(Self::new()))
    }

    /// Allocate a resource for an entity
    pub fn allocate(&mut self, scene_id: &str, entity_id: &str) -> ResourceHandle {
        self.live.insert(RenderResource {
            scene_id: scene_id.to_string(),
            entity_id: entity_id.to_string(),
        })
    }

    /// Schedule a release; the handle stays valid until the next reap
    pub fn release(&mut self, handle: ResourceHandle) {
        if self.live.contains_key(handle) {
            self.pending_release.insert(handle);
        }
    }

    /// Handle still refers to a live resource
    pub fn is_valid(&self, handle: ResourceHandle) -> bool {
        self.live.contains_key(handle)
    }

    /// Entity a handle was allocated for
    pub fn owner(&self, handle: ResourceHandle) -> Option<(&str, &str)> {
        self.live
            .get(handle)
            .map(|r| (r.scene_id.as_str(), r.entity_id.as_str()))
    }

    /// Destroy every resource scheduled for release, returning how many
    pub fn reap(&mut self) -> usize {
        let mut count = 0;
        for handle in self.pending_release.drain() {
            if let Some(resource) = self.live.remove(handle) {
                log::trace!(
                    "[{}] released render resource of '{}'",
                    resource.scene_id,
                    resource.entity_id
                );
                count += 1;
            }
        }
        count
    }

    /// Resources currently alive, including those pending release
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Resources waiting for the next reap
    pub fn pending_count(&self) -> usize {
        self.pending_release.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn release_is_deferred_until_reap() {
        let mut pool = RenderResourcePool::new();
        let a = pool.allocate("s", "a");
        let b = pool.allocate("s", "b");
        assert_eq!(pool.owner(a), Some(("s", "a")));

        pool.release(a);
        pool.release(a);
        assert!(pool.is_valid(a));
        assert_eq!(pool.pending_count(), 1);

        assert_eq!(pool.reap(), 1);
        assert!(!pool.is_valid(a));
        assert!(pool.is_valid(b));
        assert_eq!(pool.live_count(), 1);
    }

    #[test]
    fn bulk_release_reaps_each_handle_once() {
        let mut pool = RenderResourcePool::new();
        let handles: Vec<_> = (0..512).map(|i| pool.allocate("s", &format!("e{i}"))).collect();
        for handle in handles.iter().chain(handles.iter().rev()) {
            pool.release(*handle);
        }
        assert_eq!(pool.pending_count(), 512);
        assert_eq!(pool.reap(), 512);
        assert_eq!(pool.live_count(), 0);
        assert_eq!(pool.pending_count(), 0);

        pool.release(handles[0]);
        assert_eq!(pool.pending_count(), 0);
    }

    #[test]
    fn stale_handle_stays_invalid_after_slot_reuse() {
        let mut pool = RenderResourcePool::new();
        let old = pool.allocate("s", "a");
        pool.release(old);
        pool.reap();
        let new = pool.allocate("s", "b");
        assert!(!pool.is_valid(old));
        assert!(pool.is_valid(new));
        assert_eq!(pool.owner(old), None);
    }
}
