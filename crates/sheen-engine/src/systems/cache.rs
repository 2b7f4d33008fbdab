use std::collections::HashMap;

use crate::api::types::ElementId;
use crate::systems::reflection::ReflectionParams;

/// Last-applied highlight per element. Lets a frame skip style writes whose
/// value would not change. Owned by the engine and wiped on disable.
#[derive(Debug, Default)]
pub struct ReflectionCache {
    applied: HashMap<ElementId, ReflectionParams>,
}

impl ReflectionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `params` for `id`. Returns `true` if it differs from the cached
    /// value (or nothing was cached) and therefore needs writing.
    pub fn update(&mut self, id: ElementId, params: ReflectionParams) -> bool {
        match self.applied.insert(id, params) {
            Some(prev) => prev != params,
            None => true,
        }
    }

    pub fn get(&self, id: ElementId) -> Option<&ReflectionParams> {
        self.applied.get(&id)
    }

    /// Drop entries for elements that no longer exist.
    pub fn retain<F: FnMut(ElementId) -> bool>(&mut self, mut keep: F) {
        self.applied.retain(|id, _| keep(*id));
    }

    pub fn clear(&mut self) {
        self.applied.clear();
    }

    pub fn len(&self) -> usize {
        self.applied.len()
    }

    pub fn is_empty(&self) -> bool {
        self.applied.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_identical_values() {
        let mut cache = ReflectionCache::new();
        let p = ReflectionParams::new(90.0, 1.0);
        assert!(cache.update(ElementId(1), p));
        assert!(!cache.update(ElementId(1), p));
        assert!(cache.update(ElementId(1), ReflectionParams::new(91.0, 1.0)));
        assert!(cache.update(ElementId(2), p));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn clear_forgets_everything() {
        let mut cache = ReflectionCache::new();
        let p = ReflectionParams::new(90.0, 1.0);
        cache.update(ElementId(1), p);
        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.update(ElementId(1), p));
    }

    #[test]
    fn retain_prunes_missing() {
        let mut cache = ReflectionCache::new();
        cache.update(ElementId(1), ReflectionParams::new(0.0, 1.0));
        cache.update(ElementId(2), ReflectionParams::new(0.0, 1.0));
        cache.retain(|id| id == ElementId(2));
        assert!(cache.get(ElementId(1)).is_none());
        assert!(cache.get(ElementId(2)).is_some());
    }
}
