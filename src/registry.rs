//! Registry of live channel models
//!
//! Models are addressed by monotonically increasing ids that are never
//! reused. The map lock is held only to find a model; each model has its
//! own mutex so calls on different models run concurrently.
//!
//! A panic inside a model call poisons its mutex. The lock is recovered and
//! the model stays usable: generation only commits to the cache after it
//! completes.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

pub struct ModelRegistry<T> {
    models: RwLock<HashMap<u64, Arc<Mutex<T>>>>,
    next_id: AtomicU64,
}

impl<T> Default for ModelRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ModelRegistry<T> {
    pub fn new() -> Self {
        Self {
            models: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Register a model and return its id
    pub fn insert(&self, model: T) -> u64 {
        let mut models = self.models.write().unwrap_or_else(PoisonError::into_inner);
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        models.insert(id, Arc::new(Mutex::new(model)));
        id
    }

    fn slot(&self, id: u64) -> Option<Arc<Mutex<T>>> {
        let models = self.models.read().unwrap_or_else(PoisonError::into_inner);
        models.get(&id).cloned()
    }

    /// Run `f` with exclusive access to one model, None if `id` is unknown.
    /// The registry map is not locked while `f` runs.
    pub fn with_model_mut<F, R>(&self, id: u64, f: F) -> Option<R>
    where
        F: FnOnce(&mut T) -> R,
    {
        let slot = self.slot(id)?;
        let mut model = slot.lock().unwrap_or_else(PoisonError::into_inner);
        Some(f(&mut model))
    }

    pub fn with_model<F, R>(&self, id: u64, f: F) -> Option<R>
    where
        F: FnOnce(&T) -> R,
    {
        let slot = self.slot(id)?;
        let model = slot.lock().unwrap_or_else(PoisonError::into_inner);
        Some(f(&model))
    }

    /// Unregister a model. Calls already holding it finish first.
    pub fn remove(&self, id: u64) -> bool {
        let mut models = self.models.write().unwrap_or_else(PoisonError::into_inner);
        models.remove(&id).is_some()
    }

    pub fn count(&self) -> usize {
        self.models.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::ChannelModel;
    use crate::config::{ModelConfig, Scenario};

    #[test]
    fn test_insert_get() {
        let registry: ModelRegistry<i32> = ModelRegistry::new();

        let id = registry.insert(42);
        assert_eq!(registry.count(), 1);
        assert_eq!(registry.with_model(id, |v| *v), Some(42));
    }

    #[test]
    fn test_remove() {
        let registry: ModelRegistry<i32> = ModelRegistry::new();

        let id = registry.insert(42);
        assert!(registry.remove(id));
        assert!(!registry.remove(id));
        assert_eq!(registry.count(), 0);
        assert!(registry.with_model(id, |v| *v).is_none());
    }

    #[test]
    fn test_ids_not_reused() {
        let registry: ModelRegistry<i32> = ModelRegistry::new();

        let first = registry.insert(1);
        registry.remove(first);
        let second = registry.insert(2);
        assert_ne!(first, second);
        assert_eq!(registry.count(), 1);
    }

    #[test]
    fn test_holds_channel_models() {
        let registry = ModelRegistry::new();
        let model = ChannelModel::new(ModelConfig::new(Scenario::UrbanMacro, 3.5e9), 7).unwrap();
        let id = registry.insert(model);

        let used = registry.with_model_mut(id, |m| m.assign_streams(12)).unwrap();
        assert_eq!(used, 3);
        let scenario = registry.with_model(id, |m| m.scenario()).unwrap();
        assert_eq!(scenario, Scenario::UrbanMacro);
    }

    #[test]
    fn test_concurrent_access() {
        use std::thread;

        let registry: Arc<ModelRegistry<i32>> = Arc::new(ModelRegistry::new());
        let ids: Vec<u64> = (0..10).map(|i| registry.insert(i)).collect();

        let handles: Vec<_> = ids
            .iter()
            .map(|&id| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    for _ in 0..1000 {
                        registry.with_model_mut(id, |v| *v += 1);
                    }
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }

        for (i, &id) in ids.iter().enumerate() {
            assert_eq!(registry.with_model(id, |v| *v), Some(i as i32 + 1000));
        }
    }

    #[test]
    fn test_panicked_call_leaves_model_usable() {
        use std::thread;

        let registry: Arc<ModelRegistry<i32>> = Arc::new(ModelRegistry::new());
        let id = registry.insert(7);

        let handle = {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                registry.with_model_mut(id, |v| {
                    *v += 1;
                    panic!("generation failed");
                })
            })
        };
        assert!(handle.join().is_err());

        assert_eq!(registry.with_model(id, |v| *v), Some(8));
        assert_eq!(registry.with_model_mut(id, |v| *v * 2), Some(16));
    }
}
