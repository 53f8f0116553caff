use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// A single cached value that is only ever replaced as a whole.
///
/// Readers receive an `Arc` to either the previous or the new value, never a
/// partially updated one.
pub struct Slot<V>
where
    V: Send + Sync + 'static,
{
    name: &'static str,
    inner: RwLock<Arc<V>>,
}

impl<V> Slot<V>
where
    V: Send + Sync + 'static,
{
    pub fn new(name: &'static str, initial: V) -> Self {
        Self {
            name,
            inner: RwLock::new(Arc::new(initial)),
        }
    }

    pub async fn get(&self) -> Arc<V> {
        Arc::clone(&*self.inner.read().await)
    }

    pub async fn replace(&self, value: V) {
        let mut slot = self.inner.write().await;
        debug!(slot = self.name, "Slot REPLACE");
        *slot = Arc::new(value);
    }

    /// Replaces the value only while `keep` holds for the current one.
    /// Returns whether the value was written.
    pub async fn replace_if(&self, value: V, keep: impl FnOnce(&V) -> bool) -> bool {
        let mut slot = self.inner.write().await;
        if !keep(&**slot) {
            debug!(slot = self.name, "Slot REPLACE skipped");
            return false;
        }
        debug!(slot = self.name, "Slot REPLACE");
        *slot = Arc::new(value);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_slot_get_replace() {
        let slot = Slot::new("test", 1);

        assert_eq!(*slot.get().await, 1);

        let before = slot.get().await;
        slot.replace(2).await;

        // Earlier readers keep the value they saw
        assert_eq!(*before, 1);
        assert_eq!(*slot.get().await, 2);
    }

    #[tokio::test]
    async fn test_slot_conditional_replace() {
        let slot = Slot::new("test", "old".to_string());

        assert!(!slot.replace_if("new".to_string(), |v| v == "other").await);
        assert_eq!(*slot.get().await, "old");

        assert!(slot.replace_if("new".to_string(), |v| v == "old").await);
        assert_eq!(*slot.get().await, "new");
    }
}
