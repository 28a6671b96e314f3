//! In-memory registry mapping destinations to delivery targets.

use crate::target::DeliveryTarget;
use keyprobe_core::DestinationId;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};
use tracing::info;

/// Registered destination paired with its target.
pub type Destination = (DestinationId, Arc<dyn DeliveryTarget>);

/// Read-only view of the registered destinations.
///
/// The dispatcher asks for a fresh snapshot every cycle; registrations made
/// concurrently show up in the next cycle at the latest.
pub trait DestinationSource: Send + Sync {
    /// Current destinations, ordered by id.
    fn snapshot(&self) -> Vec<Destination>;
}

/// Thread-safe registry of delivery targets keyed by destination.
///
/// Registration and removal are driven by the command surface; the scanning
/// core only reads it through [`DestinationSource`].
#[derive(Clone, Default)]
pub struct DeliveryRegistry {
    /// Registered targets, indexed by destination ID
    targets: Arc<RwLock<BTreeMap<DestinationId, Arc<dyn DeliveryTarget>>>>,
}

impl DeliveryRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `target` for `destination`, returning the target it replaces.
    pub fn register(
        &self,
        destination: DestinationId,
        target: Arc<dyn DeliveryTarget>,
    ) -> Option<Arc<dyn DeliveryTarget>> {
        let mut targets = self
            .targets
            .write()
            .expect("acquire write lock on delivery targets");

        info!(
            destination = %destination,
            kind = target.kind(),
            "registered delivery target"
        );
        targets.insert(destination, target)
    }

    /// Get the target registered for a destination.
    #[must_use]
    pub fn get(&self, destination: &DestinationId) -> Option<Arc<dyn DeliveryTarget>> {
        let targets = self
            .targets
            .read()
            .expect("acquire read lock on delivery targets");

        targets.get(destination).cloned()
    }

    /// Remove the target registered for a destination.
    pub fn remove(&self, destination: &DestinationId) -> Option<Arc<dyn DeliveryTarget>> {
        let mut targets = self
            .targets
            .write()
            .expect("acquire write lock on delivery targets");

        let removed = targets.remove(destination);
        if removed.is_some() {
            info!(destination = %destination, "removed delivery target");
        }
        removed
    }

    /// All registered destination IDs.
    #[must_use]
    pub fn destinations(&self) -> Vec<DestinationId> {
        let targets = self
            .targets
            .read()
            .expect("acquire read lock on delivery targets");

        targets.keys().cloned().collect()
    }

    /// Number of registered destinations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.targets
            .read()
            .expect("acquire read lock on delivery targets")
            .len()
    }

    /// Whether no destination is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DestinationSource for DeliveryRegistry {
    fn snapshot(&self) -> Vec<Destination> {
        let targets = self
            .targets
            .read()
            .expect("acquire read lock on delivery targets");

        targets
            .iter()
            .map(|(id, target)| (id.clone(), Arc::clone(target)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::LogTarget;

    fn id(s: &str) -> DestinationId {
        DestinationId::new(s).expect("valid destination id")
    }

    #[test]
    fn test_register_and_get() {
        let registry = DeliveryRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.get(&id("guild-1")).is_none());

        let previous = registry.register(id("guild-1"), Arc::new(LogTarget));
        assert!(previous.is_none());
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(&id("guild-1")).map(|t| t.kind()), Some("log"));
    }

    #[test]
    fn test_register_replaces_existing() {
        let registry = DeliveryRegistry::new();
        registry.register(id("guild-1"), Arc::new(LogTarget));
        let previous = registry.register(id("guild-1"), Arc::new(LogTarget));
        assert!(previous.is_some());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_remove() {
        let registry = DeliveryRegistry::new();
        registry.register(id("guild-1"), Arc::new(LogTarget));
        assert!(registry.remove(&id("guild-1")).is_some());
        assert!(registry.remove(&id("guild-1")).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_snapshot_is_detached_and_ordered() {
        let registry = DeliveryRegistry::new();
        registry.register(id("b"), Arc::new(LogTarget));
        registry.register(id("a"), Arc::new(LogTarget));

        let snapshot = registry.snapshot();
        registry.register(id("c"), Arc::new(LogTarget));

        let ids: Vec<&str> = snapshot.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(registry.snapshot().len(), 3);
        assert_eq!(registry.destinations(), vec![id("a"), id("b"), id("c")]);
    }

    #[test]
    fn test_clones_share_targets() {
        let registry = DeliveryRegistry::new();
        let handle = registry.clone();
        handle.register(id("guild-1"), Arc::new(LogTarget));
        assert_eq!(registry.len(), 1);
    }
}
