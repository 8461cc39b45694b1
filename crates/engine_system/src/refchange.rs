//! Ref-change-driven reaction chains.
//!
//! Some pipelines (death/respawn chief among them) are not expressed as
//! per-tick queries — they react to a component being added or removed.
//! A [`RefChangeRegistry`] lets systems subscribe handlers to a component
//! type and ordering index; the world drains [`engine_component::RefChangeEvent`]s
//! produced by a sync phase through the registry immediately after that sync,
//! each handler recording its own reaction into a fresh [`CommandBuffer`].

use std::collections::HashMap;
use std::sync::Arc;

use engine_component::{CommandBuffer, ComponentTypeId, RefChangeEvent, RefChangeKind, Store};

/// A single reaction to a ref-change event on one component type.
pub trait RefChangeHandler: Send + Sync {
    fn name(&self) -> &str;
    fn run(&self, store: &Store, event: &RefChangeEvent, buffer: &mut CommandBuffer);
}

struct Subscription {
    kind: RefChangeKind,
    handler: Arc<dyn RefChangeHandler>,
}

/// Ordered handlers keyed by the component type they react to.
///
/// Handlers for the same `(type_id, kind)` pair run in registration order —
/// this is how an ordered chain like the death pipeline's
/// clear-effects → clear-interactions → clear-health → ... sequence is
/// expressed: each step is a separate handler registered in chain order.
#[derive(Default)]
pub struct RefChangeRegistry {
    subscriptions: HashMap<ComponentTypeId, Vec<Subscription>>,
}

impl RefChangeRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe `handler` to fire whenever a component of type `type_id` is
    /// changed with the given `kind` (added or removed).
    pub fn subscribe(
        &mut self,
        type_id: ComponentTypeId,
        kind: RefChangeKind,
        handler: Arc<dyn RefChangeHandler>,
    ) {
        self.subscriptions
            .entry(type_id)
            .or_default()
            .push(Subscription { kind, handler });
    }

    /// Run every subscribed handler against the events produced by the sync
    /// phase that just completed, in event order then subscription order.
    /// Returns the command buffers the handlers recorded, to be applied in
    /// a second sync pass.
    pub fn dispatch(&self, store: &Store, events: &[RefChangeEvent]) -> Vec<CommandBuffer> {
        let mut buffers = Vec::new();
        for event in events {
            let Some(type_id) = event.type_id else {
                continue;
            };
            let Some(subs) = self.subscriptions.get(&type_id) else {
                continue;
            };
            for sub in subs {
                if sub.kind != event.kind {
                    continue;
                }
                let mut buffer = CommandBuffer::new();
                sub.handler.run(store, event, &mut buffer);
                buffers.push(buffer);
            }
        }
        buffers
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use engine_component::Ref;

    use super::*;

    struct RecordingHandler(&'static str, Arc<AtomicUsize>);
    impl RefChangeHandler for RecordingHandler {
        fn name(&self) -> &str {
            self.0
        }
        fn run(&self, _store: &Store, _event: &RefChangeEvent, _buffer: &mut CommandBuffer) {
            self.1.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_dispatch_only_matching_kind_and_type() {
        let store = Store::new();
        let mut registry = RefChangeRegistry::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let death_type = ComponentTypeId(77);
        registry.subscribe(
            death_type,
            RefChangeKind::ComponentAdded,
            Arc::new(RecordingHandler("on-death", counter.clone())),
        );

        let events = vec![
            RefChangeEvent {
                entity: Ref::from_parts(1, 0),
                type_id: Some(death_type),
                kind: RefChangeKind::ComponentAdded,
            },
            RefChangeEvent {
                entity: Ref::from_parts(1, 0),
                type_id: Some(death_type),
                kind: RefChangeKind::ComponentRemoved,
            },
            RefChangeEvent {
                entity: Ref::from_parts(2, 0),
                type_id: Some(ComponentTypeId(1)),
                kind: RefChangeKind::ComponentAdded,
            },
        ];

        let buffers = registry.dispatch(&store, &events);
        assert_eq!(buffers.len(), 1);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_handlers_run_in_registration_order() {
        let store = Store::new();
        let mut registry = RefChangeRegistry::new();
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));

        struct OrderTrackingHandler(&'static str, Arc<std::sync::Mutex<Vec<&'static str>>>);
        impl RefChangeHandler for OrderTrackingHandler {
            fn name(&self) -> &str {
                self.0
            }
            fn run(&self, _store: &Store, _event: &RefChangeEvent, _buffer: &mut CommandBuffer) {
                self.1.lock().unwrap().push(self.0);
            }
        }

        let death_type = ComponentTypeId(77);
        registry.subscribe(
            death_type,
            RefChangeKind::ComponentAdded,
            Arc::new(OrderTrackingHandler("clear-effects", order.clone())),
        );
        registry.subscribe(
            death_type,
            RefChangeKind::ComponentAdded,
            Arc::new(OrderTrackingHandler("clear-health", order.clone())),
        );

        let events = vec![RefChangeEvent {
            entity: Ref::from_parts(1, 0),
            type_id: Some(death_type),
            kind: RefChangeKind::ComponentAdded,
        }];
        registry.dispatch(&store, &events);
        assert_eq!(*order.lock().unwrap(), vec!["clear-effects", "clear-health"]);
    }
}
