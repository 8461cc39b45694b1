//! System registration, conflict-aware stage computation, and in-process
//! parallel dispatch.
//!
//! Systems are grouped by [`SystemGroup`] and groups run strictly in
//! [`SystemGroup::ORDER`]. Within a group, systems are assigned to **stages**
//! by a greedy graph colouring over [`QueryDescriptor::conflicts_with`],
//! honouring each system's `depends_on` list as a hard ordering constraint —
//! a system is never placed in a stage earlier than the stage after its
//! latest dependency. Stages within a group run sequentially; systems within
//! a stage run across the worker pool.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use engine_component::{CommandBuffer, QueryDescriptor, Store};
use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, error};

use crate::group::SystemGroup;
use crate::system::System;

/// Errors raised while building or running a [`Scheduler`].
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("system {0:?} depends on unknown system {1:?}")]
    UnknownDependency(String, String),
    #[error("failed to build worker thread pool: {0}")]
    ThreadPoolBuild(#[from] rayon::ThreadPoolBuildError),
}

/// A system plus the metadata the scheduler needs to place it.
pub struct RegisteredSystem {
    pub name: String,
    pub group: SystemGroup,
    pub query: QueryDescriptor,
    /// Names of systems in the *same group* that must finish (and have their
    /// commands... not yet applied — only their parallel-phase read/write
    /// window closed) before this one starts.
    pub depends_on: Vec<String>,
    pub system: Arc<dyn System>,
}

impl RegisteredSystem {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        group: SystemGroup,
        query: QueryDescriptor,
        system: Arc<dyn System>,
    ) -> Self {
        Self {
            name: name.into(),
            group,
            query,
            depends_on: Vec::new(),
            system,
        }
    }

    #[must_use]
    pub fn depends_on(mut self, name: impl Into<String>) -> Self {
        self.depends_on.push(name.into());
        self
    }
}

/// A set of systems (by index into the group's system list) with no
/// conflicting writes, safe to run concurrently.
#[derive(Debug, Clone, Default)]
pub struct Stage {
    pub system_indices: Vec<usize>,
}

/// Computes execution stages for one group's systems via greedy graph
/// colouring, honouring `depends_on` as a minimum-stage constraint.
#[must_use]
pub fn compute_stages(systems: &[&RegisteredSystem]) -> Vec<Stage> {
    let mut stages: Vec<Stage> = Vec::new();
    let mut stage_of: std::collections::HashMap<&str, usize> = std::collections::HashMap::new();

    for (idx, system) in systems.iter().enumerate() {
        let min_stage = system
            .depends_on
            .iter()
            .filter_map(|dep| stage_of.get(dep.as_str()))
            .max()
            .map_or(0, |&s| s + 1);

        let mut placed = None;
        for (stage_idx, stage) in stages.iter().enumerate().skip(min_stage) {
            let conflicts = stage
                .system_indices
                .iter()
                .any(|&existing| system.query.conflicts_with(&systems[existing].query));
            if !conflicts {
                placed = Some(stage_idx);
                break;
            }
        }

        let stage_idx = match placed {
            Some(s) => {
                stages[s].system_indices.push(idx);
                s
            }
            None => {
                while stages.len() <= min_stage {
                    stages.push(Stage::default());
                }
                stages[min_stage].system_indices.push(idx);
                min_stage
            }
        };
        stage_of.insert(system.name.as_str(), stage_idx);
    }

    stages.retain(|s| !s.system_indices.is_empty());
    stages
}

/// Owns the registered systems and the worker pool that runs them.
pub struct Scheduler {
    systems: Vec<RegisteredSystem>,
    pool: rayon::ThreadPool,
}

impl Scheduler {
    /// Build a scheduler with a worker pool of `worker_count` threads.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying thread pool fails to start.
    pub fn new(worker_count: usize) -> Result<Self, SchedulerError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(worker_count)
            .thread_name(|i| format!("engine-worker-{i}"))
            .build()?;
        Ok(Self {
            systems: Vec::new(),
            pool,
        })
    }

    /// Register a system. Returns an error if it names an unknown dependency.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::UnknownDependency`] if `depends_on` names a
    /// system not yet registered in the same group.
    pub fn register(&mut self, system: RegisteredSystem) -> Result<(), SchedulerError> {
        for dep in &system.depends_on {
            let known = self
                .systems
                .iter()
                .any(|s| s.group == system.group && &s.name == dep);
            if !known {
                return Err(SchedulerError::UnknownDependency(
                    system.name.clone(),
                    dep.clone(),
                ));
            }
        }
        self.systems.push(system);
        Ok(())
    }

    #[must_use]
    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    /// Run every stage of a single group against `store`, in stage order,
    /// each stage's systems in parallel across the worker pool. The caller
    /// is responsible for applying the returned buffers to `store` (via
    /// [`engine_component::Store::apply_commands`]) before reads done by a
    /// later group can observe this group's writes — `run_group` itself
    /// only ever reads `store`.
    ///
    /// Returns the buffers in the order they must be applied: stage order,
    /// then system registration order within the stage.
    #[must_use]
    pub fn run_group(&self, group: SystemGroup, store: &Store, dt: f64) -> Vec<CommandBuffer> {
        let group_systems: Vec<&RegisteredSystem> =
            self.systems.iter().filter(|s| s.group == group).collect();
        if group_systems.is_empty() {
            return Vec::new();
        }

        let stages = compute_stages(&group_systems);
        debug!(?group, stages = stages.len(), "running system group");

        let mut ordered_buffers = Vec::new();
        for stage in stages {
            let buffers: Vec<CommandBuffer> = self.pool.install(|| {
                stage
                    .system_indices
                    .par_iter()
                    .map(|&local_idx| {
                        let registered = group_systems[local_idx];
                        let mut buffer = CommandBuffer::new();
                        let result = panic::catch_unwind(AssertUnwindSafe(|| {
                            registered.system.run(store, &mut buffer, dt);
                        }));
                        match result {
                            Ok(()) => buffer,
                            Err(payload) => {
                                let message = payload
                                    .downcast_ref::<&str>()
                                    .map(|s| (*s).to_string())
                                    .or_else(|| payload.downcast_ref::<String>().cloned())
                                    .unwrap_or_else(|| "<non-string panic payload>".to_string());
                                error!(
                                    system = registered.name.as_str(),
                                    group = ?group,
                                    panic = message.as_str(),
                                    "system panicked; discarding its command buffer and continuing"
                                );
                                CommandBuffer::new()
                            }
                        }
                    })
                    .collect()
            });
            ordered_buffers.extend(buffers);
        }
        ordered_buffers
    }

    /// Run every group in [`SystemGroup::ORDER`] against a single snapshot
    /// of `store`, without syncing between groups. Useful for tests and for
    /// scheduler-only benchmarking; the world/tick loop does not use this —
    /// it calls [`Scheduler::run_group`] once per group and applies each
    /// group's buffers to the store before starting the next, so later
    /// groups observe earlier groups' writes (see `engine_app::World`).
    ///
    /// Returns the per-system command buffers in the deterministic order
    /// they must be applied: by group order, then stage order, then system
    /// registration order within the stage.
    #[must_use]
    pub fn run_tick(&self, store: &Store, dt: f64) -> Vec<CommandBuffer> {
        let mut ordered_buffers = Vec::with_capacity(self.systems.len());
        for &group in &SystemGroup::ORDER {
            ordered_buffers.extend(self.run_group(group, store, dt));
        }
        ordered_buffers
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use engine_component::ComponentTypeId;

    use super::*;

    fn make_query(reads: &[u64], writes: &[u64]) -> QueryDescriptor {
        let mut q = QueryDescriptor::new();
        for &r in reads {
            q = q.read(ComponentTypeId(r));
        }
        for &w in writes {
            q = q.write(ComponentTypeId(w));
        }
        q
    }

    struct NoopSystem;
    impl System for NoopSystem {
        fn name(&self) -> &str {
            "noop"
        }
        fn run(&self, _store: &Store, _buffer: &mut CommandBuffer, _dt: f64) {}
    }

    fn make_registered(name: &str, group: SystemGroup, reads: &[u64], writes: &[u64]) -> RegisteredSystem {
        RegisteredSystem::new(name, group, make_query(reads, writes), Arc::new(NoopSystem))
    }

    #[test]
    fn test_non_conflicting_systems_share_a_stage() {
        let a = make_registered("a", SystemGroup::Physics, &[1], &[2]);
        let b = make_registered("b", SystemGroup::Physics, &[1], &[3]);
        let refs = vec![&a, &b];
        let stages = compute_stages(&refs);
        assert_eq!(stages.len(), 1);
        assert_eq!(stages[0].system_indices.len(), 2);
    }

    #[test]
    fn test_conflicting_systems_split_stages() {
        let a = make_registered("a", SystemGroup::Physics, &[1], &[2]);
        let b = make_registered("b", SystemGroup::Physics, &[2], &[1]);
        let refs = vec![&a, &b];
        let stages = compute_stages(&refs);
        assert_eq!(stages.len(), 2);
    }

    #[test]
    fn test_depends_on_forces_later_stage_even_without_conflict() {
        let a = make_registered("a", SystemGroup::Physics, &[1], &[2]);
        let mut b = make_registered("b", SystemGroup::Physics, &[9], &[10]);
        b.depends_on.push("a".to_string());
        let refs = vec![&a, &b];
        let stages = compute_stages(&refs);
        assert_eq!(stages.len(), 2);
        assert_eq!(stages[0].system_indices, vec![0]);
        assert_eq!(stages[1].system_indices, vec![1]);
    }

    #[test]
    fn test_register_rejects_unknown_dependency() {
        let mut scheduler = Scheduler::new(2).unwrap();
        let mut sys = make_registered("b", SystemGroup::Physics, &[1], &[2]);
        sys.depends_on.push("ghost".to_string());
        let err = scheduler.register(sys);
        assert!(err.is_err());
    }

    #[test]
    fn test_run_tick_executes_every_registered_system() {
        struct CountingSystem(Arc<AtomicU32>);
        impl System for CountingSystem {
            fn name(&self) -> &str {
                "counting"
            }
            fn run(&self, _store: &Store, _buffer: &mut CommandBuffer, _dt: f64) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        let counter = Arc::new(AtomicU32::new(0));
        let mut scheduler = Scheduler::new(2).unwrap();
        scheduler
            .register(RegisteredSystem::new(
                "count-a",
                SystemGroup::Physics,
                make_query(&[1], &[2]),
                Arc::new(CountingSystem(counter.clone())),
            ))
            .unwrap();
        scheduler
            .register(RegisteredSystem::new(
                "count-b",
                SystemGroup::Physics,
                make_query(&[3], &[4]),
                Arc::new(CountingSystem(counter.clone())),
            ))
            .unwrap();

        let store = Store::new();
        let buffers = scheduler.run_tick(&store, 1.0 / 60.0);
        assert_eq!(buffers.len(), 2);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_panicking_system_does_not_unwind_past_run_group_and_others_still_run() {
        struct PanickingSystem;
        impl System for PanickingSystem {
            fn name(&self) -> &str {
                "panicking"
            }
            fn run(&self, _store: &Store, _buffer: &mut CommandBuffer, _dt: f64) {
                panic!("simulated system failure");
            }
        }

        let counter = Arc::new(AtomicU32::new(0));
        struct CountingSystem(Arc<AtomicU32>);
        impl System for CountingSystem {
            fn name(&self) -> &str {
                "counting"
            }
            fn run(&self, _store: &Store, _buffer: &mut CommandBuffer, _dt: f64) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        let mut scheduler = Scheduler::new(2).unwrap();
        scheduler
            .register(RegisteredSystem::new(
                "boom",
                SystemGroup::Physics,
                make_query(&[1], &[2]),
                Arc::new(PanickingSystem),
            ))
            .unwrap();
        scheduler
            .register(RegisteredSystem::new(
                "survivor",
                SystemGroup::Physics,
                make_query(&[3], &[4]),
                Arc::new(CountingSystem(counter.clone())),
            ))
            .unwrap();

        let store = Store::new();
        let buffers = scheduler.run_group(SystemGroup::Physics, &store, 1.0 / 60.0);

        assert_eq!(buffers.len(), 2);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
