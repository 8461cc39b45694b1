//! Fixed-timestep tick loop.
//!
//! Drives [`World::tick`] at a configured rate, logging and accumulating
//! (rather than failing) on overrun — a slow tick delays the next one but
//! never aborts the process.

use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::world::World;

/// Configuration for the coordinator tick loop.
#[derive(Debug, Clone, Copy)]
pub struct TickConfig {
    /// Target ticks per second.
    pub tick_rate: f64,
    /// Maximum number of ticks to run (0 = unlimited).
    pub max_ticks: u64,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60.0,
            max_ticks: 0,
        }
    }
}

impl TickConfig {
    #[must_use]
    pub fn tick_duration(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.tick_rate)
    }
}

/// Runs a [`World`] at a fixed rate until `max_ticks` is reached (or forever,
/// if `max_ticks == 0`).
pub struct TickLoop {
    config: TickConfig,
}

impl TickLoop {
    #[must_use]
    pub fn new(config: TickConfig) -> Self {
        Self { config }
    }

    /// Run the tick loop to completion. Each iteration ticks `world`, then
    /// sleeps out whatever remains of the tick budget; a tick that overruns
    /// its budget logs a warning and starts the next tick immediately
    /// instead of trying to catch up by running multiple ticks back to back.
    pub fn run(&self, world: &mut World) {
        let tick_duration = self.config.tick_duration();
        let dt = tick_duration.as_secs_f64();
        let mut ticks_run: u64 = 0;

        loop {
            if self.config.max_ticks != 0 && ticks_run >= self.config.max_ticks {
                break;
            }

            let started = Instant::now();
            let events = world.tick(dt);
            let elapsed = started.elapsed();
            debug!(tick = world.tick_count(), events = events.len(), ?elapsed, "tick complete");

            if elapsed > tick_duration {
                warn!(tick = world.tick_count(), ?elapsed, budget = ?tick_duration, "tick overran its budget");
            } else {
                std::thread::sleep(tick_duration - elapsed);
            }

            ticks_run += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use engine_damage::{InPlaceRespawnController, NullCollaborators};
    use engine_net::{OmniscientViewer, RecordingOutbox};
    use engine_physics::{EmptySpatialResource, NoCollisionModule, NoFluidVolume};

    use super::*;
    use crate::systems::{PhysicsCollaborators, TuningConfig};
    use crate::world::WorldCollaborators;

    fn test_world() -> World {
        World::new(
            2,
            vec![],
            5.0,
            20,
            WorldCollaborators {
                death_interaction_runner: Arc::new(NullCollaborators),
                drop_config: Arc::new(NullCollaborators),
                outbox: Arc::new(RecordingOutbox::new()),
                viewer: Arc::new(OmniscientViewer),
                connections: Arc::new(NullCollaborators),
                broken_item_checker: Arc::new(NullCollaborators),
                respawn_controller: Arc::new(InPlaceRespawnController),
                physics: PhysicsCollaborators {
                    collision: Arc::new(NoCollisionModule),
                    spatial: Arc::new(EmptySpatialResource),
                    fluid: Arc::new(NoFluidVolume),
                },
                tuning: TuningConfig::default(),
            },
        )
        .unwrap()
    }

    #[test]
    fn test_tick_duration_matches_rate() {
        let config = TickConfig { tick_rate: 20.0, max_ticks: 0 };
        assert_eq!(config.tick_duration(), Duration::from_millis(50));
    }

    #[test]
    fn test_run_stops_at_max_ticks() {
        let mut world = test_world();
        let tick_loop = TickLoop::new(TickConfig { tick_rate: 1000.0, max_ticks: 3 });
        tick_loop.run(&mut world);
        assert_eq!(world.tick_count(), 3);
    }
}
