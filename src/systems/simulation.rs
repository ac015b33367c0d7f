//! Game simulation system
//!
//! Converts host frames into scheduler invocations:
//! - Reads the host clock (real or simulated) in microseconds
//! - Drives [`ActiveTable::update`] with that time
//! - Accumulates frame statistics for reporting

use std::time::Instant;

use pinball_core::{ActiveTable, FrameStats};

/// Source of wall-clock time for the scheduler
#[derive(Debug, Clone, Copy)]
pub enum SimulationClock {
    /// Follow the process clock from the moment the system was created
    Real(Instant),
    /// Advance only when told to (headless and test runs)
    Simulated { now_us: u64 },
}

impl SimulationClock {
    /// Current time in microseconds
    pub fn now_us(&self) -> u64 {
        match self {
            SimulationClock::Real(start) => start.elapsed().as_micros() as u64,
            SimulationClock::Simulated { now_us } => *now_us,
        }
    }
}

/// Totals over every frame run so far
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimulationTotals {
    /// Host frames processed
    pub frames: u64,
    /// Physics sub-steps run
    pub substeps: u64,
    /// Wall-clock time dropped by the frame-skip valve
    pub skipped_us: u64,
    /// Inner iterations whose hit time was forced to the static quantum
    pub forced_static: u64,
}

impl SimulationTotals {
    fn add(&mut self, stats: &FrameStats) {
        self.frames += 1;
        self.substeps += u64::from(stats.substeps);
        self.skipped_us += stats.skipped_us;
        self.forced_static += u64::from(stats.forced_static);
    }
}

/// Manages the game simulation loop
pub struct SimulationSystem {
    clock: SimulationClock,
    totals: SimulationTotals,
}

impl SimulationSystem {
    /// Create a system following the real clock
    pub fn new() -> Self {
        Self {
            clock: SimulationClock::Real(Instant::now()),
            totals: SimulationTotals::default(),
        }
    }

    /// Create a system whose clock only moves through [`advance_clock`](Self::advance_clock)
    pub fn simulated() -> Self {
        Self {
            clock: SimulationClock::Simulated { now_us: 0 },
            totals: SimulationTotals::default(),
        }
    }

    pub fn clock(&self) -> SimulationClock {
        self.clock
    }

    pub fn totals(&self) -> SimulationTotals {
        self.totals
    }

    /// Move a simulated clock forward; no effect on a real clock
    pub fn advance_clock(&mut self, delta_us: u64) {
        if let SimulationClock::Simulated { now_us } = &mut self.clock {
            *now_us += delta_us;
        }
    }

    /// Run one simulation frame
    ///
    /// Brings the table's physics up to the current clock time; hit and
    /// timer events land in the table's playfield.
    pub fn update(&mut self, table: &mut ActiveTable) -> FrameStats {
        let stats = table.update(self.clock.now_us());
        self.totals.add(&stats);
        stats
    }
}

impl Default for SimulationSystem {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pinball_core::{BallSpawn, PhysicsConfig, TableSettings, TableTemplate, Vec3};

    fn rolling_table() -> ActiveTable {
        let template = TableTemplate::new("Test")
            .with_settings(TableSettings::level_frictionless())
            .with_ball(BallSpawn::at(Vec3::new(100.0, 100.0, 25.0)).with_velocity(Vec3::new(1.0, 0.0, 0.0)));
        ActiveTable::from_template(&template, PhysicsConfig::default()).unwrap()
    }

    #[test]
    fn test_first_frame_only_starts_clock() {
        let mut table = rolling_table();
        let mut system = SimulationSystem::simulated();
        let stats = system.update(&mut table);
        assert_eq!(stats.substeps, 0);
        assert_eq!(system.totals().frames, 1);
    }

    #[test]
    fn test_simulated_frames_accumulate() {
        let mut table = rolling_table();
        let mut system = SimulationSystem::simulated();
        system.update(&mut table);
        for _ in 0..10 {
            system.advance_clock(10_000);
            system.update(&mut table);
        }

        let totals = system.totals();
        assert_eq!(totals.frames, 11);
        assert_eq!(totals.substeps, 100);
        assert_eq!(totals.skipped_us, 0);

        // 100 ms = 10 time units at 1 unit per time unit
        let ball = table.world.ball(table.balls[0]).unwrap();
        assert!((ball.position.x - 110.0).abs() < 0.001);
    }

    #[test]
    fn test_advance_ignored_on_real_clock() {
        let mut system = SimulationSystem::new();
        system.advance_clock(1_000_000_000);
        assert!(system.clock().now_us() < 1_000_000_000);
    }
}
