//! Headless pinball runner
//!
//! Loads the configured table, drives the physics scheduler frame by frame
//! and logs ball state, hits and scheduler statistics.

use std::process::ExitCode;
use std::time::Duration;

use pinball::config::AppConfig;
use pinball::systems::SimulationSystem;
use pinball_core::{ActiveTable, PhysicsEvent, TableTemplate, TableValidator};

fn main() -> ExitCode {
    let (config, config_error) = match AppConfig::load() {
        Ok(config) => (config, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.debug.log_level)).init();
    log::info!("Starting pinball");
    if let Some(e) = config_error {
        log::warn!("Failed to load config: {}. Using defaults.", e);
    }

    let template = match TableTemplate::load(&config.table.path) {
        Ok(template) => template,
        Err(e) => {
            log::error!("Failed to load table '{}': {}", config.table.path, e);
            return ExitCode::FAILURE;
        }
    };

    let errors = TableValidator::validate(&template);
    for error in &errors {
        log::warn!("Table '{}': {}", template.name, error);
    }
    if config.table.strict && !errors.is_empty() {
        log::error!("Refusing to run table with {} validation errors", errors.len());
        return ExitCode::FAILURE;
    }

    let mut table = match ActiveTable::from_template(&template, config.physics.clone()) {
        Ok(table) => table,
        Err(e) => {
            log::error!("Failed to build table '{}': {}", template.name, e);
            return ExitCode::FAILURE;
        }
    };
    log::info!(
        "Loaded table '{}' with {} objects and {} balls",
        table.name,
        table.playfield.len(),
        table.world.ball_count()
    );

    run(&config, &mut table);
    report_hits(&table);
    ExitCode::SUCCESS
}

/// Drive the table for the configured duration
fn run(config: &AppConfig, table: &mut ActiveTable) {
    let run = &config.run;
    let frame_us = run.frame_us.max(1);
    let duration_us = run.duration_ms * 1000;
    let report_us = run.report_interval_ms.max(1) * 1000;

    let mut system = if run.realtime {
        SimulationSystem::new()
    } else {
        SimulationSystem::simulated()
    };

    // First update only starts the scheduler clock
    system.update(table);
    let mut next_report_us = report_us;

    while system.clock().now_us() < duration_us {
        if run.realtime {
            std::thread::sleep(Duration::from_micros(frame_us));
        } else {
            system.advance_clock(frame_us);
        }
        system.update(table);

        for event in table.playfield.drain_events() {
            if let PhysicsEvent::Timer(id) = event {
                log::debug!("Timer {:?} at {} ms", id, table.world.physics_time_ms());
            }
        }

        if system.clock().now_us() >= next_report_us {
            next_report_us += report_us;
            report_balls(config, table);
        }
    }

    let totals = system.totals();
    log::info!(
        "Ran {} frames, {} sub-steps ({} physics iterations), skipped {} us, {} forced static steps",
        totals.frames,
        totals.substeps,
        table.world.physics_iterations(),
        totals.skipped_us,
        totals.forced_static
    );
}

fn report_balls(config: &AppConfig, table: &ActiveTable) {
    log::info!(
        "t = {} ms: {} balls in play",
        table.world.physics_time_ms(),
        table.world.ball_count()
    );
    if !config.debug.log_snapshots {
        return;
    }
    for snapshot in table.world.snapshots() {
        log::info!(
            "  ball {}: position ({:.2}, {:.2}, {:.2}) velocity ({:.3}, {:.3}, {:.3})",
            snapshot.id,
            snapshot.position.x,
            snapshot.position.y,
            snapshot.position.z,
            snapshot.velocity.x,
            snapshot.velocity.y,
            snapshot.velocity.z
        );
    }
}

fn report_hits(table: &ActiveTable) {
    for (_, object) in table.playfield.iter() {
        if object.hit_count > 0 {
            log::info!(
                "'{}' hit {} times (last impact speed {:.2})",
                object.name,
                object.hit_count,
                object.last_hit_speed
            );
        }
    }
    log::info!("Ball-ball impacts: {}", table.playfield.ball_hits());
}
