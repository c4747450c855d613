//! # Bookrun Simulator
//!
//! Headless driver for one Bookrun zone.
//!
//! Runs an Old Man and a Bully against a scripted player and camera for a
//! fixed amount of simulated time, logs what happens, and prints a JSON
//! summary to stdout.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

mod config;
mod report;
mod script;
mod timing;

use anyhow::{Context, Result};
use bookrun_common::Side;
use bookrun_gameplay::{Zone, ZoneTuning};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{SimConfig, USAGE};
use crate::report::{EventTally, SimReport};
use crate::script::ScriptedPlayer;
use crate::timing::FixedStep;

/// Main entry point.
fn main() -> Result<()> {
    let config = SimConfig::from_args(std::env::args().skip(1))?;
    if config.help {
        println!("{USAGE}");
        return Ok(());
    }

    init_tracing(config.log_json)?;

    info!("Bookrun simulator starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let report = run(&config)?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    info!("Bookrun simulator finished");
    Ok(())
}

fn init_tracing(json: bool) -> Result<()> {
    let filter = EnvFilter::from_default_env().add_directive("bookrun=info".parse()?);
    if json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(filter)
            .init();
    }
    Ok(())
}

/// Runs one zone to completion.
fn run(config: &SimConfig) -> Result<SimReport> {
    let tuning = match &config.tuning_path {
        Some(path) => ZoneTuning::load_from(path)
            .with_context(|| format!("failed to load tuning from {}", path.display()))?,
        None => ZoneTuning::default(),
    };
    tuning.validate()?;

    let actions = match &config.script_path {
        Some(path) => script::load_script(path)?,
        None => script::default_script(),
    };
    let mut player = ScriptedPlayer::new(
        actions,
        config.viewport_width * 0.5,
        config.ground_y,
        config.viewport_width,
    );

    let mut zone = Zone::new(tuning, config.seed);
    zone.spawn_old_man(player.camera(), config.ground_y, Side::Right)?;
    zone.spawn_bully(player.camera(), config.ground_y, Side::Left)?;

    let mut timing = FixedStep::new(config.step_ms);
    let step_ms = timing.step_ms();
    let mut rng = fastrand::Rng::with_seed(config.seed);
    let mut tally = EventTally::default();
    let mut frames = 0u64;
    let mut steps = 0u64;
    let mut simulated_ms = 0.0f32;

    while simulated_ms < config.duration_ms {
        let frame_ms = timing::render_frame_ms(&mut rng, step_ms, frames);
        for _ in 0..timing.accumulate(frame_ms) {
            player.update(step_ms);
            zone.tick(player.camera(), player.position(), step_ms);
            for event in zone.drain_events() {
                tally.record(&event);
            }
            steps += 1;
            simulated_ms += step_ms;
        }
        frames += 1;
    }

    let npcs = zone.snapshots();
    let confidence_lost = zone.confidence_lost();
    let now_ms = zone.now_ms();
    zone.deactivate();
    for event in zone.drain_events() {
        tally.record(&event);
    }

    info!(
        "Ran {steps} steps over {frames} frames, player lost {confidence_lost} confidence"
    );

    Ok(SimReport {
        seed: config.seed,
        simulated_ms: now_ms,
        frames,
        steps,
        confidence_lost,
        npcs,
        events: tally,
    })
}
