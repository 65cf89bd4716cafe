//! Haptic buoyancy demo
//!
//! Runs the device sync loop headless against a box-shaped probe and liquid.
//! Without `--native` the device is simulated: the probe bobs in and out of
//! the liquid while button 0 is held, so the buoyant force shows up in the log.
//!
//! ```text
//! haptic-buoyancy [--config PATH] [--native [PATH]] [--ticks N]
//! ```

use anyhow::{bail, Context, Result};
use glam::DVec3;
use haptic_device::{DeviceBoundary, DeviceSample, NativeDevice, SimulatedDevice};
use haptic_simulation::{BoxScene, DeviceStateSync, SessionConfig};
use rand::Rng;
use std::path::PathBuf;
use std::time::Instant;

const DEFAULT_TICKS: u64 = 250;

// Simulated probe motion, native meters
const BOB_CENTER: f64 = -0.01;
const BOB_AMPLITUDE: f64 = 0.04;
const BOB_PERIOD_TICKS: f64 = 100.0;
const JITTER: f64 = 0.0005;

struct Args {
    config: Option<PathBuf>,
    /// `Some(None)` loads the plugin from the default library path
    native: Option<Option<PathBuf>>,
    ticks: u64,
}

fn parse_args() -> Result<Args> {
    let mut args = Args {
        config: None,
        native: None,
        ticks: DEFAULT_TICKS,
    };

    let mut raw = std::env::args().skip(1).peekable();
    while let Some(arg) = raw.next() {
        match arg.as_str() {
            "--config" => {
                let path = raw.next().context("--config needs a path")?;
                args.config = Some(PathBuf::from(path));
            }
            "--native" => {
                let path = raw.next_if(|next| !next.starts_with("--"));
                args.native = Some(path.map(PathBuf::from));
            }
            "--ticks" => {
                let n = raw.next().context("--ticks needs a count")?;
                args.ticks = n.parse().with_context(|| format!("invalid tick count {n:?}"))?;
            }
            other => bail!("unknown argument {other:?}"),
        }
    }

    Ok(args)
}

/// Sine bob through the liquid surface with a little hand tremor
fn scripted_device(ticks: u64) -> SimulatedDevice {
    let mut rng = rand::rng();

    let samples = (0..ticks).map(|n| {
        let phase = n as f64 / BOB_PERIOD_TICKS * std::f64::consts::TAU;
        let jitter = DVec3::new(
            rng.random_range(-JITTER..JITTER),
            rng.random_range(-JITTER..JITTER),
            rng.random_range(-JITTER..JITTER),
        );
        let position = DVec3::new(0.0, BOB_CENTER + BOB_AMPLITUDE * phase.sin(), 0.0) + jitter;
        DeviceSample::at(position).with_button(0, true)
    });

    SimulatedDevice::with_script(samples.collect::<Vec<_>>())
}

fn open_device(args: &Args) -> Result<Box<dyn DeviceBoundary>> {
    match &args.native {
        Some(path) => {
            let path = path.clone().unwrap_or_else(NativeDevice::default_path);
            let device = NativeDevice::load(&path)
                .with_context(|| format!("loading device plugin {}", path.display()))?;
            Ok(Box::new(device))
        }
        None => {
            log::info!("Using simulated device ({} scripted samples)", args.ticks);
            Ok(Box::new(scripted_device(args.ticks)))
        }
    }
}

fn main() -> Result<()> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting haptic buoyancy session...");

    let args = parse_args()?;
    let config = match &args.config {
        Some(path) => SessionConfig::load(path)?,
        None => SessionConfig::default(),
    };

    let device = open_device(&args)?;
    let mut scene = BoxScene::new(config.probe.half_extents, config.liquid);
    let mut sync = DeviceStateSync::new(device, &config);

    let period = config.tick_period();
    log::info!(
        "Running {} ticks at {:.0} Hz, gate {:?}",
        args.ticks,
        config.tick_rate_hz,
        sync.gate()
    );

    let mut next = Instant::now();
    for _ in 0..args.ticks {
        let report = sync.tick(&mut scene);

        log::info!(
            "tick {:4}  pos=({:+.3}, {:+.3}, {:+.3})  force={:+9.3} N  gate={}  liquid.y={:+.4}",
            report.tick,
            report.position.x,
            report.position.y,
            report.position.z,
            report.force.y,
            if report.gate_open { "open" } else { "closed" },
            scene.liquid_transform().position.y,
        );

        next += period;
        if let Some(wait) = next.checked_duration_since(Instant::now()) {
            std::thread::sleep(wait);
        }
    }

    sync.teardown();
    log::info!("Session finished after {} ticks", sync.ticks());

    Ok(())
}
