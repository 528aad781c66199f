//! OV7670 capture CLI
//!
//! Configures the sensor, captures frames through the FIFO and writes
//! them as BMP files. On a development host the camera module is
//! simulated; board support crates provide the pins for real hardware.

use clap::Parser;
use ov7670_fifo::{
    capture::{CaptureError, CaptureSession, FileConfig},
    decode::PixelFormat,
    fifo::{FifoChannel, FifoPins},
    metrics::{MetricsRegistry, MetricsSnapshot},
    sensor::{Ov7670, Resolution},
    sim::{NoDelay, SimFifo, SimRegisters, SimSensor},
    sink::BmpFileSink,
    sync::EdgeSynchronizer,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Frame period of the simulated sensor.
const SIM_FRAME_PERIOD: Duration = Duration::from_millis(33);

#[derive(Debug, Parser)]
#[command(
    name = "ov7670-capture",
    version,
    about = "Capture frames from an OV7670 + AL422 FIFO module"
)]
struct Args {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Pixel format: rgb444, rgb555, rgb565, yuv422 or bayer.
    #[arg(short, long)]
    format: Option<PixelFormat>,

    /// Frame size, e.g. 320x240 or qvga.
    #[arg(short, long)]
    resolution: Option<Resolution>,

    /// Number of frames to capture.
    #[arg(short = 'n', long)]
    frames: Option<u32>,

    /// Capture until interrupted.
    #[arg(long)]
    continuous: bool,

    /// Directory for BMP files.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the sensor registers before and after configuration.
    #[arg(long)]
    dump_registers: bool,

    /// Overlay the sensor's colour bar test pattern.
    #[arg(long)]
    color_bar: bool,

    /// Run against the simulated camera module.
    #[arg(long)]
    simulate: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    if let Err(e) = run(args) {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn load_config(args: &Args) -> Result<FileConfig, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => FileConfig::from_file(path)?,
        None => FileConfig::default(),
    };

    let capture = &mut config.capture;
    if let Some(format) = args.format {
        capture.format = format;
    }
    if let Some(resolution) = args.resolution {
        capture.resolution = resolution;
    }
    if let Some(frames) = args.frames {
        config.output.frame_count = frames;
    }
    if args.continuous {
        config.output.continuous = true;
    }
    if let Some(output) = &args.output {
        config.output.directory = output.clone();
    }
    config.capture.validate()?;
    Ok(config)
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    info!("OV7670 capture v{}", ov7670_fifo::VERSION);

    if !args.simulate {
        return Err("no hardware backend on this host; run with --simulate".into());
    }

    let config = load_config(&args)?;
    let format = config.capture.format;
    let resolution = config.capture.resolution;
    let (width, height) = resolution.dimensions();

    let abort = Arc::new(AtomicBool::new(false));
    {
        let abort = Arc::clone(&abort);
        ctrlc::set_handler(move || {
            abort.store(true, Ordering::Relaxed);
        })?;
    }

    let registry = Arc::new(MetricsRegistry::new()?);
    start_metrics_server(&registry, config.output.metrics_port)?;

    // Sensor configuration
    let mut sensor = Ov7670::new(SimRegisters::new());
    if args.dump_registers {
        let dump = sensor.dump_registers()?;
        println!("Registers before initialization:\n{}", dump.to_hex_table());
    }
    sensor.configure(format, resolution)?;
    if args.color_bar {
        sensor.enable_color_bar()?;
    }
    sensor.enable_fifo_write_reset()?;
    if args.dump_registers {
        let dump = sensor.dump_registers()?;
        println!("Registers after initialization:\n{}", dump.to_hex_table());
    }

    // Camera module: the simulated sensor raises the frame and line edges.
    let sync = Arc::new(EdgeSynchronizer::new());
    let fifo = SimFifo::new();
    let stop = Arc::new(AtomicBool::new(false));
    let module = SimSensor::new(fifo.clone(), format, width, height).spawn(
        Arc::clone(&sync),
        SIM_FRAME_PERIOD,
        Arc::clone(&stop),
    );

    let pins = FifoPins {
        rrst: fifo.rrst(),
        oe: fifo.oe(),
        rclk: fifo.rclk(),
    };
    let channel = FifoChannel::new(pins, fifo.data_bus(), NoDelay, config.fifo)?;
    let mut session = CaptureSession::new(&sync, channel, config.capture.clone())?
        .with_abort(Arc::clone(&abort));
    let mut sink = BmpFileSink::new(&config.output.directory)?;

    info!(
        %format,
        %resolution,
        directory = %config.output.directory.display(),
        continuous = config.output.continuous,
        "capturing"
    );

    let interval = Duration::from_millis(config.output.interval_ms);
    let mut captured = 0u32;
    let outcome = loop {
        if !config.output.continuous && captured >= config.output.frame_count {
            break Ok(());
        }

        match session.capture(&mut sink) {
            Ok(report) => {
                captured += 1;
                info!(
                    sequence = report.sequence,
                    lines = report.line_count,
                    elapsed_ms = report.elapsed.as_millis() as u64,
                    "frame {} stored",
                    captured
                );
            }
            Err(CaptureError::Timeout { timeout_ms }) => {
                warn!(timeout_ms, "frame capture timed out");
            }
            Err(CaptureError::Aborted) => {
                info!("interrupted");
                break Ok(());
            }
            Err(e) => break Err(e),
        }
        registry.update(&MetricsSnapshot::from(session.stats()));

        if !pause(interval, &abort) {
            info!("interrupted");
            break Ok(());
        }
    };

    stop.store(true, Ordering::Relaxed);
    if module.join().is_err() {
        warn!("simulated sensor thread panicked");
    }

    let stats = session.stats();
    info!(
        frames = stats.frames_captured,
        timeouts = stats.timeouts,
        failures = stats.failures,
        files = sink.written().len(),
        "done"
    );
    outcome.map_err(Into::into)
}

/// Sleeps for `interval` unless `abort` fires first. Returns false if aborted.
fn pause(interval: Duration, abort: &AtomicBool) -> bool {
    let deadline = Instant::now() + interval;
    while Instant::now() < deadline {
        if abort.load(Ordering::Relaxed) {
            return false;
        }
        std::thread::sleep(Duration::from_millis(10).min(interval));
    }
    !abort.load(Ordering::Relaxed)
}

#[cfg(feature = "metrics")]
fn start_metrics_server(
    registry: &Arc<MetricsRegistry>,
    port: u16,
) -> Result<(), Box<dyn std::error::Error>> {
    use ov7670_fifo::metrics::{MetricsServer, MetricsServerConfig};

    if port != 0 {
        MetricsServer::new(MetricsServerConfig::with_port(port), Arc::clone(registry)).spawn()?;
    }
    Ok(())
}

#[cfg(not(feature = "metrics"))]
fn start_metrics_server(
    _registry: &Arc<MetricsRegistry>,
    port: u16,
) -> Result<(), Box<dyn std::error::Error>> {
    if port != 0 {
        warn!(port, "built without the metrics feature; exporter disabled");
    }
    Ok(())
}
