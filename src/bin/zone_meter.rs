// zone-meter - terminal level meter over the classification engine
//
// Drives ZoneEngine::tick at a fixed cadence from live capture, a
// synthetic fixture or a WAV file, and renders the published level, zone
// and pitch as a one-line bar. Doubles as a capture smoke test: `devices`
// lists what the host can open.

use std::io::Write;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};

use voicezone::analysis::HeldLevel;
use voicezone::testing::{SyntheticSource, WavSource};
use voicezone::{DetectionMode, DetectorConfig, Zone, ZoneEngine};

#[derive(Parser, Debug)]
#[command(name = "zone-meter", about = "Live zone classification meter")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List capture devices by index
    Devices,
    /// Run the meter
    Run {
        /// Capture device index (defaults to the host default device)
        #[arg(long)]
        device: Option<usize>,
        /// Synthetic fixture instead of live capture,
        /// e.g. sine:220:0.5, square:110, noise:0.3, silence
        #[arg(long, conflicts_with = "device")]
        fixture: Option<String>,
        /// WAV file instead of live capture
        #[arg(long, conflicts_with_all = ["device", "fixture"])]
        wav: Option<PathBuf>,
        /// Detection mode
        #[arg(long, value_enum, default_value = "volume")]
        mode: ModeArg,
        /// JSON detector configuration file
        #[arg(long)]
        config: Option<PathBuf>,
        /// Force a debug-override hold instead of reading input
        #[arg(long, value_enum)]
        r#override: Option<OverrideArg>,
        /// Ticks per second
        #[arg(long, default_value_t = 60)]
        rate: u32,
        /// Stop after this many ticks (0 = run until interrupted)
        #[arg(long, default_value_t = 0)]
        ticks: u64,
    },
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
    Volume,
    Pitch,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum OverrideArg {
    Medium,
    High,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Devices => run_devices(),
        Commands::Run {
            device,
            fixture,
            wav,
            mode,
            config,
            r#override,
            rate,
            ticks,
        } => run_meter(device, fixture, wav, mode, config, r#override, rate, ticks),
    }
}

fn run_devices() -> Result<()> {
    let names = voicezone::audio::mic::input_device_names();
    if names.is_empty() {
        println!("no capture devices found");
    } else {
        for (index, name) in names.iter().enumerate() {
            println!("[{}] {}", index, name);
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_meter(
    device: Option<usize>,
    fixture: Option<String>,
    wav: Option<PathBuf>,
    mode: ModeArg,
    config_path: Option<PathBuf>,
    override_hold: Option<OverrideArg>,
    rate: u32,
    ticks: u64,
) -> Result<()> {
    let mut config = match config_path {
        Some(path) => DetectorConfig::load_from_file(path),
        None => DetectorConfig::default(),
    };
    config.set_mode(match mode {
        ModeArg::Volume => DetectionMode::Volume,
        ModeArg::Pitch => DetectionMode::Pitch,
    });

    let mut engine = if let Some(spec) = fixture {
        let source: SyntheticSource = match spec.parse() {
            Ok(source) => source,
            Err(reason) => bail!(reason),
        };
        ZoneEngine::new(config, Box::new(source))
    } else if let Some(path) = wav {
        let source = WavSource::load(&path)?;
        ZoneEngine::new(config, Box::new(source))
    } else {
        ZoneEngine::from_device(device, config)
    };

    if let Some(hold) = override_hold {
        engine.debug_override_mut().set_active(true);
        engine.debug_override_mut().hold(match hold {
            OverrideArg::Medium => HeldLevel::Medium,
            OverrideArg::High => HeldLevel::High,
        });
    }

    if !engine.is_capture_available() && !engine.debug_override().is_active() {
        tracing::warn!("no input; the meter will sit at zero");
    }

    let interval = Duration::from_secs_f32(1.0 / rate.max(1) as f32);
    let mut previous = Instant::now();
    let mut count = 0_u64;
    let mut stdout = std::io::stdout();

    loop {
        std::thread::sleep(interval);
        let now = Instant::now();
        let dt = (now - previous).as_secs_f32();
        previous = now;

        let result = engine.tick(dt);
        let line = render_line(result.level, result.zone, result.pitch_hz, engine.config());
        write!(stdout, "\r{}", line)?;
        stdout.flush()?;

        count += 1;
        if ticks > 0 && count >= ticks {
            writeln!(stdout)?;
            break;
        }
    }

    Ok(())
}

/// One-line bar: level fill against the thresholds, zone label, pitch
fn render_line(level: f32, zone: Zone, pitch_hz: f32, config: &DetectorConfig) -> String {
    const WIDTH: usize = 40;
    let filled = (level * WIDTH as f32).round() as usize;
    let mut bar = String::with_capacity(WIDTH);
    for i in 0..WIDTH {
        let position = i as f32 / WIDTH as f32;
        if i < filled {
            bar.push('#');
        } else if (position - config.yellow_threshold()).abs() < 1.0 / WIDTH as f32
            || (position - config.red_threshold()).abs() < 1.0 / WIDTH as f32
        {
            bar.push('|');
        } else {
            bar.push('-');
        }
    }

    let zone_label = match zone {
        Zone::Green => "GREEN ",
        Zone::Yellow => "YELLOW",
        Zone::Red => "RED   ",
    };

    if pitch_hz > 0.0 {
        format!("[{}] {} {:>5.2} {:>6.1} Hz", bar, zone_label, level, pitch_hz)
    } else {
        format!("[{}] {} {:>5.2}          ", bar, zone_label, level)
    }
}
