//! colorcal command-line tool
//!
//! Inspect ICC profiles and drive the X-Rite ColorMunki from the terminal.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

use colorcal::config::DriverConfig;
use colorcal::device::{ButtonPress, ColorMunki, DriverState, Sensor};
use colorcal::profile::{Clut, Profile, ProfileDecoder, scan_profiles};
use colorcal::storage::{self, AppSettings};
use colorcal::utils::parsing::{parse_ramp_size, parse_usb_id};

/// Poll interval while watching for sensor events.
const PUMP_INTERVAL: Duration = Duration::from_millis(100);

// =============================================================================
// CLI Arguments
// =============================================================================

/// Color profile and colorimeter tool
#[derive(Parser, Debug)]
#[command(name = "colorcal-cli")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show profile metadata
    Profile {
        /// Path to an .icc or .icm file
        path: PathBuf,
    },

    /// Print the video card gamma table of a profile
    Vcgt {
        path: PathBuf,

        /// Number of ramp entries
        #[arg(short, long, default_value = "256", value_parser = parse_ramp_size)]
        size: usize,
    },

    /// Print a ramp sampled from the profile's tone curves
    Curve {
        path: PathBuf,

        /// Number of ramp entries
        #[arg(short, long, default_value = "256", value_parser = parse_ramp_size)]
        size: usize,
    },

    /// Parse every profile in the given (or configured) directories
    Scan {
        dirs: Vec<PathBuf>,
    },

    /// Talk to a ColorMunki
    Sensor {
        /// Override the USB id as VID:PID (hex)
        #[arg(long, value_parser = parse_usb_id)]
        device: Option<(u16, u16)>,

        #[command(subcommand)]
        action: SensorAction,
    },

    /// Manage the settings file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum SensorAction {
    /// Print device diagnostics
    Dump,
    /// Report button presses and dial changes until Ctrl+C
    Watch,
    /// Take an ambient light reading (dial must be at ambient)
    Ambient,
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Create the settings file with defaults if missing
    Init,
    /// Print the effective settings
    Show,
    /// Overwrite the settings file with defaults
    Reset,
}

// =============================================================================
// Main
// =============================================================================

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let settings = storage::load_settings().context("Failed to load settings")?;

    match args.command {
        Command::Profile { path } => cmd_profile(&settings, &path),
        Command::Vcgt { path, size } => cmd_vcgt(&settings, &path, size),
        Command::Curve { path, size } => cmd_curve(&settings, &path, size),
        Command::Scan { dirs } => cmd_scan(&settings, dirs),
        Command::Sensor { device, action } => {
            let mut config = settings.driver.clone();
            if let Some((vid, pid)) = device {
                config.vendor_id = vid;
                config.product_id = pid;
            }
            match action {
                SensorAction::Dump => cmd_sensor_dump(config),
                SensorAction::Watch => cmd_sensor_watch(config),
                SensorAction::Ambient => cmd_sensor_ambient(config),
            }
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(&settings),
            ConfigAction::Reset => cmd_config_reset(),
        },
    }
}

// =============================================================================
// Profile Commands
// =============================================================================

fn decoder(settings: &AppSettings) -> ProfileDecoder {
    ProfileDecoder::new().with_config(settings.profiles.clone())
}

fn load_profile(settings: &AppSettings, path: &Path) -> Result<Profile> {
    decoder(settings)
        .parse_from_path(path)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

fn cmd_profile(settings: &AppSettings, path: &Path) -> Result<()> {
    let profile = load_profile(settings, path)?;

    println!("Description:   {}", profile.description());
    println!("Type:          {}", profile.profile_type());
    println!("Colorspace:    {}", profile.colorspace());
    println!("Size:          {} bytes", profile.size());
    println!("Copyright:     {}", profile.copyright().unwrap_or("-"));
    println!("Manufacturer:  {}", profile.manufacturer().unwrap_or("-"));
    println!("Model:         {}", profile.model().unwrap_or("-"));
    println!("Created:       {}", profile.datetime().unwrap_or("-"));
    println!("White point:   {}", profile.white_point());
    println!("Black point:   {}", profile.black_point());
    println!("Red (xyY):     {}", profile.luminance_red());
    println!("Green (xyY):   {}", profile.luminance_green());
    println!("Blue (xyY):    {}", profile.luminance_blue());
    println!(
        "VCGT:          {}",
        if profile.generate_vcgt(2).is_some() { "yes" } else { "no" }
    );

    Ok(())
}

fn print_clut(clut: &Clut) {
    for (i, entry) in clut.entries().iter().enumerate() {
        println!("{:5} {:5} {:5} {:5}", i, entry.red, entry.green, entry.blue);
    }
}

fn cmd_vcgt(settings: &AppSettings, path: &Path, size: usize) -> Result<()> {
    let profile = load_profile(settings, path)?;
    let clut = profile
        .generate_vcgt(size)
        .with_context(|| format!("{} has no usable vcgt tag", path.display()))?;
    print_clut(&clut);
    Ok(())
}

fn cmd_curve(settings: &AppSettings, path: &Path, size: usize) -> Result<()> {
    let profile = load_profile(settings, path)?;
    let clut = profile
        .generate_curve(size)
        .with_context(|| format!("{} has no usable tone curves", path.display()))?;
    print_clut(&clut);
    Ok(())
}

fn cmd_scan(settings: &AppSettings, dirs: Vec<PathBuf>) -> Result<()> {
    let dirs = if dirs.is_empty() {
        settings.profiles.search_dirs.clone()
    } else {
        dirs
    };

    let report = scan_profiles(&decoder(settings), &dirs);
    for profile in &report.profiles {
        let name = profile
            .filename()
            .and_then(Path::file_name)
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        println!(
            "{:<40} {:<16} {:<6} {}",
            name,
            profile.profile_type(),
            profile.colorspace(),
            profile.description()
        );
    }
    for (path, err) in &report.failures {
        eprintln!("⚠️  {}: {}", path.display(), err);
    }
    println!(
        "\n{} profiles, {} failures",
        report.profiles.len(),
        report.failures.len()
    );

    Ok(())
}

// =============================================================================
// Sensor Commands
// =============================================================================

fn start_sensor(config: DriverConfig) -> Result<ColorMunki<colorcal::device::NusbTransport>> {
    let mut munki = ColorMunki::open(config).context("Failed to open ColorMunki")?;
    munki.startup().context("Failed to start ColorMunki")?;
    Ok(munki)
}

fn cmd_sensor_dump(config: DriverConfig) -> Result<()> {
    let munki = start_sensor(config)?;
    print!("{}", munki.dump().context("Failed to dump sensor state")?);
    Ok(())
}

fn cmd_sensor_watch(config: DriverConfig) -> Result<()> {
    let (tx, rx) = mpsc::channel::<ButtonPress>();
    let mut munki = ColorMunki::open(config).context("Failed to open ColorMunki")?;
    munki.set_event_sink(tx);
    munki.startup().context("Failed to start ColorMunki")?;

    // Setup Ctrl+C handler
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .context("Failed to set Ctrl+C handler")?;

    println!("🎛️  Watching ColorMunki (Ctrl+C to stop)...");
    let mut dial = munki.dial_position();

    while running.load(Ordering::SeqCst) {
        munki.pump(PUMP_INTERVAL).context("Failed to pump events")?;

        for press in rx.try_iter() {
            println!("Button pressed at {} ms", press.timestamp_ms);
        }
        if munki.dial_position() != dial {
            dial = munki.dial_position();
            println!("Dial: {}", dial);
        }
        if munki.state() == DriverState::Faulted {
            anyhow::bail!("Event transfer failed, sensor stopped");
        }
    }

    munki.shutdown();
    println!("\nStopped.");
    Ok(())
}

fn cmd_sensor_ambient(config: DriverConfig) -> Result<()> {
    let timeout = config.control_timeout();
    let mut munki = start_sensor(config)?;

    // the first state refresh was queued by startup
    munki.pump(timeout).context("Failed to read dial position")?;

    let value = munki
        .get_ambient()
        .context("Failed to take ambient reading")?;
    println!("Ambient: {:.1} (raw sensor counts)", value);
    Ok(())
}

// =============================================================================
// Config Commands
// =============================================================================

fn cmd_config_init() -> Result<()> {
    let path = storage::ensure_settings_exist().context("Failed to create settings")?;
    println!("✅ Settings at {}", path.display());
    Ok(())
}

fn cmd_config_show(settings: &AppSettings) -> Result<()> {
    let json = serde_json::to_string_pretty(settings).context("Failed to serialize settings")?;
    println!("{}", json);
    Ok(())
}

fn cmd_config_reset() -> Result<()> {
    storage::save_settings(&AppSettings::default()).context("Failed to reset settings")?;
    let path = storage::get_config_path().context("Failed to locate settings")?;
    println!("✅ Settings reset at {}", path.display());
    Ok(())
}
