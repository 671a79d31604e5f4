//! hidswitch - Follow a USB keyboard with your monitors
//!
//! Watches for one HID device by product name and switches every DDC/CI
//! capable monitor to one input while it is attached and to another once it
//! is gone. A tray icon (or the console) pauses detection or exits.

mod config;
mod control;
mod monitor;
mod presence;
mod switcher;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use config::Config;
use control::ControlSurface;
use monitor::{InputSelector, MonitorController, PlatformDisplayBackend, SwitchOutcome};
use presence::{PlatformHidEnumerator, PresenceDetector};
use switcher::{RuntimeFlags, SwitchController, SwitchPlan};

/// hidswitch - Switch monitor inputs when a USB device comes and goes
#[derive(Parser)]
#[command(name = "hidswitch")]
#[command(version = "0.1.0")]
#[command(about = "Switch monitor inputs when a USB device is plugged in or removed", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch the device and switch inputs (default)
    Run,

    /// List attached HID devices
    Devices,

    /// Count the monitors that accept DDC/CI commands
    Monitors,

    /// Switch all monitors to an input once and exit
    Switch {
        /// Input name from the input table, e.g. DP1
        input: String,
    },

    /// Show current configuration
    Config {
        /// Generate sample configuration
        #[arg(long)]
        generate: bool,
    },

    /// Show system information
    Info,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config_path = Config::locate(cli.config.as_deref());
    let config = match &config_path {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    // Initialize logging
    let level = if cli.verbose || config.general.verbose {
        "debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match &config_path {
        Some(path) => tracing::debug!("Loaded configuration from {}", path.display()),
        None => tracing::debug!("No configuration file found, using defaults"),
    }

    config.validate()?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_agent(config)?,
        Commands::Devices => list_devices(&config)?,
        Commands::Monitors => count_monitors(&config)?,
        Commands::Switch { input } => switch_once(&config, &input)?,
        Commands::Config { generate } => {
            if generate {
                println!("{}", config::generate_sample_config()?);
            } else {
                println!("{}", toml::to_string_pretty(&config)?);
            }
        }
        Commands::Info => print_system_info(&config),
    }

    Ok(())
}

/// Start the switch loop and hand the main thread to the control surface
fn run_agent(config: Config) -> anyhow::Result<()> {
    let image = control::load_tray_image(config.general.icon.as_deref())?;
    let flags = RuntimeFlags::shared();

    let controller = SwitchController::new(
        PresenceDetector::new(PlatformHidEnumerator::new()),
        MonitorController::new(PlatformDisplayBackend::new(), config.inputs.clone()),
        SwitchPlan::from_config(&config),
        flags.clone(),
    );

    tracing::info!(
        "Watching for '{}': attached -> {}, removed -> {}",
        config.device.name,
        config.switching.plugged_in,
        config.switching.unplugged
    );

    // The loop thread is not joined; it stops at its next wake-up after exit.
    switcher::spawn(controller, config.switching.poll_interval())?;

    let surface = ControlSurface::new(flags);
    control::run(&surface, image)?;

    tracing::info!("Exiting");
    Ok(())
}

fn list_devices(config: &Config) -> anyhow::Result<()> {
    let detector = PresenceDetector::new(PlatformHidEnumerator::new());

    let mut names: Vec<String> = detector
        .devices()?
        .into_iter()
        .filter_map(|d| d.product_name)
        .collect();
    names.sort();
    names.dedup();

    if names.is_empty() {
        println!("No named HID devices found.");
        return Ok(());
    }

    for name in &names {
        let marker = if *name == config.device.name { "*" } else { " " };
        println!("{} {}", marker, name);
    }

    if !detector.is_target_present(&config.device.name) {
        println!("\nTarget '{}' is not attached.", config.device.name);
    }

    Ok(())
}

fn count_monitors(config: &Config) -> anyhow::Result<()> {
    let controller = MonitorController::new(PlatformDisplayBackend::new(), config.inputs.clone());
    let count = controller.monitor_count()?;
    println!("{} controllable monitor(s)", count);
    Ok(())
}

fn switch_once(config: &Config, input: &str) -> anyhow::Result<()> {
    let controller = MonitorController::new(PlatformDisplayBackend::new(), config.inputs.clone());

    match controller.set_input(input)? {
        SwitchOutcome::UnknownInput => {
            let known: Vec<&str> = config.inputs.iter().map(|(name, _)| name).collect();
            println!("Unknown input '{}'. Known inputs: {}", input, known.join(", "));
        }
        SwitchOutcome::Applied { code, monitors } => {
            println!("Switched {} monitor(s) to {} ({:#04x})", monitors, input, code);
        }
    }

    Ok(())
}

fn platform_name() -> &'static str {
    if cfg!(target_os = "windows") {
        "Windows"
    } else if cfg!(target_os = "linux") {
        "Linux"
    } else if cfg!(target_os = "macos") {
        "macOS"
    } else {
        "Unknown"
    }
}

/// Print system information
fn print_system_info(config: &Config) {
    println!("hidswitch System Information");
    println!("============================\n");

    println!("Platform: {}", platform_name());

    #[cfg(target_os = "windows")]
    {
        println!("HID backend: hidapi");
        println!("Monitor backend: Monitor Configuration API (dxva2)");
        println!("Controls: tray icon");
    }

    #[cfg(target_os = "linux")]
    {
        println!("HID backend: sysfs (/sys/class/hidraw)");
        println!("Monitor backend: ddcutil");
        println!("Controls: console (Ctrl+C exits, SIGUSR1 toggles pause)");
        println!("\nLinux Requirements:");
        println!("  - ddcutil installed and on PATH");
        println!("  - i2c-dev module loaded: sudo modprobe i2c-dev");
        println!("  - User in the 'i2c' group: sudo usermod -aG i2c $USER");
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux")))]
    {
        println!("HID backend: hidapi");
        println!("Monitor backend: none (switching is not supported)");
        println!("Controls: console (Ctrl+C exits, SIGUSR1 toggles pause)");
    }

    println!("\nTarget device: {}", config.device.name);
    println!("Attached -> {}", config.switching.plugged_in);
    println!("Removed  -> {}", config.switching.unplugged);
    println!("Poll interval: {} ms", config.switching.poll_interval_ms);

    println!("\nInputs (VCP {:#04x}):", monitor::INPUT_SELECT_VCP);
    for (name, code) in config.inputs.iter() {
        println!("  {:<8} {:#04x}", name, code);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from(["hidswitch"]).unwrap();
        assert!(cli.command.is_none());

        let cli = Cli::try_parse_from(["hidswitch", "switch", "HDMI1", "-v"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Some(Commands::Switch { input }) if input == "HDMI1"));

        assert!(Cli::try_parse_from(["hidswitch", "switch"]).is_err());
    }
}
