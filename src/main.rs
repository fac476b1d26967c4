//! macals: ambient light sensor readings from the macOS IOKit registry
//!
//! With no subcommand, prints one line per sensor: `<name>: <lux> lux`.
//! `macals serve` exposes the same readings as MCP tools over stdio.

use clap::{Parser, Subcommand};
use macals::report::{collect_readings, format_reading, write_report, Reading};
use macals::LightSensor;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// === Modules ===

mod config;

#[cfg(feature = "server")]
mod server;

#[cfg(feature = "server")]
mod shared;

#[cfg(feature = "server")]
mod tools;

// === CLI ===

#[derive(Parser)]
#[command(name = "macals")]
#[command(about = "Read ambient light sensor lux values from the IOKit service registry")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print every ambient light sensor with its current reading (default)
    Report {
        /// Print the readings as a JSON array
        #[arg(long)]
        json: bool,
    },
    /// Print the first ambient light sensor found
    Find,
    /// Print the current reading of a named sensor
    Read {
        /// Registry service name (defaults to the configured sensor, then the first found)
        name: Option<String>,
    },
    /// Run the MCP server on stdio
    #[cfg(feature = "server")]
    Serve,
    /// List MCP tools and whether the config enables them
    Tools,
    /// Open the config file in your editor
    Config,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Report { json: false }) {
        Commands::Report { json } => {
            init_logging("warn");
            run_report(json)?;
        }
        Commands::Find => {
            init_logging("warn");
            let sensor = macals::find_sensor()?;
            print_reading(&sensor)?;
        }
        Commands::Read { name } => {
            init_logging("warn");
            run_read(name)?;
        }
        #[cfg(feature = "server")]
        Commands::Serve => {
            init_logging("info");
            server::run(config::Config::load())?;
        }
        Commands::Tools => {
            init_logging("warn");
            run_tools_command();
        }
        Commands::Config => {
            run_config_command()?;
        }
    }

    Ok(())
}

/// Logs go to stderr so stdout carries only readings
fn init_logging(default_filter: &str) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run_report(json: bool) -> anyhow::Result<()> {
    let readings = collect_readings(macals::list_sensors()?);

    if json {
        println!("{}", serde_json::to_string_pretty(&readings)?);
    } else {
        let mut stdout = std::io::stdout().lock();
        let count = write_report(&readings, &mut stdout)?;
        tracing::debug!("Reported {} sensors", count);
    }
    Ok(())
}

fn run_read(name: Option<String>) -> anyhow::Result<()> {
    let name = name.or_else(|| config::Config::load().sensor);

    let sensor = match name {
        Some(name) => LightSensor::open(&name)?,
        None => macals::find_sensor()?,
    };
    print_reading(&sensor)
}

fn print_reading(sensor: &LightSensor) -> anyhow::Result<()> {
    let reading = Reading::from_sensor(sensor)?;
    println!("{}", format_reading(&reading));
    Ok(())
}

fn run_tools_command() {
    let config = config::Config::load();
    for tool in config::all_tool_names() {
        let state = if config.is_enabled(tool) {
            "enabled"
        } else {
            "disabled"
        };
        println!("{:<20} {}", tool, state);
    }
}

/// Open config file in user's editor
fn run_config_command() -> anyhow::Result<()> {
    let config_path = config::Config::path()
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

    // Create config dir if needed
    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Create config file from template if it doesn't exist
    if !config_path.exists() {
        let template = include_str!("../config.toml.example");
        std::fs::write(&config_path, template)?;
        println!("Created config file: {}", config_path.display());
    }

    let editor = std::env::var("EDITOR")
        .or_else(|_| std::env::var("VISUAL"))
        .unwrap_or_else(|_| "nano".to_string());

    println!("Opening {} with {}", config_path.display(), editor);

    std::process::Command::new(&editor)
        .arg(&config_path)
        .status()?;

    Ok(())
}
