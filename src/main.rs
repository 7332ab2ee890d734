use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::path::Path;
use tracing::{error, info};

use pm1_monitor::cli::{Cli, Commands, ConfigCommands};
use pm1_monitor::core::measurement::ChannelReading;
use pm1_monitor::core::view::{channel_views, render_measurements};
use pm1_monitor::core::{MeasurementSource, ProbeClient, ViewState};
use pm1_monitor::screens::run_monitor_tui;
use pm1_monitor::utils::logging::init_logging;
use pm1_monitor::utils::{format_bytes, AppConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let mut cli = Cli::parse();

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => AppConfig::config_path()?,
    };

    // Config commands never parse the file first, so a broken one can be replaced
    match cli.command.take() {
        Some(Commands::Config { command }) => handle_config(command, &cli, &config_path),
        command => run_command(command, &cli, &config_path).await,
    }
}

async fn run_command(command: Option<Commands>, cli: &Cli, config_path: &Path) -> Result<()> {
    let mut config = AppConfig::load_from(config_path)?;
    cli.apply_overrides(&mut config);

    let _log_guard = init_logging(&config.log_dir())?;
    info!(version = env!("CARGO_PKG_VERSION"), base_url = %config.base_url, "Starting pm1-monitor");

    let result = match command {
        Some(Commands::List { json }) => handle_list(&config, json).await,
        Some(Commands::Status) => handle_status(&config).await,
        _ => handle_monitor(&config).await,
    };

    if let Err(ref e) = result {
        error!("{:#}", e);
    }
    result
}

fn check_config(config: &AppConfig) -> Result<()> {
    let errors = config.validate();
    if !errors.is_empty() {
        anyhow::bail!("Invalid configuration:\n  - {}", errors.join("\n  - "));
    }
    Ok(())
}

async fn handle_monitor(config: &AppConfig) -> Result<()> {
    check_config(config)?;
    run_monitor_tui(config).await
}

async fn handle_list(config: &AppConfig, json: bool) -> Result<()> {
    check_config(config)?;
    let client = ProbeClient::new(&config.base_url, config.request_timeout())?;

    let frame = client
        .fetch_measurements()
        .await
        .with_context(|| format!("Failed to fetch measurements from {}", client.base_url()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&frame)?);
        return Ok(());
    }

    let views = channel_views();
    let mut state = ViewState::default();
    render_measurements(&frame, &views, &mut state)?;

    let text = |element| state.text(element).unwrap_or("--");

    println!("{}\n", "Display".bold());
    for view in &views {
        println!(
            "  {:<20} {:>12}  {}",
            text(view.display.title),
            text(view.display.temp).green().bold(),
            text(view.display.probe).dimmed()
        );
    }

    println!("\n{}\n", "Measurements".bold());
    println!(
        "{:<10} {:<8} {:>10} {:>10} {:>10} {:>16}",
        "Channel", "Probe", "°C", "°F", "K", "Resistance [Ω]"
    );
    println!("{}", "-".repeat(69));
    for view in &views {
        let t = &view.table;
        println!(
            "{:<10} {:<8} {:>10} {:>10} {:>10} {:>16}",
            text(t.channel),
            text(t.probe),
            text(t.temp_c),
            text(t.temp_f),
            text(t.temp_k),
            text(t.resistance)
        );
    }

    let pending = frame
        .iter()
        .take(views.len())
        .filter(|reading| matches!(reading, ChannelReading::Pending))
        .count();
    if pending > 0 {
        println!("\n{} {} channel(s) not measured yet", "!".yellow(), pending);
    }

    Ok(())
}

async fn handle_status(config: &AppConfig) -> Result<()> {
    check_config(config)?;
    let client = ProbeClient::new(&config.base_url, config.request_timeout())?;

    let status = client
        .fetch_status()
        .await
        .with_context(|| format!("Failed to fetch state from {}", client.base_url()))?;

    let wifi = if status.data.wifi_ok {
        "connected".green()
    } else {
        "down".red()
    };

    println!("{} {}\n", status.info.name.bold(), status.info.version);
    println!("{:<14} {}", "Endpoint:", client.base_url());
    println!("{:<14} {}", "Mode:", status.data.device_mode);
    println!(
        "{:<14} {}",
        "Initialized:",
        if status.data.is_initialized { "yes" } else { "no" }
    );
    println!("{:<14} {}", "Wi-Fi:", wifi);
    if let Some(ip) = status.data.ip_address() {
        println!("{:<14} {}", "IP address:", ip);
    }
    println!(
        "{:<14} {}",
        "Free memory:",
        status
            .data
            .free_memory
            .map(format_bytes)
            .unwrap_or_else(|| "N/A".to_string())
    );

    Ok(())
}

fn handle_config(command: ConfigCommands, cli: &Cli, path: &Path) -> Result<()> {
    match command {
        ConfigCommands::View => {
            println!("Configuration ({}):\n", path.display());

            let mut config = match AppConfig::load_from(path) {
                Ok(config) => config,
                Err(e) => {
                    println!("{} {:#}", "✗".red(), e);
                    println!("\nRun `pm1-monitor config init --force` to replace it with defaults");
                    return Ok(());
                }
            };
            cli.apply_overrides(&mut config);

            print!("{}", toml::to_string_pretty(&config)?);
            println!("log_dir = {:?} (effective)", config.log_dir());

            let errors = config.validate();
            if errors.is_empty() {
                println!("\n{} Configuration is valid", "✓".green());
            } else {
                println!("\n{} Configuration errors:", "✗".red());
                for error in errors {
                    println!("  - {}", error);
                }
            }
        }
        ConfigCommands::Path => {
            println!("{}", path.display());
        }
        ConfigCommands::Init { force } => {
            AppConfig::write_default(path, force)?;
            println!("{} Wrote default configuration to {}", "✓".green(), path.display());
        }
    }

    Ok(())
}
