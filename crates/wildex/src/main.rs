//! `wildex` - CLI for the wildex library
//!
//! This binary reports connectivity state and works with encoded locations.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::sync::Arc;

use clap::Parser;
use tracing::{debug, info};

use wildex::cli::{
    Cli, Command, ConfigCommand, LocationArgs, LocationCommand, SimulateArg, StatusCommand,
    WatchCommand,
};
use wildex::connectivity::{self, Capabilities};
use wildex::{
    init_logging, Config, ConnectivityObserver, Location, LocationCodec, LocationStore,
    MemoryNetwork, NetworkHandle, NetworkPlatform, SystemNetwork,
};

type CliResult = Result<(), Box<dyn std::error::Error>>;

#[tokio::main]
async fn main() -> CliResult {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = Config::load_from(cli.config.clone())?;

    // Execute the command
    match cli.command {
        Command::Status(status_cmd) => handle_status(&config, &status_cmd),
        Command::Watch(watch_cmd) => handle_watch(&config, &watch_cmd).await,
        Command::Location(location_cmd) => handle_location(&config, location_cmd),
        Command::Config(config_cmd) => handle_config(&config, config_cmd),
    }
}

/// Snapshot of what an observer saw at construction.
struct StatusReport {
    platform: &'static str,
    online: bool,
    active: Option<NetworkHandle>,
    capabilities: Option<Capabilities>,
}

fn observe<P: NetworkPlatform + 'static>(
    platform: Arc<P>,
    name: &'static str,
) -> wildex::Result<StatusReport> {
    let active = platform.active_network();
    let capabilities = active.as_ref().and_then(|h| platform.capabilities(h));
    let observer = ConnectivityObserver::new(platform)?;
    let online = observer.is_online();
    observer.close()?;

    Ok(StatusReport {
        platform: name,
        online,
        active,
        capabilities,
    })
}

fn simulated_network(simulate: SimulateArg) -> MemoryNetwork {
    match simulate {
        SimulateArg::Offline => MemoryNetwork::new(),
        SimulateArg::Online => MemoryNetwork::connected("sim0"),
    }
}

fn handle_status(config: &Config, cmd: &StatusCommand) -> CliResult {
    let report = match cmd.simulate {
        Some(simulate) => observe(Arc::new(simulated_network(simulate)), "simulated")?,
        None => observe(
            Arc::new(SystemNetwork::new(config.poll_interval())),
            connectivity::platform_name(),
        )?,
    };

    if cmd.json {
        let status = serde_json::json!({
            "online": report.online,
            "platform": report.platform,
            "active_network": report.active.as_ref().map(NetworkHandle::as_str),
            "capabilities": report
                .capabilities
                .map(|caps| caps.iter().map(|c| c.to_string()).collect::<Vec<_>>()),
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("wildex status");
        println!("-------------");
        println!("Platform:      {}", report.platform);
        println!(
            "Online:        {}",
            if report.online { "yes" } else { "no" }
        );
        match &report.active {
            Some(handle) => println!("Active:        {handle}"),
            None => println!("Active:        none"),
        }
        if let Some(caps) = report.capabilities {
            println!("Capabilities:  {caps}");
        }
    }
    Ok(())
}

async fn handle_watch(config: &Config, cmd: &WatchCommand) -> CliResult {
    let platform = SystemNetwork::spawn(config.poll_interval())?;
    let observer = ConnectivityObserver::new(Arc::clone(&platform))?;
    let mut rx = observer.subscribe();

    println!("{}", online_label(*rx.borrow_and_update()));
    info!(platform = connectivity::platform_name(), "Watching connectivity");

    let mut seen = 0usize;
    loop {
        if cmd.count.is_some_and(|limit| seen >= limit) {
            break;
        }
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                println!("{}", online_label(*rx.borrow_and_update()));
                seen += 1;
            }
            _ = tokio::signal::ctrl_c() => {
                debug!("Interrupted");
                break;
            }
        }
    }

    observer.close()?;
    platform.stop();
    Ok(())
}

fn online_label(online: bool) -> &'static str {
    if online {
        "online"
    } else {
        "offline"
    }
}

fn checked_location(config: &Config, args: &LocationArgs) -> wildex::Result<Location> {
    let location = args.to_location();
    if args.strict || config.location.strict_coordinates {
        location.check_bounds()?;
    }
    Ok(location)
}

fn print_location(location: &Location, json: bool) -> CliResult {
    if json {
        println!("{}", serde_json::to_string_pretty(location)?);
    } else {
        println!("{location}");
    }
    Ok(())
}

fn handle_location(config: &Config, cmd: LocationCommand) -> CliResult {
    let codec = LocationCodec::new();
    match cmd {
        LocationCommand::Encode(args) => {
            let location = checked_location(config, &args)?;
            println!("{}", hex::encode(codec.to_bytes(&location)));
        }
        LocationCommand::Decode { hex: input, json } => {
            let bytes = hex::decode(input.trim())?;
            print_location(&codec.from_bytes(&bytes)?, json)?;
        }
        LocationCommand::Save { key, location } => {
            let location = checked_location(config, &location)?;
            let store = LocationStore::open(config.database_path(), codec)?;
            store.put(&key, &location)?;
            println!("Saved {key}: {location}");
        }
        LocationCommand::Load { key, json } => {
            let store = LocationStore::open(config.database_path(), codec)?;
            match store.get(&key)? {
                Some(location) => print_location(&location, json)?,
                None => println!("No location stored under {key}"),
            }
        }
        LocationCommand::List { json } => {
            let store = LocationStore::open(config.database_path(), codec)?;
            let entries = store.list()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else if entries.is_empty() {
                println!("No stored locations.");
            } else {
                for entry in &entries {
                    println!(
                        "{:<20} {}  {}",
                        entry.key,
                        entry.updated_at.format("%Y-%m-%d %H:%M:%S"),
                        entry.location
                    );
                }
            }
        }
        LocationCommand::Remove { key } => {
            let store = LocationStore::open(config.database_path(), codec)?;
            if store.remove(&key)? {
                println!("Removed {key}");
            } else {
                println!("No location stored under {key}");
            }
        }
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> CliResult {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Connectivity]");
                println!(
                    "  Poll interval (ms): {}",
                    config.connectivity.poll_interval_ms
                );
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
                println!();
                println!("[Location]");
                println!(
                    "  Strict coordinates: {}",
                    config.location.strict_coordinates
                );
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
