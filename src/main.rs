#![allow(dead_code)]

mod opensprinkler;
mod timer;
mod utils;

use clap::Parser;
use std::{
    process,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};
use tracing_subscriber::FmtSubscriber;

use opensprinkler::{config, OpenSprinkler};

#[cfg(unix)]
const CONFIG_FILE_PATH: &'static str = "/etc/opt/config.dat";

#[cfg(not(unix))]
const CONFIG_FILE_PATH: &'static str = "./config.dat";

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Binary config file path
    #[clap(short = 'c', long = "config", default_value = CONFIG_FILE_PATH, parse(from_os_str))]
    config: std::path::PathBuf,

    /// List config values
    #[clap(long = "list", takes_value = false)]
    list: bool,

    /// Reset all config values
    #[clap(long = "reset", takes_value = false)]
    reset: bool,

    /// Switch one station on or off, then exit
    #[clap(long = "switch", takes_value = true, required = false, min_values = 2, max_values = 2, value_names = &["STATION", "on|off"])]
    switch: Option<Vec<String>>,

    /// Maximum log level (error, warn, info, debug, trace)
    #[clap(long = "log-level", default_value = "info")]
    log_level: tracing::Level,
}

fn setup_tracing(max_level: tracing::Level) {
    let subscriber = FmtSubscriber::builder().with_max_level(max_level).finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
}

/// Parse `<station> <on|off>`
fn parse_switch(args: &[String]) -> Option<(usize, bool)> {
    let station_index = args.get(0)?.parse().ok()?;
    let value = match args.get(1)?.to_ascii_lowercase().as_str() {
        "on" | "1" => true,
        "off" | "0" => false,
        _ => return None,
    };
    Some((station_index, value))
}

/// Handle `--reset` and `--list` from the config file alone
///
/// Returns [None] if neither was given. Neither command builds the controller, so outputs are left as they are and a
/// corrupt config can still be reset.
fn run_config_command(args: &Args) -> Option<config::result::Result<()>> {
    let config = config::Config::new(args.config.clone());

    if args.reset {
        return Some(config::cli::reset(&config));
    }

    if args.list {
        let config = if config.exists() { config.read() } else { Ok(config) };
        return Some(config.map(|config| config::cli::list(&config)));
    }

    None
}

fn main() {
    let args = Args::parse();

    // region: SIGNALS
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();

    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl-C handler");
    // endregion SIGNALS

    setup_tracing(args.log_level);

    tracing::info!("Using config file: {}", args.config.display());

    if let Some(result) = run_config_command(&args) {
        if let Err(ref error) = result {
            println!("Error: {}", error);
            process::exit(1);
        }
        return;
    }

    tracing::trace!("Initialize controller");
    let mut open_sprinkler = match OpenSprinkler::with_config_path(args.config) {
        Ok(open_sprinkler) => open_sprinkler,
        Err(ref error) => {
            tracing::error!("Setup failed: {}", error);
            process::exit(1);
        }
    };

    if let Some(switch) = args.switch {
        match parse_switch(&switch) {
            Some((station_index, value)) => {
                open_sprinkler.set_station_bit(station_index, value);
                open_sprinkler.apply_all_station_bits();
                println!("Station {}: {}", station_index, if open_sprinkler.state.station.is_applied(station_index) { "on" } else { "off" });
            }
            None => {
                println!("Error: expected <station> <on|off>, got {:?}", switch);
                process::exit(2);
            }
        }
        return;
    }

    let mut last_seconds = 0;

    // Main loop
    while running.load(Ordering::SeqCst) {
        let now_seconds = chrono::Utc::now().timestamp();

        // The main control loop runs once every second
        if now_seconds > last_seconds {
            last_seconds = now_seconds;

            open_sprinkler.check_rain_delay_status(now_seconds);

            // Actuate valves
            open_sprinkler.apply_all_station_bits();

            open_sprinkler.check_special_station_auto_refresh(now_seconds);
            open_sprinkler.update_realtime_flow_count(now_seconds);
        }

        // sleep 1 ms to minimize CPU usage
        timer::sleep(Duration::from_millis(1));
    }

    tracing::info!("Got Ctrl-C, exiting...");
    open_sprinkler.clear_all_station_bits();
}

#[cfg(test)]
mod tests {
    use std::{env, fs, path::PathBuf};

    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        env::temp_dir().join(format!("opensprinkler-actuator-main-{}-{}.dat", name, process::id()))
    }

    fn args(path: &PathBuf, command: &str) -> Args {
        Args::parse_from(["opensprinkler-actuator", "--config", path.to_str().unwrap(), command])
    }

    #[test]
    fn reset_without_controller() {
        let path = temp_path("reset");
        fs::write(&path, b"not bson at all").unwrap();

        assert!(OpenSprinkler::with_config_path(path.clone()).is_err(), "Testing controller refuses a corrupt config");
        assert!(matches!(run_config_command(&args(&path, "--reset")), Some(Ok(()))));

        let read = config::Config::new(path.clone()).read();
        let _ = fs::remove_file(&path);
        assert!(read.is_ok());
    }

    #[test]
    fn list_is_read_only() {
        let path = temp_path("list");

        assert!(matches!(run_config_command(&args(&path, "--list")), Some(Ok(()))));
        assert!(!path.exists(), "Testing no defaults written");

        fs::write(&path, b"not bson at all").unwrap();
        let result = run_config_command(&args(&path, "--list"));
        let contents = fs::read(&path).unwrap();
        let _ = fs::remove_file(&path);

        assert!(matches!(result, Some(Err(config::result::Error::DeserializationError(_)))));
        assert_eq!(contents, b"not bson at all");
    }

    #[test]
    fn daemon_commands_need_controller() {
        let path = temp_path("daemon");
        let args = Args::parse_from(["opensprinkler-actuator", "--config", path.to_str().unwrap(), "--switch", "3", "on"]);
        assert!(run_config_command(&args).is_none());
    }

    #[test]
    fn parse_switch() {
        let args = |a: &[&str]| a.iter().map(|s| s.to_string()).collect::<Vec<String>>();

        assert_eq!(super::parse_switch(&args(&["3", "on"])), Some((3, true)));
        assert_eq!(super::parse_switch(&args(&["12", "OFF"])), Some((12, false)));
        assert_eq!(super::parse_switch(&args(&["x", "on"])), None);
        assert_eq!(super::parse_switch(&args(&["3", "maybe"])), None);
    }
}
