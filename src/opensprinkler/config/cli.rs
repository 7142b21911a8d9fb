//! `--list` and `--reset` work on the config file alone; no hardware is opened.

use super::{result, Config};
use crate::opensprinkler::station::StationType;

pub fn list(config: &Config) {
    println!("Config: {}", config.path().display());
    println!("Controller enabled: {}", config.enable_controller);
    println!("Extension boards: {}", config.extension_board_count);
    match serde_json::to_string_pretty(&config.hardware) {
        Ok(json) => println!("Hardware: {}", json),
        Err(err) => println!("Hardware: <{}>", err),
    }

    for (i, station) in config.stations.iter().take(config.station_count()).enumerate() {
        if station.station_type == StationType::Standard {
            println!("{:>3} {:<32} Standard", i, station.name);
            continue;
        }

        match station.special() {
            Ok(special) => println!("{:>3} {:<32} {:?}", i, station.name, special),
            Err(err) => println!("{:>3} {:<32} {:?} <{}>", i, station.name, station.station_type, err),
        }
    }
}

/// Overwrite the config file with defaults, whatever it holds now
pub fn reset(config: &Config) -> result::Result<()> {
    config.write_default()?;
    println!("Reset controller to defaults");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::{env, fs, path::PathBuf};

    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        env::temp_dir().join(format!("opensprinkler-actuator-cli-{}-{}.dat", name, std::process::id()))
    }

    #[test]
    fn reset_corrupt_file() {
        let path = temp_path("reset");
        fs::write(&path, b"not bson at all").expect("Error writing file");
        let config = Config::new(path.clone());
        assert!(config.read().is_err());

        reset(&config).expect("Error resetting config");
        let read = config.read();
        let _ = fs::remove_file(&path);

        assert!(read.expect("Error reading config").enable_controller);
    }
}
