use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::app::capture::{CaptureProvider, FileCapture, NoCamera};
use crate::app::location::{FixedLocation, LocationProvider, NoLocation};
use crate::app::models::Coordinates;

/// Todo++: tasks, your position and a photo on one screen.
#[derive(Debug, Parser)]
#[command(name = "todo_plus", version, about)]
pub struct Config {
    /// SQLite file holding the task list.
    #[arg(long, default_value = "database.db")]
    pub db: PathBuf,

    /// Directory for rotating log files.
    #[arg(long, default_value = "logs")]
    pub log_dir: PathBuf,

    /// trace|debug|info|warn|error; defaults by build mode.
    #[arg(long)]
    pub log_level: Option<String>,

    /// UI tick in milliseconds.
    #[arg(long, default_value_t = 250)]
    pub tick_rate_ms: u64,

    #[arg(long, requires = "longitude", allow_negative_numbers = true)]
    pub latitude: Option<f64>,

    #[arg(long, requires = "latitude", allow_negative_numbers = true)]
    pub longitude: Option<f64>,

    /// Image the camera "captures"; without it the camera is unavailable.
    #[arg(long)]
    pub camera_source: Option<PathBuf>,

    /// Where captured photos are written.
    #[arg(long, default_value = "photos")]
    pub photo_dir: PathBuf,
}

impl Config {
    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.tick_rate_ms)
    }

    pub fn location_provider(&self) -> Box<dyn LocationProvider> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Box::new(FixedLocation {
                coordinates: Coordinates { latitude, longitude },
            }),
            _ => Box::new(NoLocation),
        }
    }

    pub fn capture_provider(&self) -> Box<dyn CaptureProvider> {
        match &self.camera_source {
            Some(source) => Box::new(FileCapture {
                source: source.clone(),
                photo_dir: self.photo_dir.clone(),
            }),
            None => Box::new(NoCamera),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_valid() {
        Config::command().debug_assert();
    }

    #[test]
    fn defaults_apply() {
        let config = Config::try_parse_from(["todo_plus"]).unwrap();
        assert_eq!(config.db, PathBuf::from("database.db"));
        assert_eq!(config.tick_rate(), Duration::from_millis(250));
        assert!(config.latitude.is_none());
        assert!(config.camera_source.is_none());
    }

    #[test]
    fn coordinates_enable_fixed_location() {
        let config = Config::try_parse_from([
            "todo_plus",
            "--latitude",
            "-33.8688",
            "--longitude",
            "151.2093",
        ])
        .unwrap();
        let mut provider = config.location_provider();
        let coordinates = provider.current_position().unwrap();
        assert_eq!(coordinates.latitude, -33.8688);
        assert_eq!(coordinates.longitude, 151.2093);
    }

    #[test]
    fn latitude_alone_is_rejected() {
        assert!(Config::try_parse_from(["todo_plus", "--latitude", "1.0"]).is_err());
    }
}
