//! Command-line definitions

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Weathervane CLI
#[derive(Debug, Parser)]
#[command(name = "weathervane")]
#[command(author, version, about = "Weather update and alert pipeline", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file stem (`{stem}.toml`, optional)
    #[arg(short, long, default_value = "config", env = "WEATHERVANE_CONFIG")]
    pub config: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start the tiered scheduler and run until Ctrl+C or SIGTERM
    Run,

    /// Fetch, store and evaluate current weather once
    Update {
        /// Locations to update
        locations: Vec<String>,

        /// Use every configured location instead
        #[arg(long, conflicts_with = "locations")]
        all_default: bool,
    },

    /// Fetch and store a forecast for one location
    Forecast {
        location: String,

        /// Forecast window in days (1-10, default from config)
        #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=10))]
        days: Option<u8>,

        /// Also write the forecast as JSON to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Set custom alert thresholds for a location
    Monitor {
        location: String,

        /// Alert when temperature rises above this value (°C)
        #[arg(long, allow_negative_numbers = true)]
        temp_high: Option<f64>,

        /// Alert when temperature falls below this value (°C)
        #[arg(long, allow_negative_numbers = true)]
        temp_low: Option<f64>,

        /// Alert when wind speed exceeds this value (km/h)
        #[arg(long)]
        wind_speed: Option<f64>,

        /// Alert when humidity exceeds this value (%)
        #[arg(long)]
        humidity: Option<f64>,
    },

    /// Summarize active alerts, with trends when a location is given
    Summary { location: Option<String> },

    /// Delete stored data older than the retention window
    Cleanup {
        /// Retention in days (default from config)
        #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
        days: Option<u32>,
    },

    /// Show database statistics and the schedule
    Status,
}

impl Commands {
    /// Custom thresholds requested by `monitor`, as (metric, min, max)
    #[must_use]
    pub fn threshold_requests(&self) -> Vec<(&'static str, Option<f64>, Option<f64>)> {
        let Self::Monitor {
            temp_high,
            temp_low,
            wind_speed,
            humidity,
            ..
        } = self
        else {
            return Vec::new();
        };

        let mut requests = Vec::new();
        if let Some(v) = temp_high {
            requests.push(("temperature_high", None, Some(*v)));
        }
        if let Some(v) = temp_low {
            requests.push(("temperature_low", Some(*v), None));
        }
        if let Some(v) = wind_speed {
            requests.push(("wind_speed", None, Some(*v)));
        }
        if let Some(v) = humidity {
            requests.push(("humidity", None, Some(*v)));
        }
        requests
    }
}

/// Log filter for a verbosity count, falling back to the configured filter
#[must_use]
pub fn log_filter_from_verbosity(verbose: u8, configured: &str) -> String {
    match verbose {
        0 => configured.to_string(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_zero_keeps_configured_filter() {
        assert_eq!(log_filter_from_verbosity(0, "info,rusqlite=warn"), "info,rusqlite=warn");
    }

    #[test]
    fn verbosity_raises_filter() {
        assert_eq!(log_filter_from_verbosity(1, "info"), "debug");
        assert_eq!(log_filter_from_verbosity(2, "info"), "trace");
        assert_eq!(log_filter_from_verbosity(9, "info"), "trace");
    }

    #[test]
    fn monitor_maps_flags_to_metrics() {
        let cmd = Commands::Monitor {
            location: "Oslo".to_string(),
            temp_high: Some(30.0),
            temp_low: Some(-5.0),
            wind_speed: None,
            humidity: Some(85.0),
        };
        assert_eq!(
            cmd.threshold_requests(),
            vec![
                ("temperature_high", None, Some(30.0)),
                ("temperature_low", Some(-5.0), None),
                ("humidity", None, Some(85.0)),
            ]
        );
    }

    #[test]
    fn other_commands_have_no_thresholds() {
        assert!(Commands::Status.threshold_requests().is_empty());
    }
}
