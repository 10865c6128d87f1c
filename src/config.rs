// config.rs

use anyhow::{Context, Result, anyhow, bail};
use std::path::PathBuf;
use std::time::Duration;

use crate::feeds::{FeedSource, PB2002_BOUNDARIES_URL, USGS_ALL_WEEK_URL};
use crate::viewport::{MAX_ZOOM, Viewport};

pub const DEFAULT_CENTER: (f64, f64) = (44.98517, -93.30474);
pub const DEFAULT_ZOOM: u8 = 5;

pub const USAGE: &str = "Usage: quakemap [--quakes <url|path>] [--plates <url|path>] \
[--center <lat,lon>] [--zoom <0-18>] [--export <file.png>] [--log-file <path>] \
[--tick-ms <ms>] [--timeout-secs <s>]\n\nEnvironment: QUAKEMAP_QUAKES, QUAKEMAP_PLATES, \
QUAKEMAP_CENTER, QUAKEMAP_ZOOM, QUAKEMAP_LOG, RUST_LOG";

#[derive(Debug, Clone)]
pub struct Config {
    pub quakes: FeedSource,
    pub plates: FeedSource,
    pub center: (f64, f64), // (lat, lon)
    pub zoom: u8,
    pub export: Option<PathBuf>,
    pub log_file: PathBuf,
    pub tick_rate: Duration,
    pub timeout: Duration,
}

/// Outcome of parsing the command line.
#[derive(Debug)]
pub enum Command {
    Run(Config),
    Help,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            quakes: FeedSource::Url(USGS_ALL_WEEK_URL.to_string()),
            plates: FeedSource::Url(PB2002_BOUNDARIES_URL.to_string()),
            center: DEFAULT_CENTER,
            zoom: DEFAULT_ZOOM,
            export: None,
            log_file: PathBuf::from("quakemap.log"),
            tick_rate: Duration::from_millis(250),
            timeout: Duration::from_secs(30),
        }
    }
}

impl Config {
    /// Parses `args` (including the program name) on top of the values
    /// found through `env`.
    pub fn from_args<F>(args: &[String], env: F) -> Result<Command>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();
        let has_flag = |name: &str| args.iter().skip(1).any(|a| a == name);

        if let Some(value) = env("QUAKEMAP_QUAKES") {
            config.quakes = FeedSource::parse(&value);
        }
        if let Some(value) = env("QUAKEMAP_PLATES") {
            config.plates = FeedSource::parse(&value);
        }
        if let Some(value) = env("QUAKEMAP_CENTER").filter(|_| !has_flag("--center")) {
            config.center = parse_center(&value).context("invalid QUAKEMAP_CENTER")?;
        }
        if let Some(value) = env("QUAKEMAP_ZOOM").filter(|_| !has_flag("--zoom")) {
            config.zoom = parse_zoom(&value).context("invalid QUAKEMAP_ZOOM")?;
        }
        if let Some(value) = env("QUAKEMAP_LOG") {
            config.log_file = PathBuf::from(value);
        }

        let mut idx = 1;
        while idx < args.len() {
            let flag = args[idx].as_str();
            if flag == "--help" || flag == "-h" {
                return Ok(Command::Help);
            }
            let value = || {
                args.get(idx + 1)
                    .ok_or_else(|| anyhow!("{} requires a value", flag))
            };
            match flag {
                "--quakes" => config.quakes = FeedSource::parse(value()?),
                "--plates" => config.plates = FeedSource::parse(value()?),
                "--center" => config.center = parse_center(value()?)?,
                "--zoom" => config.zoom = parse_zoom(value()?)?,
                "--export" => config.export = Some(PathBuf::from(value()?)),
                "--log-file" => config.log_file = PathBuf::from(value()?),
                "--tick-ms" => {
                    let ms = value()?
                        .parse::<u64>()
                        .with_context(|| "--tick-ms must be an integer".to_string())?;
                    config.tick_rate = Duration::from_millis(ms.max(1));
                }
                "--timeout-secs" => {
                    let secs = value()?
                        .parse::<u64>()
                        .with_context(|| "--timeout-secs must be an integer".to_string())?;
                    if secs == 0 {
                        bail!("--timeout-secs must be at least 1");
                    }
                    config.timeout = Duration::from_secs(secs);
                }
                other => bail!("unknown argument '{}'\n\n{}", other, USAGE),
            }
            idx += 2;
        }

        Ok(Command::Run(config))
    }

    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.center.0, self.center.1, self.zoom)
    }
}

fn parse_center(raw: &str) -> Result<(f64, f64)> {
    let (lat, lon) = raw
        .split_once(',')
        .ok_or_else(|| anyhow!("expected <lat,lon>, got '{}'", raw))?;
    let lat = lat
        .trim()
        .parse::<f64>()
        .with_context(|| format!("invalid latitude '{}'", lat))?;
    let lon = lon
        .trim()
        .parse::<f64>()
        .with_context(|| format!("invalid longitude '{}'", lon))?;
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        bail!("centre {},{} is outside the valid range", lat, lon);
    }
    Ok((lat, lon))
}

fn parse_zoom(raw: &str) -> Result<u8> {
    let zoom = raw
        .trim()
        .parse::<u8>()
        .with_context(|| format!("invalid zoom '{}'", raw))?;
    if zoom > MAX_ZOOM {
        bail!("zoom must be between 0 and {}", MAX_ZOOM);
    }
    Ok(zoom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("quakemap")
            .chain(list.iter().copied())
            .map(String::from)
            .collect()
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn run_config(command: Command) -> Config {
        match command {
            Command::Run(config) => config,
            Command::Help => panic!("expected a run configuration"),
        }
    }

    #[test]
    fn defaults_point_at_public_feeds() {
        let config = run_config(Config::from_args(&args(&[]), no_env).unwrap());
        assert_eq!(config.quakes, FeedSource::Url(USGS_ALL_WEEK_URL.to_string()));
        assert_eq!(config.plates, FeedSource::Url(PB2002_BOUNDARIES_URL.to_string()));
        assert_relative_eq!(config.center.0, 44.98517);
        assert_eq!(config.zoom, 5);
        assert!(config.export.is_none());
    }

    #[test]
    fn flags_override_environment() {
        let env = |key: &str| match key {
            "QUAKEMAP_ZOOM" => Some("3".to_string()),
            "QUAKEMAP_QUAKES" => Some("week.geojson".to_string()),
            _ => None,
        };
        let config = run_config(
            Config::from_args(
                &args(&["--zoom", "7", "--center", "35.0, 139.5", "--export", "out.png"]),
                env,
            )
            .unwrap(),
        );
        assert_eq!(config.zoom, 7);
        assert_eq!(config.quakes, FeedSource::File(PathBuf::from("week.geojson")));
        assert_relative_eq!(config.center.1, 139.5);
        assert_eq!(config.export, Some(PathBuf::from("out.png")));
    }

    #[test]
    fn rejects_bad_values() {
        assert!(Config::from_args(&args(&["--zoom", "19"]), no_env).is_err());
        assert!(Config::from_args(&args(&["--center", "95,0"]), no_env).is_err());
        assert!(Config::from_args(&args(&["--center", "north"]), no_env).is_err());
        assert!(Config::from_args(&args(&["--zoom"]), no_env).is_err());
        assert!(Config::from_args(&args(&["--frobnicate"]), no_env).is_err());
    }

    #[test]
    fn flags_shadow_invalid_environment_values() {
        let env = |key: &str| match key {
            "QUAKEMAP_CENTER" => Some("not-a-centre".to_string()),
            "QUAKEMAP_ZOOM" => Some("99".to_string()),
            _ => None,
        };
        let config = run_config(
            Config::from_args(&args(&["--center", "10,20", "--zoom", "4"]), env).unwrap(),
        );
        assert_relative_eq!(config.center.0, 10.0);
        assert_eq!(config.zoom, 4);
        // Without the flags the bad values are still reported
        assert!(Config::from_args(&args(&["--zoom", "4"]), env).is_err());
    }

    #[test]
    fn zero_timeout_is_rejected() {
        assert!(Config::from_args(&args(&["--timeout-secs", "0"]), no_env).is_err());
        let config = run_config(Config::from_args(&args(&["--timeout-secs", "5"]), no_env).unwrap());
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn help_flag_short_circuits() {
        assert!(matches!(
            Config::from_args(&args(&["--zoom", "2", "--help"]), no_env).unwrap(),
            Command::Help
        ));
    }
}
