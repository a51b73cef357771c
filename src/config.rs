use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

pub const BIND_ENV: &str = "ARCADE_DRIVE_BIND";
pub const VISUAL_HZ_ENV: &str = "ARCADE_DRIVE_VISUAL_HZ";
pub const FIXED_HZ_ENV: &str = "ARCADE_DRIVE_FIXED_HZ";
pub const SETTINGS_ENV: &str = "ARCADE_DRIVE_SETTINGS";

const DEFAULT_BIND: &str = "0.0.0.0:9001";
const DEFAULT_VISUAL_HZ: u32 = 60;
const DEFAULT_FIXED_HZ: u32 = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub visual_hz: u32,
    pub fixed_hz: u32,
    /// Optional vehicle tuning override (JSON).
    pub settings_path: Option<PathBuf>,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind = match lookup(BIND_ENV) {
            Some(raw) => parse(BIND_ENV, &raw)?,
            None => parse(BIND_ENV, DEFAULT_BIND)?,
        };
        let visual_hz = parse_rate(VISUAL_HZ_ENV, lookup(VISUAL_HZ_ENV), DEFAULT_VISUAL_HZ)?;
        let fixed_hz = parse_rate(FIXED_HZ_ENV, lookup(FIXED_HZ_ENV), DEFAULT_FIXED_HZ)?;
        let settings_path = lookup(SETTINGS_ENV)
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self { bind, visual_hz, fixed_hz, settings_path })
    }

    pub fn visual_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.visual_hz))
    }

    pub fn fixed_dt(&self) -> f32 {
        1.0 / self.fixed_hz as f32
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 9001)),
            visual_hz: DEFAULT_VISUAL_HZ,
            fixed_hz: DEFAULT_FIXED_HZ,
            settings_path: None,
        }
    }
}

fn parse<T: FromStr>(name: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    raw.trim().parse::<T>().map_err(|e| ConfigError::Malformed {
        name,
        reason: format!("{raw:?}: {e}"),
    })
}

fn parse_rate(name: &'static str, raw: Option<String>, default_value: u32) -> Result<u32, ConfigError> {
    let Some(raw) = raw else {
        return Ok(default_value);
    };
    match parse::<u32>(name, &raw)? {
        0 => Err(ConfigError::Malformed { name, reason: "rate must be at least 1 Hz".to_string() }),
        hz => Ok(hz),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let cfg = ServerConfig::from_lookup(lookup(&[]));
        assert_eq!(cfg, Ok(ServerConfig::default()));
    }

    #[test]
    fn reads_overrides() {
        let cfg = ServerConfig::from_lookup(lookup(&[
            (BIND_ENV, "127.0.0.1:7000"),
            (VISUAL_HZ_ENV, " 144 "),
            (FIXED_HZ_ENV, "100"),
            (SETTINGS_ENV, "car.json"),
        ]));
        let cfg = match cfg {
            Ok(c) => c,
            Err(e) => panic!("{e}"),
        };
        assert_eq!(cfg.bind.port(), 7000);
        assert_eq!(cfg.visual_hz, 144);
        assert_eq!(cfg.fixed_dt(), 0.01);
        assert_eq!(cfg.settings_path, Some(PathBuf::from("car.json")));
    }

    #[test]
    fn rejects_malformed_values() {
        let err = ServerConfig::from_lookup(lookup(&[(FIXED_HZ_ENV, "fast")]));
        assert!(matches!(err, Err(ConfigError::Malformed { name: FIXED_HZ_ENV, .. })));

        let err = ServerConfig::from_lookup(lookup(&[(VISUAL_HZ_ENV, "0")]));
        assert!(matches!(err, Err(ConfigError::Malformed { name: VISUAL_HZ_ENV, .. })));

        let err = ServerConfig::from_lookup(lookup(&[(BIND_ENV, "nowhere")]));
        assert!(matches!(err, Err(ConfigError::Malformed { name: BIND_ENV, .. })));
    }
}
