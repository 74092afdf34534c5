//! Process configuration from the environment

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tumbller_shared::session;

use crate::transport::DeviceEndpoint;

pub const DEFAULT_PAYMENT_URL: &str = "http://localhost:3001/transaction";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has invalid value {value:?}")]
    Invalid { name: String, value: String },

    #[error("DEVICE_IDS lists no devices")]
    NoDevices,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_key: String,
    pub debug: bool,
    pub host: String,
    pub port: u16,
    /// Public URL used in frame buttons and callbacks
    pub base_url: String,
    pub devices: Vec<DeviceEndpoint>,
    pub session_duration: Duration,
    pub device_timeout: Duration,
    pub payment_timeout: Duration,
    pub payment_url: String,
    pub payment_amount: String,
    pub payment_token: String,
    pub payment_receiver: String,
    /// `None` keeps transactions in memory only
    pub db_path: Option<PathBuf>,
    pub static_dir: PathBuf,
    pub frame_image_url: String,
}

impl AppConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

        let api_key = lookup("API_KEY")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("API_KEY"))?;

        let debug = lookup("DEBUG")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let host = var("HOST", "0.0.0.0");
        let port: u16 = parse(&lookup, "PORT", 8000)?;
        let base_url = var("BASE_URL", &format!("http://localhost:{}", port))
            .trim_end_matches('/')
            .to_string();

        let ids: Vec<String> = var("DEVICE_IDS", "A,B")
            .split(',')
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .collect();
        if ids.is_empty() {
            return Err(ConfigError::NoDevices);
        }

        let devices = ids
            .into_iter()
            .map(|id| {
                let key = id.to_ascii_uppercase();
                let host_part = id.to_ascii_lowercase();
                DeviceEndpoint {
                    base_url: var(
                        &format!("DEVICE_{}_URL", key),
                        &format!("http://tumbller-{}.local", host_part),
                    ),
                    camera_url: var(
                        &format!("DEVICE_{}_CAMERA_URL", key),
                        &format!("http://tumbller-{}-cam.local", host_part),
                    ),
                    name: format!("Rover {}", id),
                    device_id: id,
                }
            })
            .collect();

        let session_duration = Duration::from_secs(parse(
            &lookup,
            "SESSION_DURATION_SECS",
            session::SESSION_DURATION_SECS,
        )?);
        let device_timeout = Duration::from_secs(parse(
            &lookup,
            "DEVICE_TIMEOUT_SECS",
            session::DEVICE_TIMEOUT_MS / 1000,
        )?);
        let payment_timeout = Duration::from_secs(parse(
            &lookup,
            "PAYMENT_TIMEOUT_SECS",
            session::PAYMENT_TIMEOUT_MS / 1000,
        )?);

        let db_path = match lookup("DB_PATH") {
            Some(path) if path.trim().is_empty() => None,
            Some(path) => Some(PathBuf::from(path)),
            None => Some(PathBuf::from("data/transactions")),
        };

        Ok(Self {
            api_key,
            debug,
            host,
            port,
            frame_image_url: var("FRAME_IMAGE_URL", &format!("{}/static/tumbller.png", base_url)),
            base_url,
            devices,
            session_duration,
            device_timeout,
            payment_timeout,
            payment_url: var("PAYMENT_URL", DEFAULT_PAYMENT_URL),
            payment_amount: var("PAYMENT_AMOUNT", "0.1"),
            payment_token: var("PAYMENT_TOKEN", "USDC"),
            payment_receiver: var("PAYMENT_RECEIVER", ""),
            db_path,
            static_dir: PathBuf::from(var("STATIC_DIR", "static")),
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn device_ids(&self) -> Vec<String> {
        self.devices.iter().map(|d| d.device_id.clone()).collect()
    }
}

fn parse<F, T>(lookup: &F, name: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
            name: name.to_string(),
            value,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn test_api_key_required() {
        assert_eq!(config(&[]).unwrap_err(), ConfigError::Missing("API_KEY"));
        assert_eq!(
            config(&[("API_KEY", "  ")]).unwrap_err(),
            ConfigError::Missing("API_KEY")
        );
    }

    #[test]
    fn test_defaults() {
        let cfg = config(&[("API_KEY", "k")]).unwrap();

        assert!(!cfg.debug);
        assert_eq!(cfg.bind_addr(), "0.0.0.0:8000");
        assert_eq!(cfg.base_url, "http://localhost:8000");
        assert_eq!(cfg.device_ids(), vec!["A", "B"]);
        assert_eq!(cfg.devices[0].base_url, "http://tumbller-a.local");
        assert_eq!(cfg.devices[1].camera_url, "http://tumbller-b-cam.local");
        assert_eq!(cfg.session_duration, Duration::from_secs(300));
        assert_eq!(cfg.device_timeout, Duration::from_secs(10));
        assert_eq!(cfg.payment_timeout, Duration::from_secs(20));
        assert_eq!(cfg.payment_token, "USDC");
        assert_eq!(cfg.db_path, Some(PathBuf::from("data/transactions")));
    }

    #[test]
    fn test_overrides() {
        let cfg = config(&[
            ("API_KEY", "k"),
            ("DEBUG", "true"),
            ("BASE_URL", "https://rovers.example/"),
            ("DEVICE_IDS", " A , C ,,"),
            ("DEVICE_C_URL", "http://10.0.0.7"),
            ("SESSION_DURATION_SECS", "60"),
            ("DB_PATH", ""),
        ])
        .unwrap();

        assert!(cfg.debug);
        assert_eq!(cfg.base_url, "https://rovers.example");
        assert_eq!(cfg.device_ids(), vec!["A", "C"]);
        assert_eq!(cfg.devices[1].base_url, "http://10.0.0.7");
        assert_eq!(cfg.devices[1].name, "Rover C");
        assert_eq!(cfg.session_duration, Duration::from_secs(60));
        assert_eq!(cfg.db_path, None);
        assert_eq!(cfg.frame_image_url, "https://rovers.example/static/tumbller.png");
    }

    #[test]
    fn test_invalid_values_fatal() {
        assert!(matches!(
            config(&[("API_KEY", "k"), ("PORT", "eighty")]),
            Err(ConfigError::Invalid { ref name, .. }) if name == "PORT"
        ));
        assert_eq!(
            config(&[("API_KEY", "k"), ("DEVICE_IDS", " , ")]).unwrap_err(),
            ConfigError::NoDevices
        );
    }
}
