use std::{
    env::var,
    fs::read_to_string,
    net::{IpAddr, SocketAddr},
    path::{Path, PathBuf},
};

use serde::Deserialize;
use tracing::Level;

const DEFAULT_CONFIG_FILE: &str = "ridebook.toml";

/// Server settings. Read from `ridebook.toml` (or the file named by `RIDEBOOK_CONFIG`) when
/// present, then overridden by `HOST`, `PORT`, `DATA_FILE` and `LOG_LEVEL`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub data_file: PathBuf,
    pub log_level: String,
    pub tls: Option<TlsConfig>,
}

/// PEM files for serving over HTTPS
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TlsConfig {
    pub cert: PathBuf,
    pub key: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 5000,
            data_file: "students.json".into(),
            log_level: "info".into(),
            tls: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, String> {
        let mut config = match var("RIDEBOOK_CONFIG") {
            Ok(path) => Self::from_file(path)?,
            Err(_) if Path::new(DEFAULT_CONFIG_FILE).exists() => Self::from_file(DEFAULT_CONFIG_FILE)?,
            Err(_) => Self::default(),
        };

        config.apply_overrides(|key| var(key).ok())?;
        config.level()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, String> {
        let path = path.as_ref();
        let contents = read_to_string(path)
            .map_err(|e| format!("Could not read config file {}: {e}", path.display()))?;
        Self::from_toml(&contents).map_err(|e| format!("{}: {e}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self, String> {
        toml::from_str(contents).map_err(|e| format!("Invalid config: {e}"))
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), String> {
        if let Some(host) = lookup("HOST") {
            self.host = host;
        }
        if let Some(port) = lookup("PORT") {
            self.port = port
                .parse()
                .map_err(|_| format!("PORT must be a valid port number, got {port:?}"))?;
        }
        if let Some(data_file) = lookup("DATA_FILE") {
            self.data_file = data_file.into();
        }
        if let Some(log_level) = lookup("LOG_LEVEL") {
            self.log_level = log_level;
        }
        Ok(())
    }

    pub fn level(&self) -> Result<Level, String> {
        self.log_level
            .parse()
            .map_err(|_| format!("Unknown log level {:?}", self.log_level))
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, String> {
        let ip = self
            .host
            .parse::<IpAddr>()
            .map_err(|_| format!("HOST must be an IP address, got {:?}", self.host))?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_listen_everywhere() {
        let config = Config::default();
        assert_eq!(config.socket_addr().unwrap(), "0.0.0.0:5000".parse().unwrap());
        assert_eq!(config.data_file, PathBuf::from("students.json"));
        assert_eq!(config.level().unwrap(), Level::INFO);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = Config::from_toml(
            r#"
            port = 8080
            data_file = "/var/lib/ridebook/students.json"

            [tls]
            cert = "cert.pem"
            key = "key.pem"
            "#,
        )
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(
            config.tls,
            Some(TlsConfig {
                cert: "cert.pem".into(),
                key: "key.pem".into()
            })
        );
    }

    #[test]
    fn bad_toml_is_an_error() {
        assert!(Config::from_toml("port = \"eighty\"").is_err());
        assert!(Config::from_file("/definitely/not/here.toml").is_err());
    }

    #[test]
    fn environment_wins() {
        let mut config = Config::from_toml("port = 8080").unwrap();
        config
            .apply_overrides(env(&[
                ("PORT", "9000"),
                ("HOST", "127.0.0.1"),
                ("DATA_FILE", "data.json"),
                ("LOG_LEVEL", "debug"),
            ]))
            .unwrap();
        assert_eq!(config.socket_addr().unwrap(), "127.0.0.1:9000".parse().unwrap());
        assert_eq!(config.data_file, PathBuf::from("data.json"));
        assert_eq!(config.level().unwrap(), Level::DEBUG);
    }

    #[test]
    fn invalid_overrides_are_rejected() {
        let mut config = Config::default();
        assert!(config.apply_overrides(env(&[("PORT", "http")])).is_err());

        config.host = "localhost".into();
        assert!(config.socket_addr().is_err());

        config.log_level = "loud".into();
        assert!(config.level().is_err());
    }
}
