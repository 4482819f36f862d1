use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid {var}: {value}")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub http_addr: SocketAddr,
    pub data_dir: Option<PathBuf>,
    pub admin_ips: Vec<IpAddr>,
    pub tls: Option<TlsPaths>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            data_dir: None,
            admin_ips: Vec::new(),
            tls: None,
        }
    }
}

impl ServerConfig {
    /// Reads `CONTENT_HTTP_ADDR`, `DATA_DIR`, `ADMIN_IPS`, `TLS_CERT_PATH`
    /// and `TLS_KEY_PATH`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut cfg = Self::default();
        if let Some(addr) = get("CONTENT_HTTP_ADDR") {
            cfg.http_addr = addr.parse().map_err(|_| ConfigError::Invalid {
                var: "CONTENT_HTTP_ADDR",
                value: addr.clone(),
            })?;
        }
        cfg.data_dir = get("DATA_DIR")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);
        if let Some(ips) = get("ADMIN_IPS") {
            cfg.admin_ips = parse_ip_list(&ips)?;
        }
        if let (Some(cert), Some(key)) = (get("TLS_CERT_PATH"), get("TLS_KEY_PATH")) {
            cfg.tls = Some(TlsPaths {
                cert: cert.into(),
                key: key.into(),
            });
        }
        Ok(cfg)
    }
}

fn parse_ip_list(raw: &str) -> Result<Vec<IpAddr>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse().map_err(|_| ConfigError::Invalid {
                var: "ADMIN_IPS",
                value: s.to_string(),
            })
        })
        .collect()
}
