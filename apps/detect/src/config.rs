//! # Configuration
//!
//! Defaults for the model location, the CSV output directory and the web
//! server, plus [`ServerConfig`] assembled from the command line.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

/// Model documents, merged in this order.
pub const MODEL_FILES: [&str; 4] = [
    "detect_input.json",
    "detect_definitions.json",
    "detect_criteria_list.json",
    "detect_requirement_list.json",
];

pub const DEFAULT_MODEL_DIR: &str = "model";
pub const DEFAULT_OUTPUT_DIR: &str = "Output";
pub const DEFAULT_DOCS_FILE: &str = "README_web.md";

/// Environment variable holding the cosmetic theme color.
pub const THEME_ENV: &str = "APP_THEME_COLOR";
pub const DEFAULT_THEME: &str = "indigo";

pub const DEFAULT_HOST: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);
pub const DEFAULT_PORT: u16 = 80;

/// Page title shown in the browser tab.
pub const APP_TITLE: &str = "DETECT";

/// Everything the web mode needs to start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    pub model_dir: PathBuf,
    pub docs: PathBuf,
    pub theme: String,
}

impl ServerConfig {
    /// The socket address to bind.
    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST,
            port: DEFAULT_PORT,
            model_dir: PathBuf::from(DEFAULT_MODEL_DIR),
            docs: PathBuf::from(DEFAULT_DOCS_FILE),
            theme: DEFAULT_THEME.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_binds_all_interfaces_on_port_80() {
        let config = ServerConfig::default();
        assert_eq!(config.addr().to_string(), "0.0.0.0:80");
        assert_eq!(config.theme, "indigo");
    }
}
