use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

/// Optional settings file read from the data directory.
pub const CONFIG_FILE_NAME: &str = "stampbook.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    /// Web address printed into the counter QR code; the cafe id is appended.
    pub stamp_base_url: String,
    /// App deep link written to NFC tags; the cafe id is appended.
    pub nfc_base_url: String,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> std::result::Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }

    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("stampbook.db")
    }

    /// Parses a TOML settings file. Missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))
    }

    /// Reads `stampbook.toml` from `data_dir` when present. The data
    /// directory itself always comes from the caller.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(CONFIG_FILE_NAME);
        let mut config = if path.exists() {
            Self::from_file(&path)?
        } else {
            Self::default()
        };
        config.data_dir = data_dir.to_path_buf();
        Ok(config)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            data_dir: PathBuf::from("./data"),
            stamp_base_url: "https://findmeacoffee.in/stamp".to_string(),
            nfc_base_url: "findmeacoffee://stamp".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_without_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = ServerConfig::load(dir.path()).unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.data_dir, dir.path());
        assert_eq!(config.db_path(), dir.path().join("stampbook.db"));
        assert_eq!(config.stamp_base_url, "https://findmeacoffee.in/stamp");
    }

    #[test]
    fn test_load_reads_partial_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "port = 9090\nstamp_base_url = \"https://stamps.example.com/s\"\n",
        )
        .unwrap();

        let config = ServerConfig::load(dir.path()).unwrap();
        assert_eq!(config.port, 9090);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.stamp_base_url, "https://stamps.example.com/s");
        assert_eq!(config.nfc_base_url, "findmeacoffee://stamp");
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "prot = 1\n").unwrap();

        assert!(matches!(
            ServerConfig::load(dir.path()),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_socket_addr() {
        let config = ServerConfig::default();
        assert_eq!(config.socket_addr().unwrap().port(), 8080);
    }
}
