use config::{Config, Environment, File};
use serde::Deserialize;
use std::time::Duration;

use crate::error::{RaxFtpClientError, Result};

/// Config file looked up in the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "rax-ftp";

/// Prefix for environment overrides, e.g. `RAX_FTP__SERVER__PORT=2121`
pub const ENV_PREFIX: &str = "RAX_FTP";

/// Configuration for the RAX FTP uploader
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Server configuration
    pub server: ServerConfig,

    /// Login used after connecting; anonymous sessions leave this out
    pub credentials: Option<Credentials>,

    /// Upload tuning
    pub transfer: TransferSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// FTP server hostname or IP address (for connection)
    pub host: String,

    /// Friendly name for this server (for identification)
    pub host_name: Option<String>,

    /// FTP server port number
    pub port: u16,

    /// Send/receive timeout applied to every socket, in seconds
    pub timeout_secs: u64,
}

#[derive(Clone, Deserialize)]
pub struct Credentials {
    pub user: String,

    #[serde(default)]
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"[hidden]")
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransferSettings {
    /// Bytes per data-connection write
    pub chunk_size: usize,
}

impl ClientConfig {
    /// Load defaults, then the config file, then environment overrides.
    ///
    /// With `path == None` the default `rax-ftp.toml` is optional; an explicit
    /// path must exist.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let file = match path {
            Some(path) => File::with_name(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let settings = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 21_i64)?
            .set_default("server.timeout_secs", 30_i64)?
            .set_default("transfer.chunk_size", 4096_i64)?
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: ClientConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn host(&self) -> &str {
        &self.server.host
    }

    pub fn port(&self) -> u16 {
        self.server.port
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.server.timeout_secs)
    }

    pub fn chunk_size(&self) -> usize {
        self.transfer.chunk_size
    }

    /// Get display name for the server (friendly name or host:port)
    pub fn display_name(&self) -> String {
        match &self.server.host_name {
            Some(name) => name.clone(),
            None => format!("{}:{}", self.server.host, self.server.port),
        }
    }

    /// Validate the basic configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.host.is_empty() {
            return Err(RaxFtpClientError::InvalidConfig(
                "Host cannot be empty".to_string(),
            ));
        }

        if self.server.port == 0 {
            return Err(RaxFtpClientError::InvalidConfig(
                "Port cannot be 0".to_string(),
            ));
        }

        if self.server.timeout_secs == 0 {
            return Err(RaxFtpClientError::InvalidConfig(
                "Timeout cannot be 0".to_string(),
            ));
        }

        if self.transfer.chunk_size == 0 {
            return Err(RaxFtpClientError::InvalidConfig(
                "Chunk size cannot be 0".to_string(),
            ));
        }

        if let Some(credentials) = &self.credentials {
            if credentials.user.is_empty() {
                return Err(RaxFtpClientError::InvalidConfig(
                    "Credentials need a user name".to_string(),
                ));
            }
        }

        Ok(())
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                host_name: None,
                port: 21,
                timeout_secs: 30,
            },
            credentials: None,
            transfer: TransferSettings { chunk_size: 4096 },
        }
    }
}

impl std::fmt::Display for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "RAX FTP Config - Server: {}, Timeout: {}s, Chunk: {} bytes, User: {}",
            self.display_name(),
            self.server.timeout_secs,
            self.transfer.chunk_size,
            self.credentials
                .as_ref()
                .map_or("anonymous", |c| c.user.as_str())
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_default_is_valid() {
        let config = ClientConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.display_name(), "127.0.0.1:21");
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client.toml");
        fs::write(
            &path,
            r#"
[server]
host = "ftp.example.net"
host_name = "Build mirror"
port = 2121
timeout_secs = 5

[credentials]
user = "deploy"
password = "hunter2"

[transfer]
chunk_size = 8192
"#,
        )
        .unwrap();

        let config = ClientConfig::load(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(config.host(), "ftp.example.net");
        assert_eq!(config.port(), 2121);
        assert_eq!(config.display_name(), "Build mirror");
        assert_eq!(config.chunk_size(), 8192);
        assert_eq!(config.credentials.as_ref().unwrap().user, "deploy");
        assert!(!format!("{:?}", config).contains("hunter2"));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.toml");
        fs::write(&path, "[server]\nhost = \"10.1.1.1\"\n").unwrap();

        let config = ClientConfig::load(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(config.host(), "10.1.1.1");
        assert_eq!(config.port(), 21);
        assert_eq!(config.chunk_size(), 4096);
        assert!(config.credentials.is_none());
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let err = ClientConfig::load(Some("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, RaxFtpClientError::InvalidConfig(_)));
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        let mut config = ClientConfig::default();
        config.server.timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = ClientConfig::default();
        config.transfer.chunk_size = 0;
        assert!(config.validate().is_err());

        let mut config = ClientConfig::default();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }
}
