//! Client configuration loading

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;
use log::info;
use serde::{Deserialize, Serialize};
use toopproto::{SessionData, ToopError, ToopResult};
use crate::connection::ConnectionConfig;

/// Optional client settings, read from a JSON file
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    #[serde(default)]
    pub tocs_host: Option<String>,
    #[serde(default)]
    pub tocs_port: Option<u16>,
    #[serde(default)]
    pub service_id: Option<String>,
    #[serde(default)]
    pub connect_timeout_ms: Option<u64>,
    #[serde(default)]
    pub read_timeout_ms: Option<u64>,
    #[serde(default)]
    pub write_timeout_ms: Option<u64>,
}

impl ClientConfig {
    /// Copy the configured TOCS address and service id into the session data
    pub fn apply_to(&self, data: &mut SessionData) {
        if let Some(host) = &self.tocs_host {
            data.set_tocs_host(host.clone());
        }
        if let Some(port) = self.tocs_port {
            data.set_tocs_port(port);
        }
        if let Some(service_id) = &self.service_id {
            data.set_service_id(service_id.clone());
        }
    }

    pub fn connection_config(&self) -> ConnectionConfig {
        ConnectionConfig {
            connect_timeout: self.connect_timeout_ms.map(Duration::from_millis),
            read_timeout: self.read_timeout_ms.map(Duration::from_millis),
            write_timeout: self.write_timeout_ms.map(Duration::from_millis),
        }
    }

    fn validate(&self) -> ToopResult<()> {
        if self.tocs_host.as_deref().is_some_and(str::is_empty) {
            return Err(ToopError::Config("tocs_host must not be empty".to_string()));
        }
        if self.tocs_port == Some(0) {
            return Err(ToopError::Config("tocs_port must not be 0".to_string()));
        }
        let zero_timeout = [self.connect_timeout_ms, self.read_timeout_ms, self.write_timeout_ms]
            .contains(&Some(0));
        if zero_timeout {
            return Err(ToopError::Config("timeouts must be greater than 0 ms".to_string()));
        }
        Ok(())
    }
}

/// Load client configuration from a JSON file
pub fn load_config<P: AsRef<Path>>(path: P) -> ToopResult<ClientConfig> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let config: ClientConfig = serde_json::from_reader(reader)?;
    config.validate()?;
    info!("Loaded client configuration from {}", path.display());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config() {
        let config_json = r#"{
            "tocs_host": "ltproxy",
            "tocs_port": 8610,
            "service_id": "GRBService",
            "read_timeout_ms": 60000
        }"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(config_json.as_bytes()).unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.tocs_host.as_deref(), Some("ltproxy"));
        assert_eq!(config.tocs_port, Some(8610));

        let connection = config.connection_config();
        assert_eq!(connection.read_timeout, Some(Duration::from_secs(60)));
        assert_eq!(connection.connect_timeout, None);

        let mut data = SessionData::new();
        data.set_tocs_host("old-host");
        config.apply_to(&mut data);
        assert_eq!(data.tocs_host().unwrap(), "ltproxy");
        assert_eq!(data.tocs_port().unwrap(), 8610);
        assert_eq!(data.service_id().unwrap(), "GRBService");
    }

    #[test]
    fn test_empty_config_changes_nothing() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"{}").unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config, ClientConfig::default());

        let mut data = SessionData::new();
        config.apply_to(&mut data);
        assert!(data.is_empty());
    }

    #[test]
    fn test_invalid_config() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(br#"{"tocs_port": 0}"#).unwrap();
        assert!(matches!(load_config(temp_file.path()), Err(ToopError::Config(_))));

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(br#"{"tocs_hots": "typo"}"#).unwrap();
        assert!(matches!(load_config(temp_file.path()), Err(ToopError::Json(_))));
    }
}
