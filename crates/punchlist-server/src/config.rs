//! Server configuration.
//!
//! Configuration comes from an optional YAML file merged under CLI flags:
//! a flag always wins over the file, and the file over built-in defaults.
//!
//! ```yaml
//! bind: 127.0.0.1:3000
//! data_file: issues.jsonl
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Default bind address when neither flag nor file supplies one.
fn default_bind() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 3000))
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to.
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,

    /// JSONL snapshot file. When absent the store is purely in-memory.
    #[serde(default)]
    pub data_file: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            data_file: None,
        }
    }
}

impl ServerConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the file cannot be read or parsed.
    pub async fn load(path: &Path) -> Result<Self> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| Error::Config {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        serde_yaml::from_str(&contents).map_err(|e| Error::Config {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// Overlay CLI flags on top of this configuration.
    #[must_use]
    pub fn merge_flags(mut self, bind: Option<SocketAddr>, data_file: Option<PathBuf>) -> Self {
        if let Some(bind) = bind {
            self.bind = bind;
        }
        if let Some(data_file) = data_file {
            self.data_file = Some(data_file);
        }
        self
    }
}
