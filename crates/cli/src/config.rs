use std::path::Path;

use anyhow::{Context, Result};
use orchestrator::{ActivityLogConfig, ActivityLogSettings, AgentSettings};
use serde::{Deserialize, Serialize};

pub const NOTIFY_DIR: &str = ".bpa";
pub const CONFIG_FILE: &str = "config.toml";
pub const DEFAULT_DB_NAME: &str = "notify.db";
pub const DEFAULT_PORT: u16 = 3001;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NotifyConfig {
    #[serde(default)]
    pub project: ProjectConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub agent: AgentSettings,
    #[serde(default)]
    pub activity_log: ActivityLogSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectConfig {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: "business-partner-agent".to_string(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: DEFAULT_PORT }
    }
}

impl NotifyConfig {
    /// Missing file means defaults; a file that does not parse is an error.
    pub async fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub async fn write(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        tokio::fs::write(path, content)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))
    }

    pub fn activity_log_config(&self) -> ActivityLogConfig {
        ActivityLogConfig::new(&self.agent, &self.activity_log)
    }
}
