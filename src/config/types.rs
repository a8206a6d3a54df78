use std::time::Duration;

use anyhow::{Result, bail};
use serde::Deserialize;

use crate::container::ContainerSpec;
use crate::docker::DriverConfig;
use crate::docker::cli::{DEFAULT_PROGRAM, DEFAULT_REGISTRY_NAMESPACE};

/// Fixture description as read from `.fixtainer.yml`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub image: String,
    pub name: String,
    pub host: String,
    pub container_port: Option<u16>,
    /// Host port; defaults to `container_port`.
    pub exposed_port: Option<u16>,
    pub env: Vec<String>,
    pub program: String,
    pub registry_namespace: String,
    /// Seconds.
    pub command_timeout: u64,
    pub pull_timeout: u64,
    pub stop_timeout: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            image: String::new(),
            name: String::new(),
            host: "127.0.0.1".to_string(),
            container_port: None,
            exposed_port: None,
            env: Vec::new(),
            program: DEFAULT_PROGRAM.to_string(),
            registry_namespace: DEFAULT_REGISTRY_NAMESPACE.to_string(),
            command_timeout: 60,
            pull_timeout: 600,
            stop_timeout: 30,
        }
    }
}

impl Config {
    pub fn container_spec(&self) -> Result<ContainerSpec> {
        if self.image.trim().is_empty() {
            bail!("config: `image` is required");
        }
        if self.name.trim().is_empty() {
            bail!("config: `name` is required");
        }
        if let Some(bad) = self.env.iter().find(|e| !e.contains('=')) {
            bail!("config: env entry `{bad}` is not KEY=VALUE");
        }

        let mut spec = ContainerSpec::new(&self.image, self.name.trim()).envs(self.env.clone());
        match (self.container_port, self.exposed_port) {
            (Some(port), exposed) => {
                spec = spec.publish(self.host.clone(), exposed.unwrap_or(port), port);
            }
            (None, Some(_)) => bail!("config: `exposed_port` needs `container_port`"),
            (None, None) => {}
        }
        Ok(spec)
    }

    pub fn driver_config(&self) -> DriverConfig {
        DriverConfig {
            program: self.program.clone(),
            registry_namespace: self.registry_namespace.clone(),
            command_timeout: Duration::from_secs(self.command_timeout),
            pull_timeout: Duration::from_secs(self.pull_timeout),
            stop_timeout: Duration::from_secs(self.stop_timeout),
        }
    }
}
