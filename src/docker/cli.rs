use std::time::Duration;

use tracing::{debug, info};

use crate::container::{ContainerId, ContainerSpec};
use crate::driver::{ContainerState, RuntimeDriver};
use crate::error::{EngineError, Result, RuntimeError, Transition};

use super::commands::{
    container_list_command, create_command, image_list_command, pull_command, start_command,
    stop_command,
};
use super::listing::{image_listed, parse_containers, select_container};
use super::run;
use super::types::{CancelToken, DockerCommand};

pub const DEFAULT_PROGRAM: &str = "docker";
pub const DEFAULT_REGISTRY_NAMESPACE: &str = "docker.io/library/";

/// Settings for [`DockerCli`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverConfig {
    /// Engine CLI binary; anything accepting docker's arguments works.
    pub program: String,
    /// Prefix for single-component image names when pulling.
    pub registry_namespace: String,
    pub command_timeout: Duration,
    pub pull_timeout: Duration,
    /// Grace period passed to `docker stop --time`.
    pub stop_timeout: Duration,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            program: DEFAULT_PROGRAM.to_string(),
            registry_namespace: DEFAULT_REGISTRY_NAMESPACE.to_string(),
            command_timeout: Duration::from_secs(60),
            pull_timeout: Duration::from_secs(600),
            stop_timeout: Duration::from_secs(30),
        }
    }
}

/// [`RuntimeDriver`] that shells out to the docker CLI.
///
/// Every command observes the driver's [`CancelToken`]; cancelling it kills
/// the in-flight engine process and the call fails with
/// [`EngineError::Cancelled`].
#[derive(Debug, Clone, Default)]
pub struct DockerCli {
    config: DriverConfig,
    cancel: CancelToken,
}

impl DockerCli {
    pub fn new(config: DriverConfig) -> Self {
        Self {
            config,
            cancel: CancelToken::new(),
        }
    }

    /// Share `cancel` with the caller so it can abort engine calls.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    fn output(&self, cmd: DockerCommand) -> std::result::Result<String, EngineError> {
        self.stream(cmd, |_| {})
    }

    fn stream(
        &self,
        cmd: DockerCommand,
        on_line: impl FnMut(&str),
    ) -> std::result::Result<String, EngineError> {
        debug!(program = %self.config.program, args = ?cmd.args, "engine command");
        run::execute(&self.config.program, cmd, &self.cancel, on_line)?.into_stdout()
    }
}

impl RuntimeDriver for DockerCli {
    fn has_image(&self, spec: &ContainerSpec) -> Result<bool> {
        let stdout = self
            .output(image_list_command(&self.config))
            .map_err(|e| RuntimeError::query("images", e))?;

        let found = image_listed(&stdout, spec);
        if found {
            info!(image = %spec.image(), "found image");
        }
        Ok(found)
    }

    fn status(&self, spec: &ContainerSpec) -> Result<ContainerState> {
        let stdout = self
            .output(container_list_command(&self.config))
            .map_err(|e| RuntimeError::query("containers", e))?;
        let containers = parse_containers(&stdout).map_err(|e| RuntimeError::query("containers", e))?;
        Ok(select_container(&containers, spec))
    }

    fn pull(&self, spec: &ContainerSpec) -> Result<()> {
        let image = spec.image().qualified(&self.config.registry_namespace);
        self.stream(pull_command(&self.config, spec), |line| {
            info!(target: "fixtainer::pull", "{line}");
        })
        .map_err(|e| RuntimeError::pull(image, e))?;
        Ok(())
    }

    fn create(&self, spec: &ContainerSpec) -> Result<ContainerId> {
        let stdout = self
            .output(create_command(&self.config, spec))
            .map_err(|e| RuntimeError::provision(spec.name(), e))?;

        // The id is the last line; older engines print pull chatter first.
        match stdout.lines().map(str::trim).filter(|l| !l.is_empty()).last() {
            Some(id) => Ok(ContainerId::from(id)),
            None => Err(RuntimeError::provision(
                spec.name(),
                EngineError::Malformed("create printed no container id".into()),
            )),
        }
    }

    fn start(&self, id: &ContainerId) -> Result<()> {
        self.output(start_command(&self.config, id))
            .map_err(|e| RuntimeError::transition(Transition::Start, id, e))?;
        Ok(())
    }

    fn stop(&self, id: &ContainerId) -> Result<()> {
        self.output(stop_command(&self.config, id))
            .map_err(|e| RuntimeError::transition(Transition::Stop, id, e))?;
        Ok(())
    }
}
