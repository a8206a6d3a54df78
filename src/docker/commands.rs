use std::time::Duration;

use crate::container::{ContainerId, ContainerSpec};

use super::cli::DriverConfig;
use super::types::DockerCommand;

/// `docker image ls`, one `repository:tag` per line.
pub fn image_list_command(cfg: &DriverConfig) -> DockerCommand {
    DockerCommand::new(
        ["image", "ls", "--format", "{{.Repository}}:{{.Tag}}"],
        cfg.command_timeout,
    )
}

/// `docker ps --all`, one JSON object per line.
pub fn container_list_command(cfg: &DriverConfig) -> DockerCommand {
    DockerCommand::new(
        ["ps", "--all", "--no-trunc", "--format", "{{json .}}"],
        cfg.command_timeout,
    )
}

/// `docker pull`, qualifying official images with the configured namespace.
pub fn pull_command(cfg: &DriverConfig, spec: &ContainerSpec) -> DockerCommand {
    DockerCommand::new(
        ["pull".to_string(), spec.image().qualified(&cfg.registry_namespace)],
        cfg.pull_timeout,
    )
}

/// `docker create` with `spec`'s name, port mapping and environment.
pub fn create_command(cfg: &DriverConfig, spec: &ContainerSpec) -> DockerCommand {
    let mut args: Vec<String> = vec!["create".into(), "--name".into(), spec.name().to_string()];

    if let Some(port) = spec.port() {
        args.extend(["-p".into(), port.to_string()]);
    }
    for assignment in spec.env_assignments() {
        args.extend(["-e".into(), assignment.clone()]);
    }
    args.push(spec.image().to_string());

    DockerCommand::new(args, cfg.command_timeout)
}

pub fn start_command(cfg: &DriverConfig, id: &ContainerId) -> DockerCommand {
    DockerCommand::new(["start", id.as_str()], cfg.command_timeout)
}

/// `docker stop` with the configured grace period. The command timeout is
/// extended by the grace period so the engine gets to finish.
pub fn stop_command(cfg: &DriverConfig, id: &ContainerId) -> DockerCommand {
    let grace = cfg.stop_timeout.as_secs().to_string();
    DockerCommand::new(
        ["stop", "--time", grace.as_str(), id.as_str()],
        cfg.command_timeout
            .saturating_add(cfg.stop_timeout)
            .saturating_add(Duration::from_secs(1)),
    )
}
