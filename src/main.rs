use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use fixtainer::config::{self, CONFIG_FILE, Config};
use fixtainer::{ContainerState, DockerCli, Reconciler, docker, telemetry};

#[derive(Parser)]
#[command(name = "fixtainer")]
#[command(version, about = "Bring a single test container up or down", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Config file (default: ./.fixtainer.yml)
    #[arg(long, short, global = true, env = "FIXTAINER_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Pull, create and start the container as needed
    Up,
    /// Stop the container if one exists
    Down,
    /// Print `absent`, `created <id>` or `running <id>`
    Status,
}

fn main() -> Result<()> {
    telemetry::init_tracing("info")?;
    let args = Args::parse();

    let cfg = load_config(args.config.as_deref())?;
    let driver = DockerCli::new(cfg.driver_config());
    docker::ensure_available(&driver.config().program)?;

    let mut fixture = Reconciler::new(cfg.container_spec()?, driver);

    match args.command {
        Command::Up => fixture.start()?,
        Command::Down => match fixture.refresh()? {
            ContainerState::Absent => info!(name = fixture.spec().name(), "no container to stop"),
            _ => fixture.stop()?,
        },
        Command::Status => match fixture.refresh()? {
            ContainerState::Absent => println!("absent"),
            ContainerState::Created(id) => println!("created {id}"),
            ContainerState::Running(id) => println!("running {id}"),
        },
    }

    Ok(())
}

fn load_config(path: Option<&std::path::Path>) -> Result<Config> {
    match path {
        Some(path) => config::load_file(path),
        None => {
            let cwd = std::env::current_dir().context("failed to read working directory")?;
            config::load(&cwd)?
                .with_context(|| format!("no {CONFIG_FILE} in {}", cwd.display()))
        }
    }
}
