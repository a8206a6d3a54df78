// Docker CLI driver: command building, process execution, cancellation.

pub mod cli;
pub mod commands;
pub mod engine;
pub mod listing;
pub mod run;
pub mod types;

pub use cli::{DockerCli, DriverConfig};
pub use engine::ensure_available;
pub use types::{CancelToken, CommandResult, DockerCommand, OutputLine};
