//! Disposable single-container fixtures for integration tests.
//!
//! A [`Reconciler`] owns a [`ContainerSpec`] and any [`RuntimeDriver`]. Its
//! `start` pulls, creates and starts only what is missing; `stop` stops the
//! container it holds.
//!
//! ```no_run
//! use fixtainer::{ContainerSpec, DockerCli, Reconciler};
//!
//! let spec = ContainerSpec::new("mysql:5.7", "papua_test")
//!     .publish("127.0.0.1", 33060, 3306)
//!     .env("MYSQL_ROOT_PASSWORD", "pass");
//! let mut mysql = Reconciler::new(spec, DockerCli::default());
//! mysql.start()?;
//! // ... run tests against 127.0.0.1:33060 ...
//! mysql.stop()?;
//! # Ok::<(), fixtainer::RuntimeError>(())
//! ```

pub mod config;
pub mod container;
pub mod docker;
pub mod driver;
pub mod error;
pub mod reconciler;
pub mod telemetry;

pub use container::{ContainerId, ContainerSpec, ImageRef, PortBinding};
pub use docker::{CancelToken, DockerCli, DriverConfig};
pub use driver::{ContainerState, RuntimeDriver};
pub use error::{EngineError, Result, RuntimeError, Transition};
pub use reconciler::{ContainerHandle, Reconciler};
