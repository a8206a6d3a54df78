// Capability contract between the reconciler and a container engine.

pub mod fake;

use crate::container::{ContainerId, ContainerSpec};
use crate::error::Result;

pub use fake::{Call, FakeDriver, Op};

/// Observed state of the container matching a spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerState {
    /// No container exists for the image.
    Absent,
    /// A container exists but is not running.
    Created(ContainerId),
    Running(ContainerId),
}

impl ContainerState {
    pub fn is_created(&self) -> bool {
        !matches!(self, Self::Absent)
    }

    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running(_))
    }

    pub fn id(&self) -> Option<&ContainerId> {
        match self {
            Self::Absent => None,
            Self::Created(id) | Self::Running(id) => Some(id),
        }
    }
}

/// Primitive queries and mutations against a container engine.
///
/// Each method maps to exactly one engine operation and never retries.
/// Identifiers are passed explicitly; implementations keep no per-container
/// state.
pub trait RuntimeDriver {
    /// Whether `spec`'s image is present locally.
    fn has_image(&self, spec: &ContainerSpec) -> Result<bool>;

    /// Whether a container for `spec`'s image exists and is running.
    fn status(&self, spec: &ContainerSpec) -> Result<ContainerState>;

    /// Fetch `spec`'s image. Progress output is a side effect only.
    fn pull(&self, spec: &ContainerSpec) -> Result<()>;

    /// Provision a container from `spec` without starting it.
    fn create(&self, spec: &ContainerSpec) -> Result<ContainerId>;

    fn start(&self, id: &ContainerId) -> Result<()>;

    fn stop(&self, id: &ContainerId) -> Result<()>;
}

impl<D: RuntimeDriver + ?Sized> RuntimeDriver for &D {
    fn has_image(&self, spec: &ContainerSpec) -> Result<bool> {
        (**self).has_image(spec)
    }

    fn status(&self, spec: &ContainerSpec) -> Result<ContainerState> {
        (**self).status(spec)
    }

    fn pull(&self, spec: &ContainerSpec) -> Result<()> {
        (**self).pull(spec)
    }

    fn create(&self, spec: &ContainerSpec) -> Result<ContainerId> {
        (**self).create(spec)
    }

    fn start(&self, id: &ContainerId) -> Result<()> {
        (**self).start(id)
    }

    fn stop(&self, id: &ContainerId) -> Result<()> {
        (**self).stop(id)
    }
}

impl<D: RuntimeDriver + ?Sized> RuntimeDriver for Box<D> {
    fn has_image(&self, spec: &ContainerSpec) -> Result<bool> {
        (**self).has_image(spec)
    }

    fn status(&self, spec: &ContainerSpec) -> Result<ContainerState> {
        (**self).status(spec)
    }

    fn pull(&self, spec: &ContainerSpec) -> Result<()> {
        (**self).pull(spec)
    }

    fn create(&self, spec: &ContainerSpec) -> Result<ContainerId> {
        (**self).create(spec)
    }

    fn start(&self, id: &ContainerId) -> Result<()> {
        (**self).start(id)
    }

    fn stop(&self, id: &ContainerId) -> Result<()> {
        (**self).stop(id)
    }
}
