//! Brings one container to the running state with the fewest driver calls.

use tracing::{debug, info};

use crate::container::{ContainerId, ContainerSpec};
use crate::driver::{ContainerState, RuntimeDriver};
use crate::error::Result;

/// The reconciler's record of which container it manages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerHandle {
    id: ContainerId,
}

impl ContainerHandle {
    /// Empty until a container has been created or discovered.
    pub fn id(&self) -> &ContainerId {
        &self.id
    }
}

/// Drives a single container described by a [`ContainerSpec`].
///
/// Not meant to be shared: `start` and `stop` take `&mut self`, so use one
/// reconciler per fixture.
pub struct Reconciler<D> {
    spec: ContainerSpec,
    driver: D,
    handle: ContainerHandle,
}

impl<D: RuntimeDriver> Reconciler<D> {
    pub fn new(spec: ContainerSpec, driver: D) -> Self {
        Self {
            spec,
            driver,
            handle: ContainerHandle::default(),
        }
    }

    /// Ensure the image is present and the container exists and runs.
    ///
    /// Each step only runs when its post-condition does not already hold:
    ///
    /// 1. `has_image`, then `pull` if the image is absent;
    /// 2. `status`, then `create` if no container exists;
    /// 3. `start` if the container is not running.
    ///
    /// The first failing driver call aborts and its error is returned as is.
    /// Nothing is rolled back: a container created before a failed `start`
    /// keeps its id on the handle and the next call only retries `start`.
    pub fn start(&mut self) -> Result<()> {
        let image = self.spec.image();
        info!(%image, "checking image");

        if self.driver.has_image(&self.spec)? {
            debug!(%image, "image present");
        } else {
            info!(%image, "pulling image");
            self.driver.pull(&self.spec)?;
            info!(%image, "finished pulling image");
        }

        let state = self.driver.status(&self.spec)?;
        debug!(?state, "container status");

        match state.id() {
            Some(id) => self.handle.id = id.clone(),
            None => {
                let id = self.driver.create(&self.spec)?;
                info!(name = self.spec.name(), %id, "created container");
                self.handle.id = id;
            }
        }

        if !state.is_running() {
            self.driver.start(&self.handle.id)?;
        }

        info!(%image, id = %self.handle.id, "container is running");
        Ok(())
    }

    /// Stop the held container. No status check; the driver decides what an
    /// empty or stale id means.
    pub fn stop(&mut self) -> Result<()> {
        info!(id = %self.handle.id, "stopping container");
        self.driver.stop(&self.handle.id)
    }

    /// Query the container state and adopt its id, without mutating anything.
    pub fn refresh(&mut self) -> Result<ContainerState> {
        let state = self.driver.status(&self.spec)?;
        if let Some(id) = state.id() {
            self.handle.id = id.clone();
        }
        Ok(state)
    }

    pub fn spec(&self) -> &ContainerSpec {
        &self.spec
    }

    pub fn handle(&self) -> &ContainerHandle {
        &self.handle
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }
}
