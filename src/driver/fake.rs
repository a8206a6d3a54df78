//! In-memory driver for tests.
//!
//! [`FakeDriver`] simulates an engine holding at most one image and one
//! container, records every call with its argument, and can be told to fail a
//! given operation. Failures stay armed until [`FakeDriver::recover`].

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::container::{ContainerId, ContainerSpec};
use crate::error::{EngineError, Result, RuntimeError, Transition};

use super::{ContainerState, RuntimeDriver};

/// Driver operation, used to arm failures and count calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    HasImage,
    Status,
    Pull,
    Create,
    Start,
    Stop,
}

/// A recorded driver call and its argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    HasImage { image: String },
    Status { image: String },
    Pull { image: String },
    Create { name: String },
    Start(ContainerId),
    Stop(ContainerId),
}

impl Call {
    pub fn op(&self) -> Op {
        match self {
            Call::HasImage { .. } => Op::HasImage,
            Call::Status { .. } => Op::Status,
            Call::Pull { .. } => Op::Pull,
            Call::Create { .. } => Op::Create,
            Call::Start(_) => Op::Start,
            Call::Stop(_) => Op::Stop,
        }
    }
}

#[derive(Debug)]
struct Engine {
    image_present: bool,
    state: ContainerState,
    next_id: ContainerId,
    failures: HashMap<Op, String>,
    calls: Vec<Call>,
}

#[derive(Debug)]
pub struct FakeDriver {
    engine: Mutex<Engine>,
}

impl Default for FakeDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeDriver {
    /// An engine with no image and no container.
    pub fn new() -> Self {
        Self {
            engine: Mutex::new(Engine {
                image_present: false,
                state: ContainerState::Absent,
                next_id: ContainerId::from("fake-container"),
                failures: HashMap::new(),
                calls: Vec::new(),
            }),
        }
    }

    /// Start with the image already present.
    pub fn with_image(self) -> Self {
        self.lock().image_present = true;
        self
    }

    /// Start with an existing container. Implies the image is present.
    pub fn with_state(self, state: ContainerState) -> Self {
        {
            let mut engine = self.lock();
            engine.image_present = true;
            engine.state = state;
        }
        self
    }

    /// Identifier returned by the next `create`.
    pub fn with_next_id(self, id: &str) -> Self {
        self.lock().next_id = ContainerId::from(id);
        self
    }

    /// Make every call to `op` fail with `message`.
    pub fn fail(&self, op: Op, message: &str) {
        self.lock().failures.insert(op, message.to_string());
    }

    /// Builder form of [`FakeDriver::fail`].
    pub fn failing(self, op: Op, message: &str) -> Self {
        self.fail(op, message);
        self
    }

    /// Disarm a failure set with [`FakeDriver::fail`].
    pub fn recover(&self, op: Op) {
        self.lock().failures.remove(&op);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub fn ops(&self) -> Vec<Op> {
        self.lock().calls.iter().map(Call::op).collect()
    }

    pub fn count(&self, op: Op) -> usize {
        self.lock().calls.iter().filter(|c| c.op() == op).count()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Current simulated container state.
    pub fn state(&self) -> ContainerState {
        self.lock().state.clone()
    }

    pub fn image_present(&self) -> bool {
        self.lock().image_present
    }

    fn lock(&self) -> MutexGuard<'_, Engine> {
        self.engine.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Engine {
    fn record(&mut self, call: Call) -> std::result::Result<(), EngineError> {
        let op = call.op();
        self.calls.push(call);
        match self.failures.get(&op) {
            Some(message) => Err(EngineError::other(message.clone())),
            None => Ok(()),
        }
    }

    fn owns(&self, id: &ContainerId) -> bool {
        self.state.id() == Some(id)
    }
}

impl RuntimeDriver for FakeDriver {
    fn has_image(&self, spec: &ContainerSpec) -> Result<bool> {
        let mut engine = self.lock();
        engine
            .record(Call::HasImage {
                image: spec.image().to_string(),
            })
            .map_err(|e| RuntimeError::query("images", e))?;
        Ok(engine.image_present)
    }

    fn status(&self, spec: &ContainerSpec) -> Result<ContainerState> {
        let mut engine = self.lock();
        engine
            .record(Call::Status {
                image: spec.image().to_string(),
            })
            .map_err(|e| RuntimeError::query("containers", e))?;
        Ok(engine.state.clone())
    }

    fn pull(&self, spec: &ContainerSpec) -> Result<()> {
        let mut engine = self.lock();
        let image = spec.image().to_string();
        engine
            .record(Call::Pull {
                image: image.clone(),
            })
            .map_err(|e| RuntimeError::pull(image, e))?;
        engine.image_present = true;
        Ok(())
    }

    fn create(&self, spec: &ContainerSpec) -> Result<ContainerId> {
        let mut engine = self.lock();
        engine
            .record(Call::Create {
                name: spec.name().to_string(),
            })
            .map_err(|e| RuntimeError::provision(spec.name(), e))?;
        if !engine.image_present {
            return Err(RuntimeError::provision(
                spec.name(),
                EngineError::other(format!("no such image: {}", spec.image())),
            ));
        }
        let id = engine.next_id.clone();
        engine.state = ContainerState::Created(id.clone());
        Ok(id)
    }

    fn start(&self, id: &ContainerId) -> Result<()> {
        let mut engine = self.lock();
        engine
            .record(Call::Start(id.clone()))
            .map_err(|e| RuntimeError::transition(Transition::Start, id, e))?;
        if !engine.owns(id) {
            return Err(RuntimeError::transition(
                Transition::Start,
                id,
                EngineError::other(format!("no such container: {id}")),
            ));
        }
        engine.state = ContainerState::Running(id.clone());
        Ok(())
    }

    fn stop(&self, id: &ContainerId) -> Result<()> {
        let mut engine = self.lock();
        engine
            .record(Call::Stop(id.clone()))
            .map_err(|e| RuntimeError::transition(Transition::Stop, id, e))?;
        if !engine.owns(id) {
            return Err(RuntimeError::transition(
                Transition::Stop,
                id,
                EngineError::other(format!("no such container: {id}")),
            ));
        }
        engine.state = ContainerState::Created(id.clone());
        Ok(())
    }
}
