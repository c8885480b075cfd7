use super::{Engine, EngineError};
use serde::Serialize;
use std::sync::{Arc, OnceLock};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadStatus {
    Loading,
    Ready,
    Failed,
}

/// Write-once holder for the engine, shared by every request handler.
///
/// Handlers see `NotReady` until the startup load installs an engine; after that
/// the engine never changes.
#[derive(Clone, Default)]
pub struct EngineSlot(Arc<SlotInner>);

#[derive(Default)]
struct SlotInner {
    engine: OnceLock<Engine>,
    failure: OnceLock<String>,
}

impl EngineSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ready(engine: Engine) -> Self {
        let slot = Self::new();
        slot.install(engine);
        slot
    }

    /// Returns false if an engine was already installed or the load already failed.
    pub fn install(&self, engine: Engine) -> bool {
        if self.0.failure.get().is_some() {
            return false;
        }
        self.0.engine.set(engine).is_ok()
    }

    pub fn fail(&self, reason: impl Into<String>) {
        if self.0.engine.get().is_none() {
            let _ = self.0.failure.set(reason.into());
        }
    }

    pub fn failure(&self) -> Option<&str> {
        self.0.failure.get().map(String::as_str)
    }

    pub fn status(&self) -> LoadStatus {
        if self.0.engine.get().is_some() {
            LoadStatus::Ready
        } else if self.0.failure.get().is_some() {
            LoadStatus::Failed
        } else {
            LoadStatus::Loading
        }
    }

    pub fn get(&self) -> Result<&Engine, EngineError> {
        self.0.engine.get().ok_or(EngineError::NotReady)
    }
}
