//! Process-scoped engine registry with lazy init-once semantics and an
//! explicit teardown hook, replacing the ad hoc module globals of a typical
//! model server.

use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use crate::error::AppError;

use super::{Device, Engines, OnnxTtsEngine, PlaceholderEngine};

const PLACEHOLDER_SAMPLE_RATE: u32 = 22050;

/// Which pair of pretrained engines a server process hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineVariant {
    /// English primary engine plus a multilingual sibling.
    Chatterbox,
    /// Single emotional engine; degrades to a placeholder tone when weights
    /// are unavailable.
    IndexTts,
}

pub struct ModelRegistry {
    variant: EngineVariant,
    model_path: PathBuf,
    device_override: Option<String>,
    engines: RwLock<Option<Arc<Engines>>>,
}

impl ModelRegistry {
    pub fn new(variant: EngineVariant, model_path: PathBuf, device_override: Option<String>) -> Self {
        Self {
            variant,
            model_path,
            device_override,
            engines: RwLock::new(None),
        }
    }

    /// Idempotent: the first call selects a device and constructs the engine
    /// handles; later calls return the existing ones. The load happens under
    /// the write lock, so concurrent first callers block instead of
    /// constructing a second set of sessions.
    pub fn ensure_loaded(&self) -> Result<Arc<Engines>, AppError> {
        {
            let guard = self.engines.read().unwrap();
            if let Some(engines) = guard.as_ref() {
                return Ok(Arc::clone(engines));
            }
        }

        let mut guard = self.engines.write().unwrap();
        if let Some(engines) = guard.as_ref() {
            return Ok(Arc::clone(engines));
        }

        let device = Device::select(self.device_override.as_deref())?;
        tracing::info!("Using device: {}", device);

        let engines = Arc::new(self.load_engines(device)?);
        *guard = Some(Arc::clone(&engines));
        Ok(engines)
    }

    /// Load, or fall back to the placeholder tone engine when loading fails.
    /// Only the emotional variant has this degraded mode; the primary server
    /// treats a load failure as fatal at startup.
    pub fn ensure_loaded_or_placeholder(&self) -> Arc<Engines> {
        match self.ensure_loaded() {
            Ok(engines) => engines,
            Err(e) => {
                tracing::error!("Failed to load model: {}", e);
                tracing::warn!("Using placeholder mode - synthesis returns a test tone");

                let mut guard = self.engines.write().unwrap();
                if let Some(existing) = guard.as_ref() {
                    return Arc::clone(existing);
                }

                let engines = Arc::new(Engines {
                    device: Device::Cpu,
                    primary: Arc::new(PlaceholderEngine::new(PLACEHOLDER_SAMPLE_RATE)),
                    multilingual: None,
                });
                *guard = Some(Arc::clone(&engines));
                engines
            }
        }
    }

    fn load_engines(&self, device: Device) -> Result<Engines, AppError> {
        match self.variant {
            EngineVariant::Chatterbox => {
                tracing::info!("Loading Chatterbox TTS engines...");
                let primary = OnnxTtsEngine::load(&self.model_path, "chatterbox", device)?;
                let multilingual = OnnxTtsEngine::load(&self.model_path, "chatterbox_mtl", device)?;
                Ok(Engines {
                    device,
                    primary: Arc::new(primary),
                    multilingual: Some(Arc::new(multilingual)),
                })
            }
            EngineVariant::IndexTts => {
                tracing::info!("Loading Index TTS engine...");
                let primary = OnnxTtsEngine::load(&self.model_path, "indextts", device)?;
                Ok(Engines {
                    device,
                    primary: Arc::new(primary),
                    multilingual: None,
                })
            }
        }
    }

    /// Currently loaded engines, if any. Never triggers a load.
    pub fn loaded(&self) -> Option<Arc<Engines>> {
        self.engines.read().unwrap().as_ref().map(Arc::clone)
    }

    pub fn is_loaded(&self) -> bool {
        self.engines.read().unwrap().is_some()
    }

    pub fn is_placeholder(&self) -> bool {
        self.loaded()
            .map(|e| e.primary.id() == "placeholder")
            .unwrap_or(false)
    }

    /// Drop the engine handles. Run once on graceful shutdown.
    pub fn shutdown(&self) {
        let mut guard = self.engines.write().unwrap();
        if guard.take().is_some() {
            tracing::info!("Engine handles released");
        }
    }
}
