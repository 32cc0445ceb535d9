//! Access to the persisted user settings

use std::sync::Arc;

use async_trait::async_trait;
use langqueue_core_types::AppSettings;
use parking_lot::RwLock;

/// Key/value settings owned by an external store.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn load(&self) -> AppSettings;
}

/// In-memory store that can be updated while the controller runs. A chain
/// reads it once when it starts.
#[derive(Debug, Default)]
pub struct SharedSettings {
    inner: RwLock<AppSettings>,
}

impl SharedSettings {
    pub fn new(settings: AppSettings) -> Arc<Self> {
        Arc::new(Self {
            inner: RwLock::new(settings),
        })
    }

    pub fn replace(&self, settings: AppSettings) {
        *self.inner.write() = settings;
    }

    pub fn update(&self, f: impl FnOnce(&mut AppSettings)) {
        f(&mut self.inner.write());
    }

    pub fn snapshot(&self) -> AppSettings {
        self.inner.read().clone()
    }
}

#[async_trait]
impl SettingsStore for SharedSettings {
    async fn load(&self) -> AppSettings {
        self.snapshot()
    }
}
